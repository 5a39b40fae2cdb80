mod blpop;
mod command_dispatcher;
mod command_error;
mod command_handler;
mod command_utils;
mod config_get;
mod del;
mod echo;
mod geo;
mod get;
mod incr;
mod keys;
mod llen;
mod lpop;
mod lrange;
mod ping;
mod pub_sub;
mod replication;
mod rpush_and_lpush;
mod set;
mod sorted_set;
mod transactions;
mod type_command;
mod xadd;
mod xrange;
mod xread;

pub use blpop::blpop;
pub use command_dispatcher::CommandDispatcher;
pub use command_error::CommandError;
pub use command_handler::{CommandHandler, CommandResult};
pub use config_get::config_get;
pub use del::del;
pub use echo::echo;
pub use geo::{geoadd, geodist, geopos, geosearch};
pub use get::get;
pub use incr::incr;
pub use keys::keys;
pub use llen::llen;
pub use lpop::lpop;
pub use lrange::lrange;
pub use ping::ping;
pub use pub_sub::{publish, subscribe, subscribed_ping, unsubscribe};
pub use replication::{info, psync, replconf, wait};
pub use rpush_and_lpush::{lpush, rpush};
pub use set::set;
pub use sorted_set::{zadd, zcard, zrange, zrank, zrem, zscore};
pub use transactions::{discard, exec, multi};
pub use type_command::type_command;
pub use xadd::xadd;
pub use xrange::xrange;
pub use xread::xread;
