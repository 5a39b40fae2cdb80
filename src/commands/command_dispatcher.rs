use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::{
    commands::{
        blpop, config_get, del,
        del::remove_keys,
        discard, echo, exec, geoadd, geodist, geopos, geosearch, get, incr, info, keys, llen,
        lpop, lpush, lrange, multi, ping, psync, publish, replconf, rpush, set,
        set::{apply_set, SetArguments},
        subscribe, subscribed_ping, type_command, unsubscribe, wait, xadd, xrange, xread, zadd,
        zcard, zrange, zrank, zrem, zscore, CommandError, CommandHandler, CommandResult,
    },
    key_value_store::KeyValueStore,
    resp::RespValue,
    server::{RedisRole, RedisServer},
    state::{ClientId, State},
};

/// Every command the server understands. Anything else is rejected up front,
/// also inside a transaction.
const KNOWN_COMMANDS: [&str; 39] = [
    "PING", "ECHO", "SET", "GET", "DEL", "INCR", "KEYS", "TYPE", "CONFIG GET", "RPUSH",
    "LPUSH", "LRANGE", "LLEN", "LPOP", "BLPOP", "ZADD", "ZRANK", "ZRANGE", "ZCARD", "ZSCORE",
    "ZREM", "GEOADD", "GEOPOS", "GEODIST", "GEOSEARCH", "XADD", "XRANGE", "XREAD", "MULTI",
    "EXEC", "DISCARD", "SUBSCRIBE", "UNSUBSCRIBE", "PUBLISH", "QUIT", "INFO", "REPLCONF",
    "PSYNC", "WAIT",
];

/// Commands a replica refuses from its own clients.
const WRITE_COMMANDS: [&str; 11] = [
    "SET", "DEL", "INCR", "RPUSH", "LPUSH", "LPOP", "BLPOP", "ZADD", "ZREM", "GEOADD", "XADD",
];

/// Commands forwarded to replicas after they succeed on the leader.
const PROPAGATED_COMMANDS: [&str; 2] = ["SET", "DEL"];

/// Commands still accepted once a connection has subscribed to a channel.
const SUBSCRIBED_MODE_COMMANDS: [&str; 4] = ["SUBSCRIBE", "UNSUBSCRIBE", "PING", "QUIT"];

/// Routes the commands of one connection.
///
/// Holds the connection's client id next to the shared handles so that
/// transaction, subscription and blocking state can be looked up per client.
pub struct CommandDispatcher {
    pub client_id: ClientId,
    pub server: Arc<RwLock<RedisServer>>,
    pub store: Arc<Mutex<KeyValueStore>>,
    pub state: Arc<Mutex<State>>,
}

impl CommandDispatcher {
    pub fn new(
        client_id: ClientId,
        server: Arc<RwLock<RedisServer>>,
        store: Arc<Mutex<KeyValueStore>>,
        state: Arc<Mutex<State>>,
    ) -> Self {
        Self {
            client_id,
            server,
            store,
            state,
        }
    }

    /// Dispatches a command received from the client.
    ///
    /// # Routing
    ///
    /// - While subscribed, only SUBSCRIBE, UNSUBSCRIBE, PING and QUIT run
    /// - `MULTI`, `EXEC` and `DISCARD` always run immediately
    /// - Other commands are queued with `+QUEUED` while a transaction is open
    /// - Everything else executes right away, blocking allowed
    pub async fn dispatch(&self, command: CommandHandler) -> Result<CommandResult, CommandError> {
        debug!(client = self.client_id, command = %command.name, "dispatching command");

        let (subscribed, in_transaction) = {
            let state_guard = self.state.lock().await;

            (
                state_guard.pub_sub.is_subscribed(self.client_id),
                state_guard.transactions.is_open(self.client_id),
            )
        };

        if subscribed {
            if !SUBSCRIBED_MODE_COMMANDS.contains(&command.name.as_str()) {
                return Err(CommandError::NotAllowedWhileSubscribed(
                    command.name.to_lowercase(),
                ));
            }

            if command.name == "PING" {
                return subscribed_ping(command.arguments);
            }
        }

        match command.name.as_str() {
            "MULTI" => multi(Arc::clone(&self.state), self.client_id, command.arguments).await,
            "EXEC" => exec(self, command.arguments).await,
            "DISCARD" => discard(Arc::clone(&self.state), self.client_id, command.arguments).await,
            name if in_transaction => {
                if !KNOWN_COMMANDS.contains(&name) {
                    return Err(CommandError::UnknownCommand(name.to_lowercase()));
                }

                let mut state_guard = self.state.lock().await;
                state_guard.transactions.enqueue(self.client_id, command)?;

                Ok(CommandResult::Response(RespValue::SimpleString(
                    "QUEUED".to_string(),
                )))
            }
            _ => self.execute(&command, true).await,
        }
    }

    /// Closes this connection's transaction, returning its queued commands.
    pub async fn take_transaction(&self) -> Option<Vec<CommandHandler>> {
        let mut state_guard = self.state.lock().await;
        state_guard.transactions.take(self.client_id)
    }

    /// Runs a single command. `allow_blocking` is false for commands replayed
    /// by EXEC, which makes BLPOP and XREAD BLOCK give up immediately.
    pub async fn execute(
        &self,
        command: &CommandHandler,
        allow_blocking: bool,
    ) -> Result<CommandResult, CommandError> {
        let is_master = matches!(self.server.read().await.role, RedisRole::Master);
        let name = command.name.as_str();

        if !is_master && WRITE_COMMANDS.contains(&name) {
            return Err(CommandError::ReadOnlyReplica);
        }

        if is_master && PROPAGATED_COMMANDS.contains(&name) {
            return self.execute_and_propagate(command).await;
        }

        let store = Arc::clone(&self.store);
        let state = Arc::clone(&self.state);
        let server = Arc::clone(&self.server);
        let client_id = self.client_id;
        let arguments = command.arguments.clone();

        match name {
            "PING" => ping(arguments),
            "ECHO" => echo(arguments),
            "QUIT" => Ok(CommandResult::Quit),
            "SET" => set(store, arguments).await,
            "GET" => get(store, arguments).await,
            "DEL" => del(store, arguments).await,
            "INCR" => incr(store, arguments).await,
            "KEYS" => keys(store, arguments).await,
            "TYPE" => type_command(store, arguments).await,
            "CONFIG GET" => config_get(server, arguments).await,
            "RPUSH" => rpush(store, state, arguments).await,
            "LPUSH" => lpush(store, state, arguments).await,
            "LRANGE" => lrange(store, arguments).await,
            "LLEN" => llen(store, arguments).await,
            "LPOP" => lpop(store, arguments).await,
            "BLPOP" => blpop(store, state, client_id, arguments, allow_blocking).await,
            "ZADD" => zadd(store, arguments).await,
            "ZRANK" => zrank(store, arguments).await,
            "ZRANGE" => zrange(store, arguments).await,
            "ZCARD" => zcard(store, arguments).await,
            "ZSCORE" => zscore(store, arguments).await,
            "ZREM" => zrem(store, arguments).await,
            "GEOADD" => geoadd(store, arguments).await,
            "GEOPOS" => geopos(store, arguments).await,
            "GEODIST" => geodist(store, arguments).await,
            "GEOSEARCH" => geosearch(store, arguments).await,
            "XADD" => xadd(store, state, arguments).await,
            "XRANGE" => xrange(store, arguments).await,
            "XREAD" => xread(store, state, client_id, arguments, allow_blocking).await,
            "SUBSCRIBE" => subscribe(state, client_id, arguments).await,
            "UNSUBSCRIBE" => unsubscribe(state, client_id, arguments).await,
            "PUBLISH" => publish(state, arguments).await,
            "INFO" => info(server, arguments).await,
            "REPLCONF" => replconf(server, client_id, arguments).await,
            "PSYNC" => psync(server, arguments).await,
            "WAIT" => wait(server, arguments, allow_blocking).await,
            _ => Err(CommandError::UnknownCommand(command.name.to_lowercase())),
        }
    }

    /// Applies a replicated write and forwards it to the replicas before the
    /// store lock is released. Replicas receive writes in the order the store
    /// applied them. The server lock is taken while the store lock is held.
    async fn execute_and_propagate(
        &self,
        command: &CommandHandler,
    ) -> Result<CommandResult, CommandError> {
        let arguments = command.arguments.clone();
        let mut store_guard = self.store.lock().await;

        let result = match command.name.as_str() {
            "SET" => apply_set(&mut store_guard, SetArguments::parse(arguments)?),
            _ => remove_keys(&mut store_guard, arguments)?,
        };

        let mut server_guard = self.server.write().await;
        server_guard.replication.propagate(&command.input);

        Ok(result)
    }
}
