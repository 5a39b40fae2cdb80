//! A Redis-compatible in-memory key-value server.
//!
//! Supports strings with expiry, lists with blocking pops, sorted sets with
//! geospatial queries, streams with blocking reads, transactions, pub/sub and
//! leader/follower replication, all spoken over RESP. A snapshot file can be
//! loaded at startup.

pub mod commands;
pub mod connection;
pub mod key_value_store;
pub mod rdb;
pub mod replication;
pub mod resp;
pub mod server;
pub mod state;
