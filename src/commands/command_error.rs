use thiserror::Error;

use crate::{
    key_value_store::{StoreError, StreamError},
    resp::RespValue,
    state::StateError,
};

/// Errors a command reports to its client. The `Display` text of every
/// variant is the exact message sent on the wire.
#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("ERR Protocol error: expected an array of bulk strings")]
    InvalidCommand,
    #[error("ERR unknown command '{0}'")]
    UnknownCommand(String),
    #[error("ERR unknown subcommand '{0}'")]
    UnknownSubcommand(String),
    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongNumberOfArguments(String),
    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,
    #[error("ERR value is not a valid float")]
    NotAFloat,
    #[error("ERR value is out of range, must be positive")]
    NotPositive,
    #[error("ERR invalid expire time in '{0}' command")]
    InvalidExpireTime(String),
    #[error("ERR syntax error")]
    SyntaxError,
    #[error("ERR timeout is not a float or out of range")]
    InvalidTimeout,
    #[error("ERR timeout is negative")]
    NegativeTimeout,
    #[error("ERR Invalid stream ID specified as stream command argument")]
    InvalidStreamId,
    #[error(transparent)]
    Stream(#[from] StreamError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0}")]
    InvalidCoordinates(String),
    #[error("ERR unsupported unit provided. please use M, KM, FT, MI")]
    UnsupportedUnit,
    #[error("ERR could not decode requested zset member")]
    UnknownMember,
    #[error("ERR {0}")]
    Transaction(#[from] StateError),
    #[error("ERR EXEC without MULTI")]
    ExecWithoutMulti,
    #[error("ERR DISCARD without MULTI")]
    DiscardWithoutMulti,
    #[error("ERR Can't execute '{0}': only (P|S)SUBSCRIBE / (P|S)UNSUBSCRIBE / PING / QUIT / RESET are allowed in this context")]
    NotAllowedWhileSubscribed(String),
    #[error("READONLY You can't write against a read only replica.")]
    ReadOnlyReplica,
    #[error("ERR WAIT cannot be used with replica instances.")]
    WaitOnReplica,
}

impl CommandError {
    pub fn wrong_arguments(command: &str) -> Self {
        CommandError::WrongNumberOfArguments(command.to_lowercase())
    }

    pub fn as_resp(&self) -> RespValue {
        RespValue::Error(self.to_string())
    }
}
