use std::{sync::Arc, time::Duration};

use jiff::Timestamp;
use tokio::sync::Mutex;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::{DataType, KeyValueStore, Value},
    resp::RespValue,
};

/// Represents the parsed arguments for the SET command
pub struct SetArguments {
    /// The key name to store the value under
    key: String,
    /// The value to be stored under the given key
    value: String,
    /// Absolute expiry instant computed from `PX` or `EX`
    expiration: Option<Timestamp>,
}

impl SetArguments {
    /// Parses `key value [PX milliseconds | EX seconds]`.
    ///
    /// # Returns
    ///
    /// * `Ok(SetArguments)` - Successfully parsed arguments
    /// * `Err(CommandError::WrongNumberOfArguments)` - If key or value is missing
    /// * `Err(CommandError::SyntaxError)` - If an option is unknown or lacks its value
    /// * `Err(CommandError::InvalidExpireTime)` - If the expiry is not a positive integer
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 2 {
            return Err(CommandError::wrong_arguments("set"));
        }

        let mut iter = arguments.into_iter();
        let (Some(key), Some(value)) = (iter.next(), iter.next()) else {
            return Err(CommandError::wrong_arguments("set"));
        };

        let mut expiration = None;

        while let Some(option) = iter.next() {
            let unit_in_ms = match option.to_uppercase().as_str() {
                "PX" => 1,
                "EX" => 1_000,
                _ => return Err(CommandError::SyntaxError),
            };

            if expiration.is_some() {
                return Err(CommandError::SyntaxError);
            }

            let Some(amount) = iter.next() else {
                return Err(CommandError::SyntaxError);
            };

            let amount = amount
                .parse::<i64>()
                .ok()
                .filter(|amount| *amount > 0)
                .and_then(|amount| amount.checked_mul(unit_in_ms))
                .ok_or_else(|| CommandError::InvalidExpireTime("set".to_string()))?;

            let expires_at = Timestamp::now()
                .checked_add(Duration::from_millis(amount as u64))
                .map_err(|_| CommandError::InvalidExpireTime("set".to_string()))?;

            expiration = Some(expires_at);
        }

        Ok(Self {
            key,
            value,
            expiration,
        })
    }
}

/// Handles the Redis SET command.
///
/// Overwrites whatever the key held before, whatever its type, and replies `OK`.
pub async fn set(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let set_arguments = SetArguments::parse(arguments)?;

    let mut store_guard = store.lock().await;

    Ok(apply_set(&mut store_guard, set_arguments))
}

/// Stores the parsed value on a store the caller has already locked.
pub fn apply_set(store: &mut KeyValueStore, set_arguments: SetArguments) -> CommandResult {
    store.insert(
        set_arguments.key,
        Value {
            data: DataType::String(set_arguments.value),
            expiration: set_arguments.expiration,
        },
    );

    CommandResult::Response(RespValue::SimpleString("OK".to_string()))
}
