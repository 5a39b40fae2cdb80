use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::{DataType, KeyValueStore, StoreError, Value},
    resp::RespValue,
};

pub struct IncrArguments {
    key: String,
}

impl IncrArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [key]: [String; 1] = arguments
            .try_into()
            .map_err(|_| CommandError::wrong_arguments("incr"))?;

        Ok(Self { key })
    }
}

/// Handles the Redis INCR command.
///
/// A missing key counts as `0`. The stored expiry, if any, is kept. A value
/// that is not a base-10 `i64`, or would overflow, is left untouched.
pub async fn incr(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let incr_arguments = IncrArguments::parse(arguments)?;

    let mut store_guard = store.lock().await;

    let (current, expiration) = match store_guard.get(&incr_arguments.key) {
        None => (0, None),
        Some(Value {
            data: DataType::String(value),
            expiration,
        }) => (
            value
                .parse::<i64>()
                .map_err(|_| CommandError::NotAnInteger)?,
            *expiration,
        ),
        Some(_) => return Err(StoreError::WrongType.into()),
    };

    let next = current.checked_add(1).ok_or(CommandError::NotAnInteger)?;

    store_guard.insert(
        incr_arguments.key,
        Value {
            data: DataType::String(next.to_string()),
            expiration,
        },
    );

    Ok(CommandResult::Response(RespValue::Integer(next)))
}
