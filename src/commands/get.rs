use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

/// Handles the Redis GET command.
///
/// Expired keys are purged by the store on access, so an expired key reads
/// exactly like a missing one.
///
/// # Returns
///
/// * Bulk string containing the value if the key holds a live string
/// * Null bulk string if the key is missing, expired or holds another type
pub async fn get(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    if arguments.len() != 1 {
        return Err(CommandError::wrong_arguments("get"));
    }

    let mut store_guard = store.lock().await;

    let response = match store_guard.string(&arguments[0]) {
        Some(value) => RespValue::BulkString(value.clone()),
        None => RespValue::NullBulkString,
    };

    Ok(CommandResult::Response(response))
}
