use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

/// Lists every live key. The pattern argument is optional and not applied.
pub async fn keys(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    if arguments.len() > 1 {
        return Err(CommandError::wrong_arguments("keys"));
    }

    let mut store_guard = store.lock().await;

    Ok(CommandResult::Response(RespValue::array_of_bulk_strings(
        &store_guard.keys(),
    )))
}
