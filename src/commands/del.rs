use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

/// Removes every named key regardless of type and replies with how many existed.
pub async fn del(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let mut store_guard = store.lock().await;

    remove_keys(&mut store_guard, arguments)
}

pub fn remove_keys(
    store: &mut KeyValueStore,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    if arguments.is_empty() {
        return Err(CommandError::wrong_arguments("del"));
    }

    let removed = arguments
        .iter()
        .filter(|key| store.remove(key).is_some())
        .count();

    Ok(CommandResult::Response(RespValue::Integer(removed as i64)))
}
