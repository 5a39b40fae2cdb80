use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub async fn llen(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    if arguments.len() != 1 {
        return Err(CommandError::wrong_arguments("llen"));
    }

    let mut store_guard = store.lock().await;
    let length = store_guard.list(&arguments[0]).map_or(0, |list| list.len());

    Ok(CommandResult::Response(RespValue::Integer(length as i64)))
}
