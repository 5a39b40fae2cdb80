use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub async fn type_command(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    if arguments.len() != 1 {
        return Err(CommandError::wrong_arguments("type"));
    }

    let mut store_guard = store.lock().await;
    let type_name = store_guard.type_of(&arguments[0]);

    Ok(CommandResult::Response(RespValue::SimpleString(
        type_name.to_string(),
    )))
}
