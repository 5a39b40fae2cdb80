use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{command_handler::CommandResult, CommandError},
    resp::RespValue,
    state::{ClientId, State},
};

pub async fn discard(
    state: Arc<Mutex<State>>,
    client_id: ClientId,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    if !arguments.is_empty() {
        return Err(CommandError::wrong_arguments("discard"));
    }

    let mut state_guard = state.lock().await;

    if state_guard.transactions.take(client_id).is_none() {
        return Err(CommandError::DiscardWithoutMulti);
    }

    Ok(CommandResult::Response(RespValue::SimpleString(
        "OK".to_string(),
    )))
}
