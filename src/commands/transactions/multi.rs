use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{command_handler::CommandResult, CommandError},
    resp::RespValue,
    state::{ClientId, State},
};

pub async fn multi(
    state: Arc<Mutex<State>>,
    client_id: ClientId,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    if !arguments.is_empty() {
        return Err(CommandError::wrong_arguments("multi"));
    }

    let mut state_guard = state.lock().await;
    state_guard.transactions.begin(client_id)?;

    Ok(CommandResult::Response(RespValue::SimpleString(
        "OK".to_string(),
    )))
}
