use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
    state::{ClientId, State},
};

fn confirmation(kind: &str, channel: Option<String>, count: usize) -> RespValue {
    RespValue::Array(vec![
        RespValue::BulkString(kind.to_string()),
        channel.map_or(RespValue::NullBulkString, RespValue::BulkString),
        RespValue::Integer(count as i64),
    ])
}

/// One `["subscribe", channel, count]` confirmation per channel, in argument order.
pub async fn subscribe(
    state: Arc<Mutex<State>>,
    client_id: ClientId,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    if arguments.is_empty() {
        return Err(CommandError::wrong_arguments("subscribe"));
    }

    let mut state_guard = state.lock().await;

    let responses = arguments
        .into_iter()
        .map(|channel| {
            let count = state_guard.pub_sub.subscribe(client_id, &channel);
            confirmation("subscribe", Some(channel), count)
        })
        .collect();

    Ok(CommandResult::Responses(responses))
}

/// Without arguments every subscription of the connection is dropped.
pub async fn unsubscribe(
    state: Arc<Mutex<State>>,
    client_id: ClientId,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let mut state_guard = state.lock().await;

    let channels = if arguments.is_empty() {
        state_guard.pub_sub.channels(client_id)
    } else {
        arguments
    };

    if channels.is_empty() {
        return Ok(CommandResult::Response(confirmation("unsubscribe", None, 0)));
    }

    let responses = channels
        .into_iter()
        .map(|channel| {
            let count = state_guard.pub_sub.unsubscribe(client_id, &channel);
            confirmation("unsubscribe", Some(channel), count)
        })
        .collect();

    Ok(CommandResult::Responses(responses))
}
