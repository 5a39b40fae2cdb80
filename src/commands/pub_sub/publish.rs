use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
    state::State,
};

pub struct PublishArguments {
    pub channel: String,
    pub message: String,
}

impl PublishArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [channel, message]: [String; 2] = arguments
            .try_into()
            .map_err(|_| CommandError::wrong_arguments("publish"))?;

        Ok(Self { channel, message })
    }
}

/// Replies with the number of connections subscribed to the channel.
pub async fn publish(
    state: Arc<Mutex<State>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let publish_arguments = PublishArguments::parse(arguments)?;

    let state_guard = state.lock().await;
    let receivers = state_guard
        .pub_sub
        .publish(&publish_arguments.channel, &publish_arguments.message);

    Ok(CommandResult::Response(RespValue::Integer(receivers as i64)))
}
