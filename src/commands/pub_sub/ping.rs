use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
};

/// PING in subscribed mode replies `["pong", message]`, with an empty message by default.
pub fn subscribed_ping(arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    if arguments.len() > 1 {
        return Err(CommandError::wrong_arguments("ping"));
    }

    let message = arguments.into_iter().next().unwrap_or_default();

    Ok(CommandResult::Response(RespValue::array_of_bulk_strings(&[
        "pong".to_string(),
        message,
    ])))
}
