use crate::{
    commands::{command_handler::CommandResult, CommandDispatcher, CommandError},
    resp::RespValue,
};

/// Handles the Redis EXEC command.
///
/// Closes the connection's transaction and runs the queued commands in order
/// with blocking disabled. A failing command contributes its error reply to
/// the result array and the rest still run.
///
/// # Returns
///
/// * `Ok(CommandResult::Response)` - An array with one reply per queued command
/// * `Err(CommandError::ExecWithoutMulti)` - If no transaction is open
pub async fn exec(
    dispatcher: &CommandDispatcher,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    if !arguments.is_empty() {
        return Err(CommandError::wrong_arguments("exec"));
    }

    let Some(commands) = dispatcher.take_transaction().await else {
        return Err(CommandError::ExecWithoutMulti);
    };

    let mut responses = Vec::with_capacity(commands.len());

    for command in commands {
        let response = match dispatcher.execute(&command, false).await {
            Ok(CommandResult::Response(value)) => value,
            Ok(CommandResult::Responses(values)) => RespValue::Array(values),
            Ok(CommandResult::Sync { response, .. }) => response,
            Ok(CommandResult::Quit) => RespValue::SimpleString("OK".to_string()),
            Ok(CommandResult::NoResponse) | Ok(CommandResult::Blocked { .. }) => {
                RespValue::NullBulkString
            }
            Err(e) => e.as_resp(),
        };

        responses.push(response);
    }

    Ok(CommandResult::Response(RespValue::Array(responses)))
}
