use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
};

/// Handles the Redis ECHO command.
///
/// # Arguments
///
/// * `arguments` - A vector containing exactly one string argument to echo back
///
/// # Returns
///
/// * `Ok(CommandResult::Response)` - A bulk string containing the argument
/// * `Err(CommandError::WrongNumberOfArguments)` - If there is not exactly one argument
pub fn echo(arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let [message]: [String; 1] = arguments
        .try_into()
        .map_err(|_| CommandError::wrong_arguments("echo"))?;

    Ok(CommandResult::Response(RespValue::BulkString(message)))
}
