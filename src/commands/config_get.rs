use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    commands::{CommandError, CommandResult},
    resp::RespValue,
    server::RedisServer,
};

pub struct ConfigGetArguments {
    pub parameters: Vec<String>,
}

impl ConfigGetArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.is_empty() {
            return Err(CommandError::wrong_arguments("config|get"));
        }

        Ok(ConfigGetArguments {
            parameters: arguments,
        })
    }
}

/// Replies with a flat `[name, value, ...]` array. Unknown parameters are skipped.
pub async fn config_get(
    server: Arc<RwLock<RedisServer>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let config_get_arguments = ConfigGetArguments::parse(arguments)?;

    let server_guard = server.read().await;
    let mut response = Vec::new();

    for parameter in config_get_arguments.parameters {
        let value = match parameter.to_lowercase().as_str() {
            "dir" => server_guard.rdb_directory.clone(),
            "dbfilename" => server_guard.rdb_filename.clone(),
            _ => continue,
        };

        response.push(RespValue::BulkString(parameter.to_lowercase()));
        response.push(RespValue::BulkString(value));
    }

    Ok(CommandResult::Response(RespValue::Array(response)))
}
