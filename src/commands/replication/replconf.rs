//! REPLCONF command implementation for Redis replication configuration.
//!
//! Replicas use it during the handshake to announce their port and
//! capabilities, and afterwards to acknowledge how much of the replication
//! stream they have processed.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    commands::{CommandError, CommandResult},
    resp::RespValue,
    server::RedisServer,
    state::ClientId,
};

enum ReplconfConfiguration {
    ListeningPort,
    Capabilities,
    Ack(u64),
    GetAck,
}

/// Represents the parsed arguments for the REPLCONF command.
pub struct ReplconfArguments {
    configuration: ReplconfConfiguration,
}

impl ReplconfArguments {
    /// Parses and validates arguments for the REPLCONF command.
    ///
    /// # Returns
    ///
    /// * `Ok(ReplconfArguments)` - Successfully parsed arguments
    /// * `Err(CommandError::WrongNumberOfArguments)` - If not exactly 2 arguments
    /// * `Err(CommandError::NotAnInteger)` - If a port or offset is not a number
    /// * `Err(CommandError::SyntaxError)` - If the option is unknown
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [option, value]: [String; 2] = arguments
            .try_into()
            .map_err(|_| CommandError::wrong_arguments("replconf"))?;

        let configuration = match option.to_lowercase().as_str() {
            "listening-port" => {
                value
                    .parse::<u16>()
                    .map_err(|_| CommandError::NotAnInteger)?;

                ReplconfConfiguration::ListeningPort
            }
            "capa" => ReplconfConfiguration::Capabilities,
            "ack" => ReplconfConfiguration::Ack(
                value.parse::<u64>().map_err(|_| CommandError::NotAnInteger)?,
            ),
            "getack" => ReplconfConfiguration::GetAck,
            _ => return Err(CommandError::SyntaxError),
        };

        Ok(Self { configuration })
    }
}

/// Handles the Redis REPLCONF command.
///
/// `ACK` records the sender's offset and is never answered. `GETACK` reports
/// this server's own offset.
pub async fn replconf(
    server: Arc<RwLock<RedisServer>>,
    client_id: ClientId,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let replconf_arguments = ReplconfArguments::parse(arguments)?;

    match replconf_arguments.configuration {
        ReplconfConfiguration::ListeningPort | ReplconfConfiguration::Capabilities => Ok(
            CommandResult::Response(RespValue::SimpleString("OK".to_string())),
        ),
        ReplconfConfiguration::Ack(offset) => {
            let mut server_guard = server.write().await;
            server_guard.replication.record_ack(client_id, offset);

            Ok(CommandResult::NoResponse)
        }
        ReplconfConfiguration::GetAck => {
            let server_guard = server.read().await;
            let offset = server_guard.replication.master_offset.to_string();

            Ok(CommandResult::Response(RespValue::array_of_bulk_strings(&[
                "REPLCONF",
                "ACK",
                offset.as_str(),
            ])))
        }
    }
}
