use std::time::Duration;

use tokio::sync::oneshot;

use crate::{commands::CommandError, resp::RespValue, state::WaiterId};

/// What a command produced. Most commands reply once; the rest tell the
/// connection loop to wait, stream a snapshot or hang up.
#[derive(Debug)]
pub enum CommandResult {
    NoResponse,
    Response(RespValue),
    /// Several replies in order, e.g. one confirmation per SUBSCRIBE channel.
    Responses(Vec<RespValue>),
    /// The reply arrives later through `receiver`, unless `timeout` expires
    /// first. `None` waits indefinitely.
    Blocked {
        waiter_id: WaiterId,
        receiver: oneshot::Receiver<RespValue>,
        timeout: Option<Duration>,
    },
    /// Full resynchronisation: the reply is followed by the raw snapshot.
    Sync {
        response: RespValue,
        snapshot: Vec<u8>,
    },
    Quit,
}

/// A decoded request: the upper-cased command name plus its arguments.
#[derive(Debug, PartialEq, Clone)]
pub struct CommandHandler {
    pub name: String,
    pub arguments: Vec<String>,
    pub input: RespValue,
}

impl CommandHandler {
    pub fn new(input: RespValue) -> Result<Self, CommandError> {
        let RespValue::Array(elements) = &input else {
            return Err(CommandError::InvalidCommand);
        };

        let mut parts = Vec::with_capacity(elements.len());

        for element in elements {
            match element {
                RespValue::BulkString(s) => parts.push(s.clone()),
                _ => return Err(CommandError::InvalidCommand),
            }
        }

        let mut parts = parts.into_iter();

        let Some(name) = parts.next() else {
            return Err(CommandError::InvalidCommand);
        };

        let name = match name.to_uppercase().as_str() {
            "CONFIG" => {
                let Some(sub_command) = parts.next() else {
                    return Err(CommandError::wrong_arguments("config"));
                };

                if !sub_command.eq_ignore_ascii_case("GET") {
                    return Err(CommandError::UnknownSubcommand(sub_command));
                }

                "CONFIG GET".to_string()
            }
            other => other.to_string(),
        };

        Ok(Self {
            name,
            arguments: parts.collect(),
            input,
        })
    }
}
