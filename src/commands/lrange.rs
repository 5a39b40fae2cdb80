use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{
        command_error::CommandError, command_handler::CommandResult, command_utils::parse_integer,
    },
    key_value_store::{normalize_range, KeyValueStore},
    resp::RespValue,
};

pub struct LrangeArguments {
    key: String,
    start: i64,
    end: i64,
}

impl LrangeArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 3 {
            return Err(CommandError::wrong_arguments("lrange"));
        }

        Ok(Self {
            start: parse_integer(&arguments[1])?,
            end: parse_integer(&arguments[2])?,
            key: arguments[0].clone(),
        })
    }
}

/// Handles the Redis LRANGE command.
///
/// Both bounds are inclusive and may be negative, counting back from the
/// tail. A range that selects nothing, or a missing key, gives an empty array.
pub async fn lrange(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let lrange_arguments = LrangeArguments::parse(arguments)?;

    let mut store_guard = store.lock().await;
    let Some(list) = store_guard.list(&lrange_arguments.key) else {
        return Ok(CommandResult::Response(RespValue::Array(Vec::new())));
    };

    let values: Vec<&String> =
        match normalize_range(lrange_arguments.start, lrange_arguments.end, list.len()) {
            Some((start, end)) => list.range(start..=end).collect(),
            None => Vec::new(),
        };

    Ok(CommandResult::Response(RespValue::array_of_bulk_strings(
        &values,
    )))
}
