use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{
        command_error::CommandError, command_handler::CommandResult, command_utils::parse_integer,
    },
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct LpopArguments {
    key: String,
    count: Option<usize>,
}

impl LpopArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.is_empty() || arguments.len() > 2 {
            return Err(CommandError::wrong_arguments("lpop"));
        }

        let count = match arguments.get(1) {
            Some(count) => {
                let count = parse_integer(count)?;
                Some(usize::try_from(count).map_err(|_| CommandError::NotPositive)?)
            }
            None => None,
        };

        Ok(Self {
            key: arguments[0].clone(),
            count,
        })
    }
}

/// Handles the Redis LPOP command.
///
/// # Returns
///
/// * Without a count, or with a count of 1: the head element as a bulk string
/// * With any other count: an array of up to `count` elements from the head
/// * A null bulk string when the key is missing, whatever the count
pub async fn lpop(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let lpop_arguments = LpopArguments::parse(arguments)?;
    let key = lpop_arguments.key;

    let mut store_guard = store.lock().await;
    let Some(list) = store_guard.list_mut(&key, false)? else {
        return Ok(CommandResult::Response(RespValue::NullBulkString));
    };

    let response = match lpop_arguments.count {
        Some(count) if count != 1 => {
            let count = count.min(list.len());
            let popped: Vec<String> = list.drain(..count).collect();
            RespValue::array_of_bulk_strings(&popped)
        }
        _ => match list.pop_front() {
            Some(value) => RespValue::BulkString(value),
            None => RespValue::NullBulkString,
        },
    };

    store_guard.remove_if_empty(&key);

    Ok(CommandResult::Response(response))
}
