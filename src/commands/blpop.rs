use std::{sync::Arc, time::Duration};

use tokio::sync::Mutex;

use crate::{
    commands::{
        command_error::CommandError, command_handler::CommandResult,
        command_utils::parse_timeout_seconds,
    },
    key_value_store::KeyValueStore,
    resp::RespValue,
    state::{ClientId, State},
};

pub struct BlpopArguments {
    key: String,
    timeout: Option<Duration>,
}

impl BlpopArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [key, timeout]: [String; 2] = arguments
            .try_into()
            .map_err(|_| CommandError::wrong_arguments("blpop"))?;

        Ok(Self {
            key,
            timeout: parse_timeout_seconds(&timeout)?,
        })
    }
}

/// Handles the Redis BLPOP command.
///
/// Pops immediately when the list has data. Otherwise the caller is queued
/// behind earlier waiters on the same key and RPUSH/LPUSH deliver to it. The
/// store stays locked while registering so no push can slip in between.
///
/// With `allow_blocking` unset (inside EXEC) an empty list replies with a null
/// array straight away.
pub async fn blpop(
    store: Arc<Mutex<KeyValueStore>>,
    state: Arc<Mutex<State>>,
    client_id: ClientId,
    arguments: Vec<String>,
    allow_blocking: bool,
) -> Result<CommandResult, CommandError> {
    let blpop_arguments = BlpopArguments::parse(arguments)?;
    let key = blpop_arguments.key;

    let mut store_guard = store.lock().await;
    let popped = store_guard
        .list_mut(&key, false)?
        .and_then(|list| list.pop_front());

    if let Some(value) = popped {
        store_guard.remove_if_empty(&key);

        return Ok(CommandResult::Response(RespValue::array_of_bulk_strings(&[
            key.as_str(),
            value.as_str(),
        ])));
    }

    if !allow_blocking {
        return Ok(CommandResult::Response(RespValue::NullArray));
    }

    let mut state_guard = state.lock().await;
    let (waiter_id, receiver) = state_guard.blocking.wait_for_list(client_id, &key);

    Ok(CommandResult::Blocked {
        waiter_id,
        receiver,
        timeout: blpop_arguments.timeout,
    })
}
