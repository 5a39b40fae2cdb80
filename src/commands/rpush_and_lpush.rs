use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
    state::State,
};

pub struct PushArrayOperations {
    key: String,
    values: Vec<String>,
}

impl PushArrayOperations {
    pub fn parse(arguments: Vec<String>, should_prepend: bool) -> Result<Self, CommandError> {
        if arguments.len() < 2 {
            let command = if should_prepend { "lpush" } else { "rpush" };
            return Err(CommandError::wrong_arguments(command));
        }

        let mut iter = arguments.into_iter();

        Ok(Self {
            key: iter.next().unwrap_or_default(),
            values: iter.collect(),
        })
    }
}

pub async fn rpush(
    store: Arc<Mutex<KeyValueStore>>,
    state: Arc<Mutex<State>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    push_array_operations(store, state, arguments, false).await
}

/// LPUSH inserts each value at the head in turn, so `LPUSH k x y` leaves `y`
/// first and `x` second.
pub async fn lpush(
    store: Arc<Mutex<KeyValueStore>>,
    state: Arc<Mutex<State>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    push_array_operations(store, state, arguments, true).await
}

/// Pushes the values, then hands elements from the head to blocked BLPOP
/// callers in arrival order. The reply is the length right after the push.
async fn push_array_operations(
    store: Arc<Mutex<KeyValueStore>>,
    state: Arc<Mutex<State>>,
    arguments: Vec<String>,
    should_prepend: bool,
) -> Result<CommandResult, CommandError> {
    let push_array_arguments = PushArrayOperations::parse(arguments, should_prepend)?;
    let key = push_array_arguments.key;

    let mut store_guard = store.lock().await;
    let Some(list) = store_guard.list_mut(&key, true)? else {
        return Ok(CommandResult::Response(RespValue::Integer(0)));
    };

    for value in push_array_arguments.values {
        if should_prepend {
            list.push_front(value);
        } else {
            list.push_back(value);
        }
    }

    let length = list.len();

    let mut state_guard = state.lock().await;
    state_guard.blocking.serve_list_waiters(&key, list);
    drop(state_guard);

    store_guard.remove_if_empty(&key);

    Ok(CommandResult::Response(RespValue::Integer(length as i64)))
}
