use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{
        command_error::CommandError, command_handler::CommandResult,
        command_utils::now_in_milliseconds,
    },
    key_value_store::{DataType, IdRequest, KeyValueStore, Stream, Value},
    resp::RespValue,
    state::State,
};

pub struct XaddArguments {
    key: String,
    id: IdRequest,
    fields: Vec<(String, String)>,
}

impl XaddArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 4 || arguments.len() % 2 != 0 {
            return Err(CommandError::wrong_arguments("xadd"));
        }

        let id = IdRequest::parse(&arguments[1]).ok_or(CommandError::InvalidStreamId)?;

        let fields = arguments[2..]
            .chunks(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect();

        Ok(Self {
            key: arguments[0].clone(),
            id,
            fields,
        })
    }
}

/// Handles the Redis XADD command.
///
/// The key is only created once the ID has been accepted, so a rejected first
/// XADD leaves no empty stream behind. Blocked XREAD callers waiting on the key
/// are served before the reply is returned.
pub async fn xadd(
    store: Arc<Mutex<KeyValueStore>>,
    state: Arc<Mutex<State>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let xadd_arguments = XaddArguments::parse(arguments)?;
    let key = xadd_arguments.key;
    let now_ms = now_in_milliseconds();

    let mut store_guard = store.lock().await;

    let id = match store_guard.stream_mut(&key, false)? {
        Some(stream) => stream.add(xadd_arguments.id, xadd_arguments.fields, now_ms)?,
        None => {
            let mut stream = Stream::default();
            let id = stream.add(xadd_arguments.id, xadd_arguments.fields, now_ms)?;
            store_guard.insert(key.clone(), Value::new(DataType::Stream(stream)));
            id
        }
    };

    if let Some(stream) = store_guard.stream(&key) {
        let mut state_guard = state.lock().await;
        state_guard.blocking.serve_stream_waiters(&key, stream);
    }

    Ok(CommandResult::Response(RespValue::BulkString(
        id.to_string(),
    )))
}
