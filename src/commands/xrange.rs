use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::{entries_to_resp, KeyValueStore, StreamId},
};

pub struct XrangeArguments {
    key: String,
    start: StreamId,
    end: StreamId,
}

impl XrangeArguments {
    /// `-` and `+` are the smallest and largest IDs. A bare millisecond value
    /// covers its whole millisecond: sequence 0 as a start, the maximum as an end.
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 2 && arguments.len() != 3 {
            return Err(CommandError::wrong_arguments("xrange"));
        }

        let start = match arguments[1].as_str() {
            "-" => StreamId::MIN,
            id => StreamId::parse(id, 0).ok_or(CommandError::InvalidStreamId)?,
        };

        let end = match arguments.get(2).map(String::as_str) {
            None | Some("+") => StreamId::MAX,
            Some(id) => StreamId::parse(id, u64::MAX).ok_or(CommandError::InvalidStreamId)?,
        };

        Ok(Self {
            key: arguments[0].clone(),
            start,
            end,
        })
    }
}

pub async fn xrange(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let xrange_arguments = XrangeArguments::parse(arguments)?;

    let mut store_guard = store.lock().await;
    let entries = store_guard
        .stream(&xrange_arguments.key)
        .map(|stream| stream.range(xrange_arguments.start, xrange_arguments.end))
        .unwrap_or_default();

    Ok(CommandResult::Response(entries_to_resp(&entries)))
}
