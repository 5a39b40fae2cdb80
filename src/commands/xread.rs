use std::{sync::Arc, time::Duration};

use tokio::sync::Mutex;

use crate::{
    commands::{
        command_error::CommandError,
        command_handler::CommandResult,
        command_utils::{parse_integer, parse_timeout_millis},
    },
    key_value_store::{entries_to_resp, KeyValueStore, StreamId},
    resp::RespValue,
    state::{ClientId, State},
};

#[derive(Debug, PartialEq)]
enum ReadFrom {
    /// `$`: only entries added after the command runs.
    LastId,
    After(StreamId),
}

#[derive(Debug)]
pub struct XreadArguments {
    /// `Some(None)` blocks forever, `None` does not block at all.
    block: Option<Option<Duration>>,
    count: Option<usize>,
    streams: Vec<(String, ReadFrom)>,
}

impl XreadArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let mut block = None;
        let mut count = None;
        let mut cursor = 0;

        loop {
            let Some(option) = arguments.get(cursor) else {
                return Err(CommandError::SyntaxError);
            };

            match option.to_uppercase().as_str() {
                "BLOCK" => {
                    let timeout = arguments.get(cursor + 1).ok_or(CommandError::SyntaxError)?;
                    block = Some(parse_timeout_millis(timeout)?);
                    cursor += 2;
                }
                "COUNT" => {
                    let value = arguments.get(cursor + 1).ok_or(CommandError::SyntaxError)?;
                    let value = parse_integer(value)?;
                    count = usize::try_from(value).ok().filter(|count| *count > 0);
                    cursor += 2;
                }
                "STREAMS" => {
                    cursor += 1;
                    break;
                }
                _ => return Err(CommandError::SyntaxError),
            }
        }

        let rest = &arguments[cursor..];

        if rest.is_empty() || rest.len() % 2 != 0 {
            return Err(CommandError::SyntaxError);
        }

        let (keys, ids) = rest.split_at(rest.len() / 2);

        let streams = keys
            .iter()
            .zip(ids)
            .map(|(key, id)| {
                let from = match id.as_str() {
                    "$" => ReadFrom::LastId,
                    id => ReadFrom::After(
                        StreamId::parse(id, 0).ok_or(CommandError::InvalidStreamId)?,
                    ),
                };

                Ok((key.clone(), from))
            })
            .collect::<Result<Vec<_>, CommandError>>()?;

        Ok(Self {
            block,
            count,
            streams,
        })
    }
}

/// Handles the Redis XREAD command.
///
/// Reads are exclusive of the given ID. Without BLOCK the reply has one
/// `[key, entries]` pair per requested stream, possibly empty. With BLOCK the
/// command returns at once if any stream already has newer entries, and
/// otherwise parks until XADD serves it or the timeout yields a null array.
pub async fn xread(
    store: Arc<Mutex<KeyValueStore>>,
    state: Arc<Mutex<State>>,
    client_id: ClientId,
    arguments: Vec<String>,
    allow_blocking: bool,
) -> Result<CommandResult, CommandError> {
    let xread_arguments = XreadArguments::parse(arguments)?;

    let mut store_guard = store.lock().await;

    let streams: Vec<(String, StreamId)> = xread_arguments
        .streams
        .into_iter()
        .map(|(key, from)| {
            let from = match from {
                ReadFrom::LastId => store_guard
                    .stream(&key)
                    .map_or(StreamId::MIN, |stream| stream.last_id()),
                ReadFrom::After(id) => id,
            };

            (key, from)
        })
        .collect();

    let mut results = Vec::with_capacity(streams.len());

    for (key, from) in &streams {
        let mut entries = store_guard
            .stream(key)
            .map(|stream| stream.entries_after(*from))
            .unwrap_or_default();

        if let Some(count) = xread_arguments.count {
            entries.truncate(count);
        }

        results.push((key.clone(), entries));
    }

    let Some(timeout) = xread_arguments.block else {
        let response = results
            .iter()
            .map(|(key, entries)| {
                RespValue::Array(vec![
                    RespValue::BulkString(key.clone()),
                    entries_to_resp(entries),
                ])
            })
            .collect();

        return Ok(CommandResult::Response(RespValue::Array(response)));
    };

    let ready: Vec<RespValue> = results
        .iter()
        .filter(|(_, entries)| !entries.is_empty())
        .map(|(key, entries)| {
            RespValue::Array(vec![
                RespValue::BulkString(key.clone()),
                entries_to_resp(entries),
            ])
        })
        .collect();

    if !ready.is_empty() {
        return Ok(CommandResult::Response(RespValue::Array(ready)));
    }

    if !allow_blocking {
        return Ok(CommandResult::Response(RespValue::NullArray));
    }

    let mut state_guard = state.lock().await;
    let (waiter_id, receiver) = state_guard.blocking.wait_for_streams(client_id, streams);

    Ok(CommandResult::Blocked {
        waiter_id,
        receiver,
        timeout,
    })
}
