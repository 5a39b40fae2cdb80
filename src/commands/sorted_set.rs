//! ZADD, ZRANK, ZRANGE, ZCARD, ZSCORE and ZREM.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{
        command_error::CommandError,
        command_handler::CommandResult,
        command_utils::{parse_float, parse_integer},
    },
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct ZaddArguments {
    key: String,
    members: Vec<(f64, String)>,
}

impl ZaddArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 3 || arguments.len() % 2 == 0 {
            return Err(CommandError::wrong_arguments("zadd"));
        }

        let members = arguments[1..]
            .chunks(2)
            .map(|pair| Ok((parse_float(&pair[0])?, pair[1].clone())))
            .collect::<Result<Vec<_>, CommandError>>()?;

        Ok(Self {
            key: arguments[0].clone(),
            members,
        })
    }
}

/// Replies with the number of members that were not present before. Scores of
/// existing members are overwritten.
pub async fn zadd(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let zadd_arguments = ZaddArguments::parse(arguments)?;

    let mut store_guard = store.lock().await;
    let Some(set) = store_guard.sorted_set_mut(&zadd_arguments.key, true)? else {
        return Ok(CommandResult::Response(RespValue::Integer(0)));
    };

    let added = zadd_arguments
        .members
        .into_iter()
        .filter(|(score, member)| set.insert(member.clone(), *score))
        .count();

    Ok(CommandResult::Response(RespValue::Integer(added as i64)))
}

pub async fn zrank(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let [key, member]: [String; 2] = arguments
        .try_into()
        .map_err(|_| CommandError::wrong_arguments("zrank"))?;

    let mut store_guard = store.lock().await;
    let rank = store_guard
        .sorted_set(&key)
        .and_then(|set| set.rank(&member));

    let response = match rank {
        Some(rank) => RespValue::Integer(rank as i64),
        None => RespValue::NullBulkString,
    };

    Ok(CommandResult::Response(response))
}

/// Member names (no scores) over the same inclusive, negative-aware range as LRANGE.
pub async fn zrange(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let [key, start, end]: [String; 3] = arguments
        .try_into()
        .map_err(|_| CommandError::wrong_arguments("zrange"))?;

    let start = parse_integer(&start)?;
    let end = parse_integer(&end)?;

    let mut store_guard = store.lock().await;
    let members = store_guard
        .sorted_set(&key)
        .map(|set| set.range(start, end))
        .unwrap_or_default();

    Ok(CommandResult::Response(RespValue::array_of_bulk_strings(
        &members,
    )))
}

pub async fn zcard(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    if arguments.len() != 1 {
        return Err(CommandError::wrong_arguments("zcard"));
    }

    let mut store_guard = store.lock().await;
    let count = store_guard.sorted_set(&arguments[0]).map_or(0, |set| set.len());

    Ok(CommandResult::Response(RespValue::Integer(count as i64)))
}

pub async fn zscore(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let [key, member]: [String; 2] = arguments
        .try_into()
        .map_err(|_| CommandError::wrong_arguments("zscore"))?;

    let mut store_guard = store.lock().await;

    let response = match store_guard.sorted_set(&key).and_then(|set| set.score(&member)) {
        Some(score) => RespValue::BulkString(score.to_string()),
        None => RespValue::NullBulkString,
    };

    Ok(CommandResult::Response(response))
}

/// Removes members and drops the key once the set is empty.
pub async fn zrem(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    if arguments.len() < 2 {
        return Err(CommandError::wrong_arguments("zrem"));
    }

    let key = &arguments[0];
    let mut store_guard = store.lock().await;

    let Some(set) = store_guard.sorted_set_mut(key, false)? else {
        return Ok(CommandResult::Response(RespValue::Integer(0)));
    };

    let removed = arguments[1..]
        .iter()
        .filter(|member| set.remove(member))
        .count();

    store_guard.remove_if_empty(key);

    Ok(CommandResult::Response(RespValue::Integer(removed as i64)))
}
