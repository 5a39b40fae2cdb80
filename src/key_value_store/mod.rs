//! The keyspace: every key maps to exactly one typed value.
//!
//! Expiry is lazy. Any access to a key first checks its expiration and deletes
//! it when the instant has passed, so callers never observe expired data.

pub mod geo;
mod sorted_set;
mod stream;

use std::collections::{HashMap, VecDeque};

use jiff::Timestamp;
use thiserror::Error;

pub use sorted_set::SortedSet;
pub use stream::{entries_to_resp, IdRequest, Stream, StreamEntry, StreamError, StreamId};

#[derive(Error, Debug, PartialEq)]
pub enum StoreError {
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    String(String),
    List(VecDeque<String>),
    SortedSet(SortedSet),
    Stream(Stream),
}

impl DataType {
    pub fn type_name(&self) -> &'static str {
        match self {
            DataType::String(_) => "string",
            DataType::List(_) => "list",
            DataType::SortedSet(_) => "zset",
            DataType::Stream(_) => "stream",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub data: DataType,
    pub expiration: Option<Timestamp>,
}

impl Value {
    pub fn new(data: DataType) -> Self {
        Self {
            data,
            expiration: None,
        }
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        matches!(self.expiration, Some(expiration) if now >= expiration)
    }
}

#[derive(Debug, Default)]
pub struct KeyValueStore {
    entries: HashMap<String, Value>,
}

impl KeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn purge_if_expired(&mut self, key: &str) {
        let now = Timestamp::now();

        if self.entries.get(key).is_some_and(|value| value.is_expired(now)) {
            self.entries.remove(key);
        }
    }

    pub fn get(&mut self, key: &str) -> Option<&Value> {
        self.purge_if_expired(key);
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.purge_if_expired(key);
        self.entries.get_mut(key)
    }

    pub fn insert(&mut self, key: String, value: Value) {
        self.entries.insert(key, value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.purge_if_expired(key);
        self.entries.remove(key)
    }

    pub fn contains_key(&mut self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Every live key, sorted so replies are deterministic.
    pub fn keys(&mut self) -> Vec<String> {
        let now = Timestamp::now();
        self.entries.retain(|_, value| !value.is_expired(now));

        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reports `string`, `list`, `zset`, `stream` or `none`.
    pub fn type_of(&mut self, key: &str) -> &'static str {
        self.get(key)
            .map(|value| value.data.type_name())
            .unwrap_or("none")
    }

    pub fn string(&mut self, key: &str) -> Option<&String> {
        match self.get(key) {
            Some(Value {
                data: DataType::String(value),
                ..
            }) => Some(value),
            _ => None,
        }
    }

    pub fn list(&mut self, key: &str) -> Option<&VecDeque<String>> {
        match self.get(key) {
            Some(Value {
                data: DataType::List(list),
                ..
            }) => Some(list),
            _ => None,
        }
    }

    /// Mutable access to a list. With `create` set, a missing key gets an empty list.
    pub fn list_mut(
        &mut self,
        key: &str,
        create: bool,
    ) -> Result<Option<&mut VecDeque<String>>, StoreError> {
        self.create_if_missing(key, create, || DataType::List(VecDeque::new()));

        match self.entries.get_mut(key) {
            None => Ok(None),
            Some(Value {
                data: DataType::List(list),
                ..
            }) => Ok(Some(list)),
            Some(_) => Err(StoreError::WrongType),
        }
    }

    pub fn sorted_set(&mut self, key: &str) -> Option<&SortedSet> {
        match self.get(key) {
            Some(Value {
                data: DataType::SortedSet(set),
                ..
            }) => Some(set),
            _ => None,
        }
    }

    pub fn sorted_set_mut(
        &mut self,
        key: &str,
        create: bool,
    ) -> Result<Option<&mut SortedSet>, StoreError> {
        self.create_if_missing(key, create, || DataType::SortedSet(SortedSet::default()));

        match self.entries.get_mut(key) {
            None => Ok(None),
            Some(Value {
                data: DataType::SortedSet(set),
                ..
            }) => Ok(Some(set)),
            Some(_) => Err(StoreError::WrongType),
        }
    }

    pub fn stream(&mut self, key: &str) -> Option<&Stream> {
        match self.get(key) {
            Some(Value {
                data: DataType::Stream(stream),
                ..
            }) => Some(stream),
            _ => None,
        }
    }

    pub fn stream_mut(
        &mut self,
        key: &str,
        create: bool,
    ) -> Result<Option<&mut Stream>, StoreError> {
        self.create_if_missing(key, create, || DataType::Stream(Stream::default()));

        match self.entries.get_mut(key) {
            None => Ok(None),
            Some(Value {
                data: DataType::Stream(stream),
                ..
            }) => Ok(Some(stream)),
            Some(_) => Err(StoreError::WrongType),
        }
    }

    /// Drops a list or sorted set once its last element is gone.
    pub fn remove_if_empty(&mut self, key: &str) {
        let empty = match self.entries.get(key) {
            Some(Value {
                data: DataType::List(list),
                ..
            }) => list.is_empty(),
            Some(Value {
                data: DataType::SortedSet(set),
                ..
            }) => set.is_empty(),
            _ => false,
        };

        if empty {
            self.entries.remove(key);
        }
    }

    fn create_if_missing(&mut self, key: &str, create: bool, data: impl FnOnce() -> DataType) {
        self.purge_if_expired(key);

        if create && !self.entries.contains_key(key) {
            self.entries.insert(key.to_string(), Value::new(data()));
        }
    }
}

/// Normalizes an inclusive `[start, end]` range that may use negative indices
/// counted from the end. Returns `None` when the range selects nothing.
pub fn normalize_range(start: i64, end: i64, len: usize) -> Option<(usize, usize)> {
    let len = len as i64;

    let start = if start < 0 { (len + start).max(0) } else { start };
    let end = if end < 0 { len + end } else { end.min(len - 1) };

    if len == 0 || end < 0 || start > end || start >= len {
        return None;
    }

    Some((start as usize, end as usize))
}
