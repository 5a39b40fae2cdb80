use std::{collections::BTreeMap, fmt, ops::Bound};

use thiserror::Error;

use crate::resp::RespValue;

#[derive(Error, Debug, PartialEq)]
pub enum StreamError {
    #[error("ERR The ID specified in XADD must be greater than 0-0")]
    IdIsZero,
    #[error("ERR The ID specified in XADD is equal or smaller than the target stream top item")]
    IdTooSmall,
}

/// A stream entry identifier, ordered by milliseconds and then sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamId {
    pub ms: u64,
    pub seq: u64,
}

impl StreamId {
    pub const MIN: StreamId = StreamId { ms: 0, seq: 0 };
    pub const MAX: StreamId = StreamId {
        ms: u64::MAX,
        seq: u64::MAX,
    };

    pub fn new(ms: u64, seq: u64) -> Self {
        Self { ms, seq }
    }

    /// Parses `<ms>-<seq>`. A bare `<ms>` takes `default_seq` as its sequence.
    pub fn parse(input: &str, default_seq: u64) -> Option<Self> {
        match input.split_once('-') {
            Some((ms, seq)) => Some(Self::new(ms.parse().ok()?, seq.parse().ok()?)),
            None => Some(Self::new(input.parse().ok()?, default_seq)),
        }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.ms, self.seq)
    }
}

/// The ID argument of XADD before it is resolved against the stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IdRequest {
    /// `*`
    Auto,
    /// `<ms>-*`
    AutoSequence(u64),
    Explicit(StreamId),
}

impl IdRequest {
    pub fn parse(input: &str) -> Option<Self> {
        if input == "*" {
            return Some(IdRequest::Auto);
        }

        let (ms, seq) = input.split_once('-')?;
        let ms = ms.parse::<u64>().ok()?;

        if seq == "*" {
            return Some(IdRequest::AutoSequence(ms));
        }

        Some(IdRequest::Explicit(StreamId::new(ms, seq.parse().ok()?)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamEntry {
    pub id: StreamId,
    pub fields: Vec<(String, String)>,
}

impl StreamEntry {
    pub fn to_resp(&self) -> RespValue {
        let fields = self
            .fields
            .iter()
            .flat_map(|(field, value)| {
                [
                    RespValue::BulkString(field.clone()),
                    RespValue::BulkString(value.clone()),
                ]
            })
            .collect();

        RespValue::Array(vec![
            RespValue::BulkString(self.id.to_string()),
            RespValue::Array(fields),
        ])
    }
}

pub fn entries_to_resp(entries: &[StreamEntry]) -> RespValue {
    RespValue::Array(entries.iter().map(StreamEntry::to_resp).collect())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stream {
    entries: BTreeMap<StreamId, Vec<(String, String)>>,
    last_id: StreamId,
}

impl Stream {
    pub fn last_id(&self) -> StreamId {
        self.last_id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Turns an XADD ID argument into a concrete ID that is strictly greater than
    /// the last accepted one, or explains why that is impossible.
    pub fn resolve_id(&self, request: IdRequest, now_ms: u64) -> Result<StreamId, StreamError> {
        let id = match request {
            IdRequest::Auto => {
                if now_ms > self.last_id.ms {
                    StreamId::new(now_ms, 0)
                } else {
                    StreamId::new(self.last_id.ms, self.last_id.seq.saturating_add(1))
                }
            }
            IdRequest::AutoSequence(ms) => {
                if !self.is_empty() && ms == self.last_id.ms {
                    StreamId::new(ms, self.last_id.seq.saturating_add(1))
                } else if ms == 0 {
                    StreamId::new(0, 1)
                } else {
                    StreamId::new(ms, 0)
                }
            }
            IdRequest::Explicit(id) => id,
        };

        if id == StreamId::MIN {
            return Err(StreamError::IdIsZero);
        }

        if id <= self.last_id {
            return Err(StreamError::IdTooSmall);
        }

        Ok(id)
    }

    pub fn add(
        &mut self,
        request: IdRequest,
        fields: Vec<(String, String)>,
        now_ms: u64,
    ) -> Result<StreamId, StreamError> {
        let id = self.resolve_id(request, now_ms)?;

        self.entries.insert(id, fields);
        self.last_id = id;

        Ok(id)
    }

    /// Entries with IDs in `[start, end]`, in ascending order.
    pub fn range(&self, start: StreamId, end: StreamId) -> Vec<StreamEntry> {
        if start > end {
            return Vec::new();
        }

        self.collect((Bound::Included(start), Bound::Included(end)))
    }

    /// Entries with IDs strictly greater than `id`.
    pub fn entries_after(&self, id: StreamId) -> Vec<StreamEntry> {
        self.collect((Bound::Excluded(id), Bound::Unbounded))
    }

    fn collect(&self, bounds: (Bound<StreamId>, Bound<StreamId>)) -> Vec<StreamEntry> {
        self.entries
            .range(bounds)
            .map(|(id, fields)| StreamEntry {
                id: *id,
                fields: fields.clone(),
            })
            .collect()
    }
}
