//! Redis Serialization Protocol (RESP) values.
//!
//! Requests always arrive as arrays of bulk strings, but the follower side of
//! replication reads leader replies with the same grammar, so every reply type
//! can be decoded as well as encoded.

use thiserror::Error;

/// Largest bulk string accepted from a peer (512 MB, same as Redis).
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Largest element count accepted for a single array.
pub const MAX_ARRAY_LENGTH: usize = 1024 * 1024;

/// Arrays nested deeper than this are rejected instead of recursed into.
pub const MAX_NESTING_DEPTH: usize = 32;

/// Elements reserved up front; the rest grow as they are actually decoded.
const PREALLOCATED_ELEMENTS: usize = 64;

#[derive(Error, Debug, PartialEq)]
pub enum RespError {
    #[error("invalid type prefix byte {0:#04x}")]
    InvalidPrefix(u8),
    #[error("invalid length")]
    InvalidLength,
    #[error("invalid integer")]
    InvalidInteger,
    #[error("invalid UTF-8 sequence")]
    InvalidUtf8,
    #[error("missing CRLF terminator")]
    MissingTerminator,
    #[error("invalid bulk length {size} (max: {max})")]
    BulkTooLarge { size: usize, max: usize },
    #[error("invalid multibulk length {size} (max: {max})")]
    ArrayTooLarge { size: usize, max: usize },
    #[error("maximum nesting depth {0} exceeded")]
    NestingTooDeep(usize),
}

impl RespError {
    pub fn as_resp(&self) -> RespValue {
        RespValue::Error(format!("ERR Protocol error: {}", self))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(String),
    NullBulkString,
    Array(Vec<RespValue>),
    NullArray,
}

impl RespValue {
    /// Encodes the value into its wire form. Bulk string lengths are byte
    /// lengths, not character counts.
    pub fn encode(&self) -> String {
        match self {
            RespValue::SimpleString(s) => format!("+{}\r\n", s),
            RespValue::Error(msg) => format!("-{}\r\n", msg),
            RespValue::Integer(i) => format!(":{}\r\n", i),
            RespValue::BulkString(s) => format!("${}\r\n{}\r\n", s.len(), s),
            RespValue::NullBulkString => "$-1\r\n".to_string(),
            RespValue::Array(elements) => {
                let mut encoded = format!("*{}\r\n", elements.len());

                for element in elements {
                    encoded.push_str(&element.encode());
                }

                encoded
            }
            RespValue::NullArray => "*-1\r\n".to_string(),
        }
    }

    /// Decodes a single value from the front of `buffer`.
    ///
    /// # Returns
    ///
    /// * `Ok(Some((value, consumed)))` - A complete value and the number of bytes it used
    /// * `Ok(None)` - The buffer holds only part of a value
    /// * `Err(RespError)` - The bytes can never form a valid value
    pub fn decode(buffer: &[u8]) -> Result<Option<(RespValue, usize)>, RespError> {
        RespValue::decode_nested(buffer, 0)
    }

    fn decode_nested(
        buffer: &[u8],
        depth: usize,
    ) -> Result<Option<(RespValue, usize)>, RespError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(RespError::NestingTooDeep(MAX_NESTING_DEPTH));
        }

        let Some(&prefix) = buffer.first() else {
            return Ok(None);
        };

        if !matches!(prefix, b'+' | b'-' | b':' | b'$' | b'*') {
            return Err(RespError::InvalidPrefix(prefix));
        }

        let Some((line, line_end)) = read_line(buffer, 1) else {
            return Ok(None);
        };

        match prefix {
            b'+' => Ok(Some((RespValue::SimpleString(to_string(line)?), line_end))),
            b'-' => Ok(Some((RespValue::Error(to_string(line)?), line_end))),
            b':' => Ok(Some((RespValue::Integer(parse_integer(line)?), line_end))),
            b'$' => {
                let length = parse_integer(line)?;

                if length == -1 {
                    return Ok(Some((RespValue::NullBulkString, line_end)));
                }

                let length = usize::try_from(length).map_err(|_| RespError::InvalidLength)?;

                if length > MAX_BULK_SIZE {
                    return Err(RespError::BulkTooLarge {
                        size: length,
                        max: MAX_BULK_SIZE,
                    });
                }

                let data_end = line_end + length;

                if buffer.len() < data_end + 2 {
                    return Ok(None);
                }

                if &buffer[data_end..data_end + 2] != b"\r\n" {
                    return Err(RespError::MissingTerminator);
                }

                let content = to_string(&buffer[line_end..data_end])?;

                Ok(Some((RespValue::BulkString(content), data_end + 2)))
            }
            b'*' => {
                let count = parse_integer(line)?;

                if count == -1 {
                    return Ok(Some((RespValue::NullArray, line_end)));
                }

                let count = usize::try_from(count).map_err(|_| RespError::InvalidLength)?;

                if count > MAX_ARRAY_LENGTH {
                    return Err(RespError::ArrayTooLarge {
                        size: count,
                        max: MAX_ARRAY_LENGTH,
                    });
                }

                let mut elements = Vec::with_capacity(count.min(PREALLOCATED_ELEMENTS));
                let mut cursor = line_end;

                for _ in 0..count {
                    match RespValue::decode_nested(&buffer[cursor..], depth + 1)? {
                        Some((element, consumed)) => {
                            elements.push(element);
                            cursor += consumed;
                        }
                        None => return Ok(None),
                    }
                }

                Ok(Some((RespValue::Array(elements), cursor)))
            }
            other => Err(RespError::InvalidPrefix(other)),
        }
    }

    /// Packs strings into an array of bulk strings, the shape every request has.
    pub fn encode_array_from_strings<S: AsRef<str>>(values: &[S]) -> String {
        RespValue::array_of_bulk_strings(values).encode()
    }

    pub fn array_of_bulk_strings<S: AsRef<str>>(values: &[S]) -> RespValue {
        RespValue::Array(
            values
                .iter()
                .map(|value| RespValue::BulkString(value.as_ref().to_string()))
                .collect(),
        )
    }
}

/// Returns the line starting at `start` (without its CRLF) and the index just past the CRLF.
fn read_line(buffer: &[u8], start: usize) -> Option<(&[u8], usize)> {
    buffer[start..]
        .windows(2)
        .position(|window| window == b"\r\n")
        .map(|position| (&buffer[start..start + position], start + position + 2))
}

fn to_string(bytes: &[u8]) -> Result<String, RespError> {
    String::from_utf8(bytes.to_vec()).map_err(|_| RespError::InvalidUtf8)
}

fn parse_integer(bytes: &[u8]) -> Result<i64, RespError> {
    std::str::from_utf8(bytes)
        .map_err(|_| RespError::InvalidUtf8)?
        .parse::<i64>()
        .map_err(|_| RespError::InvalidInteger)
}
