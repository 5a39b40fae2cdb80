use std::collections::HashMap;

use tracing::{debug, warn};

use crate::rdb::{
    encoding::{parse_length, parse_string},
    get_slice::{get_buffer_slice, get_buffer_array},
    opcode::{
        is_section_opcode, parse_magic_string, parse_record, DATABASE_OPCODE,
        END_OF_FILE_OPCODE, HEADER_LENGTH, METADATA_OPCODE, RESIZE_DB_OPCODE,
    },
    RdbError,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRecord {
    pub key: String,
    pub value: String,
    pub expires_at_ms: Option<u64>,
}

/// Best-effort snapshot decoder.
///
/// A malformed section is abandoned and scanning resumes at the next section
/// marker, so whatever decoded cleanly before the fault is kept.
#[derive(Debug, Default)]
pub struct RdbParser {
    cursor: usize,
    pub redis_version: Option<String>,
    pub metadata: HashMap<String, String>,
    pub records: Vec<SnapshotRecord>,
    pub crc64_checksum: Option<[u8; 8]>,
}

impl RdbParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(&mut self, buffer: &[u8]) {
        let version = match parse_magic_string(buffer) {
            Ok(version) => version,
            Err(e) => {
                warn!(error = %e, "ignoring snapshot with invalid header");
                return;
            }
        };

        self.redis_version = Some(version);
        self.cursor = HEADER_LENGTH;

        while self.cursor < buffer.len() {
            let result = match buffer[self.cursor] {
                METADATA_OPCODE => self.parse_metadata(buffer),
                DATABASE_OPCODE => self.parse_database(buffer),
                END_OF_FILE_OPCODE => {
                    self.crc64_checksum = get_buffer_array::<8>(buffer, self.cursor + 1).ok();
                    break;
                }
                _ => {
                    self.cursor += 1;
                    Ok(())
                }
            };

            if let Err(e) = result {
                warn!(error = %e, offset = self.cursor, "abandoning snapshot section");
                self.skip_to_next_section(buffer);
            }
        }
    }

    fn parse_metadata(&mut self, buffer: &[u8]) -> Result<(), RdbError> {
        let mut cursor = self.cursor + 1;

        let (key, key_length) = parse_string(buffer, cursor)?;
        cursor += key_length;
        let (value, value_length) = parse_string(buffer, cursor)?;
        cursor += value_length;

        self.metadata.insert(key, value);
        self.cursor = cursor;

        Ok(())
    }

    fn parse_database(&mut self, buffer: &[u8]) -> Result<(), RdbError> {
        let mut cursor = self.cursor + 1;

        let (database_index, length) = parse_length(buffer, cursor)?;
        cursor += length;

        if get_buffer_slice(buffer, cursor, 1)?[0] != RESIZE_DB_OPCODE {
            return Err(RdbError::MissingResizeDb);
        }
        cursor += 1;

        let (key_count, length) = parse_length(buffer, cursor)?;
        cursor += length;
        let (expires_count, length) = parse_length(buffer, cursor)?;
        cursor += length;

        self.cursor = cursor;
        debug!(database_index, key_count, expires_count, "decoding database section");

        for _ in 0..key_count {
            let (record, length) = parse_record(buffer, self.cursor)?;
            self.cursor += length;
            self.records.push(record);
        }

        Ok(())
    }

    fn skip_to_next_section(&mut self, buffer: &[u8]) {
        self.cursor += 1;

        while self.cursor < buffer.len() && !is_section_opcode(buffer[self.cursor]) {
            self.cursor += 1;
        }
    }
}

/// Decodes a complete snapshot into key/value/expiry records. Never fails: a bad
/// header yields no records and a bad section yields the records before the fault.
pub fn decode_snapshot(buffer: &[u8]) -> Vec<SnapshotRecord> {
    let mut parser = RdbParser::new();
    parser.parse(buffer);
    parser.records
}
