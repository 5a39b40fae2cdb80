use crate::rdb::{
    encoding::parse_string,
    get_slice::{get_buffer_array, get_buffer_slice},
    RdbError, SnapshotRecord,
};

pub const METADATA_OPCODE: u8 = 0xFA;
pub const RESIZE_DB_OPCODE: u8 = 0xFB;
pub const EXPIRATION_MILLISECONDS_OPCODE: u8 = 0xFC;
pub const EXPIRATION_SECONDS_OPCODE: u8 = 0xFD;
pub const DATABASE_OPCODE: u8 = 0xFE;
pub const END_OF_FILE_OPCODE: u8 = 0xFF;

/// "REDIS" followed by a four digit version.
pub const HEADER_LENGTH: usize = 9;

pub fn is_section_opcode(byte: u8) -> bool {
    matches!(byte, METADATA_OPCODE | DATABASE_OPCODE | END_OF_FILE_OPCODE)
}

/// Validates the magic string and returns the format version that follows it.
pub fn parse_magic_string(bytes: &[u8]) -> Result<String, RdbError> {
    let magic_string = get_buffer_slice(bytes, 0, 5)?;

    if magic_string != b"REDIS" {
        return Err(RdbError::InvalidMagicString);
    }

    let version = get_buffer_slice(bytes, 5, 4)?;

    String::from_utf8(version.to_vec()).map_err(|_| RdbError::InvalidUtf8)
}

/// Decodes one key/value record, including its optional expiry prefix.
pub fn parse_record(bytes: &[u8], cursor: usize) -> Result<(SnapshotRecord, usize), RdbError> {
    let mut temp_cursor = cursor;
    let marker = get_buffer_slice(bytes, temp_cursor, 1)?[0];

    let expires_at_ms = match marker {
        EXPIRATION_MILLISECONDS_OPCODE => {
            let timestamp = u64::from_le_bytes(get_buffer_array::<8>(bytes, temp_cursor + 1)?);
            temp_cursor += 9;
            Some(timestamp)
        }
        EXPIRATION_SECONDS_OPCODE => {
            let timestamp = u32::from_le_bytes(get_buffer_array::<4>(bytes, temp_cursor + 1)?);
            temp_cursor += 5;
            Some(timestamp as u64 * 1000)
        }
        _ => None,
    };

    // Value type tag; only plain strings are supported
    get_buffer_slice(bytes, temp_cursor, 1)?;
    temp_cursor += 1;

    let (key, key_length) = parse_string(bytes, temp_cursor)?;
    temp_cursor += key_length;
    let (value, value_length) = parse_string(bytes, temp_cursor)?;
    temp_cursor += value_length;

    Ok((
        SnapshotRecord {
            key,
            value,
            expires_at_ms,
        },
        temp_cursor - cursor,
    ))
}
