use crate::rdb::RdbError;

pub fn get_buffer_slice(buffer: &[u8], cursor: usize, len: usize) -> Result<&[u8], RdbError> {
    let end = cursor.checked_add(len).ok_or(RdbError::UnexpectedEof)?;

    buffer.get(cursor..end).ok_or(RdbError::UnexpectedEof)
}

/// Reads exactly `N` bytes, for fixed-width integers.
pub fn get_buffer_array<const N: usize>(buffer: &[u8], cursor: usize) -> Result<[u8; N], RdbError> {
    let slice = get_buffer_slice(buffer, cursor, N)?;

    <[u8; N]>::try_from(slice).map_err(|_| RdbError::UnexpectedEof)
}
