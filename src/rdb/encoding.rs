use crate::rdb::{
    get_slice::{get_buffer_array, get_buffer_slice},
    RdbError,
};

#[derive(Debug, PartialEq)]
enum LengthEncoding {
    Length(usize),
    Int8,
    Int16,
    Int32,
    LzfCompressedString,
}

/// Decodes the size prefix at `cursor`. Returns the encoding and the number of bytes read.
fn parse_length_encoding(bytes: &[u8], cursor: usize) -> Result<(LengthEncoding, usize), RdbError> {
    let mut temp_cursor = cursor;
    let byte = get_buffer_slice(bytes, temp_cursor, 1)?[0];
    temp_cursor += 1;

    // The two most significant bits select the encoding
    let encoding = match byte >> 6 {
        0b00 => LengthEncoding::Length((byte & 0b0011_1111) as usize),
        0b01 => {
            // 14-bit length: the low 6 bits of this byte are the high bits
            let next_byte = get_buffer_slice(bytes, temp_cursor, 1)?[0];
            temp_cursor += 1;

            let length = (((byte & 0b0011_1111) as usize) << 8) | next_byte as usize;
            LengthEncoding::Length(length)
        }
        0b10 => {
            if byte == 0x81 {
                let length = u64::from_be_bytes(get_buffer_array::<8>(bytes, temp_cursor)?);
                temp_cursor += 8;

                let length = usize::try_from(length).map_err(|_| RdbError::InvalidLength(byte))?;
                LengthEncoding::Length(length)
            } else {
                let length = u32::from_be_bytes(get_buffer_array::<4>(bytes, temp_cursor)?);
                temp_cursor += 4;

                LengthEncoding::Length(length as usize)
            }
        }
        _ => match byte & 0b0011_1111 {
            0 => LengthEncoding::Int8,
            1 => LengthEncoding::Int16,
            2 => LengthEncoding::Int32,
            3 => LengthEncoding::LzfCompressedString,
            _ => return Err(RdbError::InvalidLength(byte)),
        },
    };

    Ok((encoding, temp_cursor - cursor))
}

/// Reads a size-encoded integer such as a database index or a table size.
pub fn parse_length(bytes: &[u8], cursor: usize) -> Result<(usize, usize), RdbError> {
    match parse_length_encoding(bytes, cursor)? {
        (LengthEncoding::Length(length), bytes_read) => Ok((length, bytes_read)),
        _ => Err(RdbError::InvalidLength(bytes[cursor])),
    }
}

/// Reads a string, including strings stored as immediate little-endian integers.
pub fn parse_string(bytes: &[u8], cursor: usize) -> Result<(String, usize), RdbError> {
    let (encoding, mut bytes_read) = parse_length_encoding(bytes, cursor)?;
    let data_cursor = cursor + bytes_read;

    let value = match encoding {
        LengthEncoding::Length(length) => {
            let slice = get_buffer_slice(bytes, data_cursor, length)?;
            bytes_read += length;

            String::from_utf8(slice.to_vec()).map_err(|_| RdbError::InvalidUtf8)?
        }
        LengthEncoding::Int8 => {
            bytes_read += 1;
            i8::from_le_bytes(get_buffer_array::<1>(bytes, data_cursor)?).to_string()
        }
        LengthEncoding::Int16 => {
            bytes_read += 2;
            i16::from_le_bytes(get_buffer_array::<2>(bytes, data_cursor)?).to_string()
        }
        LengthEncoding::Int32 => {
            bytes_read += 4;
            i32::from_le_bytes(get_buffer_array::<4>(bytes, data_cursor)?).to_string()
        }
        LengthEncoding::LzfCompressedString => return Err(RdbError::CompressedString),
    };

    Ok((value, bytes_read))
}
