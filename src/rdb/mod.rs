mod encoding;
mod get_slice;
mod opcode;
mod rdb_file_operations;
mod rdb_parser;

use thiserror::Error;

pub use rdb_file_operations::{load_records, load_snapshot_file, EMPTY_RDB};
pub use rdb_parser::{decode_snapshot, RdbParser, SnapshotRecord};

#[derive(Error, Debug, PartialEq)]
pub enum RdbError {
    #[error("unexpected end of snapshot data")]
    UnexpectedEof,
    #[error("invalid magic string")]
    InvalidMagicString,
    #[error("invalid length encoding 0x{0:02X}")]
    InvalidLength(u8),
    #[error("LZF-compressed strings are not supported")]
    CompressedString,
    #[error("invalid UTF-8 in snapshot string")]
    InvalidUtf8,
    #[error("database section without a hash table size marker")]
    MissingResizeDb,
}
