use std::{path::Path, sync::Arc};

use jiff::Timestamp;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
    key_value_store::{DataType, KeyValueStore, Value},
    rdb::{decode_snapshot, SnapshotRecord},
};

/// The snapshot sent to followers on a full resync: header, metadata, no keys.
pub const EMPTY_RDB: [u8; 88] = [
    0x52, 0x45, 0x44, 0x49, 0x53, 0x30, 0x30, 0x31, 0x31, 0xfa, 0x09, 0x72,
    0x65, 0x64, 0x69, 0x73, 0x2d, 0x76, 0x65, 0x72, 0x05, 0x37, 0x2e, 0x32,
    0x2e, 0x30, 0xfa, 0x0a, 0x72, 0x65, 0x64, 0x69, 0x73, 0x2d, 0x62, 0x69,
    0x74, 0x73, 0xc0, 0x40, 0xfa, 0x05, 0x63, 0x74, 0x69, 0x6d, 0x65, 0xc2,
    0x6d, 0x08, 0xbc, 0x65, 0xfa, 0x08, 0x75, 0x73, 0x65, 0x64, 0x2d, 0x6d,
    0x65, 0x6d, 0xc2, 0xb0, 0xc4, 0x10, 0x00, 0xfa, 0x08, 0x61, 0x6f, 0x66,
    0x2d, 0x62, 0x61, 0x73, 0x65, 0xc0, 0x00, 0xff, 0xf0, 0x6e, 0x3b, 0xfe,
    0xc0, 0xff, 0x5a, 0xa2,
];

/// Inserts decoded records as strings, dropping those whose expiry has passed.
/// Returns how many keys were loaded.
pub fn load_records(store: &mut KeyValueStore, records: Vec<SnapshotRecord>) -> usize {
    let now = Timestamp::now();
    let mut loaded = 0;

    for record in records {
        let expiration = match record.expires_at_ms {
            Some(ms) => match i64::try_from(ms).ok().and_then(|ms| Timestamp::from_millisecond(ms).ok()) {
                Some(expiration) if expiration <= now => continue,
                Some(expiration) => Some(expiration),
                None => {
                    warn!(key = %record.key, ms, "skipping snapshot key with unrepresentable expiry");
                    continue;
                }
            },
            None => None,
        };

        store.insert(
            record.key,
            Value {
                data: DataType::String(record.value),
                expiration,
            },
        );
        loaded += 1;
    }

    loaded
}

/// Loads the snapshot at `path` into the store. A missing or unreadable file
/// leaves the store untouched.
pub async fn load_snapshot_file(path: &Path, store: Arc<Mutex<KeyValueStore>>) -> usize {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no snapshot file, starting empty");
            return 0;
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unable to read snapshot file");
            return 0;
        }
    };

    let records = decode_snapshot(&bytes);
    let mut store_guard = store.lock().await;
    let loaded = load_records(&mut store_guard, records);

    info!(path = %path.display(), keys = loaded, "snapshot loaded");

    loaded
}
