//! PSYNC command implementation for Redis replication synchronization.
//!
//! Only full resynchronisation is supported: whatever ID and offset the
//! replica sends, it receives `+FULLRESYNC` followed by an empty snapshot.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    commands::{command_handler::CommandResult, CommandError},
    rdb::EMPTY_RDB,
    server::{RedisRole, RedisServer},
};

/// Handles the Redis PSYNC command.
///
/// # Arguments
///
/// * `server` - Thread-safe reference to the Redis server configuration
/// * `arguments` - Command arguments [replication_id, offset]
///
/// # Returns
///
/// * `Ok(CommandResult::Sync)` - FULLRESYNC reply plus the snapshot to stream
/// * `Err(CommandError::WrongNumberOfArguments)` - If not exactly 2 arguments
/// * `Err(CommandError::NotAnInteger)` - If the offset is not an integer
pub async fn psync(
    server: Arc<RwLock<RedisServer>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    if arguments.len() != 2 {
        return Err(CommandError::wrong_arguments("psync"));
    }

    arguments[1]
        .parse::<i64>()
        .map_err(|_| CommandError::NotAnInteger)?;

    let server_guard = server.read().await;

    if matches!(server_guard.role, RedisRole::Replica(_)) {
        return Err(CommandError::ReadOnlyReplica);
    }

    Ok(CommandResult::Sync {
        response: server_guard.replication.full_resync_response(),
        snapshot: EMPTY_RDB.to_vec(),
    })
}
