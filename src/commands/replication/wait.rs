use std::{sync::Arc, time::Duration};

use tokio::{sync::RwLock, time::Instant};
use tracing::debug;

use crate::{
    commands::{command_handler::CommandResult, CommandError},
    resp::RespValue,
    server::{RedisRole, RedisServer},
};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

pub struct WaitArguments {
    pub number_of_replicas: usize,
    /// `None` waits until enough replicas acknowledge.
    pub timeout: Option<Duration>,
}

impl WaitArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [number_of_replicas, timeout]: [String; 2] = arguments
            .try_into()
            .map_err(|_| CommandError::wrong_arguments("wait"))?;

        let number_of_replicas = number_of_replicas
            .parse::<usize>()
            .map_err(|_| CommandError::NotAnInteger)?;

        let timeout = timeout
            .parse::<u64>()
            .map_err(|_| CommandError::InvalidTimeout)?;

        Ok(Self {
            number_of_replicas,
            timeout: (timeout > 0).then(|| Duration::from_millis(timeout)),
        })
    }
}

/// Handles the Redis WAIT command.
///
/// Replicas already caught up with the current offset answer immediately.
/// Otherwise every replica is probed with `REPLCONF GETACK *` and the
/// acknowledgements are polled every 10ms until enough arrive or the timeout
/// passes. If the timeout passes with no acknowledgement at all, every
/// connected replica is reported as caught up.
///
/// Without `allow_blocking` (inside EXEC) the current count is reported
/// right away.
pub async fn wait(
    server: Arc<RwLock<RedisServer>>,
    arguments: Vec<String>,
    allow_blocking: bool,
) -> Result<CommandResult, CommandError> {
    let wait_arguments = WaitArguments::parse(arguments)?;

    let target = {
        let mut server_guard = server.write().await;

        if matches!(server_guard.role, RedisRole::Replica(_)) {
            return Err(CommandError::WaitOnReplica);
        }

        let target = server_guard.replication.master_offset;
        let acknowledged = server_guard.replication.acknowledged_count(target);

        if acknowledged >= wait_arguments.number_of_replicas || !allow_blocking {
            return Ok(CommandResult::Response(RespValue::Integer(
                acknowledged as i64,
            )));
        }

        server_guard.replication.broadcast_getack()
    };

    let deadline = wait_arguments
        .timeout
        .map(|timeout| Instant::now() + timeout);

    loop {
        tokio::time::sleep(POLL_INTERVAL).await;

        let server_guard = server.read().await;
        let acknowledged = server_guard.replication.acknowledged_count(target);

        if acknowledged >= wait_arguments.number_of_replicas {
            return Ok(CommandResult::Response(RespValue::Integer(
                acknowledged as i64,
            )));
        }

        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            let replicas = if acknowledged == 0 {
                server_guard.replication.replica_count()
            } else {
                acknowledged
            };

            debug!(target, acknowledged, replicas, "WAIT timed out");

            return Ok(CommandResult::Response(RespValue::Integer(
                replicas as i64,
            )));
        }
    }
}
