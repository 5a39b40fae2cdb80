use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::{resp::RespValue, state::ClientId};

pub const REPLICATION_ID: &str = "8371b4fb1155b71f4a04d3e1bc3e18c4a990aeeb";

#[derive(Debug)]
pub struct Replica {
    sender: mpsc::UnboundedSender<Vec<u8>>,
    pub ack_offset: u64,
}

/// Leader-side bookkeeping. On a follower only `master_offset` is used, to
/// report how far the replication stream has been processed.
#[derive(Debug)]
pub struct ReplicationManager {
    pub repl_id: String,
    pub master_offset: u64,
    replicas: HashMap<ClientId, Replica>,
}

impl Default for ReplicationManager {
    fn default() -> Self {
        Self {
            repl_id: REPLICATION_ID.to_string(),
            master_offset: 0,
            replicas: HashMap::new(),
        }
    }
}

impl ReplicationManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_replica(&mut self, client_id: ClientId, sender: mpsc::UnboundedSender<Vec<u8>>) {
        info!(replica = client_id, "replica registered");
        self.replicas.insert(
            client_id,
            Replica {
                sender,
                ack_offset: 0,
            },
        );
    }

    pub fn remove_replica(&mut self, client_id: ClientId) -> bool {
        self.replicas.remove(&client_id).is_some()
    }

    pub fn replica_count(&self) -> usize {
        self.replicas.len()
    }

    pub fn is_replica(&self, client_id: ClientId) -> bool {
        self.replicas.contains_key(&client_id)
    }

    /// Writes `command` to every replica and advances the master offset by
    /// its encoded length. A replica whose connection is gone is dropped.
    pub fn propagate(&mut self, command: &RespValue) {
        let encoded = command.encode().into_bytes();
        self.master_offset += encoded.len() as u64;

        self.replicas.retain(|client_id, replica| {
            if replica.sender.send(encoded.clone()).is_err() {
                warn!(replica = client_id, "dropping replica after failed write");
                return false;
            }

            true
        });
    }

    /// Sends `REPLCONF GETACK *` to every replica. Returns the offset replicas
    /// must acknowledge to count as caught up, which excludes the probe itself.
    pub fn broadcast_getack(&mut self) -> u64 {
        let target = self.master_offset;
        self.propagate(&RespValue::array_of_bulk_strings(&["REPLCONF", "GETACK", "*"]));

        target
    }

    pub fn record_ack(&mut self, client_id: ClientId, offset: u64) {
        if let Some(replica) = self.replicas.get_mut(&client_id) {
            replica.ack_offset = offset;
        }
    }

    pub fn acknowledged_count(&self, target: u64) -> usize {
        self.replicas
            .values()
            .filter(|replica| replica.ack_offset >= target)
            .count()
    }

    pub fn full_resync_response(&self) -> RespValue {
        RespValue::SimpleString(format!("FULLRESYNC {} {}", self.repl_id, self.master_offset))
    }
}
