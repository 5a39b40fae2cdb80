//! Leader/follower replication.
//!
//! The leader side tracks connected replicas and the byte offset of everything
//! propagated to them. The follower side is a pure state machine fed with the
//! bytes read from the leader, plus a small async driver around it.

mod follower;
mod leader;

use thiserror::Error;

use crate::resp::{RespError, RespValue};

pub use follower::{run_follower, FollowerEvent, FollowerPhase, FollowerSession, HandshakeStep};
pub use leader::{Replica, ReplicationManager, REPLICATION_ID};

#[derive(Error, Debug)]
pub enum ReplicationError {
    #[error("unexpected reply during handshake: {0:?}")]
    UnexpectedReply(RespValue),
    #[error("malformed FULLRESYNC reply: {0}")]
    InvalidFullResync(String),
    #[error("malformed snapshot header")]
    InvalidSnapshotHeader,
    #[error("protocol error on replication stream: {0}")]
    Protocol(#[from] RespError),
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}
