//! Per-connection coordination state shared by all connections.
//!
//! Lock order: when a handler needs both, the key-value store is locked before
//! the state.

mod blocking;
mod pub_sub;
mod transactions;

use thiserror::Error;

pub use blocking::{BlockingCoordinator, WaiterId};
pub use pub_sub::PubSubBroker;
pub use transactions::TransactionQueue;

/// Identifies one client connection for the lifetime of the process.
pub type ClientId = u64;

#[derive(Error, Debug, PartialEq)]
pub enum StateError {
    #[error("MULTI calls can not be nested")]
    NestedTransaction,
    #[error("no transaction in progress")]
    NoTransaction,
}

#[derive(Debug, Default)]
pub struct State {
    pub blocking: BlockingCoordinator,
    pub transactions: TransactionQueue,
    pub pub_sub: PubSubBroker,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets every trace of a closed connection in one pass.
    pub fn remove_client(&mut self, client_id: ClientId) {
        self.blocking.remove_client(client_id);
        self.transactions.remove_client(client_id);
        self.pub_sub.remove_client(client_id);
    }
}
