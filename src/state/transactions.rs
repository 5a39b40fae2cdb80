use std::collections::HashMap;

use crate::{
    commands::CommandHandler,
    state::{ClientId, StateError},
};

/// Commands buffered between MULTI and EXEC, per connection.
#[derive(Debug, Default)]
pub struct TransactionQueue {
    transactions: HashMap<ClientId, Vec<CommandHandler>>,
}

impl TransactionQueue {
    pub fn begin(&mut self, client_id: ClientId) -> Result<(), StateError> {
        if self.transactions.contains_key(&client_id) {
            return Err(StateError::NestedTransaction);
        }

        self.transactions.insert(client_id, Vec::new());

        Ok(())
    }

    pub fn is_open(&self, client_id: ClientId) -> bool {
        self.transactions.contains_key(&client_id)
    }

    pub fn enqueue(&mut self, client_id: ClientId, command: CommandHandler) -> Result<(), StateError> {
        let Some(queue) = self.transactions.get_mut(&client_id) else {
            return Err(StateError::NoTransaction);
        };

        queue.push(command);

        Ok(())
    }

    /// Closes the transaction and hands back its commands in arrival order.
    pub fn take(&mut self, client_id: ClientId) -> Option<Vec<CommandHandler>> {
        self.transactions.remove(&client_id)
    }

    pub fn remove_client(&mut self, client_id: ClientId) {
        self.transactions.remove(&client_id);
    }
}
