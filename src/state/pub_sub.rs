use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::debug;

use crate::{resp::RespValue, state::ClientId};

/// Channel subscriptions per connection, plus the outbound queue of every
/// connection so published messages can be pushed to subscribers.
#[derive(Debug)]
pub struct PubSubBroker {
    subscriptions: HashMap<ClientId, Vec<(String, u64)>>,
    next_subscription: u64,
    clients: HashMap<ClientId, mpsc::UnboundedSender<Vec<u8>>>,
}

impl Default for PubSubBroker {
    fn default() -> Self {
        Self {
            subscriptions: HashMap::new(),
            next_subscription: 1,
            clients: HashMap::new(),
        }
    }
}

impl PubSubBroker {
    pub fn register_client(&mut self, client_id: ClientId, sender: mpsc::UnboundedSender<Vec<u8>>) {
        self.clients.insert(client_id, sender);
    }

    /// Returns the connection's subscription count after subscribing.
    pub fn subscribe(&mut self, client_id: ClientId, channel: &str) -> usize {
        let subscriptions = self.subscriptions.entry(client_id).or_default();

        if !subscriptions.iter().any(|(name, _)| name == channel) {
            subscriptions.push((channel.to_string(), self.next_subscription));
            self.next_subscription += 1;
        }

        subscriptions.len()
    }

    /// Returns the connection's subscription count after unsubscribing.
    pub fn unsubscribe(&mut self, client_id: ClientId, channel: &str) -> usize {
        let Some(subscriptions) = self.subscriptions.get_mut(&client_id) else {
            return 0;
        };

        subscriptions.retain(|(name, _)| name != channel);
        let remaining = subscriptions.len();

        if remaining == 0 {
            self.subscriptions.remove(&client_id);
        }

        remaining
    }

    /// Channel names in subscription order.
    pub fn channels(&self, client_id: ClientId) -> Vec<String> {
        self.subscriptions
            .get(&client_id)
            .map(|subscriptions| subscriptions.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn subscription_count(&self, client_id: ClientId) -> usize {
        self.subscriptions.get(&client_id).map_or(0, Vec::len)
    }

    pub fn is_subscribed(&self, client_id: ClientId) -> bool {
        self.subscription_count(client_id) > 0
    }

    /// Delivers `message` to every connection subscribed to `channel` and
    /// returns how many connections matched.
    pub fn publish(&self, channel: &str, message: &str) -> usize {
        let payload = RespValue::array_of_bulk_strings(&["message", channel, message])
            .encode()
            .into_bytes();
        let mut receivers = 0;

        for (client_id, subscriptions) in &self.subscriptions {
            if !subscriptions.iter().any(|(name, _)| name == channel) {
                continue;
            }

            receivers += 1;

            if let Some(sender) = self.clients.get(client_id) {
                if sender.send(payload.clone()).is_err() {
                    debug!(client = client_id, channel, "subscriber connection already closed");
                }
            }
        }

        receivers
    }

    pub fn remove_client(&mut self, client_id: ClientId) {
        self.subscriptions.remove(&client_id);
        self.clients.remove(&client_id);
    }
}
