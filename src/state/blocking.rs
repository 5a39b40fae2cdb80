//! Connections parked on BLPOP and blocking XREAD.
//!
//! Producers (RPUSH, XADD) hand data straight to waiters through a oneshot
//! channel while they still hold the store lock, so a woken waiter never has
//! to re-check the keyspace.

use std::collections::{HashMap, VecDeque};

use tokio::sync::oneshot;
use tracing::debug;

use crate::{
    key_value_store::{entries_to_resp, Stream, StreamId},
    resp::RespValue,
    state::ClientId,
};

pub type WaiterId = u64;

#[derive(Debug)]
struct ListWaiter {
    id: WaiterId,
    client_id: ClientId,
    sender: oneshot::Sender<RespValue>,
}

#[derive(Debug)]
struct StreamWaiter {
    id: WaiterId,
    client_id: ClientId,
    streams: Vec<(String, StreamId)>,
    sender: oneshot::Sender<RespValue>,
}

#[derive(Debug, Default)]
pub struct BlockingCoordinator {
    next_waiter: WaiterId,
    list_waiters: HashMap<String, VecDeque<ListWaiter>>,
    stream_waiters: Vec<StreamWaiter>,
}

impl BlockingCoordinator {
    fn next_id(&mut self) -> WaiterId {
        self.next_waiter += 1;
        self.next_waiter
    }

    /// Queues `client_id` behind every earlier waiter on `key`.
    pub fn wait_for_list(
        &mut self,
        client_id: ClientId,
        key: &str,
    ) -> (WaiterId, oneshot::Receiver<RespValue>) {
        let (sender, receiver) = oneshot::channel();
        let id = self.next_id();

        self.list_waiters
            .entry(key.to_string())
            .or_default()
            .push_back(ListWaiter {
                id,
                client_id,
                sender,
            });

        (id, receiver)
    }

    /// Pops elements from the head of `list` into the oldest waiters on `key`
    /// until either side runs out. Returns how many waiters were served.
    pub fn serve_list_waiters(&mut self, key: &str, list: &mut VecDeque<String>) -> usize {
        let Some(waiters) = self.list_waiters.get_mut(key) else {
            return 0;
        };

        let mut served = 0;

        while !list.is_empty() {
            let Some(waiter) = waiters.pop_front() else {
                break;
            };

            if waiter.sender.is_closed() {
                continue;
            }

            let Some(element) = list.pop_front() else {
                break;
            };

            let reply = RespValue::array_of_bulk_strings(&[key, element.as_str()]);

            if waiter.sender.send(reply).is_err() {
                list.push_front(element);
                continue;
            }

            debug!(client = waiter.client_id, key, "served blocked list pop");
            served += 1;
        }

        if waiters.is_empty() {
            self.list_waiters.remove(key);
        }

        served
    }

    pub fn wait_for_streams(
        &mut self,
        client_id: ClientId,
        streams: Vec<(String, StreamId)>,
    ) -> (WaiterId, oneshot::Receiver<RespValue>) {
        let (sender, receiver) = oneshot::channel();
        let id = self.next_id();

        self.stream_waiters.push(StreamWaiter {
            id,
            client_id,
            streams,
            sender,
        });

        (id, receiver)
    }

    /// Wakes every waiter registered on `key` that has entries past its start ID.
    pub fn serve_stream_waiters(&mut self, key: &str, stream: &Stream) -> usize {
        let mut served = 0;
        let mut remaining = Vec::with_capacity(self.stream_waiters.len());

        for waiter in self.stream_waiters.drain(..) {
            if waiter.sender.is_closed() {
                continue;
            }

            let from = waiter
                .streams
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, from)| *from);

            let entries = match from {
                Some(from) => stream.entries_after(from),
                None => Vec::new(),
            };

            if entries.is_empty() {
                remaining.push(waiter);
                continue;
            }

            let reply = RespValue::Array(vec![RespValue::Array(vec![
                RespValue::BulkString(key.to_string()),
                entries_to_resp(&entries),
            ])]);

            if waiter.sender.send(reply).is_ok() {
                debug!(client = waiter.client_id, key, "served blocked stream read");
                served += 1;
            }
        }

        self.stream_waiters = remaining;

        served
    }

    /// Drops a waiter that timed out. Returns `false` when it was already served.
    pub fn cancel(&mut self, waiter_id: WaiterId) -> bool {
        for waiters in self.list_waiters.values_mut() {
            if let Some(position) = waiters.iter().position(|waiter| waiter.id == waiter_id) {
                waiters.remove(position);
                self.list_waiters.retain(|_, waiters| !waiters.is_empty());
                return true;
            }
        }

        let before = self.stream_waiters.len();
        self.stream_waiters.retain(|waiter| waiter.id != waiter_id);

        self.stream_waiters.len() != before
    }

    pub fn remove_client(&mut self, client_id: ClientId) {
        for waiters in self.list_waiters.values_mut() {
            waiters.retain(|waiter| waiter.client_id != client_id);
        }
        self.list_waiters.retain(|_, waiters| !waiters.is_empty());
        self.stream_waiters
            .retain(|waiter| waiter.client_id != client_id);
    }

    pub fn list_waiter_count(&self, key: &str) -> usize {
        self.list_waiters.get(key).map_or(0, VecDeque::len)
    }

    pub fn stream_waiter_count(&self) -> usize {
        self.stream_waiters.len()
    }
}
