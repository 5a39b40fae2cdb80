//! One task per client socket.
//!
//! The socket is split in two: a reader task decodes frames into an inbound
//! queue, and a writer task drains an outbound queue that other connections,
//! the pub/sub broker and the replication manager can also push bytes into.
//! The command loop in between handles frames strictly in arrival order.

use std::{
    collections::VecDeque,
    future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use bytes::{Buf, BytesMut};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
    sync::{mpsc, oneshot, Mutex, RwLock},
};
use tracing::{debug, error};

use crate::{
    commands::{CommandDispatcher, CommandError, CommandHandler, CommandResult},
    key_value_store::KeyValueStore,
    resp::{RespError, RespValue},
    server::RedisServer,
    state::{ClientId, State, WaiterId},
};

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug)]
enum Inbound {
    Frame(RespValue),
    ProtocolError(RespError),
}

#[derive(Debug, PartialEq)]
enum Flow {
    Continue,
    Close,
}

struct Connection {
    client_id: ClientId,
    dispatcher: CommandDispatcher,
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    inbound: mpsc::UnboundedReceiver<Inbound>,
    /// Frames that arrived while a blocking command was waiting.
    backlog: VecDeque<Inbound>,
}

/// Serves a client until it disconnects, sends QUIT or breaks the protocol.
pub async fn handle_client_connection(
    stream: TcpStream,
    server: Arc<RwLock<RedisServer>>,
    store: Arc<Mutex<KeyValueStore>>,
    state: Arc<Mutex<State>>,
) {
    let client_id = NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed);
    let (reader, writer) = stream.into_split();

    let (outbound, outbound_receiver) = mpsc::unbounded_channel();
    let (inbound_sender, inbound) = mpsc::unbounded_channel();

    let writer_task = tokio::spawn(write_loop(writer, outbound_receiver));
    let reader_task = tokio::spawn(read_loop(reader, inbound_sender));

    state
        .lock()
        .await
        .pub_sub
        .register_client(client_id, outbound.clone());

    let mut connection = Connection {
        client_id,
        dispatcher: CommandDispatcher::new(
            client_id,
            Arc::clone(&server),
            store,
            Arc::clone(&state),
        ),
        outbound,
        inbound,
        backlog: VecDeque::new(),
    };

    connection.run().await;

    state.lock().await.remove_client(client_id);
    server.write().await.replication.remove_replica(client_id);

    drop(connection);
    reader_task.abort();

    if let Err(e) = writer_task.await {
        debug!(client = client_id, error = %e, "writer task ended abnormally");
    }

    debug!(client = client_id, "connection closed");
}

impl Connection {
    async fn run(&mut self) {
        loop {
            let inbound = match self.backlog.pop_front() {
                Some(inbound) => inbound,
                None => match self.inbound.recv().await {
                    Some(inbound) => inbound,
                    None => return,
                },
            };

            let flow = match inbound {
                Inbound::Frame(frame) => self.process(frame).await,
                Inbound::ProtocolError(e) => {
                    error!(client = self.client_id, error = %e, "protocol error, closing connection");
                    self.reply(&e.as_resp());
                    Flow::Close
                }
            };

            if flow == Flow::Close {
                return;
            }
        }
    }

    async fn process(&mut self, frame: RespValue) -> Flow {
        let command = match CommandHandler::new(frame) {
            Ok(command) => command,
            Err(e) => {
                self.reply(&e.as_resp());
                return Flow::Continue;
            }
        };

        let outcome = if command.name == "WAIT" {
            self.dispatch_until_closed(command).await
        } else {
            Some(self.dispatcher.dispatch(command).await)
        };

        let result = match outcome {
            Some(Ok(result)) => result,
            Some(Err(e)) => {
                self.reply(&e.as_resp());
                return Flow::Continue;
            }
            None => return Flow::Close,
        };

        match result {
            CommandResult::NoResponse => Flow::Continue,
            CommandResult::Response(value) => {
                self.reply(&value);
                Flow::Continue
            }
            CommandResult::Responses(values) => {
                for value in &values {
                    self.reply(value);
                }
                Flow::Continue
            }
            CommandResult::Blocked {
                waiter_id,
                receiver,
                timeout,
            } => self.wait_for_delivery(waiter_id, receiver, timeout).await,
            CommandResult::Sync { response, snapshot } => {
                self.reply(&response);

                let mut payload = format!("${}\r\n", snapshot.len()).into_bytes();
                payload.extend_from_slice(&snapshot);
                self.send(payload);

                self.dispatcher
                    .server
                    .write()
                    .await
                    .replication
                    .add_replica(self.client_id, self.outbound.clone());

                Flow::Continue
            }
            CommandResult::Quit => {
                self.reply(&RespValue::SimpleString("OK".to_string()));
                Flow::Close
            }
        }
    }

    /// Runs a long-polling command while watching the socket. Returns `None`
    /// once the client has gone away, abandoning the command. Frames that
    /// arrive in the meantime are kept for later.
    async fn dispatch_until_closed(
        &mut self,
        command: CommandHandler,
    ) -> Option<Result<CommandResult, CommandError>> {
        let dispatch = self.dispatcher.dispatch(command);
        tokio::pin!(dispatch);

        loop {
            tokio::select! {
                result = &mut dispatch => return Some(result),
                inbound = self.inbound.recv() => match inbound {
                    Some(inbound) => self.backlog.push_back(inbound),
                    None => {
                        debug!(client = self.client_id, "client left during WAIT");
                        return None;
                    }
                },
            }
        }
    }

    /// Waits for a blocked command's reply, its deadline or the client going
    /// away, whichever comes first. Frames pipelined behind the blocked
    /// command are kept for later.
    async fn wait_for_delivery(
        &mut self,
        waiter_id: WaiterId,
        mut receiver: oneshot::Receiver<RespValue>,
        timeout: Option<Duration>,
    ) -> Flow {
        let deadline = async {
            match timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => future::pending().await,
            }
        };
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                delivered = &mut receiver => {
                    let value = delivered.unwrap_or(RespValue::NullArray);
                    self.reply(&value);

                    return Flow::Continue;
                }
                _ = &mut deadline => {
                    self.dispatcher.state.lock().await.blocking.cancel(waiter_id);

                    // A producer may have served the waiter just before it was cancelled.
                    let value = receiver.try_recv().unwrap_or(RespValue::NullArray);
                    self.reply(&value);

                    return Flow::Continue;
                }
                inbound = self.inbound.recv() => match inbound {
                    Some(inbound) => self.backlog.push_back(inbound),
                    None => {
                        self.dispatcher.state.lock().await.blocking.cancel(waiter_id);

                        return Flow::Close;
                    }
                },
            }
        }
    }

    fn reply(&self, value: &RespValue) {
        self.send(value.encode().into_bytes());
    }

    fn send(&self, bytes: Vec<u8>) {
        if self.outbound.send(bytes).is_err() {
            debug!(client = self.client_id, "writer already closed, dropping reply");
        }
    }
}

async fn read_loop(mut reader: OwnedReadHalf, inbound: mpsc::UnboundedSender<Inbound>) {
    let mut buffer = BytesMut::with_capacity(4096);

    loop {
        match reader.read_buf(&mut buffer).await {
            Ok(0) => return,
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, "read failed");
                return;
            }
        }

        loop {
            match RespValue::decode(&buffer) {
                Ok(Some((frame, consumed))) => {
                    buffer.advance(consumed);

                    if inbound.send(Inbound::Frame(frame)).is_err() {
                        return;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    let _ = inbound.send(Inbound::ProtocolError(e));
                    return;
                }
            }
        }
    }
}

async fn write_loop(mut writer: OwnedWriteHalf, mut outbound: mpsc::UnboundedReceiver<Vec<u8>>) {
    while let Some(bytes) = outbound.recv().await {
        if let Err(e) = writer.write_all(&bytes).await {
            debug!(error = %e, "write failed");
            return;
        }
    }

    let _ = writer.shutdown().await;
}
