use std::sync::Arc;

use anyhow::Context;
use bytes::{Buf, BytesMut};
use regex::Regex;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    sync::{Mutex, RwLock},
};
use tracing::{debug, info, warn};

use crate::{
    commands::{del, set, CommandHandler},
    key_value_store::KeyValueStore,
    rdb::{decode_snapshot, load_records},
    replication::ReplicationError,
    resp::RespValue,
    server::RedisServer,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HandshakeStep {
    AwaitingPong,
    AwaitingListeningPortOk,
    AwaitingCapaOk,
    AwaitingFullResync,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FollowerPhase {
    Handshake(HandshakeStep),
    RdbTransfer,
    Streaming,
}

/// What the driver must do after feeding bytes into the session.
#[derive(Debug, PartialEq)]
pub enum FollowerEvent {
    /// Write this value to the leader.
    Send(RespValue),
    /// The full snapshot payload arrived.
    Snapshot(Vec<u8>),
    /// Apply this write to the local store without replying.
    Apply(CommandHandler),
}

/// The follower end of the replication link, independent of any socket.
#[derive(Debug)]
pub struct FollowerSession {
    phase: FollowerPhase,
    listening_port: u32,
    buffer: BytesMut,
    offset: u64,
    leader_repl_id: Option<String>,
    full_resync: Regex,
}

impl FollowerSession {
    pub fn new(listening_port: u32) -> Result<Self, ReplicationError> {
        Ok(Self {
            phase: FollowerPhase::Handshake(HandshakeStep::AwaitingPong),
            listening_port,
            buffer: BytesMut::new(),
            offset: 0,
            leader_repl_id: None,
            full_resync: Regex::new(r"^FULLRESYNC ([a-zA-Z0-9]{40}) (\d+)$")?,
        })
    }

    /// The first message of the handshake.
    pub fn start(&self) -> RespValue {
        RespValue::array_of_bulk_strings(&["PING"])
    }

    pub fn phase(&self) -> FollowerPhase {
        self.phase
    }

    /// Bytes of replication stream processed since the full resync.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn leader_repl_id(&self) -> Option<&str> {
        self.leader_repl_id.as_deref()
    }

    /// Consumes as much of the buffered input as forms complete messages.
    /// Partial messages stay buffered until the next call.
    pub fn feed(&mut self, data: &[u8]) -> Result<Vec<FollowerEvent>, ReplicationError> {
        self.buffer.extend_from_slice(data);
        let mut events = Vec::new();

        loop {
            let progressed = match self.phase {
                FollowerPhase::Handshake(step) => self.advance_handshake(step, &mut events)?,
                FollowerPhase::RdbTransfer => self.take_snapshot(&mut events)?,
                FollowerPhase::Streaming => self.take_command(&mut events)?,
            };

            if !progressed {
                return Ok(events);
            }
        }
    }

    fn advance_handshake(
        &mut self,
        step: HandshakeStep,
        events: &mut Vec<FollowerEvent>,
    ) -> Result<bool, ReplicationError> {
        let Some((reply, consumed)) = RespValue::decode(&self.buffer)? else {
            return Ok(false);
        };
        self.buffer.advance(consumed);

        let RespValue::SimpleString(text) = &reply else {
            return Err(ReplicationError::UnexpectedReply(reply.clone()));
        };

        let (next, request) = match (step, text.as_str()) {
            (HandshakeStep::AwaitingPong, "PONG") => {
                let port = self.listening_port.to_string();
                (
                    FollowerPhase::Handshake(HandshakeStep::AwaitingListeningPortOk),
                    Some(RespValue::array_of_bulk_strings(&[
                        "REPLCONF",
                        "listening-port",
                        port.as_str(),
                    ])),
                )
            }
            (HandshakeStep::AwaitingListeningPortOk, "OK") => (
                FollowerPhase::Handshake(HandshakeStep::AwaitingCapaOk),
                Some(RespValue::array_of_bulk_strings(&["REPLCONF", "capa", "psync2"])),
            ),
            (HandshakeStep::AwaitingCapaOk, "OK") => (
                FollowerPhase::Handshake(HandshakeStep::AwaitingFullResync),
                Some(RespValue::array_of_bulk_strings(&["PSYNC", "?", "-1"])),
            ),
            (HandshakeStep::AwaitingFullResync, _) => {
                let Some(captures) = self.full_resync.captures(text) else {
                    return Err(ReplicationError::InvalidFullResync(text.clone()));
                };

                self.leader_repl_id = Some(captures[1].to_string());
                self.offset = captures[2]
                    .parse()
                    .map_err(|_| ReplicationError::InvalidFullResync(text.clone()))?;

                (FollowerPhase::RdbTransfer, None)
            }
            _ => return Err(ReplicationError::UnexpectedReply(reply.clone())),
        };

        self.phase = next;
        events.extend(request.map(FollowerEvent::Send));

        Ok(true)
    }

    /// The snapshot is framed like a bulk string without the trailing CRLF.
    fn take_snapshot(&mut self, events: &mut Vec<FollowerEvent>) -> Result<bool, ReplicationError> {
        let Some(&prefix) = self.buffer.first() else {
            return Ok(false);
        };

        if prefix != b'$' {
            return Err(ReplicationError::InvalidSnapshotHeader);
        }

        let Some(line_length) = self.buffer.windows(2).position(|window| window == b"\r\n") else {
            return Ok(false);
        };

        let length = std::str::from_utf8(&self.buffer[1..line_length])
            .ok()
            .and_then(|length| length.parse::<usize>().ok())
            .ok_or(ReplicationError::InvalidSnapshotHeader)?;

        let header_length = line_length + 2;

        if self.buffer.len() < header_length + length {
            return Ok(false);
        }

        self.buffer.advance(header_length);
        let snapshot = self.buffer.split_to(length).to_vec();

        self.phase = FollowerPhase::Streaming;
        events.push(FollowerEvent::Snapshot(snapshot));

        Ok(true)
    }

    fn take_command(&mut self, events: &mut Vec<FollowerEvent>) -> Result<bool, ReplicationError> {
        let Some((value, consumed)) = RespValue::decode(&self.buffer)? else {
            return Ok(false);
        };
        self.buffer.advance(consumed);

        let offset_before = self.offset;
        self.offset += consumed as u64;

        let command = match CommandHandler::new(value) {
            Ok(command) => command,
            Err(e) => {
                debug!(error = %e, "ignoring malformed replicated command");
                return Ok(true);
            }
        };

        match command.name.as_str() {
            "REPLCONF"
                if command
                    .arguments
                    .first()
                    .is_some_and(|sub| sub.eq_ignore_ascii_case("GETACK")) =>
            {
                let offset = offset_before.to_string();
                events.push(FollowerEvent::Send(RespValue::array_of_bulk_strings(&[
                    "REPLCONF",
                    "ACK",
                    offset.as_str(),
                ])));
            }
            "SET" | "DEL" => events.push(FollowerEvent::Apply(command)),
            _ => {}
        }

        Ok(true)
    }
}

/// Connects to the leader and keeps the local store in sync with it until the
/// link closes.
pub async fn run_follower(
    server: Arc<RwLock<RedisServer>>,
    store: Arc<Mutex<KeyValueStore>>,
    leader: (String, u32),
    listening_port: u32,
) -> anyhow::Result<()> {
    let (host, port) = leader;
    let mut stream = TcpStream::connect(format!("{}:{}", host, port))
        .await
        .with_context(|| format!("failed to connect to leader {}:{}", host, port))?;

    info!(%host, port, "connected to leader");

    let mut session = FollowerSession::new(listening_port)?;
    stream.write_all(session.start().encode().as_bytes()).await?;

    let mut buffer = [0; 4096];

    loop {
        let read = stream.read(&mut buffer).await?;

        if read == 0 {
            info!("leader closed the replication link");
            return Ok(());
        }

        for event in session.feed(&buffer[..read])? {
            match event {
                FollowerEvent::Send(value) => {
                    stream.write_all(value.encode().as_bytes()).await?;
                }
                FollowerEvent::Snapshot(bytes) => {
                    let records = decode_snapshot(&bytes);
                    let mut store_guard = store.lock().await;
                    let loaded = load_records(&mut store_guard, records);

                    info!(keys = loaded, "handshake completed, snapshot loaded from leader");
                }
                FollowerEvent::Apply(command) => {
                    let result = match command.name.as_str() {
                        "SET" => set(Arc::clone(&store), command.arguments.clone()).await,
                        _ => del(Arc::clone(&store), command.arguments.clone()).await,
                    };

                    if let Err(e) = result {
                        warn!(command = %command.name, error = %e, "failed to apply replicated write");
                    }
                }
            }
        }

        if session.phase() == FollowerPhase::Streaming {
            server.write().await.replication.master_offset = session.offset();
        }
    }
}
