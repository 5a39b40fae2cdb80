use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use thiserror::Error;
use tokio::{
    net::TcpListener,
    sync::{Mutex, RwLock},
};
use tracing::{error, info, warn};

use crate::{
    connection::handle_client_connection,
    key_value_store::KeyValueStore,
    rdb::load_snapshot_file,
    replication::{run_follower, ReplicationManager},
    state::State,
};

#[derive(Error, Debug, PartialEq)]
pub enum CliError {
    #[error("unknown command line flag '{0}'")]
    InvalidCommandLineFlag(String),
    #[error("missing value for command line flag '{0}'")]
    MissingCommandLineFlagValue(String),
    #[error("invalid value for command line flag '{0}'")]
    InvalidCommandLineFlagValue(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RedisRole {
    Master,
    /// Follows the leader at (host, port).
    Replica((String, u32)),
}

#[derive(Debug)]
pub struct RedisServer {
    pub port: u32,
    pub role: RedisRole,
    pub rdb_directory: String,
    pub rdb_filename: String,
    pub replication: ReplicationManager,
}

impl RedisServer {
    /// Builds the server configuration from command line arguments. The first
    /// argument is the program name and is skipped.
    ///
    /// # Flags
    ///
    /// * `--port <port>` - Listening port, 6379 by default
    /// * `--dir <path>` - Snapshot directory, `.` by default
    /// * `--dbfilename <name>` - Snapshot file name, `dump.rdb` by default
    /// * `--replicaof "<host> <port>"` - Run as a replica of the given leader.
    ///   Host and port may also be passed as two separate arguments.
    pub fn new<I: IntoIterator<Item = String>>(command_line_args: I) -> Result<Self, CliError> {
        let mut iter = command_line_args.into_iter().skip(1);

        let mut port: Option<u32> = None;
        let mut role = RedisRole::Master;
        let mut rdb_directory = ".".to_string();
        let mut rdb_filename = "dump.rdb".to_string();

        while let Some(arg) = iter.next() {
            let Some(value) = iter.next() else {
                return match arg.as_str() {
                    "--port" | "--dir" | "--dbfilename" | "--replicaof" => {
                        Err(CliError::MissingCommandLineFlagValue(arg))
                    }
                    _ => Err(CliError::InvalidCommandLineFlag(arg)),
                };
            };

            match arg.as_str() {
                "--port" => {
                    port = Some(
                        parse_port(&value)
                            .ok_or(CliError::InvalidCommandLineFlagValue(arg.clone()))?,
                    );
                }
                "--dir" => rdb_directory = value,
                "--dbfilename" => rdb_filename = value,
                "--replicaof" => {
                    let (host, leader_port) = match value.split_once(' ') {
                        Some((host, leader_port)) => {
                            (host.trim().to_string(), leader_port.trim().to_string())
                        }
                        None => {
                            let Some(leader_port) = iter.next() else {
                                return Err(CliError::MissingCommandLineFlagValue(arg));
                            };

                            (value, leader_port)
                        }
                    };

                    let leader_port = parse_port(&leader_port)
                        .ok_or(CliError::InvalidCommandLineFlagValue(arg.clone()))?;

                    if host.is_empty() {
                        return Err(CliError::InvalidCommandLineFlagValue(arg));
                    }

                    role = RedisRole::Replica((host, leader_port));
                }
                _ => return Err(CliError::InvalidCommandLineFlag(arg)),
            }
        }

        Ok(RedisServer {
            port: port.unwrap_or(6379),
            role,
            rdb_directory,
            rdb_filename,
            replication: ReplicationManager::new(),
        })
    }

    pub fn rdb_path(&self) -> PathBuf {
        PathBuf::from(&self.rdb_directory).join(&self.rdb_filename)
    }

    /// Loads the snapshot, starts following the leader when configured as a
    /// replica, then accepts clients until the listener fails.
    pub async fn run(self) -> anyhow::Result<()> {
        let address = format!("127.0.0.1:{}", self.port);
        let listener = TcpListener::bind(&address)
            .await
            .with_context(|| format!("failed to bind {}", address))?;

        info!(%address, role = ?self.role, "listening");

        let store = Arc::new(Mutex::new(KeyValueStore::new()));
        let state = Arc::new(Mutex::new(State::new()));

        load_snapshot_file(&self.rdb_path(), Arc::clone(&store)).await;

        let listening_port = self.port;
        let role = self.role.clone();
        let server = Arc::new(RwLock::new(self));

        if let RedisRole::Replica(leader) = role {
            let server = Arc::clone(&server);
            let store = Arc::clone(&store);

            tokio::spawn(async move {
                if let Err(e) = run_follower(server, store, leader, listening_port).await {
                    error!(error = ?e, "replication link failed");
                }
            });
        }

        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(error = %e, "failed to accept connection");
                    continue;
                }
            };

            info!(%peer, "accepted connection");

            tokio::spawn(handle_client_connection(
                stream,
                Arc::clone(&server),
                Arc::clone(&store),
                Arc::clone(&state),
            ));
        }
    }
}

fn parse_port(value: &str) -> Option<u32> {
    value.parse::<u16>().ok().filter(|port| *port > 0).map(u32::from)
}
