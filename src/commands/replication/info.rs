use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    commands::{CommandError, CommandResult},
    resp::RespValue,
    server::{RedisRole, RedisServer},
};

/// Only the replication section exists, so `INFO` and `INFO replication`
/// reply alike and other sections are empty.
pub async fn info(
    server: Arc<RwLock<RedisServer>>,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    if arguments.len() > 1 {
        return Err(CommandError::SyntaxError);
    }

    let section = arguments
        .first()
        .map_or("replication".to_string(), |section| section.to_lowercase());

    if !matches!(section.as_str(), "replication" | "all" | "default" | "everything") {
        return Ok(CommandResult::Response(RespValue::BulkString(String::new())));
    }

    let server_guard = server.read().await;
    let replication = &server_guard.replication;

    let mut lines = vec!["# Replication".to_string()];

    match &server_guard.role {
        RedisRole::Master => {
            lines.push("role:master".to_string());
            lines.push(format!("connected_slaves:{}", replication.replica_count()));
        }
        RedisRole::Replica((host, port)) => {
            lines.push("role:slave".to_string());
            lines.push(format!("master_host:{}", host));
            lines.push(format!("master_port:{}", port));
        }
    }

    lines.push(format!("master_replid:{}", replication.repl_id));
    lines.push(format!("master_repl_offset:{}", replication.master_offset));

    Ok(CommandResult::Response(RespValue::BulkString(
        lines.join("\r\n"),
    )))
}
