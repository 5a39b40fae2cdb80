use redis_engine::{
    commands::{CommandError, CommandHandler, CommandResult},
    rdb::EMPTY_RDB,
    replication::REPLICATION_ID,
    resp::RespValue,
};
use tokio::sync::mpsc;

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_info_replication() {
    let env = TestEnv::new_master_server();

    env.exec_ok(
        1,
        TestUtils::command(&["INFO", "replication"]),
        TestUtils::expected_bulk_string(&format!(
            "# Replication\r\nrole:master\r\nconnected_slaves:0\r\nmaster_replid:{}\r\nmaster_repl_offset:0",
            REPLICATION_ID
        )),
    )
    .await;

    let env = TestEnv::new_replica_server();

    let Ok(CommandResult::Response(RespValue::BulkString(info))) =
        env.exec(1, TestUtils::command(&["INFO"])).await
    else {
        panic!("Expected INFO to reply with a bulk string");
    };

    assert!(info.contains("role:slave"), "{}", info);
    assert!(info.contains("master_port:6379"), "{}", info);
}

#[tokio::test]
async fn test_handle_replconf() {
    let env = TestEnv::new_master_server();

    let test_cases = vec![
        (
            TestUtils::command(&["REPLCONF", "listening-port", "6380"]),
            TestUtils::expected_simple_string("OK"),
        ),
        (
            TestUtils::command(&["REPLCONF", "capa", "psync2"]),
            TestUtils::expected_simple_string("OK"),
        ),
        (
            TestUtils::command(&["REPLCONF", "GETACK", "*"]),
            TestUtils::expected_bulk_string_array(&["REPLCONF", "ACK", "0"]),
        ),
    ];

    for (command, expected) in test_cases {
        env.exec_ok(1, command, expected).await;
    }

    assert!(matches!(
        env.exec(1, TestUtils::command(&["REPLCONF", "ACK", "31"])).await,
        Ok(CommandResult::NoResponse)
    ));

    env.exec_err(
        1,
        TestUtils::command(&["REPLCONF", "listening-port", "port"]),
        CommandError::NotAnInteger,
    )
    .await;
}

#[tokio::test]
async fn test_handle_psync() {
    let env = TestEnv::new_master_server();

    match env
        .exec(1, TestUtils::command(&["PSYNC", "?", "-1"]))
        .await
    {
        Ok(CommandResult::Sync { response, snapshot }) => {
            assert_eq!(
                response,
                TestUtils::expected_simple_string(&format!("FULLRESYNC {} 0", REPLICATION_ID))
            );
            assert_eq!(snapshot, EMPTY_RDB.to_vec());
        }
        other => panic!("Expected a full resync, got {:?}", other),
    }
}

#[tokio::test]
async fn test_writes_propagate_to_replicas() {
    let env = TestEnv::new_master_server();
    let (sender, mut receiver) = mpsc::unbounded_channel();
    env.server.write().await.replication.add_replica(9, sender);

    env.exec_ok(
        1,
        TestUtils::set_command("foo", "bar"),
        TestUtils::expected_simple_string("OK"),
    )
    .await;

    env.exec_ok(
        1,
        TestUtils::command(&["INCR", "counter"]),
        TestUtils::expected_integer(1),
    )
    .await;

    env.exec_ok(
        1,
        TestUtils::command(&["DEL", "foo"]),
        TestUtils::expected_integer(1),
    )
    .await;

    let set = TestUtils::set_command("foo", "bar").encode().into_bytes();
    let del = TestUtils::command(&["DEL", "foo"]).encode().into_bytes();

    assert_eq!(receiver.recv().await.unwrap(), set);
    assert_eq!(receiver.recv().await.unwrap(), del);
    assert!(receiver.try_recv().is_err());

    assert_eq!(
        env.server.read().await.replication.master_offset,
        (set.len() + del.len()) as u64
    );
}

#[tokio::test]
async fn test_wait() {
    let env = TestEnv::new_master_server();

    env.exec_ok(
        1,
        TestUtils::command(&["WAIT", "0", "100"]),
        TestUtils::expected_integer(0),
    )
    .await;

    let (sender, _receiver) = mpsc::unbounded_channel();
    env.server.write().await.replication.add_replica(9, sender);

    env.exec_ok(
        1,
        TestUtils::command(&["WAIT", "1", "100"]),
        TestUtils::expected_integer(1),
    )
    .await;

    env.exec_ok(
        1,
        TestUtils::set_command("foo", "bar"),
        TestUtils::expected_simple_string("OK"),
    )
    .await;

    // No acknowledgement arrives, so the timeout path reports every replica.
    env.exec_ok(
        1,
        TestUtils::command(&["WAIT", "1", "50"]),
        TestUtils::expected_integer(1),
    )
    .await;
}

#[tokio::test]
async fn test_wait_counts_acknowledgements() {
    let env = TestEnv::new_master_server();

    let (first, _first_receiver) = mpsc::unbounded_channel();
    let (second, _second_receiver) = mpsc::unbounded_channel();
    env.server.write().await.replication.add_replica(8, first);
    env.server.write().await.replication.add_replica(9, second);

    env.exec_ok(
        1,
        TestUtils::set_command("foo", "bar"),
        TestUtils::expected_simple_string("OK"),
    )
    .await;

    let offset = env.server.read().await.replication.master_offset.to_string();

    assert!(matches!(
        env.exec(8, TestUtils::command(&["REPLCONF", "ACK", &offset])).await,
        Ok(CommandResult::NoResponse)
    ));

    env.exec_ok(
        1,
        TestUtils::command(&["WAIT", "2", "50"]),
        TestUtils::expected_integer(1),
    )
    .await;
}

#[tokio::test]
async fn test_replica_rejects_writes() {
    let env = TestEnv::new_replica_server();

    env.exec_err(
        1,
        TestUtils::set_command("foo", "bar"),
        CommandError::ReadOnlyReplica,
    )
    .await;

    env.exec_err(
        1,
        TestUtils::command(&["WAIT", "1", "0"]),
        CommandError::WaitOnReplica,
    )
    .await;

    env.exec_ok(
        1,
        TestUtils::get_command("foo"),
        TestUtils::expected_null(),
    )
    .await;

    env.exec_ok(
        1,
        TestUtils::command(&["MULTI"]),
        TestUtils::expected_simple_string("OK"),
    )
    .await;

    env.exec_ok(
        1,
        TestUtils::set_command("foo", "bar"),
        TestUtils::expected_simple_string("QUEUED"),
    )
    .await;

    env.exec_ok(
        1,
        TestUtils::command(&["EXEC"]),
        RespValue::Array(vec![CommandError::ReadOnlyReplica.as_resp()]),
    )
    .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writes_reach_replicas_in_store_order() {
    let env = TestEnv::new_master_server();
    let (sender, mut receiver) = mpsc::unbounded_channel();
    env.server.write().await.replication.add_replica(99, sender);

    for round in 0..50 {
        let writers: Vec<_> = (1..=16)
            .map(|client_id| {
                let dispatcher = env.dispatcher(client_id);
                let value = format!("{}-{}", round, client_id);

                tokio::spawn(async move {
                    let command =
                        CommandHandler::new(TestUtils::set_command("shared", &value)).unwrap();
                    dispatcher.dispatch(command).await.unwrap();
                })
            })
            .collect();

        for writer in writers {
            writer.await.unwrap();
        }

        let mut last_frame = None;
        while let Ok(frame) = receiver.try_recv() {
            last_frame = Some(frame);
        }

        let stored = env.get_store().await.string("shared").cloned().unwrap();

        assert_eq!(
            last_frame,
            Some(TestUtils::set_command("shared", &stored).encode().into_bytes()),
            "round {}",
            round
        );
    }
}

#[tokio::test]
async fn test_wait_inside_transaction_does_not_block() {
    let env = TestEnv::new_master_server();

    env.exec_ok(
        1,
        TestUtils::command(&["MULTI"]),
        TestUtils::expected_simple_string("OK"),
    )
    .await;

    env.exec_ok(
        1,
        TestUtils::command(&["WAIT", "1", "0"]),
        TestUtils::expected_simple_string("QUEUED"),
    )
    .await;

    env.exec_ok(
        1,
        TestUtils::command(&["EXEC"]),
        RespValue::Array(vec![TestUtils::expected_integer(0)]),
    )
    .await;
}
