use std::time::Duration;

use redis_engine::resp::RespValue;

use crate::test_utils::{spawn_server, TestClient, TestUtils};

const SNAPSHOT_FLAGS: [&str; 4] = ["--dir", "/tmp/redis-engine-tests", "--dbfilename", "none.rdb"];

#[tokio::test]
async fn test_basic_commands_over_tcp() {
    let port = spawn_server(7301, &SNAPSHOT_FLAGS);
    let mut client = TestClient::connect(port).await;

    assert_eq!(
        client.request(&["PING"]).await,
        TestUtils::expected_simple_string("PONG")
    );
    assert_eq!(
        client.request(&["ECHO", "hey"]).await,
        TestUtils::expected_bulk_string("hey")
    );
    assert_eq!(
        client.request(&["SET", "foo", "bar"]).await,
        TestUtils::expected_simple_string("OK")
    );
    assert_eq!(
        client.request(&["GET", "foo"]).await,
        TestUtils::expected_bulk_string("bar")
    );
    assert_eq!(
        client.request(&["NOPE"]).await,
        RespValue::Error("ERR unknown command 'nope'".to_string())
    );
}

#[tokio::test]
async fn test_pipelined_commands_reply_in_order() {
    let port = spawn_server(7302, &SNAPSHOT_FLAGS);
    let mut client = TestClient::connect(port).await;

    let mut pipeline = Vec::new();
    for parts in [
        &["SET", "counter", "10"][..],
        &["INCR", "counter"],
        &["GET", "counter"],
    ] {
        pipeline.extend_from_slice(TestUtils::command(parts).encode().as_bytes());
    }
    client.send_raw(&pipeline).await;

    assert_eq!(client.read_value().await, TestUtils::expected_simple_string("OK"));
    assert_eq!(client.read_value().await, TestUtils::expected_integer(11));
    assert_eq!(client.read_value().await, TestUtils::expected_bulk_string("11"));
}

#[tokio::test]
async fn test_protocol_error_closes_connection() {
    let port = spawn_server(7303, &SNAPSHOT_FLAGS);
    let mut client = TestClient::connect(port).await;

    client.send_raw(b"?garbage\r\n").await;

    assert!(matches!(client.read_value().await, RespValue::Error(_)));
    assert!(client.is_closed().await);
}

#[tokio::test]
async fn test_quit_closes_connection() {
    let port = spawn_server(7304, &SNAPSHOT_FLAGS);
    let mut client = TestClient::connect(port).await;

    assert_eq!(
        client.request(&["QUIT"]).await,
        TestUtils::expected_simple_string("OK")
    );
    assert!(client.is_closed().await);
}

#[tokio::test]
async fn test_blpop_is_served_by_another_connection() {
    let port = spawn_server(7305, &SNAPSHOT_FLAGS);
    let mut waiter = TestClient::connect(port).await;
    let mut producer = TestClient::connect(port).await;

    waiter.send(&["BLPOP", "queue", "0"]).await;
    assert!(waiter
        .try_read_value(Duration::from_millis(100))
        .await
        .is_none());

    assert_eq!(
        producer.request(&["RPUSH", "queue", "job"]).await,
        TestUtils::expected_integer(1)
    );

    assert_eq!(
        waiter.read_value().await,
        TestUtils::expected_bulk_string_array(&["queue", "job"])
    );
    assert_eq!(
        producer.request(&["LLEN", "queue"]).await,
        TestUtils::expected_integer(0)
    );
}

#[tokio::test]
async fn test_blpop_times_out_and_keeps_pipelined_commands() {
    let port = spawn_server(7306, &SNAPSHOT_FLAGS);
    let mut client = TestClient::connect(port).await;

    let mut pipeline = Vec::new();
    pipeline.extend_from_slice(TestUtils::blpop_command("queue", "0.1").encode().as_bytes());
    pipeline.extend_from_slice(TestUtils::command(&["PING"]).encode().as_bytes());
    client.send_raw(&pipeline).await;

    assert_eq!(client.read_value().await, RespValue::NullArray);
    assert_eq!(client.read_value().await, TestUtils::expected_simple_string("PONG"));
}

#[tokio::test]
async fn test_xread_block_is_served_by_xadd() {
    let port = spawn_server(7307, &SNAPSHOT_FLAGS);
    let mut reader = TestClient::connect(port).await;
    let mut writer = TestClient::connect(port).await;

    reader
        .send(&["XREAD", "BLOCK", "0", "STREAMS", "events", "$"])
        .await;
    assert!(reader
        .try_read_value(Duration::from_millis(100))
        .await
        .is_none());

    assert_eq!(
        writer.request(&["XADD", "events", "1-1", "kind", "click"]).await,
        TestUtils::expected_bulk_string("1-1")
    );

    assert_eq!(
        reader.read_value().await,
        RespValue::Array(vec![RespValue::Array(vec![
            TestUtils::expected_bulk_string("events"),
            RespValue::Array(vec![TestUtils::expected_stream_entry(
                "1-1",
                &[("kind", "click")]
            )]),
        ])])
    );
}

#[tokio::test]
async fn test_publish_reaches_subscribers() {
    let port = spawn_server(7308, &SNAPSHOT_FLAGS);
    let mut first = TestClient::connect(port).await;
    let mut second = TestClient::connect(port).await;
    let mut publisher = TestClient::connect(port).await;

    for subscriber in [&mut first, &mut second] {
        assert_eq!(
            subscriber.request(&["SUBSCRIBE", "news"]).await,
            RespValue::Array(vec![
                TestUtils::expected_bulk_string("subscribe"),
                TestUtils::expected_bulk_string("news"),
                TestUtils::expected_integer(1),
            ])
        );
    }

    assert_eq!(
        publisher.request(&["PUBLISH", "news", "hello"]).await,
        TestUtils::expected_integer(2)
    );

    for subscriber in [&mut first, &mut second] {
        assert_eq!(
            subscriber.read_value().await,
            TestUtils::expected_bulk_string_array(&["message", "news", "hello"])
        );
    }

    assert_eq!(
        first.request(&["GET", "foo"]).await,
        RespValue::Error(
            "ERR Can't execute 'get': only (P|S)SUBSCRIBE / (P|S)UNSUBSCRIBE / PING / QUIT / RESET are allowed in this context".to_string()
        )
    );
}

#[tokio::test]
async fn test_replica_follows_leader() {
    let leader_port = spawn_server(7309, &SNAPSHOT_FLAGS);
    let mut leader = TestClient::connect(leader_port).await;

    let leader_address = format!("127.0.0.1 {}", leader_port);
    let mut flags = SNAPSHOT_FLAGS.to_vec();
    flags.extend(["--replicaof", leader_address.as_str()]);
    let replica_port = spawn_server(7310, &flags);
    let mut replica = TestClient::connect(replica_port).await;

    let mut connected = false;
    for _ in 0..100 {
        let info = leader.request(&["INFO", "replication"]).await;

        if matches!(&info, RespValue::BulkString(info) if info.contains("connected_slaves:1")) {
            connected = true;
            break;
        }

        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(connected, "replica never completed the handshake");

    assert_eq!(
        leader.request(&["SET", "foo", "bar"]).await,
        TestUtils::expected_simple_string("OK")
    );
    assert_eq!(
        leader.request(&["WAIT", "1", "1000"]).await,
        TestUtils::expected_integer(1)
    );

    let mut replicated = RespValue::NullBulkString;
    for _ in 0..100 {
        replicated = replica.request(&["GET", "foo"]).await;

        if replicated != RespValue::NullBulkString {
            break;
        }

        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(replicated, TestUtils::expected_bulk_string("bar"));

    assert_eq!(
        replica.request(&["SET", "foo", "baz"]).await,
        RespValue::Error(
            "READONLY You can't write against a read only replica.".to_string()
        )
    );
}

#[tokio::test]
async fn test_oversized_frames_close_only_that_connection() {
    let port = spawn_server(7311, &SNAPSHOT_FLAGS);
    let mut attacker = TestClient::connect(port).await;
    let mut bystander = TestClient::connect(port).await;

    attacker.send_raw(b"*100000000000000\r\n").await;
    assert!(matches!(attacker.read_value().await, RespValue::Error(_)));
    assert!(attacker.is_closed().await);

    let mut nested = TestClient::connect(port).await;
    nested
        .send_raw(format!("{}+a\r\n", "*1\r\n".repeat(1_000)).as_bytes())
        .await;
    assert!(matches!(nested.read_value().await, RespValue::Error(_)));

    assert_eq!(
        bystander.request(&["PING"]).await,
        TestUtils::expected_simple_string("PONG")
    );
}

#[tokio::test]
async fn test_client_leaving_during_wait_is_cleaned_up() {
    let port = spawn_server(7312, &SNAPSHOT_FLAGS);
    let mut observer = TestClient::connect(port).await;
    let mut replica = TestClient::connect(port).await;

    replica.send(&["PSYNC", "?", "-1"]).await;
    assert!(
        wait_for_connected_replicas(&mut observer, 1).await,
        "replica was never registered"
    );

    // The replica never acknowledges, so this WAIT has nothing to end it.
    replica.send(&["WAIT", "2", "0"]).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    drop(replica);

    assert!(
        wait_for_connected_replicas(&mut observer, 0).await,
        "connection stuck in WAIT was never cleaned up"
    );
}

async fn wait_for_connected_replicas(client: &mut TestClient, expected: usize) -> bool {
    let needle = format!("connected_slaves:{}", expected);

    for _ in 0..100 {
        let info = client.request(&["INFO", "replication"]).await;

        if matches!(&info, RespValue::BulkString(info) if info.contains(&needle)) {
            return true;
        }

        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    false
}
