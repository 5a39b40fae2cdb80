use redis_engine::{commands::CommandError, resp::RespValue};
use tokio::sync::mpsc;

use crate::test_utils::{TestEnv, TestUtils};

fn confirmation(kind: &str, channel: &str, count: i64) -> RespValue {
    RespValue::Array(vec![
        TestUtils::expected_bulk_string(kind),
        TestUtils::expected_bulk_string(channel),
        TestUtils::expected_integer(count),
    ])
}

#[tokio::test]
async fn test_handle_subscribe_and_publish() {
    let env = TestEnv::new_master_server();
    let (sender, mut receiver) = mpsc::unbounded_channel();
    env.get_state().await.pub_sub.register_client(1, sender);

    env.exec_ok_many(
        1,
        TestUtils::command(&["SUBSCRIBE", "news", "sports"]),
        vec![
            confirmation("subscribe", "news", 1),
            confirmation("subscribe", "sports", 2),
        ],
    )
    .await;

    env.exec_ok_many(
        1,
        TestUtils::command(&["SUBSCRIBE", "news"]),
        vec![confirmation("subscribe", "news", 2)],
    )
    .await;

    env.exec_ok(
        2,
        TestUtils::command(&["PUBLISH", "news", "hello"]),
        TestUtils::expected_integer(1),
    )
    .await;

    env.exec_ok(
        2,
        TestUtils::command(&["PUBLISH", "weather", "rain"]),
        TestUtils::expected_integer(0),
    )
    .await;

    let delivered = receiver.recv().await.unwrap();
    assert_eq!(
        delivered,
        TestUtils::expected_bulk_string_array(&["message", "news", "hello"])
            .encode()
            .into_bytes()
    );
    assert!(receiver.try_recv().is_err());
}

#[tokio::test]
async fn test_subscribed_mode_restricts_commands() {
    let env = TestEnv::new_master_server();

    env.exec_ok_many(
        1,
        TestUtils::command(&["SUBSCRIBE", "news"]),
        vec![confirmation("subscribe", "news", 1)],
    )
    .await;

    env.exec_err(
        1,
        TestUtils::get_command("key"),
        CommandError::NotAllowedWhileSubscribed("get".to_string()),
    )
    .await;

    env.exec_ok(
        1,
        TestUtils::command(&["PING"]),
        TestUtils::expected_bulk_string_array(&["pong", ""]),
    )
    .await;

    env.exec_ok(
        1,
        TestUtils::command(&["PING", "hi"]),
        TestUtils::expected_bulk_string_array(&["pong", "hi"]),
    )
    .await;

    env.exec_ok(
        2,
        TestUtils::get_command("key"),
        TestUtils::expected_null(),
    )
    .await;
}

#[tokio::test]
async fn test_handle_unsubscribe() {
    let env = TestEnv::new_master_server();

    env.exec_ok_many(
        1,
        TestUtils::command(&["SUBSCRIBE", "a", "b", "c"]),
        vec![
            confirmation("subscribe", "a", 1),
            confirmation("subscribe", "b", 2),
            confirmation("subscribe", "c", 3),
        ],
    )
    .await;

    env.exec_ok_many(
        1,
        TestUtils::command(&["UNSUBSCRIBE", "b"]),
        vec![confirmation("unsubscribe", "b", 2)],
    )
    .await;

    env.exec_ok_many(
        1,
        TestUtils::command(&["UNSUBSCRIBE"]),
        vec![
            confirmation("unsubscribe", "a", 1),
            confirmation("unsubscribe", "c", 0),
        ],
    )
    .await;

    env.exec_ok(
        1,
        TestUtils::command(&["UNSUBSCRIBE"]),
        RespValue::Array(vec![
            TestUtils::expected_bulk_string("unsubscribe"),
            RespValue::NullBulkString,
            TestUtils::expected_integer(0),
        ]),
    )
    .await;

    env.exec_ok(
        1,
        TestUtils::command(&["PING"]),
        TestUtils::expected_simple_string("PONG"),
    )
    .await;
}
