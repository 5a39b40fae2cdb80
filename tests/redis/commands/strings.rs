use std::time::Duration;

use redis_engine::{
    commands::CommandError,
    key_value_store::{DataType, StoreError},
    resp::RespValue,
};

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_ping_and_echo() {
    let env = TestEnv::new_master_server();

    let test_cases = vec![
        (
            TestUtils::command(&["PING"]),
            TestUtils::expected_simple_string("PONG"),
        ),
        (
            TestUtils::command(&["ping", "hello"]),
            TestUtils::expected_bulk_string("hello"),
        ),
        (
            TestUtils::command(&["ECHO", "hey"]),
            TestUtils::expected_bulk_string("hey"),
        ),
    ];

    for (command, expected) in test_cases {
        env.exec_ok(1, command, expected).await;
    }

    env.exec_err(
        1,
        TestUtils::command(&["ECHO"]),
        CommandError::wrong_arguments("echo"),
    )
    .await;
}

#[tokio::test]
async fn test_handle_set_and_get() {
    let env = TestEnv::new_master_server();

    env.exec_ok(
        1,
        TestUtils::set_command("grape", "mango"),
        TestUtils::expected_simple_string("OK"),
    )
    .await;

    env.exec_ok(
        2,
        TestUtils::get_command("grape"),
        TestUtils::expected_bulk_string("mango"),
    )
    .await;

    env.exec_ok(
        2,
        TestUtils::get_command("missing"),
        TestUtils::expected_null(),
    )
    .await;

    let mut store_guard = env.get_store().await;
    let value = store_guard.get("grape").cloned().unwrap();
    assert_eq!(value.data, DataType::String("mango".to_string()));
    assert_eq!(value.expiration, None);
}

#[tokio::test]
async fn test_handle_set_with_expiration() {
    let env = TestEnv::new_master_server();

    env.exec_ok(
        1,
        TestUtils::set_command_with_expiration("grape", "mango", 100),
        TestUtils::expected_simple_string("OK"),
    )
    .await;

    env.exec_ok(
        1,
        TestUtils::get_command("grape"),
        TestUtils::expected_bulk_string("mango"),
    )
    .await;

    tokio::time::sleep(Duration::from_millis(150)).await;

    env.exec_ok(1, TestUtils::get_command("grape"), TestUtils::expected_null())
        .await;

    env.exec_ok(
        1,
        TestUtils::command(&["KEYS", "*"]),
        RespValue::Array(Vec::new()),
    )
    .await;
}

#[tokio::test]
async fn test_handle_set_invalid_options() {
    let env = TestEnv::new_master_server();

    let test_cases = vec![
        (
            TestUtils::command(&["SET", "grape"]),
            CommandError::wrong_arguments("set"),
        ),
        (
            TestUtils::command(&["SET", "grape", "mango", "PX"]),
            CommandError::SyntaxError,
        ),
        (
            TestUtils::command(&["SET", "grape", "mango", "XX", "10"]),
            CommandError::SyntaxError,
        ),
        (
            TestUtils::command(&["SET", "grape", "mango", "PX", "0"]),
            CommandError::InvalidExpireTime("set".to_string()),
        ),
        (
            TestUtils::command(&["SET", "grape", "mango", "EX", "soon"]),
            CommandError::InvalidExpireTime("set".to_string()),
        ),
    ];

    for (command, expected) in test_cases {
        env.exec_err(1, command, expected).await;
    }
}

#[tokio::test]
async fn test_handle_incr() {
    let env = TestEnv::new_master_server();

    env.exec_ok(
        1,
        TestUtils::command(&["INCR", "counter"]),
        TestUtils::expected_integer(1),
    )
    .await;

    env.exec_ok(
        1,
        TestUtils::set_command("views", "41"),
        TestUtils::expected_simple_string("OK"),
    )
    .await;

    env.exec_ok(
        1,
        TestUtils::command(&["INCR", "views"]),
        TestUtils::expected_integer(42),
    )
    .await;

    env.exec_ok(
        1,
        TestUtils::set_command("fruit", "banana"),
        TestUtils::expected_simple_string("OK"),
    )
    .await;

    env.exec_err(
        1,
        TestUtils::command(&["INCR", "fruit"]),
        CommandError::NotAnInteger,
    )
    .await;

    env.exec_ok(
        1,
        TestUtils::get_command("fruit"),
        TestUtils::expected_bulk_string("banana"),
    )
    .await;

    env.exec_ok(
        1,
        TestUtils::rpush_command("queue", &["a"]),
        TestUtils::expected_integer(1),
    )
    .await;

    env.exec_err(
        1,
        TestUtils::command(&["INCR", "queue"]),
        CommandError::Store(StoreError::WrongType),
    )
    .await;
}

#[tokio::test]
async fn test_handle_del_keys_and_type() {
    let env = TestEnv::new_master_server();

    env.exec_ok(
        1,
        TestUtils::set_command("b", "1"),
        TestUtils::expected_simple_string("OK"),
    )
    .await;

    env.exec_ok(
        1,
        TestUtils::rpush_command("a", &["x"]),
        TestUtils::expected_integer(1),
    )
    .await;

    env.exec_ok(
        1,
        TestUtils::xadd_command("c", "1-1", &[("f", "v")]),
        TestUtils::expected_bulk_string("1-1"),
    )
    .await;

    env.exec_ok(
        1,
        TestUtils::command(&["KEYS", "*"]),
        TestUtils::expected_bulk_string_array(&["a", "b", "c"]),
    )
    .await;

    env.exec_ok(
        1,
        TestUtils::command(&["KEYS"]),
        TestUtils::expected_bulk_string_array(&["a", "b", "c"]),
    )
    .await;

    env.exec_err(
        1,
        TestUtils::command(&["KEYS", "*", "extra"]),
        CommandError::wrong_arguments("keys"),
    )
    .await;

    let test_cases = vec![
        ("a", "list"),
        ("b", "string"),
        ("c", "stream"),
        ("d", "none"),
    ];

    for (key, expected) in test_cases {
        env.exec_ok(
            1,
            TestUtils::command(&["TYPE", key]),
            TestUtils::expected_simple_string(expected),
        )
        .await;
    }

    env.exec_ok(
        1,
        TestUtils::command(&["DEL", "a", "b", "missing"]),
        TestUtils::expected_integer(2),
    )
    .await;

    env.exec_ok(
        1,
        TestUtils::command(&["KEYS", "*"]),
        TestUtils::expected_bulk_string_array(&["c"]),
    )
    .await;
}

#[tokio::test]
async fn test_handle_config_get() {
    let env = TestEnv::new_master_server();

    env.exec_ok(
        1,
        TestUtils::command(&["CONFIG", "GET", "dir"]),
        TestUtils::expected_bulk_string_array(&["dir", "/tmp/redis-files"]),
    )
    .await;

    env.exec_ok(
        1,
        TestUtils::command(&["config", "get", "dbfilename", "maxmemory"]),
        TestUtils::expected_bulk_string_array(&["dbfilename", "dump.rdb"]),
    )
    .await;

    env.exec_err(
        1,
        TestUtils::command(&["CONFIG", "SET", "dir", "/"]),
        CommandError::UnknownSubcommand("SET".to_string()),
    )
    .await;
}

#[tokio::test]
async fn test_unknown_command() {
    let env = TestEnv::new_master_server();

    env.exec_err(
        1,
        TestUtils::command(&["FLY", "away"]),
        CommandError::UnknownCommand("fly".to_string()),
    )
    .await;
}
