use std::time::Duration;

use redis_engine::{
    commands::{CommandError, CommandResult},
    resp::RespValue,
};

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_rpush_lpush_and_lrange() {
    let env = TestEnv::new_master_server();

    env.exec_ok(
        1,
        TestUtils::rpush_command("mylist", &["a", "b", "c"]),
        TestUtils::expected_integer(3),
    )
    .await;

    env.exec_ok(
        1,
        TestUtils::lrange_command("mylist", 0, -1),
        TestUtils::expected_bulk_string_array(&["a", "b", "c"]),
    )
    .await;

    env.exec_ok(
        1,
        TestUtils::lpush_command("mylist", &["x", "y"]),
        TestUtils::expected_integer(5),
    )
    .await;

    let test_cases = vec![
        ((0, -1), vec!["y", "x", "a", "b", "c"]),
        ((0, 1), vec!["y", "x"]),
        ((-2, -1), vec!["b", "c"]),
        ((-100, 0), vec!["y"]),
        ((3, 100), vec!["b", "c"]),
        ((4, 2), vec![]),
        ((5, 6), vec![]),
    ];

    for ((start, end), expected) in test_cases {
        env.exec_ok(
            1,
            TestUtils::lrange_command("mylist", start, end),
            TestUtils::expected_bulk_string_array(&expected),
        )
        .await;
    }

    env.exec_ok(
        1,
        TestUtils::command(&["LLEN", "mylist"]),
        TestUtils::expected_integer(5),
    )
    .await;

    env.exec_ok(
        1,
        TestUtils::command(&["LLEN", "missing"]),
        TestUtils::expected_integer(0),
    )
    .await;

    env.exec_ok(
        1,
        TestUtils::lrange_command("missing", 0, -1),
        RespValue::Array(Vec::new()),
    )
    .await;
}

#[tokio::test]
async fn test_handle_lpop() {
    let env = TestEnv::new_master_server();

    env.exec_ok(
        1,
        TestUtils::rpush_command("fruits", &["apple", "banana", "cherry", "date"]),
        TestUtils::expected_integer(4),
    )
    .await;

    let test_cases = vec![
        (
            TestUtils::command(&["LPOP", "fruits"]),
            TestUtils::expected_bulk_string("apple"),
        ),
        (
            TestUtils::command(&["LPOP", "fruits", "2"]),
            TestUtils::expected_bulk_string_array(&["banana", "cherry"]),
        ),
        (
            TestUtils::command(&["LPOP", "fruits", "0"]),
            RespValue::Array(Vec::new()),
        ),
        (
            TestUtils::command(&["LPOP", "fruits", "1"]),
            TestUtils::expected_bulk_string("date"),
        ),
        (
            TestUtils::command(&["RPUSH", "fruits", "elderberry"]),
            TestUtils::expected_integer(1),
        ),
        (
            TestUtils::command(&["LPOP", "fruits", "10"]),
            TestUtils::expected_bulk_string_array(&["elderberry"]),
        ),
        (
            TestUtils::command(&["LPOP", "fruits"]),
            TestUtils::expected_null(),
        ),
        (
            TestUtils::command(&["LPOP", "fruits", "1"]),
            TestUtils::expected_null(),
        ),
        (
            TestUtils::command(&["LPOP", "fruits", "3"]),
            TestUtils::expected_null(),
        ),
    ];

    for (command, expected) in test_cases {
        env.exec_ok(1, command, expected).await;
    }

    env.exec_err(
        1,
        TestUtils::command(&["LPOP", "fruits", "-1"]),
        CommandError::NotPositive,
    )
    .await;

    env.exec_ok(
        1,
        TestUtils::command(&["TYPE", "fruits"]),
        TestUtils::expected_simple_string("none"),
    )
    .await;
}

#[tokio::test]
async fn test_handle_blpop_with_data_pops_immediately() {
    let env = TestEnv::new_master_server();

    env.exec_ok(
        1,
        TestUtils::rpush_command("queue", &["first", "second"]),
        TestUtils::expected_integer(2),
    )
    .await;

    env.exec_ok(
        2,
        TestUtils::blpop_command("queue", "0"),
        TestUtils::expected_bulk_string_array(&["queue", "first"]),
    )
    .await;
}

#[tokio::test]
async fn test_handle_blpop_served_by_push_in_arrival_order() {
    let env = TestEnv::new_master_server();

    let mut receivers = Vec::new();

    for client_id in [1, 2] {
        match env.exec(client_id, TestUtils::blpop_command("queue", "0")).await {
            Ok(CommandResult::Blocked {
                receiver, timeout, ..
            }) => {
                assert_eq!(timeout, None);
                receivers.push(receiver);
            }
            other => panic!("Expected BLPOP to block, got {:?}", other),
        }
    }

    assert_eq!(env.get_state().await.blocking.list_waiter_count("queue"), 2);

    env.exec_ok(
        3,
        TestUtils::rpush_command("queue", &["a", "b", "c"]),
        TestUtils::expected_integer(3),
    )
    .await;

    let second = receivers.pop().unwrap();
    let first = receivers.pop().unwrap();

    assert_eq!(
        first.await.unwrap(),
        TestUtils::expected_bulk_string_array(&["queue", "a"])
    );
    assert_eq!(
        second.await.unwrap(),
        TestUtils::expected_bulk_string_array(&["queue", "b"])
    );

    env.exec_ok(
        3,
        TestUtils::lrange_command("queue", 0, -1),
        TestUtils::expected_bulk_string_array(&["c"]),
    )
    .await;
}

#[tokio::test]
async fn test_handle_blpop_timeout_argument() {
    let env = TestEnv::new_master_server();

    match env.exec(1, TestUtils::blpop_command("queue", "0.5")).await {
        Ok(CommandResult::Blocked { timeout, .. }) => {
            assert_eq!(timeout, Some(Duration::from_millis(500)))
        }
        other => panic!("Expected BLPOP to block, got {:?}", other),
    }

    let test_cases = vec![
        (
            TestUtils::blpop_command("queue", "-1"),
            CommandError::NegativeTimeout,
        ),
        (
            TestUtils::blpop_command("queue", "soon"),
            CommandError::InvalidTimeout,
        ),
        (
            TestUtils::command(&["BLPOP", "queue"]),
            CommandError::wrong_arguments("blpop"),
        ),
    ];

    for (command, expected) in test_cases {
        env.exec_err(2, command, expected).await;
    }
}

#[tokio::test]
async fn test_list_commands_on_wrong_type() {
    let env = TestEnv::new_master_server();

    env.exec_ok(
        1,
        TestUtils::set_command("name", "redis"),
        TestUtils::expected_simple_string("OK"),
    )
    .await;

    env.exec_err(
        1,
        TestUtils::rpush_command("name", &["a"]),
        CommandError::Store(redis_engine::key_value_store::StoreError::WrongType),
    )
    .await;

    env.exec_ok(
        1,
        TestUtils::lrange_command("name", 0, -1),
        RespValue::Array(Vec::new()),
    )
    .await;
}
