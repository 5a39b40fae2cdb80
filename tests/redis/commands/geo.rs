use redis_engine::{commands::CommandError, resp::RespValue};

use crate::test_utils::{TestEnv, TestUtils};

fn as_float(value: &RespValue) -> f64 {
    match value {
        RespValue::BulkString(number) => number.parse().unwrap(),
        other => panic!("Expected a number, got {:?}", other),
    }
}

async fn sicily() -> TestEnv {
    let env = TestEnv::new_master_server();

    env.exec_ok(
        1,
        TestUtils::command(&[
            "GEOADD",
            "Sicily",
            "13.361389",
            "38.115556",
            "Palermo",
            "15.087269",
            "37.502669",
            "Catania",
        ]),
        TestUtils::expected_integer(2),
    )
    .await;

    env
}

#[tokio::test]
async fn test_handle_geoadd_stores_sorted_set_scores() {
    let env = sicily().await;

    env.exec_ok(
        1,
        TestUtils::command(&["TYPE", "Sicily"]),
        TestUtils::expected_simple_string("zset"),
    )
    .await;

    env.exec_ok(
        1,
        TestUtils::command(&["ZSCORE", "Sicily", "Palermo"]),
        TestUtils::expected_bulk_string("3479099956230698"),
    )
    .await;

    env.exec_ok(
        1,
        TestUtils::command(&["ZRANGE", "Sicily", "0", "-1"]),
        TestUtils::expected_bulk_string_array(&["Palermo", "Catania"]),
    )
    .await;
}

#[tokio::test]
async fn test_handle_geoadd_rejects_out_of_range_pairs() {
    let env = TestEnv::new_master_server();

    env.exec_err(
        1,
        TestUtils::command(&["GEOADD", "places", "1", "1", "ok", "1", "86", "pole"]),
        CommandError::InvalidCoordinates("ERR invalid latitude 86".to_string()),
    )
    .await;

    env.exec_ok(
        1,
        TestUtils::command(&["TYPE", "places"]),
        TestUtils::expected_simple_string("none"),
    )
    .await;
}

#[tokio::test]
async fn test_handle_geopos() {
    let env = sicily().await;

    let response = env
        .exec(
            1,
            TestUtils::command(&["GEOPOS", "Sicily", "Palermo", "Atlantis"]),
        )
        .await;

    let Ok(redis_engine::commands::CommandResult::Response(RespValue::Array(positions))) =
        response
    else {
        panic!("Expected an array of positions");
    };

    assert_eq!(positions.len(), 2);
    assert_eq!(positions[1], RespValue::NullArray);

    let RespValue::Array(palermo) = &positions[0] else {
        panic!("Expected a coordinate pair");
    };

    assert!((as_float(&palermo[0]) - 13.361389).abs() < 1e-5);
    assert!((as_float(&palermo[1]) - 38.115556).abs() < 1e-5);
}

#[tokio::test]
async fn test_handle_geodist() {
    let env = sicily().await;

    let test_cases = vec![
        (vec!["GEODIST", "Sicily", "Palermo", "Catania"], 166274.1516),
        (vec!["GEODIST", "Sicily", "Palermo", "Catania", "km"], 166.2742),
    ];

    for (command, expected) in test_cases {
        let response = env.exec(1, TestUtils::command(&command)).await;

        let Ok(redis_engine::commands::CommandResult::Response(value)) = response else {
            panic!("Expected a distance for {:?}", command);
        };

        let RespValue::BulkString(text) = &value else {
            panic!("Expected a bulk string, got {:?}", value);
        };

        assert_eq!(text.split('.').nth(1).map(str::len), Some(4), "{}", text);
        assert!((as_float(&value) - expected).abs() / expected < 1e-4, "{}", text);
    }

    env.exec_ok(
        1,
        TestUtils::command(&["GEODIST", "Sicily", "Palermo", "Atlantis"]),
        TestUtils::expected_null(),
    )
    .await;

    env.exec_err(
        1,
        TestUtils::command(&["GEODIST", "Sicily", "Palermo", "Catania", "parsec"]),
        CommandError::UnsupportedUnit,
    )
    .await;
}

#[tokio::test]
async fn test_handle_geosearch() {
    let env = sicily().await;

    let test_cases = vec![
        (
            vec!["GEOSEARCH", "Sicily", "FROMLONLAT", "15", "37", "BYRADIUS", "200", "km"],
            vec!["Palermo", "Catania"],
        ),
        (
            vec!["GEOSEARCH", "Sicily", "FROMLONLAT", "15", "37", "BYRADIUS", "100", "km"],
            vec!["Catania"],
        ),
        (
            vec!["GEOSEARCH", "Sicily", "FROMMEMBER", "Palermo", "BYRADIUS", "10", "km"],
            vec!["Palermo"],
        ),
        (
            vec!["GEOSEARCH", "Nowhere", "FROMLONLAT", "15", "37", "BYRADIUS", "1", "m"],
            vec![],
        ),
    ];

    for (command, expected) in test_cases {
        env.exec_ok(
            1,
            TestUtils::command(&command),
            TestUtils::expected_bulk_string_array(&expected),
        )
        .await;
    }

    env.exec_err(
        1,
        TestUtils::command(&[
            "GEOSEARCH", "Sicily", "FROMMEMBER", "Atlantis", "BYRADIUS", "10", "km",
        ]),
        CommandError::UnknownMember,
    )
    .await;
}
