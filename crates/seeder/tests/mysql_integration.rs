//! Integration tests against a real MySQL server.
//!
//! These tests delete every competition, problem and submission in the target
//! database, so they only run when explicitly enabled. Connection parameters
//! come from the usual `DB_*` variables; the schema must already exist.
//!
//! Run with: `SEED_TEST_MYSQL=1 DB_NAME=matemattici_test cargo test -p competition-seeder --test mysql_integration`

use std::env;

use competition_seeder::config::{CompetitionFile, ConnectionConfig};
use competition_seeder::db::{MySqlBackend, Seeder};
use competition_seeder::errors::SeedError;
use competition_seeder::{SeedInput, run};
use sqlx::Row;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};

/// Connection config, or `None` if MySQL tests are not enabled.
fn test_connection() -> Option<ConnectionConfig> {
    if env::var("SEED_TEST_MYSQL").is_err() {
        eprintln!("Skipping test: SEED_TEST_MYSQL not set");
        return None;
    }
    match ConnectionConfig::resolve(None) {
        Ok(config) => Some(config),
        Err(e) => {
            eprintln!("Skipping test: {e}");
            None
        }
    }
}

fn scenario(id: i64) -> SeedInput {
    let file = CompetitionFile::from_json(&format!(
        r#"{{
            "id": {id},
            "start_timestamp": "2024-06-01T09:00:00Z",
            "end_timestamp": "2024-06-01T10:00:00Z",
            "problems": [{{"id": 1, "number": 1, "answer": 42}}]
        }}"#
    ))
    .unwrap();
    SeedInput::from_file(file).unwrap()
}

// One test function: the scenarios share the same tables and must not interleave.
#[tokio::test]
async fn test_seed_against_mysql() {
    let Some(connection) = test_connection() else {
        return;
    };
    let input = scenario(1234);

    run(MySqlBackend::new(), &input.plan, &connection)
        .await
        .unwrap();

    let mut options = MySqlConnectOptions::new()
        .host(&connection.host)
        .port(connection.port)
        .username(&connection.user)
        .database(&connection.database);
    if !connection.password.is_empty() {
        options = options.password(&connection.password);
    }
    let pool = MySqlPoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();

    let row = sqlx::query(
        r#"
        SELECT CAST(id AS SIGNED) AS id,
               DATE_FORMAT(start_timestamp, '%Y-%m-%d %H:%i:%s') AS start_ts,
               DATE_FORMAT(end_timestamp, '%Y-%m-%d %H:%i:%s') AS end_ts
        FROM competitions
        "#,
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(row.get::<i64, _>("id"), 1234);
    assert_eq!(row.get::<String, _>("start_ts"), "2024-06-01 09:00:00");
    assert_eq!(row.get::<String, _>("end_ts"), "2024-06-01 10:00:00");

    let problems = sqlx::query(
        r#"
        SELECT CAST(competition_id AS SIGNED) AS competition_id,
               CAST(number AS SIGNED) AS number,
               CAST(correct_answer AS SIGNED) AS correct_answer
        FROM problems
        ORDER BY id
        "#,
    )
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].get::<i64, _>("competition_id"), 1234);
    assert_eq!(problems[0].get::<i64, _>("number"), 1);
    assert_eq!(problems[0].get::<i64, _>("correct_answer"), 42);

    pool.close().await;

    // Same competition again, without clearing first.
    let err = Seeder::new(MySqlBackend::new())
        .with_reset(false)
        .run(&input.plan, &connection)
        .await
        .unwrap_err();
    assert!(matches!(err, SeedError::Constraint(_)), "got {err:?}");
}
