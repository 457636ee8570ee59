//! Query execution and authentication against a live database.
//!
//! Each test creates temporary tables on its own connection, so nothing
//! persists and the real `users` table is shadowed only for that session.

use smart_line::auth::{AuthOutcome, Authenticator, Credentials};
use smart_line::config::ConnectionConfig;
use smart_line::db::{
    new_client, DatabaseBackend, DatabaseClient, DriverClient, ExecOutcome, Value,
};
use smart_line::error::SmartLineError;

fn get_test_config() -> Option<ConnectionConfig> {
    let url = std::env::var("DATABASE_URL").ok()?;
    ConnectionConfig::from_connection_string(&url).ok()
}

/// Opens a driver connection with a temporary `users` table holding one
/// active and one deactivated account.
async fn client_with_users(config: &ConnectionConfig) -> DriverClient {
    let mut client = DriverClient::new(config.clone());
    client
        .execute(
            "CREATE TEMP TABLE users (
                id SERIAL PRIMARY KEY,
                username TEXT NOT NULL,
                email TEXT NOT NULL,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT TRUE
            )",
            &[],
        )
        .await
        .unwrap();
    client
        .execute(
            "INSERT INTO users (username, email, first_name, last_name, is_active) VALUES
                ('alee', 'ana@x.com', 'Ana', 'Lee', TRUE),
                ('bkim', 'bo@x.com', 'Bo', 'Kim', FALSE)",
            &[],
        )
        .await
        .unwrap();
    client
}

#[tokio::test]
async fn test_select_one_returns_single_unnamed_column() {
    let Some(config) = get_test_config() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    for backend in [DatabaseBackend::Driver, DatabaseBackend::Session] {
        let mut client = new_client(backend, &config);
        let outcome = client.execute("SELECT 1", &[]).await.unwrap();
        client.close().await;

        let ExecOutcome::Rows(result) = outcome else {
            panic!("expected rows");
        };
        assert_eq!(result.len(), 1);
        assert_eq!(result.columns[0].name, "?column?");
        assert_eq!(result.rows[0], vec![Value::Int(1)]);
    }
}

#[tokio::test]
async fn test_select_with_no_rows_is_empty_sequence() {
    let Some(config) = get_test_config() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let mut client = new_client(DatabaseBackend::Driver, &config);
    let outcome = client
        .execute("  select 1 WHERE false", &[])
        .await
        .unwrap();
    client.close().await;

    assert!(outcome.is_empty());
    assert!(matches!(outcome, ExecOutcome::Rows(_)));
}

#[tokio::test]
async fn test_write_returns_affected_count() {
    let Some(config) = get_test_config() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let mut client = client_with_users(&config).await;
    let outcome = client
        .execute(
            "UPDATE users SET is_active = TRUE WHERE username = $1",
            &[Value::from("bkim")],
        )
        .await
        .unwrap();
    client.close().await;

    assert_eq!(outcome, ExecOutcome::Affected(1));
}

#[tokio::test]
async fn test_with_query_is_treated_as_write() {
    let Some(config) = get_test_config() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let mut client = new_client(DatabaseBackend::Driver, &config);
    let outcome = client
        .execute("WITH t AS (SELECT 1) SELECT * FROM t", &[])
        .await
        .unwrap();
    client.close().await;

    assert!(matches!(outcome, ExecOutcome::Affected(_)));
}

#[tokio::test]
async fn test_session_rolls_back_failed_statement() {
    let Some(config) = get_test_config() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let mut client = new_client(DatabaseBackend::Session, &config);
    let err = client
        .execute("SELECT * FROM table_that_does_not_exist", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, SmartLineError::Query(_)));

    // The connection is usable again after the rollback.
    let outcome = client.execute("SELECT 2", &[]).await.unwrap();
    assert!(!outcome.is_empty());
    client.close().await;
}

#[tokio::test]
async fn test_authenticate_active_user() {
    let Some(config) = get_test_config() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let client = client_with_users(&config).await;
    let mut auth = Authenticator::new(Box::new(client));

    let outcome = auth
        .authenticate(&Credentials::new("Ana", "Lee", "ana@x.com", "alee"))
        .await
        .unwrap();

    let AuthOutcome::Found(user) = outcome else {
        panic!("expected Ana to be found");
    };
    assert_eq!(user.first_name(), "Ana");
    assert_eq!(user.username(), "alee");
}

#[tokio::test]
async fn test_authenticate_deactivated_user_is_not_found() {
    let Some(config) = get_test_config() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let client = client_with_users(&config).await;
    let mut auth = Authenticator::new(Box::new(client));

    let outcome = auth
        .authenticate(&Credentials::new("Bo", "Kim", "bo@x.com", "bkim"))
        .await
        .unwrap();
    assert_eq!(outcome, AuthOutcome::NotFound);
}

#[tokio::test]
async fn test_authenticate_is_exact_match() {
    let Some(config) = get_test_config() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let client = client_with_users(&config).await;
    let mut auth = Authenticator::new(Box::new(client));

    let outcome = auth
        .authenticate(&Credentials::new("ana", "Lee", "ana@x.com", "alee"))
        .await
        .unwrap();
    assert_eq!(outcome, AuthOutcome::NotFound);
}

#[tokio::test]
async fn test_non_text_cells_are_decoded() {
    let Some(config) = get_test_config() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let mut client = DriverClient::new(config);
    client
        .execute("DROP TYPE IF EXISTS smartline_task_status", &[])
        .await
        .unwrap();
    client
        .execute(
            "CREATE TYPE smartline_task_status AS ENUM ('open', 'done')",
            &[],
        )
        .await
        .unwrap();

    let outcome = client
        .execute(
            "SELECT AVG(x) AS avg_priority,
                    ROUND(AVG(x), 1) AS rounded,
                    'open'::smartline_task_status AS status,
                    now() - now() AS waited,
                    '6f1c2a4e-8b1d-4c8e-9a39-2f0d6b5e7c11'::uuid AS id,
                    '12:30:00'::time AS at,
                    '{\"a\": 1}'::jsonb AS meta,
                    NULL::numeric AS missing
             FROM (VALUES (1), (2)) t(x)",
            &[],
        )
        .await;

    client
        .execute("DROP TYPE IF EXISTS smartline_task_status", &[])
        .await
        .unwrap();
    client.close().await;

    let ExecOutcome::Rows(result) = outcome.unwrap() else {
        panic!("expected rows");
    };

    let avg = result.get(0, "avg_priority").and_then(Value::as_str).unwrap();
    assert_eq!(avg.parse::<f64>().unwrap(), 1.5);
    assert_eq!(result.get(0, "rounded"), Some(&Value::from("1.5")));
    assert_eq!(result.get(0, "status"), Some(&Value::from("open")));
    assert_eq!(result.get(0, "waited"), Some(&Value::from("00:00:00")));
    assert_eq!(
        result.get(0, "id"),
        Some(&Value::from("6f1c2a4e-8b1d-4c8e-9a39-2f0d6b5e7c11"))
    );
    assert_eq!(result.get(0, "at"), Some(&Value::from("12:30:00")));
    assert_eq!(result.get(0, "meta"), Some(&Value::from("{\"a\":1}")));
    assert_eq!(result.get(0, "missing"), Some(&Value::Null));
}
