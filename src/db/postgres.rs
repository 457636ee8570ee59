//! PostgreSQL plumbing shared by both adapter backends.
//!
//! Binds parameters, runs a classified statement on a connection, converts
//! rows into [`Value`]s and turns sqlx errors into readable messages.

use crate::config::ConnectionConfig;
use crate::db::{classify_statement, ColumnInfo, ExecOutcome, QueryResult, Row, StatementKind, Value};
use crate::error::SmartLineError;
use rust_decimal::Decimal;
use sqlx::postgres::types::{PgInterval, PgTimeTz};
use sqlx::postgres::{PgArguments, PgConnection, PgRow};
use sqlx::query::Query;
use sqlx::{Column as SqlxColumn, Postgres, Row as SqlxRow, TypeInfo};
use tracing::warn;
use uuid::Uuid;

/// Runs one statement on an open connection.
///
/// Errors come back as raw sqlx errors so the caller can decide how to roll
/// back and log before converting.
pub(crate) async fn run_statement(
    conn: &mut PgConnection,
    sql: &str,
    params: &[Value],
) -> std::result::Result<ExecOutcome, sqlx::Error> {
    let query = bind_params(sqlx::query(sql), params);

    match classify_statement(sql) {
        StatementKind::Read => {
            let rows = query.fetch_all(&mut *conn).await?;
            Ok(ExecOutcome::Rows(convert_rows(&rows)))
        }
        StatementKind::Write => {
            let done = query.execute(&mut *conn).await?;
            Ok(ExecOutcome::Affected(done.rows_affected()))
        }
    }
}

/// Binds positional parameters in order.
fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &[Value],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(*b),
            Value::Int(i) => query.bind(*i),
            Value::Float(f) => query.bind(*f),
            Value::String(s) => query.bind(s.clone()),
            Value::Bytes(b) => query.bind(b.clone()),
        };
    }
    query
}

/// Converts fetched rows into a QueryResult, taking column metadata from the first row.
fn convert_rows(rows: &[PgRow]) -> QueryResult {
    let columns: Vec<ColumnInfo> = rows
        .first()
        .map(|first| {
            first
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect()
        })
        .unwrap_or_default();

    QueryResult::with_data(columns, rows.iter().map(convert_row).collect())
}

/// Converts a sqlx PgRow to our Row type.
fn convert_row(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value from a PgRow to our Value type.
fn convert_value(row: &PgRow, index: usize, type_name: &str) -> Value {
    match type_name.to_uppercase().as_str() {
        "BOOL" | "BOOLEAN" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),

        "INT2" | "SMALLINT" => row
            .try_get::<Option<i16>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Int(v as i64))
            .unwrap_or(Value::Null),

        "INT4" | "INT" | "INTEGER" => row
            .try_get::<Option<i32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Int(v as i64))
            .unwrap_or(Value::Null),

        "INT8" | "BIGINT" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Int)
            .unwrap_or(Value::Null),

        "FLOAT4" | "REAL" => row
            .try_get::<Option<f32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Float(v as f64))
            .unwrap_or(Value::Null),

        "FLOAT8" | "DOUBLE PRECISION" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Float)
            .unwrap_or(Value::Null),

        "BYTEA" => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bytes)
            .unwrap_or(Value::Null),

        // task_db timestamps and dates are rendered as text
        "TIMESTAMP" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),

        "TIMESTAMPTZ" => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_rfc3339()))
            .unwrap_or(Value::Null),

        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),

        "TIME" => row
            .try_get::<Option<chrono::NaiveTime>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),

        "TIMETZ" => row
            .try_get::<Option<PgTimeTz<chrono::NaiveTime, chrono::FixedOffset>>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(format!("{}{}", v.time, v.offset)))
            .unwrap_or(Value::Null),

        "INTERVAL" => row
            .try_get::<Option<PgInterval>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(format_interval(&v)))
            .unwrap_or(Value::Null),

        "NUMERIC" => match row.try_get::<Option<Decimal>, _>(index) {
            Ok(v) => v.map(|d| Value::String(d.to_string())).unwrap_or(Value::Null),
            // Out of Decimal range (or NaN): keep the raw cell rather than drop it.
            Err(_) => decode_fallback(row, index),
        },

        "UUID" => row
            .try_get::<Option<Uuid>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),

        "JSON" | "JSONB" => row
            .try_get::<Option<serde_json::Value>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),

        // Text-like types and enums (labels travel as text)
        _ => decode_fallback(row, index),
    }
}

/// Decodes a cell of a type with no dedicated arm.
///
/// Text is taken as-is whatever the declared type; anything that is not
/// valid UTF-8 is kept as bytes. Only a real NULL becomes [`Value::Null`].
fn decode_fallback(row: &PgRow, index: usize) -> Value {
    if let Ok(text) = row.try_get_unchecked::<Option<String>, _>(index) {
        return text.map(Value::String).unwrap_or(Value::Null);
    }

    match row.try_get_unchecked::<Option<Vec<u8>>, _>(index) {
        Ok(bytes) => bytes.map(Value::Bytes).unwrap_or(Value::Null),
        Err(e) => {
            warn!(column = index, "Could not decode column: {e}");
            Value::Null
        }
    }
}

/// Renders an interval the way Postgres prints it by default.
fn format_interval(interval: &PgInterval) -> String {
    let mut parts = Vec::new();

    let years = interval.months / 12;
    let months = interval.months % 12;
    for (amount, unit) in [(years, "year"), (months, "mon"), (interval.days, "day")] {
        if amount != 0 {
            let plural = if amount == 1 { "" } else { "s" };
            parts.push(format!("{amount} {unit}{plural}"));
        }
    }

    let micros = interval.microseconds;
    if micros != 0 || parts.is_empty() {
        let sign = if micros < 0 { "-" } else { "" };
        let micros = micros.unsigned_abs();
        let secs = micros / 1_000_000;
        let frac = micros % 1_000_000;
        let mut clock = format!(
            "{sign}{:02}:{:02}:{:02}",
            secs / 3600,
            (secs / 60) % 60,
            secs % 60
        );
        if frac != 0 {
            let digits = format!("{frac:06}");
            clock.push('.');
            clock.push_str(digits.trim_end_matches('0'));
        }
        parts.push(clock);
    }

    parts.join(" ")
}

/// Maps sqlx connection errors to user-friendly messages.
pub(crate) fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> SmartLineError {
    let host = config.host();
    let port = config.port();
    let user = config.user();
    let database = config.database();

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        SmartLineError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
    {
        SmartLineError::connection(format!(
            "Authentication failed for user '{user}'. Check your credentials."
        ))
    } else if error_str.contains("does not exist") && error_str.contains("database") {
        SmartLineError::connection(format!("Database '{database}' does not exist."))
    } else if error_str.contains("ssl") || error_str.contains("tls") {
        SmartLineError::connection("Server requires SSL.".to_string())
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        SmartLineError::connection(format!(
            "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        SmartLineError::connection(error.to_string())
    }
}

/// Maps a statement failure to a query error, keeping Postgres detail and hint.
pub(crate) fn map_query_error(error: sqlx::Error) -> SmartLineError {
    SmartLineError::query(format_query_error(error))
}

fn format_query_error(error: sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut result = String::from("ERROR: ");
    result.push_str(db_error.message());

    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        if let Some(detail) = pg_error.detail() {
            result.push_str("\n  DETAIL: ");
            result.push_str(detail);
        }

        if let Some(hint) = pg_error.hint() {
            result.push_str("\n  HINT: ");
            result.push_str(hint);
        }

        if let Some(constraint) = pg_error.constraint() {
            result.push_str("\n  CONSTRAINT: ");
            result.push_str(constraint);
        }
    }

    result
}
