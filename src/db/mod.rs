//! Connection adapter for smart-line.
//!
//! Provides a trait-based interface over a single database connection, with
//! two interchangeable backends: direct driver calls and a transactional
//! session. Callers only ever see [`DatabaseClient`].

mod driver;
mod mock;
mod postgres;
mod schema;
mod session;
mod types;

pub use driver::DriverClient;
pub use mock::{MockDatabaseClient, MockEvent};
pub use schema::{ForeignKey, Index, Schema, Table};
pub use session::SessionClient;
pub use types::{ColumnInfo, ConnectionState, ExecOutcome, QueryResult, Row, Value};

use crate::config::ConnectionConfig;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{error, info};

/// Supported adapter backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    /// One raw connection, statements executed directly.
    #[default]
    Driver,
    /// One-connection pool, every statement in its own transaction.
    Session,
}

impl DatabaseBackend {
    /// Returns the backend as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Driver => "driver",
            Self::Session => "session",
        }
    }
}

impl FromStr for DatabaseBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "driver" => Ok(Self::Driver),
            "session" => Ok(Self::Session),
            _ => Err(format!("Unknown backend: {s}. Expected: driver or session")),
        }
    }
}

impl std::fmt::Display for DatabaseBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How `execute` treats a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// Result set is materialized and returned.
    Read,
    /// Only the affected-row count is returned.
    Write,
}

/// Classifies a statement by its leading keyword.
///
/// Purely textual: after leading whitespace, a case-insensitive `select`
/// prefix means [`StatementKind::Read`], anything else is a write. Reads that
/// start with `WITH`, `(`, `VALUES`, `TABLE` or a comment are therefore
/// classified as writes and yield an affected-row count.
pub fn classify_statement(query: &str) -> StatementKind {
    let trimmed = query.trim_start();
    match trimmed.get(..6) {
        Some(prefix) if prefix.eq_ignore_ascii_case("select") => StatementKind::Read,
        _ => StatementKind::Write,
    }
}

/// Creates an unopened adapter for the given backend.
pub fn new_client(backend: DatabaseBackend, config: &ConnectionConfig) -> Box<dyn DatabaseClient> {
    match backend {
        DatabaseBackend::Driver => Box::new(DriverClient::new(config.clone())),
        DatabaseBackend::Session => Box::new(SessionClient::new(config.clone())),
    }
}

/// Trait defining the connection adapter contract.
///
/// All operations are async and return Results with SmartLineError.
#[async_trait]
pub trait DatabaseClient: Send {
    /// Establishes the connection. A no-op while already open.
    async fn open(&mut self) -> Result<()>;

    /// Executes a statement with positional parameters (`$1`, `$2`, ...).
    ///
    /// Opens the connection first if it is not open.
    async fn execute(&mut self, query: &str, params: &[Value]) -> Result<ExecOutcome>;

    /// Releases the connection. Safe to call repeatedly; never fails.
    async fn close(&mut self);

    /// Current lifecycle state.
    fn state(&self) -> ConnectionState;
}

/// Opens the adapter, asks the server for its version and closes again.
///
/// Returns false (after logging) when the server cannot be reached or the
/// query fails. Nothing is propagated.
pub async fn check_connection(db: &mut dyn DatabaseClient) -> bool {
    let result = db.execute("SELECT version()", &[]).await;
    db.close().await;

    match result {
        Ok(ExecOutcome::Rows(rows)) => {
            let version = rows
                .rows
                .first()
                .and_then(|row| row.first())
                .map(Value::to_display_string)
                .unwrap_or_default();
            info!("Connected to: {version}");
            true
        }
        Ok(ExecOutcome::Affected(_)) => {
            error!("Connection test failed: version query returned no rows");
            false
        }
        Err(e) => {
            error!("Connection test failed: {e}");
            false
        }
    }
}

/// Produces a fresh adapter for each unit of work.
pub trait Connector: Send + Sync {
    /// Returns a new, unopened adapter.
    fn client(&self) -> Box<dyn DatabaseClient>;
}

/// Connector backed by a real Postgres server.
#[derive(Debug, Clone)]
pub struct PgConnector {
    config: ConnectionConfig,
}

impl PgConnector {
    /// Creates a connector using the backend named in the configuration.
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }
}

impl Connector for PgConnector {
    fn client(&self) -> Box<dyn DatabaseClient> {
        new_client(self.config.backend, &self.config)
    }
}
