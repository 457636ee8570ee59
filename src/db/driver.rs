//! Direct-driver backend.
//!
//! Holds a single `PgConnection` and runs every statement straight on it in
//! autocommit mode.

use crate::config::ConnectionConfig;
use crate::db::postgres::{map_connection_error, map_query_error, run_statement};
use crate::db::{ConnectionState, DatabaseClient, ExecOutcome, Value};
use crate::error::{Result, SmartLineError};
use async_trait::async_trait;
use sqlx::postgres::PgConnection;
use sqlx::Connection;
use tracing::{debug, error, info};

/// Adapter over one raw Postgres connection.
#[derive(Debug)]
pub struct DriverClient {
    config: ConnectionConfig,
    conn: Option<PgConnection>,
    state: ConnectionState,
}

impl DriverClient {
    /// Creates an unopened client.
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            conn: None,
            state: ConnectionState::Unopened,
        }
    }
}

#[async_trait]
impl DatabaseClient for DriverClient {
    async fn open(&mut self) -> Result<()> {
        if self.state == ConnectionState::Open {
            debug!("Driver connection already open");
            return Ok(());
        }

        match PgConnection::connect_with(&self.config.connect_options()).await {
            Ok(conn) => {
                self.conn = Some(conn);
                self.state = ConnectionState::Open;
                info!(target_db = %self.config.display_string(), "Database connection established successfully");
                Ok(())
            }
            Err(e) => {
                let err = map_connection_error(e, &self.config);
                error!("Error creating database connection: {}", err);
                Err(err)
            }
        }
    }

    async fn execute(&mut self, query: &str, params: &[Value]) -> Result<ExecOutcome> {
        if self.state != ConnectionState::Open {
            self.open().await?;
        }

        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| SmartLineError::internal("driver connection missing after open"))?;

        debug!(params = params.len(), "Executing statement");
        run_statement(conn, query, params).await.map_err(|e| {
            let err = map_query_error(e);
            error!("Driver statement error: {}", err);
            err
        })
    }

    async fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            match conn.close().await {
                Ok(()) => info!("Database connection closed successfully"),
                Err(e) => error!("Error closing database connection: {}", e),
            }
        }
        if self.state == ConnectionState::Open {
            self.state = ConnectionState::Closed;
        }
    }

    fn state(&self) -> ConnectionState {
        self.state
    }
}
