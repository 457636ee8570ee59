//! Session backend.
//!
//! Wraps a one-connection pool that lives only as long as the adapter. Each
//! `execute` runs inside its own transaction: committed on success, rolled
//! back on failure.

use crate::config::ConnectionConfig;
use crate::db::postgres::{map_connection_error, map_query_error, run_statement};
use crate::db::{ConnectionState, DatabaseClient, ExecOutcome, Value};
use crate::error::{Result, SmartLineError};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, error, info, warn};

/// Adapter over a transactional session.
#[derive(Debug)]
pub struct SessionClient {
    config: ConnectionConfig,
    pool: Option<PgPool>,
    state: ConnectionState,
}

impl SessionClient {
    /// Creates an unopened client.
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            pool: None,
            state: ConnectionState::Unopened,
        }
    }
}

#[async_trait]
impl DatabaseClient for SessionClient {
    async fn open(&mut self) -> Result<()> {
        if self.state == ConnectionState::Open {
            debug!("Session already open");
            return Ok(());
        }

        let result = PgPoolOptions::new()
            .max_connections(1)
            .min_connections(0)
            .connect_with(self.config.connect_options())
            .await;

        match result {
            Ok(pool) => {
                self.pool = Some(pool);
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

        let pool = self
            .pool
            .as_ref()
            .ok_or_else(|| SmartLineError::internal("session pool missing after open"))?;

        let mut tx = pool.begin().await.map_err(|e| {
            let err = map_connection_error(e, &self.config);
            error!("Session error: {}", err);
            err
        })?;

        debug!(params = params.len(), "Executing statement in session");
        match run_statement(&mut *tx, query, params).await {
            Ok(outcome) => {
                tx.commit().await.map_err(|e| {
                    let err = map_query_error(e);
                    error!("Session commit error: {}", err);
                    err
                })?;
                Ok(outcome)
            }
            Err(e) => {
                let err = map_query_error(e);
                error!("Session error: {}", err);
                if let Err(rollback_err) = tx.rollback().await {
                    warn!("Session rollback failed: {}", rollback_err);
                }
                Err(err)
            }
        }
    }

    async fn close(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.close().await;
            info!("Database connection closed successfully");
        }
        if self.state == ConnectionState::Open {
            self.state = ConnectionState::Closed;
        }
    }

    fn state(&self) -> ConnectionState {
        self.state
    }
}
