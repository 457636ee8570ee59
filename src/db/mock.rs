//! Mock connection adapter for testing.
//!
//! Follows the real adapter's lifecycle (lazy open, idempotent close) and
//! records every call, while statement results come from a configurable
//! handler. Clones share the handler and the event log but each clone has its
//! own connection state, so a clone behaves like a freshly constructed adapter.

use super::{
    classify_statement, ConnectionState, Connector, DatabaseClient, ExecOutcome, QueryResult,
    StatementKind, Value,
};
use crate::error::{Result, SmartLineError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};

type Handler = dyn Fn(&str, &[Value]) -> Result<ExecOutcome> + Send + Sync;

/// Something that happened to a mock adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum MockEvent {
    /// A connection was established.
    Open,
    /// A statement was executed.
    Execute { query: String, params: Vec<Value> },
    /// An open connection was released.
    Close,
}

/// A mock database client that answers statements from a handler.
#[derive(Clone)]
pub struct MockDatabaseClient {
    handler: Arc<Handler>,
    open_error: Option<String>,
    events: Arc<Mutex<Vec<MockEvent>>>,
    state: ConnectionState,
}

impl MockDatabaseClient {
    /// Creates a mock that returns no rows for reads and zero affected rows otherwise.
    pub fn new() -> Self {
        Self::with_handler(|query, _| {
            Ok(match classify_statement(query) {
                StatementKind::Read => ExecOutcome::Rows(QueryResult::new()),
                StatementKind::Write => ExecOutcome::Affected(0),
            })
        })
    }

    /// Creates a mock whose statements are answered by `handler`.
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&str, &[Value]) -> Result<ExecOutcome> + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
            open_error: None,
            events: Arc::new(Mutex::new(Vec::new())),
            state: ConnectionState::Unopened,
        }
    }

    /// Creates a mock that returns `result` for every read.
    pub fn with_rows(result: QueryResult) -> Self {
        Self::with_handler(move |query, _| {
            Ok(match classify_statement(query) {
                StatementKind::Read => ExecOutcome::Rows(result.clone()),
                StatementKind::Write => ExecOutcome::Affected(0),
            })
        })
    }

    /// Creates a mock whose statements all fail with a query error.
    pub fn failing_query(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::with_handler(move |_, _| Err(SmartLineError::query(message.clone())))
    }

    /// Makes every `open` fail with a connection error.
    pub fn fail_open(mut self, message: impl Into<String>) -> Self {
        self.open_error = Some(message.into());
        self
    }

    /// Returns everything recorded so far, across all clones.
    pub fn events(&self) -> Vec<MockEvent> {
        self.lock_events().clone()
    }

    /// Returns the statements executed so far, across all clones.
    pub fn executed_queries(&self) -> Vec<String> {
        self.lock_events()
            .iter()
            .filter_map(|event| match event {
                MockEvent::Execute { query, .. } => Some(query.clone()),
                _ => None,
            })
            .collect()
    }

    fn lock_events(&self) -> MutexGuard<'_, Vec<MockEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, event: MockEvent) {
        self.lock_events().push(event);
    }
}

impl Default for MockDatabaseClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn open(&mut self) -> Result<()> {
        if self.state == ConnectionState::Open {
            return Ok(());
        }
        if let Some(message) = &self.open_error {
            return Err(SmartLineError::connection(message.clone()));
        }
        self.state = ConnectionState::Open;
        self.record(MockEvent::Open);
        Ok(())
    }

    async fn execute(&mut self, query: &str, params: &[Value]) -> Result<ExecOutcome> {
        if self.state != ConnectionState::Open {
            self.open().await?;
        }
        self.record(MockEvent::Execute {
            query: query.to_string(),
            params: params.to_vec(),
        });
        (self.handler)(query, params)
    }

    async fn close(&mut self) {
        if self.state == ConnectionState::Open {
            self.state = ConnectionState::Closed;
            self.record(MockEvent::Close);
        }
    }

    fn state(&self) -> ConnectionState {
        self.state
    }
}

impl Connector for MockDatabaseClient {
    fn client(&self) -> Box<dyn DatabaseClient> {
        let mut fresh = self.clone();
        fresh.state = ConnectionState::Unopened;
        Box::new(fresh)
    }
}
