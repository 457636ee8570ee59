//! Core orchestrator for smart-line.
//!
//! Runs one dialogue from start to end: authenticate, collect a request and a
//! destination, plan, synthesize, execute, render. There are no retries
//! between steps, and every query-stage failure ends in the same message.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::auth::{AuthOutcome, Authenticator, Credentials, User};
use crate::config::LlmConfig;
use crate::console::{Console, Destination};
use crate::db::{Connector, ExecOutcome, QueryResult};
use crate::error::Result;
use crate::llm::{or_empty, strip_fence, LlmClient, Planner, Synthesizer};
use crate::output::{render_console, write_csv};

/// Shown when authentication did not produce a user.
pub const CHECK_YOUR_DATA: &str = "Check your data";

/// Shown when the query stage produced nothing to render.
pub const NOTHING_FOUND: &str = "Nothing found";

/// How a dialogue ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No active user matched, or the lookup failed.
    AuthenticationFailed,
    /// The query stage produced nothing (or failed).
    NothingFound,
    /// Rows were printed to the console.
    Printed { rows: usize },
    /// Rows were written to a CSV file.
    Written { path: PathBuf, rows: usize },
    /// A write statement changed this many rows.
    Affected(u64),
}

/// Coordinates the authenticator, the two remote calls and the adapter.
pub struct Orchestrator {
    connector: Box<dyn Connector>,
    planner: Planner,
    synthesizer: Synthesizer,
}

impl Orchestrator {
    pub fn new(connector: Box<dyn Connector>, llm: Arc<dyn LlmClient>, config: &LlmConfig) -> Self {
        Self {
            connector,
            planner: Planner::new(Arc::clone(&llm), config.planner.clone()),
            synthesizer: Synthesizer::new(llm, config.synthesizer.clone()),
        }
    }

    /// Runs one dialogue. Errors are returned only when the console itself fails.
    pub async fn run<R: BufRead, W: Write>(
        &self,
        console: &mut Console<R, W>,
    ) -> Result<RunOutcome> {
        let credentials = console.read_credentials()?;

        let Some(user) = self.authenticate(&credentials).await else {
            console.say(CHECK_YOUR_DATA)?;
            return Ok(RunOutcome::AuthenticationFailed);
        };

        console.say(&format!("Welcome, {} {}!", user.first_name(), user.last_name()))?;
        let request = console.read_request(&user)?;
        let destination = console.read_destination()?;

        let outcome = match self.query(&request, &user).await {
            Some(ExecOutcome::Rows(rows)) if !rows.is_empty() => {
                self.deliver(console, &destination, &rows)?
            }
            Some(ExecOutcome::Affected(n)) if n > 0 => {
                console.say(&format!("{n} row(s) affected"))?;
                RunOutcome::Affected(n)
            }
            _ => RunOutcome::NothingFound,
        };

        if outcome == RunOutcome::NothingFound {
            console.say(NOTHING_FOUND)?;
        }
        Ok(outcome)
    }

    async fn authenticate(&self, credentials: &Credentials) -> Option<User> {
        let mut authenticator = Authenticator::new(self.connector.client());
        match authenticator.authenticate(credentials).await {
            Ok(AuthOutcome::Found(user)) => Some(user),
            Ok(AuthOutcome::NotFound) => None,
            Err(e) => {
                error!("Authentication could not be performed: {}: {e}", e.category());
                None
            }
        }
    }

    /// Plan, synthesize, strip, execute. `None` when any step came back empty or failed.
    async fn query(&self, request: &str, user: &User) -> Option<ExecOutcome> {
        let plan = or_empty(self.planner.plan(request, user).await);
        let reply = or_empty(self.synthesizer.synthesize(request, &plan, user).await);

        let sql = strip_fence(&reply);
        if sql.trim().is_empty() {
            warn!("No statement left after stripping the fence");
            return None;
        }
        info!("Executing:\n{sql}");

        let mut db = self.connector.client();
        let result = db.execute(&sql, &[]).await;
        db.close().await;

        match result {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!("{}: {e}", e.category());
                None
            }
        }
    }

    fn deliver<R: BufRead, W: Write>(
        &self,
        console: &mut Console<R, W>,
        destination: &Destination,
        rows: &QueryResult,
    ) -> Result<RunOutcome> {
        match destination {
            Destination::Console => {
                render_console(console.writer(), rows)?;
                Ok(RunOutcome::Printed { rows: rows.len() })
            }
            Destination::Csv(path) => match write_csv(path, rows) {
                Ok(()) => {
                    info!(path = %path.display(), rows = rows.len(), "Results written");
                    console.say(&format!("Saved {} row(s) to {}", rows.len(), path.display()))?;
                    Ok(RunOutcome::Written {
                        path: path.clone(),
                        rows: rows.len(),
                    })
                }
                Err(e) => {
                    error!("{}: {e}", e.category());
                    Ok(RunOutcome::NothingFound)
                }
            },
        }
    }
}
