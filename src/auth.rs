//! User authentication against the `users` table.
//!
//! A user is identified by an exact match on first name, last name, email and
//! username, and must be active. The match is done by the store; nothing is
//! normalized here.

use crate::db::{DatabaseClient, ExecOutcome, QueryResult, Value};
use crate::error::{Result, SmartLineError};
use std::fmt;
use tracing::info;

/// Lookup for the four identity fields of an active user.
pub const AUTH_QUERY: &str = "SELECT * FROM users \
     WHERE first_name = $1 AND last_name = $2 AND email = $3 AND username = $4 \
     AND is_active = TRUE";

/// Identity fields supplied by the person at the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
}

impl Credentials {
    /// Creates credentials from the four identity fields.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            username: username.into(),
        }
    }

    fn params(&self) -> [Value; 4] {
        [
            Value::from(self.first_name.as_str()),
            Value::from(self.last_name.as_str()),
            Value::from(self.email.as_str()),
            Value::from(self.username.as_str()),
        ]
    }
}

/// An authenticated user. Never re-checked against the store once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    first_name: String,
    last_name: String,
    username: String,
    email: String,
    is_active: bool,
}

impl User {
    /// Builds a user from one row of a `users` result.
    ///
    /// `is_active` defaults to true when the column is absent or NULL.
    pub fn from_row(result: &QueryResult, row: usize) -> Result<Self> {
        let text = |column: &str| -> Result<String> {
            match result.get(row, column) {
                Some(Value::String(s)) => Ok(s.clone()),
                Some(other) => Ok(other.to_display_string()),
                None => Err(SmartLineError::query(format!(
                    "users row is missing column '{column}'"
                ))),
            }
        };

        Ok(Self {
            first_name: text("first_name")?,
            last_name: text("last_name")?,
            username: text("username")?,
            email: text("email")?,
            is_active: result
                .get(row, "is_active")
                .and_then(Value::as_bool)
                .unwrap_or(true),
        })
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.first_name, self.last_name)?;
        writeln!(f, "username: {}", self.username)?;
        writeln!(f, "email: {}", self.email)
    }
}

/// Result of a lookup that could be performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Exactly the first matching row.
    Found(User),
    /// No active user matches all four fields.
    NotFound,
}

/// Looks users up through a connection adapter.
pub struct Authenticator {
    db: Box<dyn DatabaseClient>,
}

impl Authenticator {
    /// Creates an authenticator that owns the given adapter.
    pub fn new(db: Box<dyn DatabaseClient>) -> Self {
        Self { db }
    }

    /// Runs the lookup once.
    ///
    /// `Ok(NotFound)` means the store answered with no rows; `Err` means the
    /// lookup itself failed (connection or query error). When several rows
    /// match, the first one the store returns wins. The adapter is closed
    /// before returning in every case.
    pub async fn authenticate(&mut self, credentials: &Credentials) -> Result<AuthOutcome> {
        let result = self.lookup(credentials).await;
        self.db.close().await;
        result
    }

    async fn lookup(&mut self, credentials: &Credentials) -> Result<AuthOutcome> {
        self.db.open().await?;

        let rows = match self.db.execute(AUTH_QUERY, &credentials.params()).await? {
            ExecOutcome::Rows(rows) => rows,
            ExecOutcome::Affected(_) => {
                return Err(SmartLineError::internal(
                    "user lookup returned an affected-row count",
                ))
            }
        };

        if rows.is_empty() {
            info!(
                username = %credentials.username,
                "User not found: {} {}", credentials.first_name, credentials.last_name
            );
            return Ok(AuthOutcome::NotFound);
        }

        let user = User::from_row(&rows, 0)?;
        info!(
            username = %user.username,
            "User found: {} {}", user.first_name, user.last_name
        );
        Ok(AuthOutcome::Found(user))
    }
}
