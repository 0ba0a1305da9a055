//! SQLite storage bootstrap, schema migrations and unit-of-work helpers.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the catalog.
//! - Apply schema migrations in deterministic order.
//! - Provide the transaction boundary used by one request.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write catalog data before migrations succeed.
//! - Multi-statement writes either apply fully or not at all.

use rusqlite::{Connection, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Runs `work` inside one `IMMEDIATE` transaction.
///
/// Commits when `work` returns `Ok`, rolls back when it returns `Err`.
/// The write lock is taken up front so readers on other connections never
/// see a half-applied change.
pub fn run_in_transaction<T, E, F>(conn: &mut Connection, work: F) -> Result<T, E>
where
    E: From<rusqlite::Error>,
    F: FnOnce(&Connection) -> Result<T, E>,
{
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let value = work(&tx)?;
    tx.commit()?;
    Ok(value)
}

/// Runs `work` inside a named savepoint on a shared connection.
///
/// Works both at top level (acts as its own transaction) and nested inside
/// an outer transaction opened by [`run_in_transaction`].
pub(crate) fn with_savepoint<T, E, F>(conn: &Connection, name: &str, work: F) -> Result<T, E>
where
    E: From<rusqlite::Error>,
    F: FnOnce() -> Result<T, E>,
{
    conn.execute_batch(&format!("SAVEPOINT {name};"))?;
    match work() {
        Ok(value) => {
            conn.execute_batch(&format!("RELEASE SAVEPOINT {name};"))?;
            Ok(value)
        }
        Err(err) => {
            // Rollback failure is secondary to the original error.
            let _ = conn.execute_batch(&format!(
                "ROLLBACK TO SAVEPOINT {name}; RELEASE SAVEPOINT {name};"
            ));
            Err(err)
        }
    }
}
