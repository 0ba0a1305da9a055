//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the entity store contract shared by all catalog records.
//! - Isolate SQLite query details from service orchestration.
//! - Own the store/book association through a single writer.
//!
//! # Invariants
//! - `save` assigns ids only when absent and upserts otherwise.
//! - `delete_by_id` is idempotent and detaches relations before removal.
//! - Multi-statement writes run inside one savepoint.

use crate::db::DbError;
use crate::model::{Entity, EntityId, EntityKind};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod author_repo;
pub mod book_repo;
pub mod publisher_repo;
pub mod store_books;
pub mod store_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for entity persistence and relation operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Target of a relation operation does not exist.
    NotFound { kind: EntityKind, id: EntityId },
    /// A written record points at a related record that does not exist.
    UnknownReference { kind: EntityKind, id: EntityId },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::UnknownReference { kind, id } => {
                write!(f, "referenced {kind} does not exist: {id}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound { .. } | Self::UnknownReference { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Entity store contract implemented once per entity type.
pub trait EntityRepository {
    type Entity: Entity;

    /// Inserts when `entity.id` is absent, otherwise overwrites that id.
    /// Returns the persisted record read back from storage.
    fn save(&self, entity: &Self::Entity) -> RepoResult<Self::Entity>;
    /// Loads one record with relation sets populated.
    fn find_by_id(&self, id: EntityId) -> RepoResult<Option<Self::Entity>>;
    fn exists_by_id(&self, id: EntityId) -> RepoResult<bool>;
    /// Lists all records by ascending id. `eager` populates relation sets.
    fn find_all(&self, eager: bool) -> RepoResult<Vec<Self::Entity>>;
    /// Removes one record. Missing ids are a no-op.
    fn delete_by_id(&self, id: EntityId) -> RepoResult<()>;
}

/// Binds an entity type to its SQLite repository.
///
/// Lets generic callers (HTTP handlers, tests) build the right repository
/// from a connection or an open transaction.
pub trait SqliteBacked: Entity + Sized {
    type Repo<'conn>: EntityRepository<Entity = Self>;

    fn repository(conn: &Connection) -> Self::Repo<'_>;
}

pub(crate) fn row_exists(conn: &Connection, kind: EntityKind, id: EntityId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1);", kind.name()),
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Fails with `UnknownReference` when the referenced row is missing.
pub(crate) fn ensure_referenced(
    conn: &Connection,
    kind: EntityKind,
    id: EntityId,
) -> RepoResult<()> {
    if row_exists(conn, kind, id)? {
        Ok(())
    } else {
        Err(RepoError::UnknownReference { kind, id })
    }
}

/// Fails with `NotFound` when the target row is missing.
pub(crate) fn ensure_exists(conn: &Connection, kind: EntityKind, id: EntityId) -> RepoResult<()> {
    if row_exists(conn, kind, id)? {
        Ok(())
    } else {
        Err(RepoError::NotFound { kind, id })
    }
}

/// Reads back a just-written row, treating absence as corrupted state.
pub(crate) fn read_back<E>(found: Option<E>, kind: EntityKind, id: EntityId) -> RepoResult<E> {
    found.ok_or_else(|| RepoError::InvalidData(format!("{kind} {id} missing after save")))
}
