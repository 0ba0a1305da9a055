//! Request handling services.
//!
//! # Responsibility
//! - Enforce identifier rules before any write reaches storage.
//! - Translate repository failures into typed, caller-facing errors.
//! - Keep HTTP and CLI layers decoupled from storage details.
//!
//! # Invariants
//! - Validation failures never touch storage state.
//! - Storage failures are reported as `ServiceError::Storage`, never as a
//!   validation kind.

use crate::model::{EntityId, EntityKind};
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod entity_service;
pub mod store_book_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Typed failure of one request-level operation.
#[derive(Debug)]
pub enum ServiceError {
    /// Create called with an id already set.
    IdAlreadyPresent { kind: EntityKind },
    /// Update called without an id in the payload.
    IdMissing { kind: EntityKind },
    /// Path id and payload id differ.
    IdMismatch {
        kind: EntityKind,
        path_id: EntityId,
        body_id: EntityId,
    },
    /// Operation targets a missing record.
    NotFound { kind: EntityKind, id: EntityId },
    /// Payload references a related record that does not exist.
    UnknownReference { kind: EntityKind, id: EntityId },
    /// Opaque storage failure.
    Storage(RepoError),
}

impl ServiceError {
    /// Machine-readable error key.
    pub fn error_key(&self) -> &'static str {
        match self {
            Self::IdAlreadyPresent { .. } => "idexists",
            Self::IdMissing { .. } => "idnull",
            Self::IdMismatch { .. } => "idinvalid",
            Self::NotFound { .. } => "idnotfound",
            Self::UnknownReference { .. } => "badreference",
            Self::Storage(_) => "internal",
        }
    }

    /// Entity type the failure is about, if it is a validation failure.
    pub fn entity_kind(&self) -> Option<EntityKind> {
        match self {
            Self::IdAlreadyPresent { kind }
            | Self::IdMissing { kind }
            | Self::IdMismatch { kind, .. }
            | Self::NotFound { kind, .. }
            | Self::UnknownReference { kind, .. } => Some(*kind),
            Self::Storage(_) => None,
        }
    }

    /// Whether the caller sent something invalid (as opposed to a storage failure).
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IdAlreadyPresent { kind } => {
                write!(f, "a new {kind} cannot already have an ID")
            }
            Self::IdMissing { kind } => write!(f, "invalid id: {kind} payload has no ID"),
            Self::IdMismatch {
                kind,
                path_id,
                body_id,
            } => write!(
                f,
                "invalid ID: path id {path_id} does not match {kind} id {body_id}"
            ),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::UnknownReference { kind, id } => {
                write!(f, "referenced {kind} does not exist: {id}")
            }
            Self::Storage(err) => write!(f, "storage failure: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { kind, id } => Self::NotFound { kind, id },
            RepoError::UnknownReference { kind, id } => Self::UnknownReference { kind, id },
            other => Self::Storage(other),
        }
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::ServiceError;
    use crate::model::EntityKind;
    use crate::repo::RepoError;

    #[test]
    fn repo_not_found_maps_to_validation_kind() {
        let err = ServiceError::from(RepoError::NotFound {
            kind: EntityKind::Book,
            id: 4,
        });
        assert_eq!(err.error_key(), "idnotfound");
        assert_eq!(err.entity_kind(), Some(EntityKind::Book));
        assert!(err.is_validation());
    }

    #[test]
    fn invalid_data_maps_to_storage() {
        let err = ServiceError::from(RepoError::InvalidData("broken".to_string()));
        assert!(!err.is_validation());
        assert_eq!(err.error_key(), "internal");
        assert!(err.to_string().contains("broken"));
    }
}
