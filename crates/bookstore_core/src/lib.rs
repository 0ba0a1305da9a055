//! Core domain logic for the bookstore catalog.
//! This crate owns the entity records, their SQLite persistence and the
//! store/book association invariant.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{AppConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, run_in_transaction, DbError};
pub use logging::{default_log_level, init_logging, init_stderr_logging, logging_status};
pub use model::author::Author;
pub use model::book::Book;
pub use model::publisher::Publisher;
pub use model::store::Store;
pub use model::{Entity, EntityId, EntityKind, EntityRef};
pub use repo::author_repo::SqliteAuthorRepository;
pub use repo::book_repo::SqliteBookRepository;
pub use repo::publisher_repo::SqlitePublisherRepository;
pub use repo::store_books::{
    plan_replacement, LinkDiff, LinkIndex, SqliteStoreBookLinks, StoreBookLinks,
};
pub use repo::store_repo::SqliteStoreRepository;
pub use repo::{EntityRepository, RepoError, RepoResult, SqliteBacked};
pub use service::entity_service::EntityService;
pub use service::store_book_service::StoreBookService;
pub use service::{ServiceError, ServiceResult};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
