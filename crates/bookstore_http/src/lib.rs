//! HTTP surface for the bookstore catalog.
//!
//! # Responsibility
//! - Bind the REST routes under `/api` onto the core services.
//! - Run each request as one storage transaction.
//! - Emit alert/error headers alongside JSON bodies.
//!
//! # Invariants
//! - Handlers never hold the connection across an `.await`.
//! - Validation failures map to 4xx, storage failures to 500.

mod alert;
mod error;
pub mod router;
pub mod server;

pub use error::{ApiError, ServerError};
pub use router::{build_router, AppState};
pub use server::HttpServer;
