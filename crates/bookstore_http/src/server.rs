//! HTTP server that binds the API router to a TCP socket.

use log::info;
use tokio::net::TcpListener;

use crate::error::ServerError;
use crate::router::{build_router, AppState};

/// Axum-based HTTP server for the bookstore API.
pub struct HttpServer {
    pub(crate) addr: String,
    pub(crate) state: AppState,
}

impl HttpServer {
    /// Creates a server listening on `addr` (`host:port`).
    pub fn new(addr: impl Into<String>, state: AppState) -> Self {
        Self {
            addr: addr.into(),
            state,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Starts the server and blocks until it exits.
    ///
    /// # Errors
    /// Returns an error if the TCP bind fails or the server crashes.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(&self.addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: self.addr.clone(),
                source,
            })?;

        info!(
            "event=http_start module=http status=ok addr={} app={}",
            self.addr,
            self.state.application_name()
        );

        let router = build_router(self.state);
        axum::serve(listener, router)
            .await
            .map_err(ServerError::Serve)?;

        info!("event=http_stop module=http status=ok");
        Ok(())
    }
}
