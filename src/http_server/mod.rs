//! # Notekeeper HTTP Server Module
//!
//! Local HTTP interface over the note store and the backup collections.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/`, `/scopes`, `/view/:title`, `/create`, `/edit`, `/delete/:title`,
//!   `/delete-all`, `/search` - Note CRUD
//! - `/backup-count` - Archive count of a scope

pub mod backup_routes;
pub mod config;
pub mod note_routes;
pub mod observability_routes;
pub mod server;

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};

pub use config::HttpServerConfig;
pub use server::HttpServer;

/// JSON error body shared by all routes
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

/// Error half of every fallible handler
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: status.as_u16(),
        }),
    )
}

/// Empty or blank scope parameters mean the global store
pub(crate) fn scope_param(scope: &Option<String>) -> Option<String> {
    scope
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
