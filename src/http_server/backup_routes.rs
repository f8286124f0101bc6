//! Backup HTTP Routes
//!
//! Read-only view of the archive collections.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::backup::{BackupError, BackupErrorCode, BackupOrchestrator};

use super::{api_error, scope_param, ApiError};

/// Backup state shared across handlers
pub struct BackupState {
    pub orchestrator: Arc<BackupOrchestrator>,
}

impl BackupState {
    pub fn new(orchestrator: Arc<BackupOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

#[derive(Debug, Deserialize)]
pub struct CountQuery {
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: usize,
}

/// Create backup routes
pub fn backup_routes(state: Arc<BackupState>) -> Router {
    Router::new()
        .route("/backup-count", get(backup_count_handler))
        .with_state(state)
}

fn backup_error(e: BackupError) -> ApiError {
    let status = match e.code() {
        BackupErrorCode::BackupInvalidScope => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, e.to_string())
}

/// `{"count": n}` for the global collection, or for `?scope=<s>`
async fn backup_count_handler(
    State(state): State<Arc<BackupState>>,
    Query(query): Query<CountQuery>,
) -> Result<Json<CountResponse>, ApiError> {
    let scope = scope_param(&query.scope);
    let orchestrator = state.orchestrator.clone();

    let count = tokio::task::spawn_blocking(move || orchestrator.archive_count(scope.as_deref()))
        .await
        .map_err(|e| {
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Count task failed: {}", e),
            )
        })?
        .map_err(backup_error)?;

    Ok(Json(CountResponse { count }))
}
