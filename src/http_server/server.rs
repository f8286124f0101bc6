//! # HTTP Server
//!
//! Main HTTP server combining all endpoint routers.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::backup::BackupOrchestrator;
use crate::config::AppConfig;
use crate::notes::NoteStore;
use crate::observability::{log_event_with_fields, Event};

use super::backup_routes::{backup_routes, BackupState};
use super::config::HttpServerConfig;
use super::note_routes::{note_routes, NotesState};
use super::observability_routes::health_routes;

/// HTTP Server for the note store
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    /// Server whose note store backs up through a system-clock orchestrator
    pub fn new(config: Arc<AppConfig>) -> Self {
        let orchestrator = Arc::new(BackupOrchestrator::new(config.clone()));
        Self::with_orchestrator(config, orchestrator)
    }

    /// Server using a caller-supplied orchestrator
    pub fn with_orchestrator(config: Arc<AppConfig>, orchestrator: Arc<BackupOrchestrator>) -> Self {
        let router = Self::build_router(&config, orchestrator);
        Self {
            config: config.server.clone(),
            router,
        }
    }

    /// Build the combined router with all endpoints
    fn build_router(config: &AppConfig, orchestrator: Arc<BackupOrchestrator>) -> Router {
        let store = NoteStore::new(config.data_root.clone(), orchestrator.clone());
        let notes_state = Arc::new(NotesState::new(store));
        let backup_state = Arc::new(BackupState::new(orchestrator));

        let cors = if config.server.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<HeaderValue> = config
                .server
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .merge(health_routes())
            .merge(note_routes(notes_state))
            .merge(backup_routes(backup_state))
            .layer(cors)
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Start the HTTP server (async)
    pub async fn start(self) -> Result<(), io::Error> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid socket address {}: {}", self.config.socket_addr(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        log_event_with_fields(Event::ServerStart, &[("addr", &addr.to_string())]);

        axum::serve(listener, self.router).await?;

        Ok(())
    }
}
