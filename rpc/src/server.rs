//! Axum-based RPC server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use ballot_ledger::Ledger;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::handlers;
use crate::{RpcError, RpcMetrics};

/// Shared state of every handler.
pub struct RpcState {
    pub ledger: Arc<Ledger>,
    pub metrics: Arc<RpcMetrics>,
    pub started: Instant,
}

impl RpcState {
    pub fn new(ledger: Arc<Ledger>, metrics: Arc<RpcMetrics>) -> Self {
        Self {
            ledger,
            metrics,
            started: Instant::now(),
        }
    }
}

/// Build the API router.
pub fn router(state: Arc<RpcState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route(
            "/sessions",
            get(handlers::list_sessions).post(handlers::create_session),
        )
        .route("/sessions/:id", get(handlers::get_session))
        .route("/sessions/:id/voters", post(handlers::register_voter))
        .route("/sessions/:id/voters/:address", get(handlers::get_voter))
        .route("/sessions/:id/advance", post(handlers::advance))
        .route(
            "/sessions/:id/proposals",
            get(handlers::list_proposals).post(handlers::register_proposal),
        )
        .route("/sessions/:id/proposals/:pid", get(handlers::get_proposal))
        .route("/sessions/:id/votes", post(handlers::vote))
        .route("/sessions/:id/votes/:address", get(handlers::get_vote))
        .route("/sessions/:id/result", get(handlers::get_result))
        .route("/sessions/:id/capabilities", get(handlers::get_capabilities))
        .route("/events", get(handlers::list_events))
        .route("/info", get(handlers::info))
        .route("/metrics", get(handlers::metrics))
        .layer(cors)
        .with_state(state)
}

pub struct RpcServer {
    pub addr: SocketAddr,
    pub state: Arc<RpcState>,
}

impl RpcServer {
    pub fn new(addr: SocketAddr, state: Arc<RpcState>) -> Self {
        Self { addr, state }
    }

    /// Serve until `shutdown` resolves.
    pub async fn start<F>(self, shutdown: F) -> Result<(), RpcError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = router(Arc::clone(&self.state));
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| RpcError::Server(format!("bind {}: {e}", self.addr)))?;
        info!("RPC server listening on {}", self.addr);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| RpcError::Server(e.to_string()))
    }
}
