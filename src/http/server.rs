//! HTTP server boundary.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::{middleware, Router};
use serde_json::json;
use tracing::{error, info};

use super::gate::{admission_gate, GateState};
use crate::config::FloodgateConfig;
use crate::error::{FloodgateError, Result};
use crate::ratelimit::ClientRegistry;

/// Context available to route handlers.
struct ServerContext {
    /// Deployment environment name
    environment: String,
}

/// HTTP server fronting the admission gate.
pub struct HttpServer {
    /// Address to bind to
    addr: SocketAddr,
    /// Fully assembled router
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server over a shared client registry.
    pub fn new(config: &FloodgateConfig, registry: Arc<ClientRegistry>) -> Self {
        Self {
            addr: config.server.listen_addr,
            router: build_router(config, registry),
        }
    }

    /// Start the HTTP server with graceful shutdown.
    ///
    /// The server runs until the provided signal resolves.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;

        info!(addr = %self.addr, "Starting HTTP server");

        axum::serve(
            listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(signal)
        .await
        .map_err(|e| {
            error!(error = %e, "HTTP server failed");
            FloodgateError::Io(e)
        })
    }
}

/// Assemble the router: routes plus the admission gate layered in front.
fn build_router(config: &FloodgateConfig, registry: Arc<ClientRegistry>) -> Router {
    let context = Arc::new(ServerContext {
        environment: config.server.environment.clone(),
    });
    let gate_state = GateState::new(registry, config.rate_limiting.enabled);

    Router::new()
        .route("/v1/healthcheck", get(health_check))
        .layer(middleware::from_fn_with_state(gate_state, admission_gate))
        .with_state(context)
}

/// Report service availability and build information.
async fn health_check(State(context): State<Arc<ServerContext>>) -> impl IntoResponse {
    Json(json!({
        "status": "available",
        "system_info": {
            "environment": context.environment,
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }
    }))
}
