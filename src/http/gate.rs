//! Admission gate: the request-facing rate limiting middleware.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tokio::time::Instant;
use tracing::{debug, error};

use super::responses;
use crate::error::FloodgateError;
use crate::ratelimit::ClientRegistry;

/// State shared by every invocation of the admission gate.
#[derive(Clone)]
pub struct GateState {
    /// Registry shared with the reclaimer
    pub registry: Arc<ClientRegistry>,
    /// Master on/off switch; when false the gate forwards unconditionally
    pub enabled: bool,
}

impl GateState {
    /// Create gate state over a shared registry.
    pub fn new(registry: Arc<ClientRegistry>, enabled: bool) -> Self {
        Self { registry, enabled }
    }
}

/// Rate limiting middleware wrapping the request-serving path.
///
/// Runs inline on the request's own task. Resolves the client identity from
/// the connection's peer address, consults the registry, and either forwards
/// the request or short-circuits it with a 429 rejection. A rejection is
/// normal control flow, not a fault, and is never logged as an error.
pub async fn admission_gate(
    State(state): State<GateState>,
    request: Request,
    next: Next,
) -> Response {
    if !state.enabled {
        return next.run(request).await;
    }

    let client_id = match client_identity(&request) {
        Ok(id) => id,
        Err(e) => {
            error!(error = %e, "Failed to resolve client identity");
            return responses::server_error();
        }
    };

    if state.registry.admit(&client_id, Instant::now()) {
        next.run(request).await
    } else {
        debug!(client = %client_id, "Rate limit exceeded");
        responses::rate_limit_exceeded()
    }
}

/// Derive the client identity from the request's peer address.
///
/// Requests served over a real connection carry a [`ConnectInfo`] extension;
/// its absence means the source address cannot be determined and the request
/// must not be forwarded.
fn client_identity(request: &Request) -> Result<String, FloodgateError> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .ok_or_else(|| {
            FloodgateError::ClientIdentity("request has no peer address".to_string())
        })
}
