//! Service health reporting backed by a room store probe.

use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Probe the room store and report whether requests can be served.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let backend = state.store_backend();
    match state.store().health_check().await {
        Ok(()) => HealthResponse::ok(backend),
        Err(err) => {
            warn!(error = %err, store = backend, "storage health check failed");
            HealthResponse::degraded(backend)
        }
    }
}
