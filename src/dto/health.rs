use serde::Serialize;
use utoipa::ToSchema;

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Backend holding room records ("memory" or "redis").
    pub store: String,
}

impl HealthResponse {
    /// The store answered its health probe.
    pub fn ok(store: &str) -> Self {
        Self {
            status: "ok".to_string(),
            store: store.to_string(),
        }
    }

    /// The store could not be reached; request paths touching it will fail.
    pub fn degraded(store: &str) -> Self {
        Self {
            status: "degraded".to_string(),
            store: store.to_string(),
        }
    }
}
