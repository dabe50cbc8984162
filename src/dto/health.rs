use serde::Serialize;
use utoipa::ToSchema;

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: &'static str,
    /// Streaming clients currently registered on the hub.
    pub connected_clients: usize,
}

impl HealthResponse {
    /// Report `ok`, or `degraded` while storage is unavailable.
    pub fn new(degraded: bool, connected_clients: usize) -> Self {
        Self {
            status: if degraded { "degraded" } else { "ok" },
            connected_clients,
        }
    }
}
