use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Ping the store and report degraded mode alongside the number of connected streams.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.game_store().await {
        Some(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
            }
        }
        None => warn!("no storage installed (degraded mode)"),
    }

    HealthResponse::new(state.is_degraded().await, state.hub().client_count())
}
