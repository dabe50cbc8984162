use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::public::GameStateResponse,
    error::AppError,
    services::public_service::{self, SnapshotAudience},
    state::SharedState,
};

/// Read-only state for the player and voter screens.
pub fn router() -> Router<SharedState> {
    Router::new().route("/public/state", get(public_state))
}

#[utoipa::path(
    get,
    path = "/public/state",
    tag = "public",
    responses((status = 200, description = "Game state without the correct answer until it is revealed", body = GameStateResponse))
)]
/// Return the authoritative state screens reconcile against.
pub async fn public_state(
    State(state): State<SharedState>,
) -> Result<Json<GameStateResponse>, AppError> {
    let payload = public_service::game_state(&state, SnapshotAudience::Public).await?;
    Ok(Json(payload))
}
