use axum::Router;

use crate::state::SharedState;

pub mod admin;
pub mod docs;
pub mod health;
pub mod public;
pub mod questions;
pub mod sse;
pub mod voting;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(admin::router())
        .merge(questions::router())
        .merge(public::router())
        .merge(voting::router());

    api_router.merge(docs::router()).with_state(state)
}
