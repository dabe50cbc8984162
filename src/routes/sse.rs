use std::convert::Infallible;

use axum::{
    Router,
    extract::{Query, State},
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;

use crate::{
    dto::sse::SubscribeQuery,
    error::AppError,
    services::sse_service,
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/sse",
    tag = "sse",
    params(SubscribeQuery),
    responses(
        (status = 200, description = "Event stream for the declared role", content_type = "text/event-stream", body = String),
        (status = 400, description = "Unknown role", body = crate::error::ErrorBody)
    )
)]
/// Subscribe to game and voting events as `admin`, `player` or `voter`.
pub async fn stream(
    State(state): State<SharedState>,
    Query(query): Query<SubscribeQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    Ok(sse_service::subscribe(&state, query)?)
}

/// Configure the SSE endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse", get(stream))
}
