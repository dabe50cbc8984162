/// Admin game transitions.
pub mod admin_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Question sampling and lookups shared by the other services.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Reconciliation snapshots for the pull endpoints.
pub mod public_service;
/// Question bank maintenance.
pub mod question_service;
/// Typed game event broadcasts.
pub mod sse_events;
/// Streaming client subscription.
pub mod sse_service;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
/// Audience vote operations.
pub mod voting_service;
