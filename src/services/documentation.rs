use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the Millionaire backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::stream,
        crate::routes::public::public_state,
        crate::routes::admin::admin_state,
        crate::routes::admin::start_game,
        crate::routes::admin::select_answer,
        crate::routes::admin::submit_answer,
        crate::routes::admin::next_question,
        crate::routes::admin::previous_question,
        crate::routes::admin::use_lifeline,
        crate::routes::admin::stop_game,
        crate::routes::admin::close_game,
        crate::routes::admin::update_game_time,
        crate::routes::admin::list_sessions,
        crate::routes::admin::clear_all_sessions,
        crate::routes::admin::start_voting,
        crate::routes::admin::end_voting,
        crate::routes::admin::clear_voting,
        crate::routes::questions::list_questions,
        crate::routes::questions::get_question,
        crate::routes::questions::create_question,
        crate::routes::questions::update_question,
        crate::routes::questions::delete_question,
        crate::routes::questions::delete_questions,
        crate::routes::questions::delete_all_questions,
        crate::routes::voting::submit_vote,
        crate::routes::voting::current_voting,
        crate::routes::voting::voting_stats,
        crate::routes::voting::my_vote,
    ),
    components(
        schemas(
            crate::error::ErrorBody,
            crate::error::ErrorKind,
            crate::dto::sse::ConnectionEstablishedEvent,
            crate::dto::sse::QuestionChangedEvent,
            crate::dto::sse::AnswerSelectedEvent,
            crate::dto::sse::AnswerRevealedEvent,
            crate::dto::sse::LifelineUsedEvent,
            crate::dto::sse::VotingStartedEvent,
            crate::dto::sse::VotingEndedEvent,
            crate::dto::sse::GameEndedEvent,
            crate::state::ClientRole,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent event stream"),
        (name = "admin", description = "Host console game controls"),
        (name = "questions", description = "Question bank maintenance"),
        (name = "public", description = "Reconciliation snapshots for screens"),
        (name = "voting", description = "Ask-the-audience poll"),
    )
)]
pub struct ApiDoc;
