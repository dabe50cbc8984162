//! Follow a running game from the terminal as one of the three roles.
//!
//! `BASE_URL` (default `http://localhost:8080`), `ROLE` (`admin`, `player`
//! or `voter`) and, for voters, `VOTER_ID` select what is followed.

use std::env;

use anyhow::{Context, bail};
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use millionaire_back::{
    client::{
        AdminProjection, HttpClient, PlayerProjection, Projection, SyncConfig, SyncDriver,
        VoterProjection, answer::slot_states,
    },
    state::ClientRole,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let base_url = env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:8080".into());
    let role: ClientRole = env::var("ROLE")
        .unwrap_or_else(|_| "player".into())
        .parse()
        .context("parsing ROLE")?;
    let client_id = format!("{role}-watch-{}", std::process::id());
    let client = HttpClient::new(&base_url, role, client_id).context("building HTTP client")?;

    match role {
        ClientRole::Admin => watch_as(AdminProjection::default(), client).await,
        ClientRole::Player => watch_as(PlayerProjection::default(), client).await,
        ClientRole::Voter => {
            let Ok(voter_id) = env::var("VOTER_ID") else {
                bail!("VOTER_ID is required for the voter role");
            };
            let client = client.with_voter(voter_id.clone());
            watch_as(VoterProjection::new(voter_id), client).await
        }
    }
}

async fn watch_as<P: Projection>(projection: P, client: HttpClient) -> anyhow::Result<()> {
    let driver = SyncDriver::new(projection, client.clone(), client, SyncConfig::default());
    let updates = driver.subscribe();
    let printer = tokio::spawn(print_updates(updates));

    driver
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;
    printer.abort();
    Ok(())
}

async fn print_updates<P: Projection>(mut updates: watch::Receiver<P>) {
    while updates.changed().await.is_ok() {
        let projection = updates.borrow_and_update().clone();
        let view = projection.view();
        let slots = slot_states(view.answer_phase(), view.question.as_ref());
        info!(
            connected = view.connected,
            degraded = view.degraded,
            question = view.session.as_ref().map(|s| s.current_question_index + 1),
            phase = ?view.answer_phase(),
            ?slots,
            countdown = view.question_countdown.remaining(),
            vote_countdown = view.vote_countdown.remaining(),
            "state"
        );
    }
}
