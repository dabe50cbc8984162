//! Keeps a storage backend installed in [`AppState`](crate::state::AppState)
//! and flips degraded mode while it is unreachable.

use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::{
    dao::{game_store::GameStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_secs(1);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Connect with exponential back-off, install the store, then watch it.
///
/// When the store cannot be revived in place, a fresh connection is opened
/// through `connect`. Runs until the process exits.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn GameStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(store) => {
                state.set_game_store(store.clone()).await;
                info!("storage connected; game operations enabled");
                delay = INITIAL_DELAY;
                watch_store(&state, store.as_ref()).await;
                error!("storage lost; opening a new connection");
            }
            Err(err) => warn!(error = %err, ?delay, "storage connection attempt failed"),
        }

        sleep(delay).await;
        delay = next_delay(delay);
    }
}

/// Poll `store` until it fails and cannot be reconnected.
async fn watch_store(state: &SharedState, store: &dyn GameStore) {
    loop {
        if store.health_check().await.is_ok() {
            if state.is_degraded().await {
                info!("storage healthy again; leaving degraded mode");
                state.update_degraded(false).await;
            }
            sleep(HEALTH_POLL_INTERVAL).await;
            continue;
        }

        if !reconnect(state, store).await {
            warn!("storage reconnect attempts exhausted; staying in degraded mode");
            return;
        }
        state.update_degraded(false).await;
        sleep(HEALTH_POLL_INTERVAL).await;
    }
}

/// Try to revive the existing connection. Enters degraded mode on the first failure.
async fn reconnect(state: &SharedState, store: &dyn GameStore) -> bool {
    let mut delay = INITIAL_DELAY;
    for attempt in 1..=MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => {
                info!(attempt, "storage reconnected after failed health check");
                return true;
            }
            Err(err) => {
                if attempt == 1 {
                    warn!(error = %err, "storage unreachable; entering degraded mode");
                    state.update_degraded(true).await;
                } else {
                    warn!(attempt, error = %err, "storage reconnect attempt failed");
                }
                sleep(delay).await;
                delay = next_delay(delay);
            }
        }
    }
    false
}

fn next_delay(delay: Duration) -> Duration {
    (delay * 2).min(MAX_DELAY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, dao::game_store::MemoryGameStore, state::AppState};

    #[test]
    fn back_off_is_capped() {
        assert_eq!(next_delay(Duration::from_secs(1)), Duration::from_secs(2));
        assert_eq!(next_delay(Duration::from_secs(8)), MAX_DELAY);
        assert_eq!(next_delay(MAX_DELAY), MAX_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn installs_the_store_and_leaves_degraded_mode() {
        let state = AppState::new(AppConfig::default());
        assert!(state.is_degraded().await);

        let supervisor = tokio::spawn(run(state.clone(), || async {
            Ok(Arc::new(MemoryGameStore::new()) as Arc<dyn GameStore>)
        }));
        let mut degraded = state.degraded_watcher();
        degraded.wait_for(|value| !*value).await.unwrap();

        assert!(state.require_game_store().await.is_ok());
        supervisor.abort();
    }
}
