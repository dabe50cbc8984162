pub mod board;
pub mod sse;
pub mod state_machine;
pub mod transitions;
pub mod voting;

use std::{future::Future, sync::Arc, time::Duration};

use tokio::sync::{Mutex, RwLock, watch};
use tokio::time::timeout;
use tracing::warn;

use crate::{
    config::AppConfig,
    dao::game_store::{GameStore, TimedGameStore},
    error::ServiceError,
};

pub use self::board::AnswerBoard;
pub use self::sse::{BroadcastTarget, ClientRole, SseHub};
pub use self::voting::VotingManager;

pub type SharedState = Arc<AppState>;

/// Central application state: storage handle, streaming hub, audience poll and
/// the gate that serialises admin transitions.
pub struct AppState {
    config: AppConfig,
    game_store: RwLock<Option<Arc<dyn GameStore>>>,
    degraded: watch::Sender<bool>,
    hub: SseHub,
    voting: VotingManager,
    board: RwLock<AnswerBoard>,
    transition_gate: Mutex<()>,
    transition_timeout: Duration,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let hub = SseHub::new();
        Arc::new(Self {
            transition_timeout: config.transition_timeout(),
            config,
            game_store: RwLock::new(None),
            degraded: degraded_tx,
            voting: VotingManager::new(hub.clone()),
            hub,
            board: RwLock::new(AnswerBoard::default()),
            transition_gate: Mutex::new(()),
        })
    }

    /// Build a state with `store` already installed and healthy.
    pub fn with_store(config: AppConfig, store: Arc<dyn GameStore>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(false);
        let hub = SseHub::new();
        Arc::new(Self {
            transition_timeout: config.transition_timeout(),
            game_store: RwLock::new(Some(bounded_store(store, config.transition_timeout()))),
            config,
            degraded: degraded_tx,
            voting: VotingManager::new(hub.clone()),
            hub,
            board: RwLock::new(AnswerBoard::default()),
            transition_gate: Mutex::new(()),
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Hub fanning events out to every streaming client.
    pub fn hub(&self) -> &SseHub {
        &self.hub
    }

    /// The process-wide audience poll.
    pub fn voting(&self) -> &VotingManager {
        &self.voting
    }

    /// Selection/reveal state of the question on screen.
    pub fn board(&self) -> &RwLock<AnswerBoard> {
        &self.board
    }

    /// Obtain a handle to the current game store, if one is installed.
    pub async fn game_store(&self) -> Option<Arc<dyn GameStore>> {
        let guard = self.game_store.read().await;
        guard.as_ref().cloned()
    }

    /// Return the store, or [`ServiceError::Degraded`] while storage is unavailable.
    pub async fn require_game_store(&self) -> Result<Arc<dyn GameStore>, ServiceError> {
        if self.is_degraded().await {
            return Err(ServiceError::Degraded);
        }
        self.game_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new game store implementation and leave degraded mode.
    ///
    /// Every call on the installed store is bounded by the transition timeout.
    pub async fn set_game_store(&self, store: Arc<dyn GameStore>) {
        {
            let mut guard = self.game_store.write().await;
            *guard = Some(bounded_store(store, self.transition_timeout));
        }
        self.update_degraded(false).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    /// Run `work` while holding the transition gate.
    ///
    /// Only one admin transition runs at a time. The configured timeout bounds
    /// the wait for the gate; once admitted, `work` runs to completion so the
    /// result it reports matches what it persisted and broadcast. Storage
    /// round-trips inside `work` carry their own bound through
    /// [`TimedGameStore`].
    pub async fn run_transition<F, Fut, T>(&self, label: &'static str, work: F) -> Result<T, ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let limit = self.transition_timeout;
        let Ok(_gate) = timeout(limit, self.transition_gate.lock()).await else {
            warn!(transition = label, ?limit, "transition gate busy; giving up");
            return Err(ServiceError::Timeout);
        };
        work().await
    }
}

fn bounded_store(store: Arc<dyn GameStore>, limit: Duration) -> Arc<dyn GameStore> {
    Arc::new(TimedGameStore::new(store, limit))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use tokio::{sync::oneshot, time::sleep};

    use super::*;
    use crate::dao::game_store::MemoryGameStore;

    fn state() -> SharedState {
        AppState::with_store(AppConfig::default(), Arc::new(MemoryGameStore::new()))
    }

    #[tokio::test(start_paused = true)]
    async fn queued_transition_gives_up_without_running() {
        let state = state();
        let (release, released) = oneshot::channel::<()>();
        let holder = {
            let state = state.clone();
            tokio::spawn(async move {
                state
                    .run_transition("holder", || async move {
                        let _ = released.await;
                        Ok(())
                    })
                    .await
            })
        };
        sleep(Duration::from_millis(10)).await;

        let ran = AtomicBool::new(false);
        let err = state
            .run_transition("queued", || async {
                ran.store(true, Ordering::SeqCst);
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Timeout));
        assert!(!ran.load(Ordering::SeqCst));

        release.send(()).unwrap();
        holder.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn admitted_transition_is_not_cut_short() {
        let state = state();
        let limit = state.config().transition_timeout();

        let value = state
            .run_transition("slow", || async move {
                sleep(limit * 2).await;
                Ok(7)
            })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }
}
