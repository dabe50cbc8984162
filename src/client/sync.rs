//! Connection lifecycle shared by every role.
//!
//! While connected the driver applies stream events, reconciles on connect,
//! after each state-changing event and on a heartbeat. While disconnected it
//! polls the pull endpoint and retries the stream after a fixed delay, and
//! keeps polling while a connection attempt is still pending. The countdown
//! tick runs in every state.

use std::{future::Future, pin::Pin, time::Duration};

use futures::{StreamExt, future::BoxFuture, stream::BoxStream};
use tokio::{
    sync::watch,
    time::{Instant, Interval, MissedTickBehavior, interval_at, sleep},
};
use tracing::{debug, info, warn};

use crate::client::{
    ClientError,
    events::StreamEvent,
    projection::{Projection, Reaction, StateSnapshot},
};

/// Events as they come off one stream connection.
pub type EventStream = BoxStream<'static, Result<StreamEvent, ClientError>>;

/// Pulls the authoritative state for one role.
pub trait StateFetcher: Send + Sync + 'static {
    fn fetch(&self) -> BoxFuture<'_, Result<StateSnapshot, ClientError>>;
}

/// Opens the push channel.
pub trait EventSource: Send + Sync + 'static {
    fn connect(&self) -> BoxFuture<'_, Result<EventStream, ClientError>>;
}

/// Timings of the sync loop.
#[derive(Debug, Clone, Copy)]
pub struct SyncConfig {
    /// Fixed wait before reopening a dropped stream.
    pub reconnect_delay: Duration,
    /// Reconciliation period while connected.
    pub heartbeat: Duration,
    /// Pull period while disconnected.
    pub poll_interval: Duration,
    /// Local countdown resolution.
    pub tick: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_secs(3),
            heartbeat: Duration::from_secs(30),
            poll_interval: Duration::from_secs(3),
            tick: Duration::from_secs(1),
        }
    }
}

enum Flow {
    Continue,
    Shutdown,
}

enum Attempt {
    Connected(EventStream),
    Failed,
    Shutdown,
}

/// Keeps a projection in sync and publishes every change on a watch channel.
pub struct SyncDriver<P, F, S> {
    fetcher: F,
    source: S,
    config: SyncConfig,
    projection: watch::Sender<P>,
}

impl<P, F, S> SyncDriver<P, F, S>
where
    P: Projection,
    F: StateFetcher,
    S: EventSource,
{
    /// Driver starting from `projection`; nothing runs until [`Self::run_until`].
    pub fn new(projection: P, fetcher: F, source: S, config: SyncConfig) -> Self {
        let (projection, _) = watch::channel(projection);
        Self {
            fetcher,
            source,
            config,
            projection,
        }
    }

    /// Receive the projection each time it changes.
    pub fn subscribe(&self) -> watch::Receiver<P> {
        self.projection.subscribe()
    }

    /// Drive the projection until `shutdown` resolves.
    pub async fn run_until<Fut>(self, shutdown: Fut)
    where
        Fut: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut tick = interval_at(Instant::now() + self.config.tick, self.config.tick);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let flow = match self.open(&mut tick, shutdown.as_mut()).await {
                Attempt::Connected(events) => {
                    info!(role = %self.role(), "event stream connected");
                    self.stream(events, &mut tick, shutdown.as_mut()).await
                }
                Attempt::Failed => Flow::Continue,
                Attempt::Shutdown => Flow::Shutdown,
            };
            if let Flow::Shutdown = flow {
                break;
            }
            if let Flow::Shutdown = self.offline(&mut tick, shutdown.as_mut()).await {
                break;
            }
        }
        debug!(role = %self.role(), "sync driver stopped");
    }

    /// Wait for the stream to open, polling meanwhile so a hanging attempt
    /// never leaves the projection stale.
    async fn open<Fut>(&self, tick: &mut Interval, mut shutdown: Pin<&mut Fut>) -> Attempt
    where
        Fut: Future<Output = ()>,
    {
        let mut connecting = self.source.connect();
        let period = self.config.poll_interval;
        let mut poll = interval_at(Instant::now() + period, period);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut shutdown => return Attempt::Shutdown,
                result = &mut connecting => {
                    return match result {
                        Ok(events) => Attempt::Connected(events),
                        Err(err) => {
                            warn!(role = %self.role(), error = %err, "event stream unavailable");
                            Attempt::Failed
                        }
                    };
                }
                _ = tick.tick() => self.projection.send_modify(|p| p.tick()),
                _ = poll.tick() => {
                    debug!(role = %self.role(), "stream still connecting; polling");
                    self.reconcile().await;
                }
            }
        }
    }

    async fn stream<Fut>(
        &self,
        mut events: EventStream,
        tick: &mut Interval,
        mut shutdown: Pin<&mut Fut>,
    ) -> Flow
    where
        Fut: Future<Output = ()>,
    {
        self.projection.send_modify(|p| p.set_connected(true));
        self.reconcile().await;

        let period = self.config.heartbeat;
        let mut heartbeat = interval_at(Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let flow = loop {
            tokio::select! {
                _ = &mut shutdown => break Flow::Shutdown,
                _ = tick.tick() => self.projection.send_modify(|p| p.tick()),
                _ = heartbeat.tick() => self.reconcile().await,
                next = events.next() => match next {
                    Some(Ok(event)) => {
                        debug!(event = event.name(), "stream event");
                        let mut reaction = Reaction::Nothing;
                        self.projection
                            .send_modify(|p| reaction = p.apply_event(&event));
                        if reaction == Reaction::Reconcile {
                            self.reconcile().await;
                        }
                    }
                    Some(Err(err)) if !err.is_fatal_for_stream() => {
                        warn!(error = %err, "dropping undecodable event");
                        self.reconcile().await;
                    }
                    Some(Err(err)) => {
                        warn!(error = %err, "event stream failed");
                        break Flow::Continue;
                    }
                    None => {
                        info!(role = %self.role(), "event stream closed");
                        break Flow::Continue;
                    }
                },
            }
        };

        // Keep the last known state on screen, only the flag changes.
        self.projection.send_modify(|p| p.set_connected(false));
        flow
    }

    async fn offline<Fut>(&self, tick: &mut Interval, mut shutdown: Pin<&mut Fut>) -> Flow
    where
        Fut: Future<Output = ()>,
    {
        let reconnect = sleep(self.config.reconnect_delay);
        tokio::pin!(reconnect);
        let mut poll = interval_at(Instant::now(), self.config.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut shutdown => return Flow::Shutdown,
                _ = &mut reconnect => return Flow::Continue,
                _ = tick.tick() => self.projection.send_modify(|p| p.tick()),
                _ = poll.tick() => self.reconcile().await,
            }
        }
    }

    async fn reconcile(&self) {
        match self.fetcher.fetch().await {
            Ok(snapshot) => {
                self.projection
                    .send_if_modified(|p| p.apply_snapshot(snapshot));
            }
            Err(err) => warn!(role = %self.role(), error = %err, "state fetch failed"),
        }
    }

    fn role(&self) -> crate::state::ClientRole {
        self.projection.borrow().role()
    }
}
