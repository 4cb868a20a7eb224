//! Refresh loop that keeps the published snapshot in step with the active
//! configuration.
//!
//! Each configuration gets a generation number. Cycles carry the generation
//! they were started for and may only publish while it is still current, so a
//! slow cycle for an old configuration can never overwrite a newer snapshot.
//! In-flight HTTP requests are not aborted on reconfiguration; their results
//! are discarded when they settle.

use chrono::{DateTime, Utc};
use common::models::{CoinSnapshot, Currency, Exchange, WatchList};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::{placeholder, Aggregator, PollIntervals};

/// The tuple a poll cycle is bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    pub currency: Currency,
    pub exchange: Exchange,
    pub watch_list: WatchList,
}

/// What the poller last published.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub generation: u64,
    pub config: Option<PollConfig>,
    pub coins: Vec<CoinSnapshot>,
    /// False while only the placeholder has been published
    pub live: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Polling,
    Stopped,
}

pub struct Poller {
    aggregator: Arc<Aggregator>,
    intervals: PollIntervals,
    snapshot: Arc<watch::Sender<Snapshot>>,
    timer: Option<JoinHandle<()>>,
    state: PollerState,
}

impl Poller {
    pub fn new(aggregator: Arc<Aggregator>, intervals: PollIntervals) -> Self {
        let (snapshot, _) = watch::channel(Snapshot::default());
        Self {
            aggregator,
            intervals,
            snapshot: Arc::new(snapshot),
            timer: None,
            state: PollerState::Idle,
        }
    }

    pub fn state(&self) -> PollerState {
        self.state
    }

    pub fn config(&self) -> Option<PollConfig> {
        self.snapshot.borrow().config.clone()
    }

    pub fn latest(&self) -> Snapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.subscribe()
    }

    /// Switches to `config`, publishing its placeholder and re-arming the timer.
    ///
    /// Must be called from within a Tokio runtime. Re-submitting the active
    /// configuration is a no-op.
    pub fn configure(&mut self, config: PollConfig) {
        match self.state {
            PollerState::Stopped => {
                warn!("Ignoring configuration change on a stopped poller");
                return;
            }
            PollerState::Polling if self.config().as_ref() == Some(&config) => {
                debug!("Configuration unchanged, keeping the current timer");
                return;
            }
            _ => {}
        }

        self.cancel_timer();

        let coins = placeholder::initial(
            self.aggregator.resolver(),
            config.currency,
            &config.watch_list,
        );
        let mut generation = 0;
        self.snapshot.send_modify(|snapshot| {
            snapshot.generation += 1;
            generation = snapshot.generation;
            snapshot.config = Some(config.clone());
            snapshot.coins = coins;
            snapshot.live = false;
            snapshot.updated_at = None;
        });

        let period = self.intervals.for_exchange(config.exchange);
        info!(
            "Polling {} in {} from {} every {:?} (generation {})",
            config.watch_list, config.currency, config.exchange, period, generation
        );

        self.timer = Some(tokio::spawn(run_timer(
            self.aggregator.clone(),
            self.snapshot.clone(),
            config,
            generation,
            period,
        )));
        self.state = PollerState::Polling;
    }

    /// Releases the timer. Cycles still in flight settle without publishing.
    pub fn stop(&mut self) {
        if self.state == PollerState::Stopped {
            return;
        }

        self.cancel_timer();
        self.snapshot.send_modify(|snapshot| snapshot.generation += 1);
        self.state = PollerState::Stopped;
        info!("Poller stopped");
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_timer(
    aggregator: Arc<Aggregator>,
    snapshot: Arc<watch::Sender<Snapshot>>,
    config: PollConfig,
    generation: u64,
    period: Duration,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut in_flight: Option<JoinHandle<()>> = None;

    loop {
        // first tick completes immediately
        ticker.tick().await;

        if in_flight.as_ref().is_some_and(|cycle| !cycle.is_finished()) {
            debug!("Previous cycle still running, skipping tick");
            continue;
        }

        // spawned so that cancelling the timer leaves the cycle to settle on its own
        in_flight = Some(tokio::spawn(run_cycle(
            aggregator.clone(),
            snapshot.clone(),
            config.clone(),
            generation,
        )));
    }
}

async fn run_cycle(
    aggregator: Arc<Aggregator>,
    snapshot: Arc<watch::Sender<Snapshot>>,
    config: PollConfig,
    generation: u64,
) {
    let coins = aggregator
        .aggregate(&config.watch_list, config.currency, config.exchange)
        .await;

    let published = snapshot.send_if_modified(|current| {
        if current.generation != generation {
            return false;
        }
        current.coins = coins;
        current.live = true;
        current.updated_at = Some(Utc::now());
        true
    });

    if !published {
        debug!("Discarding result of superseded generation {}", generation);
    }
}
