//! Periodic list synchronization.
//!
//! One repeating timer per client. It runs only while a session is active
//! and auto-refresh is enabled. The first tick fires one full period after
//! `start`. Ticks do not wait for the previous refresh to finish, so
//! refreshes may overlap; the store's request ids keep the newest
//! applied list from being replaced by an older response.

use async_trait::async_trait;
use eqviz_core::event::{ClientEvent, SchedulerState};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;

use crate::events::EventBus;
use crate::state::Epoch;

/// What the timer drives.
#[async_trait]
pub trait SyncTarget: Send + Sync {
    /// `false` once the session the timer was started for has ended.
    async fn is_live(&self, epoch: Epoch) -> bool;

    /// One refresh on behalf of the session `epoch`.
    async fn tick(&self, epoch: Epoch);
}

struct RunningTimer {
    generation: u64,
    epoch: Epoch,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct SyncScheduler {
    period: Duration,
    enabled: AtomicBool,
    generation: AtomicU64,
    running: Arc<Mutex<Option<RunningTimer>>>,
    events: EventBus,
}

fn lock(running: &Mutex<Option<RunningTimer>>) -> MutexGuard<'_, Option<RunningTimer>> {
    running.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SyncScheduler {
    pub fn new(period: Duration, enabled: bool, events: EventBus) -> Self {
        Self {
            period,
            enabled: AtomicBool::new(enabled),
            generation: AtomicU64::new(0),
            running: Arc::new(Mutex::new(None)),
            events,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> SchedulerState {
        if lock(&self.running).is_some() {
            SchedulerState::Running
        } else {
            SchedulerState::Stopped
        }
    }

    /// Epoch of the session the running timer belongs to.
    pub fn running_epoch(&self) -> Option<Epoch> {
        lock(&self.running).as_ref().map(|timer| timer.epoch)
    }

    /// Flips the toggle. Disabling stops the timer at once; enabling does
    /// not start it, the caller does that when a session is active.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        if !enabled {
            self.stop();
        }
    }

    /// Starts the timer for session `epoch`.
    ///
    /// Does nothing when disabled or when a timer for the same epoch is
    /// already running; a timer of an older epoch is replaced. Must be
    /// called from within a tokio runtime.
    pub fn start(&self, target: Arc<dyn SyncTarget>, epoch: Epoch) -> bool {
        if !self.is_enabled() {
            tracing::debug!(target: "sync_scheduler", "Auto-refresh disabled, not starting");
            return false;
        }

        let mut running = lock(&self.running);
        if running.as_ref().is_some_and(|timer| timer.epoch == epoch) {
            return false;
        }
        if let Some(previous) = running.take() {
            previous.cancel.cancel();
            previous.handle.abort();
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = CancellationToken::new();
        let task = TimerTask {
            first_tick: Instant::now() + self.period,
            period: self.period,
            target,
            epoch,
            generation,
            cancel: cancel.clone(),
            running: Arc::clone(&self.running),
            events: self.events.clone(),
        };
        let handle = tokio::spawn(task.run());

        *running = Some(RunningTimer {
            generation,
            epoch,
            cancel,
            handle,
        });
        drop(running);

        tracing::info!(target: "sync_scheduler", "Scheduler started ({}ms interval)", self.period.as_millis());
        self.events.publish(ClientEvent::SchedulerChanged {
            state: SchedulerState::Running,
        });
        true
    }

    /// Stops the timer. No tick fires after this returns.
    pub fn stop(&self) -> bool {
        let Some(timer) = lock(&self.running).take() else {
            return false;
        };
        timer.cancel.cancel();
        timer.handle.abort();

        tracing::info!(target: "sync_scheduler", "Scheduler stopped");
        self.events.publish(ClientEvent::SchedulerChanged {
            state: SchedulerState::Stopped,
        });
        true
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        if let Some(timer) = lock(&self.running).take() {
            timer.cancel.cancel();
            timer.handle.abort();
        }
    }
}

struct TimerTask {
    first_tick: Instant,
    period: Duration,
    target: Arc<dyn SyncTarget>,
    epoch: Epoch,
    generation: u64,
    cancel: CancellationToken,
    running: Arc<Mutex<Option<RunningTimer>>>,
    events: EventBus,
}

impl TimerTask {
    async fn run(self) {
        let mut ticker = interval_at(self.first_tick, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let epoch = self.epoch;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = ticker.tick() => {}
            }

            if !self.target.is_live(epoch).await {
                break;
            }
            if self.cancel.is_cancelled() {
                return;
            }

            tracing::debug!(target: "sync_scheduler", epoch, "Tick");
            let target = Arc::clone(&self.target);
            let cancel = self.cancel.clone();
            tokio::spawn(async move {
                if !cancel.is_cancelled() {
                    target.tick(epoch).await;
                }
            });
        }

        // The session went away underneath the timer.
        let stopped = {
            let mut running = lock(&self.running);
            if running
                .as_ref()
                .is_some_and(|timer| timer.generation == self.generation)
            {
                running.take();
                true
            } else {
                false
            }
        };
        if stopped {
            tracing::info!(target: "sync_scheduler", "Session ended, scheduler stopped");
            self.events.publish(ClientEvent::SchedulerChanged {
                state: SchedulerState::Stopped,
            });
        }
    }
}
