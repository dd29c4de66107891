//! Periodic sweeper that deletes expired pastes.
//!
//! The janitor owns nothing but a timer and a shared store handle. Each tick
//! runs `delete_expired(now)` on the blocking pool under a per-sweep timeout.
//! Errors are logged and the next tick tries again.

mod overlap;

pub use self::overlap::{OverlapGuard, OverlapPolicy, RunGuard};

use crate::constants::{DEFAULT_JANITOR_INTERVAL, DEFAULT_JANITOR_TIMEOUT};
use crate::context::Context;
use crate::error::StoreError;
use crate::store::PasteStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Source of the sweep cutoff.
pub type Clock = fn() -> DateTime<Utc>;

/// Janitor scheduling settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JanitorConfig {
    pub interval: Duration,
    pub timeout: Duration,
    pub overlap: OverlapPolicy,
}

impl JanitorConfig {
    /// Build a config, normalizing out-of-range values.
    ///
    /// A zero `interval` falls back to [`DEFAULT_JANITOR_INTERVAL`] and
    /// `timeout` is clamped to at most the interval.
    pub fn new(interval: Duration, timeout: Duration, overlap: OverlapPolicy) -> Self {
        let interval = if interval.is_zero() {
            DEFAULT_JANITOR_INTERVAL
        } else {
            interval
        };
        Self {
            interval,
            timeout: timeout.min(interval),
            overlap,
        }
    }
}

impl Default for JanitorConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_JANITOR_INTERVAL,
            DEFAULT_JANITOR_TIMEOUT,
            OverlapPolicy::default(),
        )
    }
}

/// Result of a single sweep attempt.
#[derive(Debug)]
pub enum SweepOutcome {
    Removed(usize),
    /// The previous sweep was still running.
    Skipped,
    TimedOut,
    Failed(StoreError),
}

impl SweepOutcome {
    pub fn removed(&self) -> Option<usize> {
        match self {
            Self::Removed(count) => Some(*count),
            _ => None,
        }
    }
}

/// Background sweeper bound to one store.
pub struct Janitor {
    store: Arc<dyn PasteStore>,
    config: JanitorConfig,
    guard: OverlapGuard,
    clock: Clock,
}

impl Janitor {
    pub fn new(store: Arc<dyn PasteStore>, config: JanitorConfig) -> Self {
        Self {
            store,
            guard: OverlapGuard::new(config.overlap),
            config,
            clock: Utc::now,
        }
    }

    /// Replace the wall clock used for sweep cutoffs.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &JanitorConfig {
        &self.config
    }

    /// Run one sweep now and log its outcome.
    ///
    /// Cancelling `shutdown` aborts an in-flight sweep at its next checkpoint.
    pub async fn sweep_once(&self, shutdown: &CancellationToken) -> SweepOutcome {
        let outcome = self.run_sweep(shutdown).await;
        report(&outcome);
        outcome
    }

    async fn run_sweep(&self, shutdown: &CancellationToken) -> SweepOutcome {
        let Some(run) = self.guard.try_acquire() else {
            return SweepOutcome::Skipped;
        };

        let ctx = Context::with_token(shutdown.child_token()).with_timeout(self.config.timeout);
        let store = Arc::clone(&self.store);
        let cutoff = (self.clock)();
        let task = tokio::task::spawn_blocking(move || {
            let _run = run;
            store.delete_expired(&ctx, cutoff)
        });

        match time::timeout(self.config.timeout, task).await {
            Ok(Ok(Ok(count))) => SweepOutcome::Removed(count),
            Ok(Ok(Err(StoreError::DeadlineExceeded))) | Err(_) => SweepOutcome::TimedOut,
            Ok(Ok(Err(err))) => SweepOutcome::Failed(err),
            Ok(Err(join_err)) => SweepOutcome::Failed(StoreError::StorageMessage(format!(
                "sweep task failed: {}",
                join_err
            ))),
        }
    }

    /// Spawn the sweep loop on the current runtime.
    ///
    /// The first sweep fires one interval after start. The loop exits once
    /// `shutdown` is cancelled.
    pub fn start(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let interval = self.config.interval;
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(
                interval_secs = interval.as_secs_f64(),
                timeout_secs = self.config.timeout.as_secs_f64(),
                overlap = ?self.config.overlap,
                backend = %self.store.backend(),
                "Janitor started"
            );

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        self.sweep_once(&shutdown).await;
                    }
                }
            }

            tracing::info!("Janitor stopped");
        })
    }
}

fn report(outcome: &SweepOutcome) {
    match outcome {
        SweepOutcome::Removed(0) => {}
        SweepOutcome::Removed(count) => {
            tracing::info!(count = *count, "Swept expired pastes");
        }
        SweepOutcome::Skipped => {
            tracing::debug!("Previous sweep still running; skipping tick");
        }
        SweepOutcome::TimedOut => {
            tracing::warn!("Sweep timed out; retrying next tick");
        }
        SweepOutcome::Failed(StoreError::Cancelled) => {
            tracing::debug!("Sweep cancelled by shutdown");
        }
        SweepOutcome::Failed(err) => {
            tracing::error!(error = %err, "Sweep failed");
        }
    }
}

#[cfg(test)]
mod tests;
