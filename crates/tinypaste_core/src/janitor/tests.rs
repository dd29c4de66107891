use super::*;
use crate::models::paste::Paste;
use crate::store::contract_tests::{now, paste_expiring};
use crate::store::{MemoryStore, StoreBackend};
use chrono::Duration as ChronoDuration;
use std::sync::atomic::{AtomicUsize, Ordering};

/// How [`ScriptedStore::delete_expired`] behaves.
#[derive(Clone, Copy)]
enum Script {
    Succeed(usize),
    Fail,
    /// Block the thread, ignoring cancellation.
    Stall(Duration),
}

struct ScriptedStore {
    script: Script,
    calls: AtomicUsize,
}

impl ScriptedStore {
    fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PasteStore for ScriptedStore {
    fn save(&self, _ctx: &Context, _paste: &Paste) -> Result<(), StoreError> {
        Ok(())
    }

    fn get(&self, _ctx: &Context, _id: &str) -> Result<Paste, StoreError> {
        Err(StoreError::NotFound)
    }

    fn delete(&self, _ctx: &Context, _id: &str) -> Result<(), StoreError> {
        Err(StoreError::NotFound)
    }

    fn delete_expired(&self, ctx: &Context, _before: DateTime<Utc>) -> Result<usize, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ctx.check()?;
        match self.script {
            Script::Succeed(count) => Ok(count),
            Script::Fail => Err(StoreError::StorageMessage("disk on fire".to_string())),
            Script::Stall(duration) => {
                std::thread::sleep(duration);
                Ok(0)
            }
        }
    }

    fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend(&self) -> StoreBackend {
        StoreBackend::Memory
    }
}

fn fast_config(overlap: OverlapPolicy) -> JanitorConfig {
    JanitorConfig::new(Duration::from_millis(20), Duration::from_millis(20), overlap)
}

#[test]
fn config_defaults() {
    let config = JanitorConfig::default();
    assert_eq!(config.interval, Duration::from_secs(60));
    assert_eq!(config.timeout, Duration::from_secs(5));
    assert_eq!(config.overlap, OverlapPolicy::Skip);
}

#[test]
fn config_zero_interval_falls_back_and_timeout_is_clamped() {
    let config = JanitorConfig::new(Duration::ZERO, Duration::from_secs(1), OverlapPolicy::Skip);
    assert_eq!(config.interval, DEFAULT_JANITOR_INTERVAL);
    assert_eq!(config.timeout, Duration::from_secs(1));

    let config = JanitorConfig::new(
        Duration::from_secs(2),
        Duration::from_secs(30),
        OverlapPolicy::Concurrent,
    );
    assert_eq!(config.timeout, Duration::from_secs(2));
}

#[tokio::test]
async fn sweep_once_removes_expired_pastes_from_memory_store() {
    let store = Arc::new(MemoryStore::new());
    let ctx = Context::background();
    store
        .save(&ctx, &paste_expiring("stale", Some(now() - ChronoDuration::minutes(1))))
        .expect("save stale");
    store
        .save(&ctx, &paste_expiring("fresh", Some(now() + ChronoDuration::hours(1))))
        .expect("save fresh");
    store
        .save(&ctx, &paste_expiring("forever", None))
        .expect("save forever");

    let janitor = Janitor::new(store.clone(), JanitorConfig::default()).with_clock(now);
    let shutdown = CancellationToken::new();

    assert_eq!(janitor.sweep_once(&shutdown).await.removed(), Some(1));
    assert!(store.get(&ctx, "stale").expect_err("swept").is_not_found());
    assert!(store.get(&ctx, "fresh").is_ok());
    assert!(store.get(&ctx, "forever").is_ok());

    assert_eq!(janitor.sweep_once(&shutdown).await.removed(), Some(0));
}

#[tokio::test]
async fn sweep_once_reports_failures_without_panicking() {
    let store = ScriptedStore::new(Script::Fail);
    let janitor = Janitor::new(store.clone(), JanitorConfig::default());
    let shutdown = CancellationToken::new();

    for _ in 0..2 {
        let outcome = janitor.sweep_once(&shutdown).await;
        assert!(matches!(outcome, SweepOutcome::Failed(StoreError::StorageMessage(_))));
    }
    assert_eq!(store.calls(), 2);
}

#[tokio::test]
async fn cancelled_shutdown_fails_sweep_as_cancelled() {
    let store = ScriptedStore::new(Script::Succeed(3));
    let janitor = Janitor::new(store.clone(), JanitorConfig::default());
    let shutdown = CancellationToken::new();
    shutdown.cancel();

    let outcome = janitor.sweep_once(&shutdown).await;
    assert!(matches!(outcome, SweepOutcome::Failed(StoreError::Cancelled)));
}

#[tokio::test]
async fn slow_sweep_times_out_and_skip_policy_skips_next_tick() {
    let store = ScriptedStore::new(Script::Stall(Duration::from_millis(300)));
    let janitor = Janitor::new(store.clone(), fast_config(OverlapPolicy::Skip));
    let shutdown = CancellationToken::new();

    assert!(matches!(
        janitor.sweep_once(&shutdown).await,
        SweepOutcome::TimedOut
    ));
    // the stalled sweep still holds the run guard
    assert!(matches!(
        janitor.sweep_once(&shutdown).await,
        SweepOutcome::Skipped
    ));
    assert_eq!(store.calls(), 1);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(matches!(
        janitor.sweep_once(&shutdown).await,
        SweepOutcome::TimedOut
    ));
    assert_eq!(store.calls(), 2);
}

#[tokio::test]
async fn concurrent_policy_allows_overlapping_sweeps() {
    let store = ScriptedStore::new(Script::Stall(Duration::from_millis(300)));
    let janitor = Janitor::new(store.clone(), fast_config(OverlapPolicy::Concurrent));
    let shutdown = CancellationToken::new();

    assert!(matches!(
        janitor.sweep_once(&shutdown).await,
        SweepOutcome::TimedOut
    ));
    assert!(matches!(
        janitor.sweep_once(&shutdown).await,
        SweepOutcome::TimedOut
    ));
    assert_eq!(store.calls(), 2);
}

#[tokio::test]
async fn started_janitor_sweeps_repeatedly_until_cancelled() {
    let store = ScriptedStore::new(Script::Succeed(0));
    let shutdown = CancellationToken::new();
    let handle = Janitor::new(store.clone(), fast_config(OverlapPolicy::Skip)).start(shutdown.clone());

    tokio::time::sleep(Duration::from_millis(200)).await;
    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("janitor stops after cancel")
        .expect("janitor task joins");

    let calls = store.calls();
    assert!(calls >= 2, "expected repeated sweeps, saw {}", calls);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(store.calls(), calls, "no sweeps after shutdown");
}

#[tokio::test]
async fn failing_sweeps_do_not_stop_the_loop() {
    let store = ScriptedStore::new(Script::Fail);
    let shutdown = CancellationToken::new();
    let handle = Janitor::new(store.clone(), fast_config(OverlapPolicy::Skip)).start(shutdown.clone());

    tokio::time::sleep(Duration::from_millis(200)).await;
    shutdown.cancel();
    handle.await.expect("janitor task joins");

    assert!(store.calls() >= 2);
}

#[tokio::test]
async fn janitor_stops_promptly_before_first_tick() {
    let store = ScriptedStore::new(Script::Succeed(0));
    let shutdown = CancellationToken::new();
    let config = JanitorConfig::new(
        Duration::from_secs(3600),
        Duration::from_secs(5),
        OverlapPolicy::Skip,
    );
    let handle = Janitor::new(store.clone(), config).start(shutdown.clone());

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("janitor stops while waiting for a tick")
        .expect("janitor task joins");
    assert_eq!(store.calls(), 0);
}
