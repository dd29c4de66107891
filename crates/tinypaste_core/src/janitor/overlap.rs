//! Skip-if-running guard for janitor sweeps.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// What a tick does when the previous sweep has not finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Skip the tick while a sweep is in flight.
    #[default]
    Skip,
    /// Start another sweep anyway. Sweeps are idempotent, so overlap only
    /// costs duplicated work.
    Concurrent,
}

/// Tracks whether a sweep is currently running.
#[derive(Debug)]
pub struct OverlapGuard {
    running: Arc<AtomicBool>,
    policy: OverlapPolicy,
}

impl OverlapGuard {
    pub fn new(policy: OverlapPolicy) -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            policy,
        }
    }

    /// Claim the right to sweep.
    ///
    /// # Returns
    /// `None` when the policy is [`OverlapPolicy::Skip`] and a sweep already
    /// holds a [`RunGuard`].
    pub fn try_acquire(&self) -> Option<RunGuard> {
        match self.policy {
            OverlapPolicy::Skip => self
                .running
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .ok()
                .map(|_| RunGuard {
                    flag: Arc::clone(&self.running),
                }),
            OverlapPolicy::Concurrent => Some(RunGuard {
                flag: Arc::new(AtomicBool::new(true)),
            }),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn policy(&self) -> OverlapPolicy {
        self.policy
    }
}

/// Clears the running flag on drop, including when the sweep panics.
#[derive(Debug)]
pub struct RunGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
