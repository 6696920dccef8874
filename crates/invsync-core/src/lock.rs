// # Static Leader Lock
//
// Fixed-answer implementation of LeaderLock.
//
// ## Purpose
//
// Single-instance deployments have no peer to contend with; a lock
// that always answers "leading" (or "never leading", to park an
// instance) lets the engine run without a distributed-lock backend.
// Also the workhorse of the contract tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::traits::LeaderLock;
use crate::Error;
use async_trait::async_trait;

/// Leader lock with a fixed (but flippable) answer
#[derive(Debug, Default)]
pub struct StaticLock {
    held: AtomicBool,
    release_calls: AtomicUsize,
}

impl StaticLock {
    /// Create a lock that reports leadership
    pub fn leader() -> Self {
        Self {
            held: AtomicBool::new(true),
            release_calls: AtomicUsize::new(0),
        }
    }

    /// Create a lock that never reports leadership
    pub fn follower() -> Self {
        Self::default()
    }

    /// Flip the leadership answer; takes effect on the next refresh
    pub fn set_held(&self, held: bool) {
        self.held.store(held, Ordering::SeqCst);
    }

    /// Number of times `release` was called
    pub fn release_calls(&self) -> usize {
        self.release_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LeaderLock for StaticLock {
    async fn acquire(&self) -> Result<bool, Error> {
        Ok(self.held.load(Ordering::SeqCst))
    }

    async fn release(&self) -> Result<(), Error> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        self.held.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn lock_name(&self) -> &'static str {
        "static"
    }
}
