// # Leader Lock Trait
//
// Defines the interface to the cluster-wide session lock that gates
// writes to a single process.

use async_trait::async_trait;

/// Trait for leader lock implementations
///
/// The engine only consumes the boolean outcome: "do I currently hold
/// leadership". The lock protocol itself (sessions, TTLs, contention)
/// lives entirely behind this seam.
///
/// `acquire` is called periodically on the poll cadence; it should
/// attempt to (re)acquire and report the current state. `release` is
/// called exactly once at shutdown.
#[async_trait]
pub trait LeaderLock: Send + Sync {
    /// Attempt to (re)acquire leadership; return whether it is held.
    ///
    /// An `Err` is treated by the engine as "not leading" for the
    /// cycle, never as fatal.
    async fn acquire(&self) -> Result<bool, crate::Error>;

    /// Release leadership and any session resources. Invoked once
    /// during orderly shutdown.
    async fn release(&self) -> Result<(), crate::Error>;

    /// Get the lock name (for logging/debugging)
    fn lock_name(&self) -> &'static str;
}
