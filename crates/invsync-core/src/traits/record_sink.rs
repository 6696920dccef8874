// # Record Sink Trait
//
// Defines the write path for validated records.

use crate::record::Record;
use async_trait::async_trait;

/// Trait for record sink implementations
///
/// The engine dispatches one concurrent `write` per validated record
/// per changed cycle and waits for all of them before the next fetch.
///
/// # Idempotency
///
/// Writes must be idempotent: leadership can flip between processes
/// inside the staleness horizon, so a record may be written more than
/// once across the cluster.
///
/// # Constraints
///
/// Implementations perform one write per call and return success or
/// failure; retry policy, scheduling, and validation are owned by the
/// engine. A failed write is logged and dropped, never retried within
/// the cycle.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Accept or reject one validated record.
    async fn write(&self, record: Record) -> Result<(), crate::Error>;

    /// Get the sink name (for logging/debugging)
    fn sink_name(&self) -> &'static str;
}
