// # Cache Builder Trait
//
// Defines the producer of membership cache snapshots.

use crate::cache::CacheSnapshot;
use async_trait::async_trait;

/// Trait for cache builder implementations
///
/// Called periodically on the poll cadence to rebuild the set of known
/// datacenters and `datacenter@node` pairs. On `Err`, the engine keeps
/// the previous sets but marks the snapshot unavailable, which makes
/// membership validation fail open rather than blocking all writes.
#[async_trait]
pub trait CacheBuilder: Send + Sync {
    /// Build a fresh membership snapshot.
    async fn build(&self) -> Result<CacheSnapshot, crate::Error>;

    /// Get the builder name (for logging/debugging)
    fn builder_name(&self) -> &'static str;
}
