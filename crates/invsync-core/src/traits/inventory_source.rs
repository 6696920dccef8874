// # Inventory Source Trait
//
// Defines the interface for fetching raw inventory messages.
//
// ## Implementations
//
// - HTTP inventory endpoint: `invsync-source-http` crate
// - Test doubles: scripted sources in the contract tests

use async_trait::async_trait;

/// Trait for inventory source implementations
///
/// One call returns the raw messages of one poll cycle. The engine
/// treats any error as "empty result for this cycle" (logged, never
/// fatal); the next scheduled tick retries naturally. Implementations
/// must not retry internally; cadence is owned by the engine.
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait InventorySource: Send + Sync {
    /// Fetch the current inventory and extract its raw messages.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<String>)`: the cycle's raw messages, possibly empty
    /// - `Err(Error)`: transport or response-shape failure
    async fn fetch(&self) -> Result<Vec<String>, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
