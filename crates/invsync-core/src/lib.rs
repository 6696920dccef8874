// # invsync-core
//
// Core library for the inventory synchronization agent.
//
// ## Architecture Overview
//
// This library provides the core functionality for polling a service
// inventory and dispatching validated records to a write sink:
// - **InventorySource**: Trait for fetching raw inventory messages
// - **RecordSink**: Trait for the write path of validated records
// - **LeaderLock**: Trait for the cluster-wide leadership primitive
// - **CacheBuilder**: Trait producing datacenter/node membership snapshots
// - **Syncer**: Engine that orchestrates the poll → diff → validate → dispatch flow
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **Single Leader**: Writes are gated on a periodically refreshed leadership flag
// 3. **Cheap Change Detection**: Identical polls are skipped up to a bounded horizon
// 4. **Fail Open**: An unavailable membership cache degrades validation to permissive
// 5. **Graceful Shutdown**: One broadcast stops every loop; in-flight cycles complete

pub mod cache;
pub mod config;
pub mod detector;
pub mod engine;
pub mod error;
pub mod lock;
pub mod record;
pub mod sink;
pub mod traits;
pub mod validate;

// Re-export core types for convenience
pub use cache::{CacheSnapshot, SharedCache, StaticCacheBuilder};
pub use config::SyncConfig;
pub use detector::ChangeDetector;
pub use engine::{SyncEvent, Syncer};
pub use error::{Error, Result};
pub use lock::StaticLock;
pub use record::Record;
pub use sink::{LogSink, MemorySink};
pub use traits::{CacheBuilder, InventorySource, LeaderLock, RecordSink};
