//! Core traits for the synchronization agent
//!
//! This module defines the abstract interfaces for every external
//! collaborator the engine consumes.
//!
//! - [`InventorySource`]: Fetch one poll cycle's raw messages
//! - [`RecordSink`]: Write path for one validated record
//! - [`LeaderLock`]: Cluster-wide leadership primitive
//! - [`CacheBuilder`]: Producer of membership cache snapshots

pub mod cache_builder;
pub mod inventory_source;
pub mod leader_lock;
pub mod record_sink;

pub use cache_builder::CacheBuilder;
pub use inventory_source::InventorySource;
pub use leader_lock::LeaderLock;
pub use record_sink::RecordSink;
