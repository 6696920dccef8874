// # Built-in Record Sinks
//
// In-process implementations of RecordSink.
//
// ## Purpose
//
// `MemorySink` collects accepted records in memory, for embedding the
// engine in another program and for tests. `LogSink` logs each record
// and discards it: the daemon's dry-run default when no real write
// path is wired in.
//
// Production deployments are expected to provide their own sink
// (key-value store, firewall ruleset, message bus) behind the
// `RecordSink` trait.

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::record::Record;
use crate::traits::RecordSink;
use crate::Error;
use async_trait::async_trait;

/// In-memory record sink
///
/// Stores every accepted record in arrival order. Cloning shares the
/// underlying storage.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    inner: Arc<RwLock<Vec<Record>>>,
}

impl MemorySink {
    /// Create a new empty memory sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records written so far
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check whether nothing has been written yet
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Snapshot of all written records
    pub async fn records(&self) -> Vec<Record> {
        self.inner.read().await.clone()
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn write(&self, record: Record) -> Result<(), Error> {
        self.inner.write().await.push(record);
        Ok(())
    }

    fn sink_name(&self) -> &'static str {
        "memory"
    }
}

/// Logging record sink (dry-run)
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl LogSink {
    /// Create a new log sink
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RecordSink for LogSink {
    async fn write(&self, record: Record) -> Result<(), Error> {
        tracing::info!(
            service = %record.service,
            datacenter = %record.datacenter,
            node = %record.node,
            value = %record.value,
            "record accepted"
        );
        Ok(())
    }

    fn sink_name(&self) -> &'static str {
        "log"
    }
}
