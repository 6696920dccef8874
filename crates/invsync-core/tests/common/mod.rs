//! Test doubles and common utilities for the engine contract tests
//!
//! These doubles verify engine behavior (gating, diffing, dispatch,
//! shutdown) without any real inventory, lock, or write path behind
//! them.

use invsync_core::cache::CacheSnapshot;
use invsync_core::error::Result;
use invsync_core::record::Record;
use invsync_core::traits::{CacheBuilder, InventorySource, RecordSink};
use invsync_core::{Error, SyncConfig, SyncEvent, Syncer};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Poll cadence used by the contract tests
pub const TEST_INTERVAL: Duration = Duration::from_millis(20);

/// An inventory source that plays back a script of responses.
///
/// Each `fetch` pops the next scripted response; when the script is
/// exhausted, the last response repeats forever (a steady inventory).
pub struct ScriptedSource {
    script: Mutex<VecDeque<Vec<String>>>,
    last: Mutex<Vec<String>>,
    fetch_calls: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Vec<&str>>) -> Self {
        let script: VecDeque<Vec<String>> = script
            .into_iter()
            .map(|cycle| cycle.into_iter().map(str::to_string).collect())
            .collect();
        Self {
            script: Mutex::new(script),
            last: Mutex::new(Vec::new()),
            fetch_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A source that returns the same messages on every cycle
    pub fn steady(messages: Vec<&str>) -> Self {
        Self::new(vec![messages])
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl InventorySource for ScriptedSource {
    async fn fetch(&self) -> Result<Vec<String>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().unwrap();
        if let Some(next) = script.pop_front() {
            *self.last.lock().unwrap() = next.clone();
            Ok(next)
        } else {
            Ok(self.last.lock().unwrap().clone())
        }
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// Boxable handle that shares one source between the test (which
/// inspects counters) and the engine (which owns its source).
pub struct SourceHandle<S: InventorySource>(pub Arc<S>);

#[async_trait::async_trait]
impl<S: InventorySource> InventorySource for SourceHandle<S> {
    async fn fetch(&self) -> Result<Vec<String>> {
        self.0.fetch().await
    }

    fn source_name(&self) -> &'static str {
        self.0.source_name()
    }
}

/// An inventory source whose every fetch fails
pub struct FailingSource {
    fetch_calls: Arc<AtomicUsize>,
}

impl FailingSource {
    pub fn new() -> Self {
        Self {
            fetch_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl InventorySource for FailingSource {
    async fn fetch(&self) -> Result<Vec<String>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::source("scripted transport failure"))
    }

    fn source_name(&self) -> &'static str {
        "failing"
    }
}

/// A record sink that counts writes and stores records
#[derive(Default)]
pub struct CountingSink {
    records: Mutex<Vec<Record>>,
    write_calls: AtomicUsize,
}

impl CountingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl RecordSink for CountingSink {
    async fn write(&self, record: Record) -> Result<()> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.records.lock().unwrap().push(record);
        Ok(())
    }

    fn sink_name(&self) -> &'static str {
        "counting"
    }
}

/// A cache builder serving a fixed snapshot
pub struct FixedCacheBuilder {
    snapshot: CacheSnapshot,
}

impl FixedCacheBuilder {
    pub fn new(datacenters: &[&str], nodes: &[&str]) -> Self {
        Self {
            snapshot: CacheSnapshot {
                datacenters: datacenters.iter().map(|s| s.to_string()).collect(),
                nodes: nodes.iter().map(|s| s.to_string()).collect(),
                unavailable: false,
            },
        }
    }
}

#[async_trait::async_trait]
impl CacheBuilder for FixedCacheBuilder {
    async fn build(&self) -> Result<CacheSnapshot> {
        Ok(self.snapshot.clone())
    }

    fn builder_name(&self) -> &'static str {
        "fixed"
    }
}

/// A cache builder whose every refresh fails (cache outage)
pub struct FailingCacheBuilder;

#[async_trait::async_trait]
impl CacheBuilder for FailingCacheBuilder {
    async fn build(&self) -> Result<CacheSnapshot> {
        Err(Error::cache("scripted cache outage"))
    }

    fn builder_name(&self) -> &'static str {
        "failing"
    }
}

/// Engine configuration used by the contract tests
pub fn test_config() -> SyncConfig {
    SyncConfig {
        poll_interval_secs: 1,
        event_channel_capacity: 256,
    }
}

/// Build a test syncer with the fast test cadence applied
#[allow(clippy::type_complexity)]
pub fn test_syncer(
    source: Box<dyn InventorySource>,
    sink: Arc<dyn RecordSink>,
    lock: Arc<dyn invsync_core::traits::LeaderLock>,
    cache_builder: Box<dyn CacheBuilder>,
) -> (Syncer, mpsc::Receiver<SyncEvent>) {
    let (syncer, events) = Syncer::new(source, sink, lock, cache_builder, test_config())
        .expect("syncer construction succeeds");
    (syncer.with_poll_interval(TEST_INTERVAL), events)
}

/// Wait until `count` poll cycles have been observed on the event
/// channel (completed, unchanged, or skipped), or panic after 5s.
pub async fn wait_for_cycles(events: &mut mpsc::Receiver<SyncEvent>, count: usize) {
    let mut seen = 0;
    tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(event) = events.recv().await {
            if matches!(
                event,
                SyncEvent::CycleCompleted { .. } | SyncEvent::CycleUnchanged | SyncEvent::CycleSkipped
            ) {
                seen += 1;
                if seen >= count {
                    return;
                }
            }
        }
        panic!("event channel closed after {} cycles", seen);
    })
    .await
    .expect("cycles observed within timeout");
}
