//! Core synchronization engine
//!
//! The Syncer is responsible for:
//! - Polling the inventory via InventorySource
//! - Skipping unchanged cycles via the ChangeDetector
//! - Validating records against the membership cache
//! - Dispatching validated records to the RecordSink under the leadership gate
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐        ┌───────────────────┐
//! │ CacheBuilder     │──────▶ │   SharedCache     │◀── read ──┐
//! │ (refresh loop)   │ replace└───────────────────┘           │
//! └──────────────────┘                                        │
//! ┌──────────────────┐        ┌───────────────────┐     ┌───────────┐
//! │ LeaderLock       │──────▶ │  leadership flag  │◀────│ poll loop │
//! │ (refresh loop)   │  write └───────────────────┘ read└───────────┘
//! └──────────────────┘                                        │
//!                         fetch → diff → parse+validate → fan-out
//!                                                             │
//!                                              ┌──────────────▼─┐
//!                                              │  RecordSink    │
//!                                              │ (writer tasks) │
//!                                              └────────────────┘
//! ```
//!
//! ## Cycle Flow
//!
//! 1. Sample the leadership flag (read guard held for the whole cycle)
//! 2. Fetch raw messages; a failed fetch degrades to an empty cycle
//! 3. Ask the change detector whether anything changed
//! 4. If changed, parse and validate every message under one cache read guard
//! 5. Spawn one writer task per record; drain them all (the barrier)
//! 6. Wait on (shutdown, poll interval); shutdown ends the loop
//!
//! The cache refresh and leadership refresh loops run on the same
//! cadence, independently scheduled; the snapshot and the flag are the
//! only state shared between the three loops.

use crate::cache::SharedCache;
use crate::config::SyncConfig;
use crate::detector::ChangeDetector;
use crate::error::Result;
use crate::record::Record;
use crate::traits::{CacheBuilder, InventorySource, LeaderLock, RecordSink};
use crate::validate::validate;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Events emitted by the Syncer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Engine started
    Started,

    /// A changed cycle completed; `dispatched` writers ran to completion
    CycleCompleted {
        /// Number of records dispatched this cycle
        dispatched: usize,
    },

    /// Cycle judged identical to the previous poll; nothing dispatched
    CycleUnchanged,

    /// Cycle skipped entirely: this process is not the leader
    CycleSkipped,

    /// The leadership flag flipped
    LeadershipChanged {
        /// Whether leadership is now held
        held: bool,
    },

    /// Engine stopped
    Stopped {
        /// Why the engine stopped
        reason: String,
    },
}

/// Core synchronization engine
///
/// Orchestrates the poll → diff → validate → dispatch flow and the two
/// supporting refresh loops. Runs until a termination signal (or the
/// test shutdown channel) fires, then joins every loop and releases
/// the leader lock exactly once.
///
/// ## Lifecycle
///
/// 1. Create with [`Syncer::new()`]
/// 2. Start with [`Syncer::run()`]
/// 3. Engine runs until SIGINT/SIGTERM
///
/// ## Ordering
///
/// Within one cycle, every writer task completes before the next
/// cycle's fetch begins. Across the three loops there is no ordering
/// guarantee; the cache snapshot and leadership flag are read through
/// locks rather than assumed fresh.
pub struct Syncer {
    /// Inventory source polled each cycle
    source: Box<dyn InventorySource>,

    /// Write sink; shared with the per-record writer tasks
    sink: Arc<dyn RecordSink>,

    /// Leadership primitive; shared with the refresh loop and released at shutdown
    lock: Arc<dyn LeaderLock>,

    /// Membership cache producer
    cache_builder: Box<dyn CacheBuilder>,

    /// Cadence of all three loops
    poll_interval: Duration,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<SyncEvent>,
}

impl Syncer {
    /// Create a new synchronization engine
    ///
    /// # Parameters
    ///
    /// - `source`: inventory source implementation
    /// - `sink`: write sink implementation (`Arc`: shared with writer tasks)
    /// - `lock`: leader lock implementation (`Arc`: shared with the refresh loop)
    /// - `cache_builder`: membership cache producer
    /// - `config`: engine configuration
    ///
    /// # Returns
    ///
    /// A tuple of (syncer, event_receiver) where event_receiver yields
    /// engine events
    pub fn new(
        source: Box<dyn InventorySource>,
        sink: Arc<dyn RecordSink>,
        lock: Arc<dyn LeaderLock>,
        cache_builder: Box<dyn CacheBuilder>,
        config: SyncConfig,
    ) -> Result<(Self, mpsc::Receiver<SyncEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let syncer = Self {
            source,
            sink,
            lock,
            cache_builder,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            event_tx: tx,
        };

        Ok((syncer, rx))
    }

    /// Override the loop cadence with sub-second resolution.
    ///
    /// Intended for embedding and tests; daemon configuration works in
    /// whole seconds.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Run the engine until SIGINT/SIGTERM.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: clean shutdown
    /// - `Err(Error)`: fatal startup error
    pub async fn run(self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Test-only variant of [`run`](Self::run) driven by a oneshot
    /// channel instead of process signals.
    ///
    /// **TESTING ONLY**: contract tests require controlled shutdown.
    /// Production code should use `run()`, which manages shutdown via
    /// OS signals.
    pub async fn run_with_shutdown(
        self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(
        self,
        test_shutdown: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        let Syncer {
            source,
            sink,
            lock,
            cache_builder,
            poll_interval,
            event_tx,
        } = self;

        let cache = SharedCache::new();
        let leadership = Arc::new(RwLock::new(false));

        emit(&event_tx, SyncEvent::Started);
        info!(
            source = source.source_name(),
            sink = sink.sink_name(),
            interval_secs = poll_interval.as_secs_f64(),
            "starting sync engine"
        );

        // Initial samples so the first cycle sees real state instead of
        // the not-leader / cache-unavailable defaults.
        refresh_cache(cache_builder.as_ref(), &cache).await;
        refresh_leadership(lock.as_ref(), &leadership, &event_tx).await;

        // Every loop subscribes before the signal watcher is spawned;
        // a broadcast can never be missed.
        let (shutdown_tx, _) = broadcast::channel::<()>(4);
        let cache_rx = shutdown_tx.subscribe();
        let lock_rx = shutdown_tx.subscribe();
        let poll_rx = shutdown_tx.subscribe();

        let signal_task = tokio::spawn({
            let shutdown_tx = shutdown_tx.clone();
            async move {
                match test_shutdown {
                    Some(rx) => {
                        let _ = rx.await;
                        info!("shutdown requested");
                    }
                    None => wait_for_signal().await,
                }
                let _ = shutdown_tx.send(());
            }
        });

        let cache_task = tokio::spawn(cache_refresh_loop(
            cache_builder,
            cache.clone(),
            poll_interval,
            cache_rx,
        ));
        let lock_task = tokio::spawn(leadership_refresh_loop(
            Arc::clone(&lock),
            Arc::clone(&leadership),
            event_tx.clone(),
            poll_interval,
            lock_rx,
        ));

        poll_loop(
            source,
            Arc::clone(&sink),
            cache,
            leadership,
            event_tx.clone(),
            poll_interval,
            poll_rx,
        )
        .await;

        // The poll loop only returns after the shutdown broadcast, so
        // the other loops are already draining; join them, then release
        // leadership exactly once.
        if let Err(e) = cache_task.await {
            error!("cache refresh loop failed: {}", e);
        }
        if let Err(e) = lock_task.await {
            error!("leadership refresh loop failed: {}", e);
        }
        if let Err(e) = signal_task.await {
            error!("signal watcher failed: {}", e);
        }

        if let Err(e) = lock.release().await {
            warn!(lock = lock.lock_name(), "leadership release failed: {}", e);
        }

        emit(
            &event_tx,
            SyncEvent::Stopped {
                reason: "shutdown signal".to_string(),
            },
        );
        info!("sync engine stopped");

        Ok(())
    }
}

/// The poll-and-dispatch loop: one cycle per interval while leading.
async fn poll_loop(
    source: Box<dyn InventorySource>,
    sink: Arc<dyn RecordSink>,
    cache: SharedCache,
    leadership: Arc<RwLock<bool>>,
    event_tx: mpsc::Sender<SyncEvent>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut detector = ChangeDetector::new();
    loop {
        {
            // Read guard held across fetch + dispatch + barrier: a
            // leadership flip cannot interleave mid-cycle.
            let leading = leadership.read().await;
            if *leading {
                run_cycle(source.as_ref(), &sink, &cache, &mut detector, &event_tx).await;
            } else {
                debug!("not leader, skipping cycle");
                emit(&event_tx, SyncEvent::CycleSkipped);
            }
        }

        tokio::select! {
            _ = shutdown.recv() => {
                debug!("poll loop stopping");
                return;
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

/// One full cycle: fetch → diff → parse+validate → fan-out → barrier.
async fn run_cycle(
    source: &dyn InventorySource,
    sink: &Arc<dyn RecordSink>,
    cache: &SharedCache,
    detector: &mut ChangeDetector,
    event_tx: &mpsc::Sender<SyncEvent>,
) {
    let messages = match source.fetch().await {
        Ok(messages) => messages,
        Err(e) => {
            warn!(source = source.source_name(), "inventory fetch failed: {}", e);
            Vec::new()
        }
    };

    if !detector.observe(&messages) {
        debug!("nothing changed, skipping update");
        emit(event_tx, SyncEvent::CycleUnchanged);
        return;
    }

    let records: Vec<Record> = {
        let snapshot = cache.read().await;
        messages
            .iter()
            .filter_map(|message| Record::parse(message))
            .filter(|record| validate(record, &snapshot))
            .collect()
    };

    let dispatched = records.len();
    let mut writers = JoinSet::new();
    for record in records {
        let sink = Arc::clone(sink);
        writers.spawn(async move {
            if let Err(e) = sink.write(record).await {
                warn!(sink = sink.sink_name(), "record write failed: {}", e);
            }
        });
    }

    // Barrier: every writer of this cycle completes before the next
    // cycle's fetch can begin.
    while let Some(result) = writers.join_next().await {
        if let Err(e) = result {
            error!("writer task failed: {}", e);
        }
    }

    debug!(dispatched, "cycle completed");
    emit(event_tx, SyncEvent::CycleCompleted { dispatched });
}

/// Rebuild the membership cache once; on failure keep the last known
/// sets but raise the unavailable flag so validation fails open.
async fn refresh_cache(builder: &dyn CacheBuilder, cache: &SharedCache) {
    match builder.build().await {
        Ok(snapshot) => cache.replace(snapshot).await,
        Err(e) => {
            warn!(
                builder = builder.builder_name(),
                "cache refresh failed, membership checks fail open: {}", e
            );
            let stale = cache.snapshot().await.into_unavailable();
            cache.replace(stale).await;
        }
    }
}

/// Re-evaluate the leader lock once and store the outcome.
async fn refresh_leadership(
    lock: &dyn LeaderLock,
    leadership: &RwLock<bool>,
    event_tx: &mpsc::Sender<SyncEvent>,
) {
    let held = match lock.acquire().await {
        Ok(held) => held,
        Err(e) => {
            warn!(lock = lock.lock_name(), "leadership check failed: {}", e);
            false
        }
    };

    let mut flag = leadership.write().await;
    if *flag != held {
        info!(held, "leadership changed");
        emit(event_tx, SyncEvent::LeadershipChanged { held });
    }
    *flag = held;
}

/// Periodic cache refresh, same cadence as the poll loop.
async fn cache_refresh_loop(
    builder: Box<dyn CacheBuilder>,
    cache: SharedCache,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                debug!("cache refresh loop stopping");
                return;
            }
            _ = tokio::time::sleep(interval) => {}
        }
        refresh_cache(builder.as_ref(), &cache).await;
    }
}

/// Periodic leadership refresh, same cadence as the poll loop.
async fn leadership_refresh_loop(
    lock: Arc<dyn LeaderLock>,
    leadership: Arc<RwLock<bool>>,
    event_tx: mpsc::Sender<SyncEvent>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                debug!("leadership refresh loop stopping");
                return;
            }
            _ = tokio::time::sleep(interval) => {}
        }
        refresh_leadership(lock.as_ref(), &leadership, &event_tx).await;
    }
}

/// Send an event without ever blocking a cycle; a full (or closed)
/// channel drops the event with a warning.
fn emit(event_tx: &mpsc::Sender<SyncEvent>, event: SyncEvent) {
    if event_tx.try_send(event).is_err() {
        warn!("event channel full or closed, dropping event");
    }
}

/// Block until SIGTERM or SIGINT.
#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => info!("SIGTERM received"),
                _ = sigint.recv() => info!("SIGINT received"),
            }
        }
        _ => {
            error!("failed to install unix signal handlers, falling back to ctrl-c");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

/// Block until ctrl-c (non-unix fallback).
#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
