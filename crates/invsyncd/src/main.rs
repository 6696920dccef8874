// # invsyncd - Inventory Synchronization Daemon
//
// The invsyncd daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing the runtime and tracing
// 3. Wiring the HTTP inventory source, sink, lock, and cache builder
// 4. Starting the sync engine
//
// All synchronization logic lives in invsync-core; this binary is a
// thin integration layer.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// - `INVSYNC_INVENTORY_URL`: inventory export endpoint (required)
// - `INVSYNC_POLL_INTERVAL_SECS`: cadence of all loops (default 30)
// - `INVSYNC_HTTP_TIMEOUT_SECS`: per-request fetch timeout (default 10)
// - `INVSYNC_DATACENTERS`: comma-separated known datacenter names
// - `INVSYNC_NODES`: comma-separated known nodes as `dc@node`
// - `INVSYNC_ASSUME_LEADER`: `true`/`false`; `false` parks the instance
//   as a permanent follower (default true, single-instance mode)
// - `INVSYNC_LOG_LEVEL`: trace|debug|info|warn|error (default info)
//
// ## Example
//
// ```bash
// export INVSYNC_INVENTORY_URL=https://inventory.internal/v1/export
// export INVSYNC_POLL_INTERVAL_SECS=30
// export INVSYNC_DATACENTERS=dc1,dc2
// export INVSYNC_NODES=dc1@node1,dc1@node2,dc2@node1
//
// invsyncd
// ```
//
// Deployments with a real distributed lock or a live membership feed
// embed invsync-core directly and supply their own `LeaderLock` /
// `CacheBuilder` implementations.

use anyhow::Result;
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use invsync_core::{LogSink, StaticCacheBuilder, StaticLock, SyncConfig, Syncer};
use invsync_source_http::HttpInventorySource;

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum SyncdExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<SyncdExitCode> for ExitCode {
    fn from(code: SyncdExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    inventory_url: String,
    poll_interval_secs: u64,
    http_timeout_secs: u64,
    datacenters: Vec<String>,
    nodes: Vec<String>,
    assume_leader: bool,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            inventory_url: env::var("INVSYNC_INVENTORY_URL").unwrap_or_default(),
            poll_interval_secs: env::var("INVSYNC_POLL_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            http_timeout_secs: env::var("INVSYNC_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            datacenters: comma_list(env::var("INVSYNC_DATACENTERS").unwrap_or_default()),
            nodes: comma_list(env::var("INVSYNC_NODES").unwrap_or_default()),
            assume_leader: env::var("INVSYNC_ASSUME_LEADER")
                .ok()
                .map(|s| s.to_lowercase() != "false")
                .unwrap_or(true),
            log_level: env::var("INVSYNC_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.inventory_url.is_empty() {
            anyhow::bail!(
                "INVSYNC_INVENTORY_URL is required. \
                Set it via: export INVSYNC_INVENTORY_URL=https://inventory.internal/v1/export"
            );
        }

        if !self.inventory_url.starts_with("https://") && !self.inventory_url.starts_with("http://")
        {
            anyhow::bail!(
                "INVSYNC_INVENTORY_URL must use HTTP or HTTPS scheme. Got: {}",
                self.inventory_url
            );
        }

        if !(1..=3600).contains(&self.poll_interval_secs) {
            anyhow::bail!(
                "INVSYNC_POLL_INTERVAL_SECS must be between 1 and 3600 seconds. Got: {}",
                self.poll_interval_secs
            );
        }

        if !(1..=300).contains(&self.http_timeout_secs) {
            anyhow::bail!(
                "INVSYNC_HTTP_TIMEOUT_SECS must be between 1 and 300 seconds. Got: {}",
                self.http_timeout_secs
            );
        }

        for node in &self.nodes {
            if !node.contains('@') {
                anyhow::bail!(
                    "INVSYNC_NODES entries must be of the form dc@node. Got: '{}'",
                    node
                );
            }
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "INVSYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }
}

/// Split a comma-separated env value into trimmed, non-empty items
fn comma_list(raw: String) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return SyncdExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return SyncdExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return SyncdExitCode::ConfigError.into();
    }

    info!("Starting invsyncd daemon");
    info!(
        "Inventory: {} (every {}s)",
        config.inventory_url, config.poll_interval_secs
    );

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return SyncdExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {}", e);
            SyncdExitCode::RuntimeError
        } else {
            SyncdExitCode::CleanShutdown
        }
    })
    .into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let source = Box::new(HttpInventorySource::with_timeout(
        config.inventory_url.clone(),
        Duration::from_secs(config.http_timeout_secs),
    ));

    // The daemon ships a dry-run sink; real write paths embed the
    // library and implement RecordSink.
    let sink = Arc::new(LogSink::new());

    let lock = Arc::new(if config.assume_leader {
        StaticLock::leader()
    } else {
        StaticLock::follower()
    });
    if !config.assume_leader {
        info!("INVSYNC_ASSUME_LEADER=false: running as a permanent follower");
    }

    let cache_builder = Box::new(StaticCacheBuilder::new(
        config.datacenters.clone(),
        config.nodes.clone(),
    ));
    info!(
        "Membership cache: {} datacenter(s), {} node(s)",
        config.datacenters.len(),
        config.nodes.len()
    );

    let sync_config = SyncConfig {
        poll_interval_secs: config.poll_interval_secs,
        ..SyncConfig::default()
    };

    let (syncer, mut events) = Syncer::new(source, sink, lock, cache_builder, sync_config)?;

    // Drain engine events into the log
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            tracing::debug!(?event, "engine event");
        }
    });

    syncer.run().await?;
    Ok(())
}
