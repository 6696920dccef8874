//! Contract Test: Leadership Gate
//!
//! Writes are gated on the leadership flag: a non-leader performs no
//! externally visible work at all: no fetch, no dispatch.
//!
//! Constraints verified:
//! - A follower never fetches and never writes
//! - A leader fetches, validates, and dispatches
//! - The leader lock is released exactly once on shutdown

mod common;

use common::*;
use invsync_core::StaticLock;
use std::sync::Arc;

#[tokio::test]
async fn follower_skips_fetch_and_dispatch_entirely() {
    let source = Arc::new(ScriptedSource::steady(vec!["web_tcp_80@dc1@$X$"]));
    let sink = Arc::new(CountingSink::new());
    let lock = Arc::new(StaticLock::follower());

    let (syncer, mut events) = test_syncer(
        Box::new(SourceHandle(Arc::clone(&source))),
        sink.clone(),
        lock.clone(),
        Box::new(FixedCacheBuilder::new(&["dc1"], &[])),
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let handle = tokio::spawn(syncer.run_with_shutdown(Some(shutdown_rx)));

    wait_for_cycles(&mut events, 3).await;
    shutdown_tx.send(()).unwrap();
    handle.await.unwrap().unwrap();

    assert_eq!(source.fetch_calls(), 0, "follower must never fetch");
    assert_eq!(sink.write_calls(), 0, "follower must never write");
}

#[tokio::test]
async fn leader_dispatches_validated_records() {
    let source = Arc::new(ScriptedSource::steady(vec![
        "web_tcp_80@dc1@$X$", // valid
        "badsvc@1.2.3.4",     // service and value both invalid
        "no-separator",       // unparsable
    ]));
    let sink = Arc::new(CountingSink::new());
    let lock = Arc::new(StaticLock::leader());

    let (syncer, mut events) = test_syncer(
        Box::new(SourceHandle(Arc::clone(&source))),
        sink.clone(),
        lock.clone(),
        Box::new(FixedCacheBuilder::new(&["dc1"], &[])),
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let handle = tokio::spawn(syncer.run_with_shutdown(Some(shutdown_rx)));

    wait_for_cycles(&mut events, 2).await;
    shutdown_tx.send(()).unwrap();
    handle.await.unwrap().unwrap();

    assert!(source.fetch_calls() >= 1, "leader fetches every cycle");
    let records = sink.records();
    assert_eq!(records.len(), 1, "only the valid record is dispatched");
    assert_eq!(records[0].service, "web_tcp_80");
    assert_eq!(records[0].datacenter, "dc1");
}

#[tokio::test]
async fn lock_released_exactly_once_on_shutdown() {
    let sink = Arc::new(CountingSink::new());
    let lock = Arc::new(StaticLock::leader());

    let (syncer, mut events) = test_syncer(
        Box::new(ScriptedSource::steady(vec![])),
        sink.clone(),
        lock.clone(),
        Box::new(FixedCacheBuilder::new(&[], &[])),
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let handle = tokio::spawn(syncer.run_with_shutdown(Some(shutdown_rx)));

    wait_for_cycles(&mut events, 2).await;
    shutdown_tx.send(()).unwrap();
    handle.await.unwrap().unwrap();

    assert_eq!(lock.release_calls(), 1, "release is called exactly once");
}
