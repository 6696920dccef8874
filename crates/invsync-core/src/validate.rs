//! Record validation against the membership cache
//!
//! A candidate [`Record`] passes only when all four checks pass: value
//! shape, service naming, datacenter membership, node membership. The
//! membership checks fail open: when the cache snapshot is marked
//! unavailable, any datacenter/node is accepted rather than blocking
//! every write on a cache outage.
//!
//! Validation is a pure function of the record and the snapshot; it
//! never logs and never mutates.

use crate::cache::CacheSnapshot;
use crate::record::Record;
use std::net::IpAddr;

/// Validate one candidate record against a cache snapshot.
pub fn validate(record: &Record, cache: &CacheSnapshot) -> bool {
    value_ok(&record.value)
        && service_ok(&record.service)
        && datacenter_ok(&record.datacenter, cache)
        && node_ok(&record.datacenter, &record.node, cache)
}

/// Value check: `$NAME$` placeholder, CIDR block, or any opaque string
/// that is not a bare IP literal. Bare IPs without a prefix are the
/// only rejected form.
fn value_ok(value: &str) -> bool {
    if value.starts_with('$') && value.ends_with('$') {
        return true;
    }
    if parse_cidr(value) {
        return true;
    }
    value.parse::<IpAddr>().is_err()
}

/// Service check: at least three `_`-separated segments, a `tcp`/`udp`
/// protocol segment, and a port strictly inside (0, 65535). An empty
/// service string fails the split and is rejected.
fn service_ok(service: &str) -> bool {
    if service.is_empty() {
        return false;
    }
    let segments: Vec<&str> = service.split('_').collect();
    if segments.len() < 3 {
        return false;
    }
    let protocol = segments[segments.len() - 2];
    if protocol != "tcp" && protocol != "udp" {
        return false;
    }
    match segments[segments.len() - 1].parse::<i64>() {
        Ok(port) => port > 0 && port < 65535,
        Err(_) => false,
    }
}

/// Datacenter check: vacuous when empty; otherwise membership in the
/// snapshot's datacenter set, or fail-open when the cache is unavailable.
fn datacenter_ok(datacenter: &str, cache: &CacheSnapshot) -> bool {
    if datacenter.is_empty() {
        return true;
    }
    cache.datacenters.contains(datacenter) || cache.unavailable
}

/// Node check: vacuous when empty; otherwise membership of the
/// `datacenter@node` key in the snapshot's node set, or fail-open.
fn node_ok(datacenter: &str, node: &str, cache: &CacheSnapshot) -> bool {
    if node.is_empty() {
        return true;
    }
    cache.nodes.contains(&CacheSnapshot::node_key(datacenter, node)) || cache.unavailable
}

/// Minimal CIDR check: `addr/prefix` where the address parses as an IP
/// and the prefix length fits the address family.
fn parse_cidr(value: &str) -> bool {
    let Some((addr, prefix)) = value.split_once('/') else {
        return false;
    };
    let Ok(addr) = addr.parse::<IpAddr>() else {
        return false;
    };
    let Ok(prefix) = prefix.parse::<u8>() else {
        return false;
    };
    match addr {
        IpAddr::V4(_) => prefix <= 32,
        IpAddr::V6(_) => prefix <= 128,
    }
}
