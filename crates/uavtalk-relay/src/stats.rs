// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-peer relay statistics.

use crate::peer::Peer;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;
use uavtalk::RejectReason;

/// Counters for datagrams received from one peer.
#[derive(Debug)]
pub struct LinkStats {
    /// Peer the datagrams came from.
    pub peer: Peer,

    /// Datagrams received.
    pub received: AtomicU64,

    /// Bytes received.
    pub bytes_received: AtomicU64,

    /// Datagrams forwarded to the opposite peer.
    pub forwarded: AtomicU64,

    /// Bytes forwarded.
    pub bytes_forwarded: AtomicU64,

    /// Rejected datagrams, indexed by [`RejectReason::index`].
    pub rejected: [AtomicU64; RejectReason::ALL.len()],

    /// Valid frames carrying an unregistered object id.
    pub unknown_objects: AtomicU64,

    /// Unknown objects dropped by policy.
    pub filtered: AtomicU64,

    /// Forwards dropped because the opposite address was not known yet.
    pub undeliverable: AtomicU64,

    /// Set once the peer sent its first sync byte.
    pub connected: AtomicBool,
}

impl LinkStats {
    pub fn new(peer: Peer) -> Self {
        Self {
            peer,
            received: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            forwarded: AtomicU64::new(0),
            bytes_forwarded: AtomicU64::new(0),
            rejected: Default::default(),
            unknown_objects: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
            undeliverable: AtomicU64::new(0),
            connected: AtomicBool::new(false),
        }
    }

    pub fn record_received(&self, bytes: usize) {
        self.received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_forwarded(&self, bytes: usize) {
        self.forwarded.fetch_add(1, Ordering::Relaxed);
        self.bytes_forwarded.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_rejected(&self, reason: RejectReason) {
        self.rejected[reason.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unknown(&self) {
        self.unknown_objects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_filtered(&self) {
        self.filtered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_undeliverable(&self) {
        self.undeliverable.fetch_add(1, Ordering::Relaxed);
    }

    pub fn mark_connected(&self) {
        self.connected.store(true, Ordering::Relaxed);
    }

    fn snapshot(&self, uptime_secs: u64) -> LinkStatsSnapshot {
        let mut rejected = [0u64; RejectReason::ALL.len()];
        for (slot, counter) in rejected.iter_mut().zip(&self.rejected) {
            *slot = counter.load(Ordering::Relaxed);
        }

        LinkStatsSnapshot {
            peer: self.peer,
            connected: self.connected.load(Ordering::Relaxed),
            received: self.received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            forwarded: self.forwarded.load(Ordering::Relaxed),
            bytes_forwarded: self.bytes_forwarded.load(Ordering::Relaxed),
            rejected,
            unknown_objects: self.unknown_objects.load(Ordering::Relaxed),
            filtered: self.filtered.load(Ordering::Relaxed),
            undeliverable: self.undeliverable.load(Ordering::Relaxed),
            uptime_secs,
        }
    }
}

/// Statistics for both directions of a relay.
#[derive(Debug)]
pub struct RelayStats {
    /// Datagrams coming from the ground station.
    pub gcs: LinkStats,

    /// Datagrams coming from the flight controller.
    pub fc: LinkStats,

    /// Relay creation time.
    pub created: Instant,
}

impl Default for RelayStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayStats {
    pub fn new() -> Self {
        Self {
            gcs: LinkStats::new(Peer::Gcs),
            fc: LinkStats::new(Peer::Fc),
            created: Instant::now(),
        }
    }

    /// Counters for datagrams received from `peer`.
    pub fn link(&self, peer: Peer) -> &LinkStats {
        match peer {
            Peer::Gcs => &self.gcs,
            Peer::Fc => &self.fc,
        }
    }

    /// Get snapshot of current stats, GCS first.
    pub fn snapshot(&self) -> [LinkStatsSnapshot; 2] {
        let uptime = self.created.elapsed().as_secs();
        [self.gcs.snapshot(uptime), self.fc.snapshot(uptime)]
    }
}

/// Snapshot of one peer's statistics.
#[derive(Debug, Clone)]
pub struct LinkStatsSnapshot {
    pub peer: Peer,
    pub connected: bool,
    pub received: u64,
    pub bytes_received: u64,
    pub forwarded: u64,
    pub bytes_forwarded: u64,
    pub rejected: [u64; RejectReason::ALL.len()],
    pub unknown_objects: u64,
    pub filtered: u64,
    pub undeliverable: u64,
    pub uptime_secs: u64,
}

impl LinkStatsSnapshot {
    /// Total rejected datagrams.
    pub fn rejected_total(&self) -> u64 {
        self.rejected.iter().sum()
    }

    /// Rejected datagrams for one reason.
    pub fn rejected_for(&self, reason: RejectReason) -> u64 {
        self.rejected[reason.index()]
    }

    /// Calculate forwarded frames per second.
    pub fn frames_per_second(&self) -> f64 {
        if self.uptime_secs > 0 {
            self.forwarded as f64 / self.uptime_secs as f64
        } else {
            0.0
        }
    }

    /// Calculate forwarded bytes per second.
    pub fn bytes_per_second(&self) -> f64 {
        if self.uptime_secs > 0 {
            self.bytes_forwarded as f64 / self.uptime_secs as f64
        } else {
            0.0
        }
    }
}
