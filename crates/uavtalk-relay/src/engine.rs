// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-datagram relay pipeline.
//!
//! The engine decides what happens to each datagram; it performs no I/O.
//! [`crate::Relay`] owns the sockets and carries out the decision.

use crate::config::RelayConfig;
use crate::peer::{Peer, PeerLink};
use crate::stats::RelayStats;
use lru::LruCache;
use parking_lot::RwLock;
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::SystemTime;
use uavtalk::{decode_frame, Frame, FrameType, ObjectKind, RejectReason, SchemaRegistry};

/// Unknown object ids remembered for first-seen logging.
pub const UNKNOWN_ID_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1024) {
    Some(n) => n,
    None => panic!("capacity must be non-zero"),
};

/// Decision for one datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Not a valid frame; dropped.
    Rejected(RejectReason),

    /// Unregistered object dropped because unknown forwarding is disabled.
    Filtered { object_id: u32 },

    /// The opposite peer has no known address yet; dropped.
    Undeliverable { to: Peer },

    /// Send the original datagram, unchanged, to `destination`.
    Forward {
        to: Peer,
        destination: SocketAddr,
        /// Whether the object id resolved in the registry.
        recognized: bool,
    },
}

/// Relay state machine for one GCS/FC pair.
#[derive(Debug)]
pub struct RelayEngine {
    registry: Arc<RwLock<SchemaRegistry>>,
    gcs: PeerLink,
    fc: PeerLink,
    forward_unknown: bool,
    unknown_seen: LruCache<u32, ()>,
    stats: Arc<RelayStats>,
}

impl RelayEngine {
    /// Engine learning both peer addresses, forwarding unknown objects.
    pub fn new(registry: Arc<RwLock<SchemaRegistry>>) -> Self {
        Self {
            registry,
            gcs: PeerLink::new(Peer::Gcs),
            fc: PeerLink::new(Peer::Fc),
            forward_unknown: true,
            unknown_seen: LruCache::new(UNKNOWN_ID_CAPACITY),
            stats: Arc::new(RelayStats::new()),
        }
    }

    /// Create an engine from configuration.
    pub fn from_config(config: &RelayConfig, registry: Arc<RwLock<SchemaRegistry>>) -> Self {
        let mut engine = Self::new(registry).forward_unknown(config.forward_unknown);
        if let Some(addr) = config.gcs_address {
            engine.gcs = PeerLink::pinned(Peer::Gcs, addr);
        }
        if let Some(addr) = config.fc_address {
            engine.fc = PeerLink::pinned(Peer::Fc, addr);
        }
        engine
    }

    /// Set the unknown-object forwarding policy.
    pub fn forward_unknown(mut self, enabled: bool) -> Self {
        self.forward_unknown = enabled;
        self
    }

    /// Pin a peer's address.
    pub fn with_address(mut self, peer: Peer, address: SocketAddr) -> Self {
        *self.link_mut(peer) = PeerLink::pinned(peer, address);
        self
    }

    pub fn link(&self, peer: Peer) -> &PeerLink {
        match peer {
            Peer::Gcs => &self.gcs,
            Peer::Fc => &self.fc,
        }
    }

    fn link_mut(&mut self, peer: Peer) -> &mut PeerLink {
        match peer {
            Peer::Gcs => &mut self.gcs,
            Peer::Fc => &mut self.fc,
        }
    }

    pub fn registry(&self) -> &Arc<RwLock<SchemaRegistry>> {
        &self.registry
    }

    pub fn stats(&self) -> &Arc<RelayStats> {
        &self.stats
    }

    /// Number of unknown object ids currently remembered.
    ///
    /// Bounded by [`UNKNOWN_ID_CAPACITY`]; the least recently seen id is
    /// forgotten first and logs at `warn` again if it returns.
    pub fn unknown_ids_tracked(&self) -> usize {
        self.unknown_seen.len()
    }

    /// Run one datagram received from `from` through the pipeline.
    pub fn process(
        &mut self,
        from: Peer,
        source: SocketAddr,
        datagram: &[u8],
        now: SystemTime,
    ) -> Outcome {
        let stats = Arc::clone(&self.stats);
        let link_stats = stats.link(from);
        link_stats.record_received(datagram.len());

        if self.link_mut(from).observe(datagram, now) {
            link_stats.mark_connected();
            tracing::info!(peer = %from, %source, "{} connected", from);
        }

        let frame = match decode_frame(datagram) {
            Ok(frame) => frame,
            Err(reason) => {
                link_stats.record_rejected(reason);
                tracing::warn!(
                    peer = %from,
                    %source,
                    len = datagram.len(),
                    "Dropping datagram: {}",
                    reason
                );
                return Outcome::Rejected(reason);
            }
        };

        if let Some(previous) = self.link_mut(from).learn(source) {
            tracing::info!(peer = %from, %previous, %source, "{} address changed", from);
        }

        let recognized = self.update_registry(from, &frame, now);
        if !recognized {
            link_stats.record_unknown();
            if self.unknown_seen.put(frame.object_id, ()).is_none() {
                tracing::warn!(
                    peer = %from,
                    %source,
                    "UnknownObjectID 0x{:08X}",
                    frame.object_id
                );
            } else {
                tracing::debug!(peer = %from, "UnknownObjectID 0x{:08X}", frame.object_id);
            }

            if !self.forward_unknown {
                link_stats.record_filtered();
                return Outcome::Filtered {
                    object_id: frame.object_id,
                };
            }
        }

        let to = from.opposite();
        match self.link(to).address() {
            Some(destination) => Outcome::Forward {
                to,
                destination,
                recognized,
            },
            None => {
                link_stats.record_undeliverable();
                tracing::debug!(
                    peer = %from,
                    object_id = frame.object_id,
                    "No {} address yet, dropping frame",
                    to
                );
                Outcome::Undeliverable { to }
            }
        }
    }

    /// Resolve the frame's object and cache its payload.
    ///
    /// Returns `false` when the object id is not registered.
    fn update_registry(&self, from: Peer, frame: &Frame, now: SystemTime) -> bool {
        let mut registry = self.registry.write();

        let (expected, single_instance) = match registry.resolve(frame.object_id) {
            None => return false,
            Some((_, ObjectKind::Metadata)) => return true,
            Some((schema, ObjectKind::Data)) => {
                (schema.payload_size(), schema.is_single_instance())
            }
        };

        // Requests, acks and nacks carry no object data.
        let carries_data = matches!(
            frame.message_type(),
            Some(FrameType::Object) | Some(FrameType::ObjectAck)
        );
        if !carries_data {
            return true;
        }

        if frame.data.len() != expected {
            tracing::debug!(
                peer = %from,
                "Object 0x{:08X} payload is {} bytes, schema expects {}",
                frame.object_id,
                frame.data.len(),
                expected
            );
        }

        // Resolved above under the same write guard.
        let recorded =
            registry.record_instance_data(frame.object_id, frame.instance_id, &frame.data, now);
        debug_assert!(recorded.is_ok());

        tracing::trace!(
            peer = %from,
            object_id = frame.object_id,
            instance = if single_instance { 0 } else { frame.instance_id },
            "Cached {} bytes",
            frame.data.len()
        );

        true
    }
}
