// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Relay endpoints and their connection state.

use std::fmt;
use std::net::SocketAddr;
use std::time::SystemTime;
use uavtalk::frame::SYNC;

/// One side of the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Peer {
    /// Ground control station.
    Gcs,
    /// Flight controller.
    Fc,
}

impl Peer {
    /// The peer frames from `self` are forwarded to.
    pub fn opposite(self) -> Peer {
        match self {
            Peer::Gcs => Peer::Fc,
            Peer::Fc => Peer::Gcs,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Peer::Gcs => "GCS",
            Peer::Fc => "FC",
        }
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection state of one peer. Never reverts once connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeerState {
    #[default]
    Disconnected,
    Connected,
}

/// What the relay knows about one peer.
#[derive(Debug, Clone)]
pub struct PeerLink {
    peer: Peer,
    state: PeerState,
    address: Option<SocketAddr>,
    pinned: bool,
    connected_at: Option<SystemTime>,
}

impl PeerLink {
    /// A peer whose address is learned from its traffic.
    pub fn new(peer: Peer) -> Self {
        Self {
            peer,
            state: PeerState::Disconnected,
            address: None,
            pinned: false,
            connected_at: None,
        }
    }

    /// A peer with a configured address that traffic never overrides.
    pub fn pinned(peer: Peer, address: SocketAddr) -> Self {
        Self {
            address: Some(address),
            pinned: true,
            ..Self::new(peer)
        }
    }

    pub fn peer(&self) -> Peer {
        self.peer
    }

    pub fn state(&self) -> PeerState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == PeerState::Connected
    }

    /// Address frames for this peer are sent to, if known.
    pub fn address(&self) -> Option<SocketAddr> {
        self.address
    }

    pub fn connected_at(&self) -> Option<SystemTime> {
        self.connected_at
    }

    /// Track the first sync byte seen from this peer.
    ///
    /// Returns `true` on the `Disconnected -> Connected` transition only.
    pub fn observe(&mut self, datagram: &[u8], now: SystemTime) -> bool {
        if self.state == PeerState::Connected || datagram.first() != Some(&SYNC) {
            return false;
        }
        self.state = PeerState::Connected;
        self.connected_at = Some(now);
        true
    }

    /// Remember where a valid frame came from.
    ///
    /// Returns the previous address when a learned address changes.
    pub fn learn(&mut self, source: SocketAddr) -> Option<SocketAddr> {
        if self.pinned || self.address == Some(source) {
            return None;
        }
        self.address.replace(source)
    }
}
