// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! UAVTalk UDP Relay
//!
//! Relays UAVTalk frames between a ground control station and a flight
//! controller, validating every frame and keeping the latest value of each
//! registered object.
//!
//! # Features
//!
//! - **Frame Validation**: sync, length and CRC-8 checks before forwarding
//! - **Object Tracking**: latest payload per object instance
//! - **Peer Discovery**: peer addresses learned from their traffic
//! - **Statistics**: per-peer counters and rates
//!
//! # Quick Start
//!
//! ```bash
//! # Relay with learned peers
//! uavtalk-relay --definitions ./uavobjectdefinition
//!
//! # Fixed flight controller address
//! uavtalk-relay --definitions ./defs --fc-address 192.168.4.1:9000
//!
//! # Using config file
//! uavtalk-relay --config relay.toml
//! ```
//!
//! # Configuration File
//!
//! ```toml
//! name = "bench-relay"
//! gcs_listen = "0.0.0.0:9000"
//! fc_listen = "0.0.0.0:9001"
//! fc_address = "192.168.4.1:9000"
//! definitions = "/usr/share/uavobjects"
//!
//! [hashing]
//! field_order = "ascending"
//! flag_mapping = "direct"
//! ```

pub mod config;
pub mod engine;
pub mod peer;
pub mod relay;
pub mod stats;

pub use config::{ConfigError, RelayConfig};
pub use engine::{Outcome, RelayEngine};
pub use peer::{Peer, PeerLink, PeerState};
pub use relay::{load_registry, Relay, RelayError, RelayHandle};
pub use stats::{LinkStats, LinkStatsSnapshot, RelayStats};
