// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! UDP relay service.
//!
//! One task services the GCS-facing and FC-facing sockets; every datagram
//! goes through the [`RelayEngine`] and is forwarded on the opposite socket.

use crate::config::{ConfigError, RelayConfig};
use crate::engine::{Outcome, RelayEngine};
use crate::peer::Peer;
use crate::stats::{LinkStatsSnapshot, RelayStats};
use parking_lot::RwLock;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::sync::watch;
use uavtalk::{LoadReport, SchemaRegistry};

/// Largest datagram accepted from either peer.
const MAX_DATAGRAM: usize = 65_535;

/// Relay errors.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to read definitions from {path}: {source}")]
    Definitions {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to bind {peer} socket on {addr}: {source}")]
    Bind {
        peer: Peer,
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("{peer} socket error: {source}")]
    Socket {
        peer: Peer,
        #[source]
        source: std::io::Error,
    },
}

/// Build the registry for `config`, loading every definition file.
pub fn load_registry(config: &RelayConfig) -> Result<(SchemaRegistry, LoadReport), RelayError> {
    let mut registry = SchemaRegistry::new(config.hashing);
    let report =
        registry
            .load_dir(&config.definitions)
            .map_err(|source| RelayError::Definitions {
                path: config.definitions.clone(),
                source,
            })?;
    Ok((registry, report))
}

/// Handle to control a running relay.
#[derive(Clone)]
pub struct RelayHandle {
    running: Arc<AtomicBool>,
    shutdown: Arc<watch::Sender<bool>>,
    stats: Arc<RelayStats>,
    registry: Arc<RwLock<SchemaRegistry>>,
}

impl RelayHandle {
    /// Check if the receive loop is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Request the relay to stop.
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }

    /// Get per-peer statistics, GCS first.
    pub fn stats(&self) -> [LinkStatsSnapshot; 2] {
        self.stats.snapshot()
    }

    /// Shared registry, for diagnostics.
    pub fn registry(&self) -> &Arc<RwLock<SchemaRegistry>> {
        &self.registry
    }
}

struct Sockets {
    gcs: UdpSocket,
    fc: UdpSocket,
}

impl Sockets {
    fn get(&self, peer: Peer) -> &UdpSocket {
        match peer {
            Peer::Gcs => &self.gcs,
            Peer::Fc => &self.fc,
        }
    }
}

/// A bound relay, ready to run.
pub struct Relay {
    name: String,
    engine: RelayEngine,
    sockets: Sockets,
    running: Arc<AtomicBool>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl Relay {
    /// Bind both sockets.
    ///
    /// `registry` should be fully populated; frames are processed against
    /// it as soon as [`Relay::run`] starts.
    pub async fn bind(
        config: RelayConfig,
        registry: Arc<RwLock<SchemaRegistry>>,
    ) -> Result<Self, RelayError> {
        config.validate()?;

        let gcs = bind_socket(Peer::Gcs, config.gcs_listen).await?;
        let fc = bind_socket(Peer::Fc, config.fc_listen).await?;
        let (shutdown, _) = watch::channel(false);

        Ok(Self {
            engine: RelayEngine::from_config(&config, registry),
            name: config.name,
            sockets: Sockets { gcs, fc },
            running: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(shutdown),
        })
    }

    /// Local address of the socket facing `peer`.
    pub fn local_addr(&self, peer: Peer) -> Result<SocketAddr, RelayError> {
        self.sockets
            .get(peer)
            .local_addr()
            .map_err(|source| RelayError::Socket { peer, source })
    }

    pub fn engine(&self) -> &RelayEngine {
        &self.engine
    }

    pub fn handle(&self) -> RelayHandle {
        RelayHandle {
            running: Arc::clone(&self.running),
            shutdown: Arc::clone(&self.shutdown),
            stats: Arc::clone(self.engine.stats()),
            registry: Arc::clone(self.engine.registry()),
        }
    }

    /// Run the receive loop until stopped or a socket fails.
    pub async fn run(self) -> Result<(), RelayError> {
        let running = Arc::clone(&self.running);
        let name = self.name.clone();

        running.store(true, Ordering::Relaxed);
        tracing::info!(
            "Relay '{}' started (GCS {}, FC {})",
            name,
            format_addr(self.local_addr(Peer::Gcs)),
            format_addr(self.local_addr(Peer::Fc)),
        );

        let result = self.serve().await;
        running.store(false, Ordering::Relaxed);

        match &result {
            Ok(()) => tracing::info!("Relay '{}' stopped", name),
            Err(e) => tracing::error!("Relay '{}' failed: {}", name, e),
        }
        result
    }

    async fn serve(self) -> Result<(), RelayError> {
        let Relay {
            mut engine,
            sockets,
            shutdown,
            ..
        } = self;

        let mut shutdown_rx = shutdown.subscribe();
        if *shutdown_rx.borrow_and_update() {
            return Ok(());
        }

        let mut gcs_buf = vec![0u8; MAX_DATAGRAM];
        let mut fc_buf = vec![0u8; MAX_DATAGRAM];

        loop {
            tokio::select! {
                received = sockets.gcs.recv_from(&mut gcs_buf) => {
                    let (len, source) = received
                        .map_err(|source| RelayError::Socket { peer: Peer::Gcs, source })?;
                    relay_datagram(&mut engine, &sockets, Peer::Gcs, source, &gcs_buf[..len]).await?;
                }
                received = sockets.fc.recv_from(&mut fc_buf) => {
                    let (len, source) = received
                        .map_err(|source| RelayError::Socket { peer: Peer::Fc, source })?;
                    relay_datagram(&mut engine, &sockets, Peer::Fc, source, &fc_buf[..len]).await?;
                }
                _ = shutdown_rx.changed() => {
                    return Ok(());
                }
            }
        }
    }
}

async fn bind_socket(peer: Peer, addr: SocketAddr) -> Result<UdpSocket, RelayError> {
    let socket = UdpSocket::bind(addr)
        .await
        .map_err(|source| RelayError::Bind { peer, addr, source })?;
    tracing::debug!("{} socket bound to {:?}", peer, socket.local_addr());
    Ok(socket)
}

async fn relay_datagram(
    engine: &mut RelayEngine,
    sockets: &Sockets,
    from: Peer,
    source: SocketAddr,
    datagram: &[u8],
) -> Result<(), RelayError> {
    if let Outcome::Forward {
        to, destination, ..
    } = engine.process(from, source, datagram, SystemTime::now())
    {
        sockets
            .get(to)
            .send_to(datagram, destination)
            .await
            .map_err(|source| RelayError::Socket { peer: to, source })?;
        engine.stats().link(from).record_forwarded(datagram.len());
    }
    Ok(())
}

fn format_addr(addr: Result<SocketAddr, RelayError>) -> String {
    addr.map_or_else(|_| "?".to_string(), |a| a.to_string())
}
