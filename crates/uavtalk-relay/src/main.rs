// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! UAVTalk Relay CLI
//!
//! Command-line tool relaying UAVTalk telemetry between a GCS and a flight
//! controller over UDP.
//!
//! # Usage
//!
//! ```bash
//! # Default ports, learned peers
//! uavtalk-relay --definitions ./uavobjectdefinition
//!
//! # Fixed GCS and flight controller addresses
//! uavtalk-relay --definitions ./defs --gcs-address 10.0.0.5:9000 --fc-address 192.168.4.1:9000
//!
//! # Fixed flight controller, drop unregistered objects
//! uavtalk-relay --definitions ./defs --fc-address 192.168.4.1:9000 --drop-unknown
//!
//! # Using configuration file
//! uavtalk-relay --config relay.toml
//!
//! # Print computed object ids
//! uavtalk-relay --definitions ./defs ids
//! ```

use clap::{Parser, Subcommand};
use parking_lot::RwLock;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use uavtalk_relay::{load_registry, LinkStatsSnapshot, Relay, RelayConfig, RelayError};

/// UAVTalk GCS <-> flight controller relay
#[derive(Parser, Debug)]
#[command(name = "uavtalk-relay")]
#[command(about = "UAVTalk Relay - validate and forward telemetry between GCS and flight controller")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Local address the GCS sends to
    #[arg(long, conflicts_with = "config")]
    gcs_listen: Option<SocketAddr>,

    /// Local address the flight controller sends to
    #[arg(long, conflicts_with = "config")]
    fc_listen: Option<SocketAddr>,

    /// Fixed GCS address (learned when omitted)
    #[arg(long, conflicts_with = "config")]
    gcs_address: Option<SocketAddr>,

    /// Fixed flight controller address (learned when omitted)
    #[arg(long, conflicts_with = "config")]
    fc_address: Option<SocketAddr>,

    /// Directory of XML object definitions
    #[arg(short, long, conflicts_with = "config")]
    definitions: Option<PathBuf>,

    /// Drop frames whose object id is not registered
    #[arg(long, conflicts_with = "config")]
    drop_unknown: bool,

    /// Statistics reporting interval (seconds, 0 to disable)
    #[arg(long)]
    stats_interval: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate example configuration file
    GenConfig {
        /// Output file path
        #[arg(short, long, default_value = "relay.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file path
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Print the identifier computed for every definition
    Ids,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Build configuration
    let config = build_config(&args)?;

    // Initialize logging
    let filter =
        EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Handle subcommands
    if let Some(cmd) = args.command {
        return match cmd {
            Commands::GenConfig { output } => cmd_gen_config(output),
            Commands::Validate { config } => cmd_validate(config),
            Commands::Ids => cmd_ids(&config),
        };
    }

    // Definitions are registered before any socket is bound.
    let (registry, report) = load_registry(&config)?;
    if registry.is_empty() {
        tracing::warn!(
            "No object definitions loaded from {}; every frame is unknown",
            config.definitions.display()
        );
    }
    let registry = Arc::new(RwLock::new(registry));

    let relay = Relay::bind(config.clone(), registry).await?;

    println!("UAVTalk Relay v{}", env!("CARGO_PKG_VERSION"));
    println!("=====================================");
    println!();
    println!(
        "Definitions: {} objects from {} ({} skipped)",
        report.registered.len(),
        config.definitions.display(),
        report.failed.len()
    );
    println!("GCS socket:  {}", relay.local_addr(uavtalk_relay::Peer::Gcs)?);
    println!("FC socket:   {}", relay.local_addr(uavtalk_relay::Peer::Fc)?);
    println!("GCS address: {}", format_peer(config.gcs_address));
    println!("FC address:  {}", format_peer(config.fc_address));
    println!();
    println!("Press Ctrl+C to stop...");
    println!();

    let handle = relay.handle();
    let mut relay_task = tokio::spawn(relay.run());

    // Stats reporting task
    let stats_interval = config.stats_interval_secs;
    let stats_handle = handle.clone();
    if stats_interval > 0 {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(stats_interval));
            interval.tick().await;
            loop {
                interval.tick().await;
                if !stats_handle.is_running() {
                    break;
                }
                print_stats(&stats_handle.stats());
            }
        });
    }

    // Wait for Ctrl+C or a fatal relay error
    let result = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            println!("\nShutting down...");
            handle.stop();
            relay_task.await?
        }
        joined = &mut relay_task => joined?,
    };

    println!("\nFinal Statistics:");
    print_stats(&handle.stats());

    result.map_err(Into::into)
}

fn build_config(args: &Args) -> Result<RelayConfig, RelayError> {
    let mut config = match args.config {
        Some(ref config_path) => RelayConfig::from_file(config_path)?,
        None => {
            let mut config = RelayConfig::default();
            if let Some(addr) = args.gcs_listen {
                config.gcs_listen = addr;
            }
            if let Some(addr) = args.fc_listen {
                config.fc_listen = addr;
            }
            if let Some(ref dir) = args.definitions {
                config.definitions = dir.clone();
            }
            config.gcs_address = args.gcs_address;
            config.fc_address = args.fc_address;
            config.forward_unknown = !args.drop_unknown;
            config
        }
    };

    if let Some(secs) = args.stats_interval {
        config.stats_interval_secs = secs;
    }
    if let Some(ref level) = args.log_level {
        config.log_level = level.clone();
    }

    config.validate()?;
    Ok(config)
}

fn cmd_gen_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = RelayConfig {
        name: "example-relay".into(),
        fc_address: Some(SocketAddr::from(([192, 168, 4, 1], 9000))),
        definitions: PathBuf::from("/usr/share/uavobjects"),
        ..Default::default()
    };

    let toml_str = toml::to_string_pretty(&config)?;

    // Add comments
    let content = format!(
        r#"# UAVTalk Relay Configuration
# Generated by uavtalk-relay gen-config
#
# Remove fc_address to learn the flight controller address from its traffic.
# [hashing] must match the firmware: field_order = "ascending" | "descending",
# flag_mapping = "direct" | "swapped".

{}
"#,
        toml_str
    );

    std::fs::write(&output, content)?;
    println!("Generated configuration file: {}", output.display());
    Ok(())
}

fn cmd_validate(config_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    match RelayConfig::from_file(&config_path) {
        Ok(config) => {
            println!("Configuration valid!");
            println!();
            println!("Relay: {}", config.name);
            println!("GCS listen: {}", config.gcs_listen);
            println!("FC listen: {}", config.fc_listen);
            println!("GCS address: {}", format_peer(config.gcs_address));
            println!("FC address: {}", format_peer(config.fc_address));
            println!("Definitions: {}", config.definitions.display());
            println!(
                "Unknown objects: {}",
                if config.forward_unknown {
                    "forwarded"
                } else {
                    "dropped"
                }
            );
            println!(
                "Hashing: {:?} field order, {:?} flags",
                config.hashing.field_order, config.hashing.flag_mapping
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("Configuration invalid: {}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_ids(config: &RelayConfig) -> Result<(), Box<dyn std::error::Error>> {
    let (registry, report) = load_registry(config)?;

    println!("{:<10}  {:<4}  {:>5}  NAME", "ID", "KIND", "BYTES");
    for schema in registry.schemas() {
        println!(
            "0x{:08X}  {:<4}  {:>5}  {}",
            schema.identifier(),
            if schema.is_settings() { "set" } else { "data" },
            schema.payload_size(),
            schema.name()
        );
    }

    for (path, err) in &report.failed {
        eprintln!("skipped {}: {}", path.display(), err);
    }
    Ok(())
}

fn print_stats(stats: &[LinkStatsSnapshot]) {
    println!("--- Relay Statistics ---");
    for stat in stats {
        println!(
            "  {} -> {}: {} frames ({:.1} frame/s), {}, {} rejected, {} unknown, {} undeliverable{}",
            stat.peer,
            stat.peer.opposite(),
            stat.forwarded,
            stat.frames_per_second(),
            format_bytes(stat.bytes_forwarded),
            stat.rejected_total(),
            stat.unknown_objects,
            stat.undeliverable,
            if stat.connected { "" } else { " (not connected)" }
        );
    }
}

fn format_peer(addr: Option<SocketAddr>) -> String {
    addr.map_or_else(|| "learned".to_string(), |a| a.to_string())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
