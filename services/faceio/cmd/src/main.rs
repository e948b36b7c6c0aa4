//! Face multiplexing node binary.
//!
//! Brings up one face per compiled-in medium, then drives the single
//! cooperative loop: poll every face, drain every receive ring through
//! validation into the dispatcher, and periodically announce and report
//! per-face counters. Nothing in the loop blocks; the tick only paces
//! the iteration.

use anyhow::{bail, Context, Result};
use clap::Parser;
use faceio_faces::FaceRegistry;
use faceio_wire::{Dispatcher, PacketDigest, DMX_LEN};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "lora")]
use faceio_faces::drivers::lora::{LoraDriver, LoraRadio};
#[cfg(feature = "lora")]
use faceio_faces::{ConfigError, FaceError, RadioProfile};
#[cfg(feature = "udp")]
use faceio_faces::drivers::udp::UdpDriver;

mod config;
mod logging;

use config::NodeConfig;
use logging::FaceLogFormatter;

/// Face multiplexing node for the mesh messaging stack
#[derive(Parser, Debug)]
#[command(name = "faceio", version, about = "Face multiplexing node")]
struct Args {
    /// Path to the node configuration file
    #[arg(long, default_value = "faceio.yaml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Override the configured LoRa frequency plan
    #[arg(long)]
    lora_plan: Option<String>,

    /// Main loop tick, e.g. 10ms
    #[arg(long, default_value = "10ms")]
    tick: humantime::Duration,

    /// Per-face counter report interval, e.g. 60s
    #[arg(long, default_value = "60s")]
    stats_interval: humantime::Duration,

    /// Broadcast a small announce packet at this interval, e.g. 5s
    #[arg(long)]
    announce_interval: Option<humantime::Duration>,
}

/// Stand-in for the identifier-table dispatcher: accepts every packet
/// and logs what arrived. The real dispatcher lives a layer above and
/// plugs into the same trait.
#[derive(Default)]
struct LogDispatcher {
    accepted: u64,
}

impl Dispatcher for LogDispatcher {
    fn on_rx(&mut self, packet: &[u8], digest: &PacketDigest, face: &str) -> bool {
        self.accepted += 1;
        info!(
            face,
            len = packet.len(),
            dmx = %hex::encode(&packet[..DMX_LEN]),
            %digest,
            "packet accepted"
        );
        true
    }
}

/// Host-build radio backend: transmissions are logged and dropped, the
/// receive side stays silent. Keeps the LoRa face, its profile
/// handling, and its config path exercised on machines without the
/// radio attached.
#[cfg(feature = "lora")]
#[derive(Default)]
struct DevRadio {
    profile: Option<&'static str>,
}

#[cfg(feature = "lora")]
impl LoraRadio for DevRadio {
    fn transmit(&mut self, frame: &[u8]) -> Result<(), FaceError> {
        tracing::debug!(len = frame.len(), "dev radio tx (discarded)");
        Ok(())
    }

    fn try_receive(&mut self, _buf: &mut [u8]) -> Option<usize> {
        None
    }

    fn apply_profile(&mut self, profile: &RadioProfile) -> Result<(), ConfigError> {
        self.profile = Some(profile.plan);
        Ok(())
    }

    fn set_frequency(&mut self, _hz: u32) -> Result<(), ConfigError> {
        Ok(())
    }

    fn set_tx_power(&mut self, _dbm: i8) -> Result<(), ConfigError> {
        Ok(())
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level.clone()));
    tracing_subscriber::fmt()
        .event_format(FaceLogFormatter::new())
        .with_env_filter(filter)
        .init();

    let config = NodeConfig::load_from_file(&args.config);
    let mut registry = FaceRegistry::new();

    #[cfg(feature = "lora")]
    {
        let plan = args.lora_plan.as_deref().unwrap_or(&config.lora_plan);
        let lora = LoraDriver::new(DevRadio::default(), plan)
            .with_context(|| format!("bringing up lora face on plan {plan}"))?;
        registry.register(Box::new(lora));
    }

    #[cfg(feature = "udp")]
    {
        let udp = UdpDriver::new(config.multicast.group, config.multicast.port)
            .context("joining multicast group")?;
        registry.register(Box::new(udp));
    }

    if registry.is_empty() {
        bail!("no faces compiled in");
    }
    info!(faces = ?registry.names(), "faceio node up");

    run(registry, &args);
}

fn run(mut registry: FaceRegistry, args: &Args) -> ! {
    let mut dispatcher = LogDispatcher::default();
    let mut last_stats = Instant::now();
    let mut last_announce = Instant::now();
    let mut announce_seq: u32 = 0;

    loop {
        registry.poll_all();
        registry.drain_into(&mut dispatcher);

        if let Some(interval) = args.announce_interval {
            if last_announce.elapsed() >= *interval {
                registry.send_all(&announce_packet(announce_seq), None);
                announce_seq = announce_seq.wrapping_add(1);
                last_announce = Instant::now();
            }
        }

        if last_stats.elapsed() >= *args.stats_interval {
            for name in registry.names() {
                if let Some(stats) = registry.stats(name) {
                    info!(
                        face = name,
                        sent = stats.sent,
                        received = stats.received,
                        accepted = stats.accepted,
                        dropped = stats.dropped_short + stats.dropped_crc + stats.dropped_unknown,
                        "face counters"
                    );
                }
            }
            info!(accepted_total = dispatcher.accepted, "dispatcher counters");
            last_stats = Instant::now();
        }

        std::thread::sleep(*args.tick);
    }
}

/// Demo broadcast payload: the node's fixed announce identifier plus a
/// sequence number.
fn announce_packet(seq: u32) -> Vec<u8> {
    let mut packet = Vec::with_capacity(DMX_LEN + 12);
    packet.extend_from_slice(b"FACEANN");
    packet.extend_from_slice(b"seq=");
    packet.extend_from_slice(&seq.to_be_bytes());
    packet.extend_from_slice(&[0u8; 4]);
    packet
}
