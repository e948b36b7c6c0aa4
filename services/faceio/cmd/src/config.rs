//! Node configuration.
//!
//! Settings persist outside this process in a small YAML document; the
//! only field the transport core depends on is the active LoRa plan
//! name. A missing file or field falls back to defaults, and
//! environment variables override both.

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::Path;
use tracing::{info, warn};

/// Node configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Active LoRa frequency-plan name.
    pub lora_plan: String,
    /// IP multicast settings.
    pub multicast: MulticastConfig,
}

/// Multicast group settings for the UDP face.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MulticastConfig {
    /// Group address to join.
    pub group: Ipv4Addr,
    /// Group port.
    pub port: u16,
}

impl Default for MulticastConfig {
    fn default() -> Self {
        Self {
            group: Ipv4Addr::new(239, 5, 5, 8),
            port: 5008,
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            lora_plan: faceio_faces::DEFAULT_PLAN.to_string(),
            multicast: MulticastConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Load configuration from `config_path`, falling back to defaults
    /// when the file is absent or unparsable, then apply environment
    /// overrides.
    pub fn load_from_file<P: AsRef<Path>>(config_path: P) -> Self {
        let mut config = match std::fs::read_to_string(&config_path) {
            Ok(content) => match serde_yaml::from_str::<NodeConfig>(&content) {
                Ok(config) => {
                    info!("loaded configuration from {:?}", config_path.as_ref());
                    config
                }
                Err(e) => {
                    warn!(
                        "failed to parse config file {:?} ({e}), using defaults",
                        config_path.as_ref()
                    );
                    NodeConfig::default()
                }
            },
            Err(_) => {
                warn!(
                    "config file {:?} not found, using defaults",
                    config_path.as_ref()
                );
                NodeConfig::default()
            }
        };

        config.apply_environment_overrides();
        info!(
            lora_plan = %config.lora_plan,
            mcast_group = %config.multicast.group,
            mcast_port = config.multicast.port,
            "final node configuration"
        );
        config
    }

    fn apply_environment_overrides(&mut self) {
        if let Ok(plan) = std::env::var("FACEIO_LORA_PLAN") {
            info!("lora plan overridden by environment: {plan}");
            self.lora_plan = plan;
        }
        if let Ok(group) = std::env::var("FACEIO_MCAST_GROUP") {
            match group.parse() {
                Ok(addr) => self.multicast.group = addr,
                Err(_) => warn!("ignoring invalid FACEIO_MCAST_GROUP: {group}"),
            }
        }
        if let Ok(port) = std::env::var("FACEIO_MCAST_PORT") {
            match port.parse() {
                Ok(port) => self.multicast.port = port,
                Err(_) => warn!("ignoring invalid FACEIO_MCAST_PORT: {port}"),
            }
        }
    }
}
