//! Face registry, broadcast send, and per-medium transport drivers.
//!
//! A *face* is one compiled-in transport endpoint: long-range radio
//! (LoRa), IP multicast, low-energy Bluetooth, or Bluetooth serial.
//! Every face satisfies the same [`FaceDriver`] contract (synchronous
//! bounded-time `send`, non-blocking `poll`, `recv` from its own
//! receive ring), so the [`FaceRegistry`] can fan packets out and the
//! main loop can drain them all without knowing media details.
//!
//! Media are selected at build time through cargo features (`lora`,
//! `udp`, `ble`, `bt`); any subset may be compiled in, with exactly one
//! driver instance per medium. The registry itself holds trait objects,
//! so tests run against [`testing::MockFace`] regardless of features.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod drivers;
pub mod error;
pub mod face;
pub mod profiles;
pub mod registry;
pub mod testing;

pub use error::{ConfigError, FaceError};
pub use face::FaceDriver;
pub use profiles::{profile_by_plan, ConfigRequest, RadioProfile, DEFAULT_PLAN, RADIO_PROFILES};
pub use registry::{FaceRegistry, LinkStats};
