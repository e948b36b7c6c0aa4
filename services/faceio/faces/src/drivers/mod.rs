//! Per-medium driver implementations, selected at build time.

#[cfg(feature = "ble")]
pub mod ble;
#[cfg(feature = "bt")]
pub mod bt;
#[cfg(feature = "lora")]
pub mod lora;
#[cfg(feature = "udp")]
pub mod udp;
