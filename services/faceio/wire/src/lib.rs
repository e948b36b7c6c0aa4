//! Packet framing, validation, and dispatcher hand-off for faceio.
//!
//! This crate implements the one packet contract every face speaks,
//! regardless of the medium behind it.
//!
//! ## Wire Format
//!
//! ```text
//! +----------------------+----------------------------+
//! | dmx (7B)             | opaque routing identifier  |
//! +----------------------+----------------------------+
//! | payload              | variable                   |
//! +----------------------+----------------------------+
//! | crc32 (4B, optional) | IEEE 802.3, big-endian     |
//! +----------------------+----------------------------+
//! ```
//!
//! CRC-bearing media (LoRa, UDP multicast, Bluetooth serial) append the
//! trailer on send and verify it on receive; BLE omits it and relies on
//! the link layer's own integrity check. Total packet length is bounded
//! by the smallest MTU among the compiled-in media (127 bytes on LoRa,
//! 128 on BLE with the negotiated MTU).
//!
//! Inbound packets flow through [`validate_and_dispatch`], which length-
//! checks, CRC-checks, digests, and hands the packet to the external
//! [`Dispatcher`] that owns identifier resolution.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod digest;
pub mod error;
pub mod kiss;
pub mod packet;
pub mod validate;

pub use digest::PacketDigest;
pub use error::{FramingError, WireError};
pub use kiss::{kiss_frame, kiss_unframe, KissDeframer};
pub use packet::{
    check_crc, crc32_ieee, frame_with_crc, leading_hex, trailing_hex, BLE_MTU, CRC_LEN, DMX_LEN,
    MAX_PACKET_LEN,
};
pub use validate::{validate_and_dispatch, Dispatcher};
