//! Packet validation error types.

use thiserror::Error;

/// Inbound packet rejection reasons. All are local and non-fatal: a
/// rejected packet is dropped and never retried.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum WireError {
    /// Packet too short to carry an identifier and trailer.
    #[error("short packet: {0} bytes")]
    ShortPacket(usize),

    /// Recomputed CRC32 disagrees with the trailer.
    #[error("crc mismatch: expected {expected:08x}, found {found:08x}")]
    CrcMismatch {
        /// CRC recomputed over the packet body
        expected: u32,
        /// CRC carried in the trailer
        found: u32,
    },

    /// The dispatcher does not recognize the packet's identifier.
    #[error("unknown dmx")]
    UnknownDmx,
}

/// KISS byte-stream framing errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FramingError {
    /// Frame is not delimited by FEND bytes.
    #[error("missing frame delimiter")]
    MissingDelimiter,

    /// An FESC escape is cut off by the end of the frame.
    #[error("incomplete escape sequence")]
    IncompleteEscape,

    /// An FESC is followed by a byte that is neither TFEND nor TFESC.
    #[error("invalid escape sequence: {0:#04x}")]
    InvalidEscape(u8),
}
