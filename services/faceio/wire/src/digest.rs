//! SHA-256 packet digest.
//!
//! The digest identifies packets in the log stream and is handed to the
//! dispatcher alongside the packet. It never gates acceptance.

use sha2::{Digest, Sha256};
use std::fmt;

/// Fixed-size digest of a received packet.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PacketDigest([u8; 32]);

impl PacketDigest {
    /// Digest `packet` (with any CRC trailer already stripped).
    pub fn of(packet: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(packet);
        Self(hasher.finalize().into())
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Full hex rendering, for diagnostics beyond the log line.
    pub fn full_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for PacketDigest {
    /// Short form used in log lines: the first eight bytes in hex.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..8]))
    }
}

impl fmt::Debug for PacketDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PacketDigest({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        // SHA-256 of the empty string.
        let d = PacketDigest::of(b"");
        assert_eq!(
            d.full_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(d.to_string(), "e3b0c44298fc1c14");
    }

    #[test]
    fn test_digest_distinguishes_payloads() {
        assert_ne!(PacketDigest::of(b"abc"), PacketDigest::of(b"abd"));
        assert_eq!(PacketDigest::of(b"abc"), PacketDigest::of(b"abc"));
    }
}
