//! Inbound packet validation and dispatcher hand-off.

use crate::digest::PacketDigest;
use crate::error::WireError;
use crate::packet::{check_crc, leading_hex, trailing_hex, CRC_LEN, DMX_LEN};
use tracing::{debug, warn};

/// External component owning identifier-to-handler resolution.
///
/// The core treats the 7-byte dmx purely as an opaque prefix; `on_rx`
/// decides acceptance. The digest is informational.
pub trait Dispatcher {
    /// Offer a validated packet (CRC trailer already stripped).
    /// Returns `true` if the packet was accepted.
    fn on_rx(&mut self, packet: &[u8], digest: &PacketDigest, face: &str) -> bool;
}

/// Validate one inbound packet and hand it to the dispatcher.
///
/// Steps, in order: length check, CRC check and trailer truncation for
/// CRC-bearing media, digest computation, dispatcher delegation. Any
/// rejection returns the reason and performs no further action; callers
/// never retry a rejected packet.
pub fn validate_and_dispatch(
    face: &str,
    packet: &[u8],
    has_crc: bool,
    dispatcher: &mut dyn Dispatcher,
) -> Result<(), WireError> {
    let len = packet.len();
    if len <= DMX_LEN + CRC_LEN {
        warn!(face, len, "rx drop: short packet");
        return Err(WireError::ShortPacket(len));
    }

    let body = if has_crc {
        if let Err(e) = check_crc(packet) {
            warn!(face, len, lead = %leading_hex(packet), "rx drop: {e}");
            return Err(e);
        }
        &packet[..len - CRC_LEN]
    } else {
        packet
    };

    let digest = PacketDigest::of(body);
    debug!(
        face,
        len = body.len(),
        lead = %leading_hex(body),
        tail = %trailing_hex(body),
        %digest,
        "rx"
    );

    if dispatcher.on_rx(body, &digest, face) {
        Ok(())
    } else {
        warn!(face, lead = %leading_hex(body), "rx drop: unknown dmx");
        Err(WireError::UnknownDmx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::frame_with_crc;

    /// Test dispatcher that records offers and answers with a fixed verdict.
    struct Recorder {
        accept: bool,
        seen: Vec<(Vec<u8>, String)>,
    }

    impl Recorder {
        fn new(accept: bool) -> Self {
            Self {
                accept,
                seen: Vec::new(),
            }
        }
    }

    impl Dispatcher for Recorder {
        fn on_rx(&mut self, packet: &[u8], _digest: &PacketDigest, face: &str) -> bool {
            self.seen.push((packet.to_vec(), face.to_string()));
            self.accept
        }
    }

    #[test]
    fn test_short_packets_never_reach_dispatcher() {
        let mut d = Recorder::new(true);
        for len in 0..=DMX_LEN + CRC_LEN {
            let packet = vec![0u8; len];
            assert_eq!(
                validate_and_dispatch("lora", &packet, true, &mut d),
                Err(WireError::ShortPacket(len))
            );
            assert_eq!(
                validate_and_dispatch("ble", &packet, false, &mut d),
                Err(WireError::ShortPacket(len))
            );
        }
        assert!(d.seen.is_empty());
    }

    #[test]
    fn test_crc_packet_accepted_and_truncated() {
        let payload: Vec<u8> = (0..20).collect();
        let framed = frame_with_crc(&payload);
        let mut d = Recorder::new(true);
        validate_and_dispatch("udp", &framed, true, &mut d).unwrap();
        assert_eq!(d.seen.len(), 1);
        assert_eq!(d.seen[0].0, payload);
        assert_eq!(d.seen[0].1, "udp");
    }

    #[test]
    fn test_crcless_packet_passed_whole() {
        let payload: Vec<u8> = (0..20).collect();
        let mut d = Recorder::new(true);
        validate_and_dispatch("ble", &payload, false, &mut d).unwrap();
        assert_eq!(d.seen[0].0, payload);
    }

    #[test]
    fn test_corrupt_trailer_rejected_before_dispatch() {
        let payload = [7u8; 50];
        let mut framed = frame_with_crc(&payload).to_vec();
        let last = framed.len() - 1;
        framed[last] ^= 0xFF;

        let mut d = Recorder::new(true);
        assert!(matches!(
            validate_and_dispatch("lora", &framed, true, &mut d),
            Err(WireError::CrcMismatch { .. })
        ));
        assert!(d.seen.is_empty());
    }

    #[test]
    fn test_dispatcher_rejection_reported() {
        let framed = frame_with_crc(&[1u8; 20]);
        let mut d = Recorder::new(false);
        assert_eq!(
            validate_and_dispatch("lora", &framed, true, &mut d),
            Err(WireError::UnknownDmx)
        );
        assert_eq!(d.seen.len(), 1);
    }
}
