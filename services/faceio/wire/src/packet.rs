//! Packet layout constants, CRC32 framing, and log formatting helpers.

use crate::error::WireError;
use bytes::{BufMut, Bytes, BytesMut};

/// Length of the dmx identifier leading every packet. The core never
/// parses it; identifier resolution belongs to the dispatcher.
pub const DMX_LEN: usize = 7;

/// Length of the CRC32 trailer on CRC-bearing media.
pub const CRC_LEN: usize = 4;

/// Largest packet a face may carry, including the CRC trailer.
/// Bounded by the LoRa driver's maximum frame size.
pub const MAX_PACKET_LEN: usize = 127;

/// Negotiated BLE MTU; BLE packets carry no CRC trailer.
pub const BLE_MTU: usize = 128;

/// CRC32 over `data` (IEEE 802.3: polynomial 0xEDB88320 reflected,
/// initial register 0xFFFFFFFF, final XOR 0xFFFFFFFF).
///
/// The classic check vector `"123456789"` yields `0xCBF43926`.
pub fn crc32_ieee(data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Frame `payload` for a CRC-bearing medium by appending the CRC32
/// trailer in network byte order.
pub fn frame_with_crc(payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(payload.len() + CRC_LEN);
    buf.put_slice(payload);
    buf.put_u32(crc32_ieee(payload));
    buf.freeze()
}

/// Verify the CRC32 trailer of `packet`. The trailer is the last four
/// bytes; the CRC is recomputed over everything before it.
pub fn check_crc(packet: &[u8]) -> Result<(), WireError> {
    if packet.len() < CRC_LEN {
        return Err(WireError::ShortPacket(packet.len()));
    }
    let body = &packet[..packet.len() - CRC_LEN];
    let expected = crc32_ieee(body);
    let tail = &packet[packet.len() - CRC_LEN..];
    let found = u32::from_be_bytes([tail[0], tail[1], tail[2], tail[3]]);
    if expected != found {
        return Err(WireError::CrcMismatch { expected, found });
    }
    Ok(())
}

/// Hex of the leading bytes of a packet, for log lines. Shows at most
/// the dmx identifier plus one byte.
pub fn leading_hex(packet: &[u8]) -> String {
    hex::encode(&packet[..packet.len().min(DMX_LEN + 1)])
}

/// Hex of the trailing six bytes of a packet, for log lines.
pub fn trailing_hex(packet: &[u8]) -> String {
    let start = packet.len().saturating_sub(6);
    hex::encode(&packet[start..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_reference_vector() {
        assert_eq!(crc32_ieee(b"123456789"), 0xCBF43926);
    }

    #[test]
    fn test_trailer_is_big_endian() {
        let framed = frame_with_crc(b"123456789");
        assert_eq!(&framed[9..], &[0xCB, 0xF4, 0x39, 0x26]);
    }

    #[test]
    fn test_frame_check_roundtrip() {
        for len in [0usize, 1, 7, 50, 100, MAX_PACKET_LEN - CRC_LEN] {
            let payload: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let framed = frame_with_crc(&payload);
            assert_eq!(framed.len(), len + CRC_LEN);
            assert_eq!(&framed[..len], payload.as_slice());
            check_crc(&framed).unwrap();
        }
    }

    #[test]
    fn test_single_bit_flip_detected() {
        let payload = [0x42u8; 50];
        let framed = frame_with_crc(&payload);
        for byte in 0..framed.len() {
            for bit in 0..8 {
                let mut corrupted = framed.to_vec();
                corrupted[byte] ^= 1 << bit;
                assert!(
                    matches!(check_crc(&corrupted), Err(WireError::CrcMismatch { .. })),
                    "flip at byte {byte} bit {bit} went undetected"
                );
            }
        }
    }

    #[test]
    fn test_hex_helpers() {
        let packet = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A];
        assert_eq!(leading_hex(&packet), "0102030405060708");
        assert_eq!(trailing_hex(&packet), "05060708090a");
        assert_eq!(leading_hex(&packet[..3]), "010203");
        assert_eq!(trailing_hex(&packet[..3]), "010203");
    }
}
