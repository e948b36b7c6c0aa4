//! The fixed face set, broadcast send, and inbound draining.

use crate::face::FaceDriver;
use faceio_wire::{validate_and_dispatch, Dispatcher, WireError, BLE_MTU};
use tracing::{debug, warn};

/// Per-face traffic counters. Owned by the registry; there is no global
/// mutable state anywhere in the core.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Packets handed to the medium.
    pub sent: u64,
    /// Sends the medium reported as failed.
    pub send_failed: u64,
    /// Packets popped from the receive ring.
    pub received: u64,
    /// Packets the dispatcher accepted.
    pub accepted: u64,
    /// Drops: too short to validate.
    pub dropped_short: u64,
    /// Drops: CRC trailer mismatch.
    pub dropped_crc: u64,
    /// Drops: dispatcher did not recognize the identifier.
    pub dropped_unknown: u64,
}

struct RegisteredFace {
    driver: Box<dyn FaceDriver>,
    stats: LinkStats,
}

/// The fixed, insertion-ordered set of compiled-in faces.
///
/// Built once at startup; afterwards the face set never changes, only
/// the per-face counters do. Broadcast, polling, and draining all walk
/// the faces in registration order.
#[derive(Default)]
pub struct FaceRegistry {
    faces: Vec<RegisteredFace>,
}

impl FaceRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a face. Registration order is broadcast order.
    pub fn register(&mut self, driver: Box<dyn FaceDriver>) {
        debug!(face = driver.name(), "face registered");
        self.faces.push(RegisteredFace {
            driver,
            stats: LinkStats::default(),
        });
    }

    /// Number of registered faces.
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    /// Whether no face is registered.
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Registered face names, in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.faces.iter().map(|f| f.driver.name()).collect()
    }

    /// Counters for the named face.
    pub fn stats(&self, name: &str) -> Option<LinkStats> {
        self.faces
            .iter()
            .find(|f| f.driver.name() == name)
            .map(|f| f.stats)
    }

    /// Broadcast `payload` to every face except `exclude`, in
    /// registration order. Fire-and-forget: each face's outcome is
    /// logged and counted, one failure never stops the fan-out, and
    /// the call itself cannot fail.
    pub fn send_all(&mut self, payload: &[u8], exclude: Option<&str>) {
        for face in &mut self.faces {
            let name = face.driver.name();
            if Some(name) == exclude {
                continue;
            }
            match face.driver.send(payload) {
                Ok(()) => face.stats.sent += 1,
                Err(e) => {
                    face.stats.send_failed += 1;
                    warn!(face = name, "broadcast send failed: {e}");
                }
            }
        }
    }

    /// Run one poll pass over every face, moving hardware-buffered
    /// frames into the per-face rings.
    pub fn poll_all(&mut self) {
        for face in &mut self.faces {
            face.driver.poll();
        }
    }

    /// Drain every face's receive ring through validation into the
    /// dispatcher. Returns the number of accepted packets. Poll order
    /// fixes the interleaving across faces; within one face, arrival
    /// order is preserved.
    pub fn drain_into(&mut self, dispatcher: &mut dyn Dispatcher) -> usize {
        let mut accepted = 0;
        let mut buf = [0u8; BLE_MTU];
        for face in &mut self.faces {
            let name = face.driver.name();
            let has_crc = face.driver.has_crc();
            while let Some(len) = face.driver.recv(&mut buf) {
                face.stats.received += 1;
                match validate_and_dispatch(name, &buf[..len], has_crc, dispatcher) {
                    Ok(()) => {
                        face.stats.accepted += 1;
                        accepted += 1;
                    }
                    Err(WireError::ShortPacket(_)) => face.stats.dropped_short += 1,
                    Err(WireError::CrcMismatch { .. }) => face.stats.dropped_crc += 1,
                    Err(WireError::UnknownDmx) => face.stats.dropped_unknown += 1,
                }
            }
        }
        accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFace;
    use faceio_wire::{frame_with_crc, PacketDigest};

    struct AcceptAll {
        seen: Vec<(String, Vec<u8>)>,
    }

    impl Dispatcher for AcceptAll {
        fn on_rx(&mut self, packet: &[u8], _digest: &PacketDigest, face: &str) -> bool {
            self.seen.push((face.to_string(), packet.to_vec()));
            true
        }
    }

    fn three_face_registry() -> (FaceRegistry, Vec<crate::testing::MockHandle>) {
        let mut registry = FaceRegistry::new();
        let mut handles = Vec::new();
        for name in ["lora", "udp", "ble"] {
            let (face, handle) = MockFace::new(name, name != "ble");
            registry.register(Box::new(face));
            handles.push(handle);
        }
        (registry, handles)
    }

    #[test]
    fn test_send_all_hits_every_face_once_in_order() {
        let (mut registry, handles) = three_face_registry();
        registry.send_all(b"hello mesh", None);
        for handle in &handles {
            assert_eq!(handle.sent(), vec![b"hello mesh".to_vec()]);
        }
        assert_eq!(registry.names(), vec!["lora", "udp", "ble"]);
        assert_eq!(registry.stats("lora").unwrap().sent, 1);
    }

    #[test]
    fn test_send_all_with_exclusion() {
        let (mut registry, handles) = three_face_registry();
        registry.send_all(b"not back out the radio", Some("lora"));
        assert!(handles[0].sent().is_empty());
        assert_eq!(handles[1].sent().len(), 1);
        assert_eq!(handles[2].sent().len(), 1);
    }

    #[test]
    fn test_failed_face_does_not_stop_broadcast() {
        let mut registry = FaceRegistry::new();
        let (bad, _bad_handle) = MockFace::new("lora", true);
        registry.register(Box::new(bad.fail_sends()));
        let (good, good_handle) = MockFace::new("udp", true);
        registry.register(Box::new(good));

        registry.send_all(b"payload", None);
        assert_eq!(good_handle.sent().len(), 1);
        assert_eq!(registry.stats("lora").unwrap().send_failed, 1);
        assert_eq!(registry.stats("udp").unwrap().sent, 1);
    }

    #[test]
    fn test_poll_all_visits_every_face() {
        let (mut registry, handles) = three_face_registry();
        registry.poll_all();
        registry.poll_all();
        for handle in &handles {
            assert_eq!(handle.polls(), 2);
        }
    }

    #[test]
    fn test_drain_validates_per_face_crc_mode() {
        let (mut registry, handles) = three_face_registry();
        let payload: Vec<u8> = (0..30).collect();
        handles[0].push_inbound(&frame_with_crc(&payload)); // lora: crc
        handles[2].push_inbound(&payload); // ble: no crc

        let mut dispatcher = AcceptAll { seen: Vec::new() };
        let accepted = registry.drain_into(&mut dispatcher);
        assert_eq!(accepted, 2);
        // Drained in registration order; both CRC modes deliver the
        // same stripped payload.
        assert_eq!(dispatcher.seen[0], ("lora".to_string(), payload.clone()));
        assert_eq!(dispatcher.seen[1], ("ble".to_string(), payload.clone()));
    }

    #[test]
    fn test_drain_counts_drops() {
        let (mut registry, handles) = three_face_registry();
        // Short packet on lora.
        handles[0].push_inbound(&[0u8; 11]);
        // Corrupt trailer on udp.
        let mut bad = frame_with_crc(&[1u8; 20]).to_vec();
        let last = bad.len() - 1;
        bad[last] ^= 0x01;
        handles[1].push_inbound(&bad);

        let mut dispatcher = AcceptAll { seen: Vec::new() };
        assert_eq!(registry.drain_into(&mut dispatcher), 0);
        assert!(dispatcher.seen.is_empty());
        assert_eq!(registry.stats("lora").unwrap().dropped_short, 1);
        assert_eq!(registry.stats("udp").unwrap().dropped_crc, 1);
    }

    #[test]
    fn test_drain_counts_unknown_dmx() {
        struct RejectAll;
        impl Dispatcher for RejectAll {
            fn on_rx(&mut self, _p: &[u8], _d: &PacketDigest, _f: &str) -> bool {
                false
            }
        }

        let (mut registry, handles) = three_face_registry();
        handles[0].push_inbound(&frame_with_crc(&[2u8; 20]));
        assert_eq!(registry.drain_into(&mut RejectAll), 0);
        let stats = registry.stats("lora").unwrap();
        assert_eq!(stats.received, 1);
        assert_eq!(stats.dropped_unknown, 1);
    }
}
