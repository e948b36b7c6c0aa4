//! IP multicast driver.
//!
//! A non-blocking UDP socket joined to a multicast group. Each datagram
//! is one packet; CRC-bearing, polled receive.

use crate::error::FaceError;
use crate::face::FaceDriver;
use faceio_ring::{Consumer, Producer, RingBuffer};
use faceio_wire::{frame_with_crc, leading_hex, trailing_hex, MAX_PACKET_LEN};
use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket};
use std::time::Duration;
use tracing::{debug, info, warn};

const RING_CAPACITY: usize = 8;
const PACING: Duration = Duration::from_millis(50);

/// The IP multicast face.
pub struct UdpDriver {
    socket: UdpSocket,
    group: SocketAddrV4,
    rx_in: Producer,
    rx_out: Consumer,
}

impl UdpDriver {
    /// Bind to the group port, join the group, and go non-blocking.
    pub fn new(group: Ipv4Addr, port: u16) -> Result<Self, FaceError> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, port))?;
        socket.join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)?;
        socket.set_nonblocking(true)?;
        info!(%group, port, "udp multicast joined");
        let (rx_in, rx_out) = RingBuffer::with_capacity(RING_CAPACITY, MAX_PACKET_LEN);
        Ok(Self {
            socket,
            group: SocketAddrV4::new(group, port),
            rx_in,
            rx_out,
        })
    }
}

impl FaceDriver for UdpDriver {
    fn name(&self) -> &'static str {
        "udp"
    }

    fn pacing(&self) -> Duration {
        PACING
    }

    fn mtu(&self) -> usize {
        MAX_PACKET_LEN
    }

    fn has_crc(&self) -> bool {
        true
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), FaceError> {
        let framed = frame_with_crc(payload);
        if framed.len() > self.mtu() {
            return Err(FaceError::TooLarge {
                len: framed.len(),
                mtu: self.mtu(),
            });
        }
        match self.socket.send_to(&framed, self.group) {
            Ok(_) => {
                info!(
                    face = "udp",
                    len = framed.len(),
                    lead = %leading_hex(&framed),
                    tail = %trailing_hex(&framed),
                    "tx"
                );
                Ok(())
            }
            Err(e) => {
                warn!(face = "udp", len = framed.len(), "tx failed: {e}");
                Err(e.into())
            }
        }
    }

    fn poll(&mut self) {
        let mut buf = [0u8; 2048];
        loop {
            match self.socket.recv_from(&mut buf) {
                Ok((len, from)) => {
                    if len > MAX_PACKET_LEN {
                        debug!(face = "udp", len, %from, "oversize datagram ignored");
                        continue;
                    }
                    if self.rx_in.push(&buf[..len]).is_err() {
                        warn!(face = "udp", len, "rx ring full, datagram dropped");
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => {
                    debug!(face = "udp", "recv error: {e}");
                    break;
                }
            }
        }
    }

    fn recv(&mut self, dst: &mut [u8]) -> Option<usize> {
        self.rx_out.pop(dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faceio_wire::{crc32_ieee, CRC_LEN};

    const TEST_GROUP: Ipv4Addr = Ipv4Addr::new(239, 87, 87, 87);

    #[test]
    fn test_loopback_roundtrip() {
        // Receive on an ephemeral port, send to that same group:port.
        let mut rx = UdpDriver::new(TEST_GROUP, 0).unwrap();
        let port = rx.socket.local_addr().unwrap().port();
        rx.socket
            .set_multicast_loop_v4(true)
            .expect("multicast loop");

        let mut tx = UdpDriver::new(TEST_GROUP, 0).unwrap();
        tx.group = SocketAddrV4::new(TEST_GROUP, port);
        tx.socket
            .set_multicast_loop_v4(true)
            .expect("multicast loop");

        let payload: Vec<u8> = (0..40).collect();
        tx.send(&payload).unwrap();

        // Non-blocking receive; give the kernel a moment.
        let mut buf = [0u8; MAX_PACKET_LEN];
        let mut got = None;
        for _ in 0..50 {
            rx.poll();
            if let Some(n) = rx.recv(&mut buf) {
                got = Some(n);
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }

        let n = got.expect("datagram did not loop back");
        assert_eq!(n, payload.len() + CRC_LEN);
        assert_eq!(&buf[..payload.len()], payload.as_slice());
        let trailer = u32::from_be_bytes(buf[payload.len()..n].try_into().unwrap());
        assert_eq!(trailer, crc32_ieee(&payload));
    }

    #[test]
    fn test_oversize_payload_rejected() {
        let mut driver = UdpDriver::new(TEST_GROUP, 0).unwrap();
        let payload = [0u8; MAX_PACKET_LEN];
        assert!(matches!(
            driver.send(&payload),
            Err(FaceError::TooLarge { .. })
        ));
    }
}
