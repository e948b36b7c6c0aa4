//! Bluetooth serial driver.
//!
//! Packets ride a byte stream, so they are CRC-framed and then KISS
//! byte-stuffed. The port is expected to be non-blocking; `poll()`
//! feeds whatever bytes arrived through an incremental deframer into
//! the receive ring.

use crate::error::FaceError;
use crate::face::FaceDriver;
use faceio_ring::{Consumer, Producer, RingBuffer};
use faceio_wire::{
    frame_with_crc, kiss_frame, leading_hex, trailing_hex, KissDeframer, MAX_PACKET_LEN,
};
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;
use tracing::{debug, info, warn};

const RING_CAPACITY: usize = 8;
const PACING: Duration = Duration::from_millis(50);

/// The Bluetooth serial face. CRC-bearing, KISS-framed, polled receive.
pub struct BtSerialDriver<P: Read + Write> {
    port: P,
    deframer: KissDeframer,
    rx_in: Producer,
    rx_out: Consumer,
}

impl<P: Read + Write> BtSerialDriver<P> {
    /// Wrap an already-open non-blocking serial port.
    pub fn new(port: P) -> Self {
        let (rx_in, rx_out) = RingBuffer::with_capacity(RING_CAPACITY, MAX_PACKET_LEN);
        Self {
            port,
            deframer: KissDeframer::new(MAX_PACKET_LEN),
            rx_in,
            rx_out,
        }
    }
}

impl<P: Read + Write> FaceDriver for BtSerialDriver<P> {
    fn name(&self) -> &'static str {
        "bt"
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
        let stuffed = kiss_frame(&framed);
        match self.port.write_all(&stuffed).and_then(|()| self.port.flush()) {
            Ok(()) => {
                info!(
                    face = "bt",
                    len = framed.len(),
                    lead = %leading_hex(&framed),
                    tail = %trailing_hex(&framed),
                    "tx"
                );
                Ok(())
            }
            Err(e) => {
                warn!(face = "bt", len = framed.len(), "tx failed: {e}");
                Err(e.into())
            }
        }
    }

    fn poll(&mut self) {
        let mut chunk = [0u8; 256];
        loop {
            match self.port.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    let rx_in = &mut self.rx_in;
                    self.deframer.feed(&chunk[..n], |frame| {
                        if rx_in.push(frame).is_err() {
                            warn!(face = "bt", len = frame.len(), "rx ring full, frame dropped");
                        }
                    });
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => {
                    debug!(face = "bt", "read error: {e}");
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
    use faceio_wire::{check_crc, kiss_unframe};
    use std::collections::VecDeque;
    use std::io;

    /// In-memory stand-in for a non-blocking serial port.
    struct FakePort {
        written: Vec<u8>,
        inbound: VecDeque<u8>,
    }

    impl FakePort {
        fn new() -> Self {
            Self {
                written: Vec::new(),
                inbound: VecDeque::new(),
            }
        }
    }

    impl Read for FakePort {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.inbound.is_empty() {
                return Err(io::Error::new(ErrorKind::WouldBlock, "empty"));
            }
            let mut n = 0;
            while n < buf.len() {
                match self.inbound.pop_front() {
                    Some(b) => {
                        buf[n] = b;
                        n += 1;
                    }
                    None => break,
                }
            }
            Ok(n)
        }
    }

    impl Write for FakePort {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_send_is_crc_framed_then_kiss_stuffed() {
        let mut driver = BtSerialDriver::new(FakePort::new());
        let payload = [0xC0u8, 0x01, 0xDB, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        driver.send(&payload).unwrap();

        let unstuffed = kiss_unframe(&driver.port.written).unwrap();
        check_crc(&unstuffed).unwrap();
        assert_eq!(&unstuffed[..payload.len()], &payload);
    }

    #[test]
    fn test_poll_reassembles_inbound_frames() {
        let mut driver = BtSerialDriver::new(FakePort::new());
        let one = frame_with_crc(&[1u8; 16]);
        let two = frame_with_crc(&[2u8; 17]);
        driver.port.inbound.extend(kiss_frame(&one));
        driver.port.inbound.extend(kiss_frame(&two));
        driver.poll();

        let mut buf = [0u8; MAX_PACKET_LEN];
        assert_eq!(driver.recv(&mut buf), Some(one.len()));
        assert_eq!(&buf[..one.len()], &one[..]);
        assert_eq!(driver.recv(&mut buf), Some(two.len()));
        assert!(driver.recv(&mut buf).is_none());
    }

    #[test]
    fn test_partial_frame_waits_for_more_bytes() {
        let mut driver = BtSerialDriver::new(FakePort::new());
        let frame = kiss_frame(&frame_with_crc(&[7u8; 20]));
        let (first, rest) = frame.split_at(5);

        driver.port.inbound.extend(first);
        driver.poll();
        let mut buf = [0u8; MAX_PACKET_LEN];
        assert!(driver.recv(&mut buf).is_none());

        driver.port.inbound.extend(rest);
        driver.poll();
        assert_eq!(driver.recv(&mut buf), Some(24));
    }
}
