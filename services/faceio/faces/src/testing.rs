//! Mock face for registry and main-loop tests.

use crate::error::FaceError;
use crate::face::FaceDriver;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Shared view into a [`MockFace`], kept by the test after the driver
/// itself moves into the registry.
#[derive(Clone, Default)]
pub struct MockHandle {
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    inbound: Arc<Mutex<VecDeque<Vec<u8>>>>,
    polls: Arc<Mutex<usize>>,
}

impl MockHandle {
    /// Payloads passed to `send`, in order.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().clone()
    }

    /// Queue a packet for the driver to yield from `recv`.
    pub fn push_inbound(&self, packet: &[u8]) {
        self.inbound.lock().unwrap().push_back(packet.to_vec());
    }

    /// Number of `poll` calls observed.
    pub fn polls(&self) -> usize {
        *self.polls.lock().unwrap()
    }
}

/// Scriptable in-memory face driver.
pub struct MockFace {
    name: &'static str,
    has_crc: bool,
    fail_sends: bool,
    handle: MockHandle,
}

impl MockFace {
    /// New mock named `name`, reporting `has_crc` for its medium.
    pub fn new(name: &'static str, has_crc: bool) -> (Self, MockHandle) {
        let handle = MockHandle::default();
        (
            Self {
                name,
                has_crc,
                fail_sends: false,
                handle: handle.clone(),
            },
            handle,
        )
    }

    /// Make every subsequent `send` report a transport failure.
    pub fn fail_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }
}

impl FaceDriver for MockFace {
    fn name(&self) -> &'static str {
        self.name
    }

    fn pacing(&self) -> Duration {
        Duration::ZERO
    }

    fn mtu(&self) -> usize {
        faceio_wire::MAX_PACKET_LEN
    }

    fn has_crc(&self) -> bool {
        self.has_crc
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), FaceError> {
        if self.fail_sends {
            return Err(FaceError::Radio("mock send failure".into()));
        }
        self.handle.sent.lock().unwrap().push(payload.to_vec());
        Ok(())
    }

    fn poll(&mut self) {
        *self.handle.polls.lock().unwrap() += 1;
    }

    fn recv(&mut self, dst: &mut [u8]) -> Option<usize> {
        let packet = self.handle.inbound.lock().unwrap().pop_front()?;
        dst[..packet.len()].copy_from_slice(&packet);
        Some(packet.len())
    }
}
