//! Long-range radio driver.
//!
//! The driver is generic over a [`LoraRadio`] so the same send/poll
//! logic runs against real radio hardware or a bench double. Received
//! frames are moved from the radio into a four-slot ring on each poll;
//! a full ring drops the newest frame rather than stall the radio.

use crate::error::{ConfigError, FaceError};
use crate::face::FaceDriver;
use crate::profiles::{profile_by_plan, ConfigRequest, RadioProfile};
use faceio_ring::{Consumer, Producer, RingBuffer};
use faceio_wire::{frame_with_crc, leading_hex, trailing_hex, MAX_PACKET_LEN};
use std::time::Duration;
use tracing::{info, warn};

/// Frames buffered between radio and main loop.
const RING_CAPACITY: usize = 4;

/// Advisory spacing between LoRa sends; the shared channel is slow and
/// half-duplex.
const PACING: Duration = Duration::from_millis(400);

/// Hardware seam for the long-range radio.
///
/// `transmit` blocks only for the radio's inherent air time;
/// `try_receive` returns immediately when no frame is pending.
pub trait LoraRadio {
    /// Transmit one framed packet, then resume receiving.
    fn transmit(&mut self, frame: &[u8]) -> Result<(), FaceError>;

    /// Fetch one received frame into `buf` if the radio holds one.
    fn try_receive(&mut self, buf: &mut [u8]) -> Option<usize>;

    /// Apply a full parameter set (frequency, bandwidth, spreading
    /// factor, coding rate, sync word, power).
    fn apply_profile(&mut self, profile: &RadioProfile) -> Result<(), ConfigError>;

    /// Retune the center frequency.
    fn set_frequency(&mut self, hz: u32) -> Result<(), ConfigError>;

    /// Change the transmit power.
    fn set_tx_power(&mut self, dbm: i8) -> Result<(), ConfigError>;
}

/// The LoRa face. CRC-bearing, polled receive.
pub struct LoraDriver<R: LoraRadio> {
    radio: R,
    profile: &'static RadioProfile,
    rx_in: Producer,
    rx_out: Consumer,
}

impl<R: LoraRadio> LoraDriver<R> {
    /// Bring the radio up on the named frequency plan.
    pub fn new(mut radio: R, plan: &str) -> Result<Self, ConfigError> {
        let profile = profile_by_plan(plan)?;
        radio.apply_profile(profile)?;
        info!(
            plan = profile.plan,
            freq = profile.frequency_hz,
            bw = profile.bandwidth_hz,
            sf = profile.spreading_factor,
            "lora radio up"
        );
        let (rx_in, rx_out) = RingBuffer::with_capacity(RING_CAPACITY, MAX_PACKET_LEN);
        Ok(Self {
            radio,
            profile,
            rx_in,
            rx_out,
        })
    }

    /// The profile currently applied to the radio.
    pub fn active_profile(&self) -> &'static RadioProfile {
        self.profile
    }

    /// Apply one runtime configuration action.
    pub fn configure(&mut self, request: ConfigRequest) -> Result<(), ConfigError> {
        match request {
            ConfigRequest::SetFrequency { hz } => self.radio.set_frequency(hz),
            ConfigRequest::SetTxPower { dbm } => self.radio.set_tx_power(dbm),
        }
    }

    /// Switch to a different named plan.
    pub fn select_profile(&mut self, plan: &str) -> Result<(), ConfigError> {
        let profile = profile_by_plan(plan)?;
        self.radio.apply_profile(profile)?;
        self.profile = profile;
        info!(plan = profile.plan, "lora plan switched");
        Ok(())
    }
}

impl<R: LoraRadio> FaceDriver for LoraDriver<R> {
    fn name(&self) -> &'static str {
        "lora"
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
        match self.radio.transmit(&framed) {
            Ok(()) => {
                info!(
                    face = "lora",
                    len = framed.len(),
                    lead = %leading_hex(&framed),
                    tail = %trailing_hex(&framed),
                    "tx"
                );
                Ok(())
            }
            Err(e) => {
                warn!(
                    face = "lora",
                    len = framed.len(),
                    lead = %leading_hex(&framed),
                    "tx failed: {e}"
                );
                Err(e)
            }
        }
    }

    fn poll(&mut self) {
        let mut buf = [0u8; MAX_PACKET_LEN];
        while let Some(len) = self.radio.try_receive(&mut buf) {
            if self.rx_in.push(&buf[..len]).is_err() {
                warn!(face = "lora", len, "rx ring full, packet dropped");
            }
        }
    }

    fn recv(&mut self, dst: &mut [u8]) -> Option<usize> {
        self.rx_out.pop(dst)
    }
}
