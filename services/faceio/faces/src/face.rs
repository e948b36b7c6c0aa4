//! The uniform per-medium driver contract.

use crate::error::FaceError;
use std::time::Duration;

/// One compiled-in transport endpoint.
///
/// Every method completes in bounded time: `send` transmits within the
/// call (no queueing beyond the physical layer), `poll` never waits for
/// data, and `recv` only pops the driver's own receive ring. Nothing
/// here suspends, sleeps, or blocks on a condition, because producer-
/// side driver code may run in a restricted callback context.
pub trait FaceDriver {
    /// Stable face name used in log lines and for broadcast exclusion.
    fn name(&self) -> &'static str;

    /// Advisory minimum spacing between sends on this medium.
    /// Enforcement, if any, belongs to the layer above.
    fn pacing(&self) -> Duration;

    /// Largest framed packet this medium carries.
    fn mtu(&self) -> usize;

    /// Whether packets on this medium carry a CRC32 trailer.
    fn has_crc(&self) -> bool;

    /// Frame `payload` for this medium and transmit it synchronously.
    /// The outcome is logged with leading and trailing bytes in hex.
    fn send(&mut self, payload: &[u8]) -> Result<(), FaceError>;

    /// Drain any hardware-buffered inbound frames into the driver's
    /// receive ring. Non-blocking; called once per main-loop iteration.
    /// Callback-driven media enqueue from their stack callback instead
    /// and keep the default no-op.
    fn poll(&mut self) {}

    /// Pop one buffered inbound packet into `dst`, returning its
    /// length, or `None` when nothing is buffered. `dst` must hold at
    /// least `mtu` bytes.
    fn recv(&mut self, dst: &mut [u8]) -> Option<usize>;
}
