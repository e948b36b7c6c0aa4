//! Driver error types.

use thiserror::Error;

/// Per-face send failures. Logged by the registry and isolated: one
/// face's failure never affects another's delivery.
#[derive(Error, Debug)]
pub enum FaceError {
    /// The medium has no connected peer to deliver to.
    #[error("no peer connected")]
    NotConnected,

    /// Framed packet exceeds the medium's MTU.
    #[error("packet too large: {len} > mtu {mtu}")]
    TooLarge {
        /// Framed packet length
        len: usize,
        /// Face MTU
        mtu: usize,
    },

    /// Socket or serial-port failure.
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),

    /// Radio hardware reported a failed transmission.
    #[error("radio: {0}")]
    Radio(String),
}

/// Radio configuration failures.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The requested profile name is not in the static table.
    #[error("unknown radio plan: {0}")]
    UnknownProfile(String),

    /// The radio rejected a setting.
    #[error("radio config: {0}")]
    Radio(String),
}
