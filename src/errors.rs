//! Error type of the triplet generator.
//!
//! Every variant is fatal for the session that produced it: a half-finished OT exchange
//! cannot be resumed, so callers are expected to drop the generator and start over.

use crate::fixed_point::ElementKind;

/// Errors produced while generating triplets.
#[derive(Debug, thiserror::Error)]
pub enum TripletError {
    /// The generator was configured for an element kind other than `i64` fixed-point.
    #[error("element kind `{0}` is not supported for triplet generation (only `i64` is)")]
    UnsupportedElementKind(ElementKind),
    /// Configuration or call arguments that can never produce a valid exchange.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Sending or receiving on the channel failed.
    #[error("transport failure: {0}")]
    Transport(#[from] std::io::Error),
    /// The base OT primitive failed for a reason other than I/O.
    #[error("base OT failure: {0}")]
    BaseOt(ocelot::Error),
    /// The peer (or a refill) produced a message of the wrong shape.
    #[error("protocol desync on {what}: got {got}, expected {expected}")]
    ProtocolDesync {
        /// Which message was malformed.
        what: &'static str,
        /// Length actually received.
        got: usize,
        /// Length required by the protocol.
        expected: usize,
    },
    /// A previous protocol round failed; the OT state can no longer be trusted.
    #[error("session aborted after an earlier protocol failure")]
    SessionAborted,
}

impl From<ocelot::Error> for TripletError {
    fn from(e: ocelot::Error) -> Self {
        match e {
            ocelot::Error::IoError(e) => TripletError::Transport(e),
            e => TripletError::BaseOt(e),
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, TripletError>;
