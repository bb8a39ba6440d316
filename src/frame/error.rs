//! Errors raised while decoding an inverter frame.

use thiserror::Error;

/// Structural problems that prevent a frame from producing a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The number of bytes received does not match the fixed wire size.
    #[error("invalid wire length: received {received} bytes, expected {expected}")]
    WireLength {
        /// Bytes actually received.
        received: usize,
        /// Fixed wire size of a frame.
        expected: usize,
    },
    /// The declared-length byte inside the frame holds an unexpected value.
    #[error("invalid packet length: declared {declared}, expected {expected}")]
    InvalidPacketLength {
        /// Value found in the length byte.
        declared: u8,
        /// Required payload length.
        expected: u8,
    },
}

impl FrameError {
    /// Short, stable label used for metrics.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::WireLength { .. } => "wire_length",
            Self::InvalidPacketLength { .. } => "packet_length",
        }
    }
}
