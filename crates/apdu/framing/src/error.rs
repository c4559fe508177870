//! Error types for framing and framed transports

use thiserror::Error;

/// Errors raised while splitting commands or reassembling responses
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FramerError {
    /// No frame size configured on the sender
    #[error("Frame size is not set")]
    FrameSizeUnset,

    /// The frame header alone does not leave room for any payload
    #[error("{header_len} byte header does not fit in {frame_size} byte frames")]
    FramerApdu {
        /// Length of the index 0 header
        header_len: usize,
        /// Configured frame size
        frame_size: usize,
    },

    /// Command length does not fit in the two byte length field
    #[error("APDU of {0} bytes exceeds the framing length field")]
    ApduTooLong(usize),

    /// Inbound frame is shorter than its header
    #[error("Unable to parse header from apdu")]
    HeaderTooShort,

    /// Inbound frame violates the framing protocol
    #[error("Receiver APDU error: {0}")]
    ReceiverApdu(&'static str),

    /// Reassembled message cannot hold a status word
    #[error("Reassembled response of {0} bytes has no status word")]
    ResponseTooShort(usize),
}

/// Errors raised by a frame transport
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Failed to connect to the device
    #[error("Failed to connect to device")]
    Connection,

    /// Failed to transmit data
    #[error("Failed to transmit data")]
    Transmission,

    /// The connection was closed by the device
    #[error("Connection closed")]
    Closed,

    /// Other error with message
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Create a new error with a dynamic message
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other(message.into())
    }
}

/// Errors raised by a full command exchange over a framed session
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Framing protocol error
    #[error(transparent)]
    Framing(#[from] FramerError),

    /// Transport error
    #[error(transparent)]
    Transport(#[from] TransportError),
}
