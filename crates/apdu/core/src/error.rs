//! Error type shared by commands, responses and their decoders
//!
//! Decoders layer messages over a failure with [`ResultExt::context`], so a
//! rejected response reads like "Decoding app name: Malformed response: ...".

use crate::codec::BuilderError;
use crate::response::status::StatusWord;

/// Failure while building, encoding or decoding APDUs
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// Command longer than the logical layout allows
    #[error("Invalid command length: {0}")]
    InvalidCommandLength(usize),

    /// Command bytes do not follow the logical layout
    #[error("Invalid command data: {0}")]
    InvalidCommandData(&'static str),

    /// A payload value was rejected by the builder
    #[error(transparent)]
    Builder(#[from] BuilderError),

    /// Response payload could not be decoded
    #[error("Malformed response: {0}")]
    ParseError(&'static str),

    /// Device answered with a non-success status word
    #[error("Device returned {status} ({})", .status.description())]
    StatusError {
        /// Status word of the response
        status: StatusWord,
    },

    /// Another error with a message in front
    #[error("{context}: {source}")]
    Context {
        /// What was being done
        context: String,
        /// Underlying failure
        source: Box<Self>,
    },

    /// Free-form failure
    #[error("{0}")]
    Message(String),
}

impl Error {
    /// Put `context` in front of this error
    pub fn with_context<S: Into<String>>(self, context: S) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Free-form failure
    pub fn message<S: Into<String>>(message: S) -> Self {
        Self::Message(message.into())
    }

    /// Non-success status word
    pub const fn status(status: StatusWord) -> Self {
        Self::StatusError { status }
    }

    /// Undecodable response payload
    pub const fn parse(message: &'static str) -> Self {
        Self::ParseError(message)
    }

    /// Status word behind this error, looking through context layers
    pub fn status_word(&self) -> Option<StatusWord> {
        match self {
            Self::StatusError { status } => Some(*status),
            Self::Context { source, .. } => source.status_word(),
            _ => None,
        }
    }
}

/// Adds context to results carrying an [`Error`]
pub trait ResultExt<T> {
    /// Put `context` in front of the error, if any
    fn context<S: Into<String>>(self, context: S) -> Result<T, Error>;
}

impl<T> ResultExt<T> for Result<T, Error> {
    fn context<S: Into<String>>(self, context: S) -> Self {
        self.map_err(|e| e.with_context(context))
    }
}
