//! Error types for device actions

use std::fmt;

use nexum_apdu_framing::SessionError;
use thiserror::Error;

/// A defect in a state machine, as opposed to a domain error of the action
///
/// Faults end the progress stream with an error item instead of a state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineFault {
    /// The machine received an event its current state does not accept
    #[error("Unexpected event {event} in state {state}")]
    UnexpectedEvent {
        /// Debug rendering of the event
        event: String,
        /// Debug rendering of the state
        state: String,
    },

    /// An effect was requested outside of a Tokio runtime
    #[error("No async runtime available to run effects")]
    NoRuntime,

    /// Other fault with message
    #[error("{0}")]
    Other(String),
}

impl MachineFault {
    /// Fault for an event the current state cannot handle
    pub fn unexpected(event: &impl fmt::Debug, state: &impl fmt::Debug) -> Self {
        Self::UnexpectedEvent {
            event: format!("{event:?}"),
            state: format!("{state:?}"),
        }
    }

    /// Create a new fault with a dynamic message
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other(message.into())
    }
}

/// Failure of a typed command sent through an [`InternalApi`](crate::InternalApi)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError<E> {
    /// The exchange with the device failed
    #[error("Exchange failed: {0}")]
    Exchange(#[from] SessionError),

    /// The device answered but the command rejected the response
    #[error("Command failed: {0:?}")]
    Command(E),
}
