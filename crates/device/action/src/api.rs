//! Device access handed to state machines

use std::fmt;

use async_trait::async_trait;
use nexum_apdu_core::{Apdu, ApduResponse, Command};
use nexum_apdu_framing::{FrameTransport, FramedSession, SessionError};
use tokio::sync::Mutex;
use tracing::trace;

use crate::CommandError;

/// Capabilities a device action may use while it runs
#[async_trait]
pub trait InternalApi: Send + Sync + fmt::Debug {
    /// Exchange one command with the device
    async fn send_command(&self, apdu: Apdu) -> Result<ApduResponse, SessionError>;
}

impl dyn InternalApi {
    /// Send a typed command and parse its response
    pub async fn send_typed<C>(&self, command: &C) -> Result<C::Response, CommandError<C::Error>>
    where
        C: Command + Sync,
    {
        let response = self.send_command(command.apdu()).await?;
        command
            .parse_response(response)
            .map_err(CommandError::Command)
    }
}

/// [`InternalApi`] backed by a [`FramedSession`]
///
/// Exchanges are serialised, so several actions can share one device.
#[derive(Debug)]
pub struct DeviceSessionApi<T> {
    session: Mutex<FramedSession<T>>,
}

impl<T: FrameTransport> DeviceSessionApi<T> {
    /// Wrap an open session
    pub fn new(session: FramedSession<T>) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }

    /// Set the frame size once the transport MTU is known
    pub async fn set_frame_size(&self, frame_size: usize) {
        self.session.lock().await.set_frame_size(frame_size);
    }

    /// Consume the api, returning the session
    pub fn into_inner(self) -> FramedSession<T> {
        self.session.into_inner()
    }
}

#[async_trait]
impl<T: FrameTransport + 'static> InternalApi for DeviceSessionApi<T> {
    async fn send_command(&self, apdu: Apdu) -> Result<ApduResponse, SessionError> {
        trace!(apdu = %apdu, "Queueing command");
        self.session.lock().await.exchange(&apdu).await
    }
}
