//! Command exchange over a framed transport
//!
//! A session owns one transport together with the sender and receiver for
//! that connection. The protocol is half-duplex: one command is in flight at
//! a time, which `&mut self` on [`FramedSession::exchange`] enforces.

use nexum_apdu_core::{Apdu, ApduResponse};
use tracing::{Level, debug, event, instrument};

use crate::SessionError;
use crate::config::FramerConfig;
use crate::receiver::ApduReceiver;
use crate::sender::ApduSender;
use crate::transport::FrameTransport;

/// Framed connection to a single device
#[derive(Debug)]
pub struct FramedSession<T> {
    transport: T,
    sender: ApduSender,
    receiver: ApduReceiver,
}

impl<T: FrameTransport> FramedSession<T> {
    /// Create a session over `transport`
    pub const fn new(transport: T, config: FramerConfig) -> Self {
        Self {
            transport,
            sender: ApduSender::new(config),
            receiver: ApduReceiver::new(config),
        }
    }

    /// Set the frame size once the transport MTU is known
    pub const fn set_frame_size(&mut self, frame_size: usize) {
        self.sender.set_frame_size(frame_size);
    }

    /// Underlying transport
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the underlying transport
    pub const fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consume the session, returning the transport
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Send a command and wait for its reassembled response
    ///
    /// On failure the receiver is reset so the next exchange starts from a
    /// clean state.
    #[instrument(level = "debug", skip_all, fields(apdu = %apdu))]
    pub async fn exchange(&mut self, apdu: &Apdu) -> Result<ApduResponse, SessionError> {
        self.exchange_raw(&apdu.to_bytes()).await
    }

    /// Send serialised command bytes and wait for the response
    pub async fn exchange_raw(&mut self, command: &[u8]) -> Result<ApduResponse, SessionError> {
        let result = self.try_exchange(command).await;
        match &result {
            Ok(response) => log_response(response),
            Err(e) => {
                debug!(error = %e, "Exchange failed, resetting receiver");
                self.receiver.reset();
            }
        }
        result
    }

    async fn try_exchange(&mut self, command: &[u8]) -> Result<ApduResponse, SessionError> {
        let frames = self.sender.get_frames(command)?;
        for frame in &frames {
            self.transport.write_frame(&frame.to_bytes()).await?;
        }

        loop {
            let raw = self.transport.read_frame().await?;
            if let Some(response) = self.receiver.handle_frame(&raw)? {
                return Ok(response);
            }
        }
    }
}

fn log_response(response: &ApduResponse) {
    let status = response.status();
    macro_rules! log_at {
        ($level:expr) => {
            event!(
                $level,
                status = %status,
                description = status.description(),
                data_len = response.data().len(),
                "Received response"
            )
        };
    }
    let level = status.tracing_level();
    if level == Level::DEBUG {
        log_at!(Level::DEBUG);
    } else if level == Level::INFO {
        log_at!(Level::INFO);
    } else {
        log_at!(Level::WARN);
    }
}
