//! Frame level transport trait
//!
//! A transport moves single frames to and from the device. It knows nothing
//! about message boundaries; that is the job of the sender and receiver.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, trace};

use crate::TransportError;

/// Trait for transports that exchange raw frames with a device
#[async_trait]
pub trait FrameTransport: Send + fmt::Debug {
    /// Write one frame
    async fn write_frame(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        trace!(frame = %hex::encode(frame), "Writing frame");
        let result = self.do_write_frame(frame).await;
        if let Err(e) = &result {
            debug!(error = ?e, "Transport error during write");
        }
        result
    }

    /// Read the next inbound frame
    async fn read_frame(&mut self) -> Result<Bytes, TransportError> {
        let result = self.do_read_frame().await;
        match &result {
            Ok(frame) => trace!(frame = %hex::encode(frame), "Read frame"),
            Err(e) => debug!(error = ?e, "Transport error during read"),
        }
        result
    }

    /// Internal implementation of `write_frame`
    /// This is the method that concrete implementations should override
    async fn do_write_frame(&mut self, frame: &[u8]) -> Result<(), TransportError>;

    /// Internal implementation of `read_frame`
    async fn do_read_frame(&mut self) -> Result<Bytes, TransportError>;
}
