//! Response reassembly
//!
//! Frames are accumulated until the payload received covers the length
//! announced by the first frame. Completion is driven by that length only,
//! so padding and read boundaries do not matter.

use bytes::BytesMut;
use nexum_apdu_core::ApduResponse;
use tracing::{debug, trace, warn};

use crate::FramerError;
use crate::config::FramerConfig;
use crate::frame::Frame;

/// Reassembles framed responses, one message at a time
#[derive(Debug, Clone, Default)]
pub struct ApduReceiver {
    config: FramerConfig,
    pending: Vec<Frame>,
    expected_length: usize,
}

impl ApduReceiver {
    /// Create a receiver from a framer configuration
    ///
    /// Only the channel and head tag settings are relevant when receiving.
    pub const fn new(config: FramerConfig) -> Self {
        Self {
            config,
            pending: Vec::new(),
            expected_length: 0,
        }
    }

    /// Feed one inbound frame
    ///
    /// Returns `Ok(None)` while the message is incomplete. Frames must be
    /// given in order, starting from index 0. Errors leave the pending
    /// frames untouched; call [`reset`](Self::reset) to resynchronise.
    pub fn handle_frame(&mut self, raw: &[u8]) -> Result<Option<ApduResponse>, FramerError> {
        trace!(frame = %hex::encode(raw), "Handling frame");
        let frame = Frame::parse(raw, self.config.channel.is_some())?;
        let header = frame.header();

        if header.head_tag() != self.config.head_tag {
            warn!(head_tag = header.head_tag(), "Unexpected head tag");
            return Err(FramerError::ReceiverApdu("Unexpected head tag"));
        }
        if header.index() != 0 && self.pending.is_empty() {
            return Err(FramerError::ReceiverApdu(
                "Continuation frame received before the first frame",
            ));
        }
        if usize::from(header.index()) != self.pending.len() {
            warn!(
                index = header.index(),
                expected = self.pending.len(),
                "Frame received out of order"
            );
            return Err(FramerError::ReceiverApdu("Frame received out of order"));
        }

        if let Some(length) = header.data_length() {
            self.expected_length = usize::from(length);
        }
        self.pending.push(frame);

        let received: usize = self.pending.iter().map(|f| f.data().len()).sum();
        if received < self.expected_length {
            trace!(
                received,
                expected = self.expected_length,
                "Awaiting more frames"
            );
            return Ok(None);
        }

        let mut message = BytesMut::with_capacity(received);
        for frame in self.pending.drain(..) {
            message.extend_from_slice(frame.data());
        }
        message.truncate(self.expected_length);
        let expected = std::mem::take(&mut self.expected_length);

        let response = ApduResponse::from_bytes(&message)
            .map_err(|_| FramerError::ResponseTooShort(expected))?;
        debug!(
            data_len = response.data().len(),
            status = %response.status(),
            "Response reassembled"
        );
        Ok(Some(response))
    }

    /// Drop any partially received message
    pub fn reset(&mut self) {
        if !self.pending.is_empty() {
            debug!(frames = self.pending.len(), "Discarding partial response");
        }
        self.pending.clear();
        self.expected_length = 0;
    }

    /// Whether no message is being reassembled
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexum_apdu_core::StatusWord;

    const RESPONSE_GET_VERSION: [u8; 64] = [
        0xaa, 0xaa, 0x05, 0x00, 0x00, 0x00, 0x21, 0x33, 0x00, 0x00, 0x04, 0x05, 0x32, 0x2e, 0x32,
        0x2e, 0x33, 0x04, 0xe6, 0x00, 0x00, 0x00, 0x04, 0x32, 0x2e, 0x33, 0x30, 0x04, 0x31, 0x2e,
        0x31, 0x36, 0x01, 0x01, 0x01, 0x00, 0x01, 0x00, 0x90, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00,
    ];

    fn locked_device() -> Vec<u8> {
        let mut frame = vec![0xaa, 0xaa, 0x05, 0x00, 0x00, 0x00, 0x02, 0x55, 0x15];
        frame.resize(64, 0);
        frame
    }

    fn usb_receiver() -> ApduReceiver {
        ApduReceiver::new(FramerConfig::usb_hid(0xAAAA))
    }

    fn ble_receiver() -> ApduReceiver {
        ApduReceiver::new(FramerConfig::ble())
    }

    #[test]
    fn test_single_frame_response() {
        let mut receiver = usb_receiver();
        let response = receiver
            .handle_frame(&RESPONSE_GET_VERSION)
            .unwrap()
            .unwrap();
        assert_eq!(response.data().as_ref(), &RESPONSE_GET_VERSION[7..38]);
        assert_eq!(response.status(), StatusWord::new(0x90, 0x00));
        assert!(receiver.is_idle());
    }

    #[test]
    fn test_status_only_response() {
        let mut receiver = usb_receiver();
        let response = receiver.handle_frame(&locked_device()).unwrap().unwrap();
        assert!(response.data().is_empty());
        assert!(response.status().is_locked_device());
    }

    #[test]
    fn test_ble_frame_without_channel() {
        let mut receiver = ble_receiver();
        let response = receiver
            .handle_frame(&RESPONSE_GET_VERSION[2..40])
            .unwrap()
            .unwrap();
        assert_eq!(response.data().as_ref(), &RESPONSE_GET_VERSION[7..38]);
        assert!(response.is_success());
    }

    #[test]
    fn test_partial_then_complete() {
        let mut receiver = ble_receiver();
        // announces 4 bytes, carries the 2 data bytes only
        let head = [0x05, 0x00, 0x00, 0x00, 0x04, 0xE0, 0x01];
        assert_eq!(receiver.handle_frame(&head), Ok(None));
        assert!(!receiver.is_idle());
        let response = receiver
            .handle_frame(&[0x05, 0x00, 0x01, 0x90, 0x00])
            .unwrap()
            .unwrap();
        assert_eq!(response.data().as_ref(), &[0xE0, 0x01]);
        assert!(response.is_success());
    }

    #[test]
    fn test_continuation_without_first_frame() {
        let mut receiver = ble_receiver();
        assert!(matches!(
            receiver.handle_frame(&[0x05, 0x00, 0x01, 0x90, 0x00]),
            Err(FramerError::ReceiverApdu(_))
        ));
    }

    #[test]
    fn test_out_of_order_frame() {
        let mut receiver = ble_receiver();
        receiver
            .handle_frame(&[0x05, 0x00, 0x00, 0x00, 0x08, 0x01])
            .unwrap();
        assert_eq!(
            receiver.handle_frame(&[0x05, 0x00, 0x02, 0x02]),
            Err(FramerError::ReceiverApdu("Frame received out of order"))
        );
        // pending frames survive until an explicit reset
        assert!(!receiver.is_idle());
        receiver.reset();
        assert!(receiver.is_idle());
    }

    #[test]
    fn test_truncated_headers() {
        let mut receiver = usb_receiver();
        assert_eq!(
            receiver.handle_frame(&RESPONSE_GET_VERSION[..4]),
            Err(FramerError::HeaderTooShort)
        );
        assert_eq!(
            receiver.handle_frame(&RESPONSE_GET_VERSION[..6]),
            Err(FramerError::HeaderTooShort)
        );
        assert_eq!(
            FramerError::HeaderTooShort.to_string(),
            "Unable to parse header from apdu"
        );
    }

    #[test]
    fn test_wrong_head_tag() {
        let mut receiver = ble_receiver();
        let frame = [0x08, 0x00, 0x00, 0x00, 0x02, 0x90, 0x00];
        assert_eq!(
            receiver.handle_frame(&frame),
            Err(FramerError::ReceiverApdu("Unexpected head tag"))
        );
    }

    #[test]
    fn test_message_without_status_word() {
        let mut receiver = ble_receiver();
        assert_eq!(
            receiver.handle_frame(&[0x05, 0x00, 0x00, 0x00, 0x01, 0x90]),
            Err(FramerError::ResponseTooShort(1))
        );
        assert!(receiver.is_idle());
    }
}
