//! Command splitting
//!
//! Each frame carries `frame_size - header_length` bytes of the command. The
//! first frame has a larger header since it also announces the total length.

use bytes::{Bytes, BytesMut};
use tracing::{debug, instrument, trace};

use crate::FramerError;
use crate::config::FramerConfig;
use crate::frame::{Frame, FrameHeader, header_length};

/// Splits serialised commands into frames
#[derive(Debug, Clone, Default)]
pub struct ApduSender {
    config: FramerConfig,
}

impl ApduSender {
    /// Create a sender from a framer configuration
    pub const fn new(config: FramerConfig) -> Self {
        Self { config }
    }

    /// Current configuration
    pub const fn config(&self) -> &FramerConfig {
        &self.config
    }

    /// Set the frame size, typically once the transport MTU is known
    pub const fn set_frame_size(&mut self, frame_size: usize) {
        self.config.frame_size = Some(frame_size);
    }

    /// Split `apdu` into frames
    ///
    /// The first frame is always produced, even for an empty command. No
    /// trailing empty frame is produced when the command length is an exact
    /// multiple of the per-frame capacity.
    #[instrument(level = "trace", skip_all, fields(len = apdu.len()))]
    pub fn get_frames(&self, apdu: &[u8]) -> Result<Vec<Frame>, FramerError> {
        let frame_size = self.config.frame_size.ok_or(FramerError::FrameSizeUnset)?;
        let Ok(total) = u16::try_from(apdu.len()) else {
            return Err(FramerError::ApduTooLong(apdu.len()));
        };

        let mut frames = Vec::new();
        let mut offset = 0;
        let mut index = 0u16;
        while let Some(frame) = self.frame_at(apdu, index, offset, frame_size, total)? {
            trace!(index, frame = %hex::encode(frame.to_bytes()), "Built frame");
            offset += frame_size - frame.header().encoded_len();
            frames.push(frame);
            index = match index.checked_add(1) {
                Some(next) => next,
                None => break,
            };
        }

        debug!(
            count = frames.len(),
            frame_size,
            "Command split into frames"
        );
        Ok(frames)
    }

    /// Frame `index` of `apdu`, or `None` once the command is exhausted
    fn frame_at(
        &self,
        apdu: &[u8],
        index: u16,
        offset: usize,
        frame_size: usize,
        total: u16,
    ) -> Result<Option<Frame>, FramerError> {
        if index > 0 && offset >= apdu.len() {
            return Ok(None);
        }

        let header_len = header_length(self.config.channel.is_some(), index);
        if header_len >= frame_size {
            return Err(FramerError::FramerApdu {
                header_len,
                frame_size,
            });
        }

        let header = if index == 0 {
            FrameHeader::first(self.config.channel, self.config.head_tag, total)
        } else {
            FrameHeader::continuation(self.config.channel, self.config.head_tag, index)
        };

        let capacity = frame_size - header_len;
        let chunk = &apdu[offset..apdu.len().min(offset + capacity)];
        let data = if self.config.padding {
            let mut padded = BytesMut::zeroed(capacity);
            padded[..chunk.len()].copy_from_slice(chunk);
            padded.freeze()
        } else {
            Bytes::copy_from_slice(chunk)
        };

        Ok(Some(Frame::new(header, data)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GET_VERSION: [u8; 5] = [0xE0, 0x01, 0x00, 0x00, 0x00];

    const DEVICE_NAME: &[u8] = b"Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do ";

    // editDeviceName with a 64 byte name
    fn edit_device_name() -> Vec<u8> {
        let mut apdu = vec![0xE0, 0xD4, 0x00, 0x00, 0x40];
        apdu.extend(DEVICE_NAME);
        apdu
    }

    #[test]
    fn test_frame_size_unset() {
        let sender = ApduSender::new(FramerConfig::ble());
        assert_eq!(
            sender.get_frames(&GET_VERSION),
            Err(FramerError::FrameSizeUnset)
        );
    }

    #[test]
    fn test_set_frame_size() {
        let mut sender = ApduSender::new(FramerConfig::ble());
        sender.set_frame_size(20);
        let frames = sender.get_frames(&GET_VERSION).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(
            frames[0].to_bytes().as_ref(),
            &[0x05, 0x00, 0x00, 0x00, 0x05, 0xE0, 0x01, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_usb_single_padded_frame() {
        let sender = ApduSender::new(FramerConfig::usb_hid(0x1234));
        let frames = sender.get_frames(&GET_VERSION).unwrap();
        assert_eq!(frames.len(), 1);

        let bytes = frames[0].to_bytes();
        assert_eq!(bytes.len(), 64);
        assert_eq!(&bytes[..7], &[0x12, 0x34, 0x05, 0x00, 0x00, 0x00, 0x05]);
        assert_eq!(&bytes[7..12], &GET_VERSION);
        assert!(bytes[12..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_usb_two_padded_frames() {
        let apdu = edit_device_name();
        assert_eq!(apdu.len(), 69);
        let sender = ApduSender::new(FramerConfig::usb_hid(0x1234));
        let frames = sender.get_frames(&apdu).unwrap();
        assert_eq!(frames.len(), 2);

        assert_eq!(frames[0].header().data_length(), Some(0x0045));
        assert_eq!(frames[0].data().as_ref(), &apdu[..57]);

        assert_eq!(frames[1].header().index(), 1);
        assert_eq!(frames[1].header().data_length(), None);
        assert_eq!(frames[1].data().len(), 59);
        assert_eq!(&frames[1].data()[..12], &apdu[57..]);
        assert!(frames[1].data()[12..].iter().all(|&b| b == 0));
        assert_eq!(frames[1].to_bytes().len(), 64);
    }

    #[test]
    fn test_no_padding_keeps_exact_length() {
        let sender = ApduSender::new(FramerConfig::new().with_frame_size(64).with_channel(0x1234));
        let frames = sender.get_frames(&GET_VERSION).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data().as_ref(), &GET_VERSION);
        assert_eq!(frames[0].size(), 12);
    }

    #[test]
    fn test_small_frames_without_channel() {
        let apdu = hex::decode("01054f4c4f5300072e322e342d32009000").unwrap();
        assert_eq!(apdu.len(), 17);
        let sender = ApduSender::new(FramerConfig::new().with_frame_size(10));
        let frames = sender.get_frames(&apdu).unwrap();

        let sizes: Vec<_> = frames.iter().map(|f| f.data().len()).collect();
        assert_eq!(sizes, vec![5, 7, 5]);
        let joined: Vec<u8> = frames.iter().flat_map(|f| f.data().to_vec()).collect();
        assert_eq!(joined, apdu);
    }

    #[test]
    fn test_exact_multiple_has_no_trailing_frame() {
        // capacities are 5 then 7
        let sender = ApduSender::new(FramerConfig::new().with_frame_size(10));
        assert_eq!(sender.get_frames(&[0xAA; 5]).unwrap().len(), 1);
        assert_eq!(sender.get_frames(&[0xAA; 12]).unwrap().len(), 2);
        assert_eq!(sender.get_frames(&[0xAA; 13]).unwrap().len(), 3);
    }

    #[test]
    fn test_empty_command_is_header_only() {
        let sender = ApduSender::new(FramerConfig::new().with_frame_size(10));
        let frames = sender.get_frames(&[]).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(
            frames[0].to_bytes().as_ref(),
            &[0x05, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_header_does_not_fit() {
        let sender = ApduSender::new(FramerConfig::new().with_frame_size(7).with_channel(1));
        assert_eq!(
            sender.get_frames(&GET_VERSION),
            Err(FramerError::FramerApdu {
                header_len: 7,
                frame_size: 7,
            })
        );
    }

    #[test]
    fn test_apdu_too_long() {
        let sender = ApduSender::new(FramerConfig::usb_hid(1));
        let apdu = vec![0u8; 0x1_0000];
        assert_eq!(
            sender.get_frames(&apdu),
            Err(FramerError::ApduTooLong(0x1_0000))
        );
    }
}
