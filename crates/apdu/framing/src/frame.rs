//! Frame and frame header model
//!
//! Wire layout, all integers big-endian:
//!
//! ```text
//! [channel: 2, optional][head tag: 1][index: 2][data length: 2, index 0 only][payload]
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use nexum_apdu_core::codec::ByteParser;

use crate::FramerError;

/// Default protocol discriminator
pub const HEAD_TAG: u8 = 0x05;
/// Length of the channel prefix
pub const CHANNEL_LENGTH: usize = 2;
/// Length of the head tag
pub const HEAD_TAG_LENGTH: usize = 1;
/// Length of the frame index
pub const INDEX_LENGTH: usize = 2;
/// Length of the total data length field
pub const DATA_LENGTH_LENGTH: usize = 2;

/// Length of the header of frame `index`
pub const fn header_length(has_channel: bool, index: u16) -> usize {
    let channel = if has_channel { CHANNEL_LENGTH } else { 0 };
    let data_length = if index == 0 { DATA_LENGTH_LENGTH } else { 0 };
    channel + HEAD_TAG_LENGTH + INDEX_LENGTH + data_length
}

/// Header of a single frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    channel: Option<u16>,
    head_tag: u8,
    index: u16,
    data_length: Option<u16>,
}

impl FrameHeader {
    /// Header of the first frame, carrying the total message length
    pub const fn first(channel: Option<u16>, head_tag: u8, data_length: u16) -> Self {
        Self {
            channel,
            head_tag,
            index: 0,
            data_length: Some(data_length),
        }
    }

    /// Header of a continuation frame
    pub const fn continuation(channel: Option<u16>, head_tag: u8, index: u16) -> Self {
        Self {
            channel,
            head_tag,
            index,
            data_length: None,
        }
    }

    /// Channel identifier, if the transport multiplexes channels
    pub const fn channel(&self) -> Option<u16> {
        self.channel
    }

    /// Protocol discriminator
    pub const fn head_tag(&self) -> u8 {
        self.head_tag
    }

    /// Position of the frame within its message
    pub const fn index(&self) -> u16 {
        self.index
    }

    /// Total message length, present on the first frame only
    pub const fn data_length(&self) -> Option<u16> {
        self.data_length
    }

    /// Encoded header length
    pub const fn encoded_len(&self) -> usize {
        header_length(self.channel.is_some(), self.index)
    }

    /// Append the encoded header to `buffer`
    pub fn write_to(&self, buffer: &mut BytesMut) {
        if let Some(channel) = self.channel {
            buffer.put_u16(channel);
        }
        buffer.put_u8(self.head_tag);
        buffer.put_u16(self.index);
        if let Some(length) = self.data_length {
            buffer.put_u16(length);
        }
    }
}

/// A header plus the slice of the message it carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    header: FrameHeader,
    data: Bytes,
}

impl Frame {
    /// Create a new frame
    pub const fn new(header: FrameHeader, data: Bytes) -> Self {
        Self { header, data }
    }

    /// Parse a raw frame
    ///
    /// `has_channel` tells whether a two byte channel prefix is expected.
    pub fn parse(raw: &[u8], has_channel: bool) -> Result<Self, FramerError> {
        let mut parser = ByteParser::new(raw);
        let channel = if has_channel {
            Some(parser.read_u16().ok_or(FramerError::HeaderTooShort)?)
        } else {
            None
        };
        let head_tag = parser.read_u8().ok_or(FramerError::HeaderTooShort)?;
        let index = parser.read_u16().ok_or(FramerError::HeaderTooShort)?;
        let header = if index == 0 {
            let length = parser.read_u16().ok_or(FramerError::HeaderTooShort)?;
            FrameHeader::first(channel, head_tag, length)
        } else {
            FrameHeader::continuation(channel, head_tag, index)
        };
        let data = Bytes::copy_from_slice(&raw[parser.offset()..]);
        Ok(Self { header, data })
    }

    /// Frame header
    pub const fn header(&self) -> &FrameHeader {
        &self.header
    }

    /// Frame payload
    pub const fn data(&self) -> &Bytes {
        &self.data
    }

    /// Encoded frame length
    pub fn size(&self) -> usize {
        self.header.encoded_len() + self.data.len()
    }

    /// Encode header and payload
    pub fn to_bytes(&self) -> Bytes {
        let mut buffer = BytesMut::with_capacity(self.size());
        self.header.write_to(&mut buffer);
        buffer.put_slice(&self.data);
        buffer.freeze()
    }
}
