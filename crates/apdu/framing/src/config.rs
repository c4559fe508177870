//! Configuration options for the framer

use crate::frame::HEAD_TAG;

/// Report size of HID transports
pub const USB_HID_FRAME_SIZE: usize = 64;

/// Configuration shared by a sender and receiver pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramerConfig {
    /// Frame size in bytes, header included. Unset until known.
    pub frame_size: Option<usize>,

    /// Channel identifier prefixed to every frame
    pub channel: Option<u16>,

    /// Zero fill every frame to the full frame size
    pub padding: bool,

    /// Protocol discriminator after the channel
    pub head_tag: u8,
}

impl Default for FramerConfig {
    fn default() -> Self {
        Self {
            frame_size: None,
            channel: None,
            padding: false,
            head_tag: HEAD_TAG,
        }
    }
}

impl FramerConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// HID transport: 64 byte reports, padded, on the given channel
    pub const fn usb_hid(channel: u16) -> Self {
        Self {
            frame_size: Some(USB_HID_FRAME_SIZE),
            channel: Some(channel),
            padding: true,
            head_tag: HEAD_TAG,
        }
    }

    /// BLE transport: no channel, no padding, frame size set once the MTU is negotiated
    pub const fn ble() -> Self {
        Self {
            frame_size: None,
            channel: None,
            padding: false,
            head_tag: HEAD_TAG,
        }
    }

    /// Set the frame size
    pub const fn with_frame_size(mut self, frame_size: usize) -> Self {
        self.frame_size = Some(frame_size);
        self
    }

    /// Set the channel
    pub const fn with_channel(mut self, channel: u16) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Set whether frames are zero padded
    pub const fn with_padding(mut self, padding: bool) -> Self {
        self.padding = padding;
        self
    }

    /// Set the head tag
    pub const fn with_head_tag(mut self, head_tag: u8) -> Self {
        self.head_tag = head_tag;
        self
    }
}
