//! Framing of APDU exchanges over packet transports
//!
//! HID and BLE links carry fixed size packets, so commands are split into
//! frames by the [`ApduSender`] and responses rebuilt from frames by the
//! [`ApduReceiver`]. [`FramedSession`] pairs both with a [`FrameTransport`]
//! to run a full command exchange.
//!
//! ## Example
//!
//! ```
//! use nexum_apdu_framing::prelude::*;
//!
//! let config = FramerConfig::new().with_frame_size(10);
//! let frames = ApduSender::new(config).get_frames(&[0x01, 0x02, 0x03, 0x90, 0x00]).unwrap();
//!
//! let mut receiver = ApduReceiver::new(config);
//! let response = receiver.handle_frame(&frames[0].to_bytes()).unwrap().unwrap();
//! assert_eq!(response.data().as_ref(), &[0x01, 0x02, 0x03]);
//! assert!(response.is_success());
//! ```
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod frame;
pub mod receiver;
pub mod sender;
pub mod session;
pub mod transport;

pub use config::FramerConfig;
pub use error::{FramerError, SessionError, TransportError};
pub use frame::{Frame, FrameHeader};
pub use receiver::ApduReceiver;
pub use sender::ApduSender;
pub use session::FramedSession;
pub use transport::FrameTransport;

/// Prelude module containing commonly used traits and types
pub mod prelude {
    pub use crate::{
        ApduReceiver, ApduSender, Frame, FrameHeader, FrameTransport, FramedSession, FramerConfig,
        FramerError, SessionError, TransportError,
    };
}
