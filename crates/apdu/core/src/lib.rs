//! Core types for APDU (Application Protocol Data Unit) operations
//!
//! This crate provides the foundational types shared by the framing layer and
//! the device action engine:
//!
//! - [`Apdu`] commands and the [`ApduBuilder`] for their payloads
//! - [`ApduResponse`] and [`StatusWord`] interpretation
//! - the [`Command`] trait tying a command to its response decoder
//! - big-endian byte codecs in [`codec`]
//! - the crate [`Error`] with context layering
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

// Re-export bytes for convenience
pub use bytes::{Bytes, BytesMut};

pub mod codec;
pub mod command;
pub mod error;
pub mod response;

pub use command::{APDU_MAX_PAYLOAD, Apdu, ApduBuilder, Command};
pub use error::{Error, ResultExt};
pub use response::ApduResponse;
pub use response::status::StatusWord;

/// Prelude module containing commonly used traits and types
pub mod prelude {
    // Core types
    pub use crate::{Bytes, BytesMut, Error, ResultExt};

    // Command related
    pub use crate::{Apdu, ApduBuilder, Command};

    // Response related
    pub use crate::response::ApduResponse;
    pub use crate::response::status::{StatusWord, common as status};

    // Codecs
    pub use crate::codec::{ByteBuilder, ByteParser, TaggedField};
}
