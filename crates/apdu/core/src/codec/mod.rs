//! Byte codecs for command payloads and response data
//!
//! [`ByteParser`] walks a response with a cursor and never panics on short
//! input, while [`ByteBuilder`] appends fields and records every rejected
//! value instead of failing eagerly.

mod builder;
mod parser;

pub use builder::{BuilderError, ByteBuilder};
pub use parser::{ByteParser, TaggedField};
