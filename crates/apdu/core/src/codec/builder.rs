//! Append-only payload builder with a size cap

use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

/// Largest payload a builder accepts when no cap is given
pub const DEFAULT_MAX_SIZE: usize = u32::MAX as usize;

/// Value rejected by a [`ByteBuilder`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuilderError {
    /// Appending would exceed the maximum payload size
    #[error("Data overflow: {len} bytes requested, {available} available")]
    DataOverflow {
        /// Bytes that were to be appended
        len: usize,
        /// Bytes still available
        available: usize,
    },

    /// Value does not fit in its encoding
    #[error("Value overflow: {value} exceeds {max}")]
    ValueOverflow {
        /// Offending value
        value: usize,
        /// Largest encodable value
        max: usize,
    },

    /// String is not valid, non-empty hex
    #[error("Invalid hex string: {0:?}")]
    HexEncode(String),
}

/// Builds a byte payload field by field
///
/// Rejected values are recorded and skipped, so a chain of appends never
/// fails midway. Inspect [`errors`](Self::errors) or call
/// [`try_build`](Self::try_build) to surface them.
///
/// ```
/// use nexum_apdu_core::codec::ByteBuilder;
///
/// let mut builder = ByteBuilder::new(8);
/// builder.add_u8(0x05).add_u16(0x0607).add_hex("0x0809");
/// assert_eq!(builder.build().as_ref(), &[0x05, 0x06, 0x07, 0x08, 0x09]);
/// assert_eq!(builder.available(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct ByteBuilder {
    data: BytesMut,
    max_size: usize,
    errors: Vec<BuilderError>,
}

impl Default for ByteBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE)
    }
}

impl ByteBuilder {
    /// Create a builder accepting at most `max_size` bytes
    pub fn new(max_size: usize) -> Self {
        Self {
            data: BytesMut::new(),
            max_size,
            errors: Vec::new(),
        }
    }

    /// Append a byte
    pub fn add_u8(&mut self, value: u8) -> &mut Self {
        self.add_bytes(&[value])
    }

    /// Append a big-endian u16
    pub fn add_u16(&mut self, value: u16) -> &mut Self {
        self.add_bytes(&value.to_be_bytes())
    }

    /// Append a little-endian u16
    pub fn add_u16_le(&mut self, value: u16) -> &mut Self {
        self.add_bytes(&value.to_le_bytes())
    }

    /// Append a big-endian i16
    pub fn add_i16(&mut self, value: i16) -> &mut Self {
        self.add_bytes(&value.to_be_bytes())
    }

    /// Append a little-endian i16
    pub fn add_i16_le(&mut self, value: i16) -> &mut Self {
        self.add_bytes(&value.to_le_bytes())
    }

    /// Append a big-endian u32
    pub fn add_u32(&mut self, value: u32) -> &mut Self {
        self.add_bytes(&value.to_be_bytes())
    }

    /// Append a little-endian u32
    pub fn add_u32_le(&mut self, value: u32) -> &mut Self {
        self.add_bytes(&value.to_le_bytes())
    }

    /// Append a big-endian i32
    pub fn add_i32(&mut self, value: i32) -> &mut Self {
        self.add_bytes(&value.to_be_bytes())
    }

    /// Append a little-endian i32
    pub fn add_i32_le(&mut self, value: i32) -> &mut Self {
        self.add_bytes(&value.to_le_bytes())
    }

    /// Append a big-endian u64
    pub fn add_u64(&mut self, value: u64) -> &mut Self {
        self.add_bytes(&value.to_be_bytes())
    }

    /// Append a little-endian u64
    pub fn add_u64_le(&mut self, value: u64) -> &mut Self {
        self.add_bytes(&value.to_le_bytes())
    }

    /// Append a big-endian i64
    pub fn add_i64(&mut self, value: i64) -> &mut Self {
        self.add_bytes(&value.to_be_bytes())
    }

    /// Append a little-endian i64
    pub fn add_i64_le(&mut self, value: i64) -> &mut Self {
        self.add_bytes(&value.to_le_bytes())
    }

    /// Append raw bytes if they fit
    pub fn add_bytes(&mut self, value: &[u8]) -> &mut Self {
        if self.ensure_fits(value.len()) {
            self.data.put_slice(value);
        }
        self
    }

    /// Append a hex string, with or without `0x` prefix
    pub fn add_hex(&mut self, value: &str) -> &mut Self {
        if let Some(bytes) = self.decode_hex(value) {
            self.add_bytes(&bytes);
        }
        self
    }

    /// Append the bytes of an ASCII string
    pub fn add_ascii(&mut self, value: &str) -> &mut Self {
        self.add_bytes(value.as_bytes())
    }

    /// Append a length-value field from raw bytes
    pub fn encode_lv_bytes(&mut self, value: &[u8]) -> &mut Self {
        if let Some(length) = self.lv_length(value.len())
            && self.ensure_fits(value.len() + 1)
        {
            self.data.put_u8(length);
            self.data.put_slice(value);
        }
        self
    }

    /// Append a length-value field from a hex string
    pub fn encode_lv_hex(&mut self, value: &str) -> &mut Self {
        if let Some(bytes) = self.decode_hex(value) {
            self.encode_lv_bytes(&bytes);
        }
        self
    }

    /// Append a length-value field from an ASCII string
    pub fn encode_lv_ascii(&mut self, value: &str) -> &mut Self {
        self.encode_lv_bytes(value.as_bytes())
    }

    /// Append a tag-length-value field from raw bytes
    ///
    /// The tag is only written when the whole field fits.
    pub fn encode_tlv_bytes(&mut self, tag: u8, value: &[u8]) -> &mut Self {
        if let Some(length) = self.lv_length(value.len())
            && self.ensure_fits(value.len() + 2)
        {
            self.data.put_u8(tag);
            self.data.put_u8(length);
            self.data.put_slice(value);
        }
        self
    }

    /// Append a tag-length-value field from a hex string
    pub fn encode_tlv_hex(&mut self, tag: u8, value: &str) -> &mut Self {
        if let Some(bytes) = self.decode_hex(value) {
            self.encode_tlv_bytes(tag, &bytes);
        }
        self
    }

    /// Append a tag-length-value field holding a big-endian u64
    pub fn encode_tlv_u64(&mut self, tag: u8, value: u64) -> &mut Self {
        self.encode_tlv_bytes(tag, &value.to_be_bytes())
    }

    /// Bytes that can still be appended
    pub fn available(&self) -> usize {
        self.max_size.saturating_sub(self.data.len())
    }

    /// Number of bytes written so far
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether nothing has been written
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Errors recorded so far
    pub fn errors(&self) -> &[BuilderError] {
        &self.errors
    }

    /// Whether any value was rejected
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Current payload, ignoring recorded errors
    pub fn build(&self) -> Bytes {
        Bytes::copy_from_slice(&self.data)
    }

    /// Current payload, or the first recorded error
    pub fn try_build(&self) -> Result<Bytes, BuilderError> {
        match self.errors.first() {
            Some(err) => Err(err.clone()),
            None => Ok(self.build()),
        }
    }

    fn ensure_fits(&mut self, len: usize) -> bool {
        let available = self.available();
        if len > available {
            debug!(len, available, "Rejecting value that overflows payload");
            let overflow = BuilderError::DataOverflow { len, available };
            self.errors.push(overflow);
            return false;
        }
        true
    }

    fn lv_length(&mut self, len: usize) -> Option<u8> {
        match u8::try_from(len) {
            Ok(length) => Some(length),
            Err(_) => {
                self.errors.push(BuilderError::ValueOverflow {
                    value: len,
                    max: u8::MAX as usize,
                });
                None
            }
        }
    }

    fn decode_hex(&mut self, value: &str) -> Option<Vec<u8>> {
        let digits = value.strip_prefix("0x").unwrap_or(value);
        match hex::decode(digits) {
            Ok(bytes) if !bytes.is_empty() => Some(bytes),
            _ => {
                self.errors.push(BuilderError::HexEncode(value.to_string()));
                None
            }
        }
    }
}
