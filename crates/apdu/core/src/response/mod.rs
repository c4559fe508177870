//! APDU response definitions
//!
//! A response is the data returned by the device followed by a two byte
//! status word.

pub mod status;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::Error;
use status::StatusWord;

/// Reassembled response to an APDU command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApduResponse {
    /// Response payload data
    data: Bytes,
    /// Status word
    status: StatusWord,
}

impl ApduResponse {
    /// Create a new response with data and status
    pub fn new(data: impl Into<Bytes>, status: impl Into<StatusWord>) -> Self {
        Self {
            data: data.into(),
            status: status.into(),
        }
    }

    /// Create a success response
    pub fn success(data: impl Into<Bytes>) -> Self {
        Self::new(data, status::common::SUCCESS)
    }

    /// Parse response from raw bytes (data followed by the status word)
    pub fn from_bytes(raw: &[u8]) -> Result<Self, Error> {
        let Some(split) = raw.len().checked_sub(2) else {
            return Err(Error::parse("Response too short for a status word"));
        };
        let status = StatusWord::new(raw[split], raw[split + 1]);
        let data = Bytes::copy_from_slice(&raw[..split]);

        trace!(
            sw1 = format_args!("{:#04x}", status.sw1),
            sw2 = format_args!("{:#04x}", status.sw2),
            data_len = data.len(),
            "Parsed APDU response"
        );

        Ok(Self { data, status })
    }

    /// Serialise back to the data plus status word layout
    pub fn to_bytes(&self) -> Bytes {
        let mut buffer = BytesMut::with_capacity(self.data.len() + 2);
        buffer.put_slice(&self.data);
        buffer.put_u8(self.status.sw1);
        buffer.put_u8(self.status.sw2);
        buffer.freeze()
    }

    /// Response data without the status word
    pub const fn data(&self) -> &Bytes {
        &self.data
    }

    /// Status word of the response
    pub const fn status(&self) -> StatusWord {
        self.status
    }

    /// Check if the response indicates success
    pub const fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Data on success, a status error otherwise
    pub fn into_result(self) -> Result<Bytes, Error> {
        if self.is_success() {
            Ok(self.data)
        } else {
            Err(Error::status(self.status))
        }
    }
}

impl TryFrom<&[u8]> for ApduResponse {
    type Error = Error;

    fn try_from(raw: &[u8]) -> Result<Self, Error> {
        Self::from_bytes(raw)
    }
}
