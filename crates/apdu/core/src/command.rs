//! APDU command definitions and traits
//!
//! A command is the logical `[CLA][INS][P1][P2][Lc][Data]` unit that the
//! framing layer splits into transport frames.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use derive_more::{Deref, DerefMut};

use crate::codec::ByteBuilder;
use crate::{ApduResponse, Error};

/// Length of the CLA, INS, P1, P2 and Lc bytes
pub const HEADER_LENGTH: usize = 5;

/// Largest data field a short APDU can carry
pub const APDU_MAX_PAYLOAD: usize = 255;

/// Largest serialised command
pub const APDU_MAX_SIZE: usize = APDU_MAX_PAYLOAD + HEADER_LENGTH;

/// Logical APDU command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Apdu {
    /// Command class byte
    pub cla: u8,
    /// Instruction byte
    pub ins: u8,
    /// Parameter 1
    pub p1: u8,
    /// Parameter 2
    pub p2: u8,
    data: Bytes,
}

impl Apdu {
    /// Create a new command with just the header bytes
    pub const fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: Bytes::new(),
        }
    }

    /// Attach a data field
    pub fn with_data(mut self, data: impl Into<Bytes>) -> Result<Self, Error> {
        let data = data.into();
        if data.len() > APDU_MAX_PAYLOAD {
            return Err(Error::InvalidCommandLength(data.len()));
        }
        self.data = data;
        Ok(self)
    }

    /// Command data field
    pub const fn data(&self) -> &Bytes {
        &self.data
    }

    /// Length of the serialised command
    pub fn command_length(&self) -> usize {
        HEADER_LENGTH + self.data.len()
    }

    /// Serialise the command. Lc is always present, zero when there is no data.
    pub fn to_bytes(&self) -> Bytes {
        let mut buffer = BytesMut::with_capacity(self.command_length());
        buffer.put_u8(self.cla);
        buffer.put_u8(self.ins);
        buffer.put_u8(self.p1);
        buffer.put_u8(self.p2);
        // data is capped at APDU_MAX_PAYLOAD on every constructor
        buffer.put_u8(self.data.len() as u8);
        buffer.put_slice(&self.data);
        buffer.freeze()
    }

    /// Parse a serialised command
    pub fn from_bytes(raw: &[u8]) -> Result<Self, Error> {
        if raw.len() < HEADER_LENGTH {
            return Err(Error::InvalidCommandLength(raw.len()));
        }
        let lc = raw[4] as usize;
        if raw.len() != HEADER_LENGTH + lc {
            return Err(Error::InvalidCommandData("Lc does not match data length"));
        }
        let data = Bytes::copy_from_slice(&raw[HEADER_LENGTH..]);
        Self::new(raw[0], raw[1], raw[2], raw[3]).with_data(data)
    }
}

impl fmt::Display for Apdu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.to_bytes()))
    }
}

/// Builder for [`Apdu`] payloads
///
/// Dereferences to a [`ByteBuilder`] capped at [`APDU_MAX_PAYLOAD`], so all
/// of its field encoders are available.
///
/// ```
/// use nexum_apdu_core::ApduBuilder;
///
/// let mut builder = ApduBuilder::new(0xE0, 0xD8, 0x00, 0x00);
/// builder.encode_lv_ascii("Bitcoin");
/// let apdu = builder.build();
/// assert_eq!(apdu.to_bytes()[4], 8);
/// ```
#[derive(Debug, Clone, Deref, DerefMut)]
pub struct ApduBuilder {
    cla: u8,
    ins: u8,
    p1: u8,
    p2: u8,
    #[deref]
    #[deref_mut]
    payload: ByteBuilder,
}

impl ApduBuilder {
    /// Start a command with the given header
    pub fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            payload: ByteBuilder::new(APDU_MAX_PAYLOAD),
        }
    }

    /// Build the command with whatever payload was accepted
    pub fn build(&self) -> Apdu {
        Apdu {
            cla: self.cla,
            ins: self.ins,
            p1: self.p1,
            p2: self.p2,
            data: self.payload.build(),
        }
    }

    /// Build the command, failing on the first rejected payload value
    pub fn try_build(&self) -> Result<Apdu, Error> {
        let data = self.payload.try_build()?;
        Ok(Apdu {
            cla: self.cla,
            ins: self.ins,
            p1: self.p1,
            p2: self.p2,
            data,
        })
    }
}

/// A typed device command
///
/// Implementors describe how to serialise themselves and how to interpret
/// the response. Transport and framing are handled elsewhere.
pub trait Command {
    /// Decoded response type
    type Response;

    /// Command-specific error type
    type Error: fmt::Debug;

    /// The APDU to send
    fn apdu(&self) -> Apdu;

    /// Interpret the device response
    fn parse_response(&self, response: ApduResponse) -> Result<Self::Response, Self::Error>;
}
