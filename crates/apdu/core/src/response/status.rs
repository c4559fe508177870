//! Two-byte status trailer of device responses
//!
//! `90 00` is the only success code. Hardware wallets also report a handful
//! of codes outside ISO/IEC 7816-4 (locked device, user refusal, missing app)
//! that device actions branch on.

use std::fmt;

use tracing::Level;

/// Status word closing every response, `SW1 SW2`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusWord {
    /// High byte
    pub sw1: u8,
    /// Low byte
    pub sw2: u8,
}

impl StatusWord {
    /// Status word from its two bytes
    pub const fn new(sw1: u8, sw2: u8) -> Self {
        Self { sw1, sw2 }
    }

    /// Status word from its big-endian value, e.g. `0x6985`
    pub const fn from_u16(value: u16) -> Self {
        let [sw1, sw2] = value.to_be_bytes();
        Self { sw1, sw2 }
    }

    /// Big-endian value
    pub const fn to_u16(&self) -> u16 {
        u16::from_be_bytes([self.sw1, self.sw2])
    }

    /// `90 00`
    pub const fn is_success(&self) -> bool {
        self.to_u16() == 0x9000
    }

    /// ISO warning groups `62 xx` and `63 xx`
    pub const fn is_warning(&self) -> bool {
        matches!(self.sw1, 0x62 | 0x63)
    }

    /// Device is locked behind its PIN (`55 15`)
    pub const fn is_locked_device(&self) -> bool {
        self.to_u16() == 0x5515
    }

    /// User rejected the request on the device (`69 85` or `55 01`)
    pub const fn is_refused_by_user(&self) -> bool {
        matches!(self.to_u16(), 0x6985 | 0x5501)
    }

    /// Command not understood by the running app (`6E 00` or `6D 00`)
    pub const fn is_wrong_app(&self) -> bool {
        matches!(self.to_u16(), 0x6E00 | 0x6D00)
    }

    /// Requested app is not installed (`68 07`)
    pub const fn is_app_not_found(&self) -> bool {
        self.to_u16() == 0x6807
    }

    /// Level at which a response carrying this status is logged
    ///
    /// Lock screens and refusals are normal outcomes of an interactive flow,
    /// so only unexpected codes reach `WARN`.
    pub const fn tracing_level(&self) -> Level {
        if self.is_success() {
            Level::DEBUG
        } else if self.is_warning() || self.is_locked_device() || self.is_refused_by_user() {
            Level::INFO
        } else {
            Level::WARN
        }
    }

    /// Human readable meaning
    pub const fn description(&self) -> &'static str {
        match self.to_u16() {
            0x9000 => "Success",
            0x5501 => "Action refused on device",
            0x5515 => "Device locked",
            0x5A01 => "Command disabled while the device is busy",
            0x662F => "Device in recovery mode",
            0x6807 => "Application not found",
            0x6700 => "Wrong length",
            0x6982 => "Security status not satisfied",
            0x6985 => "Conditions of use not satisfied",
            0x6A80 => "Invalid data",
            0x6A84 => "Not enough space on device",
            0x6B00 => "Invalid parameter",
            0x6D00 => "Instruction not supported by the running app",
            0x6E00 => "Class not supported by the running app",
            0x6F00 => "Technical problem",
            sw if sw >> 8 == 0x62 || sw >> 8 == 0x63 => "Warning",
            _ => "Unknown status word",
        }
    }
}

impl From<(u8, u8)> for StatusWord {
    fn from((sw1, sw2): (u8, u8)) -> Self {
        Self::new(sw1, sw2)
    }
}

impl From<u16> for StatusWord {
    fn from(value: u16) -> Self {
        Self::from_u16(value)
    }
}

impl From<StatusWord> for u16 {
    fn from(status: StatusWord) -> Self {
        status.to_u16()
    }
}

impl fmt::Display for StatusWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X} {:02X}", self.sw1, self.sw2)
    }
}

/// Status words device actions compare against
pub mod common {
    use super::StatusWord;

    /// `90 00`
    pub const SUCCESS: StatusWord = StatusWord::from_u16(0x9000);

    /// `55 15`
    pub const LOCKED_DEVICE: StatusWord = StatusWord::from_u16(0x5515);

    /// `69 85`
    pub const REFUSED_BY_USER: StatusWord = StatusWord::from_u16(0x6985);

    /// `68 07`
    pub const APP_NOT_FOUND: StatusWord = StatusWord::from_u16(0x6807);

    /// `6D 00`
    pub const INVALID_INSTRUCTION: StatusWord = StatusWord::from_u16(0x6D00);

    /// `6E 00`
    pub const CLASS_NOT_SUPPORTED: StatusWord = StatusWord::from_u16(0x6E00);
}
