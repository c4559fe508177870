//! Cursor based reader over a response buffer

/// Tag-length-value field read by [`ByteParser::read_tlv`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaggedField<'a> {
    /// Field tag
    pub tag: u8,
    /// Field value
    pub value: &'a [u8],
}

/// Reads fields from a byte buffer, advancing an internal offset
///
/// Every read either consumes exactly the bytes it returns or leaves the
/// offset untouched and returns `None`.
///
/// ```
/// use nexum_apdu_core::codec::ByteParser;
///
/// let mut parser = ByteParser::new(&[0x01, 0x03, b'a', b'p', b'p']);
/// assert_eq!(parser.read_u8(), Some(0x01));
/// assert_eq!(parser.read_lv(), Some(&b"app"[..]));
/// assert_eq!(parser.remaining(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct ByteParser<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> ByteParser<'a> {
    /// Create a parser positioned at the start of `buffer`
    pub const fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    /// Whether at least `length` bytes are left to read
    pub const fn test_minimal_length(&self, length: usize) -> bool {
        length <= self.remaining()
    }

    /// Read a single byte
    pub fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    /// Read a big-endian u16
    pub fn read_u16(&mut self) -> Option<u16> {
        self.take().map(u16::from_be_bytes)
    }

    /// Read a little-endian u16
    pub fn read_u16_le(&mut self) -> Option<u16> {
        self.take().map(u16::from_le_bytes)
    }

    /// Read a big-endian i16
    pub fn read_i16(&mut self) -> Option<i16> {
        self.take().map(i16::from_be_bytes)
    }

    /// Read a little-endian i16
    pub fn read_i16_le(&mut self) -> Option<i16> {
        self.take().map(i16::from_le_bytes)
    }

    /// Read a big-endian u32
    pub fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_be_bytes)
    }

    /// Read a little-endian u32
    pub fn read_u32_le(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    /// Read a big-endian i32
    pub fn read_i32(&mut self) -> Option<i32> {
        self.take().map(i32::from_be_bytes)
    }

    /// Read a little-endian i32
    pub fn read_i32_le(&mut self) -> Option<i32> {
        self.take().map(i32::from_le_bytes)
    }

    /// Read a big-endian u64
    pub fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_be_bytes)
    }

    /// Read a little-endian u64
    pub fn read_u64_le(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    /// Read a big-endian i64
    pub fn read_i64(&mut self) -> Option<i64> {
        self.take().map(i64::from_be_bytes)
    }

    /// Read a little-endian i64
    pub fn read_i64_le(&mut self) -> Option<i64> {
        self.take().map(i64::from_le_bytes)
    }

    /// Read exactly `length` bytes
    pub fn read_bytes(&mut self, length: usize) -> Option<&'a [u8]> {
        let end = self.offset.checked_add(length)?;
        let field = self.buffer.get(self.offset..end)?;
        self.offset = end;
        Some(field)
    }

    /// Read a length-value field with a one byte length prefix
    ///
    /// A zero length yields an empty field. If the value is truncated the
    /// length byte is given back.
    pub fn read_lv(&mut self) -> Option<&'a [u8]> {
        let length = self.read_u8()?;
        let field = self.read_bytes(length as usize);
        if field.is_none() {
            self.offset -= 1;
        }
        field
    }

    /// Read a tag followed by a length-value field
    ///
    /// On failure the whole field, tag included, is left unread.
    pub fn read_tlv(&mut self) -> Option<TaggedField<'a>> {
        if !self.test_minimal_length(2) {
            return None;
        }
        let start = self.offset;
        let tag = self.read_u8()?;
        match self.read_lv() {
            Some(value) => Some(TaggedField { tag, value }),
            None => {
                self.offset = start;
                None
            }
        }
    }

    /// Current read offset
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Number of bytes not read yet
    pub const fn remaining(&self) -> usize {
        self.buffer.len() - self.offset
    }

    /// Rewind to the start of the buffer
    pub const fn reset(&mut self) {
        self.offset = 0;
    }

    /// Hex encode a field, optionally with a `0x` prefix
    ///
    /// An empty field encodes to an empty string, prefix or not.
    pub fn encode_hex(value: &[u8], prefix: bool) -> String {
        if value.is_empty() {
            return String::new();
        }
        let encoded = hex::encode(value);
        if prefix { format!("0x{encoded}") } else { encoded }
    }

    /// Decode a field as ASCII, dropping NUL bytes
    pub fn encode_ascii(value: &[u8]) -> String {
        value
            .iter()
            .filter(|&&b| b != 0)
            .map(|&b| char::from(b))
            .collect()
    }

    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        bytes.try_into().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_big_and_little_endian() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let mut parser = ByteParser::new(&data);
        assert_eq!(parser.read_u16(), Some(0x0102));
        assert_eq!(parser.read_u16_le(), Some(0x0403));
        assert_eq!(parser.read_u32(), Some(0x05060708));
        assert_eq!(parser.read_u8(), None);

        parser.reset();
        assert_eq!(parser.read_u64(), Some(0x0102030405060708));
        parser.reset();
        assert_eq!(parser.read_u64_le(), Some(0x0807060504030201));
        parser.reset();
        assert_eq!(parser.read_u32_le(), Some(0x04030201));
    }

    #[test]
    fn test_signed_integers() {
        let data = [0xFF, 0xFE, 0x80, 0x00, 0x00, 0x00];
        let mut parser = ByteParser::new(&data);
        assert_eq!(parser.read_i16(), Some(-2));
        assert_eq!(parser.read_i32(), Some(i32::MIN));

        let mut parser = ByteParser::new(&[0xFF; 8]);
        assert_eq!(parser.read_i64(), Some(-1));
    }

    #[test]
    fn test_signed_integers_little_endian() {
        let data = [
            0xFE, 0xFF, 0x00, 0x00, 0x00, 0x80, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x80,
        ];
        let mut parser = ByteParser::new(&data);
        assert_eq!(parser.read_i16_le(), Some(-2));
        assert_eq!(parser.read_i32_le(), Some(i32::MIN));
        assert_eq!(parser.read_i64_le(), Some(i64::MIN + 1));
        assert_eq!(parser.read_i16_le(), None);
    }

    #[test]
    fn test_short_read_keeps_offset() {
        let mut parser = ByteParser::new(&[0x01, 0x02, 0x03]);
        assert_eq!(parser.read_u32(), None);
        assert_eq!(parser.offset(), 0);
        assert_eq!(parser.read_bytes(3), Some(&[0x01, 0x02, 0x03][..]));
        assert_eq!(parser.read_bytes(0), Some(&[][..]));
        assert_eq!(parser.read_bytes(1), None);
    }

    #[test]
    fn test_lv_fields() {
        let data = [0x00, 0x02, 0xAA, 0xBB, 0x05, 0x01];
        let mut parser = ByteParser::new(&data);
        assert_eq!(parser.read_lv(), Some(&[][..]));
        assert_eq!(parser.read_lv(), Some(&[0xAA, 0xBB][..]));
        // declared 5 bytes, only 1 left
        assert_eq!(parser.read_lv(), None);
        assert_eq!(parser.offset(), 4);
        assert_eq!(parser.remaining(), 2);
    }

    #[test]
    fn test_tlv_fields() {
        let data = [0x01, 0x02, 0x10, 0x20, 0x02, 0x03, 0x30];
        let mut parser = ByteParser::new(&data);
        assert_eq!(
            parser.read_tlv(),
            Some(TaggedField {
                tag: 0x01,
                value: &[0x10, 0x20],
            })
        );
        // tag 0x02 announces 3 bytes but only 1 follows
        assert_eq!(parser.read_tlv(), None);
        assert_eq!(parser.offset(), 4);

        let mut parser = ByteParser::new(&[0x01]);
        assert_eq!(parser.read_tlv(), None);
        assert_eq!(parser.offset(), 0);
    }

    #[test]
    fn test_minimal_length() {
        let mut parser = ByteParser::new(&[0x01, 0x02]);
        assert!(parser.test_minimal_length(2));
        assert!(!parser.test_minimal_length(3));
        parser.read_u8();
        assert!(parser.test_minimal_length(1));
        assert!(!parser.test_minimal_length(2));
    }

    #[test]
    fn test_encoders() {
        assert_eq!(ByteParser::encode_hex(&[0x0A, 0xFF], false), "0aff");
        assert_eq!(ByteParser::encode_hex(&[0x0A, 0xFF], true), "0x0aff");
        assert_eq!(ByteParser::encode_hex(&[], true), "");
        assert_eq!(ByteParser::encode_ascii(b"Bitcoin\0"), "Bitcoin");
        assert_eq!(ByteParser::encode_ascii(&[]), "");
    }

    #[test]
    fn test_get_version_payload() {
        // target id, LV version, LV flags
        let data = hex::decode("3300000405322e322e3304e6000000").unwrap();
        let mut parser = ByteParser::new(&data);
        let target = parser.read_bytes(4).unwrap();
        assert_eq!(ByteParser::encode_hex(target, false), "33000004");
        let version = parser.read_lv().unwrap();
        assert_eq!(ByteParser::encode_ascii(version), "2.2.3");
        assert_eq!(parser.read_lv(), Some(&[0xE6, 0x00, 0x00, 0x00][..]));
        assert_eq!(parser.remaining(), 0);
    }
}
