//! A bounds-checked cursor over an encoded message.
//!
//! `WireReader` borrows the input. Length-delimited payloads come back as
//! sub-slices of the original buffer, so nested messages are decoded
//! without copying, and the exact bytes of a skipped field can be handed
//! to the unknown-field buffer as-is.

use crate::varint::decode_varint;
use crate::{Key, WireError, WireType};

/// How deeply unknown groups may nest before skipping gives up.
pub const MAX_GROUP_DEPTH: usize = 100;

/// Reads keys and payloads from a byte slice.
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns `true` once every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// The bytes consumed between `start` (an earlier [`position`](Self::position))
    /// and now.
    pub fn consumed_since(&self, start: usize) -> &'a [u8] {
        &self.data[start..self.pos]
    }

    pub fn read_varint(&mut self) -> Result<u64, WireError> {
        let (value, len) = decode_varint(&self.data[self.pos..])?;
        self.pos += len;
        Ok(value)
    }

    pub fn read_key(&mut self) -> Result<Key, WireError> {
        let raw = self.read_varint()?;
        Key::from_raw(raw)
    }

    pub fn read_fixed32(&mut self) -> Result<u32, WireError> {
        let bytes = self.read_bytes(4)?;
        let mut arr = [0u8; 4];
        arr.copy_from_slice(bytes);
        Ok(u32::from_le_bytes(arr))
    }

    pub fn read_fixed64(&mut self) -> Result<u64, WireError> {
        let bytes = self.read_bytes(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(arr))
    }

    /// Takes the next `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], WireError> {
        let available = self.remaining();
        if len > available {
            return Err(WireError::UnexpectedEof {
                needed: len - available,
            });
        }
        let out = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    /// Reads a varint length prefix, then that many bytes.
    pub fn read_length_delimited(&mut self) -> Result<&'a [u8], WireError> {
        let len = self.read_varint()?;
        let len = usize::try_from(len).map_err(|_| WireError::LengthOverflow(len))?;
        self.read_bytes(len)
    }

    /// Skips the payload belonging to `key` (whose key bytes have already
    /// been read).
    ///
    /// Groups are skipped whole, including nested groups, up to and
    /// including the matching end-group key. Nesting is tracked on the
    /// heap and capped at [`MAX_GROUP_DEPTH`].
    ///
    /// # Errors
    /// Any truncation inside the payload, [`WireError::UnexpectedEndGroup`]
    /// for a stray end-group key, [`WireError::UnterminatedGroup`] if the
    /// input ends inside a group, [`WireError::GroupDepthExceeded`] past
    /// the nesting cap.
    pub fn skip_field(&mut self, key: Key) -> Result<(), WireError> {
        match key.wire_type {
            WireType::StartGroup => self.skip_group(key.tag),
            WireType::EndGroup => Err(WireError::UnexpectedEndGroup(key.tag)),
            _ => self.skip_scalar(key.wire_type),
        }
    }

    fn skip_scalar(&mut self, wire_type: WireType) -> Result<(), WireError> {
        match wire_type {
            WireType::Varint => self.read_varint().map(drop),
            WireType::Fixed64 => self.read_bytes(8).map(drop),
            WireType::Fixed32 => self.read_bytes(4).map(drop),
            WireType::LengthDelimited => self.read_length_delimited().map(drop),
            WireType::StartGroup | WireType::EndGroup => Ok(()),
        }
    }

    fn skip_group(&mut self, tag: u32) -> Result<(), WireError> {
        let mut open = vec![tag];
        while let Some(&innermost) = open.last() {
            if self.is_empty() {
                return Err(WireError::UnterminatedGroup(innermost));
            }
            let inner = self.read_key()?;
            match inner.wire_type {
                WireType::EndGroup if inner.tag == innermost => {
                    open.pop();
                }
                WireType::EndGroup => return Err(WireError::UnexpectedEndGroup(inner.tag)),
                WireType::StartGroup => {
                    if open.len() >= MAX_GROUP_DEPTH {
                        return Err(WireError::GroupDepthExceeded(MAX_GROUP_DEPTH));
                    }
                    open.push(inner.tag);
                }
                other => self.skip_scalar(other)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_key_then_varint() {
        let mut r = WireReader::new(&[0x08, 0x96, 0x01]);
        let key = r.read_key().unwrap();
        assert_eq!(key, Key::new(1, WireType::Varint));
        assert_eq!(r.read_varint().unwrap(), 150);
        assert!(r.is_empty());
    }

    #[test]
    fn test_fixed_values_are_little_endian() {
        let mut r = WireReader::new(&[0x01, 0x02, 0x03, 0x04, 1, 0, 0, 0, 0, 0, 0, 0x80]);
        assert_eq!(r.read_fixed32().unwrap(), 0x0403_0201);
        assert_eq!(r.read_fixed64().unwrap(), 0x8000_0000_0000_0001);
    }

    #[test]
    fn test_length_delimited_returns_subslice() {
        let mut r = WireReader::new(&[0x03, b'a', b'b', b'c', 0x07]);
        assert_eq!(r.read_length_delimited().unwrap(), b"abc");
        assert_eq!(r.remaining(), 1);
    }

    #[test]
    fn test_length_past_end_is_eof() {
        let mut r = WireReader::new(&[0x05, b'a', b'b']);
        assert_eq!(
            r.read_length_delimited(),
            Err(WireError::UnexpectedEof { needed: 3 })
        );
    }

    #[test]
    fn test_truncated_fixed32_is_eof() {
        let mut r = WireReader::new(&[0x01, 0x02]);
        assert_eq!(r.read_fixed32(), Err(WireError::UnexpectedEof { needed: 2 }));
    }

    #[test]
    fn test_skip_field_consumes_exact_payload() {
        // tag 7 fixed32, then tag 1 varint 5
        let data = [0x3d, 1, 2, 3, 4, 0x08, 0x05];
        let mut r = WireReader::new(&data);
        let start = r.position();
        let key = r.read_key().unwrap();
        r.skip_field(key).unwrap();
        assert_eq!(r.consumed_since(start), &data[..5]);
        assert_eq!(r.read_key().unwrap().tag, 1);
    }

    #[test]
    fn test_skip_group_with_nested_group() {
        // start(5) start(6) varint(1)=1 end(6) end(5) varint(2)=9
        let data = [0x2b, 0x33, 0x08, 0x01, 0x34, 0x2c, 0x10, 0x09];
        let mut r = WireReader::new(&data);
        let key = r.read_key().unwrap();
        assert_eq!(key.wire_type, WireType::StartGroup);
        r.skip_field(key).unwrap();
        assert_eq!(r.position(), 6);
        assert_eq!(r.read_key().unwrap(), Key::new(2, WireType::Varint));
    }

    #[test]
    fn test_unterminated_group_is_error() {
        let data = [0x2b, 0x08, 0x01];
        let mut r = WireReader::new(&data);
        let key = r.read_key().unwrap();
        assert_eq!(r.skip_field(key), Err(WireError::UnterminatedGroup(5)));
    }

    #[test]
    fn test_mismatched_end_group_is_error() {
        let data = [0x2b, 0x34];
        let mut r = WireReader::new(&data);
        let key = r.read_key().unwrap();
        assert_eq!(r.skip_field(key), Err(WireError::UnexpectedEndGroup(6)));
    }

    #[test]
    fn test_stray_end_group_is_error() {
        let mut r = WireReader::new(&[]);
        assert_eq!(
            r.skip_field(Key::new(3, WireType::EndGroup)),
            Err(WireError::UnexpectedEndGroup(3))
        );
    }

    #[test]
    fn test_group_nesting_is_capped() {
        // tag 9 start-group, over and over, never closed
        let data = vec![0x4b; 100_000];
        let mut r = WireReader::new(&data);
        let key = r.read_key().unwrap();
        assert_eq!(
            r.skip_field(key),
            Err(WireError::GroupDepthExceeded(MAX_GROUP_DEPTH))
        );
    }

    #[test]
    fn test_group_nesting_at_the_cap_is_skipped() {
        let mut data = vec![0x4b; MAX_GROUP_DEPTH];
        data.extend(std::iter::repeat_n(0x4c, MAX_GROUP_DEPTH));
        data.push(0x08);
        let mut r = WireReader::new(&data);
        let key = r.read_key().unwrap();
        r.skip_field(key).unwrap();
        assert_eq!(r.remaining(), 1);
    }
}
