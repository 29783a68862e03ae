//! Base-128 varints and zig-zag mapping.
//!
//! A varint stores 7 bits per byte, least significant group first. The
//! high bit (`0x80`) of each byte says "more bytes follow". A `u64` needs
//! at most 10 bytes.
//!
//! ```text
//! 300 = 0b1_0010_1100
//!     → [0b1010_1100, 0b0000_0010]  (0xAC 0x02)
//! ```

use bytes::BufMut;

use crate::WireError;

/// The longest varint we accept: `ceil(64 / 7)`.
pub const MAX_VARINT_LEN: usize = 10;

/// Writes `value` as a varint.
pub fn encode_varint<B: BufMut + ?Sized>(mut value: u64, buf: &mut B) {
    loop {
        if value < 0x80 {
            buf.put_u8(value as u8);
            return;
        }
        buf.put_u8(((value & 0x7f) as u8) | 0x80);
        value >>= 7;
    }
}

/// Returns how many bytes [`encode_varint`] writes for `value`.
pub fn encoded_len_varint(value: u64) -> usize {
    // Bits needed, rounded up to whole 7-bit groups. `| 1` makes 0 take
    // one byte instead of zero.
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Reads a varint from the front of `data`.
///
/// Returns the value and the number of bytes consumed.
///
/// # Errors
/// - [`WireError::UnexpectedEof`] if `data` ends before the final byte.
/// - [`WireError::VarintOverflow`] if the varint is longer than 10 bytes
///   or doesn't fit in 64 bits.
pub fn decode_varint(data: &[u8]) -> Result<(u64, usize), WireError> {
    let mut value: u64 = 0;
    for (i, &byte) in data.iter().enumerate() {
        if i == MAX_VARINT_LEN - 1 && byte > 0x01 {
            return Err(WireError::VarintOverflow);
        }
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte < 0x80 {
            return Ok((value, i + 1));
        }
    }
    if data.len() >= MAX_VARINT_LEN {
        Err(WireError::VarintOverflow)
    } else {
        Err(WireError::UnexpectedEof { needed: 1 })
    }
}

/// Zig-zag maps a signed 32-bit value so small magnitudes stay small:
/// 0 → 0, -1 → 1, 1 → 2, -2 → 3, ...
pub fn zigzag_encode32(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

/// Inverse of [`zigzag_encode32`].
pub fn zigzag_decode32(n: u32) -> i32 {
    ((n >> 1) as i32) ^ -((n & 1) as i32)
}

/// 64-bit zig-zag.
pub fn zigzag_encode64(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

/// Inverse of [`zigzag_encode64`].
pub fn zigzag_decode64(n: u64) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}
