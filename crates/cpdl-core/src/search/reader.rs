//! Fixed-width field decoding.
//!
//! Every record field is a raw 4-byte word. Integers and floats are
//! reinterpreted from those bytes in the requested byte order; float bit
//! patterns are passed through unchecked, so NaN and infinity survive
//! decoding and are left for the plausibility filter to reject.

use crate::error::{Error, Result};
use std::fmt;

/// Width in bytes of every record field
pub const FIELD_WIDTH: usize = 4;

/// Byte order used to reassemble a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// Most significant byte first
    Big,
    /// Least significant byte first
    Little,
}

impl ByteOrder {
    /// Both orders, in search order
    pub const ALL: [ByteOrder; 2] = [ByteOrder::Big, ByteOrder::Little];

    /// Human-readable name
    pub fn name(self) -> &'static str {
        match self {
            ByteOrder::Big => "big-endian",
            ByteOrder::Little => "little-endian",
        }
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Copy the 4-byte field at `offset` out of `data`.
fn field(data: &[u8], offset: usize) -> Result<[u8; FIELD_WIDTH]> {
    let end = offset
        .checked_add(FIELD_WIDTH)
        .filter(|&end| end <= data.len())
        .ok_or_else(|| Error::out_of_bounds(offset, FIELD_WIDTH, data.len()))?;

    let mut raw = [0u8; FIELD_WIDTH];
    raw.copy_from_slice(&data[offset..end]);
    Ok(raw)
}

/// Decode an unsigned 32-bit integer at `offset`.
pub fn read_u32(data: &[u8], offset: usize, order: ByteOrder) -> Result<u32> {
    let raw = field(data, offset)?;
    Ok(match order {
        ByteOrder::Big => u32::from_be_bytes(raw),
        ByteOrder::Little => u32::from_le_bytes(raw),
    })
}

/// Decode an IEEE-754 single-precision float at `offset`.
pub fn read_f32(data: &[u8], offset: usize, order: ByteOrder) -> Result<f32> {
    read_u32(data, offset, order).map(f32::from_bits)
}

/// Whether a decoded coordinate looks like real data rather than noise.
///
/// This is a magnitude check only: zero passes, NaN never does.
pub fn is_plausible(value: f32, limit: f32) -> bool {
    value.abs() < limit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_u32_both_orders() {
        let data = [0x01, 0x02, 0x03, 0x04];
        assert_eq!(read_u32(&data, 0, ByteOrder::Big).unwrap(), 0x0102_0304);
        assert_eq!(read_u32(&data, 0, ByteOrder::Little).unwrap(), 0x0403_0201);
    }

    #[test]
    fn test_read_f32_both_orders() {
        // 1.0f32 is 0x3F800000
        let be = [0x3F, 0x80, 0x00, 0x00];
        let le = [0x00, 0x00, 0x80, 0x3F];
        assert_eq!(read_f32(&be, 0, ByteOrder::Big).unwrap(), 1.0);
        assert_eq!(read_f32(&le, 0, ByteOrder::Little).unwrap(), 1.0);
    }

    #[test]
    fn test_read_at_offset() {
        let data = [0xAA, 0xBB, 0x00, 0x00, 0x00, 0x2A];
        assert_eq!(read_u32(&data, 2, ByteOrder::Big).unwrap(), 42);
    }

    #[test]
    fn test_nan_bits_pass_through() {
        let data = [0xFF; 4];
        assert!(read_f32(&data, 0, ByteOrder::Little).unwrap().is_nan());
    }

    #[test]
    fn test_short_read_is_out_of_bounds() {
        let data = [0x00, 0x01, 0x02];
        let err = read_u32(&data, 0, ByteOrder::Big).unwrap_err();
        assert!(matches!(
            err,
            Error::OutOfBounds {
                offset: 0,
                needed: 4,
                available: 3
            }
        ));
        assert!(read_u32(&[0u8; 8], usize::MAX - 1, ByteOrder::Little).is_err());
    }

    #[test]
    fn test_plausibility_is_magnitude_only() {
        assert!(is_plausible(0.0, 100_000.0));
        assert!(is_plausible(-99_999.9, 100_000.0));
        assert!(!is_plausible(100_000.0, 100_000.0));
        assert!(!is_plausible(-500_000.0, 100_000.0));
        assert!(!is_plausible(f32::NAN, 100_000.0));
        assert!(!is_plausible(f32::INFINITY, 100_000.0));
    }

    #[test]
    fn test_byte_order_display() {
        assert_eq!(ByteOrder::Big.to_string(), "big-endian");
        assert_eq!(ByteOrder::Little.to_string(), "little-endian");
    }
}
