//! Binary coded decimal conversion
//!
//! Each nibble holds one decimal digit, so a byte covers 0-99. [`encode`]
//! requires its input to be in range, checked in debug builds only.
//! [`decode`] accepts any byte, since it is fed straight from the wire.

/// Encode a decimal value (0-99) as BCD
#[inline]
pub fn encode(value: u8) -> u8 {
    debug_assert!(value <= 99, "BCD encode of {}", value);
    ((value / 10) << 4) | (value % 10)
}

/// Decode a BCD byte to decimal.
///
/// Nibbles above 9 are read as 9, so the result is always 0-99.
#[inline]
pub fn decode(bcd: u8) -> u8 {
    (bcd >> 4).min(9) * 10 + (bcd & 0x0F).min(9)
}
