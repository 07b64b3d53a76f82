//! Packed BCD conversions used by `BTI`/`ITB`/`BTD`/`DTB`, S5TIME and
//! counter presets.

use crate::fault::RuntimeErrorKind;

/// Decodes `digits` packed BCD nibbles from the low end of `raw`.
///
/// # Errors
///
/// Returns [`RuntimeErrorKind::InvalidBcd`] when a nibble exceeds 9.
pub fn decode(raw: u32, digits: u32) -> Result<u32, RuntimeErrorKind> {
    let mut value = 0u32;
    for position in (0..digits).rev() {
        let nibble = (raw >> (position * 4)) & 0xF;
        if nibble > 9 {
            return Err(RuntimeErrorKind::InvalidBcd(raw));
        }
        value = value * 10 + nibble;
    }
    Ok(value)
}

/// Encodes `value` as packed BCD. Digits beyond the 8th are dropped.
#[must_use]
pub const fn encode(mut value: u32) -> u32 {
    let mut raw = 0u32;
    let mut shift = 0;
    while value != 0 && shift < 32 {
        raw |= (value % 10) << shift;
        value /= 10;
        shift += 4;
    }
    raw
}

/// `BTI`: three digits with the sign in bits 12..=15.
///
/// # Errors
///
/// Returns [`RuntimeErrorKind::InvalidBcd`] for non-decimal nibbles.
#[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
pub fn decode_int(raw: u16) -> Result<i16, RuntimeErrorKind> {
    let magnitude = decode(u32::from(raw), 3)? as i16;
    Ok(if raw & 0xF000 == 0 {
        magnitude
    } else {
        -magnitude
    })
}

/// `BTD`: seven digits with the sign in bits 28..=31.
///
/// # Errors
///
/// Returns [`RuntimeErrorKind::InvalidBcd`] for non-decimal nibbles.
#[allow(clippy::cast_possible_wrap)]
pub fn decode_dint(raw: u32) -> Result<i32, RuntimeErrorKind> {
    let magnitude = decode(raw, 7)? as i32;
    Ok(if raw & 0xF000_0000 == 0 {
        magnitude
    } else {
        -magnitude
    })
}

/// `ITB`: `None` when `value` is outside `-999..=999`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn encode_int(value: i16) -> Option<u16> {
    if value < -999 || value > 999 {
        return None;
    }
    let digits = encode(value.unsigned_abs() as u32) as u16;
    Some(if value < 0 { digits | 0xF000 } else { digits })
}

/// `DTB`: `None` when `value` is outside `-9_999_999..=9_999_999`.
#[must_use]
pub const fn encode_dint(value: i32) -> Option<u32> {
    if value < -9_999_999 || value > 9_999_999 {
        return None;
    }
    let digits = encode(value.unsigned_abs());
    Some(if value < 0 {
        digits | 0xF000_0000
    } else {
        digits
    })
}
