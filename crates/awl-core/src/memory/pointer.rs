//! 32-bit S7 area pointers: `AAAA AAAA 0000 0bbb bbbb bbbb bbbb bxxx`.

use crate::fault::RuntimeErrorKind;
use crate::operand::{Area, BitAddress};

/// Mask of the byte/bit address part (19 bits).
pub const POINTER_ADDRESS_MASK: u32 = 0x0007_FFFF;

/// Builds a pointer, with area code when `area` is given.
#[must_use]
pub const fn make_pointer(area: Option<Area>, address: BitAddress) -> u32 {
    let offset = address.to_pointer_offset() & POINTER_ADDRESS_MASK;
    match area {
        Some(area) => ((area.pointer_code() as u32) << 24) | offset,
        None => offset,
    }
}

/// Area encoded in a pointer; `None` for an area-internal pointer.
///
/// # Errors
///
/// Returns [`RuntimeErrorKind::InvalidPointer`] for unknown area codes.
pub const fn pointer_area(pointer: u32) -> Result<Option<Area>, RuntimeErrorKind> {
    let code = (pointer >> 24) as u8;
    if code == 0 {
        return Ok(None);
    }
    match Area::from_pointer_code(code) {
        Some(area) => Ok(Some(area)),
        None => Err(RuntimeErrorKind::InvalidPointer(pointer)),
    }
}

/// Address part of a pointer plus a constant offset.
#[must_use]
pub const fn offset_address(pointer: u32, offset: BitAddress) -> BitAddress {
    let base = pointer & POINTER_ADDRESS_MASK;
    BitAddress::from_pointer_offset(base.wrapping_add(offset.to_pointer_offset()))
}

#[cfg(test)]
mod tests {
    use super::{make_pointer, offset_address, pointer_area};
    use crate::fault::RuntimeErrorKind;
    use crate::operand::{Area, BitAddress};

    #[test]
    fn area_crossing_pointer_roundtrip() {
        let pointer = make_pointer(Some(Area::Output), BitAddress::new(3, 2));
        assert_eq!(pointer, 0x8200_001A);
        assert_eq!(pointer_area(pointer), Ok(Some(Area::Output)));
        assert_eq!(pointer_area(0x1A), Ok(None));
        assert_eq!(
            pointer_area(0x9900_0000),
            Err(RuntimeErrorKind::InvalidPointer(0x9900_0000))
        );
    }

    #[test]
    fn offsets_carry_from_bit_into_byte() {
        let pointer = make_pointer(None, BitAddress::new(1, 6));
        assert_eq!(
            offset_address(pointer, BitAddress::new(0, 3)),
            BitAddress::new(2, 1)
        );
    }
}
