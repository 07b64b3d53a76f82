//! Process images, flag memory and data blocks.
//!
//! Multi-byte values are stored big-endian, as on the S7 backplane.
//! Local data is not part of this module; it lives on the call stack.

/// S7 pointer format helpers.
pub mod pointer;

use std::collections::BTreeMap;

use crate::fault::RuntimeErrorKind;
use crate::operand::{Area, Width};

/// A loaded data block.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DataBlock {
    number: u16,
    bytes: Vec<u8>,
}

impl DataBlock {
    /// Creates a block of `length` bytes with `init` copied into its start.
    #[must_use]
    pub fn new(number: u16, length: u32, init: &[u8]) -> Self {
        let mut bytes = vec![0; length as usize];
        let copied = init.len().min(bytes.len());
        bytes[..copied].copy_from_slice(&init[..copied]);
        Self { number, bytes }
    }

    /// Block number.
    #[must_use]
    pub const fn number(&self) -> u16 {
        self.number
    }

    /// Length in bytes.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn len(&self) -> u32 {
        self.bytes.len() as u32
    }

    /// True for zero-length blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Contents.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Mutable contents.
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

/// Memory areas owned by one CPU instance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MemoryRegions {
    inputs: Vec<u8>,
    outputs: Vec<u8>,
    flags: Vec<u8>,
    data_blocks: BTreeMap<u16, DataBlock>,
}

impl MemoryRegions {
    /// Allocates zeroed images and flag memory.
    #[must_use]
    pub fn new(input_bytes: u32, output_bytes: u32, flag_bytes: u32) -> Self {
        Self {
            inputs: vec![0; input_bytes as usize],
            outputs: vec![0; output_bytes as usize],
            flags: vec![0; flag_bytes as usize],
            data_blocks: BTreeMap::new(),
        }
    }

    /// Input process image.
    #[must_use]
    pub fn inputs(&self) -> &[u8] {
        &self.inputs
    }

    /// Mutable input process image.
    pub fn inputs_mut(&mut self) -> &mut [u8] {
        &mut self.inputs
    }

    /// Output process image.
    #[must_use]
    pub fn outputs(&self) -> &[u8] {
        &self.outputs
    }

    /// Mutable output process image.
    pub fn outputs_mut(&mut self) -> &mut [u8] {
        &mut self.outputs
    }

    /// Flag memory.
    #[must_use]
    pub fn flags(&self) -> &[u8] {
        &self.flags
    }

    /// Mutable flag memory.
    pub fn flags_mut(&mut self) -> &mut [u8] {
        &mut self.flags
    }

    /// Looks up a data block.
    #[must_use]
    pub fn data_block(&self, number: u16) -> Option<&DataBlock> {
        self.data_blocks.get(&number)
    }

    /// Looks up a data block mutably.
    pub fn data_block_mut(&mut self, number: u16) -> Option<&mut DataBlock> {
        self.data_blocks.get_mut(&number)
    }

    /// Inserts or replaces a data block.
    pub fn insert_data_block(&mut self, block: DataBlock) {
        self.data_blocks.insert(block.number, block);
    }

    /// Removes every data block.
    pub fn clear_data_blocks(&mut self) {
        self.data_blocks.clear();
    }

    /// Zeroes both process images.
    pub fn clear_images(&mut self) {
        self.inputs.fill(0);
        self.outputs.fill(0);
    }

    /// Zeroes images and flags; data blocks are left to the caller.
    pub fn clear(&mut self) {
        self.clear_images();
        self.flags.fill(0);
    }

    /// Bytes of a global area. `DataBlock`/`InstanceDb` need a block number.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeErrorKind::DataBlockNotOpen`] for block number 0 and
    /// [`RuntimeErrorKind::DataBlockNotFound`] for unknown blocks. `Local`
    /// is not stored here and yields an empty slice.
    pub fn area(&self, area: Area, db: u16) -> Result<&[u8], RuntimeErrorKind> {
        Ok(match area {
            Area::Input | Area::PeripheralInput => &self.inputs[..],
            Area::Output | Area::PeripheralOutput => &self.outputs[..],
            Area::Flag => &self.flags[..],
            Area::DataBlock | Area::InstanceDb => self.block_bytes(db)?,
            Area::Local => &[][..],
        })
    }

    /// Mutable bytes of a global area.
    ///
    /// # Errors
    ///
    /// Same as [`MemoryRegions::area`].
    pub fn area_mut(&mut self, area: Area, db: u16) -> Result<&mut [u8], RuntimeErrorKind> {
        Ok(match area {
            Area::Input | Area::PeripheralInput => &mut self.inputs[..],
            Area::Output | Area::PeripheralOutput => &mut self.outputs[..],
            Area::Flag => &mut self.flags[..],
            Area::DataBlock | Area::InstanceDb => {
                if db == 0 {
                    return Err(RuntimeErrorKind::DataBlockNotOpen);
                }
                self.data_blocks
                    .get_mut(&db)
                    .map(DataBlock::bytes_mut)
                    .ok_or(RuntimeErrorKind::DataBlockNotFound(db))?
            }
            Area::Local => &mut [][..],
        })
    }

    fn block_bytes(&self, db: u16) -> Result<&[u8], RuntimeErrorKind> {
        if db == 0 {
            return Err(RuntimeErrorKind::DataBlockNotOpen);
        }
        self.data_blocks
            .get(&db)
            .map(DataBlock::bytes)
            .ok_or(RuntimeErrorKind::DataBlockNotFound(db))
    }
}

fn out_of_range(area: Area, byte: u32, width: Width) -> RuntimeErrorKind {
    RuntimeErrorKind::AddressOutOfRange {
        area,
        byte,
        width: width.bytes(),
    }
}

fn span(len: usize, byte: u32, width: Width) -> Option<std::ops::Range<usize>> {
    let start = byte as usize;
    let end = start.checked_add(width.bytes() as usize)?;
    (end <= len).then_some(start..end)
}

/// Reads a byte, word or double word big-endian, zero-extended.
///
/// # Errors
///
/// Returns [`RuntimeErrorKind::AddressOutOfRange`] when the access leaves
/// `bytes`.
pub fn read_value(
    bytes: &[u8],
    area: Area,
    byte: u32,
    width: Width,
) -> Result<u32, RuntimeErrorKind> {
    let range = span(bytes.len(), byte, width).ok_or_else(|| out_of_range(area, byte, width))?;
    Ok(bytes[range]
        .iter()
        .fold(0u32, |value, byte| (value << 8) | u32::from(*byte)))
}

/// Writes the low `width` bytes of `value` big-endian.
///
/// # Errors
///
/// Returns [`RuntimeErrorKind::AddressOutOfRange`] when the access leaves
/// `bytes`.
pub fn write_value(
    bytes: &mut [u8],
    area: Area,
    byte: u32,
    width: Width,
    value: u32,
) -> Result<(), RuntimeErrorKind> {
    let range = span(bytes.len(), byte, width).ok_or_else(|| out_of_range(area, byte, width))?;
    let encoded = value.to_be_bytes();
    let skip = 4 - range.len();
    bytes[range].copy_from_slice(&encoded[skip..]);
    Ok(())
}

/// Reads one bit.
///
/// # Errors
///
/// Returns [`RuntimeErrorKind::AddressOutOfRange`] outside `bytes`.
pub fn read_bit(bytes: &[u8], area: Area, byte: u32, bit: u8) -> Result<bool, RuntimeErrorKind> {
    let value = bytes
        .get(byte as usize)
        .ok_or_else(|| out_of_range(area, byte, Width::Bit))?;
    Ok(value & (1 << (bit & 7)) != 0)
}

/// Writes one bit.
///
/// # Errors
///
/// Returns [`RuntimeErrorKind::AddressOutOfRange`] outside `bytes`.
pub fn write_bit(
    bytes: &mut [u8],
    area: Area,
    byte: u32,
    bit: u8,
    value: bool,
) -> Result<(), RuntimeErrorKind> {
    let slot = bytes
        .get_mut(byte as usize)
        .ok_or_else(|| out_of_range(area, byte, Width::Bit))?;
    let mask = 1 << (bit & 7);
    if value {
        *slot |= mask;
    } else {
        *slot &= !mask;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{read_bit, read_value, write_bit, write_value, DataBlock, MemoryRegions};
    use crate::fault::RuntimeErrorKind;
    use crate::operand::{Area, Width};

    #[rstest]
    #[case(Width::Byte, 0x0000_0012)]
    #[case(Width::Word, 0x0000_1234)]
    #[case(Width::Dword, 0x1234_5678)]
    fn values_are_big_endian(#[case] width: Width, #[case] expected: u32) {
        let bytes = [0x12, 0x34, 0x56, 0x78];
        assert_eq!(read_value(&bytes, Area::Flag, 0, width), Ok(expected));
    }

    #[test]
    fn word_write_touches_two_bytes() {
        let mut bytes = [0u8; 4];
        write_value(&mut bytes, Area::Flag, 1, Width::Word, 0xDEAD_BEEF).expect("fits");
        assert_eq!(bytes, [0, 0xBE, 0xEF, 0]);
    }

    #[test]
    fn accesses_past_the_end_fail() {
        let mut bytes = [0u8; 4];
        assert_eq!(
            read_value(&bytes, Area::Output, 2, Width::Dword),
            Err(RuntimeErrorKind::AddressOutOfRange {
                area: Area::Output,
                byte: 2,
                width: 4
            })
        );
        assert!(write_bit(&mut bytes, Area::Flag, 4, 0, true).is_err());
        assert!(read_bit(&bytes, Area::Flag, 3, 7).is_ok());
    }

    #[test]
    fn bits_are_addressed_lsb_first() {
        let mut bytes = [0u8; 2];
        write_bit(&mut bytes, Area::Flag, 1, 3, true).expect("fits");
        assert_eq!(bytes, [0, 0x08]);
        assert_eq!(read_bit(&bytes, Area::Flag, 1, 3), Ok(true));
        write_bit(&mut bytes, Area::Flag, 1, 3, false).expect("fits");
        assert_eq!(bytes, [0, 0]);
    }

    #[test]
    fn data_block_lookup_reports_missing_and_unopened_blocks() {
        let mut memory = MemoryRegions::new(4, 4, 4);
        memory.insert_data_block(DataBlock::new(3, 4, &[1, 2]));
        assert_eq!(memory.area(Area::DataBlock, 3).map(<[u8]>::len), Ok(4));
        assert_eq!(
            memory.area(Area::DataBlock, 0).map(<[u8]>::len),
            Err(RuntimeErrorKind::DataBlockNotOpen)
        );
        assert_eq!(
            memory.area(Area::InstanceDb, 9).map(<[u8]>::len),
            Err(RuntimeErrorKind::DataBlockNotFound(9))
        );
        assert_eq!(
            memory.data_block(3).map(DataBlock::bytes),
            Some(&[1, 2, 0, 0][..])
        );
    }
}
