//! Operand descriptors: raw front-end forms and their typed counterparts.

use std::fmt::{self, Write as _};

use crate::catalog::MnemonicDialect;

/// Memory areas addressable by statement-list operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Area {
    /// Process-image inputs (`E`/`I`).
    Input,
    /// Process-image outputs (`A`/`Q`).
    Output,
    /// Flag memory (`M`).
    Flag,
    /// Local data of the running block (`L`).
    Local,
    /// Global data block opened in the DB register (`DB`).
    DataBlock,
    /// Instance data block opened in the DI register (`DI`).
    InstanceDb,
    /// Peripheral inputs (`PE`/`PI`), mapped onto the input image.
    PeripheralInput,
    /// Peripheral outputs (`PA`/`PQ`), mapped onto the output image.
    PeripheralOutput,
}

impl Area {
    /// Returns the S7 pointer area code stored in bits 24..=31.
    #[must_use]
    pub const fn pointer_code(self) -> u8 {
        match self {
            Self::PeripheralInput | Self::PeripheralOutput => 0x80,
            Self::Input => 0x81,
            Self::Output => 0x82,
            Self::Flag => 0x83,
            Self::DataBlock => 0x84,
            Self::InstanceDb => 0x85,
            Self::Local => 0x86,
        }
    }

    /// Decodes an S7 pointer area code. `0x80` resolves to peripheral inputs.
    #[must_use]
    pub const fn from_pointer_code(code: u8) -> Option<Self> {
        match code {
            0x80 => Some(Self::PeripheralInput),
            0x81 => Some(Self::Input),
            0x82 => Some(Self::Output),
            0x83 => Some(Self::Flag),
            0x84 => Some(Self::DataBlock),
            0x85 => Some(Self::InstanceDb),
            0x86 => Some(Self::Local),
            _ => None,
        }
    }

    /// Areas whose contents can hold a memory-indirect pointer.
    #[must_use]
    pub const fn can_hold_pointer(self) -> bool {
        matches!(
            self,
            Self::Flag | Self::Local | Self::DataBlock | Self::InstanceDb
        )
    }

    /// Peripheral areas have no bit access.
    #[must_use]
    pub const fn is_peripheral(self) -> bool {
        matches!(self, Self::PeripheralInput | Self::PeripheralOutput)
    }

    /// Area letter(s) used in operand spelling.
    #[must_use]
    pub const fn prefix(self, dialect: MnemonicDialect) -> &'static str {
        match (self, dialect) {
            (Self::Input, MnemonicDialect::German) => "E",
            (Self::Input, MnemonicDialect::English) => "I",
            (Self::Output, MnemonicDialect::German) => "A",
            (Self::Output, MnemonicDialect::English) => "Q",
            (Self::Flag, _) => "M",
            (Self::Local, _) => "L",
            (Self::DataBlock, _) => "DB",
            (Self::InstanceDb, _) => "DI",
            (Self::PeripheralInput, MnemonicDialect::German) => "PE",
            (Self::PeripheralInput, MnemonicDialect::English) => "PI",
            (Self::PeripheralOutput, MnemonicDialect::German) => "PA",
            (Self::PeripheralOutput, MnemonicDialect::English) => "PQ",
        }
    }
}

/// Access width of a memory operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Width {
    /// Single bit.
    Bit,
    /// 8 bits.
    Byte,
    /// 16 bits.
    Word,
    /// 32 bits.
    Dword,
}

impl Width {
    /// Number of bytes touched (a bit touches one byte).
    #[must_use]
    pub const fn bytes(self) -> u32 {
        match self {
            Self::Bit | Self::Byte => 1,
            Self::Word => 2,
            Self::Dword => 4,
        }
    }

    const fn suffix(self, data_block: bool) -> &'static str {
        match (self, data_block) {
            (Self::Bit, false) => "",
            (Self::Bit, true) => "X",
            (Self::Byte, _) => "B",
            (Self::Word, _) => "W",
            (Self::Dword, _) => "D",
        }
    }
}

/// Byte and bit position inside an area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct BitAddress {
    /// Byte offset.
    pub byte: u32,
    /// Bit number `0..=7`.
    pub bit: u8,
}

impl BitAddress {
    /// Largest byte offset representable in the S7 pointer format.
    pub const MAX_BYTE: u32 = 0xFFFF;

    /// Creates a bit address.
    #[must_use]
    pub const fn new(byte: u32, bit: u8) -> Self {
        Self { byte, bit }
    }

    /// Encodes into the S7 pointer offset field (`byte << 3 | bit`).
    #[must_use]
    pub const fn to_pointer_offset(self) -> u32 {
        (self.byte << 3) | (self.bit as u32 & 0x7)
    }

    /// Decodes the low 19 bits of an S7 pointer.
    #[must_use]
    pub const fn from_pointer_offset(raw: u32) -> Self {
        Self {
            byte: (raw >> 3) & Self::MAX_BYTE,
            bit: (raw & 0x7) as u8,
        }
    }
}

impl fmt::Display for BitAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.byte, self.bit)
    }
}

/// Address register selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum AddressRegister {
    /// `AR1`.
    Ar1,
    /// `AR2`.
    Ar2,
}

impl fmt::Display for AddressRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ar1 => f.write_str("AR1"),
            Self::Ar2 => f.write_str("AR2"),
        }
    }
}

/// How a memory operand locates its byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Addressing {
    /// Constant address, e.g. `M 10.3`.
    Direct(BitAddress),
    /// Pointer double word read from memory, e.g. `M [MD 20]`.
    MemoryIndirect {
        /// Area holding the pointer.
        area: Area,
        /// Byte offset of the pointer double word.
        byte: u32,
    },
    /// Address register plus constant offset, e.g. `M [AR1, P#2.0]`.
    RegisterIndirect {
        /// Base register.
        register: AddressRegister,
        /// Offset added to the register's address part.
        offset: BitAddress,
    },
}

/// Memory operand shape shared by raw and typed forms.
///
/// `area == None` denotes area-crossing register-indirect access where the
/// area comes from the address register's area code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MemoryOperand {
    /// Addressed area.
    pub area: Option<Area>,
    /// Access width.
    pub width: Width,
    /// Location mode.
    pub addressing: Addressing,
    /// Data block opened before the access (`DB5.DBW 2`).
    pub db: Option<u16>,
}

impl MemoryOperand {
    /// Direct access shorthand.
    #[must_use]
    pub const fn direct(area: Area, width: Width, byte: u32, bit: u8) -> Self {
        Self {
            area: Some(area),
            width,
            addressing: Addressing::Direct(BitAddress::new(byte, bit)),
            db: None,
        }
    }

    /// Direct bit access shorthand.
    #[must_use]
    pub const fn bit(area: Area, byte: u32, bit: u8) -> Self {
        Self::direct(area, Width::Bit, byte, bit)
    }

    fn render(&self, out: &mut String, dialect: MnemonicDialect) {
        if let Some(db) = self.db {
            let _ = write!(out, "DB{db}.");
        }
        let data_block = matches!(self.area, Some(Area::DataBlock | Area::InstanceDb));
        match self.area {
            Some(area) => {
                out.push_str(area.prefix(dialect));
                out.push_str(self.width.suffix(data_block));
            }
            None => out.push_str(self.width.suffix(false)),
        }
        match self.addressing {
            Addressing::Direct(address) => match self.width {
                Width::Bit => {
                    let _ = write!(out, " {address}");
                }
                Width::Byte | Width::Word | Width::Dword => {
                    let _ = write!(out, " {}", address.byte);
                }
            },
            Addressing::MemoryIndirect { area, byte } => {
                let _ = write!(out, " [{}D {byte}]", area.prefix(dialect));
            }
            Addressing::RegisterIndirect { register, offset } => {
                let _ = write!(out, " [{register}, P#{offset}]");
            }
        }
    }
}

/// Timer, counter or block number, direct or read from a memory word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum NumberRef {
    /// Literal number.
    Direct(u16),
    /// Number read from a word, e.g. `T [MW 4]`.
    Indirect {
        /// Area holding the word.
        area: Area,
        /// Byte offset of the word.
        byte: u32,
    },
}

impl NumberRef {
    fn render(self, out: &mut String, dialect: MnemonicDialect) {
        match self {
            Self::Direct(number) => {
                let _ = write!(out, " {number}");
            }
            Self::Indirect { area, byte } => {
                let _ = write!(out, " [{}W {byte}]", area.prefix(dialect));
            }
        }
    }
}

/// Block types referenced by call and open instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum BlockKind {
    /// Organization block.
    Ob,
    /// Function.
    Fc,
    /// Function block.
    Fb,
    /// Global data block.
    Db,
    /// Data block opened as instance DB.
    Di,
}

impl BlockKind {
    /// Code blocks carry instructions.
    #[must_use]
    pub const fn is_code(self) -> bool {
        matches!(self, Self::Ob | Self::Fc | Self::Fb)
    }

    /// Spelling of the block type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ob => "OB",
            Self::Fc => "FC",
            Self::Fb => "FB",
            Self::Db => "DB",
            Self::Di => "DI",
        }
    }
}

/// Status-word predicates usable as logic operands (`U ==0`, `U OV`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum Condition {
    Zero,
    NonZero,
    Positive,
    Negative,
    PositiveOrZero,
    NegativeOrZero,
    Unordered,
    Overflow,
    OverflowStored,
    BinaryResult,
}

impl Condition {
    /// Spelling of the predicate.
    #[must_use]
    pub const fn spelling(self, dialect: MnemonicDialect) -> &'static str {
        match self {
            Self::Zero => "==0",
            Self::NonZero => "<>0",
            Self::Positive => ">0",
            Self::Negative => "<0",
            Self::PositiveOrZero => ">=0",
            Self::NegativeOrZero => "<=0",
            Self::Unordered => "UO",
            Self::Overflow => "OV",
            Self::OverflowStored => "OS",
            Self::BinaryResult => match dialect {
                MnemonicDialect::German => "BIE",
                MnemonicDialect::English => "BR",
            },
        }
    }
}

/// Data block register queries (`L DBNO`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum DbRegisterQuery {
    /// Number of the opened global DB.
    DbNumber,
    /// Length in bytes of the opened global DB.
    DbLength,
    /// Number of the opened instance DB.
    DiNumber,
    /// Length in bytes of the opened instance DB.
    DiLength,
}

impl DbRegisterQuery {
    const fn spelling(self) -> &'static str {
        match self {
            Self::DbNumber => "DBNO",
            Self::DbLength => "DBLG",
            Self::DiNumber => "DINO",
            Self::DiLength => "DILG",
        }
    }
}

/// Individual status-word bits, addressable through the `__STW` operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum StatusBit {
    Fc = 0,
    Rlo = 1,
    Sta = 2,
    Or = 3,
    Os = 4,
    Ov = 5,
    Cc0 = 6,
    Cc1 = 7,
    Br = 8,
}

impl StatusBit {
    /// Bits in canonical layout order.
    pub const ALL: [Self; 9] = [
        Self::Fc,
        Self::Rlo,
        Self::Sta,
        Self::Or,
        Self::Os,
        Self::Ov,
        Self::Cc0,
        Self::Cc1,
        Self::Br,
    ];

    /// Bit position in the status word.
    #[must_use]
    pub const fn position(self) -> u8 {
        self as u8
    }

    /// Spelling of the bit.
    #[must_use]
    pub const fn spelling(self, dialect: MnemonicDialect) -> &'static str {
        match (self, dialect) {
            (Self::Fc, MnemonicDialect::German) => "/ER",
            (Self::Fc, MnemonicDialect::English) => "/FC",
            (Self::Rlo, MnemonicDialect::German) => "VKE",
            (Self::Rlo, MnemonicDialect::English) => "RLO",
            (Self::Sta, _) => "STA",
            (Self::Or, _) => "OR",
            (Self::Os, _) => "OS",
            (Self::Ov, _) => "OV",
            (Self::Cc0, MnemonicDialect::German) => "A0",
            (Self::Cc0, MnemonicDialect::English) => "CC0",
            (Self::Cc1, MnemonicDialect::German) => "A1",
            (Self::Cc1, MnemonicDialect::English) => "CC1",
            (Self::Br, MnemonicDialect::German) => "BIE",
            (Self::Br, MnemonicDialect::English) => "BR",
        }
    }
}

/// Immediate values as delivered by the front end.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Constant {
    /// 16-bit integer, e.g. `L 5`.
    Int(i16),
    /// 32-bit integer, e.g. `L L#70000`.
    Dint(i32),
    /// IEEE-754 single, e.g. `L 1.5`.
    Real(f32),
    /// `B#16#..`.
    Byte(u8),
    /// `W#16#..` or `2#..`.
    Word(u16),
    /// `DW#16#..`.
    Dword(u32),
    /// Encoded S5TIME word (time base in bits 12..=13, BCD value below).
    S5Time(u16),
    /// IEC `TIME` in milliseconds.
    Time(i32),
    /// 32-bit S7 pointer, e.g. `P#M 1.0`.
    Pointer(u32),
    /// BCD counter preset, e.g. `C#5`.
    CounterPreset(u16),
}

impl Constant {
    /// Bit pattern loaded into ACCU1.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn bits(self) -> u32 {
        match self {
            Self::Int(value) => u32::from(value as u16),
            Self::Dint(value) | Self::Time(value) => value as u32,
            Self::Real(value) => value.to_bits(),
            Self::Byte(value) => u32::from(value),
            Self::Word(value) | Self::S5Time(value) | Self::CounterPreset(value) => {
                u32::from(value)
            }
            Self::Dword(value) | Self::Pointer(value) => value,
        }
    }

    fn render(self, out: &mut String, dialect: MnemonicDialect) {
        let _ = match self {
            Self::Int(value) => write!(out, "{value}"),
            Self::Dint(value) => write!(out, "L#{value}"),
            Self::Real(value) => write!(out, "{value:?}"),
            Self::Byte(value) => write!(out, "B#16#{value:02X}"),
            Self::Word(value) => write!(out, "W#16#{value:04X}"),
            Self::Dword(value) => write!(out, "DW#16#{value:08X}"),
            Self::S5Time(value) => write!(out, "S5T#W#16#{value:04X}"),
            Self::Time(value) => write!(out, "T#{value}MS"),
            Self::CounterPreset(value) => write!(out, "C#{value:X}"),
            Self::Pointer(value) => {
                let address = BitAddress::from_pointer_offset(value);
                match Area::from_pointer_code((value >> 24) as u8) {
                    Some(area) => write!(out, "P#{} {address}", area.prefix(dialect)),
                    None => write!(out, "P#{address}"),
                }
            }
        };
    }
}

/// Operand descriptor as produced by the external front end.
///
/// Numbers are unchecked; the `Ext*` forms are extended operands that the
/// translator only accepts while extended instructions are enabled.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RawOperand {
    /// Memory access.
    Memory(MemoryOperand),
    /// Timer reference.
    Timer(NumberRef),
    /// Counter reference.
    Counter(NumberRef),
    /// Block reference.
    Block {
        /// Block type.
        kind: BlockKind,
        /// Block number.
        number: NumberRef,
    },
    /// Immediate value.
    Constant(Constant),
    /// Jump label name.
    Label(String),
    /// Status-word predicate.
    Condition(Condition),
    /// Whole status word (`STW`).
    StatusWord,
    /// DB register query.
    DbRegister(DbRegisterQuery),
    /// Address register as operand (`LAR1 AR2`).
    AddressRegister(AddressRegister),
    /// Extended `__STW <bit>`.
    ExtStatusBit(StatusBit),
    /// Extended `__ACCU <n>`.
    ExtAccu(u32),
    /// Extended `__AR <n>`.
    ExtAddressRegister(u32),
}

impl RawOperand {
    /// True for extended operand forms.
    #[must_use]
    pub const fn is_extended(&self) -> bool {
        matches!(
            self,
            Self::ExtStatusBit(_) | Self::ExtAccu(_) | Self::ExtAddressRegister(_)
        )
    }
}

/// Validated operand attached to a typed instruction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Operand {
    /// Memory access with a shape already checked against the width.
    Memory(MemoryOperand),
    /// Timer reference.
    Timer(NumberRef),
    /// Counter reference.
    Counter(NumberRef),
    /// Block reference.
    Block {
        /// Block type.
        kind: BlockKind,
        /// Block number.
        number: NumberRef,
    },
    /// Immediate value.
    Immediate(Constant),
    /// Unresolved jump label; replaced by [`Operand::Target`] on assembly.
    Label(String),
    /// Resolved jump target index inside the block.
    Target {
        /// Label name kept for rendering.
        label: String,
        /// Instruction index.
        index: usize,
    },
    /// Status-word predicate.
    Condition(Condition),
    /// Whole status word.
    StatusWord,
    /// DB register query.
    DbRegister(DbRegisterQuery),
    /// Address register.
    AddressRegister(AddressRegister),
    /// Single status-word bit (extended).
    StatusBit(StatusBit),
    /// Accumulator `1..=4` (extended).
    Accu(u8),
}

impl Operand {
    /// Appends the operand spelling in the given dialect.
    pub fn render_into(&self, out: &mut String, dialect: MnemonicDialect) {
        match self {
            Self::Memory(memory) => memory.render(out, dialect),
            Self::Timer(number) => {
                out.push('T');
                number.render(out, dialect);
            }
            Self::Counter(number) => {
                out.push_str(match dialect {
                    MnemonicDialect::German => "Z",
                    MnemonicDialect::English => "C",
                });
                number.render(out, dialect);
            }
            Self::Block { kind, number } => {
                out.push_str(kind.name());
                number.render(out, dialect);
            }
            Self::Immediate(constant) => constant.render(out, dialect),
            Self::Label(label) | Self::Target { label, .. } => out.push_str(label),
            Self::Condition(condition) => out.push_str(condition.spelling(dialect)),
            Self::StatusWord => out.push_str("STW"),
            Self::DbRegister(query) => out.push_str(query.spelling()),
            Self::AddressRegister(register) => {
                let _ = write!(out, "{register}");
            }
            Self::StatusBit(bit) => {
                let _ = write!(out, "__STW {}", bit.spelling(dialect));
            }
            Self::Accu(index) => {
                let _ = write!(out, "__ACCU {index}");
            }
        }
    }

    /// Operand spelling in the given dialect.
    #[must_use]
    pub fn render(&self, dialect: MnemonicDialect) -> String {
        let mut out = String::new();
        self.render_into(&mut out, dialect);
        out
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{
        Addressing, Area, BitAddress, Constant, MemoryOperand, NumberRef, Operand, StatusBit,
        Width,
    };
    use crate::catalog::MnemonicDialect;

    #[test]
    fn pointer_codes_roundtrip_for_addressable_areas() {
        for area in [
            Area::Input,
            Area::Output,
            Area::Flag,
            Area::Local,
            Area::DataBlock,
            Area::InstanceDb,
        ] {
            assert_eq!(Area::from_pointer_code(area.pointer_code()), Some(area));
        }
        assert_eq!(Area::from_pointer_code(0x87), None);
    }

    #[test]
    fn pointer_offset_packs_byte_and_bit() {
        let address = BitAddress::new(12, 5);
        assert_eq!(address.to_pointer_offset(), 12 * 8 + 5);
        assert_eq!(BitAddress::from_pointer_offset(0x8300_0065), address);
    }

    #[rstest]
    #[case(Operand::Memory(MemoryOperand::bit(Area::Input, 0, 1)), MnemonicDialect::German, "E 0.1")]
    #[case(Operand::Memory(MemoryOperand::bit(Area::Input, 0, 1)), MnemonicDialect::English, "I 0.1")]
    #[case(Operand::Memory(MemoryOperand::direct(Area::Output, Width::Word, 4, 0)), MnemonicDialect::English, "QW 4")]
    #[case(Operand::Memory(MemoryOperand::direct(Area::DataBlock, Width::Bit, 2, 7)), MnemonicDialect::German, "DBX 2.7")]
    #[case(Operand::Counter(NumberRef::Direct(3)), MnemonicDialect::German, "Z 3")]
    #[case(Operand::Counter(NumberRef::Direct(3)), MnemonicDialect::English, "C 3")]
    #[case(Operand::Immediate(Constant::Dint(-7)), MnemonicDialect::German, "L#-7")]
    #[case(Operand::Immediate(Constant::Pointer(0x8300_0008)), MnemonicDialect::German, "P#M 1.0")]
    #[case(Operand::StatusBit(StatusBit::Rlo), MnemonicDialect::German, "__STW VKE")]
    fn operands_render_per_dialect(
        #[case] operand: Operand,
        #[case] dialect: MnemonicDialect,
        #[case] expected: &str,
    ) {
        assert_eq!(operand.render(dialect), expected);
    }

    #[test]
    fn qualified_and_indirect_forms_render() {
        let qualified = MemoryOperand {
            db: Some(5),
            ..MemoryOperand::direct(Area::DataBlock, Width::Word, 2, 0)
        };
        assert_eq!(
            Operand::Memory(qualified).render(MnemonicDialect::German),
            "DB5.DBW 2"
        );
        let crossing = MemoryOperand {
            area: None,
            width: Width::Word,
            addressing: Addressing::RegisterIndirect {
                register: super::AddressRegister::Ar1,
                offset: BitAddress::new(2, 0),
            },
            db: None,
        };
        assert_eq!(
            Operand::Memory(crossing).render(MnemonicDialect::English),
            "W [AR1, P#2.0]"
        );
    }

    #[test]
    fn constant_bits_follow_accumulator_layout() {
        assert_eq!(Constant::Int(-1).bits(), 0x0000_FFFF);
        assert_eq!(Constant::Dint(-1).bits(), 0xFFFF_FFFF);
        assert_eq!(Constant::Real(1.0).bits(), 0x3F80_0000);
        assert_eq!(Constant::S5Time(0x2123).bits(), 0x2123);
    }
}
