//! Raw-to-typed instruction translation.
//!
//! Translation resolves the mnemonic in one dialect, applies the extended
//! instruction gate and checks every operand against the contract of the
//! resolved kind. It has no side effects: a failed translation leaves
//! nothing behind.

use std::fmt::Write as _;

use thiserror::Error;

use crate::catalog::{lookup, InstructionType, MnemonicDialect};
use crate::operand::{
    AddressRegister, Addressing, Area, BlockKind, Constant, MemoryOperand, Operand, RawOperand,
    Width,
};
use crate::program::BlockId;

/// Graphical diagram element an instruction was generated from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DiagramOrigin {
    /// Diagram (network) name.
    pub diagram: String,
    /// Element or connection identifier inside the diagram.
    pub element: u32,
}

/// Diagnostics-only source trace of a typed instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ParentTrace {
    /// Source line reported by the front end.
    pub line: u32,
    /// Originating diagram element, for compiled graphical code.
    pub origin: Option<DiagramOrigin>,
}

/// Instruction as delivered by the external front end.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RawInstruction {
    /// Mnemonic as written.
    pub mnemonic: String,
    /// Source line.
    pub line: u32,
    /// Jump label attached to this instruction.
    pub label: Option<String>,
    /// Operand descriptors in source order.
    pub operands: Vec<RawOperand>,
    /// Originating diagram element.
    pub origin: Option<DiagramOrigin>,
}

impl RawInstruction {
    /// Creates an unlabelled instruction.
    #[must_use]
    pub fn new(mnemonic: impl Into<String>, line: u32, operands: Vec<RawOperand>) -> Self {
        Self {
            mnemonic: mnemonic.into(),
            line,
            label: None,
            operands,
            origin: None,
        }
    }

    /// Attaches a jump label.
    #[must_use]
    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Executable instruction with validated operands.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct TypedInstruction {
    /// Resolved kind.
    pub kind: InstructionType,
    /// Operands satisfying the kind's contract.
    pub operands: Vec<Operand>,
}

impl TypedInstruction {
    /// First operand, if any.
    #[must_use]
    pub fn operand(&self) -> Option<&Operand> {
        self.operands.first()
    }

    /// Renders the instruction in statement-list form.
    #[must_use]
    pub fn render(&self, dialect: MnemonicDialect) -> String {
        let mut out = String::from(self.kind.mnemonic(dialect));
        for (index, operand) in self.operands.iter().enumerate() {
            out.push_str(if index == 0 { " " } else { ", " });
            operand.render_into(&mut out, dialect);
        }
        out
    }
}

/// Result of translating one raw instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Translated {
    /// The executable instruction.
    pub instruction: TypedInstruction,
    /// Label carried over for jump resolution.
    pub label: Option<String>,
    /// Source trace for the side-table.
    pub trace: ParentTrace,
}

/// Program load and validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslationError {
    /// Mnemonic unknown in the selected dialect.
    #[error("line {line}: unknown instruction `{mnemonic}` in dialect {dialect}")]
    UnknownInstruction {
        /// Mnemonic as written.
        mnemonic: String,
        /// Source line.
        line: u32,
        /// Dialect used for the lookup.
        dialect: MnemonicDialect,
    },
    /// Extended instruction or operand used while the gate is closed.
    #[error("line {line}: extended {what} requires extended instructions to be enabled")]
    ExtendedDisabled {
        /// Offending mnemonic or operand spelling.
        what: String,
        /// Source line.
        line: u32,
    },
    /// Operands violate the instruction's contract.
    #[error("line {line}: `{mnemonic}` {reason}")]
    OperandMismatch {
        /// Mnemonic as written.
        mnemonic: String,
        /// Source line.
        line: u32,
        /// What the contract expects.
        reason: &'static str,
    },
    /// Jump to a label that does not exist in the block.
    #[error("unresolved jump label `{0}`")]
    UnresolvedLabel(String),
    /// Label defined twice in one block.
    #[error("duplicate jump label `{0}`")]
    DuplicateLabel(String),
    /// Call or open of a block that is not part of the program.
    #[error("reference to missing block {0}")]
    UnknownBlock(BlockId),
    /// Number or address outside the configured CPU resources.
    #[error("{what} {value} exceeds the configured limit of {limit}")]
    OperandOutOfRange {
        /// Resource kind.
        what: &'static str,
        /// Requested number or byte.
        value: u32,
        /// Exclusive upper bound.
        limit: u32,
    },
    /// Block defined twice.
    #[error("block {0} is defined more than once")]
    DuplicateBlock(BlockId),
    /// Program has no OB1.
    #[error("program has no main cyclic block OB1")]
    MissingMainBlock,
}

type Contract = Result<(), &'static str>;

/// Translates one raw instruction.
///
/// # Errors
///
/// Returns [`TranslationError::UnknownInstruction`] when the mnemonic is
/// not in the `dialect` table, [`TranslationError::ExtendedDisabled`] for
/// extended kinds or operand forms while `extended_enabled` is false, and
/// [`TranslationError::OperandMismatch`] for contract violations.
pub fn translate(
    raw: RawInstruction,
    dialect: MnemonicDialect,
    extended_enabled: bool,
) -> Result<Translated, TranslationError> {
    let RawInstruction {
        mnemonic,
        line,
        label,
        operands,
        origin,
    } = raw;
    let Some(kind) = lookup(&mnemonic, dialect) else {
        return Err(TranslationError::UnknownInstruction {
            mnemonic,
            line,
            dialect,
        });
    };
    if kind.is_extended() && !extended_enabled {
        return Err(TranslationError::ExtendedDisabled {
            what: format!("instruction `{mnemonic}`"),
            line,
        });
    }
    if !extended_enabled {
        if let Some(operand) = operands.iter().find(|operand| operand.is_extended()) {
            return Err(TranslationError::ExtendedDisabled {
                what: format!("operand {}", describe_extended(operand)),
                line,
            });
        }
    }

    let mismatch = |reason| TranslationError::OperandMismatch {
        mnemonic: mnemonic.clone(),
        line,
        reason,
    };
    let operands = operands
        .into_iter()
        .map(type_operand)
        .collect::<Result<Vec<_>, _>>()
        .map_err(mismatch)?;
    check_contract(kind, &operands).map_err(mismatch)?;

    Ok(Translated {
        instruction: TypedInstruction { kind, operands },
        label: label.map(|label| label.trim().to_ascii_uppercase()),
        trace: ParentTrace { line, origin },
    })
}

fn describe_extended(operand: &RawOperand) -> String {
    let mut out = String::new();
    match operand {
        RawOperand::ExtStatusBit(bit) => {
            let _ = write!(out, "`__STW {}`", bit.spelling(MnemonicDialect::German));
        }
        RawOperand::ExtAccu(index) => {
            let _ = write!(out, "`__ACCU {index}`");
        }
        RawOperand::ExtAddressRegister(index) => {
            let _ = write!(out, "`__AR {index}`");
        }
        _ => out.push_str("form"),
    }
    out
}

fn type_operand(raw: RawOperand) -> Result<Operand, &'static str> {
    Ok(match raw {
        RawOperand::Memory(memory) => {
            check_memory_shape(&memory)?;
            Operand::Memory(memory)
        }
        RawOperand::Timer(number) => Operand::Timer(number),
        RawOperand::Counter(number) => Operand::Counter(number),
        RawOperand::Block { kind, number } => Operand::Block { kind, number },
        RawOperand::Constant(constant) => Operand::Immediate(constant),
        RawOperand::Label(label) => Operand::Label(label.trim().to_ascii_uppercase()),
        RawOperand::Condition(condition) => Operand::Condition(condition),
        RawOperand::StatusWord => Operand::StatusWord,
        RawOperand::DbRegister(query) => Operand::DbRegister(query),
        RawOperand::AddressRegister(register) => Operand::AddressRegister(register),
        RawOperand::ExtStatusBit(bit) => Operand::StatusBit(bit),
        RawOperand::ExtAccu(index) => match u8::try_from(index) {
            Ok(index @ 1..=4) => Operand::Accu(index),
            _ => return Err("accepts __ACCU 1 to 4 only"),
        },
        RawOperand::ExtAddressRegister(1) => Operand::AddressRegister(AddressRegister::Ar1),
        RawOperand::ExtAddressRegister(2) => Operand::AddressRegister(AddressRegister::Ar2),
        RawOperand::ExtAddressRegister(_) => return Err("accepts __AR 1 or 2 only"),
    })
}

fn check_memory_shape(memory: &MemoryOperand) -> Contract {
    if let Some(area) = memory.area {
        if area.is_peripheral() && memory.width == Width::Bit {
            return Err("cannot address single bits in the peripheral area");
        }
        if memory.db.is_some() && area != Area::DataBlock {
            return Err("qualifies only DB area operands with a data block");
        }
    }
    if let Addressing::Direct(address) = memory.addressing {
        if address.bit > 7 {
            return Err("has a bit number above 7");
        }
        if memory.width != Width::Bit && address.bit != 0 {
            return Err("has a bit number on a byte, word or double word operand");
        }
    }
    if let Addressing::MemoryIndirect { area, .. } = memory.addressing {
        if !area.can_hold_pointer() {
            return Err("reads an indirect pointer from an area that cannot hold one");
        }
    }
    Ok(())
}

const fn is_bit_memory(operand: &Operand) -> bool {
    matches!(operand, Operand::Memory(memory) if matches!(memory.width, Width::Bit))
}

const fn is_value_memory(operand: &Operand) -> bool {
    matches!(
        operand,
        Operand::Memory(memory) if !matches!(memory.width, Width::Bit)
    )
}

const fn is_dword_memory(operand: &Operand) -> bool {
    matches!(operand, Operand::Memory(memory) if matches!(memory.width, Width::Dword))
}

const fn is_logic_source(operand: &Operand) -> bool {
    is_bit_memory(operand)
        || matches!(
            operand,
            Operand::Timer(_) | Operand::Counter(_) | Operand::Condition(_) | Operand::StatusBit(_)
        )
}

const fn small_int(operand: &Operand) -> bool {
    match operand {
        Operand::Immediate(Constant::Int(value)) => *value >= 0 && *value <= 255,
        Operand::Immediate(Constant::Byte(_)) => true,
        _ => false,
    }
}

fn none(operands: &[Operand]) -> Contract {
    if operands.is_empty() {
        Ok(())
    } else {
        Err("takes no operand")
    }
}

fn one(operands: &[Operand], accept: fn(&Operand) -> bool, reason: &'static str) -> Contract {
    match operands {
        [operand] if accept(operand) => Ok(()),
        _ => Err(reason),
    }
}

fn optional(operands: &[Operand], accept: fn(&Operand) -> bool, reason: &'static str) -> Contract {
    match operands {
        [] => Ok(()),
        [operand] if accept(operand) => Ok(()),
        _ => Err(reason),
    }
}

const fn is_value_source(operand: &Operand) -> bool {
    matches!(
        operand,
        Operand::Memory(_)
            | Operand::Immediate(_)
            | Operand::Accu(_)
            | Operand::StatusWord
            | Operand::StatusBit(_)
            | Operand::AddressRegister(_)
    )
}

#[allow(clippy::too_many_lines)]
fn check_contract(kind: InstructionType, operands: &[Operand]) -> Contract {
    use InstructionType as K;

    match kind {
        K::And | K::AndNot | K::OrNot | K::Xor | K::XorNot => one(
            operands,
            is_logic_source,
            "expects one bit, timer, counter or status operand",
        ),
        K::Or => optional(
            operands,
            is_logic_source,
            "expects no operand or one bit, timer, counter or status operand",
        ),
        K::AndOpen
        | K::AndNotOpen
        | K::OrOpen
        | K::OrNotOpen
        | K::XorOpen
        | K::XorNotOpen
        | K::CloseParen
        | K::Not
        | K::SetRlo
        | K::ClearRlo
        | K::SaveRlo
        | K::McrActivate
        | K::McrDeactivate
        | K::McrOpen
        | K::McrClose
        | K::SwapAr
        | K::SwapAccu
        | K::Push
        | K::Pop
        | K::Enter
        | K::Leave
        | K::SwapWordBytes
        | K::SwapDwordBytes
        | K::BlockEnd
        | K::BlockEndConditional
        | K::BlockEndUnconditional
        | K::SwapDataBlocks
        | K::StatusReset => none(operands),
        K::AddInt
        | K::SubInt
        | K::MulInt
        | K::DivInt
        | K::AddDint
        | K::SubDint
        | K::MulDint
        | K::DivDint
        | K::ModDint
        | K::AddReal
        | K::SubReal
        | K::MulReal
        | K::DivReal
        | K::AbsReal
        | K::SqrReal
        | K::SqrtReal
        | K::ExpReal
        | K::LnReal
        | K::SinReal
        | K::CosReal
        | K::TanReal
        | K::AsinReal
        | K::AcosReal
        | K::AtanReal
        | K::EqInt
        | K::NeInt
        | K::GtInt
        | K::LtInt
        | K::GeInt
        | K::LeInt
        | K::EqDint
        | K::NeDint
        | K::GtDint
        | K::LtDint
        | K::GeDint
        | K::LeDint
        | K::EqReal
        | K::NeReal
        | K::GtReal
        | K::LtReal
        | K::GeReal
        | K::LeReal
        | K::BcdToInt
        | K::IntToBcd
        | K::BcdToDint
        | K::IntToDint
        | K::DintToBcd
        | K::DintToReal
        | K::InvertInt
        | K::InvertDint
        | K::NegateInt
        | K::NegateDint
        | K::NegateReal
        | K::Round
        | K::Truncate
        | K::RoundUp
        | K::RoundDown => none(operands),
        K::Assign => one(
            operands,
            |operand| is_bit_memory(operand) || matches!(operand, Operand::StatusBit(_)),
            "expects one bit operand",
        ),
        K::Set => one(
            operands,
            |operand| {
                is_bit_memory(operand) || matches!(operand, Operand::Counter(_) | Operand::StatusBit(_))
            },
            "expects one bit or counter operand",
        ),
        K::Reset => one(
            operands,
            |operand| {
                is_bit_memory(operand)
                    || matches!(
                        operand,
                        Operand::Timer(_) | Operand::Counter(_) | Operand::StatusBit(_)
                    )
            },
            "expects one bit, timer or counter operand",
        ),
        K::EdgePositive | K::EdgeNegative => {
            one(operands, is_bit_memory, "expects one edge memory bit")
        }
        K::Load => one(
            operands,
            |operand| {
                is_value_memory(operand)
                    || matches!(
                        operand,
                        Operand::Timer(_)
                            | Operand::Counter(_)
                            | Operand::Immediate(_)
                            | Operand::StatusWord
                            | Operand::DbRegister(_)
                            | Operand::Accu(_)
                            | Operand::AddressRegister(_)
                    )
            },
            "expects one byte, word, double word, timer, counter or constant operand",
        ),
        K::LoadBcd => one(
            operands,
            |operand| matches!(operand, Operand::Timer(_) | Operand::Counter(_)),
            "expects one timer or counter",
        ),
        K::Transfer => one(
            operands,
            |operand| {
                is_value_memory(operand)
                    || matches!(
                        operand,
                        Operand::StatusWord | Operand::Accu(_) | Operand::AddressRegister(_)
                    )
            },
            "expects one byte, word or double word destination",
        ),
        K::LoadAr1 | K::LoadAr2 => optional(
            operands,
            |operand| {
                is_dword_memory(operand)
                    || matches!(
                        operand,
                        Operand::AddressRegister(_)
                            | Operand::Immediate(
                                Constant::Pointer(_) | Constant::Dword(_) | Constant::Dint(_)
                            )
                    )
            },
            "expects no operand, a pointer, a double word or an address register",
        ),
        K::TransferAr1 | K::TransferAr2 => optional(
            operands,
            |operand| is_dword_memory(operand) || matches!(operand, Operand::AddressRegister(_)),
            "expects no operand, a double word or an address register",
        ),
        K::AddAr1 | K::AddAr2 => optional(
            operands,
            |operand| matches!(operand, Operand::Immediate(Constant::Pointer(_))),
            "expects no operand or a pointer constant",
        ),
        K::Increment | K::Decrement => one(operands, small_int, "expects a constant 0 to 255"),
        K::AddConstant => one(
            operands,
            |operand| {
                matches!(
                    operand,
                    Operand::Immediate(Constant::Int(_) | Constant::Dint(_))
                )
            },
            "expects an integer or double integer constant",
        ),
        K::AndWord | K::OrWord | K::XorWord | K::AndDword | K::OrDword | K::XorDword => optional(
            operands,
            |operand| {
                matches!(
                    operand,
                    Operand::Immediate(
                        Constant::Int(_)
                            | Constant::Dint(_)
                            | Constant::Byte(_)
                            | Constant::Word(_)
                            | Constant::Dword(_)
                    )
                )
            },
            "expects no operand or one constant",
        ),
        K::ShiftSignedInt
        | K::ShiftSignedDint
        | K::ShiftLeftWord
        | K::ShiftRightWord
        | K::ShiftLeftDword
        | K::ShiftRightDword
        | K::RotateLeftDword
        | K::RotateRightDword => optional(operands, small_int, "expects no operand or a count 0 to 255"),
        K::RotateLeftCc1 | K::RotateRightCc1 => none(operands),
        K::Jump
        | K::JumpList
        | K::JumpIfRlo
        | K::JumpIfNotRlo
        | K::JumpIfRloSaveBr
        | K::JumpIfNotRloSaveBr
        | K::JumpIfBr
        | K::JumpIfNotBr
        | K::JumpIfOv
        | K::JumpIfOs
        | K::JumpIfZero
        | K::JumpIfNonZero
        | K::JumpIfPositive
        | K::JumpIfNegative
        | K::JumpIfPositiveOrZero
        | K::JumpIfNegativeOrZero
        | K::JumpIfUnordered
        | K::Loop => one(
            operands,
            |operand| matches!(operand, Operand::Label(_) | Operand::Target { .. }),
            "expects one jump label",
        ),
        K::Call => match operands {
            [Operand::Block {
                kind: BlockKind::Fc,
                ..
            }] => Ok(()),
            [Operand::Block {
                kind: BlockKind::Fb,
                ..
            }, Operand::Block {
                kind: BlockKind::Db,
                ..
            }] => Ok(()),
            _ => Err("expects `FC n` or `FB n, DB m`"),
        },
        K::CallUnconditional | K::CallConditional => one(
            operands,
            |operand| {
                matches!(
                    operand,
                    Operand::Block {
                        kind: BlockKind::Fc | BlockKind::Fb,
                        ..
                    }
                )
            },
            "expects one FC or FB",
        ),
        K::OpenDataBlock => one(
            operands,
            |operand| {
                matches!(
                    operand,
                    Operand::Block {
                        kind: BlockKind::Db | BlockKind::Di,
                        ..
                    }
                )
            },
            "expects one DB or DI",
        ),
        K::StartPulse
        | K::StartExtendedPulse
        | K::StartOnDelay
        | K::StartRetentiveOnDelay
        | K::StartOffDelay => one(
            operands,
            |operand| matches!(operand, Operand::Timer(_)),
            "expects one timer",
        ),
        K::Enable => one(
            operands,
            |operand| matches!(operand, Operand::Timer(_) | Operand::Counter(_)),
            "expects one timer or counter",
        ),
        K::CountUp | K::CountDown => one(
            operands,
            |operand| matches!(operand, Operand::Counter(_)),
            "expects one counter",
        ),
        K::Nop => one(
            operands,
            |operand| matches!(operand, Operand::Immediate(Constant::Int(_))),
            "expects an integer constant",
        ),
        K::DisplayHint => one(operands, small_int, "expects a constant 0 to 255"),
        K::AssertEq | K::AssertNe | K::AssertGt | K::AssertLt | K::AssertGe | K::AssertLe => {
            match operands {
                [left, right] if is_value_source(left) && is_value_source(right) => Ok(()),
                _ => Err("expects two value operands"),
            }
        }
        K::Sleep => one(
            operands,
            |operand| {
                matches!(
                    operand,
                    Operand::Immediate(Constant::Int(_) | Constant::Dint(_) | Constant::Time(_))
                )
            },
            "expects a duration in milliseconds",
        ),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::{translate, RawInstruction, TranslationError};
    use crate::catalog::{InstructionType, MnemonicDialect, ENGLISH_TRANSLATIONS};
    use crate::operand::{
        Area, BlockKind, Condition, Constant, DbRegisterQuery, MemoryOperand, NumberRef, Operand,
        RawOperand, StatusBit, Width,
    };

    fn bit() -> RawOperand {
        RawOperand::Memory(MemoryOperand::bit(Area::Flag, 0, 0))
    }

    fn word() -> RawOperand {
        RawOperand::Memory(MemoryOperand::direct(Area::Flag, Width::Word, 2, 0))
    }

    /// Operands that satisfy the contract of `kind`.
    pub(crate) fn valid_operands(kind: InstructionType) -> Vec<RawOperand> {
        use crate::catalog::Category;
        use InstructionType as K;

        match kind {
            K::Call => vec![
                RawOperand::Block {
                    kind: BlockKind::Fb,
                    number: NumberRef::Direct(1),
                },
                RawOperand::Block {
                    kind: BlockKind::Db,
                    number: NumberRef::Direct(1),
                },
            ],
            K::CallUnconditional | K::CallConditional => vec![RawOperand::Block {
                kind: BlockKind::Fc,
                number: NumberRef::Direct(1),
            }],
            K::OpenDataBlock => vec![RawOperand::Block {
                kind: BlockKind::Db,
                number: NumberRef::Direct(1),
            }],
            K::Assign | K::Set | K::EdgePositive | K::EdgeNegative => vec![bit()],
            K::And | K::AndNot | K::OrNot | K::Xor | K::XorNot => vec![bit()],
            K::Reset => vec![RawOperand::Timer(NumberRef::Direct(0))],
            K::Load | K::Transfer => vec![word()],
            K::LoadBcd | K::Enable | K::CountUp | K::CountDown => {
                vec![RawOperand::Counter(NumberRef::Direct(0))]
            }
            K::Increment | K::Decrement | K::DisplayHint | K::Nop => {
                vec![RawOperand::Constant(Constant::Int(1))]
            }
            K::AddConstant => vec![RawOperand::Constant(Constant::Dint(-5))],
            K::AssertEq | K::AssertNe | K::AssertGt | K::AssertLt | K::AssertGe | K::AssertLe => {
                vec![word(), RawOperand::Constant(Constant::Int(3))]
            }
            K::Sleep => vec![RawOperand::Constant(Constant::Int(1))],
            _ => match kind.category() {
                Category::Jump => vec![RawOperand::Label("M001".into())],
                Category::Timer => vec![RawOperand::Timer(NumberRef::Direct(1))],
                _ => Vec::new(),
            },
        }
    }

    fn raw(kind: InstructionType, dialect: MnemonicDialect) -> RawInstruction {
        RawInstruction::new(kind.mnemonic(dialect), 1, valid_operands(kind))
    }

    #[test]
    fn every_kind_translates_with_valid_operands() {
        for kind in InstructionType::all() {
            for dialect in MnemonicDialect::ALL {
                let translated = translate(raw(kind, dialect), dialect, true)
                    .unwrap_or_else(|error| panic!("{kind:?} in {dialect}: {error}"));
                assert_eq!(translated.instruction.kind, kind);
            }
        }
    }

    #[test]
    fn extended_kinds_are_gated() {
        for kind in InstructionType::all().filter(|kind| kind.is_extended()) {
            let error = translate(raw(kind, MnemonicDialect::German), MnemonicDialect::German, false);
            assert!(
                matches!(error, Err(TranslationError::ExtendedDisabled { .. })),
                "{kind:?}"
            );
        }
    }

    #[rstest]
    #[case(RawOperand::ExtStatusBit(StatusBit::Ov))]
    #[case(RawOperand::ExtAccu(2))]
    #[case(RawOperand::ExtAddressRegister(1))]
    fn extended_operands_are_gated_on_standard_kinds(#[case] operand: RawOperand) {
        let mnemonic = if matches!(operand, RawOperand::ExtStatusBit(_)) {
            "U"
        } else {
            "L"
        };
        let instruction = RawInstruction::new(mnemonic, 4, vec![operand]);
        assert!(matches!(
            translate(instruction.clone(), MnemonicDialect::German, false),
            Err(TranslationError::ExtendedDisabled { line: 4, .. })
        ));
        assert!(translate(instruction, MnemonicDialect::German, true).is_ok());
    }

    #[test]
    fn accu_and_register_numbers_are_checked() {
        let instruction = RawInstruction::new("L", 1, vec![RawOperand::ExtAccu(5)]);
        assert!(matches!(
            translate(instruction, MnemonicDialect::German, true),
            Err(TranslationError::OperandMismatch { .. })
        ));
        let instruction = RawInstruction::new("T", 1, vec![RawOperand::ExtAddressRegister(3)]);
        assert!(matches!(
            translate(instruction, MnemonicDialect::German, true),
            Err(TranslationError::OperandMismatch { .. })
        ));
    }

    #[rstest]
    #[case("U", vec![])]
    #[case("U", vec![RawOperand::Memory(MemoryOperand::direct(Area::Flag, Width::Word, 0, 0))])]
    #[case("=", vec![RawOperand::Timer(NumberRef::Direct(1))])]
    #[case("L", vec![RawOperand::Memory(MemoryOperand::bit(Area::Input, 0, 0))])]
    #[case("+I", vec![RawOperand::Constant(Constant::Int(1))])]
    #[case("SPA", vec![])]
    #[case("CALL", vec![RawOperand::Block { kind: BlockKind::Fb, number: NumberRef::Direct(1) }])]
    #[case("AUF", vec![RawOperand::Block { kind: BlockKind::Fc, number: NumberRef::Direct(1) }])]
    #[case("INC", vec![RawOperand::Constant(Constant::Int(256))])]
    #[case("U", vec![RawOperand::Memory(MemoryOperand::bit(Area::Flag, 0, 8))])]
    #[case("L", vec![RawOperand::Memory(MemoryOperand::direct(Area::PeripheralInput, Width::Bit, 0, 0))])]
    #[case("L", vec![RawOperand::DbRegister(DbRegisterQuery::DbNumber), RawOperand::StatusWord])]
    fn contract_violations_are_rejected(#[case] mnemonic: &str, #[case] operands: Vec<RawOperand>) {
        let result = translate(
            RawInstruction::new(mnemonic, 9, operands),
            MnemonicDialect::German,
            true,
        );
        assert!(
            matches!(result, Err(TranslationError::OperandMismatch { line: 9, .. })),
            "{mnemonic}: {result:?}"
        );
    }

    #[test]
    fn or_accepts_a_bare_form_and_conditions() {
        let bare = translate(RawInstruction::new("O", 1, vec![]), MnemonicDialect::German, false);
        assert!(bare.is_ok());
        let condition = translate(
            RawInstruction::new("A", 1, vec![RawOperand::Condition(Condition::Zero)]),
            MnemonicDialect::English,
            false,
        );
        assert_eq!(
            condition.map(|translated| translated.instruction.operands),
            Ok(vec![Operand::Condition(Condition::Zero)])
        );
    }

    #[test]
    fn labels_are_normalised_and_trace_is_kept() {
        let mut instruction = RawInstruction::new("SPA", 12, vec![RawOperand::Label("end".into())])
            .labelled(" loop ");
        instruction.origin = Some(super::DiagramOrigin {
            diagram: "NW1".into(),
            element: 4,
        });
        let translated = translate(instruction, MnemonicDialect::German, false).expect("valid");
        assert_eq!(translated.label.as_deref(), Some("LOOP"));
        assert_eq!(translated.instruction.operands, vec![Operand::Label("END".into())]);
        assert_eq!(translated.trace.line, 12);
        assert_eq!(
            translated.trace.origin.map(|origin| origin.element),
            Some(4)
        );
    }

    #[test]
    fn rendering_uses_the_requested_dialect() {
        let translated = translate(
            RawInstruction::new(
                "U",
                1,
                vec![RawOperand::Memory(MemoryOperand::bit(Area::Input, 1, 2))],
            ),
            MnemonicDialect::German,
            false,
        )
        .expect("valid");
        assert_eq!(translated.instruction.render(MnemonicDialect::German), "U E 1.2");
        assert_eq!(translated.instruction.render(MnemonicDialect::English), "A I 1.2");
    }

    #[test]
    fn translation_pairs_resolve_to_the_same_kind() {
        for (german, english) in ENGLISH_TRANSLATIONS {
            let de = crate::catalog::lookup(german, MnemonicDialect::German).expect("german entry");
            let en = crate::catalog::lookup(english, MnemonicDialect::English).expect("english entry");
            assert_eq!(de, en);
            let translated_de = translate(raw(de, MnemonicDialect::German), MnemonicDialect::German, true);
            let translated_en = translate(raw(en, MnemonicDialect::English), MnemonicDialect::English, true);
            assert_eq!(
                translated_de.map(|translated| translated.instruction),
                translated_en.map(|translated| translated.instruction)
            );
        }
    }

    proptest! {
        #[test]
        fn unknown_mnemonics_are_rejected_deterministically(mnemonic in "[A-Z#%&]{1,8}") {
            prop_assume!(crate::catalog::lookup(&mnemonic, MnemonicDialect::German).is_none());
            prop_assume!(crate::catalog::lookup(&mnemonic, MnemonicDialect::English).is_none());
            for dialect in MnemonicDialect::ALL {
                let result = translate(RawInstruction::new(mnemonic.clone(), 3, vec![]), dialect, true);
                let is_unknown = matches!(
                    result,
                    Err(TranslationError::UnknownInstruction { line: 3, .. })
                );
                prop_assert!(is_unknown);
            }
        }

        #[test]
        fn known_mnemonics_never_panic_with_arbitrary_operands(
            index in 0..InstructionType::COUNT,
            dialect_index in 0usize..2,
            extended in any::<bool>(),
            operand_count in 0usize..3,
            seed in any::<u16>(),
        ) {
            let kind = InstructionType::from_index(index).expect("index in range");
            let dialect = MnemonicDialect::ALL[dialect_index];
            let pool = [
                bit(),
                word(),
                RawOperand::Constant(Constant::Int(i16::from_ne_bytes(seed.to_ne_bytes()))),
                RawOperand::Timer(NumberRef::Direct(seed)),
                RawOperand::ExtAccu(u32::from(seed % 6)),
                RawOperand::Label("X".into()),
                RawOperand::StatusWord,
            ];
            let operands = (0..operand_count)
                .map(|offset| pool[(usize::from(seed) + offset) % pool.len()].clone())
                .collect();
            let result = translate(
                RawInstruction::new(kind.mnemonic(dialect), 1, operands),
                dialect,
                extended,
            );
            if let Ok(translated) = result {
                prop_assert_eq!(translated.instruction.kind, kind);
                prop_assert!(extended || !kind.is_extended());
            }
        }
    }
}
