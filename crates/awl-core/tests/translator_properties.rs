//! Catalog and translator properties: dialect round trip, totality and the
//! extended-instruction gate.

#![allow(clippy::pedantic, clippy::nursery)]

use awl_core::{
    lookup, translate, AddressRegister, Area, BlockKind, Condition, Constant, InstructionType,
    MemoryOperand, MnemonicDialect, NumberRef, RawInstruction, RawOperand, StatusBit,
    TranslationError, Width, CATALOG,
};
use proptest::prelude::*;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

fn operand_pool() -> Vec<RawOperand> {
    vec![
        RawOperand::Memory(MemoryOperand::bit(Area::Input, 0, 1)),
        RawOperand::Memory(MemoryOperand::direct(Area::Flag, Width::Word, 2, 0)),
        RawOperand::Memory(MemoryOperand::direct(Area::DataBlock, Width::Dword, 4, 0)),
        RawOperand::Timer(NumberRef::Direct(1)),
        RawOperand::Counter(NumberRef::Direct(2)),
        RawOperand::Block {
            kind: BlockKind::Fc,
            number: NumberRef::Direct(1),
        },
        RawOperand::Block {
            kind: BlockKind::Db,
            number: NumberRef::Direct(1),
        },
        RawOperand::Constant(Constant::Int(3)),
        RawOperand::Constant(Constant::Real(1.5)),
        RawOperand::Label("M1".into()),
        RawOperand::Condition(Condition::Zero),
        RawOperand::StatusWord,
        RawOperand::AddressRegister(AddressRegister::Ar1),
        RawOperand::ExtStatusBit(StatusBit::Rlo),
        RawOperand::ExtAccu(2),
        RawOperand::ExtAddressRegister(1),
    ]
}

#[test]
fn every_kind_round_trips_through_both_dialects() {
    for kind in InstructionType::all() {
        for dialect in MnemonicDialect::ALL {
            let mnemonic = kind.mnemonic(dialect);
            assert_eq!(lookup(mnemonic, dialect), Some(kind), "{mnemonic} in {dialect}");
            assert_eq!(
                lookup(&mnemonic.to_ascii_lowercase(), dialect),
                Some(kind),
                "lowercase {mnemonic} in {dialect}"
            );
        }
    }
    assert_eq!(CATALOG.len(), InstructionType::COUNT);
}

#[rstest]
#[case("U", "A")]
#[case("SPB", "JC")]
#[case("SV", "SE")]
#[case("SE", "SD")]
#[case("ZV", "CU")]
#[case("AUF", "OPN")]
#[case("L", "L")]
fn translation_pairs_name_the_same_kind(#[case] german: &str, #[case] english: &str) {
    let kind = lookup(german, MnemonicDialect::German);
    assert!(kind.is_some());
    assert_eq!(kind, lookup(english, MnemonicDialect::English));
}

#[test]
fn unknown_mnemonics_are_reported_with_the_dialect() {
    let raw = RawInstruction::new("FROB", 12, vec![]);
    assert_eq!(
        translate(raw, MnemonicDialect::English, true),
        Err(TranslationError::UnknownInstruction {
            mnemonic: "FROB".into(),
            line: 12,
            dialect: MnemonicDialect::English,
        })
    );
}

#[test]
fn extended_operands_need_the_gate_on_standard_kinds() {
    let raw = || RawInstruction::new("L", 3, vec![RawOperand::ExtAccu(2)]);
    assert!(matches!(
        translate(raw(), MnemonicDialect::German, false),
        Err(TranslationError::ExtendedDisabled { line: 3, .. })
    ));
    assert!(translate(raw(), MnemonicDialect::German, true).is_ok());
}

proptest! {
    #[test]
    fn translation_is_total(
        index in 0..InstructionType::COUNT,
        english in any::<bool>(),
        extended in any::<bool>(),
        picks in prop::collection::vec(0usize..16, 0..3),
    ) {
        let kind = InstructionType::from_index(index).expect("index in range");
        let dialect = if english { MnemonicDialect::English } else { MnemonicDialect::German };
        let pool = operand_pool();
        let operands: Vec<RawOperand> = picks.iter().map(|pick| pool[pick % pool.len()].clone()).collect();
        let raw = RawInstruction::new(kind.mnemonic(dialect), 1, operands);

        match translate(raw, dialect, extended) {
            Ok(translated) => {
                prop_assert_eq!(translated.instruction.kind, kind);
                prop_assert!(extended || !kind.is_extended());
                prop_assert_eq!(translated.trace.line, 1);
            }
            Err(TranslationError::ExtendedDisabled { .. }) => prop_assert!(!extended),
            Err(TranslationError::OperandMismatch { line, .. }) => prop_assert_eq!(line, 1),
            Err(other) => prop_assert!(false, "unexpected error {other:?}"),
        }
    }

    #[test]
    fn extended_kinds_never_pass_a_closed_gate(index in 0..InstructionType::COUNT) {
        let kind = InstructionType::from_index(index).expect("index in range");
        let raw = RawInstruction::new(kind.mnemonic(MnemonicDialect::German), 1, vec![]);
        let result = translate(raw, MnemonicDialect::German, false);
        if kind.is_extended() {
            let is_disabled = matches!(result, Err(TranslationError::ExtendedDisabled { .. }));
            prop_assert!(is_disabled);
        }
    }
}
