//! Closed instruction catalog and the two mnemonic dialect tables.
//!
//! The German (SIMATIC) table is the source of truth. The English table is
//! derived from it by substituting [`ENGLISH_TRANSLATIONS`]; every mnemonic
//! without a translation is spelled identically in both dialects.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Mnemonic dialect of a statement-list program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum MnemonicDialect {
    /// German SIMATIC mnemonics (`U`, `SPB`, `AUF`, `E 0.0`).
    #[default]
    German,
    /// English international mnemonics (`A`, `JC`, `OPN`, `I 0.0`).
    English,
}

impl MnemonicDialect {
    /// Both dialects, German first.
    pub const ALL: [Self; 2] = [Self::German, Self::English];
}

impl fmt::Display for MnemonicDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::German => f.write_str("DE"),
            Self::English => f.write_str("EN"),
        }
    }
}

/// Execution category of an instruction kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Boolean logic on the RLO, including parenthesized forms.
    Logic,
    /// Writes of the RLO to bit operands and RLO manipulation.
    BitAssign,
    /// Master control relay.
    Mcr,
    /// Load and transfer between memory and ACCU1.
    LoadTransfer,
    /// Address register loads, stores and arithmetic.
    AddressRegister,
    /// Accumulator stack manipulation.
    Accumulator,
    /// Word and double-word logic.
    WordLogic,
    /// Integer, double-integer and real arithmetic.
    Arithmetic,
    /// Comparisons writing the RLO.
    Compare,
    /// Numeric conversions.
    Conversion,
    /// Shifts and rotations.
    Shift,
    /// Jumps inside a block.
    Jump,
    /// Block calls.
    Call,
    /// Block end and return.
    BlockEnd,
    /// Data block register handling.
    DataBlock,
    /// Timer start instructions.
    Timer,
    /// Counter instructions.
    Counter,
    /// No-operation instructions.
    Misc,
    /// Extended debug and assertion instructions.
    Debug,
}

/// Closed enumeration of every instruction kind the CPU executes.
///
/// Discriminants are assigned implicitly from zero and are verified at
/// compile time against [`CATALOG`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum InstructionType {
    And,
    AndNot,
    Or,
    OrNot,
    Xor,
    XorNot,
    AndOpen,
    AndNotOpen,
    OrOpen,
    OrNotOpen,
    XorOpen,
    XorNotOpen,
    CloseParen,
    Assign,
    Reset,
    Set,
    EdgePositive,
    EdgeNegative,
    Not,
    SetRlo,
    ClearRlo,
    SaveRlo,
    McrActivate,
    McrDeactivate,
    McrOpen,
    McrClose,
    Load,
    LoadBcd,
    Transfer,
    LoadAr1,
    LoadAr2,
    TransferAr1,
    TransferAr2,
    SwapAr,
    AddAr1,
    AddAr2,
    SwapAccu,
    Push,
    Pop,
    Enter,
    Leave,
    Increment,
    Decrement,
    AddConstant,
    SwapWordBytes,
    SwapDwordBytes,
    AndWord,
    OrWord,
    XorWord,
    AndDword,
    OrDword,
    XorDword,
    AddInt,
    SubInt,
    MulInt,
    DivInt,
    AddDint,
    SubDint,
    MulDint,
    DivDint,
    ModDint,
    AddReal,
    SubReal,
    MulReal,
    DivReal,
    AbsReal,
    SqrReal,
    SqrtReal,
    ExpReal,
    LnReal,
    SinReal,
    CosReal,
    TanReal,
    AsinReal,
    AcosReal,
    AtanReal,
    EqInt,
    NeInt,
    GtInt,
    LtInt,
    GeInt,
    LeInt,
    EqDint,
    NeDint,
    GtDint,
    LtDint,
    GeDint,
    LeDint,
    EqReal,
    NeReal,
    GtReal,
    LtReal,
    GeReal,
    LeReal,
    BcdToInt,
    IntToBcd,
    BcdToDint,
    IntToDint,
    DintToBcd,
    DintToReal,
    InvertInt,
    InvertDint,
    NegateInt,
    NegateDint,
    NegateReal,
    Round,
    Truncate,
    RoundUp,
    RoundDown,
    ShiftSignedInt,
    ShiftSignedDint,
    ShiftLeftWord,
    ShiftRightWord,
    ShiftLeftDword,
    ShiftRightDword,
    RotateLeftDword,
    RotateRightDword,
    RotateLeftCc1,
    RotateRightCc1,
    Jump,
    JumpList,
    JumpIfRlo,
    JumpIfNotRlo,
    JumpIfRloSaveBr,
    JumpIfNotRloSaveBr,
    JumpIfBr,
    JumpIfNotBr,
    JumpIfOv,
    JumpIfOs,
    JumpIfZero,
    JumpIfNonZero,
    JumpIfPositive,
    JumpIfNegative,
    JumpIfPositiveOrZero,
    JumpIfNegativeOrZero,
    JumpIfUnordered,
    Loop,
    Call,
    CallUnconditional,
    CallConditional,
    BlockEnd,
    BlockEndConditional,
    BlockEndUnconditional,
    OpenDataBlock,
    SwapDataBlocks,
    StartPulse,
    StartExtendedPulse,
    StartOnDelay,
    StartRetentiveOnDelay,
    StartOffDelay,
    Enable,
    CountUp,
    CountDown,
    Nop,
    DisplayHint,
    AssertEq,
    AssertNe,
    AssertGt,
    AssertLt,
    AssertGe,
    AssertLe,
    Sleep,
    StatusReset,
}

/// Catalog row: kind, German mnemonic, execution category.
pub type CatalogEntry = (InstructionType, &'static str, Category);

/// Single source-of-truth instruction table, indexed by discriminant.
pub const CATALOG: &[CatalogEntry] = &[
    (InstructionType::And, "U", Category::Logic),
    (InstructionType::AndNot, "UN", Category::Logic),
    (InstructionType::Or, "O", Category::Logic),
    (InstructionType::OrNot, "ON", Category::Logic),
    (InstructionType::Xor, "X", Category::Logic),
    (InstructionType::XorNot, "XN", Category::Logic),
    (InstructionType::AndOpen, "U(", Category::Logic),
    (InstructionType::AndNotOpen, "UN(", Category::Logic),
    (InstructionType::OrOpen, "O(", Category::Logic),
    (InstructionType::OrNotOpen, "ON(", Category::Logic),
    (InstructionType::XorOpen, "X(", Category::Logic),
    (InstructionType::XorNotOpen, "XN(", Category::Logic),
    (InstructionType::CloseParen, ")", Category::Logic),
    (InstructionType::Assign, "=", Category::BitAssign),
    (InstructionType::Reset, "R", Category::BitAssign),
    (InstructionType::Set, "S", Category::BitAssign),
    (InstructionType::EdgePositive, "FP", Category::BitAssign),
    (InstructionType::EdgeNegative, "FN", Category::BitAssign),
    (InstructionType::Not, "NOT", Category::BitAssign),
    (InstructionType::SetRlo, "SET", Category::BitAssign),
    (InstructionType::ClearRlo, "CLR", Category::BitAssign),
    (InstructionType::SaveRlo, "SAVE", Category::BitAssign),
    (InstructionType::McrActivate, "MCRA", Category::Mcr),
    (InstructionType::McrDeactivate, "MCRD", Category::Mcr),
    (InstructionType::McrOpen, "MCR(", Category::Mcr),
    (InstructionType::McrClose, ")MCR", Category::Mcr),
    (InstructionType::Load, "L", Category::LoadTransfer),
    (InstructionType::LoadBcd, "LC", Category::LoadTransfer),
    (InstructionType::Transfer, "T", Category::LoadTransfer),
    (InstructionType::LoadAr1, "LAR1", Category::AddressRegister),
    (InstructionType::LoadAr2, "LAR2", Category::AddressRegister),
    (InstructionType::TransferAr1, "TAR1", Category::AddressRegister),
    (InstructionType::TransferAr2, "TAR2", Category::AddressRegister),
    (InstructionType::SwapAr, "TAR", Category::AddressRegister),
    (InstructionType::AddAr1, "+AR1", Category::AddressRegister),
    (InstructionType::AddAr2, "+AR2", Category::AddressRegister),
    (InstructionType::SwapAccu, "TAK", Category::Accumulator),
    (InstructionType::Push, "PUSH", Category::Accumulator),
    (InstructionType::Pop, "POP", Category::Accumulator),
    (InstructionType::Enter, "ENT", Category::Accumulator),
    (InstructionType::Leave, "LEAVE", Category::Accumulator),
    (InstructionType::Increment, "INC", Category::Accumulator),
    (InstructionType::Decrement, "DEC", Category::Accumulator),
    (InstructionType::AddConstant, "+", Category::Accumulator),
    (InstructionType::SwapWordBytes, "TAW", Category::Accumulator),
    (InstructionType::SwapDwordBytes, "TAD", Category::Accumulator),
    (InstructionType::AndWord, "UW", Category::WordLogic),
    (InstructionType::OrWord, "OW", Category::WordLogic),
    (InstructionType::XorWord, "XOW", Category::WordLogic),
    (InstructionType::AndDword, "UD", Category::WordLogic),
    (InstructionType::OrDword, "OD", Category::WordLogic),
    (InstructionType::XorDword, "XOD", Category::WordLogic),
    (InstructionType::AddInt, "+I", Category::Arithmetic),
    (InstructionType::SubInt, "-I", Category::Arithmetic),
    (InstructionType::MulInt, "*I", Category::Arithmetic),
    (InstructionType::DivInt, "/I", Category::Arithmetic),
    (InstructionType::AddDint, "+D", Category::Arithmetic),
    (InstructionType::SubDint, "-D", Category::Arithmetic),
    (InstructionType::MulDint, "*D", Category::Arithmetic),
    (InstructionType::DivDint, "/D", Category::Arithmetic),
    (InstructionType::ModDint, "MOD", Category::Arithmetic),
    (InstructionType::AddReal, "+R", Category::Arithmetic),
    (InstructionType::SubReal, "-R", Category::Arithmetic),
    (InstructionType::MulReal, "*R", Category::Arithmetic),
    (InstructionType::DivReal, "/R", Category::Arithmetic),
    (InstructionType::AbsReal, "ABS", Category::Arithmetic),
    (InstructionType::SqrReal, "SQR", Category::Arithmetic),
    (InstructionType::SqrtReal, "SQRT", Category::Arithmetic),
    (InstructionType::ExpReal, "EXP", Category::Arithmetic),
    (InstructionType::LnReal, "LN", Category::Arithmetic),
    (InstructionType::SinReal, "SIN", Category::Arithmetic),
    (InstructionType::CosReal, "COS", Category::Arithmetic),
    (InstructionType::TanReal, "TAN", Category::Arithmetic),
    (InstructionType::AsinReal, "ASIN", Category::Arithmetic),
    (InstructionType::AcosReal, "ACOS", Category::Arithmetic),
    (InstructionType::AtanReal, "ATAN", Category::Arithmetic),
    (InstructionType::EqInt, "==I", Category::Compare),
    (InstructionType::NeInt, "<>I", Category::Compare),
    (InstructionType::GtInt, ">I", Category::Compare),
    (InstructionType::LtInt, "<I", Category::Compare),
    (InstructionType::GeInt, ">=I", Category::Compare),
    (InstructionType::LeInt, "<=I", Category::Compare),
    (InstructionType::EqDint, "==D", Category::Compare),
    (InstructionType::NeDint, "<>D", Category::Compare),
    (InstructionType::GtDint, ">D", Category::Compare),
    (InstructionType::LtDint, "<D", Category::Compare),
    (InstructionType::GeDint, ">=D", Category::Compare),
    (InstructionType::LeDint, "<=D", Category::Compare),
    (InstructionType::EqReal, "==R", Category::Compare),
    (InstructionType::NeReal, "<>R", Category::Compare),
    (InstructionType::GtReal, ">R", Category::Compare),
    (InstructionType::LtReal, "<R", Category::Compare),
    (InstructionType::GeReal, ">=R", Category::Compare),
    (InstructionType::LeReal, "<=R", Category::Compare),
    (InstructionType::BcdToInt, "BTI", Category::Conversion),
    (InstructionType::IntToBcd, "ITB", Category::Conversion),
    (InstructionType::BcdToDint, "BTD", Category::Conversion),
    (InstructionType::IntToDint, "ITD", Category::Conversion),
    (InstructionType::DintToBcd, "DTB", Category::Conversion),
    (InstructionType::DintToReal, "DTR", Category::Conversion),
    (InstructionType::InvertInt, "INVI", Category::Conversion),
    (InstructionType::InvertDint, "INVD", Category::Conversion),
    (InstructionType::NegateInt, "NEGI", Category::Conversion),
    (InstructionType::NegateDint, "NEGD", Category::Conversion),
    (InstructionType::NegateReal, "NEGR", Category::Conversion),
    (InstructionType::Round, "RND", Category::Conversion),
    (InstructionType::Truncate, "TRUNC", Category::Conversion),
    (InstructionType::RoundUp, "RND+", Category::Conversion),
    (InstructionType::RoundDown, "RND-", Category::Conversion),
    (InstructionType::ShiftSignedInt, "SSI", Category::Shift),
    (InstructionType::ShiftSignedDint, "SSD", Category::Shift),
    (InstructionType::ShiftLeftWord, "SLW", Category::Shift),
    (InstructionType::ShiftRightWord, "SRW", Category::Shift),
    (InstructionType::ShiftLeftDword, "SLD", Category::Shift),
    (InstructionType::ShiftRightDword, "SRD", Category::Shift),
    (InstructionType::RotateLeftDword, "RLD", Category::Shift),
    (InstructionType::RotateRightDword, "RRD", Category::Shift),
    (InstructionType::RotateLeftCc1, "RLDA", Category::Shift),
    (InstructionType::RotateRightCc1, "RRDA", Category::Shift),
    (InstructionType::Jump, "SPA", Category::Jump),
    (InstructionType::JumpList, "SPL", Category::Jump),
    (InstructionType::JumpIfRlo, "SPB", Category::Jump),
    (InstructionType::JumpIfNotRlo, "SPBN", Category::Jump),
    (InstructionType::JumpIfRloSaveBr, "SPBB", Category::Jump),
    (InstructionType::JumpIfNotRloSaveBr, "SPBNB", Category::Jump),
    (InstructionType::JumpIfBr, "SPBI", Category::Jump),
    (InstructionType::JumpIfNotBr, "SPBIN", Category::Jump),
    (InstructionType::JumpIfOv, "SPO", Category::Jump),
    (InstructionType::JumpIfOs, "SPS", Category::Jump),
    (InstructionType::JumpIfZero, "SPZ", Category::Jump),
    (InstructionType::JumpIfNonZero, "SPN", Category::Jump),
    (InstructionType::JumpIfPositive, "SPP", Category::Jump),
    (InstructionType::JumpIfNegative, "SPM", Category::Jump),
    (InstructionType::JumpIfPositiveOrZero, "SPPZ", Category::Jump),
    (InstructionType::JumpIfNegativeOrZero, "SPMZ", Category::Jump),
    (InstructionType::JumpIfUnordered, "SPU", Category::Jump),
    (InstructionType::Loop, "LOOP", Category::Jump),
    (InstructionType::Call, "CALL", Category::Call),
    (InstructionType::CallUnconditional, "UC", Category::Call),
    (InstructionType::CallConditional, "CC", Category::Call),
    (InstructionType::BlockEnd, "BE", Category::BlockEnd),
    (InstructionType::BlockEndConditional, "BEB", Category::BlockEnd),
    (InstructionType::BlockEndUnconditional, "BEA", Category::BlockEnd),
    (InstructionType::OpenDataBlock, "AUF", Category::DataBlock),
    (InstructionType::SwapDataBlocks, "TDB", Category::DataBlock),
    (InstructionType::StartPulse, "SI", Category::Timer),
    (InstructionType::StartExtendedPulse, "SV", Category::Timer),
    (InstructionType::StartOnDelay, "SE", Category::Timer),
    (InstructionType::StartRetentiveOnDelay, "SS", Category::Timer),
    (InstructionType::StartOffDelay, "SA", Category::Timer),
    (InstructionType::Enable, "FR", Category::Timer),
    (InstructionType::CountUp, "ZV", Category::Counter),
    (InstructionType::CountDown, "ZR", Category::Counter),
    (InstructionType::Nop, "NOP", Category::Misc),
    (InstructionType::DisplayHint, "BLD", Category::Misc),
    (InstructionType::AssertEq, "__ASSERT==", Category::Debug),
    (InstructionType::AssertNe, "__ASSERT<>", Category::Debug),
    (InstructionType::AssertGt, "__ASSERT>", Category::Debug),
    (InstructionType::AssertLt, "__ASSERT<", Category::Debug),
    (InstructionType::AssertGe, "__ASSERT>=", Category::Debug),
    (InstructionType::AssertLe, "__ASSERT<=", Category::Debug),
    (InstructionType::Sleep, "__SLEEP", Category::Debug),
    (InstructionType::StatusReset, "__STWRST", Category::Debug),
];

/// German → English substitutions. Unlisted mnemonics are shared verbatim.
pub const ENGLISH_TRANSLATIONS: &[(&str, &str)] = &[
    ("U", "A"),
    ("UN", "AN"),
    ("U(", "A("),
    ("UN(", "AN("),
    ("TAR", "CAR"),
    ("TAW", "CAW"),
    ("TAD", "CAD"),
    ("UW", "AW"),
    ("UD", "AD"),
    ("SPA", "JU"),
    ("SPL", "JL"),
    ("SPB", "JC"),
    ("SPBN", "JCN"),
    ("SPBB", "JCB"),
    ("SPBNB", "JNB"),
    ("SPBI", "JBI"),
    ("SPBIN", "JNBI"),
    ("SPO", "JO"),
    ("SPS", "JOS"),
    ("SPZ", "JZ"),
    ("SPN", "JN"),
    ("SPP", "JP"),
    ("SPM", "JM"),
    ("SPPZ", "JPZ"),
    ("SPMZ", "JMZ"),
    ("SPU", "JUO"),
    ("BEB", "BEC"),
    ("BEA", "BEU"),
    ("AUF", "OPN"),
    ("TDB", "CDB"),
    ("SI", "SP"),
    ("SV", "SE"),
    ("SE", "SD"),
    ("SA", "SF"),
    ("ZV", "CU"),
    ("ZR", "CD"),
];

impl InstructionType {
    /// Number of instruction kinds.
    pub const COUNT: usize = Self::StatusReset as usize + 1;

    /// Iterates every instruction kind in discriminant order.
    pub fn all() -> impl Iterator<Item = Self> {
        CATALOG.iter().map(|(kind, _, _)| *kind)
    }

    /// Returns the catalog index of this kind.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the kind stored at a catalog index.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        CATALOG.get(index).map(|(kind, _, _)| *kind)
    }

    /// Returns the execution category.
    #[must_use]
    pub const fn category(self) -> Category {
        CATALOG[self as usize].2
    }

    /// Extended instructions are awlsim-style `__` debug helpers gated by
    /// `CpuConfig::extended_insns_enabled`.
    #[must_use]
    pub const fn is_extended(self) -> bool {
        matches!(self.category(), Category::Debug)
    }

    /// Returns the mnemonic in the given dialect.
    #[must_use]
    pub fn mnemonic(self, dialect: MnemonicDialect) -> &'static str {
        let german = CATALOG[self as usize].1;
        match dialect {
            MnemonicDialect::German => german,
            MnemonicDialect::English => english_spelling(german),
        }
    }
}

const _: () = assert_catalog_layout();

const fn assert_catalog_layout() {
    assert!(
        CATALOG.len() == InstructionType::COUNT,
        "catalog must list every instruction kind exactly once"
    );
    let mut index = 0;
    while index < CATALOG.len() {
        assert!(
            CATALOG[index].0 as usize == index,
            "catalog row order must match the enum discriminants"
        );
        index += 1;
    }
}

fn english_spelling(german: &'static str) -> &'static str {
    ENGLISH_TRANSLATIONS
        .iter()
        .find_map(|(de, en)| (*de == german).then_some(*en))
        .unwrap_or(german)
}

fn build_table(dialect: MnemonicDialect) -> HashMap<String, InstructionType> {
    let mut table = HashMap::with_capacity(CATALOG.len());
    for (kind, _, _) in CATALOG {
        let previous = table.insert(kind.mnemonic(dialect).to_ascii_uppercase(), *kind);
        assert!(
            previous.is_none(),
            "mnemonic collision in {dialect} table for {kind:?}"
        );
    }
    table
}

fn table(dialect: MnemonicDialect) -> &'static HashMap<String, InstructionType> {
    static GERMAN: OnceLock<HashMap<String, InstructionType>> = OnceLock::new();
    static ENGLISH: OnceLock<HashMap<String, InstructionType>> = OnceLock::new();
    match dialect {
        MnemonicDialect::German => GERMAN.get_or_init(|| build_table(MnemonicDialect::German)),
        MnemonicDialect::English => ENGLISH.get_or_init(|| build_table(MnemonicDialect::English)),
    }
}

/// Resolves a mnemonic in one dialect. Matching is ASCII case-insensitive.
#[must_use]
pub fn lookup(mnemonic: &str, dialect: MnemonicDialect) -> Option<InstructionType> {
    table(dialect)
        .get(&mnemonic.trim().to_ascii_uppercase())
        .copied()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{
        lookup, Category, InstructionType, MnemonicDialect, CATALOG, ENGLISH_TRANSLATIONS,
    };

    #[test]
    fn every_kind_resolves_in_both_dialects() {
        for kind in InstructionType::all() {
            for dialect in MnemonicDialect::ALL {
                assert_eq!(lookup(kind.mnemonic(dialect), dialect), Some(kind));
            }
        }
    }

    #[test]
    fn translated_timer_mnemonics_do_not_alias_across_dialects() {
        assert_eq!(
            lookup("SE", MnemonicDialect::German),
            Some(InstructionType::StartOnDelay)
        );
        assert_eq!(
            lookup("SE", MnemonicDialect::English),
            Some(InstructionType::StartExtendedPulse)
        );
        assert_eq!(
            lookup("SD", MnemonicDialect::English),
            Some(InstructionType::StartOnDelay)
        );
        assert_eq!(lookup("SD", MnemonicDialect::German), None);
    }

    #[test]
    fn translation_sources_exist_and_targets_are_unique() {
        let german: HashSet<_> = CATALOG.iter().map(|(_, name, _)| *name).collect();
        let mut targets = HashSet::new();
        for (de, en) in ENGLISH_TRANSLATIONS {
            assert!(german.contains(de), "{de} is not a German mnemonic");
            assert!(targets.insert(*en), "{en} translated twice");
        }
    }

    #[test]
    fn lookup_is_case_insensitive_and_trims() {
        assert_eq!(
            lookup(" spbnb ", MnemonicDialect::German),
            Some(InstructionType::JumpIfNotRloSaveBr)
        );
        assert_eq!(
            lookup("jcn", MnemonicDialect::English),
            Some(InstructionType::JumpIfNotRlo)
        );
    }

    #[test]
    fn unknown_mnemonics_are_rejected() {
        assert_eq!(lookup("FOO", MnemonicDialect::German), None);
        assert_eq!(lookup("", MnemonicDialect::English), None);
        assert_eq!(lookup("JC", MnemonicDialect::German), None);
        assert_eq!(lookup("SPB", MnemonicDialect::English), None);
    }

    #[test]
    fn only_debug_kinds_are_extended() {
        for kind in InstructionType::all() {
            assert_eq!(kind.is_extended(), kind.category() == Category::Debug);
        }
        assert!(InstructionType::AssertEq.is_extended());
        assert!(!InstructionType::Load.is_extended());
    }

    #[test]
    fn index_roundtrip_covers_catalog() {
        assert_eq!(InstructionType::all().count(), InstructionType::COUNT);
        for kind in InstructionType::all() {
            assert_eq!(InstructionType::from_index(kind.index()), Some(kind));
        }
        assert_eq!(InstructionType::from_index(InstructionType::COUNT), None);
    }
}
