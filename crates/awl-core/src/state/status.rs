use crate::operand::StatusBit;

/// `/FC` first-check bit (German `/ER`).
pub const STW_FC: u16 = 1 << 0;
/// Result of logic operation (German `VKE`).
pub const STW_RLO: u16 = 1 << 1;
/// Status bit.
pub const STW_STA: u16 = 1 << 2;
/// OR bit used by AND-before-OR sequences.
pub const STW_OR: u16 = 1 << 3;
/// Stored overflow.
pub const STW_OS: u16 = 1 << 4;
/// Overflow.
pub const STW_OV: u16 = 1 << 5;
/// Condition code 0 (German `A0`).
pub const STW_CC0: u16 = 1 << 6;
/// Condition code 1 (German `A1`).
pub const STW_CC1: u16 = 1 << 7;
/// Binary result (German `BIE`).
pub const STW_BR: u16 = 1 << 8;
/// Mask of architecturally defined status-word bits.
pub const STW_MASK: u16 = 0x01FF;

/// Condition-code pair `(CC1, CC0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionCode {
    /// `CC1=0 CC0=0`: zero or equal.
    Zero,
    /// `CC1=0 CC0=1`: negative or less.
    Negative,
    /// `CC1=1 CC0=0`: positive or greater.
    Positive,
    /// `CC1=1 CC0=1`: unordered.
    Unordered,
}

impl ConditionCode {
    /// Classifies an ordering of a result against zero.
    #[must_use]
    pub const fn from_ordering(ordering: std::cmp::Ordering) -> Self {
        match ordering {
            std::cmp::Ordering::Less => Self::Negative,
            std::cmp::Ordering::Equal => Self::Zero,
            std::cmp::Ordering::Greater => Self::Positive,
        }
    }

    const fn bits(self) -> u16 {
        match self {
            Self::Zero => 0,
            Self::Negative => STW_CC0,
            Self::Positive => STW_CC1,
            Self::Unordered => STW_CC0 | STW_CC1,
        }
    }
}

/// The 9-bit S7 status word in its single canonical layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct StatusWord(u16);

impl StatusWord {
    /// Builds a status word from raw bits; undefined bits are dropped.
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits & STW_MASK)
    }

    /// Raw bits.
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Reads one bit.
    #[must_use]
    pub const fn get(self, bit: StatusBit) -> bool {
        self.0 & (1 << bit.position()) != 0
    }

    /// Writes one bit.
    pub const fn set(&mut self, bit: StatusBit, value: bool) {
        let mask = 1 << bit.position();
        if value {
            self.0 |= mask;
        } else {
            self.0 &= !mask;
        }
    }

    /// `/FC` first-check bit.
    #[must_use]
    pub const fn fc(self) -> bool {
        self.0 & STW_FC != 0
    }

    /// Result of logic operation.
    #[must_use]
    pub const fn rlo(self) -> bool {
        self.0 & STW_RLO != 0
    }

    /// Status bit.
    #[must_use]
    pub const fn sta(self) -> bool {
        self.0 & STW_STA != 0
    }

    /// OR bit.
    #[must_use]
    pub const fn or(self) -> bool {
        self.0 & STW_OR != 0
    }

    /// Stored overflow.
    #[must_use]
    pub const fn os(self) -> bool {
        self.0 & STW_OS != 0
    }

    /// Overflow.
    #[must_use]
    pub const fn ov(self) -> bool {
        self.0 & STW_OV != 0
    }

    /// Condition code 0.
    #[must_use]
    pub const fn cc0(self) -> bool {
        self.0 & STW_CC0 != 0
    }

    /// Condition code 1.
    #[must_use]
    pub const fn cc1(self) -> bool {
        self.0 & STW_CC1 != 0
    }

    /// Binary result.
    #[must_use]
    pub const fn br(self) -> bool {
        self.0 & STW_BR != 0
    }

    /// Current condition code.
    #[must_use]
    pub const fn condition_code(self) -> ConditionCode {
        match (self.cc1(), self.cc0()) {
            (false, false) => ConditionCode::Zero,
            (false, true) => ConditionCode::Negative,
            (true, false) => ConditionCode::Positive,
            (true, true) => ConditionCode::Unordered,
        }
    }

    /// Returns a copy with the logic-chain bits replaced.
    ///
    /// Instructions build their complete update with the `with_*` helpers
    /// and store it in one assignment.
    #[must_use]
    pub const fn with_logic(self, fc: bool, rlo: bool, sta: bool, or: bool) -> Self {
        let mut bits = self.0 & !(STW_FC | STW_RLO | STW_STA | STW_OR);
        if fc {
            bits |= STW_FC;
        }
        if rlo {
            bits |= STW_RLO;
        }
        if sta {
            bits |= STW_STA;
        }
        if or {
            bits |= STW_OR;
        }
        Self(bits)
    }

    /// Returns a copy with `CC1/CC0` and `OV` replaced. A set `OV` also
    /// latches `OS`.
    #[must_use]
    pub const fn with_arith(self, cc: ConditionCode, overflow: bool) -> Self {
        let mut bits = self.0 & !(STW_CC0 | STW_CC1 | STW_OV);
        bits |= cc.bits();
        if overflow {
            bits |= STW_OV | STW_OS;
        }
        Self(bits)
    }

    /// Returns a copy with `CC1/CC0` replaced and `OV` cleared.
    #[must_use]
    pub const fn with_cc(self, cc: ConditionCode) -> Self {
        self.with_arith(cc, false)
    }

    /// Returns a copy with `BR` replaced.
    #[must_use]
    pub const fn with_br(self, br: bool) -> Self {
        if br {
            Self(self.0 | STW_BR)
        } else {
            Self(self.0 & !STW_BR)
        }
    }

    /// Returns a copy with `OS` cleared.
    #[must_use]
    pub const fn without_os(self) -> Self {
        Self(self.0 & !STW_OS)
    }

    /// Terminates a logic chain: `/FC=0`, `OR=0`, `STA=1`, RLO kept.
    #[must_use]
    pub const fn chain_terminated(self) -> Self {
        self.with_logic(false, self.rlo(), true, false)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConditionCode, StatusWord, STW_BR, STW_MASK, STW_OS, STW_OV};
    use crate::operand::StatusBit;

    #[test]
    fn named_bits_follow_canonical_positions() {
        for bit in StatusBit::ALL {
            let mut status = StatusWord::default();
            status.set(bit, true);
            assert_eq!(status.bits(), 1 << bit.position());
            assert!(status.get(bit));
            status.set(bit, false);
            assert_eq!(status.bits(), 0);
        }
    }

    #[test]
    fn undefined_bits_are_masked() {
        assert_eq!(StatusWord::from_bits(0xFFFF).bits(), STW_MASK);
    }

    #[test]
    fn overflow_latches_stored_overflow() {
        let status = StatusWord::default().with_arith(ConditionCode::Positive, true);
        assert!(status.ov() && status.os());
        let cleared = status.with_cc(ConditionCode::Zero);
        assert!(!cleared.ov());
        assert!(cleared.os());
        assert_eq!(cleared.bits() & (STW_OV | STW_OS), STW_OS);
    }

    #[test]
    fn condition_code_roundtrip() {
        for cc in [
            ConditionCode::Zero,
            ConditionCode::Negative,
            ConditionCode::Positive,
            ConditionCode::Unordered,
        ] {
            assert_eq!(StatusWord::default().with_cc(cc).condition_code(), cc);
        }
    }

    #[test]
    fn chain_termination_keeps_rlo_and_br() {
        let status = StatusWord::from_bits(0x01FF).chain_terminated();
        assert!(!status.fc() && !status.or());
        assert!(status.sta() && status.rlo());
        assert_eq!(status.bits() & STW_BR, STW_BR);
    }
}
