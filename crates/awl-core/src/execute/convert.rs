//! BCD, integer and real conversions, negation and shifts on ACCU1.

#![allow(
    clippy::pedantic,
    clippy::nursery,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    unknown_lints,
    missing_docs
)]

use super::helpers::count;
use crate::bcd;
use crate::fault::RuntimeErrorKind;
use crate::operand::Operand;
use crate::state::{ConditionCode, CpuState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    BcdToInt,
    IntToBcd,
    BcdToDint,
    DintToBcd,
    IntToDint,
    DintToReal,
    InvertInt,
    InvertDint,
    NegateInt,
    NegateDint,
    NegateReal,
}

/// Sets `OV`/`OS`, keeping the condition code and ACCU1.
fn overflow(state: &mut CpuState) {
    let cc = state.status.condition_code();
    state.status = state.status.with_arith(cc, true);
}

pub fn convert(state: &mut CpuState, conversion: Conversion) -> Result<(), RuntimeErrorKind> {
    let accu = state.registers.accu1();
    let low = accu as u16;
    match conversion {
        Conversion::BcdToInt => {
            let value = bcd::decode_int(low)?;
            state.registers.set_accu1_low(value as u16);
        }
        Conversion::IntToBcd => match bcd::encode_int(low as i16) {
            Some(encoded) => state.registers.set_accu1_low(encoded),
            None => overflow(state),
        },
        Conversion::BcdToDint => {
            let value = bcd::decode_dint(accu)?;
            state.registers.set_accu1(value as u32);
        }
        Conversion::DintToBcd => match bcd::encode_dint(accu as i32) {
            Some(encoded) => state.registers.set_accu1(encoded),
            None => overflow(state),
        },
        Conversion::IntToDint => {
            state.registers.set_accu1(i32::from(low as i16) as u32);
        }
        Conversion::DintToReal => {
            state.registers.set_accu1(((accu as i32) as f32).to_bits());
        }
        Conversion::InvertInt => state.registers.set_accu1_low(!low),
        Conversion::InvertDint => state.registers.set_accu1(!accu),
        Conversion::NegateInt => {
            let (result, overflowed) = (low as i16).overflowing_neg();
            state.registers.set_accu1_low(result as u16);
            state.status = state
                .status
                .with_arith(ConditionCode::from_ordering(result.cmp(&0)), overflowed);
        }
        Conversion::NegateDint => {
            let (result, overflowed) = (accu as i32).overflowing_neg();
            state.registers.set_accu1(result as u32);
            state.status = state
                .status
                .with_arith(ConditionCode::from_ordering(result.cmp(&0)), overflowed);
        }
        Conversion::NegateReal => state.registers.set_accu1(accu ^ 0x8000_0000),
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    Nearest,
    Truncate,
    Up,
    Down,
}

/// `RND`, `TRUNC`, `RND+`, `RND-`: real in ACCU1 to double integer.
pub fn round(state: &mut CpuState, rounding: Rounding) {
    let value = f32::from_bits(state.registers.accu1());
    let rounded = match rounding {
        Rounding::Nearest => value.round_ties_even(),
        Rounding::Truncate => value.trunc(),
        Rounding::Up => value.ceil(),
        Rounding::Down => value.floor(),
    };
    if rounded.is_nan() || rounded < -2_147_483_648.0 || rounded >= 2_147_483_648.0 {
        overflow(state);
        return;
    }
    state.registers.set_accu1((rounded as i32) as u32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shift {
    SignedInt,
    SignedDint,
    LeftWord,
    RightWord,
    LeftDword,
    RightDword,
    RotateLeft,
    RotateRight,
}

fn shift_status(state: &mut CpuState, last_out: bool) {
    let cc = if last_out {
        ConditionCode::Positive
    } else {
        ConditionCode::Zero
    };
    state.status = state.status.with_cc(cc);
}

const fn bit(value: u32, position: u32) -> bool {
    position < 32 && (value >> position) & 1 != 0
}

/// `SSI` through `RRD`. A count of zero is a no-op.
pub fn shift(state: &mut CpuState, kind: Shift, operand: Option<&Operand>) {
    let n = count(state, operand);
    if n == 0 {
        return;
    }
    let accu = state.registers.accu1();
    let low = accu & 0xFFFF;
    let (result, last_out) = match kind {
        Shift::SignedInt => {
            let value = low as u16 as i16;
            let shifted = value >> n.min(15);
            let last = if n > 16 { value < 0 } else { bit(low, n - 1) };
            ((accu & 0xFFFF_0000) | u32::from(shifted as u16), last)
        }
        Shift::SignedDint => {
            let value = accu as i32;
            let shifted = value >> n.min(31);
            let last = if n > 32 { value < 0 } else { bit(accu, n - 1) };
            (shifted as u32, last)
        }
        Shift::LeftWord => {
            let shifted = if n >= 16 { 0 } else { (low << n) & 0xFFFF };
            let last = n <= 16 && bit(low, 16 - n);
            ((accu & 0xFFFF_0000) | shifted, last)
        }
        Shift::RightWord => {
            let shifted = if n >= 16 { 0 } else { low >> n };
            let last = n <= 16 && bit(low, n - 1);
            ((accu & 0xFFFF_0000) | shifted, last)
        }
        Shift::LeftDword => {
            let shifted = accu.checked_shl(n).unwrap_or(0);
            let last = n <= 32 && bit(accu, 32 - n);
            (shifted, last)
        }
        Shift::RightDword => {
            let shifted = accu.checked_shr(n).unwrap_or(0);
            let last = n <= 32 && bit(accu, n - 1);
            (shifted, last)
        }
        Shift::RotateLeft => {
            let rotated = accu.rotate_left(n);
            (rotated, bit(rotated, 0))
        }
        Shift::RotateRight => {
            let rotated = accu.rotate_right(n);
            (rotated, bit(rotated, 31))
        }
    };
    state.registers.set_accu1(result);
    shift_status(state, last_out);
}

/// `RLDA`/`RRDA`: one-bit rotation through `CC1`.
pub fn rotate_through_cc1(state: &mut CpuState, left: bool) {
    let accu = state.registers.accu1();
    let carry = u32::from(state.status.cc1());
    let (result, out) = if left {
        ((accu << 1) | carry, bit(accu, 31))
    } else {
        ((accu >> 1) | (carry << 31), bit(accu, 0))
    };
    state.registers.set_accu1(result);
    shift_status(state, out);
}
