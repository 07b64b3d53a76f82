//! Integer, double integer and real arithmetic plus comparisons.
//!
//! Two-operand forms compute `ACCU2 <op> ACCU1`, store the result in ACCU1
//! and let the accumulator stack shift.

#![allow(
    clippy::pedantic,
    clippy::nursery,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    unknown_lints,
    missing_docs
)]

use std::cmp::Ordering;

use crate::fault::RuntimeErrorKind;
use crate::state::{ConditionCode, CpuState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

fn sign(value: i64) -> ConditionCode {
    ConditionCode::from_ordering(value.cmp(&0))
}

fn operands_int(state: &CpuState) -> (i16, i16) {
    (
        state.registers.accu2() as u16 as i16,
        state.registers.accu1() as u16 as i16,
    )
}

fn operands_dint(state: &CpuState) -> (i32, i32) {
    (state.registers.accu2() as i32, state.registers.accu1() as i32)
}

fn operands_real(state: &CpuState) -> (f32, f32) {
    (
        f32::from_bits(state.registers.accu2()),
        f32::from_bits(state.registers.accu1()),
    )
}

/// `+I`, `-I`, `*I`, `/I`.
pub fn int(state: &mut CpuState, op: ArithOp) -> Result<(), RuntimeErrorKind> {
    let (left, right) = operands_int(state);
    let (cc, overflow) = match op {
        ArithOp::Add | ArithOp::Sub => {
            let (result, overflow) = if op == ArithOp::Add {
                left.overflowing_add(right)
            } else {
                left.overflowing_sub(right)
            };
            state.registers.set_accu1_low(result as u16);
            (sign(i64::from(result)), overflow)
        }
        ArithOp::Mul => {
            let product = i32::from(left) * i32::from(right);
            state.registers.set_accu1(product as u32);
            (sign(i64::from(product)), i16::try_from(product).is_err())
        }
        ArithOp::Div | ArithOp::Mod => {
            if right == 0 {
                return Err(RuntimeErrorKind::DivisionByZero);
            }
            let (quotient, overflow) = left.overflowing_div(right);
            let remainder = left.wrapping_rem(right);
            state
                .registers
                .set_accu1((u32::from(remainder as u16) << 16) | u32::from(quotient as u16));
            (sign(i64::from(quotient)), overflow)
        }
    };
    state.registers.consume_accu2();
    state.status = state.status.with_arith(cc, overflow);
    Ok(())
}

/// `+D`, `-D`, `*D`, `/D`, `MOD`.
pub fn dint(state: &mut CpuState, op: ArithOp) -> Result<(), RuntimeErrorKind> {
    let (left, right) = operands_dint(state);
    let (result, cc, overflow) = match op {
        ArithOp::Add => {
            let (result, overflow) = left.overflowing_add(right);
            (result, sign(i64::from(result)), overflow)
        }
        ArithOp::Sub => {
            let (result, overflow) = left.overflowing_sub(right);
            (result, sign(i64::from(result)), overflow)
        }
        ArithOp::Mul => {
            let product = i64::from(left) * i64::from(right);
            (product as i32, sign(product), i32::try_from(product).is_err())
        }
        ArithOp::Div => {
            if right == 0 {
                return Err(RuntimeErrorKind::DivisionByZero);
            }
            let (quotient, overflow) = left.overflowing_div(right);
            (quotient, sign(i64::from(quotient)), overflow)
        }
        ArithOp::Mod => {
            if right == 0 {
                return Err(RuntimeErrorKind::DivisionByZero);
            }
            let remainder = left.wrapping_rem(right);
            (remainder, sign(i64::from(remainder)), false)
        }
    };
    state.registers.set_accu1(result as u32);
    state.registers.consume_accu2();
    state.status = state.status.with_arith(cc, overflow);
    Ok(())
}

/// Condition code and overflow of a real result.
pub fn real_status(value: f32) -> (ConditionCode, bool) {
    if value.is_nan() {
        (ConditionCode::Unordered, true)
    } else if value.is_infinite() {
        let cc = if value > 0.0 {
            ConditionCode::Positive
        } else {
            ConditionCode::Negative
        };
        (cc, true)
    } else if value == 0.0 {
        (ConditionCode::Zero, false)
    } else if value.is_subnormal() {
        (ConditionCode::Zero, true)
    } else if value > 0.0 {
        (ConditionCode::Positive, false)
    } else {
        (ConditionCode::Negative, false)
    }
}

fn store_real(state: &mut CpuState, value: f32) {
    let (cc, overflow) = real_status(value);
    state.registers.set_accu1(value.to_bits());
    state.status = state.status.with_arith(cc, overflow);
}

/// `+R`, `-R`, `*R`, `/R`.
pub fn real(state: &mut CpuState, op: ArithOp) {
    let (left, right) = operands_real(state);
    let result = match op {
        ArithOp::Add => left + right,
        ArithOp::Sub => left - right,
        ArithOp::Mul => left * right,
        ArithOp::Div | ArithOp::Mod => left / right,
    };
    store_real(state, result);
    state.registers.consume_accu2();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealFn {
    Sqr,
    Sqrt,
    Exp,
    Ln,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
}

/// `SQR` through `ATAN` on ACCU1.
pub fn real_fn(state: &mut CpuState, function: RealFn) {
    let value = f32::from_bits(state.registers.accu1());
    let result = match function {
        RealFn::Sqr => value * value,
        RealFn::Sqrt => value.sqrt(),
        RealFn::Exp => value.exp(),
        RealFn::Ln => value.ln(),
        RealFn::Sin => value.sin(),
        RealFn::Cos => value.cos(),
        RealFn::Tan => value.tan(),
        RealFn::Asin => value.asin(),
        RealFn::Acos => value.acos(),
        RealFn::Atan => value.atan(),
    };
    store_real(state, result);
}

/// `ABS`: clears the sign bit only.
pub fn abs(state: &mut CpuState) {
    let accu = state.registers.accu1();
    state.registers.set_accu1(accu & 0x7FFF_FFFF);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

impl Relation {
    const fn holds(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => matches!(ordering, Ordering::Equal),
            Self::Ne => !matches!(ordering, Ordering::Equal),
            Self::Gt => matches!(ordering, Ordering::Greater),
            Self::Lt => matches!(ordering, Ordering::Less),
            Self::Ge => !matches!(ordering, Ordering::Less),
            Self::Le => !matches!(ordering, Ordering::Greater),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Numeric {
    Int,
    Dint,
    Real,
}

/// `==I` through `<=R`: compares ACCU2 with ACCU1 without consuming either.
pub fn compare(state: &mut CpuState, numeric: Numeric, relation: Relation) {
    let ordering = match numeric {
        Numeric::Int => {
            let (left, right) = operands_int(state);
            Some(left.cmp(&right))
        }
        Numeric::Dint => {
            let (left, right) = operands_dint(state);
            Some(left.cmp(&right))
        }
        Numeric::Real => {
            let (left, right) = operands_real(state);
            left.partial_cmp(&right)
        }
    };
    let (result, cc, overflow) = match ordering {
        Some(ordering) => (
            relation.holds(ordering),
            ConditionCode::from_ordering(ordering),
            false,
        ),
        None => (false, ConditionCode::Unordered, true),
    };
    state.status = state
        .status
        .with_logic(true, result, result, false)
        .with_arith(cc, overflow);
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::{
        abs, compare, dint, int, real, real_fn, real_status, ArithOp, Numeric, RealFn, Relation,
    };
    use crate::config::CpuSpecs;
    use crate::fault::RuntimeErrorKind;
    use crate::state::{ConditionCode, CpuState};

    fn with_accus(accu2: u32, accu1: u32) -> CpuState {
        let mut state = CpuState::new(&CpuSpecs::default());
        state.registers.set_accu2(accu2);
        state.registers.set_accu1(accu1);
        state
    }

    #[rstest]
    #[case(ArithOp::Add, 30_000, 10_000, 0xFFFF_9C40, ConditionCode::Negative, true)]
    #[case(ArithOp::Sub, 5, 7, 0xFFFF_FFFE, ConditionCode::Negative, false)]
    #[case(ArithOp::Mul, 300, 300, 90_000, ConditionCode::Positive, true)]
    #[case(ArithOp::Div, 7, 2, 0x0001_0003, ConditionCode::Positive, false)]
    #[case(ArithOp::Div, -32768, -1, 0x0000_8000, ConditionCode::Negative, true)]
    fn integer_results_and_flags(
        #[case] op: ArithOp,
        #[case] left: i16,
        #[case] right: i16,
        #[case] accu1: u32,
        #[case] cc: ConditionCode,
        #[case] overflow: bool,
    ) {
        let mut state = with_accus(
            0xFFFF_0000 | u32::from(left as u16),
            0xFFFF_0000 | u32::from(right as u16),
        );
        int(&mut state, op).expect("integer op");
        assert_eq!(state.registers.accu1(), accu1);
        assert_eq!(state.status.condition_code(), cc);
        assert_eq!(state.status.ov(), overflow);
        assert_eq!(state.status.os(), overflow);
    }

    #[test]
    fn integer_division_by_zero_faults() {
        let mut state = with_accus(10, 0);
        assert_eq!(int(&mut state, ArithOp::Div), Err(RuntimeErrorKind::DivisionByZero));
        let mut state = with_accus(10, 0);
        assert_eq!(dint(&mut state, ArithOp::Mod), Err(RuntimeErrorKind::DivisionByZero));
    }

    #[test]
    fn dint_division_and_modulo() {
        let mut state = with_accus((-7i32) as u32, 2);
        dint(&mut state, ArithOp::Div).expect("/D");
        assert_eq!(state.registers.accu1() as i32, -3);
        let mut state = with_accus((-7i32) as u32, 2);
        dint(&mut state, ArithOp::Mod).expect("MOD");
        assert_eq!(state.registers.accu1() as i32, -1);
        assert_eq!(state.status.condition_code(), ConditionCode::Negative);
    }

    #[test]
    fn real_flags_classify_results() {
        assert_eq!(real_status(f32::NAN), (ConditionCode::Unordered, true));
        assert_eq!(real_status(f32::NEG_INFINITY), (ConditionCode::Negative, true));
        assert_eq!(real_status(-0.0), (ConditionCode::Zero, false));
        assert_eq!(real_status(1.0e-40), (ConditionCode::Zero, true));
        assert_eq!(real_status(2.5), (ConditionCode::Positive, false));
    }

    #[test]
    fn real_division_by_zero_overflows() {
        let mut state = with_accus(1.0f32.to_bits(), 0.0f32.to_bits());
        real(&mut state, ArithOp::Div);
        assert_eq!(f32::from_bits(state.registers.accu1()), f32::INFINITY);
        assert!(state.status.ov() && state.status.os());
    }

    #[test]
    fn single_operand_reals() {
        let mut state = with_accus(0, 9.0f32.to_bits());
        real_fn(&mut state, RealFn::Sqrt);
        assert_eq!(f32::from_bits(state.registers.accu1()), 3.0);
        state.registers.set_accu1((-3.0f32).to_bits());
        let before = state.status;
        abs(&mut state);
        assert_eq!(f32::from_bits(state.registers.accu1()), 3.0);
        assert_eq!(state.status, before);
    }

    #[rstest]
    #[case(Numeric::Int, Relation::Gt, 0x0000_0005, 0x0000_FFFF, true, ConditionCode::Positive)]
    #[case(Numeric::Dint, Relation::Gt, 0x0000_0005, 0x0000_FFFF, false, ConditionCode::Negative)]
    #[case(Numeric::Int, Relation::Le, 3, 3, true, ConditionCode::Zero)]
    #[case(Numeric::Dint, Relation::Ne, 3, 3, false, ConditionCode::Zero)]
    fn comparisons_set_rlo_and_code(
        #[case] numeric: Numeric,
        #[case] relation: Relation,
        #[case] accu2: u32,
        #[case] accu1: u32,
        #[case] rlo: bool,
        #[case] cc: ConditionCode,
    ) {
        let mut state = with_accus(accu2, accu1);
        compare(&mut state, numeric, relation);
        assert_eq!(state.status.rlo(), rlo);
        assert_eq!(state.status.condition_code(), cc);
        assert_eq!(state.registers.accu1(), accu1);
        assert_eq!(state.registers.accu2(), accu2);
    }

    #[test]
    fn nan_compares_unordered() {
        let mut state = with_accus(f32::NAN.to_bits(), 1.0f32.to_bits());
        compare(&mut state, Numeric::Real, Relation::Ne);
        assert!(!state.status.rlo());
        assert_eq!(state.status.condition_code(), ConditionCode::Unordered);
        assert!(state.status.ov());
    }

    proptest! {
        #[test]
        fn dint_addition_matches_wrapping_add(left in any::<i32>(), right in any::<i32>()) {
            let mut state = with_accus(left as u32, right as u32);
            dint(&mut state, ArithOp::Add).expect("+D");
            prop_assert_eq!(state.registers.accu1() as i32, left.wrapping_add(right));
            prop_assert_eq!(state.status.ov(), left.checked_add(right).is_none());
        }
    }
}
