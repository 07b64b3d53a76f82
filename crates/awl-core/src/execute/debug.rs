//! Extended debug instructions: `__ASSERT==` and friends, `__SLEEP`,
//! `__STWRST`.

#![allow(clippy::pedantic, clippy::nursery, clippy::cast_possible_wrap, unknown_lints, missing_docs)]

use std::time::Duration;

use super::arith::Relation;
use super::helpers::{immediate, load_value};
use crate::fault::RuntimeErrorKind;
use crate::operand::Constant;
use crate::state::{CpuState, StatusWord};
use crate::translate::TypedInstruction;

/// Equality compares the raw 32-bit values; ordering compares them signed.
pub fn assert(
    state: &mut CpuState,
    insn: &TypedInstruction,
    relation: Relation,
) -> Result<(), RuntimeErrorKind> {
    let [left, right] = insn.operands.as_slice() else {
        return Err(RuntimeErrorKind::InvalidOperand);
    };
    let left = load_value(state, left)?;
    let right = load_value(state, right)?;
    let (signed_left, signed_right) = (left as i32, right as i32);
    let holds = match relation {
        Relation::Eq => left == right,
        Relation::Ne => left != right,
        Relation::Gt => signed_left > signed_right,
        Relation::Lt => signed_left < signed_right,
        Relation::Ge => signed_left >= signed_right,
        Relation::Le => signed_left <= signed_right,
    };
    if holds {
        Ok(())
    } else {
        Err(RuntimeErrorKind::AssertionFailed { left, right })
    }
}

/// `__SLEEP`: milliseconds; negative values sleep zero.
pub fn sleep_duration(insn: &TypedInstruction) -> Result<Duration, RuntimeErrorKind> {
    let millis = match immediate(insn.operand()) {
        Some(Constant::Int(value)) => i64::from(value),
        Some(Constant::Dint(value) | Constant::Time(value)) => i64::from(value),
        _ => return Err(RuntimeErrorKind::InvalidOperand),
    };
    Ok(Duration::from_millis(millis.max(0).unsigned_abs()))
}

/// `__STWRST`.
pub fn reset_status(state: &mut CpuState) {
    state.status = StatusWord::default();
}
