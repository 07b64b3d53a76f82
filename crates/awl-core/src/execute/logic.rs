//! Bit logic, parenthesis nesting, single-bit writes and the MCR.

#![allow(clippy::pedantic, clippy::nursery, unknown_lints, missing_docs)]

use super::helpers::{load_bit, read_bit_at, resolve, store_bit, write_bit_at};
use crate::catalog::InstructionType;
use crate::fault::RuntimeErrorKind;
use crate::operand::{Operand, Width};
use crate::state::CpuState;

/// Combining function of a logic instruction or parenthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
    Xor,
}

impl LogicOp {
    /// Operation and negation of a logic or open-paren kind.
    pub const fn of(kind: InstructionType) -> Option<(Self, bool)> {
        use InstructionType as K;
        Some(match kind {
            K::And | K::AndOpen => (Self::And, false),
            K::AndNot | K::AndNotOpen => (Self::And, true),
            K::Or | K::OrOpen => (Self::Or, false),
            K::OrNot | K::OrNotOpen => (Self::Or, true),
            K::Xor | K::XorOpen => (Self::Xor, false),
            K::XorNot | K::XorNotOpen => (Self::Xor, true),
            _ => return None,
        })
    }
}

/// `U`, `UN`, `O`, `ON`, `X`, `XN` with an operand.
pub fn combine(
    state: &mut CpuState,
    op: LogicOp,
    negate: bool,
    operand: &Operand,
) -> Result<(), RuntimeErrorKind> {
    let raw = load_bit(state, operand)?;
    let value = raw ^ negate;
    let status = state.status;
    let first = !status.fc();
    let (rlo, or) = match op {
        LogicOp::And => {
            let rlo = if first {
                value | status.or()
            } else {
                (status.rlo() & value) | status.or()
            };
            (rlo, status.or())
        }
        LogicOp::Or => (if first { value } else { status.rlo() | value }, false),
        LogicOp::Xor => (if first { value } else { status.rlo() ^ value }, false),
    };
    state.status = status.with_logic(true, rlo, raw, or);
    Ok(())
}

/// `O` without operand: AND-before-OR.
pub fn or_branch(state: &mut CpuState) {
    let status = state.status;
    state.status = status.with_logic(false, status.rlo(), true, status.rlo());
}

/// `U(`, `UN(`, `O(`, `ON(`, `X(`, `XN(`.
pub fn open(state: &mut CpuState, kind: InstructionType) -> Result<(), RuntimeErrorKind> {
    state.paren.push(kind, state.status)?;
    let status = state.status;
    state.status = status.with_logic(false, status.rlo(), true, false);
    Ok(())
}

/// `)`.
pub fn close(state: &mut CpuState) -> Result<(), RuntimeErrorKind> {
    let saved = state.paren.pop()?;
    let (op, negate) = LogicOp::of(saved.kind).ok_or(RuntimeErrorKind::InvalidOperand)?;
    let value = state.status.rlo() ^ negate;
    let first = !saved.nesting_flag;
    let (rlo, or) = match op {
        LogicOp::And => {
            let rlo = if first {
                value | saved.or
            } else {
                (saved.rlo & value) | saved.or
            };
            (rlo, saved.or)
        }
        LogicOp::Or => (if first { value } else { saved.rlo | value }, false),
        LogicOp::Xor => (if first { value } else { saved.rlo ^ value }, saved.or),
    };
    state.status = state.status.with_logic(true, rlo, true, or);
    Ok(())
}

/// `=`.
pub fn assign(state: &mut CpuState, operand: &Operand) -> Result<(), RuntimeErrorKind> {
    let rlo = state.status.rlo();
    state.status = state.status.with_logic(false, rlo, rlo, false);
    match operand {
        Operand::StatusBit(_) => store_bit(state, operand, rlo),
        _ => {
            let value = rlo && state.mcr.enabled();
            store_bit(state, operand, value)
        }
    }
}

/// `S` and `R` on bits and status bits.
pub fn set_or_reset(state: &mut CpuState, operand: &Operand, set: bool) -> Result<(), RuntimeErrorKind> {
    let rlo = state.status.rlo();
    state.status = state.status.with_logic(false, rlo, rlo, false);
    if !rlo {
        return Ok(());
    }
    match operand {
        Operand::StatusBit(_) => store_bit(state, operand, set),
        _ if state.mcr.enabled() => store_bit(state, operand, set),
        _ => Ok(()),
    }
}

/// `FP` and `FN` on an edge memory bit.
pub fn edge(state: &mut CpuState, operand: &Operand, positive: bool) -> Result<(), RuntimeErrorKind> {
    let Operand::Memory(memory) = operand else {
        return Err(RuntimeErrorKind::InvalidOperand);
    };
    if memory.width != Width::Bit {
        return Err(RuntimeErrorKind::InvalidOperand);
    }
    let location = resolve(state, memory)?;
    let memo = read_bit_at(state, location)?;
    let rlo = state.status.rlo();
    write_bit_at(state, location, rlo)?;
    let result = if positive { rlo && !memo } else { !rlo && memo };
    state.status = state.status.with_logic(true, result, true, false);
    Ok(())
}

pub fn not(state: &mut CpuState) {
    let status = state.status;
    state.status = status.with_logic(status.fc(), !status.rlo(), true, status.or());
}

pub fn set_rlo(state: &mut CpuState, value: bool) {
    state.status = state.status.with_logic(false, value, value, false);
}

pub fn save(state: &mut CpuState) {
    state.status = state.status.with_br(state.status.rlo());
}

/// `MCR(`.
pub fn mcr_open(state: &mut CpuState) -> Result<(), RuntimeErrorKind> {
    let rlo = state.status.rlo();
    state.mcr.open(rlo)?;
    state.status = state.status.with_logic(false, rlo, true, false);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{assign, close, combine, edge, open, or_branch, LogicOp};
    use crate::catalog::InstructionType;
    use crate::config::CpuSpecs;
    use crate::fault::{RuntimeErrorKind, StackKind};
    use crate::operand::{Area, MemoryOperand, Operand};
    use crate::state::CpuState;

    fn input(bit: u8) -> Operand {
        Operand::Memory(MemoryOperand::bit(Area::Input, 0, bit))
    }

    fn flag(bit: u8) -> Operand {
        Operand::Memory(MemoryOperand::bit(Area::Flag, 0, bit))
    }

    fn state(inputs: u8) -> CpuState {
        let mut state = CpuState::new(&CpuSpecs::default());
        state.memory.inputs_mut()[0] = inputs;
        state
    }

    #[test]
    fn first_check_loads_then_and_combines() {
        let mut state = state(0b01);
        combine(&mut state, LogicOp::And, false, &input(0)).expect("U");
        assert!(state.status.rlo() && state.status.fc());
        combine(&mut state, LogicOp::And, false, &input(1)).expect("U");
        assert!(!state.status.rlo());
        assert!(!state.status.sta());
    }

    #[test]
    fn and_before_or_uses_the_or_bit() {
        // U E0.0 / U E0.1 / O / U E0.2 with E0.0=E0.1=1, E0.2=0
        let mut state = state(0b011);
        combine(&mut state, LogicOp::And, false, &input(0)).expect("U");
        combine(&mut state, LogicOp::And, false, &input(1)).expect("U");
        or_branch(&mut state);
        assert!(state.status.or() && !state.status.fc());
        combine(&mut state, LogicOp::And, false, &input(2)).expect("U");
        assert!(state.status.rlo());
    }

    #[test]
    fn nested_parentheses_combine_with_saved_context() {
        // U E0.0 / U( / O E0.1 / O E0.2 / ) / = M0.0 with E0.0=1, E0.2=1
        let mut state = state(0b101);
        combine(&mut state, LogicOp::And, false, &input(0)).expect("U");
        open(&mut state, InstructionType::AndOpen).expect("U(");
        assert!(!state.status.fc());
        combine(&mut state, LogicOp::Or, false, &input(1)).expect("O");
        combine(&mut state, LogicOp::Or, false, &input(2)).expect("O");
        close(&mut state).expect(")");
        assert!(state.status.rlo());
        assign(&mut state, &flag(0)).expect("=");
        assert_eq!(state.memory.flags()[0], 1);
    }

    #[test]
    fn negated_paren_inverts_inner_result() {
        let mut state = state(0b1);
        combine(&mut state, LogicOp::And, false, &input(0)).expect("U");
        open(&mut state, InstructionType::AndNotOpen).expect("UN(");
        combine(&mut state, LogicOp::And, false, &input(0)).expect("U");
        close(&mut state).expect(")");
        assert!(!state.status.rlo());
    }

    #[test]
    fn unbalanced_close_underflows() {
        let mut state = state(0);
        assert_eq!(
            close(&mut state),
            Err(RuntimeErrorKind::StackUnderflow(StackKind::Parenthesis))
        );
    }

    #[test]
    fn positive_edge_fires_once() {
        let mut state = state(0);
        state.status = state.status.with_logic(false, true, true, false);
        edge(&mut state, &flag(7), true).expect("FP");
        assert!(state.status.rlo());
        assert_eq!(state.memory.flags()[0], 0x80);
        state.status = state.status.with_logic(false, true, true, false);
        edge(&mut state, &flag(7), true).expect("FP");
        assert!(!state.status.rlo());
    }

    #[test]
    fn assign_is_gated_by_the_mcr() {
        let mut state = state(0);
        state.status = state.status.with_logic(false, true, true, false);
        state.mcr.activate();
        state.mcr.open(false).expect("MCR(");
        assign(&mut state, &flag(1)).expect("=");
        assert_eq!(state.memory.flags()[0], 0);
    }
}
