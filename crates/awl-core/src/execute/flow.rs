//! Jumps, block calls, block end and data block register instructions.

#![allow(clippy::pedantic, clippy::nursery, unknown_lints, missing_docs)]

use super::helpers::{check_db, condition, number, target};
use super::{CallRequest, ExecuteOutcome};
use crate::catalog::InstructionType;
use crate::fault::RuntimeErrorKind;
use crate::operand::{BlockKind, Condition, Operand};
use crate::program::BlockId;
use crate::state::CpuState;
use crate::translate::TypedInstruction;

fn taken(index: usize, jump: bool) -> ExecuteOutcome {
    if jump {
        ExecuteOutcome::Jump(index)
    } else {
        ExecuteOutcome::Next
    }
}

/// Every jump kind except `SPL` and `LOOP`.
pub fn jump(
    state: &mut CpuState,
    insn: &TypedInstruction,
) -> Result<ExecuteOutcome, RuntimeErrorKind> {
    use InstructionType as K;

    let index = target(insn.operand())?;
    let status = state.status;
    let rlo = status.rlo();
    let jump = match insn.kind {
        K::Jump => true,
        K::JumpIfRlo | K::JumpIfNotRlo | K::JumpIfRloSaveBr | K::JumpIfNotRloSaveBr => {
            let wanted = matches!(insn.kind, K::JumpIfRlo | K::JumpIfRloSaveBr);
            let mut next = status.with_logic(false, true, true, false);
            if matches!(insn.kind, K::JumpIfRloSaveBr | K::JumpIfNotRloSaveBr) {
                next = next.with_br(rlo);
            }
            state.status = next;
            rlo == wanted
        }
        K::JumpIfBr | K::JumpIfNotBr => {
            state.status = status.with_logic(false, rlo, true, false);
            status.br() == (insn.kind == K::JumpIfBr)
        }
        K::JumpIfOv => condition(state, Condition::Overflow),
        K::JumpIfOs => {
            state.status = status.without_os();
            status.os()
        }
        K::JumpIfZero => condition(state, Condition::Zero),
        K::JumpIfNonZero => condition(state, Condition::NonZero),
        K::JumpIfPositive => condition(state, Condition::Positive),
        K::JumpIfNegative => condition(state, Condition::Negative),
        K::JumpIfPositiveOrZero => condition(state, Condition::PositiveOrZero),
        K::JumpIfNegativeOrZero => condition(state, Condition::NegativeOrZero),
        K::JumpIfUnordered => condition(state, Condition::Unordered),
        _ => return Err(RuntimeErrorKind::InvalidOperand),
    };
    Ok(taken(index, jump))
}

/// `SPL`: ACCU1-LL selects one of the jumps following the instruction;
/// out-of-range values go to the operand label.
pub fn jump_list(
    state: &CpuState,
    insn: &TypedInstruction,
    ip: usize,
) -> Result<ExecuteOutcome, RuntimeErrorKind> {
    let index = target(insn.operand())?;
    let selector = (state.registers.accu1() & 0xFF) as usize;
    let entries = index.saturating_sub(ip + 1);
    Ok(if selector < entries {
        ExecuteOutcome::Jump(ip + 1 + selector)
    } else {
        ExecuteOutcome::Jump(index)
    })
}

/// `LOOP`: decrements ACCU1-L and jumps while it is not zero.
pub fn loop_jump(
    state: &mut CpuState,
    insn: &TypedInstruction,
) -> Result<ExecuteOutcome, RuntimeErrorKind> {
    let index = target(insn.operand())?;
    let counter = (state.registers.accu1() as u16).wrapping_sub(1);
    state.registers.set_accu1_low(counter);
    Ok(taken(index, counter != 0))
}

fn block(state: &CpuState, operand: Option<&Operand>) -> Result<BlockId, RuntimeErrorKind> {
    match operand {
        Some(Operand::Block {
            kind: kind @ (BlockKind::Fc | BlockKind::Fb),
            number: block,
        }) => Ok(BlockId::new(*kind, number(state, *block)?)),
        _ => Err(RuntimeErrorKind::InvalidOperand),
    }
}

/// `CALL`, `UC`, `CC`.
pub fn call(
    state: &mut CpuState,
    insn: &TypedInstruction,
) -> Result<ExecuteOutcome, RuntimeErrorKind> {
    let callee = block(state, insn.operand())?;
    let instance_db = match insn.operands.get(1) {
        Some(Operand::Block {
            kind: BlockKind::Db,
            number: db,
        }) => Some(number(state, *db)?),
        Some(_) => return Err(RuntimeErrorKind::InvalidOperand),
        None => None,
    };
    let status = state.status;
    let rlo = status.rlo();
    state.status = status.with_logic(false, rlo, true, false);
    if insn.kind == InstructionType::CallConditional && !rlo {
        return Ok(ExecuteOutcome::Next);
    }
    Ok(ExecuteOutcome::Call(CallRequest {
        block: callee,
        instance_db,
    }))
}

/// `BEB`: returns while RLO is set.
pub fn block_end_conditional(state: &mut CpuState) -> ExecuteOutcome {
    let rlo = state.status.rlo();
    state.status = state.status.with_logic(false, true, true, false);
    if rlo {
        ExecuteOutcome::Return
    } else {
        ExecuteOutcome::Next
    }
}

/// `AUF DB n` / `AUF DI n`. Block 0 closes the register.
pub fn open_data_block(state: &mut CpuState, operand: Option<&Operand>) -> Result<(), RuntimeErrorKind> {
    let Some(Operand::Block { kind, number: db }) = operand else {
        return Err(RuntimeErrorKind::InvalidOperand);
    };
    let db = number(state, *db)?;
    if db != 0 {
        check_db(state, db)?;
    }
    match kind {
        BlockKind::Db => state.registers.set_db(db),
        BlockKind::Di => state.registers.set_di(db),
        _ => return Err(RuntimeErrorKind::InvalidOperand),
    }
    Ok(())
}
