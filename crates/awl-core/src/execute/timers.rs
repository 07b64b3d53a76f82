//! Timer and counter instructions.

#![allow(clippy::pedantic, clippy::nursery, unknown_lints, missing_docs)]

use super::helpers::number;
use crate::fault::RuntimeErrorKind;
use crate::operand::Operand;
use crate::state::CpuState;
use crate::timer::TimerMode;

/// Ends the logic chain after a timer or counter instruction.
fn chain_end(state: &mut CpuState) {
    let status = state.status;
    state.status = status.with_logic(false, status.rlo(), status.sta(), false);
}

/// `SI`, `SV`, `SE`, `SS`, `SA` with ACCU1-L as S5TIME preset.
pub fn start(state: &mut CpuState, mode: TimerMode, operand: Option<&Operand>) -> Result<(), RuntimeErrorKind> {
    let Some(Operand::Timer(timer)) = operand else {
        return Err(RuntimeErrorKind::InvalidOperand);
    };
    let timer = number(state, *timer)?;
    let rlo = state.status.rlo();
    let preset = state.registers.accu1() as u16;
    let now = state.now;
    state.timers.get_mut(timer)?.start(mode, rlo, preset, now)?;
    chain_end(state);
    Ok(())
}

/// `FR T n` / `FR Z n`.
pub fn enable(state: &mut CpuState, operand: Option<&Operand>) -> Result<(), RuntimeErrorKind> {
    let rlo = state.status.rlo();
    match operand {
        Some(Operand::Timer(timer)) => {
            let timer = number(state, *timer)?;
            state.timers.get_mut(timer)?.enable(rlo);
        }
        Some(Operand::Counter(counter)) => {
            let counter = number(state, *counter)?;
            state.counters.get_mut(counter)?.enable(rlo);
        }
        _ => return Err(RuntimeErrorKind::InvalidOperand),
    }
    chain_end(state);
    Ok(())
}

/// `ZV` / `ZR`.
pub fn count(state: &mut CpuState, operand: Option<&Operand>, up: bool) -> Result<(), RuntimeErrorKind> {
    let Some(Operand::Counter(counter)) = operand else {
        return Err(RuntimeErrorKind::InvalidOperand);
    };
    let counter = number(state, *counter)?;
    let rlo = state.status.rlo();
    let counter = state.counters.get_mut(counter)?;
    if up {
        counter.count_up(rlo);
    } else {
        counter.count_down(rlo);
    }
    chain_end(state);
    Ok(())
}

/// `S Z n`: presets the counter from ACCU1-L (BCD).
pub fn set_counter(state: &mut CpuState, operand: &Operand) -> Result<(), RuntimeErrorKind> {
    let Operand::Counter(counter) = operand else {
        return Err(RuntimeErrorKind::InvalidOperand);
    };
    let counter = number(state, *counter)?;
    let rlo = state.status.rlo();
    let preset = state.registers.accu1() as u16;
    state.counters.get_mut(counter)?.set(rlo, preset)?;
    chain_end(state);
    Ok(())
}

/// `R T n` / `R Z n`.
pub fn reset(state: &mut CpuState, operand: &Operand) -> Result<(), RuntimeErrorKind> {
    let rlo = state.status.rlo();
    match operand {
        Operand::Timer(timer) => {
            let timer = number(state, *timer)?;
            state.timers.get_mut(timer)?.reset(rlo);
        }
        Operand::Counter(counter) => {
            let counter = number(state, *counter)?;
            state.counters.get_mut(counter)?.reset(rlo);
        }
        _ => return Err(RuntimeErrorKind::InvalidOperand),
    }
    chain_end(state);
    Ok(())
}
