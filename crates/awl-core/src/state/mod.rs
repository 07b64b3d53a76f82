//! Architectural CPU state: status word, register file, stacks and the
//! aggregate the executor mutates.

/// Bounded call stack and local data stack.
pub mod call;
/// Master control relay stack.
pub mod mcr;
/// Bounded parenthesis stack.
pub mod paren;
/// Accumulators, address registers and data block registers.
pub mod registers;
/// CPU lifecycle states.
pub mod run_state;
/// Status word layout and flag update helpers.
pub mod status;

pub use call::{
    CallFrame, CallStack, FrameScopes, LocalRegion, ReturnAddress, DEFAULT_CALL_DEPTH,
};
pub use mcr::{McrScope, McrStack, MCR_DEPTH};
pub use paren::{ParenStack, ParenStackElement, DEFAULT_PAREN_DEPTH};
pub use registers::{RegisterFile, MAX_ACCUS};
pub use run_state::CpuRunState;
pub use status::{ConditionCode, StatusWord};

use std::time::Duration;

use crate::config::CpuSpecs;
use crate::counter::CounterBank;
use crate::fault::{RegisterSnapshot, RuntimeErrorKind};
use crate::memory::MemoryRegions;
use crate::operand::AddressRegister;
use crate::program::BlockId;
use crate::timer::TimerBank;

/// Everything an instruction can read or write.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CpuState {
    /// Status word.
    pub status: StatusWord,
    /// Accumulators, address registers, DB/DI registers.
    pub registers: RegisterFile,
    /// Parenthesis nesting.
    pub paren: ParenStack,
    /// Master control relay.
    pub mcr: McrStack,
    /// Block calls and local data.
    pub calls: CallStack,
    /// Process images, flags and data blocks.
    pub memory: MemoryRegions,
    /// Timer bank.
    pub timers: TimerBank,
    /// Counter bank.
    pub counters: CounterBank,
    /// CPU clock reading used by timers during the current cycle.
    pub now: Duration,
}

impl CpuState {
    /// Allocates zeroed state sized by `specs`.
    #[must_use]
    pub fn new(specs: &CpuSpecs) -> Self {
        Self {
            status: StatusWord::default(),
            registers: RegisterFile::new(specs.accu_count()),
            paren: ParenStack::new(specs.paren_stack_depth()),
            mcr: McrStack::default(),
            calls: CallStack::new(specs.call_stack_depth(), specs.local_data_bytes()),
            memory: MemoryRegions::new(
                specs.input_bytes(),
                specs.output_bytes(),
                specs.flag_bytes(),
            ),
            timers: TimerBank::new(specs.timer_count()),
            counters: CounterBank::new(specs.counter_count()),
            now: Duration::ZERO,
        }
    }

    /// Clears registers and every stack. Memory is left alone.
    pub fn clear_execution(&mut self) {
        self.status = StatusWord::default();
        self.registers.clear();
        self.paren.clear();
        self.mcr.clear();
        self.calls.clear();
    }

    /// Returns to power-on contents: registers, stacks, images, flags,
    /// timers and counters. Data blocks are reloaded by the caller.
    pub fn clear_all(&mut self) {
        self.clear_execution();
        self.memory.clear();
        self.timers.clear();
        self.counters.clear();
        self.now = Duration::ZERO;
    }

    /// Pushes a frame for `block`, saving the DB/DI registers and giving the
    /// callee fresh parenthesis and MCR scopes. Nothing changes on failure.
    ///
    /// # Errors
    ///
    /// Propagates the call stack's depth and local data limits.
    pub fn enter_block(
        &mut self,
        block: BlockId,
        local_bytes: u32,
        return_to: Option<ReturnAddress>,
    ) -> Result<(), RuntimeErrorKind> {
        let (db, di) = (self.registers.db(), self.registers.di());
        self.calls.push(block, local_bytes, return_to, db, di)?;
        let scopes = FrameScopes {
            paren_floor: self.paren.enter_scope(),
            mcr: self.mcr.enter_scope(),
        };
        if let Some(frame) = self.calls.current_mut() {
            frame.scopes = scopes;
        }
        Ok(())
    }

    /// Pops the newest frame and restores everything `enter_block` saved.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeErrorKind::StackUnderflow`] when no frame is active.
    pub fn leave_block(&mut self) -> Result<CallFrame, RuntimeErrorKind> {
        let frame = self.calls.pop()?;
        self.registers.set_db(frame.saved_db);
        self.registers.set_di(frame.saved_di);
        self.paren.leave_scope(frame.scopes.paren_floor);
        self.mcr.leave_scope(frame.scopes.mcr);
        Ok(frame)
    }

    /// Captures the registers for a fault report.
    #[must_use]
    pub fn snapshot(&self) -> RegisterSnapshot {
        RegisterSnapshot {
            status: self.status,
            accus: self.registers.accus().to_vec(),
            ar1: self.registers.ar(AddressRegister::Ar1),
            ar2: self.registers.ar(AddressRegister::Ar2),
            db: self.registers.db(),
            di: self.registers.di(),
            paren_depth: self.paren.depth(),
            call_depth: self.calls.depth(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CpuState;
    use crate::config::CpuSpecs;
    use crate::operand::AddressRegister;

    #[test]
    fn allocation_follows_specs() {
        let specs = CpuSpecs::builder()
            .accu_count(4)
            .and_then(|builder| builder.timer_count(3))
            .and_then(|builder| builder.flag_bytes(32))
            .expect("valid specs")
            .build();
        let state = CpuState::new(&specs);
        assert_eq!(state.registers.accus().len(), 4);
        assert_eq!(state.timers.len(), 3);
        assert_eq!(state.memory.flags().len(), 32);
        assert_eq!(state.paren.capacity(), 7);
    }

    #[test]
    fn block_calls_scope_paren_and_mcr() {
        use crate::catalog::InstructionType;
        use crate::program::BlockId;
        use crate::state::ReturnAddress;

        let mut state = CpuState::new(&CpuSpecs::default());
        state.enter_block(BlockId::MAIN, 20, None).expect("root");
        state
            .paren
            .push(InstructionType::AndOpen, state.status)
            .expect("caller paren");
        state.mcr.activate();
        state.registers.set_db(4);

        let return_to = ReturnAddress {
            block: BlockId::MAIN,
            index: 2,
        };
        state
            .enter_block(BlockId::fc(1), 0, Some(return_to))
            .expect("callee");
        assert_eq!(state.paren.depth(), 0);
        assert!(!state.mcr.is_active());
        state
            .paren
            .push(InstructionType::OrOpen, state.status)
            .expect("callee paren");
        state.registers.set_db(9);

        let frame = state.leave_block().expect("callee returns");
        assert_eq!(frame.return_to, Some(return_to));
        assert_eq!(state.registers.db(), 4);
        assert_eq!(state.paren.depth(), 1);
        assert!(state.mcr.is_active());

        state.leave_block().expect("root returns");
        assert_eq!(state.paren.depth(), 0);
        assert!(!state.mcr.is_active());
    }

    #[test]
    fn clear_all_returns_to_power_on() {
        let mut state = CpuState::new(&CpuSpecs::default());
        let fresh = state.clone();
        state.memory.flags_mut()[3] = 0x55;
        state.memory.outputs_mut()[0] = 0x01;
        let now = state.now;
        state
            .timers
            .get_mut(1)
            .and_then(|timer| timer.start(crate::timer::TimerMode::Pulse, true, 0x0010, now))
            .expect("timer 1 starts");
        state
            .counters
            .get_mut(2)
            .and_then(|counter| counter.set(true, 0x0042))
            .expect("counter 2 presets");
        state.registers.set_accu1(7);
        state.clear_all();
        assert_eq!(state, fresh);
    }

    #[test]
    fn clear_execution_keeps_memory() {
        let mut state = CpuState::new(&CpuSpecs::default());
        state.memory.flags_mut()[0] = 0x55;
        state.registers.set_accu1(7);
        state.registers.set_ar(AddressRegister::Ar2, 9);
        state.clear_execution();
        assert_eq!(state.registers.accu1(), 0);
        assert_eq!(state.snapshot().ar2, 0);
        assert_eq!(state.memory.flags()[0], 0x55);
    }
}
