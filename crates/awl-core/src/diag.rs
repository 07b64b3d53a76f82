//! Cycle statistics and saturating fault counters.

use crate::fault::{FaultClass, RuntimeFault};
use crate::program::BlockId;
use crate::timing::CycleTimes;

/// Host-visible diagnostics of one CPU instance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CpuDiagnostics {
    /// Cycle statistics since the last startup.
    pub cycles: CycleTimes,
    /// Instructions executed since the last startup.
    pub instruction_count: u64,
    /// Cycles that exceeded the configured limit.
    pub overrun_count: u32,
    /// Block and instruction index of the most recent fault.
    pub last_fault: Option<(BlockId, usize)>,
    /// Saturating counter for stack-class faults.
    pub fault_count_stack: u16,
    /// Saturating counter for arithmetic-class faults.
    pub fault_count_arithmetic: u16,
    /// Saturating counter for memory-class faults.
    pub fault_count_memory: u16,
    /// Saturating counter for call-class faults.
    pub fault_count_call: u16,
    /// Saturating counter for failed assertions.
    pub fault_count_assertion: u16,
    /// Saturating counter for hardware hook failures.
    pub hardware_error_count: u16,
}

impl CpuDiagnostics {
    /// Records a runtime fault against its class counter.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record_fault(&mut self, fault: &RuntimeFault) {
        self.last_fault = Some((fault.block, fault.index));
        match fault.kind.class() {
            FaultClass::Stack => {
                self.fault_count_stack = self.fault_count_stack.saturating_add(1);
            }
            FaultClass::Arithmetic => {
                self.fault_count_arithmetic = self.fault_count_arithmetic.saturating_add(1);
            }
            FaultClass::Memory => {
                self.fault_count_memory = self.fault_count_memory.saturating_add(1);
            }
            FaultClass::Call => {
                self.fault_count_call = self.fault_count_call.saturating_add(1);
            }
            FaultClass::Assertion => {
                self.fault_count_assertion = self.fault_count_assertion.saturating_add(1);
            }
        }
    }

    /// Records a failed hardware hook.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record_hardware_error(&mut self) {
        self.hardware_error_count = self.hardware_error_count.saturating_add(1);
    }

    /// Records a cycle overrun.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record_overrun(&mut self) {
        self.overrun_count = self.overrun_count.saturating_add(1);
    }

    /// Sum of all fault counters.
    #[must_use]
    pub fn total_faults(&self) -> u32 {
        [
            self.fault_count_stack,
            self.fault_count_arithmetic,
            self.fault_count_memory,
            self.fault_count_call,
            self.fault_count_assertion,
        ]
        .iter()
        .map(|count| u32::from(*count))
        .sum()
    }

    /// Clears cycle statistics and the instruction counter; fault counters
    /// survive a restart.
    pub fn restart(&mut self) {
        self.cycles = CycleTimes::default();
        self.instruction_count = 0;
    }

    /// Clears everything.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::CpuDiagnostics;
    use crate::fault::{RegisterSnapshot, RuntimeErrorKind, RuntimeFault, StackKind};
    use crate::program::BlockId;

    fn fault(kind: RuntimeErrorKind) -> RuntimeFault {
        RuntimeFault {
            kind,
            block: BlockId::fc(2),
            index: 7,
            instruction: String::from("/I"),
            trace: None,
            registers: RegisterSnapshot::default(),
        }
    }

    #[test]
    fn faults_are_counted_per_class() {
        let mut diag = CpuDiagnostics::default();
        diag.record_fault(&fault(RuntimeErrorKind::DivisionByZero));
        diag.record_fault(&fault(RuntimeErrorKind::StackUnderflow(StackKind::Parenthesis)));
        diag.record_fault(&fault(RuntimeErrorKind::DivisionByZero));
        assert_eq!(diag.fault_count_arithmetic, 2);
        assert_eq!(diag.fault_count_stack, 1);
        assert_eq!(diag.total_faults(), 3);
        assert_eq!(diag.last_fault, Some((BlockId::fc(2), 7)));
    }

    #[test]
    fn counters_saturate() {
        let mut diag = CpuDiagnostics {
            fault_count_call: u16::MAX,
            ..CpuDiagnostics::default()
        };
        diag.record_fault(&fault(RuntimeErrorKind::BlockNotFound(BlockId::fc(1))));
        assert_eq!(diag.fault_count_call, u16::MAX);
    }

    #[test]
    fn restart_keeps_fault_counters() {
        let mut diag = CpuDiagnostics::default();
        diag.instruction_count = 40;
        diag.record_fault(&fault(RuntimeErrorKind::DataBlockNotOpen));
        diag.restart();
        assert_eq!(diag.instruction_count, 0);
        assert_eq!(diag.fault_count_memory, 1);
        diag.reset();
        assert_eq!(diag, CpuDiagnostics::default());
    }
}
