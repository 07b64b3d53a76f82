//! Host-facing control-flow signals, cycle reports and the trace hook.

use std::fmt;
use std::time::Duration;

use crate::catalog::InstructionType;
use crate::fault::FaultClass;
use crate::program::BlockId;
use crate::state::StatusWord;

pub use crate::state::CpuRunState;

/// Why the CPU left normal cyclic operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum MaintenanceKind {
    /// Host asked the CPU to stop.
    Stop,
    /// Host asked the CPU to shut down for good.
    Shutdown,
    /// Host asked for a restart through startup.
    SoftReboot,
    /// A cycle ran longer than the configured limit.
    CycleTimeExceeded,
}

impl fmt::Display for MaintenanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stop => "STOP",
            Self::Shutdown => "SHUTDOWN",
            Self::SoftReboot => "SOFT_REBOOT",
            Self::CycleTimeExceeded => "CYCLE_TIME_EXCEEDED",
        })
    }
}

/// Maintenance signal delivered through `ControlFlow::Break`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MaintenanceRequest {
    /// Request kind.
    pub kind: MaintenanceKind,
    /// Human-readable detail.
    pub message: String,
}

impl MaintenanceRequest {
    /// Builds a request.
    #[must_use]
    pub fn new(kind: MaintenanceKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for MaintenanceRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Request a host queues for the next cycle boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum HostRequest {
    /// Go to `Stopped`.
    Stop,
    /// Go to `Exit`.
    Shutdown,
    /// Go to `Maintenance`; the host then calls `startup` again.
    SoftReboot,
}

impl HostRequest {
    /// Maintenance kind announced when the request is honoured.
    #[must_use]
    pub const fn kind(self) -> MaintenanceKind {
        match self {
            Self::Stop => MaintenanceKind::Stop,
            Self::Shutdown => MaintenanceKind::Shutdown,
            Self::SoftReboot => MaintenanceKind::SoftReboot,
        }
    }

    /// State entered when the request is honoured.
    #[must_use]
    pub const fn target_state(self) -> CpuRunState {
        match self {
            Self::Stop => CpuRunState::Stopped,
            Self::Shutdown => CpuRunState::Exit,
            Self::SoftReboot => CpuRunState::Maintenance,
        }
    }
}

/// Summary of one completed OB1 cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CycleReport {
    /// 1-based cycle number since startup.
    pub cycle: u64,
    /// Time spent in hooks and OB1.
    pub elapsed: Duration,
    /// Padding slept to reach the cycle-time target.
    pub padding: Duration,
    /// Instructions executed in this cycle, callees included.
    pub instructions: u64,
}

/// Execution events emitted to an attached [`TraceSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceEvent {
    /// About to execute an instruction.
    InstructionStart {
        /// Executing block.
        block: BlockId,
        /// Instruction index.
        index: usize,
        /// Instruction kind.
        kind: InstructionType,
    },
    /// Instruction finished without fault.
    InstructionRetired {
        /// Executing block.
        block: BlockId,
        /// Instruction index.
        index: usize,
        /// Status word after execution.
        status: StatusWord,
        /// ACCU1 after execution.
        accu1: u32,
    },
    /// A block call pushed a frame.
    BlockCall {
        /// Called block.
        callee: BlockId,
        /// Call depth after the push.
        depth: usize,
    },
    /// A block returned.
    BlockReturn {
        /// Returning block.
        block: BlockId,
        /// Call depth after the pop.
        depth: usize,
    },
    /// A runtime fault stopped execution.
    FaultRaised {
        /// Faulting block.
        block: BlockId,
        /// Faulting instruction index.
        index: usize,
        /// Fault class.
        class: FaultClass,
    },
    /// OB1 finished.
    CycleEnd {
        /// Cycle number.
        cycle: u64,
        /// Time spent in hooks and OB1.
        elapsed: Duration,
    },
}

/// Sink trait for execution trace hooks.
pub trait TraceSink: Send {
    /// Records an event in execution order.
    fn on_event(&mut self, event: TraceEvent);
}

#[cfg(test)]
mod tests {
    use super::{CpuRunState, HostRequest, MaintenanceKind, MaintenanceRequest};

    #[test]
    fn host_requests_map_to_states() {
        assert_eq!(HostRequest::Stop.target_state(), CpuRunState::Stopped);
        assert_eq!(HostRequest::Shutdown.target_state(), CpuRunState::Exit);
        assert_eq!(
            HostRequest::SoftReboot.target_state(),
            CpuRunState::Maintenance
        );
        assert_eq!(HostRequest::Shutdown.kind(), MaintenanceKind::Shutdown);
    }

    #[test]
    fn request_display_names_kind() {
        let request = MaintenanceRequest::new(MaintenanceKind::CycleTimeExceeded, "cycle 3 took 12ms");
        assert_eq!(request.to_string(), "CYCLE_TIME_EXCEEDED: cycle 3 took 12ms");
    }
}
