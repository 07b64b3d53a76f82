//! S7-compatible statement-list (AWL/STL) CPU execution core.

/// Closed instruction catalog and mnemonic dialect tables.
pub mod catalog;
pub use catalog::{lookup, CatalogEntry, Category, InstructionType, MnemonicDialect, CATALOG};

/// Raw and typed operand descriptors.
pub mod operand;
pub use operand::{
    AddressRegister, Addressing, Area, BitAddress, BlockKind, Condition, Constant,
    DbRegisterQuery, MemoryOperand, NumberRef, Operand, RawOperand, StatusBit, Width,
};

/// Raw-to-typed instruction translation.
pub mod translate;
pub use translate::{
    translate, DiagramOrigin, ParentTrace, RawInstruction, Translated, TranslationError,
    TypedInstruction,
};

/// Program ingestion, label resolution and validation.
pub mod program;
pub use program::{
    ambiguous_mnemonics, detect_dialect, AssemblyError, Block, BlockId, Program, RawBlock,
    RawDataBlock, RawProgram,
};

/// Hardware profile and runtime configuration builders.
pub mod config;
pub use config::{
    ConfigError, CpuConfig, CpuConfigBuilder, CpuSpecs, CpuSpecsBuilder, MnemonicSetting,
};

/// Packed BCD helpers.
pub mod bcd;

/// S5 timers.
pub mod timer;
pub use timer::{decode_s5time, encode_s5time, Timer, TimerBank, TimerMode};

/// S5 counters.
pub mod counter;
pub use counter::{Counter, CounterBank, COUNTER_MAX};

/// Process images, flags, data blocks and the S7 pointer format.
pub mod memory;
pub use memory::{DataBlock, MemoryRegions};

/// Architectural CPU state.
pub mod state;
pub use state::{
    CallFrame, CallStack, ConditionCode, CpuRunState, CpuState, McrStack, ParenStack,
    ParenStackElement, RegisterFile, StatusWord,
};

/// Instruction execution.
pub mod execute;
pub use execute::{execute, CallRequest, ExecuteOutcome};

/// OB walker following block calls.
pub mod cycle;
pub use cycle::BlockWalker;

/// Clock sources and cycle-time bookkeeping.
pub mod timing;
pub use timing::{Clock, CycleTimes, ManualClock, SystemClock};

/// Process-image hooks.
pub mod hardware;
pub use hardware::{HardwareInterface, HwError, LoopbackHardware};

/// Diagnostics counters.
pub mod diag;
pub use diag::CpuDiagnostics;

/// Maintenance signals, cycle reports and trace hooks.
pub mod api;
pub use api::{
    CycleReport, HostRequest, MaintenanceKind, MaintenanceRequest, TraceEvent, TraceSink,
};

/// Fault taxonomy and host error type.
pub mod fault;
pub use fault::{
    CpuError, FaultClass, RegisterSnapshot, RuntimeErrorKind, RuntimeFault, StackKind,
};

/// Host-facing CPU.
pub mod cpu;
pub use cpu::{Cpu, OB_TEMP_PRESET_BYTES};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
