//! Fault taxonomy: runtime error kinds, located faults and the host error.

use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;
use crate::hardware::HwError;
use crate::operand::Area;
use crate::program::{AssemblyError, BlockId};
use crate::state::{CpuRunState, StatusWord};
use crate::translate::ParentTrace;

/// Fault classes used for diagnostics aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// Parenthesis, MCR or call stack discipline violated.
    Stack,
    /// Arithmetic or conversion fault.
    Arithmetic,
    /// Memory area, pointer or data block access fault.
    Memory,
    /// Block call or local data fault.
    Call,
    /// Debug assertion failure.
    Assertion,
}

/// Bounded LIFO structures owned by the CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum StackKind {
    /// Boolean parenthesis nesting stack.
    Parenthesis,
    /// Master control relay stack.
    Mcr,
    /// Block call stack.
    Call,
}

impl fmt::Display for StackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Parenthesis => "parenthesis",
            Self::Mcr => "MCR",
            Self::Call => "call",
        })
    }
}

/// Runtime fault taxonomy raised while a cycle executes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RuntimeErrorKind {
    /// Push onto a full stack.
    #[error("{0} stack overflow")]
    StackOverflow(StackKind),
    /// Pop from an empty stack.
    #[error("{0} stack underflow")]
    StackUnderflow(StackKind),
    /// Integer division or modulo by zero.
    #[error("integer division by zero")]
    DivisionByZero,
    /// Access outside the allocated size of an area.
    #[error("{width}-byte access at {area:?} byte {byte} is out of range")]
    AddressOutOfRange {
        /// Accessed area.
        area: Area,
        /// First byte offset.
        byte: u32,
        /// Access width in bytes.
        width: u32,
    },
    /// Call depth limit reached.
    #[error("call depth limit of {limit} exceeded")]
    RecursionLimitExceeded {
        /// Configured call stack depth.
        limit: u16,
    },
    /// Local data stack cannot hold the callee's local region.
    #[error("local data overflow: {requested} bytes requested, {available} available")]
    LocalStackOverflow {
        /// Bytes the callee declares.
        requested: u32,
        /// Bytes left on the local data stack.
        available: u32,
    },
    /// Value is not a valid BCD number.
    #[error("invalid BCD value {0:#06x}")]
    InvalidBcd(u32),
    /// Pointer does not name a usable area.
    #[error("invalid pointer {0:#010x}")]
    InvalidPointer(u32),
    /// Data block access with no data block opened.
    #[error("no data block open")]
    DataBlockNotOpen,
    /// Opened or qualified data block does not exist.
    #[error("data block {0} does not exist")]
    DataBlockNotFound(u16),
    /// Call target does not exist.
    #[error("block {0} does not exist")]
    BlockNotFound(BlockId),
    /// Timer number outside the configured bank.
    #[error("timer {0} does not exist")]
    TimerOutOfRange(u16),
    /// Counter number outside the configured bank.
    #[error("counter {0} does not exist")]
    CounterOutOfRange(u16),
    /// `__ASSERT` comparison evaluated false.
    #[error("assertion failed: {left:#x} vs {right:#x}")]
    AssertionFailed {
        /// First operand value.
        left: u32,
        /// Second operand value.
        right: u32,
    },
    /// Jump executed on a label that was never resolved.
    #[error("unresolved jump label `{0}`")]
    UnresolvedLabel(String),
    /// Operand shape the executing instruction does not accept.
    #[error("operand not accepted by the instruction")]
    InvalidOperand,
}

impl RuntimeErrorKind {
    /// Returns the diagnostics fault class.
    #[must_use]
    pub const fn class(&self) -> FaultClass {
        match self {
            Self::StackOverflow(_) | Self::StackUnderflow(_) => FaultClass::Stack,
            Self::DivisionByZero | Self::InvalidBcd(_) => FaultClass::Arithmetic,
            Self::AddressOutOfRange { .. }
            | Self::InvalidPointer(_)
            | Self::DataBlockNotOpen
            | Self::DataBlockNotFound(_)
            | Self::TimerOutOfRange(_)
            | Self::CounterOutOfRange(_)
            | Self::InvalidOperand => FaultClass::Memory,
            Self::RecursionLimitExceeded { .. }
            | Self::LocalStackOverflow { .. }
            | Self::BlockNotFound(_)
            | Self::UnresolvedLabel(_) => FaultClass::Call,
            Self::AssertionFailed { .. } => FaultClass::Assertion,
        }
    }
}

/// Register state captured when a runtime fault stops the CPU.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterSnapshot {
    /// Status word.
    pub status: StatusWord,
    /// Accumulators, ACCU1 first.
    pub accus: Vec<u32>,
    /// Address register 1.
    pub ar1: u32,
    /// Address register 2.
    pub ar2: u32,
    /// Opened global data block.
    pub db: u16,
    /// Opened instance data block.
    pub di: u16,
    /// Parenthesis stack depth.
    pub paren_depth: usize,
    /// Call stack depth.
    pub call_depth: usize,
}

/// Runtime fault with the context needed to locate it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[error("{kind} in {block} at #{index} `{instruction}`")]
pub struct RuntimeFault {
    /// What went wrong.
    pub kind: RuntimeErrorKind,
    /// Block executing the offending instruction.
    pub block: BlockId,
    /// Instruction index inside the block.
    pub index: usize,
    /// Rendered offending instruction.
    pub instruction: String,
    /// Source trace of the instruction, when the front end supplied one.
    pub trace: Option<ParentTrace>,
    /// Registers at the time of the fault.
    pub registers: RegisterSnapshot,
}

/// Error surface of the host-facing [`crate::Cpu`] API.
#[derive(Debug, Error)]
pub enum CpuError {
    /// Program could not be translated or validated.
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
    /// A runtime fault stopped the CPU.
    #[error(transparent)]
    Runtime(#[from] Box<RuntimeFault>),
    /// A hardware hook failed; CPU state was left unchanged.
    #[error("hardware interface failed: {0}")]
    Hardware(#[from] HwError),
    /// Configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Operation is not valid in the current run state.
    #[error("`{operation}` is not allowed in state {state:?}")]
    InvalidState {
        /// Rejected operation.
        operation: &'static str,
        /// Run state at the time of the call.
        state: CpuRunState,
    },
    /// No program has been loaded.
    #[error("no program loaded")]
    NoProgram,
}

impl CpuError {
    /// Returns the runtime fault, if this error carries one.
    #[must_use]
    pub fn runtime_fault(&self) -> Option<&RuntimeFault> {
        match self {
            Self::Runtime(fault) => Some(fault),
            _ => None,
        }
    }
}
