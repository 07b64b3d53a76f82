//! Instruction execution for typed statement-list instructions.
//!
//! [`execute`] applies one instruction to the CPU state and reports how the
//! block walker continues. Block calls, returns and sleeps are only
//! requested here; the cycle driver owns the call stack transitions and the
//! clock.
//!
//! A faulting instruction returns its [`RuntimeErrorKind`]; the walker
//! stops the cycle and attaches the location.

#![allow(
    clippy::pedantic,
    clippy::nursery,
    clippy::similar_names,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::struct_excessive_bools,
    unknown_lints,
    missing_docs
)]

mod accu;
mod arith;
mod convert;
mod debug;
mod flow;
mod helpers;
mod logic;
mod timers;

use std::time::Duration;

use crate::catalog::InstructionType;
use crate::fault::RuntimeErrorKind;
use crate::operand::{AddressRegister, Operand};
use crate::program::BlockId;
use crate::state::CpuState;
use crate::timer::TimerMode;
use crate::translate::TypedInstruction;

use accu::WordOp;
use arith::{ArithOp, Numeric, RealFn, Relation};
use convert::{Conversion, Rounding, Shift};
use logic::LogicOp;

/// Block call requested by `CALL`, `UC` or `CC`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallRequest {
    /// Called code block.
    pub block: BlockId,
    /// Instance data block opened for an FB call.
    pub instance_db: Option<u16>,
}

/// How the block walker continues after an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteOutcome {
    /// Fall through to the next instruction.
    Next,
    /// Continue at an instruction index of the current block.
    Jump(usize),
    /// Push a frame and enter another block.
    Call(CallRequest),
    /// Leave the current block.
    Return,
    /// Block the cycle on the CPU clock, then fall through.
    Sleep(Duration),
}

fn required(insn: &TypedInstruction) -> Result<&Operand, RuntimeErrorKind> {
    insn.operand().ok_or(RuntimeErrorKind::InvalidOperand)
}

/// Executes `insn`, located at index `ip` of the running block.
///
/// # Errors
///
/// Returns the runtime fault raised by the instruction. State changes made
/// before the fault are kept; the cycle is aborted by the caller.
#[allow(clippy::too_many_lines)]
pub fn execute(
    state: &mut CpuState,
    insn: &TypedInstruction,
    ip: usize,
) -> Result<ExecuteOutcome, RuntimeErrorKind> {
    use InstructionType as K;

    let operand = insn.operand();
    match insn.kind {
        K::And | K::AndNot | K::Xor | K::XorNot | K::OrNot => {
            let (op, negate) = LogicOp::of(insn.kind).ok_or(RuntimeErrorKind::InvalidOperand)?;
            logic::combine(state, op, negate, required(insn)?)?;
        }
        K::Or => match operand {
            Some(operand) => logic::combine(state, LogicOp::Or, false, operand)?,
            None => logic::or_branch(state),
        },
        K::AndOpen | K::AndNotOpen | K::OrOpen | K::OrNotOpen | K::XorOpen | K::XorNotOpen => {
            logic::open(state, insn.kind)?;
        }
        K::CloseParen => logic::close(state)?,
        K::Assign => logic::assign(state, required(insn)?)?,
        K::Set | K::Reset => {
            let operand = required(insn)?;
            let set = insn.kind == K::Set;
            match operand {
                Operand::Counter(_) if set => timers::set_counter(state, operand)?,
                Operand::Timer(_) | Operand::Counter(_) => timers::reset(state, operand)?,
                _ => logic::set_or_reset(state, operand, set)?,
            }
        }
        K::EdgePositive => logic::edge(state, required(insn)?, true)?,
        K::EdgeNegative => logic::edge(state, required(insn)?, false)?,
        K::Not => logic::not(state),
        K::SetRlo => logic::set_rlo(state, true),
        K::ClearRlo => logic::set_rlo(state, false),
        K::SaveRlo => logic::save(state),
        K::McrActivate => state.mcr.activate(),
        K::McrDeactivate => state.mcr.deactivate(),
        K::McrOpen => logic::mcr_open(state)?,
        K::McrClose => state.mcr.close()?,

        K::Load => accu::load(state, required(insn)?)?,
        K::LoadBcd => accu::load_bcd(state, required(insn)?)?,
        K::Transfer => accu::transfer(state, required(insn)?)?,
        K::LoadAr1 => accu::load_ar(state, AddressRegister::Ar1, operand)?,
        K::LoadAr2 => accu::load_ar(state, AddressRegister::Ar2, operand)?,
        K::TransferAr1 => accu::transfer_ar(state, AddressRegister::Ar1, operand)?,
        K::TransferAr2 => accu::transfer_ar(state, AddressRegister::Ar2, operand)?,
        K::SwapAr => state.registers.swap_ar(),
        K::AddAr1 => accu::add_ar(state, AddressRegister::Ar1, operand),
        K::AddAr2 => accu::add_ar(state, AddressRegister::Ar2, operand),
        K::SwapAccu => state.registers.swap(),
        K::Push => state.registers.push(),
        K::Pop => state.registers.pop(),
        K::Enter => state.registers.enter(),
        K::Leave => state.registers.leave(),
        K::Increment => accu::step_low_byte(state, operand, true),
        K::Decrement => accu::step_low_byte(state, operand, false),
        K::AddConstant => accu::add_constant(state, operand)?,
        K::SwapWordBytes => accu::swap_word_bytes(state),
        K::SwapDwordBytes => accu::swap_dword_bytes(state),
        K::AndWord => accu::word_logic(state, WordOp::And, false, operand),
        K::OrWord => accu::word_logic(state, WordOp::Or, false, operand),
        K::XorWord => accu::word_logic(state, WordOp::Xor, false, operand),
        K::AndDword => accu::word_logic(state, WordOp::And, true, operand),
        K::OrDword => accu::word_logic(state, WordOp::Or, true, operand),
        K::XorDword => accu::word_logic(state, WordOp::Xor, true, operand),

        K::AddInt => arith::int(state, ArithOp::Add)?,
        K::SubInt => arith::int(state, ArithOp::Sub)?,
        K::MulInt => arith::int(state, ArithOp::Mul)?,
        K::DivInt => arith::int(state, ArithOp::Div)?,
        K::AddDint => arith::dint(state, ArithOp::Add)?,
        K::SubDint => arith::dint(state, ArithOp::Sub)?,
        K::MulDint => arith::dint(state, ArithOp::Mul)?,
        K::DivDint => arith::dint(state, ArithOp::Div)?,
        K::ModDint => arith::dint(state, ArithOp::Mod)?,
        K::AddReal => arith::real(state, ArithOp::Add),
        K::SubReal => arith::real(state, ArithOp::Sub),
        K::MulReal => arith::real(state, ArithOp::Mul),
        K::DivReal => arith::real(state, ArithOp::Div),
        K::AbsReal => arith::abs(state),
        K::SqrReal => arith::real_fn(state, RealFn::Sqr),
        K::SqrtReal => arith::real_fn(state, RealFn::Sqrt),
        K::ExpReal => arith::real_fn(state, RealFn::Exp),
        K::LnReal => arith::real_fn(state, RealFn::Ln),
        K::SinReal => arith::real_fn(state, RealFn::Sin),
        K::CosReal => arith::real_fn(state, RealFn::Cos),
        K::TanReal => arith::real_fn(state, RealFn::Tan),
        K::AsinReal => arith::real_fn(state, RealFn::Asin),
        K::AcosReal => arith::real_fn(state, RealFn::Acos),
        K::AtanReal => arith::real_fn(state, RealFn::Atan),

        K::EqInt => arith::compare(state, Numeric::Int, Relation::Eq),
        K::NeInt => arith::compare(state, Numeric::Int, Relation::Ne),
        K::GtInt => arith::compare(state, Numeric::Int, Relation::Gt),
        K::LtInt => arith::compare(state, Numeric::Int, Relation::Lt),
        K::GeInt => arith::compare(state, Numeric::Int, Relation::Ge),
        K::LeInt => arith::compare(state, Numeric::Int, Relation::Le),
        K::EqDint => arith::compare(state, Numeric::Dint, Relation::Eq),
        K::NeDint => arith::compare(state, Numeric::Dint, Relation::Ne),
        K::GtDint => arith::compare(state, Numeric::Dint, Relation::Gt),
        K::LtDint => arith::compare(state, Numeric::Dint, Relation::Lt),
        K::GeDint => arith::compare(state, Numeric::Dint, Relation::Ge),
        K::LeDint => arith::compare(state, Numeric::Dint, Relation::Le),
        K::EqReal => arith::compare(state, Numeric::Real, Relation::Eq),
        K::NeReal => arith::compare(state, Numeric::Real, Relation::Ne),
        K::GtReal => arith::compare(state, Numeric::Real, Relation::Gt),
        K::LtReal => arith::compare(state, Numeric::Real, Relation::Lt),
        K::GeReal => arith::compare(state, Numeric::Real, Relation::Ge),
        K::LeReal => arith::compare(state, Numeric::Real, Relation::Le),

        K::BcdToInt => convert::convert(state, Conversion::BcdToInt)?,
        K::IntToBcd => convert::convert(state, Conversion::IntToBcd)?,
        K::BcdToDint => convert::convert(state, Conversion::BcdToDint)?,
        K::IntToDint => convert::convert(state, Conversion::IntToDint)?,
        K::DintToBcd => convert::convert(state, Conversion::DintToBcd)?,
        K::DintToReal => convert::convert(state, Conversion::DintToReal)?,
        K::InvertInt => convert::convert(state, Conversion::InvertInt)?,
        K::InvertDint => convert::convert(state, Conversion::InvertDint)?,
        K::NegateInt => convert::convert(state, Conversion::NegateInt)?,
        K::NegateDint => convert::convert(state, Conversion::NegateDint)?,
        K::NegateReal => convert::convert(state, Conversion::NegateReal)?,
        K::Round => convert::round(state, Rounding::Nearest),
        K::Truncate => convert::round(state, Rounding::Truncate),
        K::RoundUp => convert::round(state, Rounding::Up),
        K::RoundDown => convert::round(state, Rounding::Down),
        K::ShiftSignedInt => convert::shift(state, Shift::SignedInt, operand),
        K::ShiftSignedDint => convert::shift(state, Shift::SignedDint, operand),
        K::ShiftLeftWord => convert::shift(state, Shift::LeftWord, operand),
        K::ShiftRightWord => convert::shift(state, Shift::RightWord, operand),
        K::ShiftLeftDword => convert::shift(state, Shift::LeftDword, operand),
        K::ShiftRightDword => convert::shift(state, Shift::RightDword, operand),
        K::RotateLeftDword => convert::shift(state, Shift::RotateLeft, operand),
        K::RotateRightDword => convert::shift(state, Shift::RotateRight, operand),
        K::RotateLeftCc1 => convert::rotate_through_cc1(state, true),
        K::RotateRightCc1 => convert::rotate_through_cc1(state, false),

        K::Jump
        | K::JumpIfRlo
        | K::JumpIfNotRlo
        | K::JumpIfRloSaveBr
        | K::JumpIfNotRloSaveBr
        | K::JumpIfBr
        | K::JumpIfNotBr
        | K::JumpIfOv
        | K::JumpIfOs
        | K::JumpIfZero
        | K::JumpIfNonZero
        | K::JumpIfPositive
        | K::JumpIfNegative
        | K::JumpIfPositiveOrZero
        | K::JumpIfNegativeOrZero
        | K::JumpIfUnordered => return flow::jump(state, insn),
        K::JumpList => return flow::jump_list(state, insn, ip),
        K::Loop => return flow::loop_jump(state, insn),
        K::Call | K::CallUnconditional | K::CallConditional => return flow::call(state, insn),
        K::BlockEnd | K::BlockEndUnconditional => return Ok(ExecuteOutcome::Return),
        K::BlockEndConditional => return Ok(flow::block_end_conditional(state)),
        K::OpenDataBlock => flow::open_data_block(state, operand)?,
        K::SwapDataBlocks => state.registers.swap_db(),

        K::StartPulse => timers::start(state, TimerMode::Pulse, operand)?,
        K::StartExtendedPulse => timers::start(state, TimerMode::ExtendedPulse, operand)?,
        K::StartOnDelay => timers::start(state, TimerMode::OnDelay, operand)?,
        K::StartRetentiveOnDelay => timers::start(state, TimerMode::RetentiveOnDelay, operand)?,
        K::StartOffDelay => timers::start(state, TimerMode::OffDelay, operand)?,
        K::Enable => timers::enable(state, operand)?,
        K::CountUp => timers::count(state, operand, true)?,
        K::CountDown => timers::count(state, operand, false)?,

        K::Nop | K::DisplayHint => {}
        K::AssertEq => debug::assert(state, insn, Relation::Eq)?,
        K::AssertNe => debug::assert(state, insn, Relation::Ne)?,
        K::AssertGt => debug::assert(state, insn, Relation::Gt)?,
        K::AssertLt => debug::assert(state, insn, Relation::Lt)?,
        K::AssertGe => debug::assert(state, insn, Relation::Ge)?,
        K::AssertLe => debug::assert(state, insn, Relation::Le)?,
        K::Sleep => return debug::sleep_duration(insn).map(ExecuteOutcome::Sleep),
        K::StatusReset => debug::reset_status(state),
    }
    Ok(ExecuteOutcome::Next)
}
