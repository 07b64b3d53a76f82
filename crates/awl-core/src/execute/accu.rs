//! Load/transfer, address registers, accumulator shuffles and word logic.

#![allow(
    clippy::pedantic,
    clippy::nursery,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    unknown_lints,
    missing_docs
)]

use super::helpers::{immediate, load_value, number, store_value};
use crate::fault::RuntimeErrorKind;
use crate::operand::{AddressRegister, Constant, Operand};
use crate::state::{ConditionCode, CpuState};

/// `L`.
pub fn load(state: &mut CpuState, operand: &Operand) -> Result<(), RuntimeErrorKind> {
    let value = load_value(state, operand)?;
    state.registers.load(value);
    Ok(())
}

/// `LC`: timer value as S5TIME, counter value as BCD.
pub fn load_bcd(state: &mut CpuState, operand: &Operand) -> Result<(), RuntimeErrorKind> {
    let value = match operand {
        Operand::Timer(timer) => {
            let now = state.now;
            let timer = number(state, *timer)?;
            state.timers.get_mut(timer)?.value_bcd(now)
        }
        Operand::Counter(counter) => {
            let counter = number(state, *counter)?;
            state.counters.get_mut(counter)?.value_bcd()
        }
        _ => return Err(RuntimeErrorKind::InvalidOperand),
    };
    state.registers.load(u32::from(value));
    Ok(())
}

/// `T`.
pub fn transfer(state: &mut CpuState, operand: &Operand) -> Result<(), RuntimeErrorKind> {
    let value = state.registers.accu1();
    store_value(state, operand, value)
}

/// `LAR1`/`LAR2`: from ACCU1 when no operand is given.
pub fn load_ar(
    state: &mut CpuState,
    register: AddressRegister,
    operand: Option<&Operand>,
) -> Result<(), RuntimeErrorKind> {
    let value = match operand {
        Some(operand) => load_value(state, operand)?,
        None => state.registers.accu1(),
    };
    state.registers.set_ar(register, value);
    Ok(())
}

/// `TAR1`/`TAR2`: into ACCU1 when no operand is given.
pub fn transfer_ar(
    state: &mut CpuState,
    register: AddressRegister,
    operand: Option<&Operand>,
) -> Result<(), RuntimeErrorKind> {
    let value = state.registers.ar(register);
    match operand {
        Some(operand) => store_value(state, operand, value),
        None => {
            state.registers.load(value);
            Ok(())
        }
    }
}

/// `+AR1`/`+AR2`: ACCU1-L as signed offset, or a pointer constant.
pub fn add_ar(state: &mut CpuState, register: AddressRegister, operand: Option<&Operand>) {
    let offset = match immediate(operand) {
        Some(constant) => (constant.bits() & 0x00FF_FFFF) as i32,
        None => i32::from(state.registers.accu1() as u16 as i16),
    };
    state.registers.add_ar(register, offset);
}

/// `INC`/`DEC` on ACCU1-LL.
pub fn step_low_byte(state: &mut CpuState, operand: Option<&Operand>, up: bool) {
    let amount = immediate(operand).map_or(0, |constant| constant.bits() as u8);
    let accu = state.registers.accu1();
    let low = accu as u8;
    let low = if up {
        low.wrapping_add(amount)
    } else {
        low.wrapping_sub(amount)
    };
    state.registers.set_accu1((accu & 0xFFFF_FF00) | u32::from(low));
}

/// `+` with an integer or double integer constant. Status is unchanged.
pub fn add_constant(state: &mut CpuState, operand: Option<&Operand>) -> Result<(), RuntimeErrorKind> {
    let accu = state.registers.accu1();
    match immediate(operand) {
        Some(Constant::Int(value)) => {
            state.registers.set_accu1_low((accu as u16).wrapping_add(value as u16));
        }
        Some(Constant::Dint(value)) => {
            state.registers.set_accu1(accu.wrapping_add(value as u32));
        }
        _ => return Err(RuntimeErrorKind::InvalidOperand),
    }
    Ok(())
}

/// `TAW`.
pub fn swap_word_bytes(state: &mut CpuState) {
    let low = state.registers.accu1() as u16;
    state.registers.set_accu1_low(low.swap_bytes());
}

/// `TAD`.
pub fn swap_dword_bytes(state: &mut CpuState) {
    let accu = state.registers.accu1();
    state.registers.set_accu1(accu.swap_bytes());
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordOp {
    And,
    Or,
    Xor,
}

/// `UW`, `OW`, `XOW`, `UD`, `OD`, `XOD`.
///
/// Without an operand ACCU2 is combined with ACCU1 and the accumulator
/// stack shifts; the word forms keep ACCU1-H.
pub fn word_logic(state: &mut CpuState, op: WordOp, dword: bool, operand: Option<&Operand>) {
    let accu1 = state.registers.accu1();
    let (other, consume) = match immediate(operand) {
        Some(constant) => (constant.bits(), false),
        None => (state.registers.accu2(), true),
    };
    let combined = match op {
        WordOp::And => accu1 & other,
        WordOp::Or => accu1 | other,
        WordOp::Xor => accu1 ^ other,
    };
    let (result, significant) = if dword {
        (combined, combined)
    } else {
        ((accu1 & 0xFFFF_0000) | (combined & 0xFFFF), combined & 0xFFFF)
    };
    state.registers.set_accu1(result);
    if consume {
        state.registers.consume_accu2();
    }
    let cc = if significant == 0 {
        ConditionCode::Zero
    } else {
        ConditionCode::Positive
    };
    state.status = state.status.with_cc(cc);
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{
        add_ar, add_constant, load, load_ar, step_low_byte, swap_dword_bytes, transfer_ar,
        word_logic, WordOp,
    };
    use crate::config::CpuSpecs;
    use crate::memory::DataBlock;
    use crate::operand::{
        AddressRegister, Area, Constant, DbRegisterQuery, MemoryOperand, Operand, Width,
    };
    use crate::state::{ConditionCode, CpuState};

    fn state() -> CpuState {
        CpuState::new(&CpuSpecs::default())
    }

    #[test]
    fn loads_shift_accu1_into_accu2() {
        let mut state = state();
        load(&mut state, &Operand::Immediate(Constant::Int(3))).expect("L");
        load(&mut state, &Operand::Immediate(Constant::Int(-1))).expect("L");
        assert_eq!(state.registers.accu1(), 0xFFFF);
        assert_eq!(state.registers.accu2(), 3);
    }

    #[test]
    fn db_register_queries_report_number_and_length() {
        let mut state = state();
        state.memory.insert_data_block(DataBlock::new(4, 20, &[]));
        state.registers.set_db(4);
        load(&mut state, &Operand::DbRegister(DbRegisterQuery::DbLength)).expect("L DBLG");
        load(&mut state, &Operand::DbRegister(DbRegisterQuery::DbNumber)).expect("L DBNO");
        assert_eq!(state.registers.accus(), &[4, 20]);
    }

    #[test]
    fn address_registers_load_transfer_and_offset() {
        let mut state = state();
        let pointer = Operand::Immediate(Constant::Pointer(0x8300_0010));
        load_ar(&mut state, AddressRegister::Ar1, Some(&pointer)).expect("LAR1");
        add_ar(&mut state, AddressRegister::Ar1, Some(&Operand::Immediate(Constant::Pointer(0x0000_0009))));
        assert_eq!(state.registers.ar(AddressRegister::Ar1), 0x8300_0019);

        state.registers.set_accu1(0xFFFF);
        add_ar(&mut state, AddressRegister::Ar1, None);
        assert_eq!(state.registers.ar(AddressRegister::Ar1), 0x8300_0018);

        let md = Operand::Memory(MemoryOperand::direct(Area::Flag, Width::Dword, 0, 0));
        transfer_ar(&mut state, AddressRegister::Ar1, Some(&md)).expect("TAR1 MD0");
        assert_eq!(&state.memory.flags()[..4], &[0x83, 0, 0, 0x18]);
    }

    #[test]
    fn increment_wraps_inside_the_low_byte() {
        let mut state = state();
        state.registers.set_accu1(0x1234_56FF);
        step_low_byte(&mut state, Some(&Operand::Immediate(Constant::Int(2))), true);
        assert_eq!(state.registers.accu1(), 0x1234_5601);
        step_low_byte(&mut state, Some(&Operand::Immediate(Constant::Int(3))), false);
        assert_eq!(state.registers.accu1(), 0x1234_56FE);
    }

    #[test]
    fn add_constant_keeps_status_and_high_word() {
        let mut state = state();
        state.registers.set_accu1(0x0001_FFFF);
        let before = state.status;
        add_constant(&mut state, Some(&Operand::Immediate(Constant::Int(1)))).expect("+");
        assert_eq!(state.registers.accu1(), 0x0001_0000);
        add_constant(&mut state, Some(&Operand::Immediate(Constant::Dint(-1)))).expect("+");
        assert_eq!(state.registers.accu1(), 0x0000_FFFF);
        assert_eq!(state.status, before);
        swap_dword_bytes(&mut state);
        assert_eq!(state.registers.accu1(), 0xFFFF_0000);
    }

    #[rstest]
    #[case(WordOp::And, false, 0xFFFF_00F0)]
    #[case(WordOp::Or, false, 0xFFFF_FFFF)]
    #[case(WordOp::Xor, true, 0x0F0F_FF0F)]
    fn word_logic_combines_accumulators(#[case] op: WordOp, #[case] dword: bool, #[case] expected: u32) {
        let mut state = state();
        if dword {
            state.registers.set_accu1(0xFFFF_0FFF);
            state.registers.set_accu2(0xF0F0_F0F0);
        } else {
            state.registers.set_accu1(0xFFFF_0FF0);
            state.registers.set_accu2(0x0000_F0FF);
        }
        word_logic(&mut state, op, dword, None);
        assert_eq!(state.registers.accu1(), expected);
        assert_eq!(state.status.condition_code(), ConditionCode::Positive);
    }

    #[test]
    fn word_logic_with_constant_sets_zero_code() {
        let mut state = state();
        state.registers.set_accu1(0x1234_00FF);
        word_logic(&mut state, WordOp::And, false, Some(&Operand::Immediate(Constant::Word(0xFF00))));
        assert_eq!(state.registers.accu1(), 0x1234_0000);
        assert_eq!(state.status.condition_code(), ConditionCode::Zero);
    }
}
