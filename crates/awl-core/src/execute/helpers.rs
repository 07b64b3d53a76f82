//! Operand fetch and store shared by every instruction category.

#![allow(clippy::pedantic, clippy::nursery, unknown_lints, missing_docs)]

use crate::fault::RuntimeErrorKind;
use crate::memory::pointer::{offset_address, pointer_area, POINTER_ADDRESS_MASK};
use crate::memory::{read_bit, read_value, write_bit, write_value};
use crate::operand::{
    Addressing, Area, BitAddress, Condition, Constant, DbRegisterQuery, MemoryOperand, NumberRef,
    Operand, Width,
};
use crate::state::status::{STW_FC, STW_MASK};
use crate::state::{ConditionCode, CpuState, StatusWord};

/// Fully resolved memory location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub area: Area,
    pub address: BitAddress,
    pub db: u16,
}

/// Resolves a memory operand against the current registers. A DB-qualified
/// operand opens its data block first.
pub fn resolve(state: &mut CpuState, memory: &MemoryOperand) -> Result<Location, RuntimeErrorKind> {
    if let Some(db) = memory.db {
        open_db(state, db)?;
    }
    let (area, address) = match memory.addressing {
        Addressing::Direct(address) => (memory.area.ok_or(RuntimeErrorKind::InvalidOperand)?, address),
        Addressing::MemoryIndirect { area, byte } => {
            let pointer = read_at(
                state,
                Location {
                    area,
                    address: BitAddress::new(byte, 0),
                    db: area_db(state, area),
                },
                Width::Dword,
            )?;
            let address = BitAddress::from_pointer_offset(pointer & POINTER_ADDRESS_MASK);
            if memory.width != Width::Bit && address.bit != 0 {
                return Err(RuntimeErrorKind::InvalidPointer(pointer));
            }
            (memory.area.ok_or(RuntimeErrorKind::InvalidOperand)?, address)
        }
        Addressing::RegisterIndirect { register, offset } => {
            let pointer = state.registers.ar(register);
            let address = offset_address(pointer, offset);
            let area = match memory.area {
                Some(area) => area,
                None => pointer_area(pointer)?.ok_or(RuntimeErrorKind::InvalidPointer(pointer))?,
            };
            if memory.width != Width::Bit && address.bit != 0 {
                return Err(RuntimeErrorKind::InvalidPointer(pointer));
            }
            (area, address)
        }
    };
    Ok(Location {
        area,
        address,
        db: area_db(state, area),
    })
}

/// Opens `db` as global data block after checking it exists.
pub fn open_db(state: &mut CpuState, db: u16) -> Result<(), RuntimeErrorKind> {
    check_db(state, db)?;
    state.registers.set_db(db);
    Ok(())
}

pub fn check_db(state: &CpuState, db: u16) -> Result<(), RuntimeErrorKind> {
    if db == 0 {
        return Err(RuntimeErrorKind::DataBlockNotOpen);
    }
    if state.memory.data_block(db).is_none() {
        return Err(RuntimeErrorKind::DataBlockNotFound(db));
    }
    Ok(())
}

const fn area_db(state: &CpuState, area: Area) -> u16 {
    match area {
        Area::DataBlock => state.registers.db(),
        Area::InstanceDb => state.registers.di(),
        _ => 0,
    }
}

pub fn read_at(state: &CpuState, location: Location, width: Width) -> Result<u32, RuntimeErrorKind> {
    let Location { area, address, db } = location;
    if width == Width::Bit {
        return read_bit_at(state, location).map(u32::from);
    }
    if area == Area::Local {
        return read_value(state.calls.locals(), area, address.byte, width);
    }
    read_value(state.memory.area(area, db)?, area, address.byte, width)
}

pub fn read_bit_at(state: &CpuState, location: Location) -> Result<bool, RuntimeErrorKind> {
    let Location { area, address, db } = location;
    if area == Area::Local {
        return read_bit(state.calls.locals(), area, address.byte, address.bit);
    }
    read_bit(state.memory.area(area, db)?, area, address.byte, address.bit)
}

pub fn write_at(
    state: &mut CpuState,
    location: Location,
    width: Width,
    value: u32,
) -> Result<(), RuntimeErrorKind> {
    let Location { area, address, db } = location;
    if width == Width::Bit {
        return write_bit_at(state, location, value & 1 != 0);
    }
    if area == Area::Local {
        return write_value(state.calls.locals_mut(), area, address.byte, width, value);
    }
    write_value(state.memory.area_mut(area, db)?, area, address.byte, width, value)
}

pub fn write_bit_at(state: &mut CpuState, location: Location, value: bool) -> Result<(), RuntimeErrorKind> {
    let Location { area, address, db } = location;
    if area == Area::Local {
        return write_bit(state.calls.locals_mut(), area, address.byte, address.bit, value);
    }
    write_bit(state.memory.area_mut(area, db)?, area, address.byte, address.bit, value)
}

/// Timer, counter or block number, reading indirect numbers from a word.
pub fn number(state: &CpuState, number: NumberRef) -> Result<u16, RuntimeErrorKind> {
    match number {
        NumberRef::Direct(number) => Ok(number),
        NumberRef::Indirect { area, byte } => {
            let location = Location {
                area,
                address: BitAddress::new(byte, 0),
                db: area_db(state, area),
            };
            Ok(read_at(state, location, Width::Word)? as u16)
        }
    }
}

pub fn condition(state: &CpuState, condition: Condition) -> bool {
    let status = state.status;
    let cc = status.condition_code();
    match condition {
        Condition::Zero => cc == ConditionCode::Zero,
        Condition::NonZero => matches!(cc, ConditionCode::Negative | ConditionCode::Positive),
        Condition::Positive => cc == ConditionCode::Positive,
        Condition::Negative => cc == ConditionCode::Negative,
        Condition::PositiveOrZero => matches!(cc, ConditionCode::Positive | ConditionCode::Zero),
        Condition::NegativeOrZero => matches!(cc, ConditionCode::Negative | ConditionCode::Zero),
        Condition::Unordered => cc == ConditionCode::Unordered,
        Condition::Overflow => status.ov(),
        Condition::OverflowStored => status.os(),
        Condition::BinaryResult => status.br(),
    }
}

/// Boolean source of a logic instruction.
pub fn load_bit(state: &mut CpuState, operand: &Operand) -> Result<bool, RuntimeErrorKind> {
    match operand {
        Operand::Memory(memory) if memory.width == Width::Bit => {
            let location = resolve(state, memory)?;
            read_bit_at(state, location)
        }
        Operand::Timer(timer) => {
            let now = state.now;
            let number = number(state, *timer)?;
            Ok(state.timers.get_mut(number)?.q(now))
        }
        Operand::Counter(counter) => {
            let number = number(state, *counter)?;
            Ok(state.counters.get_mut(number)?.q())
        }
        Operand::Condition(predicate) => Ok(condition(state, *predicate)),
        Operand::StatusBit(bit) => Ok(state.status.get(*bit)),
        _ => Err(RuntimeErrorKind::InvalidOperand),
    }
}

/// Writes a bit destination.
pub fn store_bit(state: &mut CpuState, operand: &Operand, value: bool) -> Result<(), RuntimeErrorKind> {
    match operand {
        Operand::Memory(memory) if memory.width == Width::Bit => {
            let location = resolve(state, memory)?;
            write_bit_at(state, location, value)
        }
        Operand::StatusBit(bit) => {
            state.status.set(*bit, value);
            Ok(())
        }
        _ => Err(RuntimeErrorKind::InvalidOperand),
    }
}

/// 32-bit value of a load source, zero-extended.
pub fn load_value(state: &mut CpuState, operand: &Operand) -> Result<u32, RuntimeErrorKind> {
    match operand {
        Operand::Memory(memory) => {
            let location = resolve(state, memory)?;
            read_at(state, location, memory.width)
        }
        Operand::Immediate(constant) => Ok(constant.bits()),
        Operand::Timer(timer) => {
            let now = state.now;
            let number = number(state, *timer)?;
            Ok(u32::from(state.timers.get_mut(number)?.value_binary(now)))
        }
        Operand::Counter(counter) => {
            let number = number(state, *counter)?;
            Ok(u32::from(state.counters.get_mut(number)?.value()))
        }
        Operand::StatusWord => Ok(u32::from(state.status.bits())),
        Operand::DbRegister(query) => Ok(db_register(state, *query)),
        Operand::Accu(index) => Ok(state.registers.accu(*index)),
        Operand::AddressRegister(register) => Ok(state.registers.ar(*register)),
        Operand::StatusBit(bit) => Ok(u32::from(state.status.get(*bit))),
        _ => Err(RuntimeErrorKind::InvalidOperand),
    }
}

fn db_register(state: &CpuState, query: DbRegisterQuery) -> u32 {
    let length = |number: u16| {
        state
            .memory
            .data_block(number)
            .map_or(0, |block| block.len())
    };
    match query {
        DbRegisterQuery::DbNumber => u32::from(state.registers.db()),
        DbRegisterQuery::DbLength => length(state.registers.db()),
        DbRegisterQuery::DiNumber => u32::from(state.registers.di()),
        DbRegisterQuery::DiLength => length(state.registers.di()),
    }
}

/// Writes a transfer destination. Memory writes store 0 while the MCR is
/// de-energized; `STW` keeps `/FC`.
pub fn store_value(state: &mut CpuState, operand: &Operand, value: u32) -> Result<(), RuntimeErrorKind> {
    match operand {
        Operand::Memory(memory) => {
            let location = resolve(state, memory)?;
            let value = if state.mcr.enabled() { value } else { 0 };
            write_at(state, location, memory.width, value)
        }
        Operand::StatusWord => {
            let keep = state.status.bits() & STW_FC;
            let bits = (value as u16) & STW_MASK & !STW_FC;
            state.status = StatusWord::from_bits(bits | keep);
            Ok(())
        }
        Operand::Accu(index) => {
            state.registers.set_accu(*index, value);
            Ok(())
        }
        Operand::AddressRegister(register) => {
            state.registers.set_ar(*register, value);
            Ok(())
        }
        _ => Err(RuntimeErrorKind::InvalidOperand),
    }
}

/// Count operand of shifts and `INC`/`DEC`: the constant, or ACCU2-LL.
pub fn count(state: &CpuState, operand: Option<&Operand>) -> u32 {
    match operand {
        Some(Operand::Immediate(constant)) => constant.bits() & 0xFF,
        _ => state.registers.accu2() & 0xFF,
    }
}

pub fn target(operand: Option<&Operand>) -> Result<usize, RuntimeErrorKind> {
    match operand {
        Some(Operand::Target { index, .. }) => Ok(*index),
        Some(Operand::Label(label)) => Err(RuntimeErrorKind::UnresolvedLabel(label.clone())),
        _ => Err(RuntimeErrorKind::InvalidOperand),
    }
}

/// Immediate operand of word logic, `+`, `NOP` and friends.
pub fn immediate(operand: Option<&Operand>) -> Option<Constant> {
    match operand {
        Some(Operand::Immediate(constant)) => Some(*constant),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{load_bit, load_value, resolve, store_value, Location};
    use crate::config::CpuSpecs;
    use crate::fault::RuntimeErrorKind;
    use crate::memory::pointer::make_pointer;
    use crate::memory::DataBlock;
    use crate::operand::{
        AddressRegister, Addressing, Area, BitAddress, MemoryOperand, Operand, StatusBit, Width,
    };
    use crate::program::BlockId;
    use crate::state::CpuState;

    fn state() -> CpuState {
        let mut state = CpuState::new(&CpuSpecs::default());
        state.memory.insert_data_block(DataBlock::new(3, 16, &[0xAA, 0xBB]));
        state
    }

    #[test]
    fn qualified_access_opens_the_block() {
        let mut state = state();
        let operand = MemoryOperand {
            db: Some(3),
            ..MemoryOperand::direct(Area::DataBlock, Width::Word, 0, 0)
        };
        let value = load_value(&mut state, &Operand::Memory(operand)).expect("load");
        assert_eq!(value, 0xAABB);
        assert_eq!(state.registers.db(), 3);

        let missing = MemoryOperand { db: Some(9), ..operand };
        assert_eq!(
            load_value(&mut state, &Operand::Memory(missing)),
            Err(RuntimeErrorKind::DataBlockNotFound(9))
        );
    }

    #[test]
    fn register_indirect_crosses_areas() {
        let mut state = state();
        state.memory.outputs_mut()[2] = 0b0000_1000;
        state.registers.set_ar(
            AddressRegister::Ar1,
            make_pointer(Some(Area::Output), BitAddress::new(2, 0)),
        );
        let operand = MemoryOperand {
            area: None,
            width: Width::Bit,
            addressing: Addressing::RegisterIndirect {
                register: AddressRegister::Ar1,
                offset: BitAddress::new(0, 3),
            },
            db: None,
        };
        assert_eq!(
            resolve(&mut state, &operand),
            Ok(Location {
                area: Area::Output,
                address: BitAddress::new(2, 3),
                db: 0
            })
        );
        assert_eq!(load_bit(&mut state, &Operand::Memory(operand)), Ok(true));
    }

    #[test]
    fn memory_indirect_reads_pointer_from_flags() {
        let mut state = state();
        state.memory.flags_mut()[4..8].copy_from_slice(&8u32.to_be_bytes());
        state.memory.inputs_mut()[1] = 0x5A;
        let operand = MemoryOperand {
            area: Some(Area::Input),
            width: Width::Byte,
            addressing: Addressing::MemoryIndirect {
                area: Area::Flag,
                byte: 4,
            },
            db: None,
        };
        assert_eq!(load_value(&mut state, &Operand::Memory(operand)), Ok(0x5A));
    }

    #[test]
    fn local_area_follows_the_current_frame() {
        let mut state = state();
        state
            .calls
            .push(BlockId::MAIN, 4, None, 0, 0)
            .expect("frame");
        let word = Operand::Memory(MemoryOperand::direct(Area::Local, Width::Word, 2, 0));
        store_value(&mut state, &word, 0x1234).expect("store");
        assert_eq!(state.calls.locals(), &[0, 0, 0x12, 0x34]);
        assert_eq!(load_value(&mut state, &word), Ok(0x1234));
    }

    #[test]
    fn status_word_transfer_keeps_first_check() {
        let mut state = state();
        state.status.set(StatusBit::Fc, true);
        store_value(&mut state, &Operand::StatusWord, 0x01FE).expect("store");
        assert_eq!(state.status.bits(), 0x01FF);
        store_value(&mut state, &Operand::StatusWord, 0).expect("store");
        assert_eq!(state.status.bits(), 0x0001);
    }

    #[test]
    fn mcr_zeroes_transfers() {
        let mut state = state();
        state.mcr.activate();
        state.mcr.open(false).expect("open");
        let byte = Operand::Memory(MemoryOperand::direct(Area::Flag, Width::Byte, 0, 0));
        state.memory.flags_mut()[0] = 0xFF;
        store_value(&mut state, &byte, 0x12).expect("store");
        assert_eq!(state.memory.flags()[0], 0);
    }
}
