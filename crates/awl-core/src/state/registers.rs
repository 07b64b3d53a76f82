use crate::operand::AddressRegister;

/// Largest supported accumulator count.
pub const MAX_ACCUS: usize = 4;

/// Accumulators, address registers and data block selectors.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterFile {
    accus: [u32; MAX_ACCUS],
    accu_count: u8,
    ar1: u32,
    ar2: u32,
    db: u16,
    di: u16,
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new(2)
    }
}

impl RegisterFile {
    /// Creates a zeroed register file with 2 or 4 accumulators.
    #[must_use]
    pub fn new(accu_count: u8) -> Self {
        Self {
            accus: [0; MAX_ACCUS],
            accu_count: if accu_count >= 4 { 4 } else { 2 },
            ar1: 0,
            ar2: 0,
            db: 0,
            di: 0,
        }
    }

    /// Number of accumulators.
    #[must_use]
    pub const fn accu_count(&self) -> u8 {
        self.accu_count
    }

    /// Reads ACCU`n` (1-based); out-of-range reads yield zero.
    #[must_use]
    pub fn accu(&self, n: u8) -> u32 {
        if n == 0 || n > self.accu_count {
            return 0;
        }
        self.accus[usize::from(n - 1)]
    }

    /// Writes ACCU`n` (1-based); out-of-range writes are ignored.
    pub fn set_accu(&mut self, n: u8, value: u32) {
        if n == 0 || n > self.accu_count {
            return;
        }
        self.accus[usize::from(n - 1)] = value;
    }

    /// ACCU1.
    #[must_use]
    pub const fn accu1(&self) -> u32 {
        self.accus[0]
    }

    /// ACCU2.
    #[must_use]
    pub const fn accu2(&self) -> u32 {
        self.accus[1]
    }

    /// Overwrites ACCU1.
    pub const fn set_accu1(&mut self, value: u32) {
        self.accus[0] = value;
    }

    /// Overwrites ACCU2.
    pub const fn set_accu2(&mut self, value: u32) {
        self.accus[1] = value;
    }

    /// Replaces the low word of ACCU1, keeping the high word.
    pub const fn set_accu1_low(&mut self, value: u16) {
        self.accus[0] = (self.accus[0] & 0xFFFF_0000) | value as u32;
    }

    /// `L`: ACCU2 := ACCU1, ACCU1 := value. ACCU3/4 are untouched.
    pub const fn load(&mut self, value: u32) {
        self.accus[1] = self.accus[0];
        self.accus[0] = value;
    }

    /// Stack shift after a two-operand operation on four-accumulator CPUs.
    pub const fn consume_accu2(&mut self) {
        if self.accu_count == 4 {
            self.accus[1] = self.accus[2];
            self.accus[2] = self.accus[3];
        }
    }

    /// `TAK`.
    pub const fn swap(&mut self) {
        let accu1 = self.accus[0];
        self.accus[0] = self.accus[1];
        self.accus[1] = accu1;
    }

    /// `PUSH`.
    pub const fn push(&mut self) {
        if self.accu_count == 4 {
            self.accus[3] = self.accus[2];
            self.accus[2] = self.accus[1];
        }
        self.accus[1] = self.accus[0];
    }

    /// `POP`.
    pub const fn pop(&mut self) {
        self.accus[0] = self.accus[1];
        if self.accu_count == 4 {
            self.accus[1] = self.accus[2];
            self.accus[2] = self.accus[3];
        }
    }

    /// `ENT`: no effect on two-accumulator CPUs.
    pub const fn enter(&mut self) {
        if self.accu_count == 4 {
            self.accus[3] = self.accus[2];
            self.accus[2] = self.accus[1];
        }
    }

    /// `LEAVE`: no effect on two-accumulator CPUs.
    pub const fn leave(&mut self) {
        if self.accu_count == 4 {
            self.accus[1] = self.accus[2];
            self.accus[2] = self.accus[3];
        }
    }

    /// Active accumulators, ACCU1 first.
    #[must_use]
    pub fn accus(&self) -> &[u32] {
        &self.accus[..usize::from(self.accu_count)]
    }

    /// Reads an address register.
    #[must_use]
    pub const fn ar(&self, register: AddressRegister) -> u32 {
        match register {
            AddressRegister::Ar1 => self.ar1,
            AddressRegister::Ar2 => self.ar2,
        }
    }

    /// Writes an address register.
    pub const fn set_ar(&mut self, register: AddressRegister, value: u32) {
        match register {
            AddressRegister::Ar1 => self.ar1 = value,
            AddressRegister::Ar2 => self.ar2 = value,
        }
    }

    /// `TAR`/`CAR`.
    pub const fn swap_ar(&mut self) {
        let ar1 = self.ar1;
        self.ar1 = self.ar2;
        self.ar2 = ar1;
    }

    /// Adds a signed pointer offset to the address part, keeping the area byte.
    #[allow(clippy::cast_sign_loss)]
    pub const fn add_ar(&mut self, register: AddressRegister, offset: i32) {
        let current = self.ar(register);
        let address = current.wrapping_add(offset as u32) & 0x00FF_FFFF;
        self.set_ar(register, (current & 0xFF00_0000) | address);
    }

    /// Opened global data block (0 = none).
    #[must_use]
    pub const fn db(&self) -> u16 {
        self.db
    }

    /// Opened instance data block (0 = none).
    #[must_use]
    pub const fn di(&self) -> u16 {
        self.di
    }

    /// Opens a global data block.
    pub const fn set_db(&mut self, number: u16) {
        self.db = number;
    }

    /// Opens an instance data block.
    pub const fn set_di(&mut self, number: u16) {
        self.di = number;
    }

    /// `TDB`/`CDB`.
    pub const fn swap_db(&mut self) {
        let db = self.db;
        self.db = self.di;
        self.di = db;
    }

    /// Zeroes every register, keeping the accumulator count.
    pub fn clear(&mut self) {
        *self = Self::new(self.accu_count);
    }
}
