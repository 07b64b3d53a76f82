//! S5 up/down counters (`0..=999`).

use crate::bcd;
use crate::fault::RuntimeErrorKind;

/// Largest counter value.
pub const COUNTER_MAX: u16 = 999;

/// One S5 counter with per-input edge memories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Counter {
    value: u16,
    up_edge: bool,
    down_edge: bool,
    set_edge: bool,
    enable_edge: bool,
}

impl Counter {
    /// `ZV`/`CU`: increments on a rising RLO edge, saturating at 999.
    pub fn count_up(&mut self, rlo: bool) {
        if rlo && !self.up_edge {
            self.value = (self.value + 1).min(COUNTER_MAX);
        }
        self.up_edge = rlo;
    }

    /// `ZR`/`CD`: decrements on a rising RLO edge, saturating at 0.
    pub fn count_down(&mut self, rlo: bool) {
        if rlo && !self.down_edge {
            self.value = self.value.saturating_sub(1);
        }
        self.down_edge = rlo;
    }

    /// `S Z`: loads a BCD preset on a rising RLO edge.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeErrorKind::InvalidBcd`] when the preset is not BCD.
    #[allow(clippy::cast_possible_truncation)]
    pub fn set(&mut self, rlo: bool, preset: u16) -> Result<(), RuntimeErrorKind> {
        if rlo && !self.set_edge {
            self.value = bcd::decode(u32::from(preset), 3)? as u16;
        }
        self.set_edge = rlo;
        Ok(())
    }

    /// `R Z`: clears the value while RLO is set.
    pub fn reset(&mut self, rlo: bool) {
        if rlo {
            self.value = 0;
        }
    }

    /// `FR Z`: a rising RLO edge clears all edge memories.
    pub fn enable(&mut self, rlo: bool) {
        if rlo && !self.enable_edge {
            self.up_edge = false;
            self.down_edge = false;
            self.set_edge = false;
        }
        self.enable_edge = rlo;
    }

    /// Counter output: value not zero.
    #[must_use]
    pub const fn q(&self) -> bool {
        self.value != 0
    }

    /// Binary value.
    #[must_use]
    pub const fn value(&self) -> u16 {
        self.value
    }

    /// BCD value for `LC`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn value_bcd(&self) -> u16 {
        bcd::encode(self.value as u32) as u16
    }
}

/// The CPU's counter array.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CounterBank {
    counters: Vec<Counter>,
}

impl CounterBank {
    /// Allocates `count` zeroed counters.
    #[must_use]
    pub fn new(count: u16) -> Self {
        Self {
            counters: vec![Counter::default(); usize::from(count)],
        }
    }

    /// Counter `number`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeErrorKind::CounterOutOfRange`] outside the bank.
    pub fn get_mut(&mut self, number: u16) -> Result<&mut Counter, RuntimeErrorKind> {
        self.counters
            .get_mut(usize::from(number))
            .ok_or(RuntimeErrorKind::CounterOutOfRange(number))
    }

    /// Counter `number`, read-only.
    #[must_use]
    pub fn get(&self, number: u16) -> Option<&Counter> {
        self.counters.get(usize::from(number))
    }

    /// Number of counters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// True for an empty bank.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Zeroes every counter.
    pub fn clear(&mut self) {
        self.counters.fill(Counter::default());
    }
}

#[cfg(test)]
mod tests {
    use super::{Counter, CounterBank, COUNTER_MAX};
    use crate::fault::RuntimeErrorKind;

    #[test]
    fn counts_on_rising_edges_only() {
        let mut counter = Counter::default();
        counter.count_up(true);
        counter.count_up(true);
        counter.count_up(false);
        counter.count_up(true);
        assert_eq!(counter.value(), 2);
        counter.count_down(true);
        assert_eq!(counter.value(), 1);
        assert!(counter.q());
    }

    #[test]
    fn value_saturates_at_both_ends() {
        let mut counter = Counter::default();
        counter.count_down(true);
        assert_eq!(counter.value(), 0);
        counter.set(true, 0x0999).expect("valid preset");
        counter.count_up(true);
        assert_eq!(counter.value(), COUNTER_MAX);
    }

    #[test]
    fn preset_reset_and_enable() {
        let mut counter = Counter::default();
        counter.set(true, 0x0042).expect("valid preset");
        assert_eq!(counter.value(), 42);
        assert_eq!(counter.value_bcd(), 0x0042);
        counter.reset(true);
        assert!(!counter.q());
        counter.set(true, 0x0007).expect("no edge, no load");
        assert_eq!(counter.value(), 0);
        counter.enable(true);
        counter.set(true, 0x0007).expect("edge re-armed");
        assert_eq!(counter.value(), 7);
        assert_eq!(
            counter.set(false, 0x00F0).and_then(|()| counter.set(true, 0x00F0)),
            Err(RuntimeErrorKind::InvalidBcd(0x00F0))
        );
    }

    #[test]
    fn bank_bounds() {
        let mut bank = CounterBank::new(1);
        assert!(bank.get_mut(0).is_ok());
        assert_eq!(
            bank.get_mut(1).map(|_| ()),
            Err(RuntimeErrorKind::CounterOutOfRange(1))
        );
    }
}
