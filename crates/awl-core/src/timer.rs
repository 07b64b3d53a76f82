//! S5 timers evaluated lazily against the CPU clock.
//!
//! A timer never runs on its own; every instruction that touches it first
//! brings it up to date with [`Timer::update`].

use std::time::Duration;

use crate::bcd;
use crate::fault::RuntimeErrorKind;

/// Largest S5TIME value: 999 units of 10 s.
pub const S5TIME_MAX: Duration = Duration::from_secs(9990);

/// S5TIME time bases (bits 12..=13) in milliseconds.
const TIME_BASES_MS: [u64; 4] = [10, 100, 1000, 10_000];

/// Decodes an S5TIME word into a duration.
///
/// # Errors
///
/// Returns [`RuntimeErrorKind::InvalidBcd`] when the value nibbles are not BCD.
pub fn decode_s5time(raw: u16) -> Result<Duration, RuntimeErrorKind> {
    let units = bcd::decode(u32::from(raw), 3)?;
    let base = TIME_BASES_MS[usize::from((raw >> 12) & 0x3)];
    Ok(Duration::from_millis(u64::from(units) * base))
}

/// Encodes a duration as S5TIME with the finest base that fits.
///
/// Returns `None` above [`S5TIME_MAX`]. Precision below the chosen base is
/// truncated.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn encode_s5time(duration: Duration) -> Option<u16> {
    let millis = duration.as_millis();
    TIME_BASES_MS
        .iter()
        .enumerate()
        .find_map(|(base_bits, base)| {
            let units = millis / u128::from(*base);
            (units <= 999).then(|| ((base_bits as u16) << 12) | bcd::encode(units as u32) as u16)
        })
}

/// Start behaviour selected by the starting instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum TimerMode {
    /// `SI`/`SP`: output high while running and the start RLO holds.
    Pulse,
    /// `SV`/`SE`: output high for the full preset once started.
    ExtendedPulse,
    /// `SE`/`SD`: output high after the preset while the start RLO holds.
    OnDelay,
    /// `SS`: output latches after the preset until reset.
    RetentiveOnDelay,
    /// `SA`/`SF`: output drops the preset after the start RLO falls.
    OffDelay,
}

/// One S5 timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Timer {
    mode: Option<TimerMode>,
    running: bool,
    started_at: Duration,
    preset: Duration,
    base_bits: u16,
    q: bool,
    start_edge: bool,
    enable_edge: bool,
}

impl Timer {
    /// Applies expiry if the preset elapsed by `now`.
    pub fn update(&mut self, now: Duration) {
        if !self.running || now.saturating_sub(self.started_at) < self.preset {
            return;
        }
        self.running = false;
        self.q = matches!(
            self.mode,
            Some(TimerMode::OnDelay | TimerMode::RetentiveOnDelay)
        );
    }

    /// Executes a start instruction with the current RLO and ACCU1 preset.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeErrorKind::InvalidBcd`] for an invalid S5TIME preset
    /// on a start edge.
    pub fn start(
        &mut self,
        mode: TimerMode,
        rlo: bool,
        preset: u16,
        now: Duration,
    ) -> Result<(), RuntimeErrorKind> {
        self.update(now);
        let rising = rlo && !self.start_edge;
        let falling = !rlo && self.start_edge;
        self.start_edge = rlo;
        match mode {
            TimerMode::Pulse | TimerMode::OnDelay => {
                if rising {
                    self.arm(mode, preset, now)?;
                    self.q = mode == TimerMode::Pulse;
                } else if !rlo {
                    self.running = false;
                    self.q = false;
                }
            }
            TimerMode::ExtendedPulse => {
                if rising {
                    self.arm(mode, preset, now)?;
                    self.q = true;
                }
            }
            TimerMode::RetentiveOnDelay => {
                if rising {
                    self.arm(mode, preset, now)?;
                }
            }
            TimerMode::OffDelay => {
                if rising {
                    self.mode = Some(mode);
                    self.running = false;
                    self.q = true;
                } else if falling {
                    self.arm(mode, preset, now)?;
                    self.q = true;
                }
            }
        }
        self.update(now);
        Ok(())
    }

    fn arm(&mut self, mode: TimerMode, preset: u16, now: Duration) -> Result<(), RuntimeErrorKind> {
        self.preset = decode_s5time(preset)?;
        self.base_bits = (preset >> 12) & 0x3;
        self.mode = Some(mode);
        self.started_at = now;
        self.running = true;
        Ok(())
    }

    /// `FR`: a rising RLO edge re-arms the start edge detection.
    pub fn enable(&mut self, rlo: bool) {
        if rlo && !self.enable_edge {
            self.start_edge = false;
        }
        self.enable_edge = rlo;
    }

    /// `R`: stops the timer and clears output and remaining time.
    pub fn reset(&mut self, rlo: bool) {
        if rlo {
            self.running = false;
            self.q = false;
            self.preset = Duration::ZERO;
        }
    }

    /// Timer output at `now`.
    pub fn q(&mut self, now: Duration) -> bool {
        self.update(now);
        self.q
    }

    /// Remaining time at `now`.
    pub fn remaining(&mut self, now: Duration) -> Duration {
        self.update(now);
        if self.running {
            self.preset
                .saturating_sub(now.saturating_sub(self.started_at))
        } else {
            Duration::ZERO
        }
    }

    /// `L T`: remaining time in units of the preset's time base.
    #[allow(clippy::cast_possible_truncation)]
    pub fn value_binary(&mut self, now: Duration) -> u16 {
        let base = u128::from(TIME_BASES_MS[usize::from(self.base_bits)]);
        (self.remaining(now).as_millis().div_ceil(base)).min(999) as u16
    }

    /// `LC T`: remaining time as S5TIME (base bits plus BCD units).
    #[allow(clippy::cast_possible_truncation)]
    pub fn value_bcd(&mut self, now: Duration) -> u16 {
        let units = self.value_binary(now);
        (self.base_bits << 12) | bcd::encode(u32::from(units)) as u16
    }

    /// Whether the timer is currently timing.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }
}

/// The CPU's timer array.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct TimerBank {
    timers: Vec<Timer>,
}

impl TimerBank {
    /// Allocates `count` idle timers.
    #[must_use]
    pub fn new(count: u16) -> Self {
        Self {
            timers: vec![Timer::default(); usize::from(count)],
        }
    }

    /// Timer `number`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeErrorKind::TimerOutOfRange`] outside the bank.
    pub fn get_mut(&mut self, number: u16) -> Result<&mut Timer, RuntimeErrorKind> {
        self.timers
            .get_mut(usize::from(number))
            .ok_or(RuntimeErrorKind::TimerOutOfRange(number))
    }

    /// Number of timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// True for an empty bank.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Returns every timer to idle.
    pub fn clear(&mut self) {
        self.timers.fill(Timer::default());
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rstest::rstest;

    use super::{decode_s5time, encode_s5time, Timer, TimerBank, TimerMode};
    use crate::fault::RuntimeErrorKind;

    const fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[rstest]
    #[case(0x0050, 500)]
    #[case(0x1050, 5_000)]
    #[case(0x2999, 999_000)]
    #[case(0x3001, 10_000)]
    fn s5time_bases(#[case] raw: u16, #[case] millis: u64) {
        assert_eq!(decode_s5time(raw), Ok(ms(millis)));
    }

    #[test]
    fn s5time_encoding_picks_finest_base() {
        assert_eq!(encode_s5time(ms(500)), Some(0x0050));
        assert_eq!(encode_s5time(ms(20_000)), Some(0x1200));
        assert_eq!(encode_s5time(Duration::from_secs(10_000)), None);
        assert_eq!(
            decode_s5time(0x00A0),
            Err(RuntimeErrorKind::InvalidBcd(0x00A0))
        );
    }

    #[test]
    fn on_delay_sets_output_after_preset() {
        let mut timer = Timer::default();
        timer
            .start(TimerMode::OnDelay, true, 0x0010, ms(0))
            .expect("valid preset");
        assert!(!timer.q(ms(50)));
        assert_eq!(timer.value_binary(ms(50)), 5);
        assert!(timer.q(ms(100)));
        timer
            .start(TimerMode::OnDelay, false, 0x0010, ms(120))
            .expect("valid preset");
        assert!(!timer.q(ms(130)));
    }

    #[test]
    fn pulse_drops_when_rlo_falls() {
        let mut timer = Timer::default();
        timer
            .start(TimerMode::Pulse, true, 0x0010, ms(0))
            .expect("valid preset");
        assert!(timer.q(ms(10)));
        timer
            .start(TimerMode::Pulse, false, 0x0010, ms(20))
            .expect("valid preset");
        assert!(!timer.q(ms(20)));
    }

    #[test]
    fn extended_pulse_ignores_falling_rlo() {
        let mut timer = Timer::default();
        timer
            .start(TimerMode::ExtendedPulse, true, 0x0010, ms(0))
            .expect("valid preset");
        timer
            .start(TimerMode::ExtendedPulse, false, 0x0010, ms(10))
            .expect("valid preset");
        assert!(timer.q(ms(90)));
        assert!(!timer.q(ms(100)));
    }

    #[test]
    fn off_delay_holds_after_rlo_falls() {
        let mut timer = Timer::default();
        timer
            .start(TimerMode::OffDelay, true, 0x0010, ms(0))
            .expect("valid preset");
        assert!(timer.q(ms(500)));
        timer
            .start(TimerMode::OffDelay, false, 0x0010, ms(500))
            .expect("valid preset");
        assert!(timer.q(ms(550)));
        assert!(!timer.q(ms(600)));
    }

    #[test]
    fn retentive_on_delay_latches_until_reset() {
        let mut timer = Timer::default();
        timer
            .start(TimerMode::RetentiveOnDelay, true, 0x0010, ms(0))
            .expect("valid preset");
        timer
            .start(TimerMode::RetentiveOnDelay, false, 0x0010, ms(10))
            .expect("valid preset");
        assert!(timer.q(ms(100)));
        timer.reset(true);
        assert!(!timer.q(ms(101)));
    }

    #[test]
    fn enable_retriggers_without_rlo_edge() {
        let mut timer = Timer::default();
        timer
            .start(TimerMode::ExtendedPulse, true, 0x0010, ms(0))
            .expect("valid preset");
        assert!(!timer.q(ms(100)));
        timer
            .start(TimerMode::ExtendedPulse, true, 0x0010, ms(100))
            .expect("valid preset");
        assert!(!timer.q(ms(100)));
        timer.enable(true);
        timer
            .start(TimerMode::ExtendedPulse, true, 0x0010, ms(100))
            .expect("valid preset");
        assert!(timer.q(ms(150)));
    }

    #[test]
    fn bank_rejects_unknown_numbers() {
        let mut bank = TimerBank::new(2);
        assert!(bank.get_mut(1).is_ok());
        assert_eq!(
            bank.get_mut(2).map(|_| ()),
            Err(RuntimeErrorKind::TimerOutOfRange(2))
        );
    }
}
