//! Allocation-affecting [`CpuSpecs`] and behaviour-affecting [`CpuConfig`].
//!
//! Both are built mutably through a builder whose setters range-check their
//! input, then frozen into an immutable value handed to the CPU.

use std::time::Duration;

use thiserror::Error;

use crate::catalog::MnemonicDialect;
use crate::state::call::DEFAULT_CALL_DEPTH;
use crate::state::paren::DEFAULT_PAREN_DEPTH;

/// Rejected configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A setter received a value outside its accepted range.
    #[error("{field} = {value} is outside {min}..={max}")]
    OutOfRange {
        /// Field name.
        field: &'static str,
        /// Rejected value.
        value: u64,
        /// Smallest accepted value.
        min: u64,
        /// Largest accepted value.
        max: u64,
    },
    /// Accumulator count other than 2 or 4.
    #[error("accumulator count must be 2 or 4, got {0}")]
    AccuCount(u8),
    /// Clock memory byte lies outside flag memory.
    #[error("clock memory byte MB {byte} is outside {flag_bytes} bytes of flag memory")]
    ClockMemoryOutOfRange {
        /// Requested flag byte.
        byte: u16,
        /// Configured flag memory size.
        flag_bytes: u32,
    },
}

fn check_range(field: &'static str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

/// Largest byte-addressable area size in the S7 pointer format.
pub const MAX_AREA_BYTES: u32 = 0x1_0000;

/// CPU resource sizes. Changing them reallocates every region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CpuSpecs {
    accu_count: u8,
    timer_count: u16,
    counter_count: u16,
    flag_bytes: u32,
    input_bytes: u32,
    output_bytes: u32,
    local_data_bytes: u32,
    paren_stack_depth: u16,
    call_stack_depth: u16,
}

impl Default for CpuSpecs {
    fn default() -> Self {
        Self {
            accu_count: 2,
            timer_count: 2048,
            counter_count: 2048,
            flag_bytes: 8192,
            input_bytes: 8192,
            output_bytes: 8192,
            local_data_bytes: 1024,
            paren_stack_depth: DEFAULT_PAREN_DEPTH,
            call_stack_depth: DEFAULT_CALL_DEPTH,
        }
    }
}

impl CpuSpecs {
    /// Starts a builder from the defaults.
    #[must_use]
    pub fn builder() -> CpuSpecsBuilder {
        CpuSpecsBuilder {
            specs: Self::default(),
        }
    }

    /// Reopens these specs for modification.
    #[must_use]
    pub const fn to_builder(self) -> CpuSpecsBuilder {
        CpuSpecsBuilder { specs: self }
    }

    /// Accumulator count (2 or 4).
    #[must_use]
    pub const fn accu_count(&self) -> u8 {
        self.accu_count
    }

    /// Number of timers.
    #[must_use]
    pub const fn timer_count(&self) -> u16 {
        self.timer_count
    }

    /// Number of counters.
    #[must_use]
    pub const fn counter_count(&self) -> u16 {
        self.counter_count
    }

    /// Flag memory size in bytes.
    #[must_use]
    pub const fn flag_bytes(&self) -> u32 {
        self.flag_bytes
    }

    /// Input image size in bytes.
    #[must_use]
    pub const fn input_bytes(&self) -> u32 {
        self.input_bytes
    }

    /// Output image size in bytes.
    #[must_use]
    pub const fn output_bytes(&self) -> u32 {
        self.output_bytes
    }

    /// Local data stack size in bytes.
    #[must_use]
    pub const fn local_data_bytes(&self) -> u32 {
        self.local_data_bytes
    }

    /// Parenthesis nesting depth.
    #[must_use]
    pub const fn paren_stack_depth(&self) -> u16 {
        self.paren_stack_depth
    }

    /// Block call nesting depth.
    #[must_use]
    pub const fn call_stack_depth(&self) -> u16 {
        self.call_stack_depth
    }
}

/// Mutable staging area for [`CpuSpecs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuSpecsBuilder {
    specs: CpuSpecs,
}

impl CpuSpecsBuilder {
    /// Sets the accumulator count.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::AccuCount`] unless `count` is 2 or 4.
    pub const fn accu_count(mut self, count: u8) -> Result<Self, ConfigError> {
        if count != 2 && count != 4 {
            return Err(ConfigError::AccuCount(count));
        }
        self.specs.accu_count = count;
        Ok(self)
    }

    /// Sets the timer count (`0..=2048`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] above 2048.
    pub fn timer_count(mut self, count: u16) -> Result<Self, ConfigError> {
        check_range("timer_count", u64::from(count), 0, 2048)?;
        self.specs.timer_count = count;
        Ok(self)
    }

    /// Sets the counter count (`0..=2048`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] above 2048.
    pub fn counter_count(mut self, count: u16) -> Result<Self, ConfigError> {
        check_range("counter_count", u64::from(count), 0, 2048)?;
        self.specs.counter_count = count;
        Ok(self)
    }

    /// Sets the flag memory size.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] above [`MAX_AREA_BYTES`].
    pub fn flag_bytes(mut self, bytes: u32) -> Result<Self, ConfigError> {
        check_range("flag_bytes", u64::from(bytes), 0, u64::from(MAX_AREA_BYTES))?;
        self.specs.flag_bytes = bytes;
        Ok(self)
    }

    /// Sets the input image size.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] above [`MAX_AREA_BYTES`].
    pub fn input_bytes(mut self, bytes: u32) -> Result<Self, ConfigError> {
        check_range("input_bytes", u64::from(bytes), 0, u64::from(MAX_AREA_BYTES))?;
        self.specs.input_bytes = bytes;
        Ok(self)
    }

    /// Sets the output image size.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] above [`MAX_AREA_BYTES`].
    pub fn output_bytes(mut self, bytes: u32) -> Result<Self, ConfigError> {
        check_range("output_bytes", u64::from(bytes), 0, u64::from(MAX_AREA_BYTES))?;
        self.specs.output_bytes = bytes;
        Ok(self)
    }

    /// Sets the local data stack size.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] above [`MAX_AREA_BYTES`].
    pub fn local_data_bytes(mut self, bytes: u32) -> Result<Self, ConfigError> {
        check_range(
            "local_data_bytes",
            u64::from(bytes),
            0,
            u64::from(MAX_AREA_BYTES),
        )?;
        self.specs.local_data_bytes = bytes;
        Ok(self)
    }

    /// Sets the parenthesis nesting depth (`1..=256`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] outside `1..=256`.
    pub fn paren_stack_depth(mut self, depth: u16) -> Result<Self, ConfigError> {
        check_range("paren_stack_depth", u64::from(depth), 1, 256)?;
        self.specs.paren_stack_depth = depth;
        Ok(self)
    }

    /// Sets the call nesting depth (`1..=1024`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] outside `1..=1024`.
    pub fn call_stack_depth(mut self, depth: u16) -> Result<Self, ConfigError> {
        check_range("call_stack_depth", u64::from(depth), 1, 1024)?;
        self.specs.call_stack_depth = depth;
        Ok(self)
    }

    /// Freezes the specs.
    #[must_use]
    pub const fn build(self) -> CpuSpecs {
        self.specs
    }
}

/// Mnemonic dialect selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum MnemonicSetting {
    /// Detect from the loaded program.
    #[default]
    Auto,
    /// Force German mnemonics.
    German,
    /// Force English mnemonics.
    English,
}

impl MnemonicSetting {
    /// The forced dialect, if any.
    #[must_use]
    pub const fn forced(self) -> Option<MnemonicDialect> {
        match self {
            Self::Auto => None,
            Self::German => Some(MnemonicDialect::German),
            Self::English => Some(MnemonicDialect::English),
        }
    }
}

/// Longest accepted cycle time limit.
pub const MAX_CYCLE_TIME_LIMIT: Duration = Duration::from_secs(3600);
/// Longest accepted cycle time target.
pub const MAX_CYCLE_TIME_TARGET: Duration = Duration::from_secs(60);

/// Runtime-tunable CPU behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CpuConfig {
    mnemonics: MnemonicSetting,
    clock_memory_byte: Option<u16>,
    cycle_time_limit: Duration,
    cycle_time_target: Duration,
    extended_insns_enabled: bool,
    ob_temp_presets_enabled: bool,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            mnemonics: MnemonicSetting::Auto,
            clock_memory_byte: None,
            cycle_time_limit: Duration::from_secs(1),
            cycle_time_target: Duration::ZERO,
            extended_insns_enabled: false,
            ob_temp_presets_enabled: true,
        }
    }
}

impl CpuConfig {
    /// Starts a builder from the defaults.
    #[must_use]
    pub fn builder() -> CpuConfigBuilder {
        CpuConfigBuilder {
            config: Self::default(),
        }
    }

    /// Reopens this config for modification.
    #[must_use]
    pub const fn to_builder(self) -> CpuConfigBuilder {
        CpuConfigBuilder { config: self }
    }

    /// Mnemonic dialect selection.
    #[must_use]
    pub const fn mnemonics(&self) -> MnemonicSetting {
        self.mnemonics
    }

    /// Flag byte receiving the clock pulses, if enabled.
    #[must_use]
    pub const fn clock_memory_byte(&self) -> Option<u16> {
        self.clock_memory_byte
    }

    /// Cycle overrun threshold.
    #[must_use]
    pub const fn cycle_time_limit(&self) -> Duration {
        self.cycle_time_limit
    }

    /// Minimum cycle period; shorter cycles are padded.
    #[must_use]
    pub const fn cycle_time_target(&self) -> Duration {
        self.cycle_time_target
    }

    /// Whether `__` extended instructions and operands are accepted.
    #[must_use]
    pub const fn extended_insns_enabled(&self) -> bool {
        self.extended_insns_enabled
    }

    /// Whether OB temporary data is preset before each OB run.
    #[must_use]
    pub const fn ob_temp_presets_enabled(&self) -> bool {
        self.ob_temp_presets_enabled
    }

    /// True when switching to `other` changes how programs translate.
    #[must_use]
    pub fn needs_retranslation(&self, other: &Self) -> bool {
        self.mnemonics != other.mnemonics
            || self.extended_insns_enabled != other.extended_insns_enabled
    }

    /// Checks the parts of the config that depend on the specs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ClockMemoryOutOfRange`] when the clock memory
    /// byte lies outside flag memory.
    pub fn validate_against(&self, specs: &CpuSpecs) -> Result<(), ConfigError> {
        match self.clock_memory_byte {
            Some(byte) if u32::from(byte) >= specs.flag_bytes() => {
                Err(ConfigError::ClockMemoryOutOfRange {
                    byte,
                    flag_bytes: specs.flag_bytes(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Mutable staging area for [`CpuConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuConfigBuilder {
    config: CpuConfig,
}

impl CpuConfigBuilder {
    /// Selects the mnemonic dialect.
    #[must_use]
    pub const fn mnemonics(mut self, setting: MnemonicSetting) -> Self {
        self.config.mnemonics = setting;
        self
    }

    /// Selects the clock memory flag byte; `None` disables it.
    #[must_use]
    pub const fn clock_memory_byte(mut self, byte: Option<u16>) -> Self {
        self.config.clock_memory_byte = byte;
        self
    }

    /// Sets the cycle overrun threshold (`1 ms..=1 h`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] outside the accepted range.
    #[allow(clippy::cast_possible_truncation)]
    pub fn cycle_time_limit(mut self, limit: Duration) -> Result<Self, ConfigError> {
        check_range(
            "cycle_time_limit_ms",
            limit.as_millis() as u64,
            1,
            MAX_CYCLE_TIME_LIMIT.as_millis() as u64,
        )?;
        self.config.cycle_time_limit = limit;
        Ok(self)
    }

    /// Sets the cycle period target (`0..=60 s`); zero disables padding.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] above 60 s.
    #[allow(clippy::cast_possible_truncation)]
    pub fn cycle_time_target(mut self, target: Duration) -> Result<Self, ConfigError> {
        check_range(
            "cycle_time_target_ms",
            target.as_millis() as u64,
            0,
            MAX_CYCLE_TIME_TARGET.as_millis() as u64,
        )?;
        self.config.cycle_time_target = target;
        Ok(self)
    }

    /// Enables or disables `__` extended instructions.
    #[must_use]
    pub const fn extended_insns(mut self, enabled: bool) -> Self {
        self.config.extended_insns_enabled = enabled;
        self
    }

    /// Enables or disables OB temporary data presets.
    #[must_use]
    pub const fn ob_temp_presets(mut self, enabled: bool) -> Self {
        self.config.ob_temp_presets_enabled = enabled;
        self
    }

    /// Freezes the config.
    #[must_use]
    pub const fn build(self) -> CpuConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{ConfigError, CpuConfig, CpuSpecs, MnemonicSetting};

    #[test]
    fn defaults_match_s7_300_profile() {
        let specs = CpuSpecs::default();
        assert_eq!(specs.accu_count(), 2);
        assert_eq!(specs.paren_stack_depth(), 7);
        assert_eq!(specs.call_stack_depth(), 16);
        assert_eq!(specs.local_data_bytes(), 1024);
        let config = CpuConfig::default();
        assert_eq!(config.cycle_time_limit(), Duration::from_secs(1));
        assert_eq!(config.cycle_time_target(), Duration::ZERO);
        assert!(!config.extended_insns_enabled());
    }

    #[test]
    fn setters_reject_out_of_range_values() {
        assert_eq!(
            CpuSpecs::builder().accu_count(3),
            Err(ConfigError::AccuCount(3))
        );
        assert!(matches!(
            CpuSpecs::builder().paren_stack_depth(0),
            Err(ConfigError::OutOfRange {
                field: "paren_stack_depth",
                ..
            })
        ));
        assert!(CpuSpecs::builder().flag_bytes(0x1_0001).is_err());
        assert!(CpuConfig::builder()
            .cycle_time_limit(Duration::ZERO)
            .is_err());
        assert!(CpuConfig::builder()
            .cycle_time_target(Duration::from_secs(61))
            .is_err());
    }

    #[test]
    fn builder_freezes_accepted_values() {
        let specs = CpuSpecs::builder()
            .accu_count(4)
            .and_then(|builder| builder.local_data_bytes(64))
            .expect("valid specs")
            .build();
        assert_eq!(specs.accu_count(), 4);
        assert_eq!(specs.local_data_bytes(), 64);
        assert_eq!(specs.to_builder().build(), specs);
    }

    #[test]
    fn clock_memory_must_lie_in_flag_memory() {
        let specs = CpuSpecs::builder()
            .flag_bytes(16)
            .expect("valid size")
            .build();
        let config = CpuConfig::builder().clock_memory_byte(Some(16)).build();
        assert_eq!(
            config.validate_against(&specs),
            Err(ConfigError::ClockMemoryOutOfRange {
                byte: 16,
                flag_bytes: 16
            })
        );
        let config = config.to_builder().clock_memory_byte(Some(15)).build();
        assert!(config.validate_against(&specs).is_ok());
    }

    #[test]
    fn retranslation_follows_dialect_and_extended_gate() {
        let base = CpuConfig::default();
        assert!(!base.needs_retranslation(&base.to_builder().ob_temp_presets(false).build()));
        assert!(base.needs_retranslation(
            &base.to_builder().mnemonics(MnemonicSetting::English).build()
        ));
        assert!(base.needs_retranslation(&base.to_builder().extended_insns(true).build()));
    }
}
