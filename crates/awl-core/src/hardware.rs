//! Process-image synchronization hooks supplied by the host.

use thiserror::Error;

/// Failure reported by a [`HardwareInterface`] hook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HwError {
    /// The input transfer could not complete.
    #[error("input read failed: {0}")]
    ReadFailed(String),
    /// The output transfer could not complete.
    #[error("output write failed: {0}")]
    WriteFailed(String),
    /// The backend is not usable in its current configuration.
    #[error("hardware backend misconfigured: {0}")]
    Configuration(String),
}

/// Pre- and post-cycle process-image transfer.
///
/// Hooks run only at cycle boundaries, never while instructions execute,
/// and must return promptly.
pub trait HardwareInterface {
    /// Fills the input image before OB1 runs.
    ///
    /// # Errors
    ///
    /// Returns [`HwError`] when the backend cannot supply inputs; the CPU
    /// skips the cycle and reports the error to the host.
    fn read_inputs(&mut self, inputs: &mut [u8]) -> Result<(), HwError>;

    /// Publishes the output image after OB1 finished.
    ///
    /// # Errors
    ///
    /// Returns [`HwError`] when the backend cannot accept outputs.
    fn write_outputs(&mut self, outputs: &[u8]) -> Result<(), HwError>;
}

/// In-memory backend: inputs are copied from a host-owned image and
/// outputs are captured for inspection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopbackHardware {
    /// Image copied into the CPU inputs every cycle.
    pub inputs: Vec<u8>,
    /// Last output image published by the CPU.
    pub outputs: Vec<u8>,
    /// Completed read/write round trips.
    pub transfers: u64,
}

impl LoopbackHardware {
    /// Creates a backend with `input_bytes` zeroed inputs.
    #[must_use]
    pub fn new(input_bytes: usize) -> Self {
        Self {
            inputs: vec![0; input_bytes],
            outputs: Vec::new(),
            transfers: 0,
        }
    }
}

impl HardwareInterface for LoopbackHardware {
    fn read_inputs(&mut self, inputs: &mut [u8]) -> Result<(), HwError> {
        let copied = self.inputs.len().min(inputs.len());
        inputs[..copied].copy_from_slice(&self.inputs[..copied]);
        Ok(())
    }

    fn write_outputs(&mut self, outputs: &[u8]) -> Result<(), HwError> {
        self.outputs.clear();
        self.outputs.extend_from_slice(outputs);
        self.transfers = self.transfers.saturating_add(1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{HardwareInterface, HwError, LoopbackHardware};

    #[test]
    fn loopback_copies_images() {
        let mut hardware = LoopbackHardware::new(2);
        hardware.inputs[1] = 0x80;
        let mut image = [0u8; 4];
        hardware.read_inputs(&mut image).expect("read");
        assert_eq!(image, [0, 0x80, 0, 0]);
        hardware.write_outputs(&[1, 2]).expect("write");
        assert_eq!(hardware.outputs, vec![1, 2]);
        assert_eq!(hardware.transfers, 1);
    }

    #[test]
    fn errors_render_cause() {
        assert_eq!(
            HwError::ReadFailed("bus timeout".into()).to_string(),
            "input read failed: bus timeout"
        );
    }
}
