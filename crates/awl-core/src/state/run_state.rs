use std::fmt;

/// Host-observable CPU lifecycle state.
///
/// `Init → Stopped ⇄ Running → Maintenance → (Stopped | Exit)`; `Exit` is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum CpuRunState {
    /// Freshly created or reset; no startup performed yet.
    #[default]
    Init,
    /// Halted by the host or by a runtime fault.
    Stopped,
    /// Executing cycles.
    Running,
    /// A maintenance request was delivered and awaits host handling.
    Maintenance,
    /// Shut down; no further operation is accepted.
    Exit,
}

impl CpuRunState {
    /// Whether [`crate::Cpu::startup`] is accepted.
    #[must_use]
    pub const fn can_start(self) -> bool {
        matches!(self, Self::Init | Self::Stopped | Self::Maintenance)
    }

    /// Whether a program may be loaded or specs changed.
    #[must_use]
    pub const fn can_reconfigure(self) -> bool {
        !matches!(self, Self::Running | Self::Exit)
    }

    /// True for the terminal state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Exit)
    }
}

impl fmt::Display for CpuRunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Init => "INIT",
            Self::Stopped => "STOP",
            Self::Running => "RUN",
            Self::Maintenance => "MAINTENANCE",
            Self::Exit => "EXIT",
        })
    }
}
