use crate::fault::{RuntimeErrorKind, StackKind};

/// Nesting depth of the master control relay stack.
pub const MCR_DEPTH: usize = 8;

/// Caller's relay context saved across a block call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct McrScope {
    /// `MCRA` in effect in the caller.
    pub active: bool,
    /// Levels below this index belong to outer blocks.
    pub floor: usize,
}

/// Master control relay: gates `=`, `S`, `R` and `T` while active.
///
/// Activation and levels are block-local: a called block starts with the
/// relay off and an empty level stack.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct McrStack {
    active: bool,
    levels: Vec<bool>,
    floor: usize,
}

impl McrStack {
    /// `MCRA`.
    pub const fn activate(&mut self) {
        self.active = true;
    }

    /// `MCRD`.
    pub const fn deactivate(&mut self) {
        self.active = false;
    }

    /// `MCR(`: pushes the RLO combined with the enclosing level.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeErrorKind::StackOverflow`] beyond [`MCR_DEPTH`].
    pub fn open(&mut self, rlo: bool) -> Result<(), RuntimeErrorKind> {
        if self.depth() >= MCR_DEPTH {
            return Err(RuntimeErrorKind::StackOverflow(StackKind::Mcr));
        }
        let outer = self.innermost().unwrap_or(true);
        self.levels.push(outer && rlo);
        Ok(())
    }

    /// `)MCR`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeErrorKind::StackUnderflow`] when no level is open.
    pub fn close(&mut self) -> Result<(), RuntimeErrorKind> {
        if self.levels.len() <= self.floor {
            return Err(RuntimeErrorKind::StackUnderflow(StackKind::Mcr));
        }
        self.levels
            .pop()
            .map(|_| ())
            .ok_or(RuntimeErrorKind::StackUnderflow(StackKind::Mcr))
    }

    /// False while writes must be suppressed.
    #[must_use]
    pub fn enabled(&self) -> bool {
        !self.active || self.innermost().unwrap_or(true)
    }

    fn innermost(&self) -> Option<bool> {
        self.levels[self.floor..].last().copied()
    }

    /// Whether `MCRA` is in effect.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Levels opened by the current block.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.levels.len() - self.floor
    }

    /// Hands a called block a deactivated relay with no levels.
    pub fn enter_scope(&mut self) -> McrScope {
        let saved = McrScope {
            active: self.active,
            floor: self.floor,
        };
        self.active = false;
        self.floor = self.levels.len();
        saved
    }

    /// Drops the callee's levels and restores the caller's relay.
    pub fn leave_scope(&mut self, saved: McrScope) {
        self.levels.truncate(self.floor);
        self.active = saved.active;
        self.floor = saved.floor.min(self.levels.len());
    }

    /// Deactivates and drops all levels.
    pub fn clear(&mut self) {
        self.active = false;
        self.levels.clear();
        self.floor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::{McrStack, MCR_DEPTH};
    use crate::fault::{RuntimeErrorKind, StackKind};

    #[test]
    fn inactive_relay_never_gates() {
        let mut mcr = McrStack::default();
        mcr.open(false).expect("level fits");
        assert!(mcr.enabled());
        mcr.activate();
        assert!(!mcr.enabled());
        mcr.deactivate();
        assert!(mcr.enabled());
    }

    #[test]
    fn nested_levels_and_with_outer() {
        let mut mcr = McrStack::default();
        mcr.activate();
        mcr.open(false).expect("outer");
        mcr.open(true).expect("inner");
        assert!(!mcr.enabled());
        mcr.close().expect("inner close");
        mcr.close().expect("outer close");
        assert!(mcr.enabled());
        assert_eq!(
            mcr.close(),
            Err(RuntimeErrorKind::StackUnderflow(StackKind::Mcr))
        );
    }

    #[test]
    fn called_blocks_start_with_the_relay_off() {
        let mut mcr = McrStack::default();
        mcr.activate();
        mcr.open(false).expect("caller level");
        assert!(!mcr.enabled());

        let saved = mcr.enter_scope();
        assert!(mcr.enabled());
        assert_eq!(mcr.depth(), 0);
        assert_eq!(
            mcr.close(),
            Err(RuntimeErrorKind::StackUnderflow(StackKind::Mcr))
        );
        mcr.activate();
        mcr.open(true).expect("callee level");
        mcr.leave_scope(saved);

        assert!(mcr.is_active());
        assert_eq!(mcr.depth(), 1);
        assert!(!mcr.enabled());
    }

    #[test]
    fn depth_is_bounded() {
        let mut mcr = McrStack::default();
        for _ in 0..MCR_DEPTH {
            mcr.open(true).expect("within depth");
        }
        assert_eq!(
            mcr.open(true),
            Err(RuntimeErrorKind::StackOverflow(StackKind::Mcr))
        );
    }
}
