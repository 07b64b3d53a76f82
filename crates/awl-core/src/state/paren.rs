use crate::catalog::InstructionType;
use crate::fault::{RuntimeErrorKind, StackKind};
use crate::state::StatusWord;

/// S7-300 parenthesis nesting depth.
pub const DEFAULT_PAREN_DEPTH: u16 = 7;

/// Logic context saved by a parenthesis-opening instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ParenStackElement {
    /// Opening instruction (`U(`, `ON(`, ...).
    pub kind: InstructionType,
    /// `/FC` at the time of the push.
    pub nesting_flag: bool,
    /// RLO at the time of the push.
    pub rlo: bool,
    /// OR bit at the time of the push.
    pub or: bool,
}

/// Fixed-capacity LIFO of [`ParenStackElement`].
///
/// Every block invocation sees its own stack: [`ParenStack::enter_scope`]
/// hides the caller's elements and [`ParenStack::leave_scope`] drops
/// whatever the callee left open. The capacity applies per block.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ParenStack {
    elements: Vec<ParenStackElement>,
    capacity: usize,
    floor: usize,
}

impl ParenStack {
    /// Creates an empty stack with the given capacity.
    #[must_use]
    pub fn new(capacity: u16) -> Self {
        let capacity = usize::from(capacity);
        Self {
            elements: Vec::with_capacity(capacity),
            capacity,
            floor: 0,
        }
    }

    /// Saves the logic context of `status` for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeErrorKind::StackOverflow`] when the stack is full.
    pub fn push(
        &mut self,
        kind: InstructionType,
        status: StatusWord,
    ) -> Result<(), RuntimeErrorKind> {
        if self.depth() >= self.capacity {
            return Err(RuntimeErrorKind::StackOverflow(StackKind::Parenthesis));
        }
        self.elements.push(ParenStackElement {
            kind,
            nesting_flag: status.fc(),
            rlo: status.rlo(),
            or: status.or(),
        });
        Ok(())
    }

    /// Removes and returns the most recently pushed element.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeErrorKind::StackUnderflow`] when the stack is empty.
    pub fn pop(&mut self) -> Result<ParenStackElement, RuntimeErrorKind> {
        if self.elements.len() <= self.floor {
            return Err(RuntimeErrorKind::StackUnderflow(StackKind::Parenthesis));
        }
        self.elements
            .pop()
            .ok_or(RuntimeErrorKind::StackUnderflow(StackKind::Parenthesis))
    }

    /// Depth of the current block's nesting.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.elements.len() - self.floor
    }

    /// Starts an empty nesting for a called block; returns the caller's floor.
    pub fn enter_scope(&mut self) -> usize {
        let saved = self.floor;
        self.floor = self.elements.len();
        saved
    }

    /// Discards the callee's open elements and restores the caller's floor.
    pub fn leave_scope(&mut self, saved_floor: usize) {
        self.elements.truncate(self.floor);
        self.floor = saved_floor.min(self.elements.len());
    }

    /// Configured capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops every element.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.floor = 0;
    }
}
