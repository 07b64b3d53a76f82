use crate::fault::{RuntimeErrorKind, StackKind};
use crate::program::BlockId;
use crate::state::mcr::McrScope;

/// S7-300 block nesting depth.
pub const DEFAULT_CALL_DEPTH: u16 = 16;

/// Byte range of one frame on the local data stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct LocalRegion {
    /// First byte on the local data stack.
    pub base: u32,
    /// Region length in bytes.
    pub len: u32,
}

/// Instruction to resume at once the callee returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ReturnAddress {
    /// Calling block.
    pub block: BlockId,
    /// Instruction index following the call.
    pub index: usize,
}

/// Caller's block-local nesting, restored when the frame is popped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct FrameScopes {
    /// Caller's parenthesis floor.
    pub paren_floor: usize,
    /// Caller's master control relay context.
    pub mcr: McrScope,
}

/// One active block invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CallFrame {
    /// Block this frame executes.
    pub block: BlockId,
    /// Where the caller resumes; `None` for the organization block.
    pub return_to: Option<ReturnAddress>,
    /// Local data owned by the frame.
    pub locals: LocalRegion,
    /// Caller's DB register, restored on return.
    pub saved_db: u16,
    /// Caller's DI register, restored on return.
    pub saved_di: u16,
    /// Caller's parenthesis and MCR scopes.
    pub scopes: FrameScopes,
}

/// Local data stack carved into per-frame regions.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct LocalStack {
    bytes: Vec<u8>,
    top: u32,
}

impl LocalStack {
    /// Allocates a zeroed local data stack.
    #[must_use]
    pub fn new(capacity: u32) -> Self {
        Self {
            bytes: vec![0; capacity as usize],
            top: 0,
        }
    }

    /// Total capacity in bytes.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn capacity(&self) -> u32 {
        self.bytes.len() as u32
    }

    /// Bytes still free.
    #[must_use]
    pub fn available(&self) -> u32 {
        self.capacity().saturating_sub(self.top)
    }

    fn allocate(&mut self, len: u32) -> Result<LocalRegion, RuntimeErrorKind> {
        let available = self.available();
        if len > available {
            return Err(RuntimeErrorKind::LocalStackOverflow {
                requested: len,
                available,
            });
        }
        let region = LocalRegion {
            base: self.top,
            len,
        };
        self.top += len;
        self.region_mut(region).fill(0);
        Ok(region)
    }

    fn release(&mut self, region: LocalRegion) {
        self.top = region.base;
    }

    /// Bytes of a region.
    #[must_use]
    pub fn region(&self, region: LocalRegion) -> &[u8] {
        let start = region.base as usize;
        &self.bytes[start..start + region.len as usize]
    }

    /// Mutable bytes of a region.
    pub fn region_mut(&mut self, region: LocalRegion) -> &mut [u8] {
        let start = region.base as usize;
        &mut self.bytes[start..start + region.len as usize]
    }
}

/// Bounded LIFO of [`CallFrame`] plus the local data stack they share.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CallStack {
    frames: Vec<CallFrame>,
    depth_limit: u16,
    locals: LocalStack,
}

impl CallStack {
    /// Creates an empty call stack.
    #[must_use]
    pub fn new(depth_limit: u16, local_bytes: u32) -> Self {
        Self {
            frames: Vec::with_capacity(usize::from(depth_limit)),
            depth_limit,
            locals: LocalStack::new(local_bytes),
        }
    }

    /// Pushes a frame, allocating `local_bytes` of local data.
    ///
    /// Nothing is pushed when either limit is hit.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeErrorKind::RecursionLimitExceeded`] at the depth limit
    /// and [`RuntimeErrorKind::LocalStackOverflow`] when the local data stack
    /// cannot hold the region.
    pub fn push(
        &mut self,
        block: BlockId,
        local_bytes: u32,
        return_to: Option<ReturnAddress>,
        saved_db: u16,
        saved_di: u16,
    ) -> Result<&CallFrame, RuntimeErrorKind> {
        if self.frames.len() >= usize::from(self.depth_limit) {
            return Err(RuntimeErrorKind::RecursionLimitExceeded {
                limit: self.depth_limit,
            });
        }
        let locals = self.locals.allocate(local_bytes)?;
        self.frames.push(CallFrame {
            block,
            return_to,
            locals,
            saved_db,
            saved_di,
            scopes: FrameScopes::default(),
        });
        Ok(&self.frames[self.frames.len() - 1])
    }

    /// Pops the newest frame and releases its local data.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeErrorKind::StackUnderflow`] when no frame is active.
    pub fn pop(&mut self) -> Result<CallFrame, RuntimeErrorKind> {
        let frame = self
            .frames
            .pop()
            .ok_or(RuntimeErrorKind::StackUnderflow(StackKind::Call))?;
        self.locals.release(frame.locals);
        Ok(frame)
    }

    /// Newest frame.
    #[must_use]
    pub fn current(&self) -> Option<&CallFrame> {
        self.frames.last()
    }

    /// Newest frame, mutably.
    pub fn current_mut(&mut self) -> Option<&mut CallFrame> {
        self.frames.last_mut()
    }

    /// Active frames, oldest first.
    #[must_use]
    pub fn frames(&self) -> &[CallFrame] {
        &self.frames
    }

    /// Active frame count.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Configured depth limit.
    #[must_use]
    pub const fn depth_limit(&self) -> u16 {
        self.depth_limit
    }

    /// Local data of the newest frame; empty when no frame is active.
    #[must_use]
    pub fn locals(&self) -> &[u8] {
        self.frames
            .last()
            .map_or(&[] as &[u8], |frame| self.locals.region(frame.locals))
    }

    /// Mutable local data of the newest frame.
    pub fn locals_mut(&mut self) -> &mut [u8] {
        match self.frames.last() {
            Some(frame) => self.locals.region_mut(frame.locals),
            None => &mut [],
        }
    }

    /// Drops all frames.
    pub fn clear(&mut self) {
        self.frames.clear();
        self.locals.top = 0;
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{CallStack, ReturnAddress};
    use crate::fault::{RuntimeErrorKind, StackKind};
    use crate::program::BlockId;

    #[test]
    fn frames_own_disjoint_local_regions() {
        let mut stack = CallStack::new(4, 64);
        stack
            .push(BlockId::ob(1), 20, None, 0, 0)
            .expect("root frame");
        stack.locals_mut()[0] = 0xAA;
        let frame = *stack
            .push(
                BlockId::fc(1),
                8,
                Some(ReturnAddress {
                    block: BlockId::ob(1),
                    index: 3,
                }),
                7,
                0,
            )
            .expect("callee frame");
        assert_eq!(frame.locals.base, 20);
        assert!(stack.locals().iter().all(|byte| *byte == 0));
        let popped = stack.pop().expect("callee");
        assert_eq!(popped.saved_db, 7);
        assert_eq!(stack.locals()[0], 0xAA);
    }

    #[test]
    fn local_overflow_pushes_nothing() {
        let mut stack = CallStack::new(4, 16);
        stack.push(BlockId::ob(1), 10, None, 0, 0).expect("root");
        assert_eq!(
            stack.push(BlockId::fc(2), 7, None, 0, 0).map(|_| ()),
            Err(RuntimeErrorKind::LocalStackOverflow {
                requested: 7,
                available: 6
            })
        );
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn depth_limit_and_underflow() {
        let mut stack = CallStack::new(1, 0);
        stack.push(BlockId::ob(1), 0, None, 0, 0).expect("root");
        assert_eq!(
            stack.push(BlockId::fc(1), 0, None, 0, 0).map(|_| ()),
            Err(RuntimeErrorKind::RecursionLimitExceeded { limit: 1 })
        );
        stack.pop().expect("root pops");
        assert_eq!(
            stack.pop(),
            Err(RuntimeErrorKind::StackUnderflow(StackKind::Call))
        );
    }

    proptest! {
        #[test]
        fn pop_returns_most_recent_push(numbers in proptest::collection::vec(1u16..100, 0..16)) {
            let mut stack = CallStack::new(16, 256);
            for number in &numbers {
                prop_assert!(stack.push(BlockId::fc(*number), 4, None, *number, 0).is_ok());
            }
            for number in numbers.iter().rev() {
                let frame = stack.pop();
                prop_assert_eq!(frame.map(|frame| (frame.block, frame.saved_db)), Ok((BlockId::fc(*number), *number)));
            }
            prop_assert_eq!(stack.pop(), Err(RuntimeErrorKind::StackUnderflow(StackKind::Call)));
        }
    }
}
