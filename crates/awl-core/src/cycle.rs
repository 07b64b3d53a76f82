//! Organization block walker: runs one OB to completion, following block
//! calls through the call stack.

use tracing::trace;

use crate::api::{TraceEvent, TraceSink};
use crate::execute::{execute, CallRequest, ExecuteOutcome};
use crate::fault::{RuntimeErrorKind, RuntimeFault};
use crate::program::{Block, BlockId, Program};
use crate::state::{CpuState, ReturnAddress};
use crate::timing::Clock;

/// Borrowed execution context for one OB run.
pub struct BlockWalker<'a> {
    /// Program being executed.
    pub program: &'a Program,
    /// CPU state mutated by the instructions.
    pub state: &'a mut CpuState,
    /// Clock sampled before every instruction.
    pub clock: &'a mut dyn Clock,
    /// Optional instruction trace.
    pub sink: Option<&'a mut (dyn TraceSink + 'static)>,
}

impl<'a> BlockWalker<'a> {
    fn emit(&mut self, event: TraceEvent) {
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.on_event(event);
        }
    }

    fn fault_at(&self, kind: RuntimeErrorKind, block: BlockId, index: usize) -> Box<RuntimeFault> {
        let located = self.program.block(block);
        Box::new(RuntimeFault {
            kind,
            block,
            index,
            instruction: located
                .and_then(|block| block.instruction(index))
                .map(|insn| insn.render(self.program.dialect()))
                .unwrap_or_default(),
            trace: located.and_then(|block| block.trace(index)).cloned(),
            registers: self.state.snapshot(),
        })
    }

    /// Runs `ob` from its first instruction until it returns.
    ///
    /// `temp_presets` is copied into the start of the OB's local data,
    /// truncated to its declared size. Returns the number of instructions
    /// executed, callees included.
    ///
    /// # Errors
    ///
    /// Returns the first runtime fault. The call stack is left as it was
    /// at the fault.
    pub fn run(&mut self, ob: BlockId, temp_presets: &[u8]) -> Result<u64, Box<RuntimeFault>> {
        let program = self.program;
        let Some(root) = program.block(ob) else {
            return Err(self.fault_at(RuntimeErrorKind::BlockNotFound(ob), ob, 0));
        };
        // Every OB starts with no nesting inherited from a previous run.
        self.state.paren.clear();
        self.state.mcr.clear();
        if let Err(kind) = self.state.enter_block(ob, root.local_bytes(), None) {
            return Err(self.fault_at(kind, ob, 0));
        }
        let locals = self.state.calls.locals_mut();
        let preset = temp_presets.len().min(locals.len());
        locals[..preset].copy_from_slice(&temp_presets[..preset]);

        let mut block = root;
        let mut ip = 0;
        let mut executed = 0_u64;
        loop {
            let Some(insn) = block.instruction(ip) else {
                // Running off the end behaves like BE.
                match self.leave(block, ip)? {
                    Some(resume) => (block, ip) = resume,
                    None => return Ok(executed),
                }
                continue;
            };

            self.state.now = self.clock.now();
            self.emit(TraceEvent::InstructionStart {
                block: block.id(),
                index: ip,
                kind: insn.kind,
            });
            trace!(block = %block.id(), index = ip, kind = ?insn.kind, "execute");
            let outcome = match execute(self.state, insn, ip) {
                Ok(outcome) => outcome,
                Err(kind) => {
                    self.emit(TraceEvent::FaultRaised {
                        block: block.id(),
                        index: ip,
                        class: kind.class(),
                    });
                    return Err(self.fault_at(kind, block.id(), ip));
                }
            };
            executed = executed.saturating_add(1);
            self.emit(TraceEvent::InstructionRetired {
                block: block.id(),
                index: ip,
                status: self.state.status,
                accu1: self.state.registers.accu1(),
            });

            match outcome {
                ExecuteOutcome::Next => ip += 1,
                ExecuteOutcome::Jump(target) => ip = target,
                ExecuteOutcome::Sleep(duration) => {
                    self.clock.sleep(duration);
                    ip += 1;
                }
                ExecuteOutcome::Call(request) => {
                    block = self.enter(request, block.id(), ip)?;
                    ip = 0;
                }
                ExecuteOutcome::Return => match self.leave(block, ip)? {
                    Some(resume) => (block, ip) = resume,
                    None => return Ok(executed),
                },
            }
        }
    }

    /// Pushes the callee frame with fresh parenthesis and MCR scopes.
    /// Nothing changes when the push fails.
    fn enter(
        &mut self,
        request: CallRequest,
        caller: BlockId,
        ip: usize,
    ) -> Result<&'a Block, Box<RuntimeFault>> {
        let program = self.program;
        let Some(callee) = program.block(request.block) else {
            return Err(self.fault_at(
                RuntimeErrorKind::BlockNotFound(request.block),
                caller,
                ip,
            ));
        };
        if let Some(instance) = request.instance_db {
            if self.state.memory.data_block(instance).is_none() {
                return Err(self.fault_at(
                    RuntimeErrorKind::DataBlockNotFound(instance),
                    caller,
                    ip,
                ));
            }
        }
        let return_to = ReturnAddress {
            block: caller,
            index: ip + 1,
        };
        if let Err(kind) = self
            .state
            .enter_block(callee.id(), callee.local_bytes(), Some(return_to))
        {
            return Err(self.fault_at(kind, caller, ip));
        }
        if let Some(instance) = request.instance_db {
            self.state.registers.set_di(instance);
        }
        let depth = self.state.calls.depth();
        trace!(callee = %callee.id(), depth, "block call");
        self.emit(TraceEvent::BlockCall {
            callee: callee.id(),
            depth,
        });
        Ok(callee)
    }

    /// Pops the current frame; `None` once the OB itself returned.
    fn leave(
        &mut self,
        block: &Block,
        ip: usize,
    ) -> Result<Option<(&'a Block, usize)>, Box<RuntimeFault>> {
        let frame = match self.state.leave_block() {
            Ok(frame) => frame,
            Err(kind) => return Err(self.fault_at(kind, block.id(), ip)),
        };
        self.state.status = self.state.status.chain_terminated();
        let depth = self.state.calls.depth();
        self.emit(TraceEvent::BlockReturn {
            block: frame.block,
            depth,
        });
        let Some(resume) = frame.return_to else {
            return Ok(None);
        };
        let program = self.program;
        match program.block(resume.block) {
            Some(caller) => Ok(Some((caller, resume.index))),
            None => Err(self.fault_at(
                RuntimeErrorKind::BlockNotFound(resume.block),
                block.id(),
                ip,
            )),
        }
    }
}
