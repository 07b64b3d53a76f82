//! Host-facing CPU: lifecycle state machine, startup and the OB1 cycle.

use std::ops::ControlFlow;
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};

use crate::api::{
    CycleReport, HostRequest, MaintenanceKind, MaintenanceRequest, TraceEvent, TraceSink,
};
use crate::config::{CpuConfig, CpuSpecs};
use crate::cycle::BlockWalker;
use crate::diag::CpuDiagnostics;
use crate::fault::{CpuError, RuntimeFault};
use crate::hardware::HardwareInterface;
use crate::memory::DataBlock;
use crate::program::{BlockId, Program, RawProgram};
use crate::state::{CpuRunState, CpuState};
use crate::timing::{clock_memory_byte, millis_u16, Clock, SystemClock};

/// Size of the preset OB temporary data header.
pub const OB_TEMP_PRESET_BYTES: usize = 20;

/// One emulated CPU instance.
///
/// All operations are synchronous; a `Cpu` is `Send` so independent
/// instances can run on separate threads.
pub struct Cpu {
    specs: CpuSpecs,
    config: CpuConfig,
    raw: Option<RawProgram>,
    program: Option<Program>,
    state: CpuState,
    run_state: CpuRunState,
    clock: Box<dyn Clock>,
    hardware: Option<Box<dyn HardwareInterface + Send>>,
    sink: Option<Box<dyn TraceSink>>,
    pending: Option<HostRequest>,
    diagnostics: CpuDiagnostics,
    started_at: Duration,
    cycle: u64,
}

impl Cpu {
    /// Creates a CPU in `Init` using the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`CpuError::Config`] when `config` does not fit `specs`.
    pub fn new(specs: CpuSpecs, config: CpuConfig) -> Result<Self, CpuError> {
        config.validate_against(&specs)?;
        Ok(Self {
            specs,
            config,
            raw: None,
            program: None,
            state: CpuState::new(&specs),
            run_state: CpuRunState::Init,
            clock: Box::new(SystemClock::new()),
            hardware: None,
            sink: None,
            pending: None,
            diagnostics: CpuDiagnostics::default(),
            started_at: Duration::ZERO,
            cycle: 0,
        })
    }

    /// Replaces the clock used for timers, clock memory and cycle timing.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Attaches the process-image backend.
    pub fn set_hardware(&mut self, hardware: impl HardwareInterface + Send + 'static) {
        self.hardware = Some(Box::new(hardware));
    }

    /// Attaches or detaches the instruction trace sink.
    pub fn set_trace_sink(&mut self, sink: Option<Box<dyn TraceSink>>) {
        self.sink = sink;
    }

    fn ensure(&self, operation: &'static str, allowed: bool) -> Result<(), CpuError> {
        if allowed {
            Ok(())
        } else {
            Err(CpuError::InvalidState {
                operation,
                state: self.run_state,
            })
        }
    }

    fn load_data_blocks(&mut self) {
        self.state.memory.clear_data_blocks();
        if let Some(program) = &self.program {
            for data_block in program.data_blocks() {
                self.state.memory.insert_data_block(DataBlock::new(
                    data_block.number,
                    data_block.length,
                    &data_block.init,
                ));
            }
        }
    }

    /// Translates and installs a program; the CPU returns to `Init`.
    ///
    /// # Errors
    ///
    /// Returns [`CpuError::InvalidState`] while running or after shutdown
    /// and [`CpuError::Assembly`] when the program does not translate. The
    /// previously loaded program stays in place on error.
    pub fn load_program(&mut self, raw: RawProgram) -> Result<(), CpuError> {
        self.ensure("load_program", self.run_state.can_reconfigure())?;
        let program = Program::assemble(&raw, &self.config, &self.specs)?;
        info!(
            blocks = program.blocks().count(),
            dialect = %program.dialect(),
            "program loaded"
        );
        self.raw = Some(raw);
        self.program = Some(program);
        self.state = CpuState::new(&self.specs);
        self.load_data_blocks();
        self.run_state = CpuRunState::Init;
        Ok(())
    }

    /// Replaces the hardware profile, reallocating every memory area and
    /// revalidating the loaded program; the CPU returns to `Init`.
    ///
    /// # Errors
    ///
    /// Returns [`CpuError::InvalidState`] while running or after shutdown,
    /// [`CpuError::Config`] when the config no longer fits, and
    /// [`CpuError::Assembly`] when the program exceeds the new limits.
    pub fn set_specs(&mut self, specs: CpuSpecs) -> Result<(), CpuError> {
        self.ensure("set_specs", self.run_state.can_reconfigure())?;
        self.config.validate_against(&specs)?;
        let program = self
            .raw
            .as_ref()
            .map(|raw| Program::assemble(raw, &self.config, &specs))
            .transpose()?;
        self.specs = specs;
        self.program = program;
        self.state = CpuState::new(&specs);
        self.load_data_blocks();
        self.run_state = CpuRunState::Init;
        info!(?specs, "specs applied");
        Ok(())
    }

    /// Applies a new configuration.
    ///
    /// A change of mnemonic setting or extended-instruction gate
    /// retranslates the loaded program and is refused while running.
    ///
    /// # Errors
    ///
    /// Returns [`CpuError::Config`] for a clock memory byte outside flag
    /// memory, [`CpuError::InvalidState`] after shutdown or for a
    /// retranslating change while running, and [`CpuError::Assembly`] when
    /// the retained program no longer translates.
    pub fn set_config(&mut self, config: CpuConfig) -> Result<(), CpuError> {
        self.ensure("set_config", !self.run_state.is_terminal())?;
        config.validate_against(&self.specs)?;
        if self.config.needs_retranslation(&config) {
            self.ensure("set_config", self.run_state != CpuRunState::Running)?;
            if let Some(raw) = &self.raw {
                self.program = Some(Program::assemble(raw, &config, &self.specs)?);
            }
        }
        self.config = config;
        debug!(?config, "config applied");
        Ok(())
    }

    /// Queues a host request, honoured at the start of the next cycle.
    /// A later request replaces an earlier pending one.
    pub fn request(&mut self, request: HostRequest) {
        debug!(?request, "host request queued");
        self.pending = Some(request);
    }

    fn fail(&mut self, fault: Box<RuntimeFault>) -> CpuError {
        error!(%fault, "runtime fault, CPU stopped");
        self.diagnostics.record_fault(&fault);
        self.run_state = CpuRunState::Stopped;
        CpuError::Runtime(fault)
    }

    fn startup_presets(ob: BlockId) -> [u8; OB_TEMP_PRESET_BYTES] {
        let mut presets = [0; OB_TEMP_PRESET_BYTES];
        presets[0] = 0x13;
        presets[1] = 0x81;
        presets[2] = 27;
        presets[3] = u8::try_from(ob.number).unwrap_or(u8::MAX);
        presets
    }

    fn cycle_presets(&self) -> [u8; OB_TEMP_PRESET_BYTES] {
        let times = &self.diagnostics.cycles;
        let mut presets = [0; OB_TEMP_PRESET_BYTES];
        presets[0] = 0x11;
        presets[1] = if times.is_first() { 1 } else { 3 };
        presets[2] = 1;
        presets[3] = 1;
        presets[6..8].copy_from_slice(&millis_u16(times.last).to_be_bytes());
        presets[8..10].copy_from_slice(&millis_u16(times.min).to_be_bytes());
        presets[10..12].copy_from_slice(&millis_u16(times.max).to_be_bytes());
        presets
    }

    /// Warm restart: clears registers, stacks and process images, runs the
    /// startup OB if one is loaded and enters `Running`.
    ///
    /// # Errors
    ///
    /// Returns [`CpuError::InvalidState`] from `Running` or `Exit`,
    /// [`CpuError::NoProgram`] without a program, and
    /// [`CpuError::Runtime`] when the startup OB faults; the CPU is then
    /// `Stopped`.
    #[instrument(skip(self), name = "startup")]
    pub fn startup(&mut self) -> Result<(), CpuError> {
        self.ensure("startup", self.run_state.can_start())?;
        let Some(program) = &self.program else {
            return Err(CpuError::NoProgram);
        };
        self.state.clear_execution();
        self.state.memory.clear_images();
        self.pending = None;
        self.diagnostics.restart();
        self.cycle = 0;
        self.started_at = self.clock.now();

        if let Some(ob) = program.startup_block().map(crate::program::Block::id) {
            let presets = Self::startup_presets(ob);
            let presets: &[u8] = if self.config.ob_temp_presets_enabled() {
                &presets
            } else {
                &[]
            };
            let result = BlockWalker {
                program,
                state: &mut self.state,
                clock: self.clock.as_mut(),
                sink: self.sink.as_deref_mut(),
            }
            .run(ob, presets);
            match result {
                Ok(executed) => {
                    self.diagnostics.instruction_count += executed;
                    debug!(%ob, executed, "startup block finished");
                }
                Err(fault) => return Err(self.fail(fault)),
            }
        }
        self.state.clear_execution();
        self.run_state = CpuRunState::Running;
        info!("CPU running");
        Ok(())
    }

    /// Runs one OB1 cycle.
    ///
    /// Maintenance signals (host requests, cycle overruns) arrive as
    /// `ControlFlow::Break`; a completed cycle as `Continue`.
    ///
    /// # Errors
    ///
    /// Returns [`CpuError::InvalidState`] unless `Running`,
    /// [`CpuError::Hardware`] when a hook fails and
    /// [`CpuError::Runtime`] when OB1 faults (CPU `Stopped`). A failed input
    /// hook skips the cycle and leaves the run state unchanged; a failed
    /// output hook is reported after the cycle time was recorded and the
    /// limit checked, so an overrunning cycle still enters `Maintenance`.
    #[instrument(skip(self), name = "cycle", fields(cycle = self.cycle + 1))]
    pub fn run_cycle(&mut self) -> Result<ControlFlow<MaintenanceRequest, CycleReport>, CpuError> {
        self.ensure("run_cycle", self.run_state == CpuRunState::Running)?;
        if let Some(request) = self.pending.take() {
            self.run_state = request.target_state();
            info!(?request, state = %self.run_state, "host request honoured");
            return Ok(ControlFlow::Break(MaintenanceRequest::new(
                request.kind(),
                format!("requested by host after cycle {}", self.cycle),
            )));
        }
        let Some(program) = &self.program else {
            return Err(CpuError::NoProgram);
        };

        let start = self.clock.now();
        if let Some(byte) = self.config.clock_memory_byte() {
            let pulses = clock_memory_byte(start.saturating_sub(self.started_at));
            if let Some(flag) = self.state.memory.flags_mut().get_mut(usize::from(byte)) {
                *flag = pulses;
            }
        }
        if let Some(hardware) = self.hardware.as_mut() {
            if let Err(err) = hardware.read_inputs(self.state.memory.inputs_mut()) {
                warn!(%err, "input hook failed");
                self.diagnostics.record_hardware_error();
                return Err(err.into());
            }
        }

        self.cycle += 1;
        let presets = self.cycle_presets();
        let presets: &[u8] = if self.config.ob_temp_presets_enabled() {
            &presets
        } else {
            &[]
        };
        let result = BlockWalker {
            program,
            state: &mut self.state,
            clock: self.clock.as_mut(),
            sink: self.sink.as_deref_mut(),
        }
        .run(BlockId::MAIN, presets);
        let executed = match result {
            Ok(executed) => executed,
            Err(fault) => return Err(self.fail(fault)),
        };

        let published = match self.hardware.as_mut() {
            Some(hardware) => hardware.write_outputs(self.state.memory.outputs()),
            None => Ok(()),
        };

        let elapsed = self.clock.now().saturating_sub(start);
        self.diagnostics.cycles.record(elapsed);
        self.diagnostics.instruction_count += executed;
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.on_event(TraceEvent::CycleEnd {
                cycle: self.cycle,
                elapsed,
            });
        }

        let limit = self.config.cycle_time_limit();
        let overran = elapsed > limit;
        if overran {
            self.diagnostics.record_overrun();
            self.run_state = CpuRunState::Maintenance;
            warn!(?elapsed, ?limit, "cycle time exceeded");
        }
        // Output errors take precedence over the overrun break.
        if let Err(err) = published {
            warn!(%err, "output hook failed");
            self.diagnostics.record_hardware_error();
            return Err(err.into());
        }
        if overran {
            return Ok(ControlFlow::Break(MaintenanceRequest::new(
                MaintenanceKind::CycleTimeExceeded,
                format!("cycle {} took {elapsed:?}, limit {limit:?}", self.cycle),
            )));
        }

        let padding = self.config.cycle_time_target().saturating_sub(elapsed);
        if !padding.is_zero() {
            self.clock.sleep(padding);
        }
        debug!(?elapsed, ?padding, executed, "cycle complete");
        Ok(ControlFlow::Continue(CycleReport {
            cycle: self.cycle,
            elapsed,
            padding,
            instructions: executed,
        }))
    }

    /// Clears all state, reloads data blocks from the program and returns
    /// to `Init`.
    ///
    /// # Errors
    ///
    /// Returns [`CpuError::InvalidState`] after shutdown.
    pub fn reset(&mut self) -> Result<(), CpuError> {
        self.ensure("reset", !self.run_state.is_terminal())?;
        self.state.clear_all();
        self.load_data_blocks();
        self.diagnostics.reset();
        self.pending = None;
        self.cycle = 0;
        self.run_state = CpuRunState::Init;
        info!("CPU reset");
        Ok(())
    }

    /// Enters the terminal `Exit` state.
    pub fn shutdown(&mut self) {
        self.run_state = CpuRunState::Exit;
        self.pending = None;
        info!("CPU shut down");
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn run_state(&self) -> CpuRunState {
        self.run_state
    }

    /// Architectural state.
    #[must_use]
    pub const fn state(&self) -> &CpuState {
        &self.state
    }

    /// Mutable architectural state, for hosts driving the process images
    /// directly.
    pub const fn state_mut(&mut self) -> &mut CpuState {
        &mut self.state
    }

    /// Loaded program.
    #[must_use]
    pub const fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    /// Active hardware profile.
    #[must_use]
    pub const fn specs(&self) -> &CpuSpecs {
        &self.specs
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &CpuConfig {
        &self.config
    }

    /// Diagnostics counters.
    #[must_use]
    pub const fn diagnostics(&self) -> &CpuDiagnostics {
        &self.diagnostics
    }

    /// Completed or started OB1 cycles since startup.
    #[must_use]
    pub const fn cycle_count(&self) -> u64 {
        self.cycle
    }
}
