//! Program ingestion and assembly.
//!
//! A [`RawProgram`] is translated block by block into a [`Program`]: jump
//! labels become instruction indices, block and resource references are
//! checked against the program and the [`CpuSpecs`], and source traces are
//! moved into a per-block side-table.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::{lookup, MnemonicDialect};
use crate::config::{CpuConfig, CpuSpecs};
use crate::operand::{Addressing, Area, BlockKind, MemoryOperand, NumberRef, Operand};
use crate::translate::{translate, ParentTrace, RawInstruction, TranslationError, TypedInstruction};

/// Block type and number, e.g. `OB1` or `FC 12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct BlockId {
    /// Block type.
    pub kind: BlockKind,
    /// Block number.
    pub number: u16,
}

impl BlockId {
    /// Main cyclic organization block.
    pub const MAIN: Self = Self::ob(1);
    /// Startup organization blocks in the order they are tried.
    pub const STARTUP: [Self; 3] = [Self::ob(100), Self::ob(101), Self::ob(102)];

    /// Creates a block id.
    #[must_use]
    pub const fn new(kind: BlockKind, number: u16) -> Self {
        Self { kind, number }
    }

    /// Organization block `number`.
    #[must_use]
    pub const fn ob(number: u16) -> Self {
        Self::new(BlockKind::Ob, number)
    }

    /// Function `number`.
    #[must_use]
    pub const fn fc(number: u16) -> Self {
        Self::new(BlockKind::Fc, number)
    }

    /// Function block `number`.
    #[must_use]
    pub const fn fb(number: u16) -> Self {
        Self::new(BlockKind::Fb, number)
    }

    /// Data block `number`.
    #[must_use]
    pub const fn db(number: u16) -> Self {
        Self::new(BlockKind::Db, number)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.name(), self.number)
    }
}

/// Code block as delivered by the front end.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RawBlock {
    /// OB, FC or FB id.
    pub id: BlockId,
    /// Declared temporary (local) data size in bytes.
    pub local_bytes: u32,
    /// Instructions in source order.
    pub instructions: Vec<RawInstruction>,
}

/// Data block as delivered by the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RawDataBlock {
    /// Block number.
    pub number: u16,
    /// Length in bytes.
    pub length: u32,
    /// Initial contents; shorter than `length` means zero padding.
    pub init: Vec<u8>,
}

/// Complete front-end output.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RawProgram {
    /// Code blocks.
    pub blocks: Vec<RawBlock>,
    /// Data blocks.
    pub data_blocks: Vec<RawDataBlock>,
}

/// Translation failure located in the program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{block}{}: {error}", .index.map(|index| format!(" #{index}")).unwrap_or_default())]
pub struct AssemblyError {
    /// Block being assembled.
    pub block: BlockId,
    /// Instruction index, absent for block-level errors.
    pub index: Option<usize>,
    /// Underlying failure.
    #[source]
    pub error: TranslationError,
}

impl AssemblyError {
    const fn block_level(block: BlockId, error: TranslationError) -> Self {
        Self {
            block,
            index: None,
            error,
        }
    }

    const fn at(block: BlockId, index: usize, error: TranslationError) -> Self {
        Self {
            block,
            index: Some(index),
            error,
        }
    }
}

/// Assembled code block.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Block {
    id: BlockId,
    local_bytes: u32,
    instructions: Vec<TypedInstruction>,
    traces: Vec<ParentTrace>,
    labels: BTreeMap<String, usize>,
}

impl Block {
    /// Block id.
    #[must_use]
    pub const fn id(&self) -> BlockId {
        self.id
    }

    /// Declared local data size.
    #[must_use]
    pub const fn local_bytes(&self) -> u32 {
        self.local_bytes
    }

    /// Instruction array.
    #[must_use]
    pub fn instructions(&self) -> &[TypedInstruction] {
        &self.instructions
    }

    /// Instruction at `index`.
    #[must_use]
    pub fn instruction(&self, index: usize) -> Option<&TypedInstruction> {
        self.instructions.get(index)
    }

    /// Instruction count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// True for a block without instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Source trace of the instruction at `index`. Never read by execution.
    #[must_use]
    pub fn trace(&self, index: usize) -> Option<&ParentTrace> {
        self.traces.get(index)
    }

    /// Index of the instruction carrying `label`.
    #[must_use]
    pub fn label_index(&self, label: &str) -> Option<usize> {
        self.labels.get(&label.to_ascii_uppercase()).copied()
    }
}

/// Validated, executable program.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Program {
    blocks: BTreeMap<BlockId, Block>,
    data_blocks: Vec<RawDataBlock>,
    dialect: MnemonicDialect,
}

/// Mnemonics of `raw` that name different instructions in the two
/// dialects (`SE` is an on-delay timer in German and an extended pulse in
/// English), in order of first use.
#[must_use]
pub fn ambiguous_mnemonics(raw: &RawProgram) -> Vec<&str> {
    let mut seen = HashSet::new();
    raw.blocks
        .iter()
        .flat_map(|block| &block.instructions)
        .map(|instruction| instruction.mnemonic.as_str())
        .filter(|mnemonic| {
            matches!(
                (
                    lookup(mnemonic, MnemonicDialect::German),
                    lookup(mnemonic, MnemonicDialect::English),
                ),
                (Some(german), Some(english)) if german != english
            )
        })
        .filter(|mnemonic| seen.insert(mnemonic.to_ascii_uppercase()))
        .collect()
}

/// Picks the dialect with fewer unknown mnemonics; ties resolve to German.
///
/// A tie on a program using [`ambiguous_mnemonics`] is logged as a warning;
/// such programs should force the dialect through the config.
#[must_use]
pub fn detect_dialect(raw: &RawProgram) -> MnemonicDialect {
    let misses = |dialect| {
        raw.blocks
            .iter()
            .flat_map(|block| &block.instructions)
            .filter(|instruction| lookup(&instruction.mnemonic, dialect).is_none())
            .count()
    };
    let german = misses(MnemonicDialect::German);
    let english = misses(MnemonicDialect::English);
    if english < german {
        return MnemonicDialect::English;
    }
    if english == german {
        let ambiguous = ambiguous_mnemonics(raw);
        if !ambiguous.is_empty() {
            warn!(
                ?ambiguous,
                "mnemonic dialect is ambiguous, assuming German; set the dialect explicitly"
            );
        }
    }
    MnemonicDialect::German
}

impl Program {
    /// Translates and validates `raw`.
    ///
    /// # Errors
    ///
    /// Returns the first [`AssemblyError`] found: translation failures,
    /// duplicate blocks or labels, unresolved labels, references to missing
    /// blocks, resource numbers beyond `specs`, or a missing OB1.
    pub fn assemble(
        raw: &RawProgram,
        config: &CpuConfig,
        specs: &CpuSpecs,
    ) -> Result<Self, AssemblyError> {
        let dialect = config
            .mnemonics()
            .forced()
            .unwrap_or_else(|| detect_dialect(raw));

        let mut data_blocks = Vec::with_capacity(raw.data_blocks.len());
        let mut seen_data = HashSet::new();
        for data_block in &raw.data_blocks {
            let id = BlockId::db(data_block.number);
            if data_block.number == 0 || !seen_data.insert(data_block.number) {
                return Err(AssemblyError::block_level(
                    id,
                    TranslationError::DuplicateBlock(id),
                ));
            }
            data_blocks.push(data_block.clone());
        }

        let code_ids: HashMap<BlockId, u32> = raw
            .blocks
            .iter()
            .map(|block| (block.id, block.local_bytes))
            .collect();
        let mut blocks = BTreeMap::new();
        for raw_block in &raw.blocks {
            if !raw_block.id.kind.is_code() {
                return Err(AssemblyError::block_level(
                    raw_block.id,
                    TranslationError::UnknownBlock(raw_block.id),
                ));
            }
            if blocks.contains_key(&raw_block.id) {
                return Err(AssemblyError::block_level(
                    raw_block.id,
                    TranslationError::DuplicateBlock(raw_block.id),
                ));
            }
            if raw_block.id.kind == BlockKind::Ob && raw_block.local_bytes > specs.local_data_bytes()
            {
                return Err(AssemblyError::block_level(
                    raw_block.id,
                    TranslationError::OperandOutOfRange {
                        what: "OB local data bytes",
                        value: raw_block.local_bytes,
                        limit: specs.local_data_bytes(),
                    },
                ));
            }
            let references = References {
                code: &code_ids,
                data: &seen_data,
                specs,
                local_bytes: raw_block.local_bytes,
            };
            let block = assemble_block(raw_block, dialect, config, &references)?;
            blocks.insert(raw_block.id, block);
        }
        if !blocks.contains_key(&BlockId::MAIN) {
            return Err(AssemblyError::block_level(
                BlockId::MAIN,
                TranslationError::MissingMainBlock,
            ));
        }
        debug!(
            blocks = blocks.len(),
            data_blocks = data_blocks.len(),
            %dialect,
            "program assembled"
        );
        Ok(Self {
            blocks,
            data_blocks,
            dialect,
        })
    }

    /// Looks up a code block.
    #[must_use]
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(&id)
    }

    /// Code blocks ordered by id.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    /// OB1.
    #[must_use]
    pub fn main_block(&self) -> Option<&Block> {
        self.block(BlockId::MAIN)
    }

    /// First present startup OB (OB100, OB101, OB102).
    #[must_use]
    pub fn startup_block(&self) -> Option<&Block> {
        BlockId::STARTUP.iter().find_map(|id| self.block(*id))
    }

    /// Data blocks with their initial contents.
    #[must_use]
    pub fn data_blocks(&self) -> &[RawDataBlock] {
        &self.data_blocks
    }

    /// Dialect the program was translated in.
    #[must_use]
    pub const fn dialect(&self) -> MnemonicDialect {
        self.dialect
    }
}

struct References<'a> {
    code: &'a HashMap<BlockId, u32>,
    data: &'a HashSet<u16>,
    specs: &'a CpuSpecs,
    local_bytes: u32,
}

impl References<'_> {
    fn check(&self, operand: &Operand) -> Result<(), TranslationError> {
        match operand {
            Operand::Timer(NumberRef::Direct(number)) => {
                within("timer", u32::from(*number), u32::from(self.specs.timer_count()))
            }
            Operand::Counter(NumberRef::Direct(number)) => within(
                "counter",
                u32::from(*number),
                u32::from(self.specs.counter_count()),
            ),
            Operand::Block {
                kind,
                number: NumberRef::Direct(number),
            } => self.check_block(*kind, *number),
            Operand::Memory(memory) => self.check_memory(memory),
            Operand::Accu(index) => within(
                "accumulator",
                u32::from(*index),
                u32::from(self.specs.accu_count()) + 1,
            ),
            _ => Ok(()),
        }
    }

    fn check_block(&self, kind: BlockKind, number: u16) -> Result<(), TranslationError> {
        let id = BlockId::new(kind, number);
        let known = match kind {
            BlockKind::Db | BlockKind::Di => self.data.contains(&number),
            BlockKind::Ob | BlockKind::Fc | BlockKind::Fb => self.code.contains_key(&id),
        };
        if known {
            Ok(())
        } else {
            Err(TranslationError::UnknownBlock(BlockId::new(
                if kind == BlockKind::Di {
                    BlockKind::Db
                } else {
                    kind
                },
                number,
            )))
        }
    }

    fn check_memory(&self, memory: &MemoryOperand) -> Result<(), TranslationError> {
        if let Some(db) = memory.db {
            self.check_block(BlockKind::Db, db)?;
        }
        let (Some(area), Addressing::Direct(address)) = (memory.area, memory.addressing) else {
            return Ok(());
        };
        let (what, size) = match area {
            Area::Input | Area::PeripheralInput => ("input byte", self.specs.input_bytes()),
            Area::Output | Area::PeripheralOutput => ("output byte", self.specs.output_bytes()),
            Area::Flag => ("flag byte", self.specs.flag_bytes()),
            Area::Local => ("local byte", self.local_bytes),
            Area::DataBlock | Area::InstanceDb => return Ok(()),
        };
        let end = address.byte.saturating_add(memory.width.bytes());
        if end > size {
            return Err(TranslationError::OperandOutOfRange {
                what,
                value: address.byte,
                limit: size,
            });
        }
        Ok(())
    }
}

const fn within(what: &'static str, value: u32, limit: u32) -> Result<(), TranslationError> {
    if value < limit {
        Ok(())
    } else {
        Err(TranslationError::OperandOutOfRange { what, value, limit })
    }
}

fn assemble_block(
    raw: &RawBlock,
    dialect: MnemonicDialect,
    config: &CpuConfig,
    references: &References<'_>,
) -> Result<Block, AssemblyError> {
    let id = raw.id;
    let mut instructions = Vec::with_capacity(raw.instructions.len());
    let mut traces = Vec::with_capacity(raw.instructions.len());
    let mut labels = BTreeMap::new();

    for (index, instruction) in raw.instructions.iter().enumerate() {
        let translated = translate(instruction.clone(), dialect, config.extended_insns_enabled())
            .map_err(|error| AssemblyError::at(id, index, error))?;
        if let Some(label) = translated.label {
            if labels.insert(label.clone(), index).is_some() {
                return Err(AssemblyError::at(
                    id,
                    index,
                    TranslationError::DuplicateLabel(label),
                ));
            }
        }
        for operand in &translated.instruction.operands {
            references
                .check(operand)
                .map_err(|error| AssemblyError::at(id, index, error))?;
        }
        instructions.push(translated.instruction);
        traces.push(translated.trace);
    }

    for (index, instruction) in instructions.iter_mut().enumerate() {
        for operand in &mut instruction.operands {
            if let Operand::Label(label) = operand {
                let target = *labels.get(label.as_str()).ok_or_else(|| {
                    AssemblyError::at(id, index, TranslationError::UnresolvedLabel(label.clone()))
                })?;
                *operand = Operand::Target {
                    label: std::mem::take(label),
                    index: target,
                };
            }
        }
    }

    Ok(Block {
        id,
        local_bytes: raw.local_bytes,
        instructions,
        traces,
        labels,
    })
}
