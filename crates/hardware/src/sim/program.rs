//! Program loading and validation.
//!
//! A program is a JSON document holding the initial register file, the
//! initial data memory and the instruction stream:
//!
//! ```json
//! {
//!   "registers": [0, 5, 7],
//!   "memory": [],
//!   "instructions": [
//!     { "op": "add", "dest": 3, "src1": 1, "src2": 2 },
//!     { "op": "bgt", "src1": 3, "src2": 1 },
//!     { "op": "sub", "dest": 4, "src1": 3, "imm": 1, "speculation": "taken" }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::error::{ProgramError, SimError};
use crate::config::Config;
use crate::core::sched::signals::{Instruction, OpClass};

/// Initial state and instruction stream.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    /// Initial register values from r0 upward; missing registers start at zero.
    #[serde(default)]
    pub registers: Vec<u64>,
    /// Initial memory words from address 0 upward.
    #[serde(default)]
    pub memory: Vec<u64>,
    /// Instructions in program order.
    pub instructions: Vec<Instruction>,
}

impl Program {
    /// Program with zeroed registers and memory.
    pub const fn new(instructions: Vec<Instruction>) -> Self {
        Self {
            registers: Vec::new(),
            memory: Vec::new(),
            instructions,
        }
    }

    /// Parses a JSON program.
    ///
    /// # Errors
    ///
    /// Returns [`ProgramError::Parse`] for malformed JSON.
    pub fn from_json(text: &str) -> Result<Self, ProgramError> {
        serde_json::from_str(text).map_err(|e| ProgramError::Parse(e.to_string()))
    }

    /// Reads and parses a JSON program from disk.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Io`] if the file cannot be read and
    /// [`SimError::Program`] if it cannot be parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let text = fs::read_to_string(path)?;
        Ok(Self::from_json(&text)?)
    }

    /// Checks the program against the configured register file and slot mix.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProgramError`] found, in program order.
    pub fn validate(&self, config: &Config) -> Result<(), ProgramError> {
        let num_regs = config.scheduler.num_regs;
        let mut seen_branch = false;
        for (index, insn) in self.instructions.iter().enumerate() {
            for reg in [insn.dest, insn.src1, insn.src2].into_iter().flatten() {
                if reg >= num_regs {
                    return Err(ProgramError::RegisterOutOfRange {
                        index,
                        reg,
                        num_regs,
                    });
                }
            }
            let op = insn.op.mnemonic();
            let missing = |operand| ProgramError::MissingOperand { index, op, operand };
            let class = insn.class();
            if insn.src1.is_none() {
                return Err(missing("src1"));
            }
            match class {
                OpClass::Alu | OpClass::Branch if insn.src2.is_none() && insn.imm.is_none() => {
                    return Err(missing("src2 or imm"));
                }
                OpClass::LoadStore if insn.op.writes_register() && insn.dest.is_none() => {
                    return Err(missing("dest"));
                }
                OpClass::LoadStore if !insn.op.writes_register() && insn.src2.is_none() => {
                    return Err(missing("src2"));
                }
                _ => {}
            }
            if class == OpClass::Alu && insn.dest.is_none() {
                return Err(missing("dest"));
            }
            if insn.speculation.is_some() && !seen_branch {
                return Err(ProgramError::OrphanSpeculation { index });
            }
            seen_branch |= class == OpClass::Branch;
            let slots = match class {
                OpClass::Alu => config.units.alu,
                OpClass::Branch => config.units.branch,
                OpClass::LoadStore => config.units.load_store,
            };
            if slots == 0 {
                return Err(ProgramError::NoUnitForClass {
                    index,
                    class: class.name(),
                });
            }
        }
        Ok(())
    }
}
