//! Configuration system for the scoreboard simulator.
//!
//! This module defines all configuration structures used to parameterize the
//! scheduler. It provides:
//! 1. **Defaults:** Baseline register-file size, FU mix, and execution latencies.
//! 2. **Structures:** Hierarchical config for scheduler, unit, latency and memory settings.
//! 3. **Validation:** Rejection of parameter combinations the scheduler cannot model.
//!
//! Configuration is supplied as JSON (`Config::from_json`) or use `Config::default()`.

use serde::Deserialize;

use crate::common::error::ConfigError;

/// Default configuration constants for the simulator.
///
/// These values define the baseline scheduler when not explicitly overridden
/// in a JSON configuration file.
mod defaults {
    /// Number of architectural registers.
    pub const NUM_REGS: usize = 8;

    /// Register width in bits.
    pub const REG_WIDTH: u32 = 64;

    /// Integer ALU slots.
    pub const ALU_UNITS: usize = 2;

    /// Branch unit slots.
    ///
    /// Only one branch may be unresolved at a time, so more than one slot only
    /// helps when branches are issued back to back.
    pub const BRANCH_UNITS: usize = 1;

    /// Load/store unit slots.
    pub const LOAD_STORE_UNITS: usize = 1;

    /// ADD latency in ticks.
    pub const LAT_ADD: u32 = 2;

    /// SUB latency in ticks.
    pub const LAT_SUB: u32 = 1;

    /// MUL latency in ticks.
    pub const LAT_MUL: u32 = 5;

    /// Right-shift latency in ticks.
    pub const LAT_SHR: u32 = 7;

    /// Branch comparison latency in ticks.
    pub const LAT_BRANCH: u32 = 5;

    /// Effective-address generation latency in ticks.
    pub const LAT_ADDRESS: u32 = 1;

    /// Data memory size in 64-bit words.
    pub const MEMORY_WORDS: usize = 256;

    /// Cycle limit after which a run is declared deadlocked.
    pub const MAX_CYCLES: u64 = 100_000;
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Run control and diagnostics.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Register file and hazard policy.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// FU slot mix.
    #[serde(default)]
    pub units: UnitConfig,
    /// Execution latencies.
    #[serde(default)]
    pub latency: LatencyConfig,
    /// Data memory.
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl Config {
    /// Parses and validates a JSON configuration.
    ///
    /// Missing fields take their defaults, so `{}` is the default config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and any error from
    /// [`Config::validate`].
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the scheduler can be built from this configuration.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.num_regs == 0 {
            return Err(ConfigError::NoRegisters);
        }
        if self.scheduler.reg_width == 0 || self.scheduler.reg_width > 64 {
            return Err(ConfigError::RegisterWidth(self.scheduler.reg_width));
        }
        if self.units.total() == 0 {
            return Err(ConfigError::NoUnits);
        }
        if let Some(name) = self.latency.first_zero() {
            return Err(ConfigError::ZeroLatency(name));
        }
        if !self.memory.words.is_power_of_two() {
            return Err(ConfigError::MemorySize(self.memory.words));
        }
        Ok(())
    }
}

/// Run control and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneralConfig {
    /// Log every grant, issue and die at `trace` level.
    #[serde(default)]
    pub trace: bool,

    /// Deadlock guard: give up after this many cycles.
    #[serde(default = "GeneralConfig::default_max_cycles")]
    pub max_cycles: u64,

    /// Run `Scoreboard::check_invariants` after every tick.
    #[serde(default)]
    pub check_invariants: bool,
}

impl GeneralConfig {
    const fn default_max_cycles() -> u64 {
        defaults::MAX_CYCLES
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            trace: false,
            max_cycles: defaults::MAX_CYCLES,
            check_invariants: false,
        }
    }
}

/// Register file and hazard policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SchedulerConfig {
    /// Number of architectural registers (matrix columns).
    #[serde(default = "SchedulerConfig::default_num_regs")]
    pub num_regs: usize,

    /// Register width in bits; results are truncated to it.
    #[serde(default = "SchedulerConfig::default_reg_width")]
    pub reg_width: u32,

    /// Refuse to issue an instruction whose destination already has a
    /// pending writer, instead of ordering the two writes.
    #[serde(default)]
    pub stall_on_waw: bool,

    /// Shadow every instruction by its immediate predecessor so results
    /// retire in issue order.
    #[serde(default = "SchedulerConfig::default_order_shadow")]
    pub order_shadow: bool,
}

impl SchedulerConfig {
    const fn default_num_regs() -> usize {
        defaults::NUM_REGS
    }

    const fn default_reg_width() -> u32 {
        defaults::REG_WIDTH
    }

    const fn default_order_shadow() -> bool {
        true
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            num_regs: defaults::NUM_REGS,
            reg_width: defaults::REG_WIDTH,
            stall_on_waw: false,
            order_shadow: true,
        }
    }
}

/// Number of FU slots per opcode class.
///
/// Slots are numbered ALUs first, then branch units, then load/store units;
/// the priority pickers favour lower numbers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UnitConfig {
    /// Integer ALU slots.
    #[serde(default = "UnitConfig::default_alu")]
    pub alu: usize,

    /// Branch unit slots.
    #[serde(default = "UnitConfig::default_branch")]
    pub branch: usize,

    /// Load/store unit slots.
    #[serde(default = "UnitConfig::default_load_store")]
    pub load_store: usize,
}

impl UnitConfig {
    const fn default_alu() -> usize {
        defaults::ALU_UNITS
    }

    const fn default_branch() -> usize {
        defaults::BRANCH_UNITS
    }

    const fn default_load_store() -> usize {
        defaults::LOAD_STORE_UNITS
    }

    /// Total number of FU slots.
    pub const fn total(&self) -> usize {
        self.alu + self.branch + self.load_store
    }
}

impl Default for UnitConfig {
    fn default() -> Self {
        Self {
            alu: defaults::ALU_UNITS,
            branch: defaults::BRANCH_UNITS,
            load_store: defaults::LOAD_STORE_UNITS,
        }
    }
}

/// Execution latencies in ticks, from `go_read` to result valid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LatencyConfig {
    /// ADD.
    #[serde(default = "LatencyConfig::default_add")]
    pub add: u32,
    /// SUB.
    #[serde(default = "LatencyConfig::default_sub")]
    pub sub: u32,
    /// MUL.
    #[serde(default = "LatencyConfig::default_mul")]
    pub mul: u32,
    /// Logical right shift.
    #[serde(default = "LatencyConfig::default_shr")]
    pub shr: u32,
    /// Branch comparisons.
    #[serde(default = "LatencyConfig::default_branch")]
    pub branch: u32,
    /// Load/store effective address.
    #[serde(default = "LatencyConfig::default_address")]
    pub address: u32,
}

impl LatencyConfig {
    const fn default_add() -> u32 {
        defaults::LAT_ADD
    }

    const fn default_sub() -> u32 {
        defaults::LAT_SUB
    }

    const fn default_mul() -> u32 {
        defaults::LAT_MUL
    }

    const fn default_shr() -> u32 {
        defaults::LAT_SHR
    }

    const fn default_branch() -> u32 {
        defaults::LAT_BRANCH
    }

    const fn default_address() -> u32 {
        defaults::LAT_ADDRESS
    }

    const fn first_zero(&self) -> Option<&'static str> {
        if self.add == 0 {
            Some("add")
        } else if self.sub == 0 {
            Some("sub")
        } else if self.mul == 0 {
            Some("mul")
        } else if self.shr == 0 {
            Some("shr")
        } else if self.branch == 0 {
            Some("branch")
        } else if self.address == 0 {
            Some("address")
        } else {
            None
        }
    }
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            add: defaults::LAT_ADD,
            sub: defaults::LAT_SUB,
            mul: defaults::LAT_MUL,
            shr: defaults::LAT_SHR,
            branch: defaults::LAT_BRANCH,
            address: defaults::LAT_ADDRESS,
        }
    }
}

/// Data memory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MemoryConfig {
    /// Size in 64-bit words; must be a power of two.
    #[serde(default = "MemoryConfig::default_words")]
    pub words: usize,
}

impl MemoryConfig {
    const fn default_words() -> usize {
        defaults::MEMORY_WORDS
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            words: defaults::MEMORY_WORDS,
        }
    }
}
