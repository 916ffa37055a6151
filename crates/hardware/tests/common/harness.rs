use scoreboard_core::Scoreboard;
use scoreboard_core::common::RegisterFile;
use scoreboard_core::config::Config;
use scoreboard_core::core::sched::signals::{Instruction, TickInputs, TickOutputs};
use scoreboard_core::core::sched::traits::DataMemory;
use scoreboard_core::core::units::FlatMemory;
use tracing_subscriber::EnvFilter;

/// Installs a test-writer subscriber once; `RUST_LOG` selects the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A scoreboard with its register file and memory, driven tick by tick.
#[derive(Debug)]
pub struct TestContext {
    pub sb: Scoreboard,
    pub rf: RegisterFile,
    pub mem: FlatMemory,
    pub history: Vec<TickOutputs>,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    pub fn with_config(config: &Config) -> Self {
        init_tracing();
        Self {
            sb: Scoreboard::new(config),
            rf: RegisterFile::new(config.scheduler.num_regs, config.scheduler.reg_width),
            mem: FlatMemory::new(config.memory.words),
            history: Vec::new(),
        }
    }

    pub fn with_regs(mut self, values: &[u64]) -> Self {
        for (i, v) in values.iter().enumerate() {
            self.rf.write(i, *v);
        }
        self
    }

    pub fn with_memory(mut self, words: &[u64]) -> Self {
        for (addr, v) in words.iter().enumerate() {
            self.mem.write(addr as u64, *v);
        }
        self
    }

    /// Runs one tick and applies the register write and store it granted.
    pub fn step(&mut self, inputs: &TickInputs) -> TickOutputs {
        let out = self.sb.tick(inputs, &self.rf, &self.mem);
        if let Some(value) = out.result {
            self.rf.write_port(&out.wen, value);
        }
        if let Some((addr, data)) = out.store {
            self.mem.write(addr, data);
        }
        assert_eq!(
            self.sb.check_invariants(),
            Ok(()),
            "after tick {}",
            self.history.len()
        );
        self.history.push(out.clone());
        out
    }

    /// Offers `insn` for issue.
    pub fn issue(&mut self, insn: Instruction) -> TickOutputs {
        let n = self.sb.num_fus();
        self.step(&TickInputs::with_issue(n, insn))
    }

    /// Ticks with no input.
    pub fn idle(&mut self) -> TickOutputs {
        let n = self.sb.num_fus();
        self.step(&TickInputs::idle(n))
    }

    /// Ticks with an external die request for `fus`.
    pub fn flush(&mut self, fus: &[usize]) -> TickOutputs {
        let n = self.sb.num_fus();
        let mut inputs = TickInputs::idle(n);
        inputs.flush = scoreboard_core::common::Mask::from_indices(n, fus.iter().copied());
        self.step(&inputs)
    }

    /// Ticks until every slot is free; returns the number of ticks taken.
    pub fn drain(&mut self, limit: usize) -> usize {
        for t in 0..limit {
            if self.sb.is_idle() {
                return t;
            }
            let _ = self.idle();
        }
        panic!("scoreboard did not drain within {limit} ticks");
    }

    pub fn reg(&self, r: usize) -> u64 {
        self.rf.read(r)
    }
}
