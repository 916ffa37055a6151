//! Tick-driven simulator.
//!
//! Owns a [`Scoreboard`] together with the collaborators it treats as external
//! (register file, data memory, instruction queue) and performs the caller's
//! half of the tick protocol: offer the queue head, tick, then apply the
//! register write and store the scheduler granted.

use tracing::{debug, info, trace, warn};

use super::program::Program;
use super::queue::{InstructionQueue, Offer};
use crate::common::error::SimError;
use crate::common::mask::Mask;
use crate::common::reg::RegisterFile;
use crate::config::Config;
use crate::core::sched::Scoreboard;
use crate::core::sched::signals::{TickInputs, TickOutputs};
use crate::core::sched::traits::DataMemory;
use crate::core::units::FlatMemory;
use crate::stats::SchedStats;

/// Scoreboard plus register file, memory and instruction queue.
#[derive(Debug)]
pub struct Simulator {
    scoreboard: Scoreboard,
    regs: RegisterFile,
    memory: FlatMemory,
    queue: InstructionQueue,
    stats: SchedStats,
    config: Config,
    pending_flush: Mask,
}

impl Simulator {
    /// Validates `config` and `program` and builds a simulator ready to run.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] or [`SimError::Program`] when validation fails.
    pub fn new(config: Config, program: Program) -> Result<Self, SimError> {
        config.validate()?;
        program.validate(&config)?;
        let scoreboard = Scoreboard::new(&config);
        let mut regs = RegisterFile::new(config.scheduler.num_regs, config.scheduler.reg_width);
        for (i, v) in program.registers.iter().enumerate() {
            regs.write(i, *v);
        }
        let memory = FlatMemory::with_contents(config.memory.words, &program.memory);
        let pending_flush = Mask::new(scoreboard.num_fus());
        Ok(Self {
            scoreboard,
            regs,
            memory,
            queue: InstructionQueue::new(program.instructions),
            stats: SchedStats::default(),
            config,
            pending_flush,
        })
    }

    /// Scheduler.
    pub const fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    /// Register file.
    pub const fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    /// Data memory.
    pub const fn memory(&self) -> &FlatMemory {
        &self.memory
    }

    /// Instructions not yet issued.
    pub const fn queue(&self) -> &InstructionQueue {
        &self.queue
    }

    /// Statistics so far.
    pub const fn stats(&self) -> &SchedStats {
        &self.stats
    }

    /// Active configuration.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Requests that the slots in `fus` die on the next tick.
    ///
    /// Killed instructions are not replayed.
    pub fn flush(&mut self, fus: &Mask) {
        self.pending_flush.or_assign(fus);
    }

    /// `true` when the queue is drained and no slot is busy.
    pub fn is_done(&self) -> bool {
        self.queue.is_empty() && self.scoreboard.is_idle()
    }

    /// Advances one tick.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Protocol`] if invariant checking is enabled and the
    /// latched state is inconsistent.
    pub fn tick(&mut self) -> Result<TickOutputs, SimError> {
        let n = self.scoreboard.num_fus();
        let record = self.scoreboard.shadow().record();
        let branch_active = record.branch_active();
        let branch_fu = record.branch_fu();

        let mut inputs = TickInputs::idle(n);
        inputs.flush = std::mem::replace(&mut self.pending_flush, Mask::new(n));
        match self.queue.offer(branch_active) {
            Offer::Issue(insn) => inputs.issue = Some(insn),
            Offer::Hold => {
                trace!("front end holding behind unresolved branch");
                self.stats.stalls_frontend += 1;
            }
            Offer::Empty => {}
        }

        let out = self.scoreboard.tick(&inputs, &self.regs, &self.memory);

        if out.issue_accepted {
            let _ = self.queue.pop();
        }
        if let Some(value) = out.result {
            self.regs.write_port(&out.wen, value);
        }
        if let Some((addr, data)) = out.store {
            self.memory.write(addr, data);
        }
        let squashed = if let Some(taken) = out.branch_resolved {
            self.queue.resolve(taken)
        } else if branch_fu.is_some_and(|b| out.die.get(b)) {
            self.queue.abandon()
        } else {
            0
        };
        if squashed > 0 {
            trace!(squashed, remaining = self.queue.qlen(), "queue squashed");
        }
        self.stats.squashed_in_queue += squashed as u64;
        self.stats.record(&out);

        if self.config.general.trace {
            info!(
                cycle = self.stats.cycles,
                busy = %out.busy,
                go_read = %out.go_read,
                go_write = %out.go_write,
                die = %out.die,
                issued = ?out.issued_fu,
                "tick"
            );
        }
        if self.config.general.check_invariants || cfg!(feature = "always-check") {
            self.scoreboard
                .check_invariants()
                .map_err(|violation| SimError::Protocol {
                    cycle: self.stats.cycles,
                    violation,
                })?;
        }
        Ok(out)
    }

    /// Runs until the program drains.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Timeout`] if the run exceeds `general.max_cycles`,
    /// or any error from [`Simulator::tick`].
    pub fn run(&mut self) -> Result<(), SimError> {
        debug!(
            instructions = self.queue.qlen(),
            fus = self.scoreboard.num_fus(),
            "run start"
        );
        while !self.is_done() {
            if self.stats.cycles >= self.config.general.max_cycles {
                warn!(
                    cycles = self.stats.cycles,
                    queued = self.queue.qlen(),
                    busy = %self.scoreboard.busy(),
                    "cycle limit reached"
                );
                return Err(SimError::Timeout {
                    cycles: self.stats.cycles,
                });
            }
            let _ = self.tick()?;
        }
        info!(
            cycles = self.stats.cycles,
            retired = self.stats.retired,
            ipc = self.stats.ipc(),
            "run complete"
        );
        Ok(())
    }
}
