//! Scheduler statistics collection and reporting.
//!
//! This module tracks performance metrics for a simulation run. It provides:
//! 1. **Cycle and IPC:** Total cycles, issued and retired instructions.
//! 2. **Grants:** Pulses per lane (read, write, address, store).
//! 3. **Speculation:** Branches resolved, shadows confirmed, slots killed.
//! 4. **Stalls:** Refused issue attempts by reason.

use std::collections::HashMap;
use std::time::Instant;

use serde::Serialize;

use crate::core::sched::issue::StallReason;
use crate::core::sched::signals::TickOutputs;

/// Simulation statistics.
#[derive(Clone, Debug, Serialize)]
pub struct SchedStats {
    #[serde(skip)]
    start_time: Instant,
    /// Ticks simulated.
    pub cycles: u64,
    /// Instructions accepted by the issue unit.
    pub issued: u64,
    /// Instructions completed through `go_write` or `go_store`.
    pub retired: u64,
    /// Slots killed by die.
    pub killed: u64,
    /// Branch shadows confirmed.
    pub confirmed: u64,
    /// Branches resolved.
    pub branches_resolved: u64,
    /// Branches resolved taken.
    pub branches_taken: u64,
    /// Instructions discarded by the front end after their branch resolved against them.
    pub squashed_in_queue: u64,

    /// `go_read` pulses.
    pub grants_read: u64,
    /// `go_write` pulses.
    pub grants_write: u64,
    /// `go_addr` pulses.
    pub grants_addr: u64,
    /// `go_store` pulses.
    pub grants_store: u64,

    /// Refused issue attempts by reason name.
    pub stalls: HashMap<&'static str, u64>,
    /// Ticks the front end held an unconditional instruction behind an unresolved branch.
    pub stalls_frontend: u64,
    /// Ticks in which no slot was busy and nothing issued.
    pub idle_cycles: u64,
}

impl Default for SchedStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            cycles: 0,
            issued: 0,
            retired: 0,
            killed: 0,
            confirmed: 0,
            branches_resolved: 0,
            branches_taken: 0,
            squashed_in_queue: 0,
            grants_read: 0,
            grants_write: 0,
            grants_addr: 0,
            grants_store: 0,
            stalls: StallReason::ALL.iter().map(|r| (r.name(), 0)).collect(),
            stalls_frontend: 0,
            idle_cycles: 0,
        }
    }
}

/// Names of the sections accepted by [`SchedStats::print_sections`].
pub const STATS_SECTIONS: &[&str] = &["summary", "grants", "speculation", "stalls"];

impl SchedStats {
    /// Accumulates one tick's outputs.
    pub fn record(&mut self, out: &TickOutputs) {
        self.cycles += 1;
        self.issued += u64::from(out.issue_accepted);
        self.grants_read += out.go_read.count() as u64;
        self.grants_write += out.go_write.count() as u64;
        self.grants_addr += out.go_addr.count() as u64;
        self.grants_store += out.go_store.count() as u64;
        self.retired += (out.go_write.count() + out.go_store.count()) as u64;
        self.killed += out.die.count() as u64;
        self.confirmed += out.confirm.count() as u64;
        if let Some(taken) = out.branch_resolved {
            self.branches_resolved += 1;
            self.branches_taken += u64::from(taken);
        }
        if let Some(reason) = out.stall {
            *self.stalls.entry(reason.name()).or_default() += 1;
        }
        if out.busy.none() && !out.issue_accepted {
            self.idle_cycles += 1;
        }
    }

    /// Stall count for one reason.
    pub fn stalls_for(&self, reason: StallReason) -> u64 {
        self.stalls.get(reason.name()).copied().unwrap_or(0)
    }

    /// Retired instructions per cycle.
    pub fn ipc(&self) -> f64 {
        if self.cycles == 0 {
            0.0
        } else {
            self.retired as f64 / self.cycles as f64
        }
    }

    /// Prints every section.
    pub fn print(&self) {
        self.print_sections(&[]);
    }

    /// Prints only the requested sections to stdout.
    ///
    /// # Arguments
    ///
    /// * `sections` - Names from [`STATS_SECTIONS`], or empty for all.
    pub fn print_sections(&self, sections: &[String]) {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let seconds = self.start_time.elapsed().as_secs_f64();
        let cyc = self.cycles.max(1) as f64;

        if want("summary") {
            println!("\n==========================================================");
            println!("SCOREBOARD SIMULATION STATISTICS");
            println!("==========================================================");
            println!("host_seconds             {seconds:.4} s");
            println!("sim_cycles               {}", self.cycles);
            println!("sim_issued               {}", self.issued);
            println!("sim_retired              {}", self.retired);
            println!("sim_ipc                  {:.4}", self.ipc());
            println!(
                "idle_cycles              {} ({:.2}%)",
                self.idle_cycles,
                self.idle_cycles as f64 / cyc * 100.0
            );
            println!("----------------------------------------------------------");
        }
        if want("grants") {
            println!("GRANTS");
            println!("  go_read                {}", self.grants_read);
            println!("  go_write               {}", self.grants_write);
            println!("  go_addr                {}", self.grants_addr);
            println!("  go_store               {}", self.grants_store);
            println!("----------------------------------------------------------");
        }
        if want("speculation") {
            println!("SPECULATION");
            println!("  branches.resolved      {}", self.branches_resolved);
            println!("  branches.taken         {}", self.branches_taken);
            println!("  shadow.confirmed       {}", self.confirmed);
            println!("  shadow.killed          {}", self.killed);
            println!("  queue.squashed         {}", self.squashed_in_queue);
            println!("----------------------------------------------------------");
        }
        if want("stalls") {
            println!("ISSUE STALLS");
            for reason in StallReason::ALL {
                let count = self.stalls_for(reason);
                println!(
                    "  {:<22} {} ({:.2}%)",
                    reason.name(),
                    count,
                    count as f64 / cyc * 100.0
                );
            }
            println!(
                "  {:<22} {} ({:.2}%)",
                "frontend_hold",
                self.stalls_frontend,
                self.stalls_frontend as f64 / cyc * 100.0
            );
            println!("==========================================================");
        }
    }
}
