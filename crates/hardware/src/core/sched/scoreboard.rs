//! Top-level scoreboard.
//!
//! Wires the register matrix, FU-FU matrix, memory ordering matrix, shadow
//! matrix, issue unit and computation units into one scheduler advanced by
//! [`Scoreboard::tick`]. Each tick runs in two phases:
//!
//! 1. **Combinational:** readiness, grants, branch resolution, the die set and
//!    the issue decision are all derived from the state latched at the end of
//!    the previous tick. Nothing written in this phase is read back in it.
//! 2. **Latch:** every hazard cell, shadow bit and computation-unit latch is
//!    committed exactly once; the new state is visible from the next tick.

use tracing::{debug, trace};

use super::compunit::{ComputationUnit, CuPulses, FuState, Operands};
use super::dep_matrix::{Port, RegDepMatrix};
use super::fu_matrix::{FuCapture, FuDepMatrix};
use super::issue::{DecodedRegs, IssueContext, IssueDecision, IssueUnit};
use super::mem_matrix::{AddrMatch, MemDepMatrix};
use super::pending::GlobalPending;
use super::picker::{GroupPicker, PriorityPicker};
use super::shadow::{Resolution, ShadowIssue, ShadowLatch, ShadowMatrix};
use super::signals::{Instruction, OpClass, Operation, TickInputs, TickOutputs};
use super::traits::{DataMemory, ExecutionUnit};
use crate::common::error::{Lane, ProtocolViolation};
use crate::common::mask::Mask;
use crate::common::reg::RegisterFile;
use crate::config::Config;
use crate::core::units::build_unit;

/// Everything decided about an accepted instruction before the latch phase.
struct Accepted {
    fu: usize,
    insn: Instruction,
    regs: DecodedRegs,
    fu_deps: FuCapture,
    mem_deps: Option<Mask>,
    shadow: ShadowIssue,
}

/// Out-of-order instruction scheduler.
#[derive(Debug)]
pub struct Scoreboard {
    num_regs: usize,
    units: Vec<ComputationUnit>,
    regs: RegDepMatrix,
    fus: FuDepMatrix,
    mem: MemDepMatrix,
    addr_match: AddrMatch,
    shadow: ShadowMatrix,
    issue: IssueUnit,
    fault: Option<ProtocolViolation>,
}

impl Scoreboard {
    /// Builds a scoreboard with the execution units described by `config`.
    ///
    /// Slots are numbered ALUs first, then branch units, then load/store units.
    pub fn new(config: &Config) -> Self {
        let units = slot_classes(config)
            .into_iter()
            .map(|class| (class, build_unit(class, config)))
            .collect();
        Self::with_units(config, units)
    }

    /// Builds a scoreboard around caller-supplied execution units, one per slot.
    ///
    /// The unit counts in `config` are ignored; the slot mix is taken from `units`.
    pub fn with_units(
        config: &Config,
        units: Vec<(OpClass, Box<dyn ExecutionUnit>)>,
    ) -> Self {
        let num_regs = config.scheduler.num_regs;
        let classes: Vec<OpClass> = units.iter().map(|(c, _)| *c).collect();
        let n = classes.len();
        Self {
            num_regs,
            units: units
                .into_iter()
                .map(|(class, unit)| ComputationUnit::new(class, unit))
                .collect(),
            regs: RegDepMatrix::new(n, num_regs),
            fus: FuDepMatrix::new(n),
            mem: MemDepMatrix::new(n),
            addr_match: AddrMatch::new(config.memory.words),
            shadow: ShadowMatrix::new(n, config.scheduler.order_shadow),
            issue: IssueUnit::new(&classes, num_regs, config.scheduler.stall_on_waw),
            fault: None,
        }
    }

    /// Number of FU slots.
    pub fn num_fus(&self) -> usize {
        self.units.len()
    }

    /// Number of registers tracked.
    pub const fn num_regs(&self) -> usize {
        self.num_regs
    }

    /// Computation unit in slot `fu`.
    pub fn unit(&self, fu: usize) -> &ComputationUnit {
        &self.units[fu]
    }

    /// Phase of slot `fu`.
    pub fn state(&self, fu: usize) -> FuState {
        self.units[fu].state()
    }

    /// Latched busy flags (`busy_o`).
    pub fn busy(&self) -> Mask {
        self.slots_where(ComputationUnit::busy)
    }

    /// `true` when no slot is busy.
    pub fn is_idle(&self) -> bool {
        self.units.iter().all(|u| !u.busy())
    }

    /// Register dependency matrix.
    pub const fn reg_matrix(&self) -> &RegDepMatrix {
        &self.regs
    }

    /// FU-FU dependency matrix.
    pub const fn fu_matrix(&self) -> &FuDepMatrix {
        &self.fus
    }

    /// Shadow matrix and speculation record.
    pub const fn shadow(&self) -> &ShadowMatrix {
        &self.shadow
    }

    /// Issue unit.
    pub const fn issue_unit(&self) -> &IssueUnit {
        &self.issue
    }

    /// System-wide register pending vectors.
    pub fn global_pending(&self) -> GlobalPending {
        GlobalPending::compute(&self.regs)
    }

    fn slots_where(&self, f: impl Fn(&ComputationUnit) -> bool) -> Mask {
        let n = self.num_fus();
        Mask::from_indices(n, (0..n).filter(|&fu| f(&self.units[fu])))
    }

    /// Slots allowed to request `go_read`: operands outstanding and no earlier
    /// writer of any source still pending.
    pub fn readable(&self) -> Mask {
        self.slots_where(ComputationUnit::awaiting_read)
            .and(&self.fus.read_clear())
    }

    /// Slots allowed to request `go_write`: operands read, no earlier reader or
    /// writer of the destination outstanding, and free of every shadow.
    pub fn writable(&self) -> Mask {
        self.slots_where(|u| u.busy() && !u.awaiting_read())
            .and(&self.fus.write_clear())
            .and(&self.shadow.shadow_free())
    }

    /// Slots holding a valid result.
    pub fn release_request(&self) -> Mask {
        self.slots_where(ComputationUnit::release_request)
    }

    /// Advances the scheduler by one tick.
    ///
    /// # Arguments
    ///
    /// * `inputs` - Instruction offered for issue and external die requests.
    /// * `rf` - Register file contents at the end of the previous tick.
    /// * `dmem` - Data memory contents at the end of the previous tick.
    ///
    /// # Returns
    ///
    /// The grant pulses and buses of this tick. The caller applies `wen`/`result`
    /// to the register file and `store` to memory before the next tick.
    pub fn tick(
        &mut self,
        inputs: &TickInputs,
        rf: &RegisterFile,
        dmem: &dyn DataMemory,
    ) -> TickOutputs {
        let n = self.num_fus();
        let busy = self.busy();
        let pending = self.global_pending();
        let ext_die = inputs.flush.and(&busy);
        let live = ext_die.not();

        // Readiness.
        let readable = self.readable().and(&live);
        let writable = self.writable().and(&live);
        let release = self.release_request();
        let addrs: Vec<Option<u64>> = self
            .units
            .iter()
            .map(ComputationUnit::memory_address)
            .collect();
        let mem_clear = self.mem.clear(&self.addr_match.matrix(&addrs));
        let stores = self.slots_where(|u| u.is_op(Operation::Store));
        let addr_ready = self
            .slots_where(ComputationUnit::address_ready)
            .and(&live)
            .and(&stores.or(&mem_clear));
        let store_ready = self
            .slots_where(ComputationUnit::store_request)
            .and(&live)
            .and(&mem_clear)
            .and(&self.shadow.shadow_free());

        // Grants.
        let group = GroupPicker::pick(&readable, &writable, &release);
        let go_read = group.go_read;
        let go_write = group.go_write;
        let go_addr = PriorityPicker::pick(&addr_ready);
        let go_store = PriorityPicker::pick(&store_ready);
        self.check_grants(&busy, &go_read, &go_write, &go_addr, &go_store);

        // Branch resolution and die.
        let branch_fu = self.shadow.record().branch_fu();
        let branch_active = self.shadow.record().branch_active();
        let resolution: Option<Resolution> = branch_fu
            .filter(|&b| branch_active && go_write.get(b))
            .map(|b| {
                let taken = self.units[b].result().is_some_and(|v| v != 0);
                debug!(fu = b, taken, "branch resolved");
                self.shadow.resolve(taken)
            });
        let no_confirm = Mask::new(n);
        let confirm_seed = resolution.as_ref().map_or(&no_confirm, |r| &r.confirm);
        let kill = resolution
            .as_ref()
            .map_or_else(|| Mask::new(n), |r| r.kill.clone());
        let die = self.shadow.die_closure(&ext_die.or(&kill), confirm_seed, &busy);
        let confirm = confirm_seed.and_not(&die);
        let retire = go_write.or(&go_store);
        let splices = self.shadow.splices(&die, &retire, &busy);
        if die.any() {
            debug!(%die, %confirm, "die");
        }

        // Issue.
        let write_pending = self.regs.write_pending_regs();
        let mut stall = None;
        let mut accepted = None;
        if let Some(insn) = inputs.issue.as_ref() {
            let ctx = IssueContext {
                busy: &busy,
                write_pending: &write_pending,
                branch_active,
                resolving: resolution.is_some() || branch_fu.is_some_and(|b| die.get(b)),
            };
            match self.issue.decide(insn, &ctx) {
                IssueDecision::Accept { fu, regs } => {
                    let a = self.prepare_issue(
                        fu, insn, regs, &go_read, &go_write, &die, &retire, &busy,
                    );
                    trace!(fu, %insn, pred = ?a.shadow.pred, "issue");
                    accepted = Some(a);
                }
                IssueDecision::Stall(reason) => {
                    trace!(%insn, ?reason, "issue stalled");
                    stall = Some(reason);
                }
            }
        }

        // Register file and memory buses.
        let ren = [self.regs.ren(Port::Src1, &go_read), self.regs.ren(Port::Src2, &go_read)];
        let wen = self.regs.wen(&go_write);
        let read = PriorityPicker::winner(&go_read).map(|fu| (fu, self.operands(fu, &ren, rf)));
        let writer = PriorityPicker::winner(&go_write);
        let result = writer.and_then(|fu| self.units[fu].result());
        let addr = PriorityPicker::winner(&go_addr).map(|fu| {
            let loaded = if self.units[fu].is_op(Operation::Load) {
                self.units[fu].effective_address().map(|a| dmem.read(a))
            } else {
                None
            };
            (fu, loaded)
        });
        let store =
            PriorityPicker::winner(&go_store).and_then(|fu| self.units[fu].store_bus());
        if let Some(fu) = writer {
            trace!(fu, %wen, ?result, "go_write");
        }
        if let Some((fu, ops)) = read {
            trace!(fu, a = ops.a, b = ops.b, "go_read");
        }

        let outputs = TickOutputs {
            go_read: go_read.clone(),
            go_write: go_write.clone(),
            go_addr: go_addr.clone(),
            go_store: go_store.clone(),
            ren,
            wen,
            result,
            store,
            die: die.clone(),
            confirm,
            branch_resolved: resolution.as_ref().map(|r| r.taken),
            readable,
            writable,
            busy,
            pending,
            issue_accepted: accepted.is_some(),
            issued_fu: accepted.as_ref().map(|a| a.fu),
            stall,
        };

        // Latch phase.
        let retire_or_die = retire.or(&die);
        self.regs.latch(
            accepted.as_ref().map(|a| (a.fu, &a.regs)),
            &go_read.or(&retire_or_die),
            &retire_or_die,
        );
        self.fus.latch(
            accepted.as_ref().map(|a| (a.fu, &a.fu_deps)),
            &go_read,
            &go_write,
            &retire_or_die,
            &die,
        );
        self.mem.latch(
            accepted
                .as_ref()
                .and_then(|a| a.mem_deps.as_ref().map(|m| (a.fu, m))),
            &retire_or_die,
        );
        self.shadow.latch(&ShadowLatch {
            issue: accepted.as_ref().map(|a| a.shadow),
            resolution: resolution.as_ref(),
            die: &die,
            retire: &retire,
            splices: &splices,
        });
        for fu in 0..n {
            let pulses = CuPulses {
                issue: accepted.as_ref().filter(|a| a.fu == fu).map(|a| &a.insn),
                go_read: read.filter(|(r, _)| *r == fu).map(|(_, ops)| ops),
                go_addr: go_addr.get(fu),
                loaded: addr.filter(|(a, _)| *a == fu).and_then(|(_, l)| l),
                go_write: go_write.get(fu),
                go_store: go_store.get(fu),
                die: die.get(fu),
            };
            self.units[fu].latch(&pulses);
        }

        outputs
    }

    /// Captures the hazards of an instruction accepted into slot `fu`.
    ///
    /// The issue groups only pick free slots, so `fu` is never busy here.
    #[allow(clippy::too_many_arguments)]
    fn prepare_issue(
        &self,
        fu: usize,
        insn: &Instruction,
        regs: DecodedRegs,
        go_read: &Mask,
        go_write: &Mask,
        die: &Mask,
        retire: &Mask,
        busy: &Mask,
    ) -> Accepted {
        debug_assert!(!busy.get(fu), "issue picked busy slot {fu}");
        let fu_deps =
            FuCapture::capture(&self.regs, &regs, &go_read.or(die), &go_write.or(die));
        let mem_deps = (insn.class() == OpClass::LoadStore).then(|| {
            let gone = retire.or(die);
            let loads = self.slots_where(|u| u.is_op(Operation::Load));
            let stores = self.slots_where(|u| u.is_op(Operation::Store));
            MemDepMatrix::capture(
                insn.op == Operation::Store,
                &loads.and_not(&gone),
                &stores.and_not(&gone),
            )
        });
        let shadow = ShadowIssue {
            fu,
            pred: self.shadow.issue_predecessor(busy, die, retire),
            tag: insn.speculation,
            is_branch: insn.class() == OpClass::Branch,
        };
        Accepted {
            fu,
            insn: insn.clone(),
            regs,
            fu_deps,
            mem_deps,
            shadow,
        }
    }

    /// Operands of slot `fu`, read through this tick's read enables.
    fn operands(&self, fu: usize, ren: &[Mask; 2], rf: &RegisterFile) -> Operands {
        let Some(insn) = self.units[fu].instruction() else {
            return Operands::default();
        };
        let a = rf.read_port(&ren[0]).unwrap_or(0);
        let src2 = rf.read_port(&ren[1]).unwrap_or(0);
        match insn.class() {
            OpClass::Alu | OpClass::Branch => Operands {
                a,
                b: insn.imm.unwrap_or(src2),
                data: 0,
            },
            OpClass::LoadStore => Operands {
                a,
                b: insn.imm.unwrap_or(0),
                data: src2,
            },
        }
    }

    /// Keeps the first violation seen; later ones are usually its consequences.
    fn record_fault(&mut self, violation: ProtocolViolation) {
        if self.fault.is_none() {
            self.fault = Some(violation);
        }
    }

    /// Records any grant the pickers should never have produced. A register
    /// with two writers is reported ahead of the lane that granted them.
    fn check_grants(
        &mut self,
        busy: &Mask,
        go_read: &Mask,
        go_write: &Mask,
        go_addr: &Mask,
        go_store: &Mask,
    ) {
        let dest = self.regs.grid(Port::Dest);
        let contended: Vec<usize> = (0..self.num_regs)
            .filter(|&reg| {
                go_write
                    .iter_ones()
                    .filter(|&fu| dest.get(fu, reg))
                    .count()
                    > 1
            })
            .collect();
        for reg in contended {
            self.record_fault(ProtocolViolation::MultipleWriters { reg });
        }
        for (lane, grant) in [
            (Lane::Read, go_read),
            (Lane::Write, go_write),
            (Lane::Address, go_addr),
            (Lane::Store, go_store),
        ] {
            if grant.count() > 1 {
                self.record_fault(ProtocolViolation::MultipleGrants {
                    lane,
                    count: grant.count(),
                });
            }
            if let Some(fu) = grant.and_not(busy).first_one() {
                self.record_fault(ProtocolViolation::GrantToIdleUnit { lane, fu });
            }
        }
    }

    /// Verifies the structural invariants of the latched state.
    ///
    /// # Errors
    ///
    /// Returns the first violation recorded during a tick, otherwise the first
    /// slot whose busy flag disagrees with its hazard row or whose order chain
    /// forks.
    pub fn check_invariants(&self) -> Result<(), ProtocolViolation> {
        if let Some(v) = &self.fault {
            return Err(v.clone());
        }
        for fu in 0..self.num_fus() {
            let busy = self.units[fu].busy();
            let row = self.regs.row_pending(fu)
                || self.fus.row_pending(fu)
                || self.mem.row_pending(fu)
                || self.shadow.row_pending(fu);
            if busy != row {
                return Err(ProtocolViolation::BusyRowMismatch { fu, busy, row });
            }
            if self.shadow.order_fan_in(fu) > 1 {
                return Err(ProtocolViolation::OrderChainFork { fu });
            }
        }
        Ok(())
    }
}

/// Class of every slot described by `config`, in slot order.
pub fn slot_classes(config: &Config) -> Vec<OpClass> {
    let u = &config.units;
    std::iter::repeat_n(OpClass::Alu, u.alu)
        .chain(std::iter::repeat_n(OpClass::Branch, u.branch))
        .chain(std::iter::repeat_n(OpClass::LoadStore, u.load_store))
        .collect()
}
