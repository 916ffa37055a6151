//! Computation unit: the per-slot latch set and request/grant handshake.
//!
//! Each FU slot owns one `ComputationUnit`. Its latches form a "revolving
//! door": each grant resets the latch that requested it and sets the next one.
//!
//! | latch  | set by                         | reset by            |
//! |--------|--------------------------------|---------------------|
//! | `busy` | issue                          | go_write, go_store, die |
//! | `src`  | issue                          | go_read, die        |
//! | `adr`  | go_read (load/store)           | go_addr, die        |
//! | `req`  | go_read (ALU, branch), go_addr (load) | go_write, die |
//! | `sto`  | go_addr (store)                | go_store, die       |
//!
//! The execution unit behind the slot is started on `go_read` and advanced
//! once per latch phase.

use std::fmt;

use super::latch::HazardCell;
use super::signals::{Instruction, OpClass, Operation};
use super::traits::ExecutionUnit;

/// Observable phase of a slot, derived from its latches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FuState {
    /// Free for issue.
    Idle,
    /// Issued; waiting for its source operands to be readable.
    Issued,
    /// Operands read; the execution unit is working.
    Executing,
    /// Load/store: waiting for the effective address or the address grant.
    AddressPending,
    /// Result valid; waiting for `go_write`.
    WritePending,
    /// Store: waiting for `go_store`.
    StorePending,
}

/// Values read from the register file on the `go_read` tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Operands {
    /// First execution-unit operand (`src1`).
    pub a: u64,
    /// Second execution-unit operand (`src2` or the immediate).
    pub b: u64,
    /// Store data (`src2` for stores).
    pub data: u64,
}

/// Pulses delivered to one slot in a latch phase.
#[derive(Clone, Copy, Debug, Default)]
pub struct CuPulses<'a> {
    /// Instruction issued into this slot.
    pub issue: Option<&'a Instruction>,
    /// Operands, when `go_read` fired.
    pub go_read: Option<Operands>,
    /// `go_addr` fired.
    pub go_addr: bool,
    /// Word read from memory on a load's `go_addr`.
    pub loaded: Option<u64>,
    /// `go_write` fired.
    pub go_write: bool,
    /// `go_store` fired.
    pub go_store: bool,
    /// Die.
    pub die: bool,
}

/// Latches and execution unit of one FU slot.
pub struct ComputationUnit {
    class: OpClass,
    busy: HazardCell,
    src: HazardCell,
    adr: HazardCell,
    req: HazardCell,
    sto: HazardCell,
    insn: Option<Instruction>,
    store_data: u64,
    address: Option<u64>,
    loaded: Option<u64>,
    unit: Box<dyn ExecutionUnit>,
}

impl fmt::Debug for ComputationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputationUnit")
            .field("class", &self.class)
            .field("state", &self.state())
            .field("insn", &self.insn)
            .finish_non_exhaustive()
    }
}

impl ComputationUnit {
    /// Creates an idle slot of the given class around `unit`.
    pub fn new(class: OpClass, unit: Box<dyn ExecutionUnit>) -> Self {
        Self {
            class,
            busy: HazardCell::new(),
            src: HazardCell::new(),
            adr: HazardCell::new(),
            req: HazardCell::new(),
            sto: HazardCell::new(),
            insn: None,
            store_data: 0,
            address: None,
            loaded: None,
            unit,
        }
    }

    /// Opcode class served by this slot.
    pub const fn class(&self) -> OpClass {
        self.class
    }

    /// Latched busy flag.
    pub const fn busy(&self) -> bool {
        self.busy.get()
    }

    /// Instruction occupying the slot.
    pub const fn instruction(&self) -> Option<&Instruction> {
        self.insn.as_ref()
    }

    /// Source operands not yet read.
    pub const fn awaiting_read(&self) -> bool {
        self.src.get()
    }

    /// Effective address computed and waiting for `go_addr`.
    pub fn address_ready(&self) -> bool {
        self.adr.get() && self.unit.result().is_some()
    }

    /// Effective address, while an address request is outstanding.
    pub fn effective_address(&self) -> Option<u64> {
        if self.adr.get() {
            self.unit.result()
        } else {
            None
        }
    }

    /// Effective address of a load or store, once computed. Stays valid
    /// after `go_addr` until the slot frees.
    pub fn memory_address(&self) -> Option<u64> {
        self.address.or_else(|| self.effective_address())
    }

    /// Result value, while a write request is outstanding.
    pub fn result(&self) -> Option<u64> {
        if !self.req.get() {
            return None;
        }
        if self.is_op(Operation::Load) {
            self.loaded
        } else {
            self.unit.result()
        }
    }

    /// `release_request`: a write request with a valid result.
    pub fn release_request(&self) -> bool {
        self.result().is_some()
    }

    /// Store waiting for `go_store`.
    pub const fn store_request(&self) -> bool {
        self.sto.get()
    }

    /// `(address, data)` of a pending store.
    pub fn store_bus(&self) -> Option<(u64, u64)> {
        if self.sto.get() {
            self.address.map(|a| (a, self.store_data))
        } else {
            None
        }
    }

    /// `true` if the slot holds an instruction of operation `op`.
    pub fn is_op(&self, op: Operation) -> bool {
        self.insn.as_ref().is_some_and(|i| i.op == op)
    }

    /// Current phase.
    pub fn state(&self) -> FuState {
        if !self.busy.get() {
            FuState::Idle
        } else if self.src.get() {
            FuState::Issued
        } else if self.adr.get() {
            FuState::AddressPending
        } else if self.sto.get() {
            FuState::StorePending
        } else if self.release_request() {
            FuState::WritePending
        } else {
            FuState::Executing
        }
    }

    /// Accepts an instruction into this slot.
    ///
    /// # Panics
    ///
    /// Panics if the slot is busy: the issue unit must never route into an
    /// occupied slot.
    pub fn issue(&mut self, insn: &Instruction) {
        assert!(
            !self.busy.get(),
            "issue into busy {} slot holding {:?}",
            self.class.name(),
            self.insn
        );
        self.busy.update(true, false);
        self.src.update(true, false);
        self.insn = Some(insn.clone());
    }

    /// Latch phase: applies this tick's pulses and advances the execution unit.
    pub fn latch(&mut self, p: &CuPulses<'_>) {
        if let Some(insn) = p.issue {
            self.issue(insn);
        }
        if p.die {
            self.unit.cancel();
            for latch in [
                &mut self.busy,
                &mut self.src,
                &mut self.adr,
                &mut self.req,
                &mut self.sto,
            ] {
                latch.update(false, true);
            }
            self.insn = None;
            self.address = None;
            self.loaded = None;
            return;
        }

        let load_store = self.class == OpClass::LoadStore;
        let is_load = self.is_op(Operation::Load);
        let is_store = self.is_op(Operation::Store);
        let go_read = p.go_read.is_some();

        if let (Some(ops), Some(op)) = (p.go_read, self.insn.as_ref().map(|i| i.op)) {
            self.unit.start(op, ops.a, ops.b);
            self.store_data = ops.data;
        }
        if p.go_addr {
            self.address = self.unit.result();
            self.unit.consume();
            if is_load {
                self.loaded = p.loaded;
            }
        }
        if p.go_write {
            if !is_load {
                self.unit.consume();
            }
            self.loaded = None;
        }

        self.src.update(false, go_read);
        self.adr.update(go_read && load_store, p.go_addr);
        let request = (go_read && !load_store) || (p.go_addr && is_load);
        self.req.update(request, p.go_write);
        self.sto.update(p.go_addr && is_store, p.go_store);
        self.busy.update(false, p.go_write || p.go_store);
        if !self.busy.get() {
            self.insn = None;
            self.address = None;
        }
        self.unit.tick();
    }
}
