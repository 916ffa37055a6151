use mockall::predicate::eq;
use rstest::rstest;
use scoreboard_core::Scoreboard;
use scoreboard_core::common::{Mask, RegisterFile};
use scoreboard_core::config::{Config, LatencyConfig};
use scoreboard_core::core::sched::signals::{Instruction, OpClass, Operation, TickInputs};
use scoreboard_core::core::sched::traits::ExecutionUnit;
use scoreboard_core::core::units::{AluUnit, BranchUnit, FlatMemory, evaluate};
use scoreboard_core::sim::{Program, Simulator};

use crate::common::harness::init_tracing;
use crate::common::mocks::{MockMemory, MockUnit};

#[rstest]
#[case(Operation::Add, 2)]
#[case(Operation::Sub, 1)]
#[case(Operation::Mul, 5)]
#[case(Operation::Shr, 7)]
fn alu_latency(#[case] op: Operation, #[case] latency: u32) {
    let mut unit = AluUnit::new(LatencyConfig::default(), 64);
    assert_eq!(unit.latency_of(op), latency);
    unit.start(op, 40, 2);
    for _ in 1..latency {
        unit.tick();
        assert_eq!(unit.result(), None);
    }
    unit.tick();
    assert_eq!(unit.result(), Some(evaluate(op, 40, 2, 64)));
    unit.consume();
    assert_eq!(unit.result(), None);
}

/// A lone instruction takes issue, read, `latency` ticks of execution, then
/// its completing grant.
#[rstest]
#[case(Instruction::rri(Operation::Add, 1, 1, 1), 4)]
#[case(Instruction::rri(Operation::Sub, 1, 1, 1), 3)]
#[case(Instruction::rri(Operation::Mul, 1, 1, 1), 7)]
#[case(Instruction::rri(Operation::Shr, 1, 1, 1), 9)]
#[case(Instruction::rrr(Operation::Bne, None, 1, 2), 7)]
#[case(Instruction::load(1, 2, 0), 4)]
#[case(Instruction::store(1, 2, 0), 4)]
fn single_instruction_cycles(#[case] insn: Instruction, #[case] cycles: u64) {
    let mut sim = Simulator::new(Config::default(), Program::new(vec![insn])).unwrap();
    sim.run().unwrap();
    assert_eq!(sim.stats().cycles, cycles);
    assert_eq!(sim.stats().retired, 1);
}

#[rstest]
#[case(Operation::Add, u64::MAX, 1, 0)]
#[case(Operation::Sub, 0, 1, u64::MAX)]
#[case(Operation::Mul, 1 << 63, 2, 0)]
#[case(Operation::Shr, 0x80, 4, 0x8)]
#[case(Operation::Shr, 1, 64, 0)]
#[case(Operation::Bgt, 3, 2, 1)]
#[case(Operation::Blt, 3, 2, 0)]
#[case(Operation::Beq, 7, 7, 1)]
#[case(Operation::Bne, 7, 7, 0)]
fn evaluate_table(#[case] op: Operation, #[case] a: u64, #[case] b: u64, #[case] expected: u64) {
    assert_eq!(evaluate(op, a, b, 64), expected);
}

#[test]
fn narrow_registers_truncate_results() {
    assert_eq!(evaluate(Operation::Add, 0xff, 1, 8), 0);
    assert_eq!(evaluate(Operation::Shr, 0x1ff, 1, 8), 0x7f);
    assert_eq!(evaluate(Operation::Shr, 1, 8, 8), 0);
}

#[test]
fn branch_unit_reports_direction() {
    let mut unit = BranchUnit::new(1);
    unit.start(Operation::Bgt, 9, 4);
    unit.tick();
    assert_eq!(unit.result(), Some(1));
    unit.cancel();
    assert_eq!(unit.result(), None);
}

#[test]
#[allow(unused_results)]
fn scheduler_drives_the_unit_handshake() {
    init_tracing();
    let mut unit = MockUnit::new();
    unit.expect_start()
        .with(eq(Operation::Add), eq(2), eq(3))
        .times(1)
        .return_const(());
    unit.expect_tick().return_const(());
    unit.expect_result().return_const(Some(5));
    unit.expect_consume().times(1).return_const(());
    unit.expect_cancel().never();

    let config = Config::default();
    let units: Vec<(OpClass, Box<dyn ExecutionUnit>)> = vec![(OpClass::Alu, Box::new(unit))];
    let mut sb = Scoreboard::with_units(&config, units);
    let rf = RegisterFile::with_values(&[0, 2, 3, 0, 0, 0, 0, 0], 64);
    let mem = FlatMemory::new(4);

    let add = Instruction::rrr(Operation::Add, Some(3), 1, 2);
    let t0 = sb.tick(&TickInputs::with_issue(1, add), &rf, &mem);
    assert_eq!(t0.issued_fu, Some(0));
    let t1 = sb.tick(&TickInputs::idle(1), &rf, &mem);
    assert_eq!(t1.go_read, Mask::one_hot(1, 0));
    let t2 = sb.tick(&TickInputs::idle(1), &rf, &mem);
    assert_eq!(t2.go_write, Mask::one_hot(1, 0));
    assert_eq!(t2.result, Some(5));
    assert!(sb.is_idle());
}

#[test]
#[allow(unused_results)]
fn load_reads_memory_once_at_address_grant() {
    init_tracing();
    let mut mem = MockMemory::new();
    mem.expect_read().with(eq(4)).times(1).return_const(99u64);
    mem.expect_write().never();

    let config = Config::default();
    let mut sb = Scoreboard::new(&config);
    let rf = RegisterFile::new(8, 64);
    let n = sb.num_fus();

    let load = Instruction::load(2, 0, 4);
    let t0 = sb.tick(&TickInputs::with_issue(n, load), &rf, &mem);
    assert_eq!(t0.issued_fu, Some(3));
    let _ = sb.tick(&TickInputs::idle(n), &rf, &mem);
    let t2 = sb.tick(&TickInputs::idle(n), &rf, &mem);
    assert_eq!(t2.go_addr, Mask::one_hot(n, 3));
    let t3 = sb.tick(&TickInputs::idle(n), &rf, &mem);
    assert_eq!(t3.go_write, Mask::one_hot(n, 3));
    assert_eq!(t3.wen, Mask::one_hot(8, 2));
    assert_eq!(t3.result, Some(99));
}
