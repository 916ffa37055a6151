use pretty_assertions::assert_eq;
use scoreboard_core::common::Mask;
use scoreboard_core::config::Config;
use scoreboard_core::core::sched::compunit::FuState;
use scoreboard_core::core::sched::issue::StallReason;
use scoreboard_core::core::sched::shadow::Prediction;
use scoreboard_core::core::sched::signals::{Instruction, Operation};
use scoreboard_core::sim::Simulator;

use crate::common::builder::ProgramBuilder;
use crate::common::harness::TestContext;

const BRANCH_FU: usize = 2;

fn addi(d: usize, a: usize, imm: u64) -> Instruction {
    Instruction::rri(Operation::Add, d, a, imm)
}

/// Issues `bgt r1, r2` followed by one instruction down each path and runs
/// until the tick before the branch resolves.
fn branch_with_both_paths(r1: u64, r2: u64) -> TestContext {
    let mut ctx = TestContext::new().with_regs(&[0, r1, r2]);
    let branch = ctx.issue(Instruction::rrr(Operation::Bgt, None, 1, 2));
    assert_eq!(branch.issued_fu, Some(BRANCH_FU));
    let taken = ctx.issue(addi(3, 1, 10).speculative(Prediction::Taken));
    assert_eq!(taken.issued_fu, Some(0));
    let not_taken = ctx.issue(addi(4, 1, 20).speculative(Prediction::NotTaken));
    assert_eq!(not_taken.issued_fu, Some(1));
    for _ in 3..6 {
        let out = ctx.idle();
        assert!(out.go_write.none(), "shadowed results must not retire");
    }
    assert!(ctx.sb.shadow().branch_shadowed().get(0));
    assert!(ctx.sb.shadow().branch_shadowed().get(1));
    ctx
}

#[test]
fn taken_branch_confirms_and_kills() {
    let mut ctx = branch_with_both_paths(5, 3);
    assert_eq!(ctx.sb.state(0), FuState::WritePending);

    let t6 = ctx.idle();
    assert_eq!(t6.go_write, Mask::one_hot(4, BRANCH_FU));
    assert_eq!(t6.branch_resolved, Some(true));
    assert_eq!(t6.confirm, Mask::one_hot(4, 0));
    assert_eq!(t6.die, Mask::one_hot(4, 1));
    assert!(t6.wen.none(), "branches write no register");
    assert!(!ctx.sb.shadow().record().branch_active());
    assert_eq!(ctx.sb.shadow().record().branch_outcome(), Some(true));

    let t7 = ctx.idle();
    assert_eq!(t7.go_write, Mask::one_hot(4, 0));
    assert_eq!(t7.result, Some(15));
    assert!(ctx.sb.is_idle());
    assert_eq!(ctx.reg(3), 15);
    assert_eq!(ctx.reg(4), 0);
}

#[test]
fn not_taken_branch_keeps_the_fall_through_path() {
    let mut ctx = branch_with_both_paths(3, 5);
    let t6 = ctx.idle();
    assert_eq!(t6.branch_resolved, Some(false));
    assert_eq!(t6.confirm, Mask::one_hot(4, 1));
    assert_eq!(t6.die, Mask::one_hot(4, 0));

    // The survivor's order predecessor died; it is free to retire next tick.
    let t7 = ctx.idle();
    assert_eq!(t7.go_write, Mask::one_hot(4, 1));
    assert_eq!(ctx.reg(3), 0);
    assert_eq!(ctx.reg(4), 23);
}

#[test]
fn pending_reports_dying_writers_but_capture_skips_them() {
    let mut ctx = branch_with_both_paths(5, 3);

    // Offer a load of r4 in the same tick fu1 (the only writer of r4) dies.
    let t6 = ctx.issue(Instruction::load(5, 4, 0));
    assert_eq!(t6.die, Mask::one_hot(4, 1));
    assert_eq!(t6.issued_fu, Some(3));
    assert!(
        t6.pending.write_pending(4),
        "pending is derived from latched state"
    );

    assert!(ctx.sb.fu_matrix().read_waits(3).none());
    assert_eq!(ctx.sb.shadow().order_pred(3), Some(0));
    let _ = ctx.drain(16);
    assert_eq!(ctx.reg(5), 0);
}

#[test]
fn tagged_issue_is_refused_while_resolving() {
    let mut ctx = branch_with_both_paths(5, 3);
    let t6 = ctx.issue(addi(5, 1, 1).speculative(Prediction::Taken));
    assert_eq!(t6.branch_resolved, Some(true));
    assert!(!t6.issue_accepted);
    assert_eq!(t6.stall, Some(StallReason::SpeculationResolving));

    let t7 = ctx.issue(addi(5, 1, 1).speculative(Prediction::Taken));
    assert_eq!(t7.stall, Some(StallReason::NoActiveBranch));
}

#[test]
fn second_branch_waits_for_the_first() {
    let mut config = Config::default();
    config.units.branch = 2;
    let mut ctx = TestContext::with_config(&config);
    let _ = ctx.issue(Instruction::rrr(Operation::Beq, None, 1, 2));
    let out = ctx.issue(Instruction::rrr(Operation::Bne, None, 1, 2));
    assert_eq!(out.stall, Some(StallReason::BranchPending));
}

#[test]
fn die_is_idempotent() {
    let mut ctx = TestContext::new();
    let _ = ctx.issue(Instruction::rrr(Operation::Mul, Some(1), 2, 3));
    let _ = ctx.idle();
    assert_eq!(ctx.sb.state(0), FuState::Executing);

    let first = ctx.flush(&[0]);
    assert_eq!(first.die, Mask::one_hot(4, 0));
    assert_eq!(ctx.sb.state(0), FuState::Idle);
    assert!(ctx.sb.reg_matrix().write_pending_regs().none());

    let second = ctx.flush(&[0]);
    assert!(second.die.none());
    let third = ctx.flush(&[0, 1, 2, 3]);
    assert!(third.die.none());
    assert!(ctx.sb.is_idle());
}

#[test]
fn flush_takes_order_successors() {
    let mut ctx = TestContext::new().with_regs(&[0, 1, 2]);
    let _ = ctx.issue(Instruction::rrr(Operation::Mul, Some(3), 1, 2));
    let _ = ctx.issue(Instruction::rrr(Operation::Add, Some(4), 1, 2));
    let out = ctx.flush(&[0]);
    assert_eq!(out.die, Mask::from_indices(4, [0, 1]));
    assert!(ctx.sb.is_idle());
}

#[test]
fn killed_branch_abandons_its_dependents() {
    let program = ProgramBuilder::new()
        .regs(&[0, 5, 3])
        .branch(Operation::Bgt, 1, 2)
        .if_taken(addi(3, 1, 10))
        .if_not_taken(addi(4, 1, 20))
        .addi(5, 1, 1)
        .build();
    let mut config = Config::default();
    config.general.check_invariants = true;
    let mut sim = Simulator::new(config, program).unwrap();

    assert_eq!(sim.tick().unwrap().issued_fu, Some(BRANCH_FU));
    assert_eq!(sim.tick().unwrap().issued_fu, Some(0));
    sim.flush(&Mask::one_hot(4, BRANCH_FU));
    let out = sim.tick().unwrap();
    assert_eq!(out.die, Mask::from_indices(4, [0, BRANCH_FU]));
    assert_eq!(out.stall, Some(StallReason::SpeculationResolving));

    sim.run().unwrap();
    assert_eq!(sim.registers().read(3), 0);
    assert_eq!(sim.registers().read(4), 0);
    assert_eq!(sim.registers().read(5), 6);
    assert_eq!(sim.stats().killed, 2);
    assert_eq!(sim.stats().squashed_in_queue, 1);
    assert_eq!(sim.stats().branches_resolved, 0);
}

#[test]
fn frontend_holds_unconditional_work_behind_a_branch() {
    let program = ProgramBuilder::new()
        .regs(&[0, 5, 3])
        .branch(Operation::Blt, 1, 2)
        .addi(3, 1, 1)
        .build();
    let mut sim = Simulator::new(Config::default(), program).unwrap();
    sim.run().unwrap();
    // Branch latency 5: go_read at 1, resolves at 6; the add issues at 7.
    assert_eq!(sim.stats().stalls_frontend, 6);
    assert_eq!(sim.stats().branches_resolved, 1);
    assert_eq!(sim.stats().branches_taken, 0);
    assert_eq!(sim.registers().read(3), 6);
}
