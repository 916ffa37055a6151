use pretty_assertions::assert_eq;
use scoreboard_core::common::Mask;
use scoreboard_core::config::Config;
use scoreboard_core::core::sched::compunit::FuState;
use scoreboard_core::core::sched::issue::StallReason;
use scoreboard_core::core::sched::signals::{Instruction, Operation};
use scoreboard_core::core::sched::traits::DataMemory;

use crate::common::harness::TestContext;

fn add(d: usize, a: usize, b: usize) -> Instruction {
    Instruction::rrr(Operation::Add, Some(d), a, b)
}

fn sub(d: usize, a: usize, b: usize) -> Instruction {
    Instruction::rrr(Operation::Sub, Some(d), a, b)
}

fn mul(d: usize, a: usize, b: usize) -> Instruction {
    Instruction::rrr(Operation::Mul, Some(d), a, b)
}

/// First tick at which `fu` received the grant selected by `lane`.
fn first_grant(
    ctx: &TestContext,
    fu: usize,
    lane: impl Fn(&scoreboard_core::core::sched::signals::TickOutputs) -> &Mask,
) -> Option<usize> {
    ctx.history.iter().position(|out| lane(out).get(fu))
}

#[test]
fn raw_consumer_reads_after_producer_writes() {
    let mut ctx = TestContext::new().with_regs(&[0, 5, 7]);

    let t0 = ctx.issue(add(3, 1, 2));
    assert_eq!(t0.issued_fu, Some(0));

    let t1 = ctx.issue(sub(4, 3, 1));
    assert_eq!(t1.issued_fu, Some(1));
    assert_eq!(t1.go_read, Mask::one_hot(4, 0));
    assert_eq!(t1.ren[0], Mask::one_hot(8, 1));
    assert_eq!(t1.ren[1], Mask::one_hot(8, 2));

    let t2 = ctx.idle();
    assert!(!t2.readable.get(1), "consumer waits on the pending r3");
    assert!(t2.pending.write_pending(3));
    assert!(t2.pending.write_pending(4));
    assert_eq!(ctx.sb.state(0), FuState::WritePending);

    let t3 = ctx.idle();
    assert_eq!(t3.go_write, Mask::one_hot(4, 0));
    assert_eq!(t3.wen, Mask::one_hot(8, 3));
    assert_eq!(t3.result, Some(12));
    assert!(!t3.readable.get(1), "release is visible from the next tick");

    let t4 = ctx.idle();
    assert_eq!(t4.go_read, Mask::one_hot(4, 1));
    assert_eq!(t4.ren[0], Mask::one_hot(8, 3));

    let t5 = ctx.idle();
    assert_eq!(t5.go_write, Mask::one_hot(4, 1));
    assert_eq!(t5.result, Some(7));

    assert!(ctx.sb.is_idle());
    assert_eq!(ctx.rf.values(), &[0, 5, 7, 12, 7, 0, 0, 0]);
}

#[test]
fn war_writer_waits_for_earlier_reader() {
    let mut config = Config::default();
    config.units.alu = 3;
    config.scheduler.order_shadow = false;
    let mut ctx = TestContext::with_config(&config).with_regs(&[0, 3]);

    let _ = ctx.issue(mul(2, 1, 1)); // fu0, five ticks
    let _ = ctx.issue(add(3, 2, 1)); // fu1, reads r1 only after fu0 writes r2
    let _ = ctx.issue(sub(1, 4, 4)); // fu2, overwrites r1
    let _ = ctx.drain(32);

    assert_eq!(first_grant(&ctx, 0, |o| &o.go_write), Some(6));
    assert_eq!(first_grant(&ctx, 1, |o| &o.go_read), Some(7));
    assert_eq!(first_grant(&ctx, 2, |o| &o.go_read), Some(3));
    assert_eq!(first_grant(&ctx, 2, |o| &o.go_write), Some(8));
    assert_eq!(ctx.reg(3), 12, "reader saw the old r1");
    assert_eq!(ctx.reg(1), 0);
    assert_eq!(ctx.reg(2), 9);
}

#[test]
fn waw_writes_land_in_issue_order() {
    let mut config = Config::default();
    config.scheduler.order_shadow = false;
    let mut ctx = TestContext::with_config(&config).with_regs(&[0, 0, 4, 9]);

    let _ = ctx.issue(mul(1, 2, 2)); // fu0, slow
    let _ = ctx.issue(sub(1, 3, 3)); // fu1, fast, same destination
    let _ = ctx.drain(32);

    let first = first_grant(&ctx, 0, |o| &o.go_write).unwrap();
    let second = first_grant(&ctx, 1, |o| &o.go_write).unwrap();
    assert!(second > first);
    assert_eq!(ctx.reg(1), 0);
}

#[test]
fn waw_stall_policy_refuses_second_writer() {
    let mut config = Config::default();
    config.scheduler.stall_on_waw = true;
    let mut ctx = TestContext::with_config(&config);

    let _ = ctx.issue(add(1, 2, 3));
    let out = ctx.issue(add(1, 2, 2));
    assert!(!out.issue_accepted);
    assert_eq!(out.stall, Some(StallReason::WriteAfterWrite));
}

#[test]
fn no_free_unit_stalls() {
    let mut ctx = TestContext::new();
    let _ = ctx.issue(mul(1, 1, 1));
    let _ = ctx.issue(mul(2, 2, 2));
    let out = ctx.issue(mul(3, 3, 3));
    assert_eq!(out.stall, Some(StallReason::NoFreeUnit));
    assert_eq!(out.issued_fu, None);
}

#[test]
fn load_waits_for_older_store() {
    let mut config = Config::default();
    config.units.load_store = 2;
    let mut ctx = TestContext::with_config(&config).with_regs(&[0, 42]);

    let t0 = ctx.issue(Instruction::store(1, 0, 4));
    assert_eq!(t0.issued_fu, Some(3));
    let t1 = ctx.issue(Instruction::load(2, 0, 4));
    assert_eq!(t1.issued_fu, Some(4));
    let _ = ctx.drain(16);

    assert_eq!(first_grant(&ctx, 3, |o| &o.go_addr), Some(2));
    assert_eq!(first_grant(&ctx, 3, |o| &o.go_store), Some(3));
    assert_eq!(ctx.history[3].store, Some((4, 42)));
    assert_eq!(first_grant(&ctx, 4, |o| &o.go_addr), Some(4));
    assert_eq!(first_grant(&ctx, 4, |o| &o.go_write), Some(5));
    assert_eq!(ctx.reg(2), 42);
}

/// A store held back by an older MUL, followed by a load from `load_offset`.
/// Returns the load's address grant tick and the store's completion tick.
fn load_behind_held_store(load_offset: u64) -> (TestContext, usize, usize) {
    let mut config = Config::default();
    config.units.load_store = 2;
    let mut memory = vec![0; 9];
    memory[8] = 99;
    let mut ctx = TestContext::with_config(&config)
        .with_regs(&[0, 42])
        .with_memory(&memory);

    let _ = ctx.issue(mul(5, 1, 1));
    let t1 = ctx.issue(Instruction::store(1, 0, 4));
    assert_eq!(t1.issued_fu, Some(3));
    let t2 = ctx.issue(Instruction::load(2, 0, load_offset));
    assert_eq!(t2.issued_fu, Some(4));
    let _ = ctx.drain(32);

    let load_addr = first_grant(&ctx, 4, |o| &o.go_addr).expect("load took its address grant");
    let store_done = first_grant(&ctx, 3, |o| &o.go_store).expect("store completed");
    (ctx, load_addr, store_done)
}

#[test]
fn load_passes_store_to_another_word() {
    let (ctx, load_addr, store_done) = load_behind_held_store(8);
    assert!(
        load_addr < store_done,
        "load read memory at t{load_addr}, store completed at t{store_done}"
    );
    assert_eq!(ctx.reg(2), 99);
    assert_eq!(ctx.mem.read(4), 42);
    assert_eq!(ctx.reg(5), 42 * 42);
}

#[test]
fn load_waits_for_store_to_an_aliased_word() {
    // 4 + 256 wraps onto word 4 of the default 256-word memory.
    let (ctx, load_addr, store_done) = load_behind_held_store(4 + 256);
    assert!(
        load_addr > store_done,
        "load read memory at t{load_addr}, store completed at t{store_done}"
    );
    assert_eq!(ctx.reg(2), 42);
}

#[test]
fn grants_are_one_hot_under_load() {
    let mut config = Config::default();
    config.units.alu = 6;
    config.scheduler.order_shadow = false;
    let mut ctx = TestContext::with_config(&config).with_regs(&[1, 2, 3, 4, 5, 6, 7, 8]);
    for d in 0..6 {
        let _ = ctx.issue(add(d, 7, 6));
    }
    let _ = ctx.drain(64);
    for out in &ctx.history {
        assert!(out.go_read.count() <= 1);
        assert!(out.go_write.count() <= 1);
        assert!(out.wen.count() <= 1);
    }
    assert!((0..6).all(|r| ctx.reg(r) == 15));
}
