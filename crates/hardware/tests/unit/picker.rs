use proptest::prelude::*;
use scoreboard_core::common::Mask;
use scoreboard_core::core::sched::latch::HazardCell;
use scoreboard_core::core::sched::picker::{GroupPicker, PriorityPicker};

fn mask(width: usize) -> impl Strategy<Value = Mask> {
    proptest::collection::vec(any::<bool>(), width).prop_map(move |bits| {
        let set = bits.iter().enumerate().filter(|(_, b)| **b).map(|(i, _)| i);
        Mask::from_indices(width, set)
    })
}

fn masks3() -> impl Strategy<Value = (Mask, Mask, Mask)> {
    (1usize..80).prop_flat_map(|w| (mask(w), mask(w), mask(w)))
}

proptest! {
    #[test]
    fn priority_grant_is_lowest_request(req in (1usize..150).prop_flat_map(mask)) {
        let grant = PriorityPicker::pick(&req);
        prop_assert_eq!(grant.width(), req.width());
        prop_assert!(grant.count() <= 1);
        prop_assert_eq!(grant.any(), req.any());
        if let Some(i) = grant.first_one() {
            prop_assert!(req.get(i));
            prop_assert!((0..i).all(|j| !req.get(j)));
        }
        prop_assert_eq!(PriorityPicker::winner(&req), grant.first_one());
    }

    #[test]
    fn group_lanes_are_one_hot_and_gated((readable, writable, release) in masks3()) {
        let g = GroupPicker::pick(&readable, &writable, &release);
        prop_assert!(g.go_read.count() <= 1);
        prop_assert!(g.go_write.count() <= 1);
        prop_assert!(g.go_read.and_not(&readable).none());
        prop_assert!(g.go_write.and_not(&writable.and(&release)).none());
        prop_assert_eq!(g.go_write.any(), writable.intersects(&release));
        prop_assert_eq!(GroupPicker::pick(&readable, &writable, &release), g);
    }

    #[test]
    fn hazard_cell_set_dominates(q in any::<bool>(), set in any::<bool>(), reset in any::<bool>()) {
        let mut cell = HazardCell::new();
        cell.update(q, false);
        prop_assert_eq!(cell.get(), q);
        cell.update(set, reset);
        prop_assert_eq!(cell.get(), set || (!reset && q));
    }
}
