//! Property-based invariants for first-intersecting selection.
//!
//! 1. No positive ratio in a batch → no selection (sentinel at the tracker).
//! 2. Exactly one positive ratio → that target's position in the list.
//! 3. Several positive ratios → the first one in delivery order, never later.
//! 4. The tracker never reports a position outside the list, and never one
//!    that holds an absent entry.

use std::rc::Rc;

use proptest::prelude::*;
use scrollspy_core::headless::HeadlessObservers;
use scrollspy_core::{IntersectionEntry, NO_TARGET, Scrollspy, Targets, select_first_intersecting};

// ── Helpers ─────────────────────────────────────────────────────────────

/// Target list of distinct ids `0..len`, with some slots blanked.
fn targets_strategy() -> impl Strategy<Value = Vec<Option<u32>>> {
    prop::collection::vec(any::<bool>(), 1..24).prop_map(|present| {
        present
            .into_iter()
            .enumerate()
            .map(|(i, keep)| keep.then_some(i as u32))
            .collect()
    })
}

/// A batch built from a shuffled subset of the present targets.
fn batch_for(
    targets: &[Option<u32>],
    ratios: &[f64],
    order: &[usize],
) -> Vec<IntersectionEntry<u32>> {
    let present: Vec<u32> = targets.iter().flatten().copied().collect();
    if present.is_empty() {
        return Vec::new();
    }
    order
        .iter()
        .zip(ratios)
        .map(|(&pick, &ratio)| IntersectionEntry::new(present[pick % present.len()], ratio))
        .collect()
}

fn ratio_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.0), 0.0001f64..=1.0]
}

proptest! {
    #[test]
    fn zero_ratios_select_nothing(
        targets in targets_strategy(),
        order in prop::collection::vec(any::<usize>(), 0..16),
    ) {
        let ratios = vec![0.0; order.len()];
        let batch = batch_for(&targets, &ratios, &order);
        prop_assert_eq!(select_first_intersecting(&targets, &batch), None);
    }

    #[test]
    fn first_positive_in_delivery_order_wins(
        targets in targets_strategy(),
        order in prop::collection::vec(any::<usize>(), 0..16),
        ratios in prop::collection::vec(ratio_strategy(), 16),
    ) {
        let batch = batch_for(&targets, &ratios, &order);
        let expected = batch
            .iter()
            .find(|e| e.intersection_ratio > 0.0)
            .map(|e| e.target as usize);
        prop_assert_eq!(select_first_intersecting(&targets, &batch), expected);
    }

    #[test]
    fn tracker_index_points_at_present_target(
        targets in targets_strategy(),
        batches in prop::collection::vec(
            (prop::collection::vec(any::<usize>(), 0..8),
             prop::collection::vec(ratio_strategy(), 8)),
            1..6,
        ),
    ) {
        let backend = HeadlessObservers::new();
        let mut spy = Scrollspy::new(backend.clone());
        let list: Targets<u32> = Rc::from(targets.clone());
        spy.sync(&list, None).unwrap();
        let id = backend.latest().unwrap();

        for (order, ratios) in &batches {
            let batch = batch_for(&targets, ratios, order);
            let any_positive = batch.iter().any(|e| e.intersection_ratio > 0.0);
            backend.deliver(id, batch);

            let index = spy.current_index();
            if any_positive {
                prop_assert!(index >= 0);
                let slot = targets[index as usize];
                prop_assert_eq!(slot, Some(index as u32));
            } else {
                prop_assert_eq!(index, NO_TARGET);
            }
        }
    }
}
