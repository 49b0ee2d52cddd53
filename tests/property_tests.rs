//! Property-based tests for the balance fold and weighted-average
//! costing, verifying the invariants across a wide range of movement
//! sequences.

use proptest::prelude::*;
use rust_decimal::Decimal;
use stock_ledger_api::services::balances::Balance;

/// A candidate movement: inflow quantity with an explicit value, or an
/// outflow drawn at the running average.
#[derive(Debug, Clone)]
enum Step {
    Inflow { quantity: i64, value: i64 },
    Outflow { quantity: i64 },
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        (1i64..1_000, 0i64..100_000)
            .prop_map(|(quantity, value)| Step::Inflow { quantity, value }),
        (1i64..1_000).prop_map(|quantity| Step::Outflow { quantity }),
    ]
}

/// Replays steps the way the ledger does: reject any outflow that would
/// drive the balance negative, apply everything else. Returns the final
/// balance and the applied (quantity, value) deltas.
fn replay(steps: &[Step]) -> (Balance, Vec<(Decimal, Decimal)>) {
    let mut balance = Balance::empty();
    let mut applied = Vec::new();
    for step in steps {
        let (quantity, value) = match step {
            Step::Inflow { quantity, value } => (Decimal::from(*quantity), Decimal::from(*value)),
            Step::Outflow { quantity } => {
                let quantity = Decimal::from(-*quantity);
                let value = (balance.average_value * quantity).round_dp(4);
                (quantity, value)
            }
        };
        if balance.total_quantity + quantity < Decimal::ZERO {
            continue;
        }
        balance = balance.apply(quantity, value, balance.last_sequence + 1);
        applied.push((quantity, value));
    }
    (balance, applied)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// The balance quantity is exactly the sum of applied deltas and is
    /// never negative, whatever the sequence.
    #[test]
    fn quantity_is_the_sum_of_applied_deltas(steps in prop::collection::vec(step_strategy(), 1..60)) {
        let (balance, applied) = replay(&steps);
        let sum: Decimal = applied.iter().map(|(quantity, _)| *quantity).sum();
        prop_assert_eq!(balance.total_quantity, sum);
        prop_assert!(balance.total_quantity >= Decimal::ZERO);
    }

    /// Folding the applied deltas from scratch reproduces the
    /// incrementally maintained balance exactly.
    #[test]
    fn full_fold_matches_incremental(steps in prop::collection::vec(step_strategy(), 1..60)) {
        let (incremental, applied) = replay(&steps);

        let mut folded = Balance::empty();
        for (quantity, value) in &applied {
            folded = folded.apply(*quantity, *value, folded.last_sequence + 1);
        }
        prop_assert_eq!(folded, incremental);
    }

    /// Outflows never change the running average.
    #[test]
    fn outflows_preserve_the_average(
        inflow_quantity in 1i64..1_000,
        inflow_value in 0i64..100_000,
        outflow in 1i64..1_000,
    ) {
        let seeded = Balance::empty().apply(
            Decimal::from(inflow_quantity),
            Decimal::from(inflow_value),
            1,
        );
        let outflow = outflow.min(inflow_quantity);
        let drawn = seeded.apply(
            Decimal::from(-outflow),
            (seeded.average_value * Decimal::from(-outflow)).round_dp(4),
            2,
        );
        prop_assert_eq!(drawn.average_value, seeded.average_value);
        prop_assert_eq!(drawn.total_quantity, Decimal::from(inflow_quantity - outflow));
    }

    /// The moving-average recurrence holds for every inflow:
    /// new_avg = (prev_avg * prev_qty + value) / new_qty, at scale 4.
    #[test]
    fn inflow_average_follows_the_recurrence(
        seed_quantity in 1i64..1_000,
        seed_value in 0i64..100_000,
        quantity in 1i64..1_000,
        value in 0i64..100_000,
    ) {
        let seeded = Balance::empty().apply(Decimal::from(seed_quantity), Decimal::from(seed_value), 1);
        let grown = seeded.apply(Decimal::from(quantity), Decimal::from(value), 2);

        let expected = ((seeded.average_value * seeded.total_quantity + Decimal::from(value))
            / (seeded.total_quantity + Decimal::from(quantity)))
            .round_dp(4);
        prop_assert_eq!(grown.average_value, expected);
    }
}

#[test]
fn worked_example_from_the_costing_rules() {
    // Intake 10 @ 1000 (avg 100), then 5 @ 600: quantity 15,
    // average (100 * 10 + 600) / 15.
    let balance = Balance::empty()
        .apply(Decimal::from(10), Decimal::from(1000), 1)
        .apply(Decimal::from(5), Decimal::from(600), 2);
    assert_eq!(balance.total_quantity, Decimal::from(15));
    assert_eq!(balance.average_value, Decimal::new(1066667, 4));
}
