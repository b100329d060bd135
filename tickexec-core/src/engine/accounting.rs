//! Stage and balance accounting.
//!
//! Fills are never accumulated incrementally. Every update first undoes what
//! the previous snapshot of the order contributed and then applies the
//! current one, so re-applying the same snapshot is a no-op.

use crate::domain::{Balance, FillSnapshot, OrderRuntime, OrderSide};
use crate::precision::precise;

use super::tick_view::StageLedger;

/// Move the stage aggregates and the balance from `previous` to `current`.
pub fn apply_fill_delta(
    side: OrderSide,
    previous: &FillSnapshot,
    current: &FillSnapshot,
    stage: &mut StageLedger<'_>,
    balance: &mut Balance,
) {
    stage.base.size_filled =
        precise(stage.base.size_filled - previous.base_size_filled + current.base_size_filled);
    stage.base.fees_paid =
        precise(stage.base.fees_paid - previous.base_fees_paid + current.base_fees_paid);
    stage.quoted.size_filled = precise(
        stage.quoted.size_filled - previous.quoted_size_filled + current.quoted_size_filled,
    );
    stage.quoted.fees_paid =
        precise(stage.quoted.fees_paid - previous.quoted_fees_paid + current.quoted_fees_paid);

    match side {
        // Buying receives base and pays quoted plus quoted fees
        OrderSide::Buy => {
            balance.base =
                precise(balance.base - previous.base_size_filled + current.base_size_filled);
            balance.quoted = precise(
                balance.quoted + previous.quoted_size_filled + previous.quoted_fees_paid
                    - current.quoted_size_filled
                    - current.quoted_fees_paid,
            );
        }
        // Selling pays base plus base fees and receives quoted
        OrderSide::Sell => {
            balance.base = precise(
                balance.base + previous.base_size_filled + previous.base_fees_paid
                    - current.base_size_filled
                    - current.base_fees_paid,
            );
            balance.quoted =
                precise(balance.quoted - previous.quoted_size_filled + current.quoted_size_filled);
        }
    }
}

/// Add a freshly opened order's sizes to the stage.
pub fn account_opened_order(stage: &mut StageLedger<'_>, order: &OrderRuntime) {
    stage.base.size = precise(stage.base.size + order.base.size);
    stage.quoted.size = precise(stage.quoted.size + order.quoted.size);
}

/// After a cancellation only the filled part plus fees counts as placed:
/// release the order's size and re-add what it actually consumed.
pub fn recalculate_stage_size(stage: &mut StageLedger<'_>, cancelled: &OrderRuntime) {
    stage.base.size = precise(
        stage.base.size - cancelled.base.size + cancelled.base.size_filled + cancelled.base.fees_paid,
    );
    stage.quoted.size = precise(
        stage.quoted.size - cancelled.quoted.size
            + cancelled.quoted.size_filled
            + cancelled.quoted.fees_paid,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RuntimeId, StageAsset};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn snapshot(base_filled: Decimal, quoted_filled: Decimal, base_fee: Decimal, quoted_fee: Decimal) -> FillSnapshot {
        FillSnapshot {
            base_size_filled: base_filled,
            quoted_size_filled: quoted_filled,
            base_fees_paid: base_fee,
            quoted_fees_paid: quoted_fee,
        }
    }

    #[test]
    fn buy_fill_moves_quoted_into_base() {
        let (mut base, mut quoted) = (StageAsset::default(), StageAsset::default());
        let mut stage = StageLedger {
            base: &mut base,
            quoted: &mut quoted,
        };
        let mut balance = Balance::new(dec!(0), dec!(1000));

        let current = snapshot(dec!(2), dec!(200), dec!(0.002), dec!(0.2));
        apply_fill_delta(OrderSide::Buy, &FillSnapshot::default(), &current, &mut stage, &mut balance);

        assert_eq!(balance.base, dec!(2));
        assert_eq!(balance.quoted, dec!(799.8));
        assert_eq!(stage.base.size_filled, dec!(2));
        assert_eq!(stage.quoted.fees_paid, dec!(0.2));
    }

    #[test]
    fn sell_fill_moves_base_into_quoted() {
        let (mut base, mut quoted) = (StageAsset::default(), StageAsset::default());
        let mut stage = StageLedger {
            base: &mut base,
            quoted: &mut quoted,
        };
        let mut balance = Balance::new(dec!(5), dec!(0));

        let current = snapshot(dec!(2), dec!(200), dec!(0.01), dec!(1));
        apply_fill_delta(OrderSide::Sell, &FillSnapshot::default(), &current, &mut stage, &mut balance);

        assert_eq!(balance.base, dec!(2.99));
        assert_eq!(balance.quoted, dec!(200));
    }

    #[test]
    fn second_fill_only_applies_the_difference() {
        let (mut base, mut quoted) = (StageAsset::default(), StageAsset::default());
        let mut stage = StageLedger {
            base: &mut base,
            quoted: &mut quoted,
        };
        let mut balance = Balance::new(dec!(0), dec!(1000));

        let half = snapshot(dec!(1), dec!(100), dec!(0), dec!(0.1));
        let full = snapshot(dec!(2), dec!(200), dec!(0), dec!(0.2));
        apply_fill_delta(OrderSide::Buy, &FillSnapshot::default(), &half, &mut stage, &mut balance);
        apply_fill_delta(OrderSide::Buy, &half, &full, &mut stage, &mut balance);

        assert_eq!(balance.base, dec!(2));
        assert_eq!(balance.quoted, dec!(799.8));
        assert_eq!(stage.quoted.size_filled, dec!(200));
    }

    #[test]
    fn unchanged_snapshot_is_a_no_op() {
        let (mut base, mut quoted) = (StageAsset::default(), StageAsset::default());
        let mut stage = StageLedger {
            base: &mut base,
            quoted: &mut quoted,
        };
        let mut balance = Balance::new(dec!(3), dec!(300));
        let same = snapshot(dec!(1), dec!(100), dec!(0.001), dec!(0.1));

        apply_fill_delta(OrderSide::Buy, &same, &same, &mut stage, &mut balance);
        assert_eq!(balance, Balance::new(dec!(3), dec!(300)));
        assert_eq!(*stage.base, StageAsset::default());
    }

    #[test]
    fn cancellation_releases_unfilled_remainder() {
        let mut base = StageAsset {
            size: dec!(10),
            ..StageAsset::default()
        };
        let mut quoted = StageAsset {
            size: dec!(1000),
            ..StageAsset::default()
        };
        let mut stage = StageLedger {
            base: &mut base,
            quoted: &mut quoted,
        };

        let mut order = OrderRuntime::new(RuntimeId::from("r1"));
        order.base.size = dec!(10);
        order.base.size_filled = dec!(4);
        order.base.fees_paid = dec!(0.1);
        order.quoted.size = dec!(1000);
        order.quoted.size_filled = dec!(400);
        order.quoted.fees_paid = dec!(10);

        recalculate_stage_size(&mut stage, &order);
        assert_eq!(stage.base.size, dec!(4.1));
        assert_eq!(stage.quoted.size, dec!(410));
    }
}
