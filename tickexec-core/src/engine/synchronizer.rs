//! Reconciling an open order with what the venue reports.
//!
//! Venues rarely report fees directly. They do report the net base amount
//! after fees, so the base fee is the order size minus that amount, and the
//! quoted fee is the base fee at the actual rate.

use rust_decimal::Decimal;

use crate::domain::{DenominatingAsset, ExitType, FillSnapshot, OrderRuntime};
use crate::ports::{VenueOrder, VenueOrderStatus};
use crate::precision::precise;

/// Result of reconciling one venue report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncStep {
    /// Fill figures before the sync, for the accounting ledger.
    pub previous: FillSnapshot,
    /// Exit type if the report closed the order.
    pub closed: Option<ExitType>,
}

/// How a venue report closes an order, if it does.
pub fn infer_exit(venue: &VenueOrder) -> Option<ExitType> {
    match venue.status {
        VenueOrderStatus::Closed if venue.remaining.is_zero() => Some(ExitType::Filled),
        VenueOrderStatus::Closed if venue.remaining > Decimal::ZERO => {
            Some(ExitType::ClosedAtExchange)
        }
        VenueOrderStatus::Cancelled => Some(ExitType::CancelledAtExchange),
        _ => None,
    }
}

/// Overwrite the order's fill statistics with the venue's figures.
/// Returns the snapshot from before the overwrite.
pub fn sync_statistics(
    order: &mut OrderRuntime,
    venue: &VenueOrder,
    asset: DenominatingAsset,
) -> FillSnapshot {
    let previous = order.fill_snapshot();

    order.statistics.actual_rate = precise(venue.price);

    order.base.fees_paid = precise(order.base.size - venue.amount);
    order.quoted.fees_paid = precise(order.base.fees_paid * order.statistics.actual_rate);

    let total = venue.filled + venue.remaining;
    order.statistics.percentage_filled = if total.is_zero() {
        Decimal::ZERO
    } else {
        precise(venue.filled * Decimal::ONE_HUNDRED / total)
    };

    order.base.size_filled = precise(venue.filled);
    order.quoted.size_filled = precise(venue.cost);
    order.base.amount_received = precise(venue.amount);
    order.quoted.amount_received = precise(venue.cost);

    order.statistics.fees_paid = order.asset(asset).fees_paid;

    previous
}

/// Close the order if the report says so, then reconcile its statistics.
pub fn synchronize(
    order: &mut OrderRuntime,
    venue: &VenueOrder,
    asset: DenominatingAsset,
) -> SyncStep {
    let closed = infer_exit(venue).filter(|exit| order.close(*exit));
    let previous = sync_statistics(order, venue, asset);
    SyncStep { previous, closed }
}
