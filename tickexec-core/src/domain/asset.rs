//! Per-asset ledgers and the denominating-asset selector.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::position::Position;

/// Which side of the pair denominates sizing and stage limits for a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DenominatingAsset {
    Base,
    Quoted,
}

impl DenominatingAsset {
    /// Base-denominated iff the current position holds a positive base size.
    pub fn from_position(position: &Position) -> Self {
        if position.base_size > Decimal::ZERO {
            Self::Base
        } else {
            Self::Quoted
        }
    }
}

/// Size and fill bookkeeping of one order on one asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetLedger {
    pub size: Decimal,
    pub size_filled: Decimal,
    pub amount_received: Decimal,
    pub fees_paid: Decimal,
}

/// The fill/fee figures of an order at one point in time.
///
/// The accounting ledger always receives two of these: the snapshot taken
/// before a simulation or venue sync, and the one after.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FillSnapshot {
    pub base_size_filled: Decimal,
    pub quoted_size_filled: Decimal,
    pub base_fees_paid: Decimal,
    pub quoted_fees_paid: Decimal,
}

impl FillSnapshot {
    pub fn of(base: &AssetLedger, quoted: &AssetLedger) -> Self {
        Self {
            base_size_filled: base.size_filled,
            quoted_size_filled: quoted.size_filled,
            base_fees_paid: base.fees_paid,
            quoted_fees_paid: quoted.fees_paid,
        }
    }
}
