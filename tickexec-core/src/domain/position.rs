//! Position (read-only input) and running account balance.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::precision::precise;

/// The current open position as seen by the execution core.
///
/// Its base size decides the denominating asset for the whole tick and its
/// rate is the default order rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub base_size: Decimal,
    pub quoted_size: Decimal,
    pub rate: Decimal,
}

impl Position {
    pub fn new(base_size: Decimal, quoted_size: Decimal, rate: Decimal) -> Self {
        Self {
            base_size,
            quoted_size,
            rate,
        }
    }
}

/// Running account balance in both assets.
///
/// Mutated only by the accounting ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub base: Decimal,
    pub quoted: Decimal,
}

impl Balance {
    pub fn new(base: Decimal, quoted: Decimal) -> Self {
        Self {
            base: precise(base),
            quoted: precise(quoted),
        }
    }
}
