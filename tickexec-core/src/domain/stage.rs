//! Stage aggregates: what every order of the active stage has placed and filled.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::asset::DenominatingAsset;

/// Aggregate figures of one asset across all orders of a stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StageAsset {
    /// Sum of the sizes of all orders placed in this stage, less released
    /// remainders of cancelled orders.
    pub size: Decimal,
    pub size_filled: Decimal,
    pub amount_received: Decimal,
    pub fees_paid: Decimal,
}

/// The active stage.
///
/// Asset records are optional: a stage whose records are not initialised yet
/// is "not ready" and every tick against it is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub base: Option<StageAsset>,
    pub quoted: Option<StageAsset>,
}

impl Stage {
    /// A stage with both asset records initialised to zero.
    pub fn ready() -> Self {
        Self {
            base: Some(StageAsset::default()),
            quoted: Some(StageAsset::default()),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.base.is_some() && self.quoted.is_some()
    }

    pub fn asset(&self, asset: DenominatingAsset) -> Option<&StageAsset> {
        match asset {
            DenominatingAsset::Base => self.base.as_ref(),
            DenominatingAsset::Quoted => self.quoted.as_ref(),
        }
    }
}

/// Per-asset stage size ceilings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StageLimits {
    pub base: Decimal,
    pub quoted: Decimal,
}

impl StageLimits {
    pub fn new(base: Decimal, quoted: Decimal) -> Self {
        Self { base, quoted }
    }

    pub fn for_asset(&self, asset: DenominatingAsset) -> Decimal {
        match asset {
            DenominatingAsset::Base => self.base,
            DenominatingAsset::Quoted => self.quoted,
        }
    }
}

/// Opening/closing flags of the stage for the current tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFlags {
    pub opening: bool,
    pub closing: bool,
}

impl StageFlags {
    pub fn open() -> Self {
        Self {
            opening: true,
            closing: false,
        }
    }

    pub fn closing() -> Self {
        Self {
            opening: false,
            closing: true,
        }
    }
}
