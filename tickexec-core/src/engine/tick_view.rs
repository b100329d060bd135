//! Validated per-tick view of the stage.

use rust_decimal::Decimal;

use crate::domain::{DenominatingAsset, Position, Stage, StageAsset, StageFlags, StageLimits};

/// Mutable handles on both stage asset records, proven present.
#[derive(Debug)]
pub struct StageLedger<'s> {
    pub base: &'s mut StageAsset,
    pub quoted: &'s mut StageAsset,
}

impl StageLedger<'_> {
    pub fn asset(&self, asset: DenominatingAsset) -> &StageAsset {
        match asset {
            DenominatingAsset::Base => &*self.base,
            DenominatingAsset::Quoted => &*self.quoted,
        }
    }
}

/// Everything the orchestrator resolves once at the start of a tick.
#[derive(Debug)]
pub struct TickView<'s> {
    pub asset: DenominatingAsset,
    /// Stage size limit in the denominating asset.
    pub limit: Decimal,
    pub flags: StageFlags,
    pub stage: StageLedger<'s>,
}

impl<'s> TickView<'s> {
    /// `None` while either stage asset record is missing.
    pub fn new(
        stage: &'s mut Stage,
        position: &Position,
        flags: StageFlags,
        limits: StageLimits,
    ) -> Option<Self> {
        let (base, quoted) = match (stage.base.as_mut(), stage.quoted.as_mut()) {
            (Some(base), Some(quoted)) => (base, quoted),
            _ => return None,
        };
        let asset = DenominatingAsset::from_position(position);
        Some(Self {
            asset,
            limit: limits.for_asset(asset),
            flags,
            stage: StageLedger { base, quoted },
        })
    }

    /// Size already placed in the denominating asset this stage.
    pub fn accumulated(&self) -> Decimal {
        self.stage.asset(self.asset).size
    }
}
