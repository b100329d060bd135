//! Order rate and size resolution.
//!
//! Small pure functions; [`size_order`] composes them in the order the
//! orchestrator needs: rate, raw size, stage-limit clip, opposite-asset
//! estimate. Nothing here touches the order or the stage.

use rust_decimal::Decimal;

use crate::domain::{DenominatingAsset, ExecutionAlgorithm, OrderDefinition, Position};
use crate::error::ConfigurationError;
use crate::ports::FormulaRegistry;
use crate::precision::{checked_percent_of, precise};

/// Resolved rate and sizes of an order about to be placed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderSizing {
    pub rate: Decimal,
    pub base_size: Decimal,
    pub quoted_size: Decimal,
}

impl OrderSizing {
    pub fn size_in(&self, asset: DenominatingAsset) -> Decimal {
        match asset {
            DenominatingAsset::Base => self.base_size,
            DenominatingAsset::Quoted => self.quoted_size,
        }
    }
}

/// The order rate: the position rate, unless the definition carries its own
/// position-rate formula.
pub fn resolve_rate(
    definition: &OrderDefinition,
    position: &Position,
    formulas: &dyn FormulaRegistry,
) -> Result<Decimal, ConfigurationError> {
    match definition
        .position_rate
        .as_ref()
        .and_then(|node| node.formula.as_ref().map(|formula| (node, formula)))
    {
        Some((node, formula)) => {
            let rate = formulas
                .resolve(formula)
                .ok_or_else(|| ConfigurationError::RateUndefined(node.id.clone()))?;
            if rate <= Decimal::ZERO {
                return Err(ConfigurationError::RateNotPositive(node.id.clone()));
            }
            Ok(precise(rate))
        }
        None if position.rate <= Decimal::ZERO => {
            Err(ConfigurationError::RateNotPositive(definition.id.clone()))
        }
        None => Ok(precise(position.rate)),
    }
}

/// Raw size in the denominating asset: the algorithm's size formula times
/// the definition's position size percentage.
pub fn resolve_size(
    algorithm: &ExecutionAlgorithm,
    definition: &OrderDefinition,
    asset: DenominatingAsset,
    formulas: &dyn FormulaRegistry,
) -> Result<Decimal, ConfigurationError> {
    let node = match asset {
        DenominatingAsset::Base => algorithm.size_in_base_asset.as_ref(),
        DenominatingAsset::Quoted => algorithm.size_in_quoted_asset.as_ref(),
    }
    .ok_or_else(|| ConfigurationError::MissingSizeNode(algorithm.id.clone()))?;

    let formula = node
        .formula
        .as_ref()
        .ok_or_else(|| ConfigurationError::MissingSizeFormula(node.id.clone()))?;

    let value = formulas
        .resolve(formula)
        .ok_or_else(|| ConfigurationError::SizeUndefined(node.id.clone()))?;

    let percentage = definition
        .config
        .position_size_percentage
        .ok_or_else(|| ConfigurationError::MissingPositionSizePercentage(definition.id.clone()))?;

    checked_percent_of(value, percentage)
        .ok_or_else(|| ConfigurationError::SizeOverflow(node.id.clone()))
}

/// Cap `size` so the stage never grows past `limit`.
///
/// `accumulated` is the stage size already placed in the denominating asset.
/// The result may be zero or negative once the stage is full.
pub fn clip_to_stage_limit(size: Decimal, accumulated: Decimal, limit: Decimal) -> Decimal {
    match accumulated.checked_add(size) {
        Some(total) if total <= limit => size,
        _ => precise(limit - accumulated),
    }
}

/// Estimate the size in the other asset at `rate`. Returns `(base, quoted)`,
/// or `None` when the estimate leaves the decimal range.
///
/// `rate` must be positive.
pub fn estimate_opposite_size(
    size: Decimal,
    asset: DenominatingAsset,
    rate: Decimal,
) -> Option<(Decimal, Decimal)> {
    match asset {
        DenominatingAsset::Base => Some((size, precise(size.checked_mul(rate)?))),
        DenominatingAsset::Quoted => Some((precise(size.checked_div(rate)?), size)),
    }
}

/// Rate, clipped size, and opposite-asset estimate for one order.
pub fn size_order(
    algorithm: &ExecutionAlgorithm,
    definition: &OrderDefinition,
    position: &Position,
    asset: DenominatingAsset,
    accumulated: Decimal,
    limit: Decimal,
    formulas: &dyn FormulaRegistry,
) -> Result<OrderSizing, ConfigurationError> {
    let rate = resolve_rate(definition, position, formulas)?;
    let raw = resolve_size(algorithm, definition, asset, formulas)?;
    let size = clip_to_stage_limit(raw, accumulated, limit);
    let (base_size, quoted_size) = estimate_opposite_size(size, asset, rate)
        .ok_or_else(|| ConfigurationError::SizeOverflow(definition.id.clone()))?;
    Ok(OrderSizing {
        rate,
        base_size,
        quoted_size,
    })
}
