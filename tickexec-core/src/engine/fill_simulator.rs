//! Fill simulation for Backtesting and Paper sessions.
//!
//! Slippage is directional and applies to market orders only: buyers get a
//! worse (higher) rate, sellers a worse (lower) one. Limit orders execute at
//! their own rate. Fees are a percentage of the order size: taker for market
//! orders, maker for limit orders, unless the order declares its own.

use rust_decimal::Decimal;

use crate::domain::{
    DenominatingAsset, ExitType, FillSnapshot, OrderKind, OrderRole, OrderRuntime, OrderSide,
    SimulatedExchangeEvents,
};
use crate::ports::FormulaRegistry;
use crate::precision::{percent_of, precise};
use crate::session::{FeeStructure, SessionParameters, Slippage};

/// Result of one simulation step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedStep {
    /// Fill figures before the step, for the accounting ledger.
    pub previous: FillSnapshot,
    /// True if the step filled the order completely and closed it.
    pub closed: bool,
}

/// Session-level friction used when an order does not declare its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct FillSimulator {
    pub slippage: Slippage,
    pub fees: FeeStructure,
}

impl FillSimulator {
    pub fn new(parameters: &SessionParameters) -> Self {
        Self {
            slippage: parameters.slippage,
            fees: parameters.fee_structure,
        }
    }

    /// Rate after session slippage.
    pub fn slipped_rate(&self, role: OrderRole, rate: Decimal) -> Decimal {
        if role.kind() == OrderKind::Limit {
            return rate;
        }
        let slippage = percent_of(rate, self.slippage.position_rate);
        match role.side() {
            OrderSide::Buy => precise(rate + slippage),
            OrderSide::Sell => precise(rate - slippage),
        }
    }

    fn session_fee_percentage(&self, role: OrderRole) -> Decimal {
        match role.kind() {
            OrderKind::Market => self.fees.taker,
            OrderKind::Limit => self.fees.maker,
        }
    }

    /// Set the order's actual rate.
    ///
    /// A rate resolved from the order's own formula is computed once and then
    /// kept; otherwise the session slippage is applied to the order rate.
    pub fn simulate_actual_rate(
        &self,
        role: OrderRole,
        events: &SimulatedExchangeEvents,
        order: &mut OrderRuntime,
        formulas: &dyn FormulaRegistry,
    ) {
        if order.statistics.actual_rate_from_formula {
            return;
        }
        let from_formula = events
            .simulated_actual_rate
            .as_ref()
            .and_then(|node| node.formula.as_ref())
            .and_then(|formula| formulas.resolve(formula));

        match from_formula {
            Some(rate) => {
                order.statistics.actual_rate = precise(rate);
                order.statistics.actual_rate_from_formula = true;
            }
            None => order.statistics.actual_rate = self.slipped_rate(role, order.rate),
        }
    }

    /// Set the fees paid on both assets.
    ///
    /// A declared fee percentage is charged once per asset, on the first step
    /// that finds that asset's fee still at zero. Without one, the session
    /// maker/taker fee is recomputed on every step.
    pub fn simulate_fees(
        &self,
        role: OrderRole,
        events: &SimulatedExchangeEvents,
        order: &mut OrderRuntime,
    ) {
        let declared = events
            .simulated_fees_paid
            .as_ref()
            .and_then(|fees| fees.percentage);

        match declared {
            Some(percentage) => {
                if order.base.fees_paid.is_zero() {
                    order.base.fees_paid = percent_of(order.base.size, percentage);
                }
                if order.quoted.fees_paid.is_zero() {
                    order.quoted.fees_paid = percent_of(order.quoted.size, percentage);
                }
            }
            None => {
                let percentage = self.session_fee_percentage(role);
                order.base.fees_paid = percent_of(order.base.size, percentage);
                order.quoted.fees_paid = percent_of(order.quoted.size, percentage);
            }
        }
    }

    /// Advance the filled percentage by the declared fill probability.
    /// Returns true if the order reached 100% and was closed as Filled.
    pub fn simulate_partial_fill(
        &self,
        events: &SimulatedExchangeEvents,
        order: &mut OrderRuntime,
    ) -> bool {
        let Some(probability) = events
            .simulated_partial_fill
            .as_ref()
            .and_then(|fill| fill.fill_probability)
        else {
            return false;
        };

        let filled = precise(
            (order.statistics.percentage_filled + probability * Decimal::ONE_HUNDRED)
                .min(Decimal::ONE_HUNDRED),
        );
        order.statistics.percentage_filled = filled;

        filled == Decimal::ONE_HUNDRED && order.close(ExitType::Filled)
    }

    /// Run one full simulation step on an open order.
    pub fn simulate(
        &self,
        role: OrderRole,
        events: &SimulatedExchangeEvents,
        order: &mut OrderRuntime,
        asset: DenominatingAsset,
        formulas: &dyn FormulaRegistry,
    ) -> SimulatedStep {
        let previous = order.fill_snapshot();

        self.simulate_actual_rate(role, events, order, formulas);
        self.simulate_fees(role, events, order);
        let closed = self.simulate_partial_fill(events, order);

        let pct = order.statistics.percentage_filled;
        order.base.size_filled = percent_of(order.base.size, pct);
        order.quoted.size_filled = percent_of(order.quoted.size, pct);
        order.statistics.fees_paid = order.asset(asset).fees_paid;

        SimulatedStep { previous, closed }
    }
}
