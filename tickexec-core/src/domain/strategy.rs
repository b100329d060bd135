//! Strategy-authored execution tree: nodes, algorithms, order definitions, events.
//!
//! These types are immutable during a tick. They derive `serde` so a host can
//! load them from whatever format it keeps strategies in.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ids::{FormulaId, NodeId, RuntimeId};
use super::order::OrderRole;

/// Root of one tick's execution pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionNode {
    pub id: NodeId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub execution_algorithms: Vec<ExecutionAlgorithm>,
}

/// A named unit holding the four order-role buckets and the sizing formulas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionAlgorithm {
    pub id: NodeId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub market_buy_orders: Vec<OrderDefinition>,
    #[serde(default)]
    pub market_sell_orders: Vec<OrderDefinition>,
    #[serde(default)]
    pub limit_buy_orders: Vec<OrderDefinition>,
    #[serde(default)]
    pub limit_sell_orders: Vec<OrderDefinition>,
    #[serde(default)]
    pub size_in_base_asset: Option<FormulaNode>,
    #[serde(default)]
    pub size_in_quoted_asset: Option<FormulaNode>,
}

impl ExecutionAlgorithm {
    /// Buckets in processing order: market buy, market sell, limit buy, limit sell.
    pub fn buckets(&self) -> [(OrderRole, &[OrderDefinition]); 4] {
        [
            (OrderRole::MarketBuy, self.market_buy_orders.as_slice()),
            (OrderRole::MarketSell, self.market_sell_orders.as_slice()),
            (OrderRole::LimitBuy, self.limit_buy_orders.as_slice()),
            (OrderRole::LimitSell, self.limit_sell_orders.as_slice()),
        ]
    }
}

/// A node whose value comes from a formula in the strategy's registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaNode {
    pub id: NodeId,
    #[serde(default)]
    pub formula: Option<FormulaId>,
}

/// Strategy-authored description of one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDefinition {
    pub id: NodeId,
    #[serde(default)]
    pub name: String,
    /// Runtime record driven by this definition. Several definitions may share one.
    #[serde(default)]
    pub runtime: Option<RuntimeId>,
    #[serde(default)]
    pub create_order_event: Option<TradingEvent>,
    #[serde(default)]
    pub cancel_order_event: Option<TradingEvent>,
    #[serde(default)]
    pub config: OrderConfig,
    /// Overrides the position rate as the order rate.
    #[serde(default)]
    pub position_rate: Option<FormulaNode>,
    #[serde(default)]
    pub simulated_exchange_events: Option<SimulatedExchangeEvents>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderConfig {
    #[serde(default)]
    pub position_size_percentage: Option<Decimal>,
    #[serde(default)]
    pub spawn_multiple_orders: bool,
}

/// Parameters the fill simulator uses instead of the session-wide defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulatedExchangeEvents {
    #[serde(default)]
    pub simulated_actual_rate: Option<FormulaNode>,
    #[serde(default)]
    pub simulated_fees_paid: Option<SimulatedFeesPaid>,
    #[serde(default)]
    pub simulated_partial_fill: Option<SimulatedPartialFill>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedFeesPaid {
    pub id: NodeId,
    /// Fee as a percentage of the order size.
    #[serde(default)]
    pub percentage: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedPartialFill {
    pub id: NodeId,
    /// Fraction of the order filled per tick, in `[0, 1]`.
    #[serde(default)]
    pub fill_probability: Option<Decimal>,
}

/// A create- or cancel-order event: ordered situations, first match wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingEvent {
    pub id: NodeId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub situations: Vec<Situation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Situation {
    pub id: NodeId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// A boolean condition; its `code` is opaque to the core and interpreted by
/// the condition evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub id: NodeId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
}
