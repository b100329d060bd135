//! Domain types for the execution core

pub mod asset;
pub mod ids;
pub mod order;
pub mod position;
pub mod stage;
pub mod strategy;

pub use asset::{AssetLedger, DenominatingAsset, FillSnapshot};
pub use ids::{ExchangeOrderId, FormulaId, NodeId, RuntimeId};
pub use order::{
    ExitType, Lock, OpenOrder, OrderAuditEntry, OrderCounters, OrderKind, OrderRole, OrderRuntime,
    OrderSide, OrderStatistics, OrderStatus, ONE_DAY_IN_MILLISECONDS,
};
pub use position::{Balance, Position};
pub use stage::{Stage, StageAsset, StageFlags, StageLimits};
pub use strategy::{
    Condition, ExecutionAlgorithm, ExecutionNode, FormulaNode, OrderConfig, OrderDefinition,
    SimulatedExchangeEvents, SimulatedFeesPaid, SimulatedPartialFill, Situation, TradingEvent,
};
