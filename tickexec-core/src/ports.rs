//! Collaborator traits the core calls out to.
//!
//! The core never talks to an exchange, evaluates condition code, computes a
//! formula, or delivers a notification itself. Hosts inject implementations
//! of these traits; [`NullAnnouncer`] and [`NoVenue`] cover sessions that do
//! not need a collaborator.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ExchangeOrderId, FormulaId, NodeId, OrderDefinition, OrderRuntime, Situation};

/// Decides whether every condition of a situation holds on the current candle.
pub trait ConditionEvaluator: Send + Sync {
    fn check_conditions(&self, situation: &Situation) -> bool;
}

/// Read-only access to the current value of the strategy's formulas.
pub trait FormulaRegistry: Send + Sync {
    /// `None` when the formula has no value on this candle.
    fn resolve(&self, formula: &FormulaId) -> Option<Decimal>;
}

/// Failure talking to a venue. The core logs these and retries next tick.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VenueError {
    #[error("venue rejected the request: {0}")]
    Rejected(String),

    #[error("venue transport failure: {0}")]
    Transport(String),

    #[error("order {0} not found at the venue")]
    NotFound(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VenueOrderStatus {
    Open,
    Closed,
    Cancelled,
}

/// An order as reported by the venue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VenueOrder {
    /// Base quantity filled so far.
    pub filled: Decimal,
    /// Base quantity still working.
    pub remaining: Decimal,
    /// Quoted amount spent or received.
    pub cost: Decimal,
    /// Average fill price.
    pub price: Decimal,
    /// Net base amount after the venue took its fee.
    pub amount: Decimal,
    pub status: VenueOrderStatus,
}

/// Exchange gateway used by Live and Forward-testing sessions.
#[async_trait]
pub trait ExchangeGateway: Send + Sync {
    /// Place an order. `Ok(Some(id))` is the only outcome that opens it.
    async fn create_order(
        &self,
        definition: &OrderDefinition,
        order: &OrderRuntime,
    ) -> Result<Option<ExchangeOrderId>, VenueError>;

    async fn get_order(
        &self,
        definition: &OrderDefinition,
        order: &OrderRuntime,
    ) -> Result<Option<VenueOrder>, VenueError>;

    /// `Ok(true)` only when the venue confirmed the cancellation.
    async fn cancel_order(
        &self,
        definition: &OrderDefinition,
        order: &OrderRuntime,
    ) -> Result<bool, VenueError>;

    /// Venue name for logging.
    fn venue_name(&self) -> &'static str;
}

/// A create or cancel event fired on a situation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub event_id: NodeId,
    pub event_name: String,
    pub situation_id: NodeId,
    pub situation_name: String,
    pub order_id: NodeId,
    pub order_name: String,
}

/// Fire-and-forget notification sink. `notify` must return quickly.
pub trait Announcer: Send + Sync {
    fn notify(&self, announcement: Announcement);
}

/// Drops every announcement.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAnnouncer;

impl Announcer for NullAnnouncer {
    fn notify(&self, _announcement: Announcement) {}
}

/// Gateway for sessions with no venue. Every request is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVenue;

#[async_trait]
impl ExchangeGateway for NoVenue {
    async fn create_order(
        &self,
        _definition: &OrderDefinition,
        _order: &OrderRuntime,
    ) -> Result<Option<ExchangeOrderId>, VenueError> {
        Err(VenueError::Rejected("no venue configured".into()))
    }

    async fn get_order(
        &self,
        _definition: &OrderDefinition,
        _order: &OrderRuntime,
    ) -> Result<Option<VenueOrder>, VenueError> {
        Err(VenueError::Rejected("no venue configured".into()))
    }

    async fn cancel_order(
        &self,
        _definition: &OrderDefinition,
        _order: &OrderRuntime,
    ) -> Result<bool, VenueError> {
        Err(VenueError::Rejected("no venue configured".into()))
    }

    fn venue_name(&self) -> &'static str {
        "none"
    }
}
