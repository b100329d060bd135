//! Shared test harness: scripted collaborators and strategy-tree builders.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use tickexec_core::context::Candle;
use tickexec_core::domain::{
    Condition, ExchangeOrderId, ExecutionAlgorithm, ExecutionNode, FormulaId, FormulaNode, NodeId,
    OrderConfig, OrderDefinition, OrderRuntime, RuntimeId, Situation, TradingEvent,
};
use tickexec_core::ports::{
    Announcement, Announcer, ConditionEvaluator, ExchangeGateway, FormulaRegistry, VenueError,
    VenueOrder,
};

// ─── Collaborators ───────────────────────────────────────────────────

/// Passes exactly the situations whose id has been switched on.
#[derive(Default)]
pub struct ScriptedConditions {
    passing: Mutex<HashSet<String>>,
}

impl ScriptedConditions {
    pub fn passing(ids: &[&str]) -> Self {
        let conditions = Self::default();
        conditions.set(ids);
        conditions
    }

    pub fn set(&self, ids: &[&str]) {
        let mut passing = self.passing.lock().unwrap();
        passing.clear();
        passing.extend(ids.iter().map(|id| id.to_string()));
    }
}

impl ConditionEvaluator for ScriptedConditions {
    fn check_conditions(&self, situation: &Situation) -> bool {
        self.passing.lock().unwrap().contains(situation.id.as_str())
    }
}

/// Fixed formula values.
#[derive(Default)]
pub struct StaticFormulas {
    values: HashMap<FormulaId, Decimal>,
}

impl StaticFormulas {
    pub fn new(values: &[(&str, Decimal)]) -> Self {
        Self {
            values: values
                .iter()
                .map(|(id, value)| (FormulaId::from(*id), *value))
                .collect(),
        }
    }
}

impl FormulaRegistry for StaticFormulas {
    fn resolve(&self, formula: &FormulaId) -> Option<Decimal> {
        self.values.get(formula).copied()
    }
}

/// Records every announcement for later assertions.
#[derive(Clone, Default)]
pub struct RecordingAnnouncer {
    announcements: Arc<Mutex<Vec<Announcement>>>,
}

impl RecordingAnnouncer {
    pub fn announcements(&self) -> Vec<Announcement> {
        self.announcements.lock().unwrap().clone()
    }
}

impl Announcer for RecordingAnnouncer {
    fn notify(&self, announcement: Announcement) {
        self.announcements.lock().unwrap().push(announcement);
    }
}

/// Venue whose answers are queued up front.
///
/// With an empty queue `create_order` hands out sequential ids,
/// `get_order` reports nothing and `cancel_order` confirms.
#[derive(Default)]
pub struct ScriptedVenue {
    creates: Mutex<VecDeque<Result<Option<ExchangeOrderId>, VenueError>>>,
    reports: Mutex<VecDeque<Result<Option<VenueOrder>, VenueError>>>,
    cancels: Mutex<VecDeque<Result<bool, VenueError>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedVenue {
    pub fn push_create(&self, response: Result<Option<ExchangeOrderId>, VenueError>) {
        self.creates.lock().unwrap().push_back(response);
    }

    pub fn push_report(&self, response: Result<Option<VenueOrder>, VenueError>) {
        self.reports.lock().unwrap().push_back(response);
    }

    pub fn push_cancel(&self, response: Result<bool, VenueError>) {
        self.cancels.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn log(&self, call: &str, order: &OrderRuntime) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{call}:{}", order.id));
    }
}

#[async_trait]
impl ExchangeGateway for ScriptedVenue {
    async fn create_order(
        &self,
        _definition: &OrderDefinition,
        order: &OrderRuntime,
    ) -> Result<Option<ExchangeOrderId>, VenueError> {
        self.log("create", order);
        let next = self.creates.lock().unwrap().pop_front();
        next.unwrap_or_else(|| {
            let n = self.calls.lock().unwrap().len();
            Ok(Some(ExchangeOrderId::new(format!("X-{n}"))))
        })
    }

    async fn get_order(
        &self,
        _definition: &OrderDefinition,
        order: &OrderRuntime,
    ) -> Result<Option<VenueOrder>, VenueError> {
        self.log("get", order);
        let next = self.reports.lock().unwrap().pop_front();
        next.unwrap_or(Ok(None))
    }

    async fn cancel_order(
        &self,
        _definition: &OrderDefinition,
        order: &OrderRuntime,
    ) -> Result<bool, VenueError> {
        self.log("cancel", order);
        let next = self.cancels.lock().unwrap().pop_front();
        next.unwrap_or(Ok(true))
    }

    fn venue_name(&self) -> &'static str {
        "scripted"
    }
}

// ─── Builders ────────────────────────────────────────────────────────

pub fn candle(hour: i64) -> Candle {
    let begin: DateTime<Utc> = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hour);
    Candle {
        begin,
        end: begin + Duration::hours(1),
    }
}

/// An event with one single-condition situation per id.
pub fn event(id: &str, situations: &[&str]) -> TradingEvent {
    TradingEvent {
        id: NodeId::from(id),
        name: id.to_string(),
        situations: situations
            .iter()
            .map(|situation| Situation {
                id: NodeId::from(*situation),
                name: situation.to_string(),
                conditions: vec![Condition {
                    id: NodeId::new(format!("{situation}-condition")),
                    name: String::new(),
                    code: "true".into(),
                }],
            })
            .collect(),
    }
}

pub fn definition(id: &str, runtime: &str, percentage: Decimal) -> OrderDefinition {
    OrderDefinition {
        id: NodeId::from(id),
        name: id.to_string(),
        runtime: Some(RuntimeId::from(runtime)),
        create_order_event: Some(event(&format!("{id}-create"), &[&format!("{id}-open")])),
        cancel_order_event: Some(event(&format!("{id}-cancel"), &[&format!("{id}-close")])),
        config: OrderConfig {
            position_size_percentage: Some(percentage),
            spawn_multiple_orders: false,
        },
        position_rate: None,
        simulated_exchange_events: None,
    }
}

/// Algorithm sized by formula `size-base` / `size-quoted`.
pub fn algorithm(id: &str) -> ExecutionAlgorithm {
    ExecutionAlgorithm {
        id: NodeId::from(id),
        name: id.to_string(),
        market_buy_orders: vec![],
        market_sell_orders: vec![],
        limit_buy_orders: vec![],
        limit_sell_orders: vec![],
        size_in_base_asset: Some(FormulaNode {
            id: NodeId::new(format!("{id}-size-base")),
            formula: Some(FormulaId::from("size-base")),
        }),
        size_in_quoted_asset: Some(FormulaNode {
            id: NodeId::new(format!("{id}-size-quoted")),
            formula: Some(FormulaId::from("size-quoted")),
        }),
    }
}

pub fn node(algorithms: Vec<ExecutionAlgorithm>) -> ExecutionNode {
    ExecutionNode {
        id: NodeId::from("node"),
        name: "execution".into(),
        execution_algorithms: algorithms,
    }
}
