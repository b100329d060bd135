//! Scenario runner: wires the scripted collaborators into the execution core
//! and drives one `run_tick` per scripted candle.
//!
//! Two entry points:
//! - `run_scenario()`: replays an already-loaded scenario.
//! - `run_scenario_file()`: loads, validates and replays a TOML file. Used by the CLI.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use tickexec_core::domain::{
    AssetLedger, Balance, ExitType, NodeId, OrderAuditEntry, OrderRole, OrderRuntime,
    OrderStatistics, OrderStatus, RuntimeId, Stage,
};
use tickexec_core::ports::{Announcement, ExchangeGateway, NoVenue};
use tickexec_core::{
    DistanceToEvent, ExecutionContext, ExecutionError, OrderBook, SessionType, TradingExecution,
};

use crate::config::{ConfigError, Fingerprint, ScenarioConfig};
use crate::scripted::{AnnouncementLog, ScriptedConditions, ScriptedFormulas};
use crate::venue::ReplayVenue;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("tick {tick} aborted: {source}")]
    Execution {
        tick: usize,
        #[source]
        source: ExecutionError,
    },
    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write report {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// State after one tick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TickSnapshot {
    pub index: usize,
    pub begin: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub stage: Stage,
    pub balance: Balance,
    pub open_orders: Vec<RuntimeId>,
    pub highlights: Vec<NodeId>,
    pub distance_to_event: DistanceToEvent,
}

/// Final state of one order runtime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderSummary {
    pub runtime: RuntimeId,
    pub serial_number: u64,
    pub order_name: String,
    pub role: Option<OrderRole>,
    pub status: OrderStatus,
    pub exit_type: Option<ExitType>,
    pub rate: Decimal,
    pub periods: u64,
    pub base: AssetLedger,
    pub quoted: AssetLedger,
    pub statistics: OrderStatistics,
}

impl From<&OrderRuntime> for OrderSummary {
    fn from(order: &OrderRuntime) -> Self {
        Self {
            runtime: order.id.clone(),
            serial_number: order.serial_number,
            order_name: order.order_name.clone(),
            role: order.role,
            status: order.status(),
            exit_type: order.exit_type(),
            rate: order.rate,
            periods: order.counters.periods,
            base: order.base,
            quoted: order.quoted,
            statistics: order.statistics,
        }
    }
}

/// A configuration error recorded on a tick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TickError {
    pub tick: usize,
    pub node_id: NodeId,
    pub message: String,
}

/// Complete result of a scenario replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub scenario: String,
    pub session_type: SessionType,
    pub fingerprint: Fingerprint,
    pub orders_opened: u64,
    pub final_balance: Balance,
    pub final_stage: Stage,
    pub ticks: Vec<TickSnapshot>,
    pub orders: Vec<OrderSummary>,
    pub audit_trail: Vec<OrderAuditEntry>,
    pub announcements: Vec<Announcement>,
    pub errors: Vec<TickError>,
}

impl ScenarioReport {
    pub fn to_json(&self) -> Result<String, RunError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as pretty JSON.
    pub fn write_json(&self, path: &Path) -> Result<(), RunError> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|source| RunError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn order(&self, runtime: &str) -> Option<&OrderSummary> {
        self.orders.iter().find(|order| order.runtime.as_str() == runtime)
    }
}

/// Load, validate and replay a scenario file.
pub async fn run_scenario_file(path: &Path) -> Result<ScenarioReport, RunError> {
    let config = ScenarioConfig::from_file(path)?;
    run_scenario(&config).await
}

/// Replay a scenario.
///
/// Configuration errors are recorded in the report and the replay continues
/// with the next tick, unless the scenario sets `stop_on_error`.
pub async fn run_scenario(config: &ScenarioConfig) -> Result<ScenarioReport, RunError> {
    config.validate()?;
    let fingerprint = config.fingerprint()?;
    let session_type = config.scenario.session_type;

    let conditions = Arc::new(ScriptedConditions::new());
    let formulas = ScriptedFormulas::new(&config.formulas);
    let announcements = Arc::new(AnnouncementLog::new());
    let venue: Arc<dyn ExchangeGateway> = match config.venue {
        Some(venue) => Arc::new(ReplayVenue::new(venue)),
        None => Arc::new(NoVenue),
    };
    let execution = TradingExecution::new(conditions.clone(), venue, announcements.clone());

    let mut ctx = ExecutionContext::new(session_type, config.session, config.candle(0)?, &formulas);
    ctx.balance = config.balance;
    ctx.position = config.position;
    let mut book = OrderBook::new();
    let mut stage = Stage::ready();
    let mut ticks = Vec::with_capacity(config.ticks.len());
    let mut errors = Vec::new();

    info!(
        scenario = %config.scenario.name,
        session = ?session_type,
        fingerprint = %fingerprint,
        ticks = config.ticks.len(),
        "scenario started"
    );

    for (index, script) in config.ticks.iter().enumerate() {
        if script.new_stage {
            let recycled = book.recycle_closed();
            stage = Stage::ready();
            debug!(tick = index, recycled, "new stage");
        }
        conditions.set_tick(&script.conditions);
        formulas.update(&script.formulas);
        if let Some(position) = script.position {
            ctx.position = position;
        }
        ctx.candle = config.candle(index)?;
        ctx.diagnostics.clear();
        ctx.distance_to_event.advance();

        let outcome = execution
            .run_tick(
                &mut ctx,
                &config.strategy,
                &mut book,
                script.stage.flags(),
                config.stage_limits,
                &mut stage,
            )
            .await;

        errors.extend(ctx.diagnostics.errors.iter().map(|error| TickError {
            tick: index,
            node_id: error.node_id.clone(),
            message: error.message.clone(),
        }));
        if let Err(source) = outcome {
            warn!(tick = index, error = %source, "tick aborted");
            if config.scenario.stop_on_error {
                return Err(RunError::Execution { tick: index, source });
            }
        }

        ticks.push(TickSnapshot {
            index,
            begin: ctx.candle.begin,
            end: ctx.candle.end,
            stage: stage.clone(),
            balance: ctx.balance,
            open_orders: book.open_orders().map(|order| order.id.clone()).collect(),
            highlights: ctx.diagnostics.highlights.clone(),
            distance_to_event: ctx.distance_to_event,
        });
    }

    info!(
        scenario = %config.scenario.name,
        orders_opened = ctx.episode.orders,
        errors = errors.len(),
        "scenario finished"
    );

    Ok(ScenarioReport {
        schema_version: SCHEMA_VERSION,
        scenario: config.scenario.name.clone(),
        session_type,
        fingerprint,
        orders_opened: ctx.episode.orders,
        final_balance: ctx.balance,
        final_stage: stage,
        ticks,
        orders: book.iter().map(OrderSummary::from).collect(),
        audit_trail: book.audit_trail().to_vec(),
        announcements: announcements.drain(),
        errors,
    })
}
