//! The execution engine: per-tick orchestration and the pieces it drives.
//!
//! - [`execution`]: the order lifecycle orchestrator
//! - [`sizing`]: order rate and size resolution
//! - [`fill_simulator`]: simulated fills for Backtesting and Paper sessions
//! - [`synchronizer`]: reconciliation with venue reports
//! - [`accounting`]: stage aggregates and balance updates
//! - [`order_book`]: order runtime registry and audit trail

pub mod accounting;
pub mod events;
pub mod execution;
pub mod fill_simulator;
pub mod order_book;
pub mod sizing;
pub mod synchronizer;
pub mod tick_view;

pub use accounting::{account_opened_order, apply_fill_delta, recalculate_stage_size};
pub use events::{evaluate_event, EventScope};
pub use execution::TradingExecution;
pub use fill_simulator::{FillSimulator, SimulatedStep};
pub use order_book::OrderBook;
pub use sizing::{
    clip_to_stage_limit, estimate_opposite_size, resolve_rate, resolve_size, size_order,
    OrderSizing,
};
pub use synchronizer::{infer_exit, sync_statistics, synchronize, SyncStep};
pub use tick_view::{StageLedger, TickView};
