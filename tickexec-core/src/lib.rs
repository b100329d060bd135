//! tickexec core: the per-tick order execution engine of a trading bot.
//!
//! Given a strategy's declarative order definitions and the market context of
//! one candle, the core creates, tracks, fills, reconciles and cancels orders
//! while keeping the stage aggregates and the account balance consistent:
//! - Domain types (order definitions, order runtimes, stage, position, balance)
//! - Sizing and rate resolution
//! - Fill simulation for Backtesting and Paper sessions
//! - Venue reconciliation for Live and Forward-testing sessions
//! - Undo/redo accounting of every fill
//! - Collaborator traits for conditions, formulas, venues and announcements

pub mod context;
pub mod domain;
pub mod engine;
pub mod error;
pub mod ports;
pub mod precision;
pub mod session;

pub use context::{Candle, Diagnostics, DistanceToEvent, EpisodeCounters, ExecutionContext};
pub use engine::{OrderBook, TradingExecution};
pub use error::{ConfigurationError, ExecutionError};
pub use session::{FeeStructure, SessionParameters, SessionType, Slippage};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything a host may share across threads is
    /// Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::OrderRuntime>();
        require_sync::<domain::OrderRuntime>();
        require_send::<domain::ExecutionNode>();
        require_sync::<domain::ExecutionNode>();
        require_send::<domain::Stage>();
        require_sync::<domain::Stage>();
        require_send::<OrderBook>();
        require_sync::<OrderBook>();
        require_send::<TradingExecution>();
        require_sync::<TradingExecution>();
        require_send::<ports::VenueOrder>();
        require_sync::<ports::Announcement>();
    }

    /// The orchestrator only sees collaborators through trait objects.
    #[test]
    fn collaborators_are_object_safe() {
        fn _build(
            evaluator: std::sync::Arc<dyn ports::ConditionEvaluator>,
            venue: std::sync::Arc<dyn ports::ExchangeGateway>,
            announcer: std::sync::Arc<dyn ports::Announcer>,
        ) -> TradingExecution {
            TradingExecution::new(evaluator, venue, announcer)
        }
    }
}
