//! Everything a tick reads besides the strategy tree and the order book.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Balance, NodeId, Position};
use crate::ports::FormulaRegistry;
use crate::session::{SessionParameters, SessionType};

/// The candle the tick runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    pub begin: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Counters that span the whole episode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeCounters {
    /// Orders opened so far; doubles as the next order's serial number.
    pub orders: u64,
}

/// Ticks since the last create / close. Zero means "never".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistanceToEvent {
    pub create_order: u64,
    pub close_order: u64,
}

impl DistanceToEvent {
    /// Called by the host once per tick, before `run_tick`.
    pub fn advance(&mut self) {
        if self.create_order > 0 {
            self.create_order += 1;
        }
        if self.close_order > 0 {
            self.close_order += 1;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticError {
    pub node_id: NodeId,
    pub message: String,
}

/// Pass/fail of one evaluated situation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SituationValue {
    pub situation_id: NodeId,
    pub passed: bool,
}

/// Per-tick observations for the host: configuration errors, highlighted
/// nodes of triggered situations, and every situation evaluated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub errors: Vec<DiagnosticError>,
    pub highlights: Vec<NodeId>,
    pub values: Vec<SituationValue>,
}

impl Diagnostics {
    pub fn error(&mut self, node_id: NodeId, message: impl Into<String>) {
        self.errors.push(DiagnosticError {
            node_id,
            message: message.into(),
        });
    }

    pub fn highlight(&mut self, node_id: NodeId) {
        self.highlights.push(node_id);
    }

    pub fn value(&mut self, situation_id: NodeId, passed: bool) {
        self.values.push(SituationValue {
            situation_id,
            passed,
        });
    }

    pub fn clear(&mut self) {
        self.errors.clear();
        self.highlights.clear();
        self.values.clear();
    }
}

/// Mutable and read-only state handed to every tick.
pub struct ExecutionContext<'a> {
    pub session_type: SessionType,
    pub parameters: SessionParameters,
    pub position: Position,
    pub balance: Balance,
    pub candle: Candle,
    pub formulas: &'a dyn FormulaRegistry,
    pub episode: EpisodeCounters,
    pub distance_to_event: DistanceToEvent,
    pub diagnostics: Diagnostics,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(
        session_type: SessionType,
        parameters: SessionParameters,
        candle: Candle,
        formulas: &'a dyn FormulaRegistry,
    ) -> Self {
        Self {
            session_type,
            parameters,
            position: Position::default(),
            balance: Balance::default(),
            candle,
            formulas,
            episode: EpisodeCounters::default(),
            distance_to_event: DistanceToEvent::default(),
            diagnostics: Diagnostics::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_only_advances_after_first_event() {
        let mut distance = DistanceToEvent::default();
        distance.advance();
        assert_eq!(distance.create_order, 0);

        distance.create_order = 1;
        distance.advance();
        distance.advance();
        assert_eq!(distance.create_order, 3);
        assert_eq!(distance.close_order, 0);
    }

    #[test]
    fn diagnostics_clear_between_ticks() {
        let mut diagnostics = Diagnostics::default();
        diagnostics.error(NodeId::from("n1"), "boom");
        diagnostics.highlight(NodeId::from("n2"));
        diagnostics.value(NodeId::from("s1"), false);
        assert_eq!(diagnostics.errors.len(), 1);

        diagnostics.clear();
        assert_eq!(diagnostics, Diagnostics::default());
    }
}
