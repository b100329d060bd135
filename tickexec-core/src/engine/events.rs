//! Trading event evaluation: ordered situations, first match wins.

use tracing::debug;

use crate::context::Diagnostics;
use crate::domain::{ExecutionAlgorithm, ExecutionNode, OrderDefinition, Situation, TradingEvent};
use crate::ports::{Announcement, Announcer, ConditionEvaluator};

/// The tree path an event is evaluated under; highlighted when it fires.
#[derive(Debug, Clone, Copy)]
pub struct EventScope<'a> {
    pub node: &'a ExecutionNode,
    pub algorithm: &'a ExecutionAlgorithm,
    pub order: &'a OrderDefinition,
}

/// Evaluate `event` and return the first situation that holds.
///
/// A situation without conditions never holds. Every evaluated situation is
/// recorded in `diagnostics.values`; on a match its path is highlighted and
/// the event is announced.
pub fn evaluate_event<'e>(
    event: &'e TradingEvent,
    scope: EventScope<'_>,
    evaluator: &dyn ConditionEvaluator,
    announcer: &dyn Announcer,
    diagnostics: &mut Diagnostics,
) -> Option<&'e Situation> {
    for situation in &event.situations {
        let passed = !situation.conditions.is_empty() && evaluator.check_conditions(situation);
        diagnostics.value(situation.id.clone(), passed);
        debug!(
            event = %event.id,
            situation = %situation.id,
            passed,
            "situation evaluated"
        );
        if !passed {
            continue;
        }

        diagnostics.highlight(situation.id.clone());
        diagnostics.highlight(event.id.clone());
        diagnostics.highlight(scope.order.id.clone());
        diagnostics.highlight(scope.algorithm.id.clone());
        diagnostics.highlight(scope.node.id.clone());

        announcer.notify(Announcement {
            event_id: event.id.clone(),
            event_name: event.name.clone(),
            situation_id: situation.id.clone(),
            situation_name: situation.name.clone(),
            order_id: scope.order.id.clone(),
            order_name: scope.order.name.clone(),
        });
        return Some(situation);
    }
    None
}
