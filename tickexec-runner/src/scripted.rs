//! Scripted collaborators: condition truths and formula values read from a
//! scenario's tick script, and an announcement log.
//!
//! The core only holds shared references to its collaborators, so the
//! runner updates these between ticks through interior mutability.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, PoisonError, RwLock};

use rust_decimal::Decimal;
use tracing::info;

use tickexec_core::domain::{FormulaId, Situation};
use tickexec_core::ports::{Announcement, Announcer, ConditionEvaluator, FormulaRegistry};

/// A situation holds when every one of its conditions is listed as true for
/// the current tick.
#[derive(Debug, Default)]
pub struct ScriptedConditions {
    truths: RwLock<HashSet<String>>,
}

impl ScriptedConditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the set of true conditions.
    pub fn set_tick(&self, conditions: &[String]) {
        let mut truths = self.truths.write().unwrap_or_else(PoisonError::into_inner);
        truths.clear();
        truths.extend(conditions.iter().cloned());
    }
}

impl ConditionEvaluator for ScriptedConditions {
    fn check_conditions(&self, situation: &Situation) -> bool {
        let truths = self.truths.read().unwrap_or_else(PoisonError::into_inner);
        situation
            .conditions
            .iter()
            .all(|condition| truths.contains(condition.id.as_str()))
    }
}

/// Formula values that persist across ticks until the script overrides them.
#[derive(Debug, Default)]
pub struct ScriptedFormulas {
    values: RwLock<HashMap<FormulaId, Decimal>>,
}

impl ScriptedFormulas {
    pub fn new(initial: &BTreeMap<String, Decimal>) -> Self {
        let formulas = Self::default();
        formulas.update(initial);
        formulas
    }

    /// Overwrite the given formulas, keeping all others.
    pub fn update(&self, values: &BTreeMap<String, Decimal>) {
        let mut current = self.values.write().unwrap_or_else(PoisonError::into_inner);
        for (name, value) in values {
            current.insert(FormulaId::new(name.as_str()), *value);
        }
    }
}

impl FormulaRegistry for ScriptedFormulas {
    fn resolve(&self, formula: &FormulaId) -> Option<Decimal> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(formula)
            .copied()
    }
}

/// Logs every announcement and keeps it for the report.
#[derive(Debug, Default)]
pub struct AnnouncementLog {
    entries: Mutex<Vec<Announcement>>,
}

impl AnnouncementLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all announcements recorded so far.
    pub fn drain(&self) -> Vec<Announcement> {
        std::mem::take(&mut *self.entries.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Announcer for AnnouncementLog {
    fn notify(&self, announcement: Announcement) {
        info!(
            event = %announcement.event_name,
            situation = %announcement.situation_name,
            order = %announcement.order_name,
            "event fired"
        );
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(announcement);
    }
}
