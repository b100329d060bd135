//! Serializable scenario configuration.
//!
//! A scenario is everything needed to replay a session tick by tick: the
//! session type and parameters, the starting account and stage, the strategy
//! tree, an optional replay venue, and a per-tick script of condition truths,
//! formula values and stage flags.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tickexec_core::domain::{
    Balance, ExecutionNode, Position, StageFlags, StageLimits, TradingEvent,
};
use tickexec_core::{Candle, SessionParameters, SessionType};

/// Content hash of a scenario (blake3, hex).
pub type Fingerprint = String;

/// Errors loading or validating a scenario.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read scenario {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scenario: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid scenario: {0}")]
    Invalid(String),
    #[error("failed to encode scenario: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A complete replayable session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioConfig {
    pub scenario: ScenarioMeta,
    #[serde(default)]
    pub session: SessionParameters,
    #[serde(default)]
    pub balance: Balance,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub stage_limits: StageLimits,
    /// Required for Live and Forward-testing sessions.
    #[serde(default)]
    pub venue: Option<ReplayVenueConfig>,
    pub strategy: ExecutionNode,
    /// Formula values in effect from the first tick on.
    #[serde(default)]
    pub formulas: BTreeMap<String, Decimal>,
    #[serde(default)]
    pub ticks: Vec<TickScript>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioMeta {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub session_type: SessionType,
    /// Begin of the first candle.
    pub start: DateTime<Utc>,
    /// Abort the run on the first configuration error instead of recording it.
    #[serde(default)]
    pub stop_on_error: bool,
}

/// Behaviour of the in-memory replay venue.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ReplayVenueConfig {
    /// Fraction of the order's base size filled on each status query, in `(0, 1]`.
    pub fill_fraction: Decimal,
    /// Fee the venue keeps, in percent of the order's base amount.
    #[serde(default)]
    pub fee_percentage: Decimal,
}

/// Stage state requested for a tick.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StagePhase {
    #[default]
    Open,
    /// Open orders are forced out and no new ones are created.
    Closing,
}

impl StagePhase {
    pub fn flags(self) -> StageFlags {
        match self {
            Self::Open => StageFlags::open(),
            Self::Closing => StageFlags::closing(),
        }
    }
}

/// What the host knows on one tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TickScript {
    /// Ids of the conditions that hold on this tick.
    #[serde(default)]
    pub conditions: Vec<String>,
    /// Formula values updated on this tick; others keep their last value.
    #[serde(default)]
    pub formulas: BTreeMap<String, Decimal>,
    #[serde(default)]
    pub stage: StagePhase,
    /// Start a new stage before this tick: closed orders are recycled and
    /// the stage aggregates reset.
    #[serde(default)]
    pub new_stage: bool,
    /// Position as seen from this tick on.
    #[serde(default)]
    pub position: Option<Position>,
}

impl ScenarioConfig {
    /// Parse a scenario from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a scenario file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Deterministic content hash of the scenario.
    ///
    /// Two scenarios with identical content share a fingerprint, so a report
    /// can always be traced back to the exact input that produced it.
    pub fn fingerprint(&self) -> Result<Fingerprint, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }

    /// Candle for tick `index`.
    ///
    /// Fails when the candle falls outside the range chrono can represent.
    pub fn candle(&self, index: usize) -> Result<Candle, ConfigError> {
        let out_of_range =
            || invalid(format!("tick {index} lies outside the representable time range"));
        let timeframe =
            Duration::try_milliseconds(self.session.timeframe_ms).ok_or_else(out_of_range)?;
        let offset = i32::try_from(index)
            .ok()
            .and_then(|index| timeframe.checked_mul(index))
            .ok_or_else(out_of_range)?;
        let begin = self
            .scenario
            .start
            .checked_add_signed(offset)
            .ok_or_else(out_of_range)?;
        let end = begin
            .checked_add_signed(timeframe)
            .ok_or_else(out_of_range)?;
        Ok(Candle { begin, end })
    }

    /// Check the scenario for mistakes that would make a replay meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scenario.name.trim().is_empty() {
            return Err(invalid("scenario name is empty"));
        }
        if self.session.timeframe_ms <= 0 {
            return Err(invalid(format!(
                "timeframe_ms must be positive, got {}",
                self.session.timeframe_ms
            )));
        }
        if self.ticks.is_empty() {
            return Err(invalid("scenario has no ticks"));
        }
        self.candle(self.ticks.len() - 1)?;
        if self.stage_limits.base < Decimal::ZERO || self.stage_limits.quoted < Decimal::ZERO {
            return Err(invalid("stage limits must not be negative"));
        }

        match (self.scenario.session_type.uses_venue(), &self.venue) {
            (true, None) => {
                return Err(invalid(format!(
                    "{:?} sessions need a [venue] section",
                    self.scenario.session_type
                )))
            }
            (_, Some(venue)) => {
                if venue.fill_fraction <= Decimal::ZERO || venue.fill_fraction > Decimal::ONE {
                    return Err(invalid("venue.fill_fraction must be in (0, 1]"));
                }
                if venue.fee_percentage < Decimal::ZERO
                    || venue.fee_percentage >= Decimal::ONE_HUNDRED
                {
                    return Err(invalid("venue.fee_percentage must be in [0, 100)"));
                }
            }
            (false, None) => {}
        }

        let tree = TreeIndex::of(&self.strategy)?;
        for (index, tick) in self.ticks.iter().enumerate() {
            if let Some(unknown) = tick
                .conditions
                .iter()
                .find(|id| !tree.conditions.contains(id.as_str()))
            {
                return Err(invalid(format!(
                    "tick {index} references unknown condition '{unknown}'"
                )));
            }
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

/// Ids declared in a strategy tree.
struct TreeIndex<'a> {
    conditions: HashSet<&'a str>,
}

impl<'a> TreeIndex<'a> {
    /// Collect the tree's ids, rejecting duplicate order definitions.
    fn of(node: &'a ExecutionNode) -> Result<Self, ConfigError> {
        let mut definitions = BTreeSet::new();
        let mut conditions = HashSet::new();

        for algorithm in &node.execution_algorithms {
            for (_, bucket) in algorithm.buckets() {
                for definition in bucket {
                    if !definitions.insert(definition.id.as_str()) {
                        return Err(invalid(format!(
                            "order definition '{}' is declared twice",
                            definition.id
                        )));
                    }
                    let events = [&definition.create_order_event, &definition.cancel_order_event];
                    for event in events.into_iter().flatten() {
                        collect_conditions(event, &mut conditions);
                    }
                }
            }
        }
        Ok(Self { conditions })
    }
}

fn collect_conditions<'a>(event: &'a TradingEvent, into: &mut HashSet<&'a str>) {
    for situation in &event.situations {
        into.extend(situation.conditions.iter().map(|c| c.id.as_str()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const MINIMAL: &str = r#"
[scenario]
name = "minimal"
session_type = "backtesting"
start = "2024-01-01T00:00:00Z"

[strategy]
id = "node"

[[strategy.execution_algorithms]]
id = "algo"

[[strategy.execution_algorithms.market_buy_orders]]
id = "entry"
runtime = "r1"

[strategy.execution_algorithms.market_buy_orders.create_order_event]
id = "entry-create"

[[strategy.execution_algorithms.market_buy_orders.create_order_event.situations]]
id = "go"

[[strategy.execution_algorithms.market_buy_orders.create_order_event.situations.conditions]]
id = "breakout"

[[ticks]]
conditions = ["breakout"]
"#;

    fn minimal() -> ScenarioConfig {
        ScenarioConfig::from_toml(MINIMAL).unwrap()
    }

    #[test]
    fn defaults_fill_in_missing_sections() {
        let config = minimal();
        assert_eq!(config.session.timeframe_ms, 3_600_000);
        assert_eq!(config.session.fee_structure.taker, dec!(0));
        assert_eq!(config.ticks[0].stage, StagePhase::Open);
        assert!(config.venue.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let config = minimal();
        let first = config.fingerprint().unwrap();
        assert_eq!(first, config.fingerprint().unwrap());
        assert_eq!(first.len(), 64);

        let mut changed = config.clone();
        changed.session.fee_structure.taker = dec!(0.1);
        assert_ne!(first, changed.fingerprint().unwrap());
    }

    #[test]
    fn candles_follow_timeframe() {
        let config = minimal();
        let third = config.candle(2).unwrap();
        assert_eq!(third.begin.to_rfc3339(), "2024-01-01T02:00:00+00:00");
        assert_eq!(third.end - third.begin, Duration::hours(1));
    }

    #[test]
    fn timeline_past_chrono_range_is_rejected() {
        let mut config = minimal();
        assert!(config.candle(usize::MAX).is_err());
        assert!(config.candle(i32::MAX as usize + 1).is_err());

        // 10^15 ms is roughly 31,700 years per candle
        config.session.timeframe_ms = 1_000_000_000_000_000;
        config.validate().unwrap();
        config.ticks = vec![TickScript::default(); 10];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("tick 9 lies outside the representable time range"));
    }

    #[test]
    fn idle_stage_phase_is_not_accepted() {
        let text = format!("{MINIMAL}stage = \"idle\"\n");
        let err = ScenarioConfig::from_toml(&text).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        let text = format!("{MINIMAL}stage = \"closing\"\n");
        let config = ScenarioConfig::from_toml(&text).unwrap();
        assert_eq!(config.ticks[0].stage.flags(), StageFlags::closing());
    }

    #[test]
    fn unknown_condition_is_rejected() {
        let mut config = minimal();
        config.ticks[0].conditions.push("typo".into());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("unknown condition 'typo'"));
    }

    #[test]
    fn venue_sessions_require_venue() {
        let mut config = minimal();
        config.scenario.session_type = SessionType::Live;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.venue = Some(ReplayVenueConfig {
            fill_fraction: dec!(1.5),
            fee_percentage: dec!(0),
        });
        assert!(config.validate().is_err());

        config.venue = Some(ReplayVenueConfig {
            fill_fraction: dec!(0.5),
            fee_percentage: dec!(0.1),
        });
        config.validate().unwrap();
    }

    #[test]
    fn duplicate_definitions_are_rejected() {
        let mut config = minimal();
        let algorithm = &mut config.strategy.execution_algorithms[0];
        let copy = algorithm.market_buy_orders[0].clone();
        algorithm.limit_sell_orders.push(copy);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("declared twice"));
    }

    #[test]
    fn empty_script_is_rejected() {
        let mut config = minimal();
        config.ticks.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn parse_error_is_reported() {
        let err = ScenarioConfig::from_toml("[scenario]\nname = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
