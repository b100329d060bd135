//! Trading session type and the session-wide execution parameters.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The kind of session the core is serving.
///
/// Backtesting and Paper sessions fill orders by simulation; Forward-testing
/// and Live sessions talk to a real venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Backtesting,
    Paper,
    ForwardTesting,
    Live,
}

impl SessionType {
    pub fn is_simulated(self) -> bool {
        matches!(self, Self::Backtesting | Self::Paper)
    }

    pub fn uses_venue(self) -> bool {
        !self.is_simulated()
    }
}

/// Session-wide slippage, in percent of the order rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Slippage {
    #[serde(default)]
    pub position_rate: Decimal,
}

/// Session-wide fees, in percent of the order size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeStructure {
    #[serde(default)]
    pub maker: Decimal,
    #[serde(default)]
    pub taker: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionParameters {
    /// Candle length in milliseconds.
    #[serde(default = "default_timeframe_ms")]
    pub timeframe_ms: i64,
    #[serde(default)]
    pub slippage: Slippage,
    #[serde(default)]
    pub fee_structure: FeeStructure,
}

fn default_timeframe_ms() -> i64 {
    3_600_000
}

impl Default for SessionParameters {
    fn default() -> Self {
        Self {
            timeframe_ms: default_timeframe_ms(),
            slippage: Slippage::default(),
            fee_structure: FeeStructure::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn simulated_sessions() {
        assert!(SessionType::Backtesting.is_simulated());
        assert!(SessionType::Paper.is_simulated());
        assert!(SessionType::Live.uses_venue());
        assert!(SessionType::ForwardTesting.uses_venue());
    }

    #[test]
    fn parameters_default_to_one_hour_and_no_costs() {
        let params: SessionParameters = serde_json::from_str("{}").unwrap();
        assert_eq!(params, SessionParameters::default());
        assert_eq!(params.timeframe_ms, 3_600_000);
        assert_eq!(params.fee_structure.taker, dec!(0));
        assert_eq!(params.slippage.position_rate, dec!(0));
    }

    #[test]
    fn session_type_uses_snake_case() {
        let t: SessionType = serde_json::from_str("\"forward_testing\"").unwrap();
        assert_eq!(t, SessionType::ForwardTesting);
    }
}
