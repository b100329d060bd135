//! Errors surfaced by the execution core.

use thiserror::Error;

use crate::domain::NodeId;

/// A strategy definition that cannot be executed as authored.
///
/// Each variant carries the id of the node to blame; the orchestrator also
/// copies it into the tick diagnostics before failing the tick.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("position rate formula of {0} did not resolve to a value")]
    RateUndefined(NodeId),

    #[error("order rate for {0} must be greater than zero")]
    RateNotPositive(NodeId),

    #[error("execution algorithm {0} declares no size node for the denominating asset")]
    MissingSizeNode(NodeId),

    #[error("size node {0} has no formula")]
    MissingSizeFormula(NodeId),

    #[error("size formula of {0} did not resolve to a value")]
    SizeUndefined(NodeId),

    #[error("order {0} has no position size percentage")]
    MissingPositionSizePercentage(NodeId),

    #[error("size of {0} does not fit the decimal range")]
    SizeOverflow(NodeId),
}

impl ConfigurationError {
    /// The node the error should be highlighted on.
    pub fn node_id(&self) -> &NodeId {
        match self {
            Self::RateUndefined(id)
            | Self::RateNotPositive(id)
            | Self::MissingSizeNode(id)
            | Self::MissingSizeFormula(id)
            | Self::SizeUndefined(id)
            | Self::MissingPositionSizePercentage(id)
            | Self::SizeOverflow(id) => id,
        }
    }
}

/// Hard failures of a tick.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}
