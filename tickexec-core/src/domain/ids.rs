use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of any strategy-tree node (node, algorithm, order, event, situation).
///
/// These are the ids recorded in diagnostics and error logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Link from an order definition to the runtime record it drives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuntimeId(String);

impl RuntimeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuntimeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RuntimeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Key into the strategy's formula registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormulaId(String);

impl FormulaId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FormulaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FormulaId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Order id assigned by the venue on creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeOrderId(String);

impl ExchangeOrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExchangeOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_display_their_inner_value() {
        assert_eq!(NodeId::from("situation-1").to_string(), "situation-1");
        assert_eq!(RuntimeId::from("order-7").as_str(), "order-7");
        assert_eq!(ExchangeOrderId::new("X-1").to_string(), "X-1");
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&FormulaId::from("size")).unwrap();
        assert_eq!(json, "\"size\"");
        let back: FormulaId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, FormulaId::from("size"));
    }
}
