//! Order roles, runtime lifecycle state, and the audit trail entry type.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::asset::{AssetLedger, DenominatingAsset, FillSnapshot};
use super::ids::{ExchangeOrderId, RuntimeId};
use crate::precision::precise;

/// Milliseconds in one day; converts elapsed periods into elapsed days.
pub const ONE_DAY_IN_MILLISECONDS: i64 = 86_400_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    Market,
    Limit,
}

/// The bucket an order definition lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderRole {
    MarketBuy,
    MarketSell,
    LimitBuy,
    LimitSell,
}

impl OrderRole {
    pub fn side(self) -> OrderSide {
        match self {
            Self::MarketBuy | Self::LimitBuy => OrderSide::Buy,
            Self::MarketSell | Self::LimitSell => OrderSide::Sell,
        }
    }

    pub fn kind(self) -> OrderKind {
        match self {
            Self::MarketBuy | Self::MarketSell => OrderKind::Market,
            Self::LimitBuy | Self::LimitSell => OrderKind::Limit,
        }
    }
}

impl fmt::Display for OrderRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MarketBuy => "Market Buy Order",
            Self::MarketSell => "Market Sell Order",
            Self::LimitBuy => "Limit Buy Order",
            Self::LimitSell => "Limit Sell Order",
        };
        f.write_str(name)
    }
}

/// Order lifecycle state. Only ever advances NotOpen → Open → Closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    NotOpen,
    Open,
    Closed,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotOpen => "Not Open",
            Self::Open => "Open",
            Self::Closed => "Closed",
        };
        f.write_str(name)
    }
}

/// Re-entry lock. A Closed lock keeps a non-spawning definition from opening
/// a fresh instance of this runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lock {
    #[default]
    Open,
    Closed,
}

/// Why an order was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitType {
    Filled,
    ClosedAtExchange,
    CancelledAtExchange,
    CancelEvent,
    ClosingStage,
}

impl fmt::Display for ExitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Filled => "Filled",
            Self::ClosedAtExchange => "Closed at the Exchange",
            Self::CancelledAtExchange => "Cancelled at the Exchange",
            Self::CancelEvent => "Cancel Event",
            Self::ClosingStage => "Closing Stage",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCounters {
    pub periods: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderStatistics {
    pub days: Decimal,
    pub percentage_filled: Decimal,
    pub actual_rate: Decimal,
    pub fees_paid: Decimal,
    /// Set once the actual rate came from the strategy's own formula; it is
    /// then kept for the rest of the order's life.
    #[serde(default)]
    pub actual_rate_from_formula: bool,
}

/// Provenance and identity assigned when an order opens.
#[derive(Debug, Clone)]
pub struct OpenOrder {
    pub identifier: Uuid,
    pub serial_number: u64,
    pub begin: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub role: OrderRole,
    pub order_name: String,
    pub algorithm_name: String,
    pub situation_name: String,
}

/// Mutable per-definition order record that persists across ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRuntime {
    pub id: RuntimeId,
    status: OrderStatus,
    lock: Lock,
    pub identifier: Option<Uuid>,
    pub exchange_id: Option<ExchangeOrderId>,
    pub serial_number: u64,
    pub begin: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub rate: Decimal,
    pub base: AssetLedger,
    pub quoted: AssetLedger,
    pub counters: OrderCounters,
    pub statistics: OrderStatistics,
    exit_type: Option<ExitType>,
    pub role: Option<OrderRole>,
    pub order_name: String,
    pub algorithm_name: String,
    pub situation_name: String,
}

impl OrderRuntime {
    pub fn new(id: RuntimeId) -> Self {
        Self {
            id,
            status: OrderStatus::NotOpen,
            lock: Lock::Open,
            identifier: None,
            exchange_id: None,
            serial_number: 0,
            begin: None,
            end: None,
            rate: Decimal::ZERO,
            base: AssetLedger::default(),
            quoted: AssetLedger::default(),
            counters: OrderCounters::default(),
            statistics: OrderStatistics::default(),
            exit_type: None,
            role: None,
            order_name: String::new(),
            algorithm_name: String::new(),
            situation_name: String::new(),
        }
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn lock(&self) -> Lock {
        self.lock
    }

    pub fn exit_type(&self) -> Option<ExitType> {
        self.exit_type
    }

    pub fn is_open(&self) -> bool {
        self.status == OrderStatus::Open
    }

    pub fn is_closed(&self) -> bool {
        self.status == OrderStatus::Closed
    }

    pub fn asset(&self, asset: DenominatingAsset) -> &AssetLedger {
        match asset {
            DenominatingAsset::Base => &self.base,
            DenominatingAsset::Quoted => &self.quoted,
        }
    }

    pub fn fill_snapshot(&self) -> FillSnapshot {
        FillSnapshot::of(&self.base, &self.quoted)
    }

    /// Stage the rate and both asset sizes ahead of placement. Only a NotOpen
    /// order can be re-sized.
    pub fn apply_sizing(&mut self, rate: Decimal, base_size: Decimal, quoted_size: Decimal) {
        if self.status != OrderStatus::NotOpen {
            return;
        }
        self.rate = precise(rate);
        self.base.size = precise(base_size);
        self.quoted.size = precise(quoted_size);
    }

    /// NotOpen → Open.
    pub fn open(&mut self, open: OpenOrder) -> bool {
        if self.status != OrderStatus::NotOpen {
            return false;
        }
        self.status = OrderStatus::Open;
        self.identifier = Some(open.identifier);
        self.serial_number = open.serial_number;
        self.begin = Some(open.begin);
        self.end = Some(open.end);
        self.role = Some(open.role);
        self.order_name = open.order_name;
        self.algorithm_name = open.algorithm_name;
        self.situation_name = open.situation_name;
        true
    }

    /// Open → Closed. Closing also engages the re-entry lock.
    pub fn close(&mut self, exit_type: ExitType) -> bool {
        if self.status != OrderStatus::Open {
            return false;
        }
        self.status = OrderStatus::Closed;
        self.exit_type = Some(exit_type);
        self.lock = Lock::Closed;
        true
    }

    /// One more elapsed period while Open.
    pub fn advance_period(&mut self, end: DateTime<Utc>, timeframe_ms: i64) {
        self.end = Some(end);
        self.counters.periods += 1;
        self.statistics.days = precise(
            Decimal::from(self.counters.periods) * Decimal::from(timeframe_ms)
                / Decimal::from(ONE_DAY_IN_MILLISECONDS),
        );
    }

    /// Start a fresh instance of a Closed runtime, keeping its re-entry lock.
    pub fn recycle(&mut self) -> bool {
        if self.status != OrderStatus::Closed {
            return false;
        }
        let lock = self.lock;
        *self = Self::new(self.id.clone());
        self.lock = lock;
        true
    }

    /// Back to the pristine state, lock included.
    pub fn reset(&mut self) {
        *self = Self::new(self.id.clone());
    }
}

/// Audit trail entry for a runtime status transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAuditEntry {
    pub runtime: RuntimeId,
    pub serial_number: u64,
    pub from_status: OrderStatus,
    pub to_status: OrderStatus,
    pub reason: String,
}
