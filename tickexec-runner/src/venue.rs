//! In-memory venue for replaying Live and Forward-testing sessions.
//!
//! Every status query fills another fixed fraction of the order's base size
//! at the order rate. The venue keeps its fee out of the order amount and
//! reports the net amount, which is how real venues surface their fees.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::debug;

use tickexec_core::domain::{ExchangeOrderId, OrderDefinition, OrderRuntime};
use tickexec_core::ports::{ExchangeGateway, VenueError, VenueOrder, VenueOrderStatus};
use tickexec_core::precision::{percent_of, precise};

use crate::config::ReplayVenueConfig;

#[derive(Debug, Clone, Copy)]
struct ReplayOrder {
    size: Decimal,
    price: Decimal,
    filled: Decimal,
    cancelled: bool,
}

impl ReplayOrder {
    fn remaining(&self) -> Decimal {
        self.size - self.filled
    }

    fn report(&self, fee_percentage: Decimal) -> VenueOrder {
        let status = if self.cancelled {
            VenueOrderStatus::Cancelled
        } else if self.remaining().is_zero() {
            VenueOrderStatus::Closed
        } else {
            VenueOrderStatus::Open
        };
        VenueOrder {
            filled: self.filled,
            remaining: self.remaining(),
            cost: precise(self.filled * self.price),
            price: self.price,
            amount: precise(self.size - percent_of(self.size, fee_percentage)),
            status,
        }
    }
}

#[derive(Debug)]
pub struct ReplayVenue {
    config: ReplayVenueConfig,
    next_id: AtomicU64,
    orders: Mutex<HashMap<ExchangeOrderId, ReplayOrder>>,
}

impl ReplayVenue {
    pub fn new(config: ReplayVenueConfig) -> Self {
        Self {
            config,
            next_id: AtomicU64::new(1),
            orders: Mutex::new(HashMap::new()),
        }
    }

    fn exchange_id(order: &OrderRuntime) -> Result<&ExchangeOrderId, VenueError> {
        order
            .exchange_id
            .as_ref()
            .ok_or_else(|| VenueError::NotFound(order.id.to_string()))
    }
}

#[async_trait]
impl ExchangeGateway for ReplayVenue {
    async fn create_order(
        &self,
        definition: &OrderDefinition,
        order: &OrderRuntime,
    ) -> Result<Option<ExchangeOrderId>, VenueError> {
        if order.base.size <= Decimal::ZERO || order.rate <= Decimal::ZERO {
            return Err(VenueError::Rejected(format!(
                "order {} has size {} at rate {}",
                definition.id, order.base.size, order.rate
            )));
        }
        let id = ExchangeOrderId::new(format!(
            "replay-{}",
            self.next_id.fetch_add(1, Ordering::Relaxed)
        ));
        debug!(exchange_id = %id, size = %order.base.size, "replay order placed");
        self.orders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                id.clone(),
                ReplayOrder {
                    size: order.base.size,
                    price: order.rate,
                    filled: Decimal::ZERO,
                    cancelled: false,
                },
            );
        Ok(Some(id))
    }

    async fn get_order(
        &self,
        _definition: &OrderDefinition,
        order: &OrderRuntime,
    ) -> Result<Option<VenueOrder>, VenueError> {
        let id = Self::exchange_id(order)?;
        let mut orders = self.orders.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(replay) = orders.get_mut(id) else {
            return Ok(None);
        };
        if !replay.cancelled {
            let step = precise(replay.size * self.config.fill_fraction);
            replay.filled = (replay.filled + step).min(replay.size);
        }
        Ok(Some(replay.report(self.config.fee_percentage)))
    }

    async fn cancel_order(
        &self,
        _definition: &OrderDefinition,
        order: &OrderRuntime,
    ) -> Result<bool, VenueError> {
        let id = Self::exchange_id(order)?;
        let mut orders = self.orders.lock().unwrap_or_else(PoisonError::into_inner);
        match orders.get_mut(id) {
            Some(replay) if replay.remaining().is_zero() => Ok(false),
            Some(replay) => {
                replay.cancelled = true;
                Ok(true)
            }
            None => Err(VenueError::NotFound(id.to_string())),
        }
    }

    fn venue_name(&self) -> &'static str {
        "replay"
    }
}
