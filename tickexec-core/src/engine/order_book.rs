//! Order runtime registry.
//!
//! The book owns every [`OrderRuntime`] keyed by [`RuntimeId`]. Runtimes are
//! created lazily the first time an order definition links to them and live
//! across ticks. The book also keeps an audit trail of every status
//! transition the orchestrator makes.

use std::collections::BTreeMap;

use crate::domain::{OrderAuditEntry, OrderRuntime, OrderStatus, RuntimeId};

#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    runtimes: BTreeMap<RuntimeId, OrderRuntime>,
    audit_trail: Vec<OrderAuditEntry>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &RuntimeId) -> Option<&OrderRuntime> {
        self.runtimes.get(id)
    }

    /// The runtime for `id`, created NotOpen if it does not exist yet.
    pub fn get_or_create(&mut self, id: &RuntimeId) -> &mut OrderRuntime {
        self.runtimes
            .entry(id.clone())
            .or_insert_with(|| OrderRuntime::new(id.clone()))
    }

    pub fn len(&self) -> usize {
        self.runtimes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runtimes.is_empty()
    }

    /// All runtimes in id order.
    pub fn iter(&self) -> impl Iterator<Item = &OrderRuntime> {
        self.runtimes.values()
    }

    pub fn open_orders(&self) -> impl Iterator<Item = &OrderRuntime> {
        self.runtimes.values().filter(|order| order.is_open())
    }

    /// Append a transition to the audit trail.
    pub fn record_transition(
        &mut self,
        id: &RuntimeId,
        from_status: OrderStatus,
        to_status: OrderStatus,
        reason: impl Into<String>,
    ) {
        let serial_number = self
            .runtimes
            .get(id)
            .map(|order| order.serial_number)
            .unwrap_or_default();
        self.audit_trail.push(OrderAuditEntry {
            runtime: id.clone(),
            serial_number,
            from_status,
            to_status,
            reason: reason.into(),
        });
    }

    pub fn audit_trail(&self) -> &[OrderAuditEntry] {
        &self.audit_trail
    }

    /// Return every Closed runtime to NotOpen for the next stage.
    ///
    /// Their re-entry lock stays Closed, so only definitions that spawn
    /// multiple orders can open them again. Returns how many were recycled.
    pub fn recycle_closed(&mut self) -> usize {
        let mut recycled = Vec::new();
        for order in self.runtimes.values_mut() {
            let serial_number = order.serial_number;
            if order.recycle() {
                recycled.push((order.id.clone(), serial_number));
            }
        }
        let count = recycled.len();
        for (runtime, serial_number) in recycled {
            self.audit_trail.push(OrderAuditEntry {
                runtime,
                serial_number,
                from_status: OrderStatus::Closed,
                to_status: OrderStatus::NotOpen,
                reason: "recycled".into(),
            });
        }
        count
    }

    /// Reset every runtime to its pristine state, locks included, and drop
    /// the audit trail.
    pub fn reset(&mut self) {
        for order in self.runtimes.values_mut() {
            order.reset();
        }
        self.audit_trail.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExitType, Lock, OpenOrder, OrderRole};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn open(order: &mut OrderRuntime, serial: u64) {
        let begin = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        order.open(OpenOrder {
            identifier: Uuid::new_v4(),
            serial_number: serial,
            begin,
            end: begin,
            role: OrderRole::MarketSell,
            order_name: "o".into(),
            algorithm_name: "a".into(),
            situation_name: "s".into(),
        });
    }

    #[test]
    fn runtimes_are_created_lazily_once() {
        let mut book = OrderBook::new();
        assert!(book.is_empty());

        let id = RuntimeId::from("r1");
        open(book.get_or_create(&id), 1);
        assert_eq!(book.len(), 1);

        // Second lookup returns the same runtime
        assert!(book.get_or_create(&id).is_open());
        assert_eq!(book.len(), 1);
        assert_eq!(book.open_orders().count(), 1);
    }

    #[test]
    fn transitions_are_audited_with_serial_number() {
        let mut book = OrderBook::new();
        let id = RuntimeId::from("r1");
        open(book.get_or_create(&id), 7);
        book.record_transition(&id, OrderStatus::NotOpen, OrderStatus::Open, "go long");

        let trail = book.audit_trail();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].serial_number, 7);
        assert_eq!(trail[0].to_status, OrderStatus::Open);
        assert_eq!(trail[0].reason, "go long");
    }

    #[test]
    fn recycle_only_touches_closed_runtimes() {
        let mut book = OrderBook::new();
        let closed = RuntimeId::from("closed");
        let open_id = RuntimeId::from("open");

        let order = book.get_or_create(&closed);
        open(order, 1);
        order.close(ExitType::Filled);
        open(book.get_or_create(&open_id), 2);
        book.get_or_create(&RuntimeId::from("idle"));

        assert_eq!(book.recycle_closed(), 1);
        let recycled = book.get(&closed).unwrap();
        assert_eq!(recycled.status(), OrderStatus::NotOpen);
        assert_eq!(recycled.lock(), Lock::Closed);
        assert!(book.get(&open_id).unwrap().is_open());
        assert_eq!(book.audit_trail().last().unwrap().reason, "recycled");
    }

    #[test]
    fn reset_clears_locks_and_trail() {
        let mut book = OrderBook::new();
        let id = RuntimeId::from("r1");
        let order = book.get_or_create(&id);
        open(order, 1);
        order.close(ExitType::CancelEvent);
        book.record_transition(&id, OrderStatus::Open, OrderStatus::Closed, "Cancel Event");

        book.reset();
        let order = book.get(&id).unwrap();
        assert_eq!(order.status(), OrderStatus::NotOpen);
        assert_eq!(order.lock(), Lock::Open);
        assert!(book.audit_trail().is_empty());
    }
}
