//! Per-tick order lifecycle orchestration.
//!
//! [`TradingExecution::run_tick`] walks every order definition of an
//! execution node and moves its runtime through its lifecycle:
//!
//! - **NotOpen**: evaluate the create event; on a match size the order,
//!   place it (at the venue for Live/Forward sessions) and open it.
//! - **Open**: advance its period counters, simulate fills or reconcile with
//!   the venue, then evaluate the cancel event.
//! - **Closed**: nothing.
//!
//! Definitions are processed strictly in order: algorithms as listed, then
//! the market-buy, market-sell, limit-buy and limit-sell buckets.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::context::ExecutionContext;
use crate::domain::{
    ExecutionNode, ExitType, Lock, OpenOrder, OrderRole, OrderRuntime, OrderStatus, Stage,
    StageFlags, StageLimits,
};
use crate::error::ExecutionError;
use crate::ports::{Announcer, ConditionEvaluator, ExchangeGateway, NoVenue, NullAnnouncer, VenueOrder};

use super::accounting;
use super::events::{evaluate_event, EventScope};
use super::fill_simulator::FillSimulator;
use super::order_book::OrderBook;
use super::sizing;
use super::synchronizer;
use super::tick_view::TickView;

/// The execution core with its collaborators.
#[derive(Clone)]
pub struct TradingExecution {
    evaluator: Arc<dyn ConditionEvaluator>,
    venue: Arc<dyn ExchangeGateway>,
    announcer: Arc<dyn Announcer>,
}

impl TradingExecution {
    pub fn new(
        evaluator: Arc<dyn ConditionEvaluator>,
        venue: Arc<dyn ExchangeGateway>,
        announcer: Arc<dyn Announcer>,
    ) -> Self {
        Self {
            evaluator,
            venue,
            announcer,
        }
    }

    /// Backtesting/Paper setup: no venue, announcements dropped.
    pub fn simulated(evaluator: Arc<dyn ConditionEvaluator>) -> Self {
        Self::new(evaluator, Arc::new(NoVenue), Arc::new(NullAnnouncer))
    }

    /// Run one tick over `node`.
    ///
    /// A stage whose asset records are not initialised makes the tick a
    /// no-op. A configuration error is recorded in `ctx.diagnostics` and
    /// aborts the tick; venue failures are logged and retried next tick.
    pub async fn run_tick(
        &self,
        ctx: &mut ExecutionContext<'_>,
        node: &ExecutionNode,
        book: &mut OrderBook,
        flags: StageFlags,
        limits: StageLimits,
        stage: &mut Stage,
    ) -> Result<(), ExecutionError> {
        let Some(mut view) = TickView::new(stage, &ctx.position, flags, limits) else {
            debug!(node = %node.id, "stage not ready, skipping tick");
            return Ok(());
        };

        for algorithm in &node.execution_algorithms {
            for (role, definitions) in algorithm.buckets() {
                for definition in definitions {
                    let scope = EventScope {
                        node,
                        algorithm,
                        order: definition,
                    };
                    self.process_order(ctx, &mut view, book, scope, role).await?;
                }
            }
        }
        Ok(())
    }

    async fn process_order(
        &self,
        ctx: &mut ExecutionContext<'_>,
        view: &mut TickView<'_>,
        book: &mut OrderBook,
        scope: EventScope<'_>,
        role: OrderRole,
    ) -> Result<(), ExecutionError> {
        let definition = scope.order;
        if definition.config.position_size_percentage.is_none() {
            return Ok(());
        }
        let Some(runtime_id) = definition.runtime.as_ref() else {
            return Ok(());
        };

        let order = book.get_or_create(runtime_id);
        let before = order.status();
        let result = match before {
            OrderStatus::NotOpen => self.handle_not_open(ctx, view, scope, role, order).await,
            OrderStatus::Open => {
                self.handle_open(ctx, view, scope, role, order).await;
                Ok(())
            }
            OrderStatus::Closed => Ok(()),
        };

        let after = order.status();
        if before != after {
            let reason = match order.exit_type() {
                Some(exit) if after == OrderStatus::Closed => exit.to_string(),
                _ => order.situation_name.clone(),
            };
            book.record_transition(runtime_id, before, after, reason);
        }
        result
    }

    async fn handle_not_open(
        &self,
        ctx: &mut ExecutionContext<'_>,
        view: &mut TickView<'_>,
        scope: EventScope<'_>,
        role: OrderRole,
        order: &mut OrderRuntime,
    ) -> Result<(), ExecutionError> {
        let definition = scope.order;
        if view.flags.closing {
            return Ok(());
        }
        if !definition.config.spawn_multiple_orders && order.lock() == Lock::Closed {
            return Ok(());
        }
        let Some(event) = definition.create_order_event.as_ref() else {
            return Ok(());
        };
        let Some(situation) = evaluate_event(
            event,
            scope,
            self.evaluator.as_ref(),
            self.announcer.as_ref(),
            &mut ctx.diagnostics,
        ) else {
            return Ok(());
        };

        self.try_to_open(ctx, view, scope, role, order, &situation.name)
            .await
    }

    async fn try_to_open(
        &self,
        ctx: &mut ExecutionContext<'_>,
        view: &mut TickView<'_>,
        scope: EventScope<'_>,
        role: OrderRole,
        order: &mut OrderRuntime,
        situation_name: &str,
    ) -> Result<(), ExecutionError> {
        let sizing = sizing::size_order(
            scope.algorithm,
            scope.order,
            &ctx.position,
            view.asset,
            view.accumulated(),
            view.limit,
            ctx.formulas,
        )
        .map_err(|err| {
            warn!(order = %scope.order.id, error = %err, "order configuration error");
            ctx.diagnostics.error(err.node_id().clone(), err.to_string());
            err
        })?;

        if sizing.size_in(view.asset) <= Decimal::ZERO {
            debug!(
                order = %scope.order.id,
                size = %sizing.size_in(view.asset),
                "stage limit reached, order not created"
            );
            return Ok(());
        }
        order.apply_sizing(sizing.rate, sizing.base_size, sizing.quoted_size);

        if ctx.session_type.uses_venue() {
            match self.venue.create_order(scope.order, order).await {
                Ok(Some(exchange_id)) => order.exchange_id = Some(exchange_id),
                Ok(None) => {
                    warn!(
                        venue = self.venue.venue_name(),
                        order = %scope.order.id,
                        "venue returned no order id, will retry"
                    );
                    return Ok(());
                }
                Err(err) => {
                    warn!(
                        venue = self.venue.venue_name(),
                        order = %scope.order.id,
                        error = %err,
                        "order placement failed, will retry"
                    );
                    return Ok(());
                }
            }
        }

        ctx.episode.orders += 1;
        ctx.distance_to_event.create_order = 1;
        order.open(OpenOrder {
            identifier: Uuid::new_v4(),
            serial_number: ctx.episode.orders,
            begin: ctx.candle.begin,
            end: ctx.candle.end,
            role,
            order_name: scope.order.name.clone(),
            algorithm_name: scope.algorithm.name.clone(),
            situation_name: situation_name.to_string(),
        });
        accounting::account_opened_order(&mut view.stage, order);

        info!(
            serial = order.serial_number,
            identifier = ?order.identifier,
            role = %role,
            rate = %order.rate,
            base_size = %order.base.size,
            quoted_size = %order.quoted.size,
            situation = situation_name,
            "order opened"
        );
        Ok(())
    }

    async fn handle_open(
        &self,
        ctx: &mut ExecutionContext<'_>,
        view: &mut TickView<'_>,
        scope: EventScope<'_>,
        role: OrderRole,
        order: &mut OrderRuntime,
    ) {
        order.advance_period(ctx.candle.end, ctx.parameters.timeframe_ms);

        if ctx.session_type.is_simulated() {
            self.simulate_exchange_events(ctx, view, scope, role, order)
                .await;
        } else {
            self.check_exchange_events(ctx, view, scope, role, order)
                .await;
        }

        if view.flags.closing || !order.is_open() {
            return;
        }
        let Some(event) = scope.order.cancel_order_event.as_ref() else {
            return;
        };
        let triggered = evaluate_event(
            event,
            scope,
            self.evaluator.as_ref(),
            self.announcer.as_ref(),
            &mut ctx.diagnostics,
        )
        .is_some();
        if triggered {
            self.cancel_order(ctx, view, scope, role, order, ExitType::CancelEvent)
                .await;
        }
    }

    async fn simulate_exchange_events(
        &self,
        ctx: &mut ExecutionContext<'_>,
        view: &mut TickView<'_>,
        scope: EventScope<'_>,
        role: OrderRole,
        order: &mut OrderRuntime,
    ) {
        let Some(events) = scope.order.simulated_exchange_events.as_ref() else {
            return;
        };
        let simulator = FillSimulator::new(&ctx.parameters);
        let step = simulator.simulate(role, events, order, view.asset, ctx.formulas);
        if step.closed {
            ctx.distance_to_event.close_order = 1;
            info!(serial = order.serial_number, exit = %ExitType::Filled, "order closed");
        }
        accounting::apply_fill_delta(
            role.side(),
            &step.previous,
            &order.fill_snapshot(),
            &mut view.stage,
            &mut ctx.balance,
        );

        if view.flags.closing && !order.is_closed() {
            self.cancel_order(ctx, view, scope, role, order, ExitType::ClosingStage)
                .await;
        }
    }

    async fn check_exchange_events(
        &self,
        ctx: &mut ExecutionContext<'_>,
        view: &mut TickView<'_>,
        scope: EventScope<'_>,
        role: OrderRole,
        order: &mut OrderRuntime,
    ) {
        let report = match self.venue.get_order(scope.order, order).await {
            Ok(Some(report)) => report,
            Ok(None) => {
                debug!(serial = order.serial_number, "venue has no report for order");
                return;
            }
            Err(err) => {
                warn!(
                    venue = self.venue.venue_name(),
                    serial = order.serial_number,
                    error = %err,
                    "order query failed, will retry"
                );
                return;
            }
        };
        self.apply_venue_report(ctx, view, role, order, &report);

        if view.flags.closing && !order.is_closed() {
            self.cancel_order(ctx, view, scope, role, order, ExitType::ClosingStage)
                .await;
        }
    }

    fn apply_venue_report(
        &self,
        ctx: &mut ExecutionContext<'_>,
        view: &mut TickView<'_>,
        role: OrderRole,
        order: &mut OrderRuntime,
        report: &VenueOrder,
    ) {
        let step = synchronizer::synchronize(order, report, view.asset);
        if let Some(exit) = step.closed {
            ctx.distance_to_event.close_order = 1;
            info!(serial = order.serial_number, exit = %exit, "order closed");
        }
        accounting::apply_fill_delta(
            role.side(),
            &step.previous,
            &order.fill_snapshot(),
            &mut view.stage,
            &mut ctx.balance,
        );
    }

    /// Close an open order before it filled and release its unfilled size
    /// from the stage.
    ///
    /// Simulated sessions close directly. Venue sessions close only once the
    /// venue confirms, then reconcile one last time since the order may have
    /// filled further before the cancel landed.
    async fn cancel_order(
        &self,
        ctx: &mut ExecutionContext<'_>,
        view: &mut TickView<'_>,
        scope: EventScope<'_>,
        role: OrderRole,
        order: &mut OrderRuntime,
        exit: ExitType,
    ) {
        if ctx.session_type.uses_venue() {
            match self.venue.cancel_order(scope.order, order).await {
                Ok(true) => {}
                Ok(false) => {
                    warn!(
                        venue = self.venue.venue_name(),
                        serial = order.serial_number,
                        "venue did not confirm cancellation, order stays open"
                    );
                    return;
                }
                Err(err) => {
                    warn!(
                        venue = self.venue.venue_name(),
                        serial = order.serial_number,
                        error = %err,
                        "cancellation failed, order stays open"
                    );
                    return;
                }
            }
        }

        if !order.close(exit) {
            return;
        }
        ctx.distance_to_event.close_order = 1;

        if ctx.session_type.uses_venue() {
            match self.venue.get_order(scope.order, order).await {
                Ok(Some(report)) => self.apply_venue_report(ctx, view, role, order, &report),
                Ok(None) => {}
                Err(err) => warn!(
                    venue = self.venue.venue_name(),
                    serial = order.serial_number,
                    error = %err,
                    "final order query after cancellation failed"
                ),
            }
        }

        accounting::recalculate_stage_size(&mut view.stage, order);
        info!(
            serial = order.serial_number,
            exit = %exit,
            size_filled = %order.base.size_filled,
            "order cancelled"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Candle;
    use crate::domain::{
        Condition, ExecutionAlgorithm, FormulaId, FormulaNode, NodeId, OrderConfig,
        OrderDefinition, Position, RuntimeId, Situation, TradingEvent,
    };
    use crate::ports::FormulaRegistry;
    use crate::session::{SessionParameters, SessionType};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    struct Always;

    impl ConditionEvaluator for Always {
        fn check_conditions(&self, _situation: &Situation) -> bool {
            true
        }
    }

    struct Ten;

    impl FormulaRegistry for Ten {
        fn resolve(&self, _formula: &FormulaId) -> Option<Decimal> {
            Some(dec!(10))
        }
    }

    fn event(id: &str) -> TradingEvent {
        TradingEvent {
            id: NodeId::from(id),
            name: id.into(),
            situations: vec![Situation {
                id: NodeId::new(format!("{id}-situation")),
                name: "always".into(),
                conditions: vec![Condition {
                    id: NodeId::new(format!("{id}-condition")),
                    name: String::new(),
                    code: "true".into(),
                }],
            }],
        }
    }

    fn node() -> ExecutionNode {
        ExecutionNode {
            id: NodeId::from("node"),
            name: "node".into(),
            execution_algorithms: vec![ExecutionAlgorithm {
                id: NodeId::from("algo"),
                name: "algo".into(),
                market_buy_orders: vec![OrderDefinition {
                    id: NodeId::from("buy"),
                    name: "buy".into(),
                    runtime: Some(RuntimeId::from("r1")),
                    create_order_event: Some(event("create")),
                    cancel_order_event: None,
                    config: OrderConfig {
                        position_size_percentage: Some(dec!(50)),
                        spawn_multiple_orders: false,
                    },
                    position_rate: None,
                    simulated_exchange_events: None,
                }],
                market_sell_orders: vec![],
                limit_buy_orders: vec![],
                limit_sell_orders: vec![],
                size_in_base_asset: Some(FormulaNode {
                    id: NodeId::from("size"),
                    formula: Some(FormulaId::from("f-size")),
                }),
                size_in_quoted_asset: None,
            }],
        }
    }

    fn context(formulas: &dyn FormulaRegistry) -> ExecutionContext<'_> {
        let begin = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut ctx = ExecutionContext::new(
            SessionType::Backtesting,
            SessionParameters::default(),
            Candle {
                begin,
                end: begin + chrono::Duration::hours(1),
            },
            formulas,
        );
        ctx.position = Position::new(dec!(1), dec!(0), dec!(100));
        ctx
    }

    #[tokio::test]
    async fn unready_stage_is_a_no_op() {
        let execution = TradingExecution::simulated(Arc::new(Always));
        let mut ctx = context(&Ten);
        let mut book = OrderBook::new();
        let mut stage = Stage::default();

        execution
            .run_tick(&mut ctx, &node(), &mut book, StageFlags::open(), StageLimits::new(dec!(10), dec!(1000)), &mut stage)
            .await
            .unwrap();
        assert!(book.is_empty());
        assert_eq!(ctx.episode.orders, 0);
    }

    #[tokio::test]
    async fn opening_is_audited_and_counted() {
        let execution = TradingExecution::simulated(Arc::new(Always));
        let mut ctx = context(&Ten);
        let mut book = OrderBook::new();
        let mut stage = Stage::ready();

        execution
            .run_tick(&mut ctx, &node(), &mut book, StageFlags::open(), StageLimits::new(dec!(10), dec!(1000)), &mut stage)
            .await
            .unwrap();

        let order = book.get(&RuntimeId::from("r1")).unwrap();
        assert!(order.is_open());
        assert_eq!(order.serial_number, 1);
        assert_eq!(order.role, Some(OrderRole::MarketBuy));
        assert_eq!(ctx.distance_to_event.create_order, 1);
        assert_eq!(book.audit_trail()[0].reason, "always");
        assert_eq!(stage.base.unwrap().size, dec!(5));
        assert_eq!(stage.quoted.unwrap().size, dec!(500));
    }
}
