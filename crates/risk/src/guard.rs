use crate::error::{RiskError, Suppression};
use configuration::RiskLimits;
use core_types::{Fill, OrderSide};
use events::{LifecycleEvent, SubmissionResult};
use rust_decimal::Decimal;
use serde::Serialize;

/// Order lifecycle of one side, `Idle -> Submitting -> Open -> Idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SideState {
    #[default]
    Idle,
    /// Admitted and handed to the gateway; no answer yet.
    Submitting,
    /// Accepted by the gateway. The side counts as placed until the instance is flat.
    Open,
}

/// Everything the guard knows about one strategy instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OrderGuardState {
    pub buy: SideState,
    pub sell: SideState,
    pub trade_count: u32,
    pub net_pnl: Decimal,
    pub gross_pnl: Decimal,
    pub total_fee: Decimal,
    pub open_long: u32,
    pub open_short: u32,
    pub halted: bool,
}

impl OrderGuardState {
    pub fn side(&self, side: OrderSide) -> SideState {
        match side {
            OrderSide::Buy => self.buy,
            OrderSide::Sell => self.sell,
        }
    }

    fn side_mut(&mut self, side: OrderSide) -> &mut SideState {
        match side {
            OrderSide::Buy => &mut self.buy,
            OrderSide::Sell => &mut self.sell,
        }
    }

    /// True while an accepted order or its position is outstanding on `side`.
    pub fn placed(&self, side: OrderSide) -> bool {
        self.side(side) == SideState::Open
    }

    pub fn is_flat(&self) -> bool {
        self.open_long == 0 && self.open_short == 0
    }
}

/// Work the guard asks its owner to carry out after reconciling an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardAction {
    CancelWorkingOrders,
    Stop(String),
}

/// What a submission result did to the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The side moved to `Open`.
    Opened,
    /// The refusal halted the instance. Reported once per run.
    Halted { reason: String },
    /// The result did not match a pending submission, or the instance was already halted.
    Ignored,
}

/// Admission gate and reconciliation state machine for one strategy instance.
///
/// The guard admits at most one order per side at a time, suppresses new
/// entries once a risk limit is reached and keeps the side flags in step with
/// the position and fill notifications from the platform. It never closes or
/// flattens anything itself.
#[derive(Debug, Clone)]
pub struct OrderGuard {
    limits: RiskLimits,
    state: OrderGuardState,
}

impl OrderGuard {
    pub fn new(limits: RiskLimits) -> Result<Self, RiskError> {
        if limits.max_profit.is_some_and(|v| v < Decimal::ZERO) {
            return Err(RiskError::InvalidParameters("max_profit must not be negative".to_string()));
        }
        if limits.max_loss.is_some_and(|v| v < Decimal::ZERO) {
            return Err(RiskError::InvalidParameters(
                "max_loss is a magnitude and must not be negative".to_string(),
            ));
        }
        Ok(Self {
            limits,
            state: OrderGuardState::default(),
        })
    }

    pub fn limits(&self) -> &RiskLimits {
        &self.limits
    }

    /// Whether an entry on `side` would be admitted right now.
    pub fn check(&self, side: OrderSide) -> Result<(), Suppression> {
        let s = &self.state;
        if s.halted {
            return Err(Suppression::Halted);
        }
        if s.side(side) != SideState::Idle {
            return Err(Suppression::SideBusy(side));
        }
        if self.limits.requires_flat() && !s.is_flat() {
            return Err(Suppression::NotFlat);
        }
        if let Some(limit) = self.limits.max_trades {
            if s.trade_count >= limit {
                return Err(Suppression::MaxTrades { count: s.trade_count, limit });
            }
        }
        if let Some(limit) = self.limits.max_profit {
            if s.gross_pnl >= limit {
                return Err(Suppression::MaxProfit { gross_pnl: s.gross_pnl, limit });
            }
        }
        if let Some(limit) = self.limits.max_loss {
            if s.gross_pnl <= -limit {
                return Err(Suppression::MaxLoss { gross_pnl: s.gross_pnl, limit });
            }
        }
        Ok(())
    }

    /// Moves `side` from `Idle` to `Submitting` if the entry passes every check.
    pub fn admit(&mut self, side: OrderSide) -> Result<(), Suppression> {
        self.check(side)?;
        *self.state.side_mut(side) = SideState::Submitting;
        tracing::info!(%side, "entry admitted");
        Ok(())
    }

    /// Applies the gateway's answer to a pending submission on `side`.
    ///
    /// A rejection is never retried: it halts the instance for the rest of the
    /// run and leaves the side unplaced.
    pub fn on_submission(&mut self, side: OrderSide, result: &SubmissionResult) -> SubmissionOutcome {
        let pending = self.state.side(side) == SideState::Submitting;
        match result {
            SubmissionResult::Accepted { order_id } => {
                if !pending || self.state.halted {
                    tracing::warn!(%side, %order_id, "acceptance without a pending submission ignored");
                    return SubmissionOutcome::Ignored;
                }
                *self.state.side_mut(side) = SideState::Open;
                tracing::info!(%side, %order_id, "entry accepted");
                SubmissionOutcome::Opened
            }
            SubmissionResult::Rejected { reason } => {
                if pending {
                    *self.state.side_mut(side) = SideState::Idle;
                }
                if self.state.halted {
                    return SubmissionOutcome::Ignored;
                }
                self.state.halted = true;
                tracing::error!(%side, %reason, "entry rejected, halting");
                SubmissionOutcome::Halted { reason: reason.clone() }
            }
        }
    }

    /// Folds one platform notification into the guard state.
    pub fn reconcile(&mut self, event: &LifecycleEvent) -> Vec<GuardAction> {
        match event {
            LifecycleEvent::PositionOpened { side, quantity } => {
                match side {
                    OrderSide::Buy => self.state.open_long = self.state.open_long.saturating_add(1),
                    OrderSide::Sell => self.state.open_short = self.state.open_short.saturating_add(1),
                }
                tracing::info!(%side, %quantity, "position opened");
                Vec::new()
            }
            LifecycleEvent::PositionClosed { side } => {
                match side {
                    OrderSide::Buy => self.state.open_long = self.state.open_long.saturating_sub(1),
                    OrderSide::Sell => self.state.open_short = self.state.open_short.saturating_sub(1),
                }
                if self.state.is_flat() {
                    self.reset_on_flat()
                } else {
                    Vec::new()
                }
            }
            LifecycleEvent::PositionsFlat => {
                self.state.open_long = 0;
                self.state.open_short = 0;
                self.reset_on_flat()
            }
            LifecycleEvent::OrderRefused { reason } => {
                if self.state.halted {
                    return Vec::new();
                }
                self.state.halted = true;
                tracing::error!(%reason, "order refused by the platform, halting");
                vec![GuardAction::Stop(reason.clone())]
            }
            LifecycleEvent::TradeFilled(fill) => {
                self.record_fill(fill);
                Vec::new()
            }
        }
    }

    /// Stops admitting entries. Used when the host shuts the instance down.
    pub fn halt(&mut self) {
        self.state.halted = true;
    }

    pub fn snapshot(&self) -> OrderGuardState {
        self.state
    }

    fn record_fill(&mut self, fill: &Fill) {
        let s = &mut self.state;
        s.net_pnl += fill.net_pnl.unwrap_or_default();
        s.gross_pnl += fill.gross_pnl.unwrap_or_default();
        s.total_fee += fill.fee.unwrap_or_default();
        s.trade_count = s.trade_count.saturating_add(1);
        tracing::info!(
            trades = s.trade_count,
            net_pnl = %s.net_pnl,
            gross_pnl = %s.gross_pnl,
            fee = %s.total_fee,
            "trade filled"
        );
    }

    /// Both sides are released together; a side still awaiting its
    /// submission answer keeps waiting for it.
    fn reset_on_flat(&mut self) -> Vec<GuardAction> {
        let mut released = false;
        for side in [OrderSide::Buy, OrderSide::Sell] {
            if self.state.side(side) == SideState::Open {
                *self.state.side_mut(side) = SideState::Idle;
                released = true;
            }
        }
        if !released {
            return Vec::new();
        }
        tracing::info!("flat, both sides reset and working orders cancelled");
        vec![GuardAction::CancelWorkingOrders]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn guard(limits: RiskLimits) -> OrderGuard {
        OrderGuard::new(limits).unwrap()
    }

    fn accepted() -> SubmissionResult {
        SubmissionResult::Accepted { order_id: "1".to_string() }
    }

    fn fill(gross: Decimal) -> LifecycleEvent {
        LifecycleEvent::TradeFilled(Fill {
            net_pnl: Some(gross - dec!(2)),
            gross_pnl: Some(gross),
            fee: Some(dec!(2)),
        })
    }

    #[test]
    fn one_order_in_flight_per_side() {
        let mut g = guard(RiskLimits::default());
        g.admit(OrderSide::Sell).unwrap();
        assert_eq!(g.admit(OrderSide::Sell), Err(Suppression::SideBusy(OrderSide::Sell)));
        // The other side is independent.
        g.admit(OrderSide::Buy).unwrap();

        assert_eq!(g.on_submission(OrderSide::Sell, &accepted()), SubmissionOutcome::Opened);
        assert!(g.snapshot().placed(OrderSide::Sell));
        assert_eq!(g.check(OrderSide::Sell), Err(Suppression::SideBusy(OrderSide::Sell)));
    }

    #[test]
    fn flat_resets_both_sides_and_cancels() {
        let mut g = guard(RiskLimits::default());
        for side in [OrderSide::Buy, OrderSide::Sell] {
            g.admit(side).unwrap();
            g.on_submission(side, &accepted());
        }
        g.reconcile(&LifecycleEvent::PositionOpened { side: OrderSide::Buy, quantity: dec!(1) });
        assert!(g.reconcile(&LifecycleEvent::PositionsFlat).contains(&GuardAction::CancelWorkingOrders));

        let s = g.snapshot();
        assert!(!s.placed(OrderSide::Buy) && !s.placed(OrderSide::Sell));
        assert!(s.is_flat());
        assert!(g.check(OrderSide::Buy).is_ok());
    }

    #[test]
    fn last_position_closing_counts_as_flat() {
        let mut g = guard(RiskLimits::default());
        g.admit(OrderSide::Buy).unwrap();
        g.on_submission(OrderSide::Buy, &accepted());
        g.reconcile(&LifecycleEvent::PositionOpened { side: OrderSide::Buy, quantity: dec!(1) });
        g.reconcile(&LifecycleEvent::PositionOpened { side: OrderSide::Buy, quantity: dec!(1) });

        assert!(g.reconcile(&LifecycleEvent::PositionClosed { side: OrderSide::Buy }).is_empty());
        assert!(g.snapshot().placed(OrderSide::Buy));
        assert_eq!(
            g.reconcile(&LifecycleEvent::PositionClosed { side: OrderSide::Buy }),
            vec![GuardAction::CancelWorkingOrders]
        );
        assert_eq!(g.snapshot().buy, SideState::Idle);
    }

    #[test]
    fn flat_while_idle_does_nothing() {
        let mut g = guard(RiskLimits::default());
        assert!(g.reconcile(&LifecycleEvent::PositionsFlat).is_empty());
    }

    #[test]
    fn twenty_fills_exhaust_max_trades() {
        let mut g = guard(RiskLimits { max_trades: Some(20), ..RiskLimits::default() });
        for _ in 0..19 {
            g.reconcile(&fill(dec!(0)));
        }
        assert!(g.check(OrderSide::Buy).is_ok());
        g.reconcile(&fill(dec!(0)));
        assert_eq!(g.snapshot().trade_count, 20);
        assert_eq!(
            g.admit(OrderSide::Buy),
            Err(Suppression::MaxTrades { count: 20, limit: 20 })
        );
        assert_eq!(g.snapshot().buy, SideState::Idle);
    }

    #[test]
    fn profit_and_loss_limits_use_gross_pnl() {
        let mut g = guard(RiskLimits {
            max_profit: Some(dec!(100)),
            max_loss: Some(dec!(50)),
            ..RiskLimits::default()
        });
        g.reconcile(&fill(dec!(99)));
        assert!(g.check(OrderSide::Sell).is_ok());
        g.reconcile(&fill(dec!(1)));
        assert!(matches!(g.check(OrderSide::Sell), Err(Suppression::MaxProfit { .. })));

        g.reconcile(&fill(dec!(-150)));
        assert_eq!(
            g.check(OrderSide::Sell),
            Err(Suppression::MaxLoss { gross_pnl: dec!(-50), limit: dec!(50) })
        );
        let s = g.snapshot();
        assert_eq!(s.net_pnl, dec!(-56));
        assert_eq!(s.total_fee, dec!(6));
    }

    #[test]
    fn missing_fill_values_count_as_zero() {
        let mut g = guard(RiskLimits::default());
        g.reconcile(&LifecycleEvent::TradeFilled(Fill::default()));
        let s = g.snapshot();
        assert_eq!(s.trade_count, 1);
        assert_eq!(s.gross_pnl, Decimal::ZERO);
    }

    #[test]
    fn limit_breach_keeps_open_side_open() {
        let mut g = guard(RiskLimits { max_trades: Some(1), ..RiskLimits::default() });
        g.admit(OrderSide::Buy).unwrap();
        g.on_submission(OrderSide::Buy, &accepted());
        g.reconcile(&fill(dec!(10)));
        assert!(g.snapshot().placed(OrderSide::Buy));
        assert!(matches!(g.check(OrderSide::Sell), Err(Suppression::MaxTrades { .. })));
    }

    #[test]
    fn require_flat_blocks_entries_while_positioned() {
        let mut g = guard(RiskLimits { require_flat: Some(true), ..RiskLimits::default() });
        g.reconcile(&LifecycleEvent::PositionOpened { side: OrderSide::Sell, quantity: dec!(1) });
        assert_eq!(g.check(OrderSide::Buy), Err(Suppression::NotFlat));
    }

    #[test]
    fn rejection_halts_once_and_leaves_side_unplaced() {
        let mut g = guard(RiskLimits::default());
        g.admit(OrderSide::Sell).unwrap();
        let outcome = g.on_submission(
            OrderSide::Sell,
            &SubmissionResult::Rejected { reason: "margin".to_string() },
        );
        assert_eq!(outcome, SubmissionOutcome::Halted { reason: "margin".to_string() });
        let s = g.snapshot();
        assert!(s.halted);
        assert_eq!(s.sell, SideState::Idle);
        assert!(!s.placed(OrderSide::Sell));
        assert_eq!(g.check(OrderSide::Buy), Err(Suppression::Halted));

        // A later refusal does not stop the instance a second time.
        assert!(g.reconcile(&LifecycleEvent::OrderRefused { reason: "again".to_string() }).is_empty());
    }

    #[test]
    fn platform_refusal_stops_once() {
        let mut g = guard(RiskLimits::default());
        let refused = LifecycleEvent::OrderRefused { reason: "risk rule".to_string() };
        assert_eq!(g.reconcile(&refused), vec![GuardAction::Stop("risk rule".to_string())]);
        assert!(g.reconcile(&refused).is_empty());
    }

    #[test]
    fn stale_acceptance_is_ignored() {
        let mut g = guard(RiskLimits::default());
        assert_eq!(g.on_submission(OrderSide::Buy, &accepted()), SubmissionOutcome::Ignored);
        assert_eq!(g.snapshot().buy, SideState::Idle);
    }

    #[test]
    fn negative_limits_are_rejected() {
        assert!(OrderGuard::new(RiskLimits { max_loss: Some(dec!(-1)), ..RiskLimits::default() }).is_err());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Admit(OrderSide),
        Accept(OrderSide),
        Reject(OrderSide),
        Opened(OrderSide),
        Closed(OrderSide),
        Flat,
        Fill(i64),
    }

    fn arb_side() -> impl Strategy<Value = OrderSide> {
        prop_oneof![Just(OrderSide::Buy), Just(OrderSide::Sell)]
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => arb_side().prop_map(Op::Admit),
            3 => arb_side().prop_map(Op::Accept),
            1 => arb_side().prop_map(Op::Reject),
            2 => arb_side().prop_map(Op::Opened),
            2 => arb_side().prop_map(Op::Closed),
            1 => Just(Op::Flat),
            2 => (-500i64..500).prop_map(Op::Fill),
        ]
    }

    proptest! {
        #[test]
        fn guard_invariants_hold(ops in prop::collection::vec(arb_op(), 0..80)) {
            let mut g = guard(RiskLimits { max_trades: Some(10), ..RiskLimits::default() });
            let mut stops = 0;
            let mut trades = 0u32;
            for op in ops {
                let before = g.snapshot();
                match op {
                    Op::Admit(side) => {
                        if g.admit(side).is_ok() {
                            // Never admitted while that side is in flight or placed.
                            prop_assert_eq!(before.side(side), SideState::Idle);
                            prop_assert!(!before.halted);
                        } else {
                            prop_assert_eq!(g.snapshot(), before);
                        }
                    }
                    Op::Accept(side) => {
                        g.on_submission(side, &accepted());
                    }
                    Op::Reject(side) => {
                        if let SubmissionOutcome::Halted { .. } =
                            g.on_submission(side, &SubmissionResult::Rejected { reason: "r".to_string() })
                        {
                            stops += 1;
                        }
                        prop_assert!(!g.snapshot().placed(side) || before.placed(side));
                    }
                    Op::Opened(side) => {
                        g.reconcile(&LifecycleEvent::PositionOpened { side, quantity: dec!(1) });
                    }
                    Op::Closed(side) => {
                        g.reconcile(&LifecycleEvent::PositionClosed { side });
                        if g.snapshot().is_flat() {
                            let s = g.snapshot();
                            prop_assert!(!s.placed(OrderSide::Buy) && !s.placed(OrderSide::Sell));
                        }
                    }
                    Op::Flat => {
                        g.reconcile(&LifecycleEvent::PositionsFlat);
                        let s = g.snapshot();
                        prop_assert!(!s.placed(OrderSide::Buy) && !s.placed(OrderSide::Sell));
                    }
                    Op::Fill(pnl) => {
                        g.reconcile(&fill(Decimal::from(pnl)));
                        trades += 1;
                    }
                }
                prop_assert_eq!(g.snapshot().trade_count, trades);
                prop_assert!(stops <= 1);
            }
        }
    }
}
