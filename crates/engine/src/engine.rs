use crate::error::EngineError;
use configuration::Config;
use core_types::{Bar, OrderIntent, OrderSide, StrategyId};
use events::{Effect, EngineEvent, LifecycleEvent, SubmissionResult};
use risk::{GuardAction, OrderGuard, OrderGuardState, SubmissionOutcome, Suppression};
use rust_decimal::Decimal;
use std::collections::HashMap;
use strategies::{create_strategy, SignalState, Strategy};
use uuid::Uuid;

/// The reducer at the centre of one strategy instance.
///
/// `handle` folds one inbound event into the strategy, the order guard and
/// the pending submissions, and returns the effects the host must carry out.
/// It performs no I/O, so replaying the same events gives the same effects.
pub struct StrategyEngine {
    symbol: String,
    account: String,
    quantity: Decimal,
    strategy: Box<dyn Strategy>,
    guard: OrderGuard,
    /// Submissions handed to the host and not yet answered.
    pending: HashMap<Uuid, OrderSide>,
    sequence: u64,
    last_suppression: Option<Suppression>,
    stop_reason: Option<String>,
}

impl StrategyEngine {
    /// Validates `config` and builds the strategy it selects.
    ///
    /// Fails with `EngineError::Configuration` when the instance identity is
    /// incomplete, so an engine never runs partially initialized.
    pub fn new(config: &Config) -> Result<Self, EngineError> {
        config.validate()?;
        let strategy = create_strategy(config)?;
        let guard = OrderGuard::new(config.risk_limits())?;

        tracing::info!(
            symbol = %config.instance.symbol,
            account = %config.instance.account,
            strategy = %config.strategy,
            "strategy engine initialized"
        );

        Ok(Self {
            symbol: config.instance.symbol.clone(),
            account: config.instance.account.clone(),
            quantity: config.instance.quantity,
            strategy,
            guard,
            pending: HashMap::new(),
            sequence: 0,
            last_suppression: None,
            stop_reason: None,
        })
    }

    pub fn handle(&mut self, event: EngineEvent) -> Result<Vec<Effect>, EngineError> {
        if self.stop_reason.is_some() {
            tracing::debug!(symbol = %self.symbol, ?event, "engine stopped, event dropped");
            return Ok(Vec::new());
        }

        match event {
            EngineEvent::BarUpdate(bar) => self.on_bar_update(&bar),
            EngineEvent::NewBar(bar) => {
                bar.validate()?;
                self.strategy.on_bar_closed(&bar)?;
                Ok(Vec::new())
            }
            EngineEvent::Lifecycle(event) => Ok(self.on_lifecycle(&event)),
            EngineEvent::Submission { client_order_id, side, result } => {
                Ok(self.on_submission(client_order_id, side, &result))
            }
            EngineEvent::Stop { reason } => {
                tracing::info!(symbol = %self.symbol, %reason, "stop requested by host");
                Ok(self.stop(reason))
            }
        }
    }

    fn on_bar_update(&mut self, bar: &Bar) -> Result<Vec<Effect>, EngineError> {
        bar.validate()?;
        let signals = self.strategy.on_bar_update(bar)?;

        let mut effects = Vec::new();
        for signal in signals {
            match self.guard.admit(signal.side) {
                Ok(()) => {
                    self.last_suppression = None;
                    self.sequence += 1;
                    let client_order_id = self.client_order_id(bar.index, signal.side);
                    let intent = OrderIntent::from_signal(
                        client_order_id,
                        &self.symbol,
                        &self.account,
                        self.quantity,
                        &signal,
                    );
                    tracing::info!(
                        symbol = %self.symbol,
                        side = %intent.side,
                        bar = bar.index,
                        order_type = ?intent.order_type,
                        price = ?intent.price,
                        trigger = ?intent.trigger_price,
                        take_profit_ticks = ?intent.take_profit_ticks,
                        stop_loss_ticks = ?intent.stop_loss_ticks,
                        "submitting entry"
                    );
                    self.pending.insert(client_order_id, signal.side);
                    effects.push(Effect::SubmitOrder(intent));
                }
                Err(suppression) => self.note_suppression(bar.index, suppression),
            }
        }
        Ok(effects)
    }

    /// Busy sides are routine; limit suppressions are reported once per change.
    fn note_suppression(&mut self, bar: u64, suppression: Suppression) {
        match suppression {
            Suppression::SideBusy(_) | Suppression::Halted => {
                tracing::debug!(symbol = %self.symbol, bar, %suppression, "entry suppressed");
            }
            _ if self.last_suppression.as_ref() != Some(&suppression) => {
                tracing::warn!(symbol = %self.symbol, bar, %suppression, "entry suppressed");
                self.last_suppression = Some(suppression);
            }
            _ => {}
        }
    }

    fn on_lifecycle(&mut self, event: &LifecycleEvent) -> Vec<Effect> {
        let mut effects = Vec::new();
        for action in self.guard.reconcile(event) {
            match action {
                GuardAction::CancelWorkingOrders => effects.push(Effect::CancelWorkingOrders {
                    symbol: self.symbol.clone(),
                    account: self.account.clone(),
                }),
                GuardAction::Stop(reason) => {
                    effects.extend(self.stop(reason));
                    break;
                }
            }
        }
        effects
    }

    /// The side recorded at submission time is authoritative; the side echoed
    /// back with the result is only checked.
    fn on_submission(&mut self, client_order_id: Uuid, reported: OrderSide, result: &SubmissionResult) -> Vec<Effect> {
        let Some(side) = self.pending.remove(&client_order_id) else {
            tracing::warn!(symbol = %self.symbol, %client_order_id, "result for an unknown submission ignored");
            return Vec::new();
        };
        if reported != side {
            tracing::warn!(
                symbol = %self.symbol,
                %client_order_id,
                %side,
                %reported,
                "submission result reports the wrong side, using the submitted one"
            );
        }

        match self.guard.on_submission(side, result) {
            SubmissionOutcome::Opened => {
                self.strategy.on_order_accepted(side);
                Vec::new()
            }
            SubmissionOutcome::Halted { reason } => {
                tracing::error!(symbol = %self.symbol, %side, %reason, "submission refused, stopping strategy");
                self.stop(reason)
            }
            SubmissionOutcome::Ignored => Vec::new(),
        }
    }

    fn stop(&mut self, reason: String) -> Vec<Effect> {
        self.guard.halt();
        self.pending.clear();
        self.stop_reason = Some(reason.clone());
        vec![Effect::StopStrategy { reason }]
    }

    fn client_order_id(&self, bar: u64, side: OrderSide) -> Uuid {
        let name = format!("{}/{}/{}/{}/{}", self.symbol, self.account, bar, side, self.sequence);
        Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn strategy_id(&self) -> StrategyId {
        self.strategy.id()
    }

    pub fn signal_state(&self) -> SignalState {
        self.strategy.signal_state()
    }

    pub fn snapshot(&self) -> OrderGuardState {
        self.guard.snapshot()
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_reason.is_some()
    }

    pub fn stop_reason(&self) -> Option<&str> {
        self.stop_reason.as_deref()
    }
}
