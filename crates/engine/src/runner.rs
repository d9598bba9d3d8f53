use crate::engine::StrategyEngine;
use crate::error::EngineError;
use core_types::StrategyId;
use events::{Effect, EngineEvent, SubmissionResult};
use executor::OrderGateway;
use risk::OrderGuardState;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;

/// What a finished run looked like.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub strategy: StrategyId,
    pub events_processed: usize,
    pub orders_submitted: usize,
    /// `None` when the host closed the inbound channel.
    pub stop_reason: Option<String>,
    pub guard: OrderGuardState,
}

/// Drives one `StrategyEngine` from a single-consumer channel.
///
/// Events are handled strictly one at a time. Effects are carried out before
/// the next inbound event is taken, and the gateway's answer to a submission
/// is fed back into the engine first, so the engine never sees a submission
/// result out of order.
pub struct StrategyRunner {
    engine: StrategyEngine,
    gateway: Arc<dyn OrderGateway>,
    events_processed: usize,
    orders_submitted: usize,
}

impl StrategyRunner {
    pub fn new(engine: StrategyEngine, gateway: Arc<dyn OrderGateway>) -> Self {
        Self {
            engine,
            gateway,
            events_processed: 0,
            orders_submitted: 0,
        }
    }

    /// Consumes events until the strategy stops or the host closes the channel.
    pub async fn run(mut self, mut inbound: mpsc::Receiver<EngineEvent>) -> Result<RunSummary, EngineError> {
        tracing::info!(symbol = %self.engine.symbol(), strategy = %self.engine.strategy_id(), "runner started");

        while let Some(event) = inbound.recv().await {
            self.events_processed += 1;
            let effects = match self.engine.handle(event) {
                Ok(effects) => effects,
                Err(e) => {
                    // A bad event is skipped; the instance keeps running.
                    tracing::error!(symbol = %self.engine.symbol(), error = %e, "failed to process event");
                    continue;
                }
            };

            if let Some(reason) = self.apply(effects).await? {
                inbound.close();
                tracing::warn!(symbol = %self.engine.symbol(), %reason, "strategy stopped");
                return Ok(self.summary(Some(reason)));
            }
        }

        tracing::info!(symbol = %self.engine.symbol(), "inbound channel closed, runner finished");
        Ok(self.summary(None))
    }

    /// Carries out effects in order. Returns the stop reason once the engine asks to stop.
    async fn apply(&mut self, effects: Vec<Effect>) -> Result<Option<String>, EngineError> {
        let mut queue: VecDeque<Effect> = effects.into();

        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::SubmitOrder(intent) => {
                    if self.engine.is_stopped() {
                        tracing::debug!(client_order_id = %intent.client_order_id, "engine stopped, submission dropped");
                        continue;
                    }
                    self.orders_submitted += 1;
                    let result = match self.gateway.submit(&intent).await {
                        Ok(result) => result,
                        Err(e) => {
                            tracing::error!(client_order_id = %intent.client_order_id, error = %e, "gateway failed");
                            SubmissionResult::Rejected { reason: e.to_string() }
                        }
                    };
                    let follow_up = self.engine.handle(EngineEvent::Submission {
                        client_order_id: intent.client_order_id,
                        side: intent.side,
                        result,
                    })?;
                    queue.extend(follow_up);
                }
                Effect::CancelWorkingOrders { symbol, account } => {
                    // The sides are already released; a failed cancel leaves orders working at the venue.
                    match self.gateway.cancel_working_orders(&symbol, &account).await {
                        Ok(cancelled) => tracing::info!(%symbol, %account, cancelled, "working orders cancelled"),
                        Err(e) => tracing::error!(%symbol, %account, error = %e, "could not cancel working orders"),
                    }
                }
                Effect::StopStrategy { reason } => {
                    let symbol = self.engine.symbol().to_string();
                    let account = self.engine.account().to_string();
                    match self.gateway.cancel_working_orders(&symbol, &account).await {
                        Ok(cancelled) => tracing::info!(%symbol, cancelled, "working orders cancelled on stop"),
                        Err(e) => tracing::error!(%symbol, error = %e, "could not cancel working orders on stop"),
                    }
                    return Ok(Some(reason));
                }
            }
        }
        Ok(None)
    }

    fn summary(&self, stop_reason: Option<String>) -> RunSummary {
        RunSummary {
            strategy: self.engine.strategy_id(),
            events_processed: self.events_processed,
            orders_submitted: self.orders_submitted,
            stop_reason,
            guard: self.engine.snapshot(),
        }
    }
}
