use crate::error::StrategyError;
use crate::history::BarHistory;
use crate::signal::{body_surge, weighted_surge, SignalState};
use crate::Strategy;
use configuration::SurgeParams;
use core_types::{Bar, OrderSide, Signal, StrategyId};
use rust_decimal::Decimal;

/// What a surge is measured on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurgeMeasure {
    /// Candle body size, `|open - close|`.
    Body,
    /// Weighted close, `(high + low + 2 * close) / 4`.
    Weighted,
}

/// Momentum entry when the forming bar stands out against the trailing bars.
///
/// At most one entry is taken per bar: the new-bar latch is set when a bar
/// completes and consumed when an order is accepted.
pub struct Surge {
    symbol: String,
    measure: SurgeMeasure,
    history: BarHistory,
    lookback: usize,
    multiplier: Decimal,
    take_profit_ticks: Decimal,
    stop_loss_ticks: Decimal,
    new_bar: bool,
    state: SignalState,
}

impl Surge {
    pub fn new(params: SurgeParams, measure: SurgeMeasure, symbol: String) -> Result<Self, StrategyError> {
        if params.lookback == 0 {
            return Err(StrategyError::InvalidParameters(
                "surge lookback must be at least one bar".to_string(),
            ));
        }
        if params.multiplier <= Decimal::ZERO {
            return Err(StrategyError::InvalidParameters(format!(
                "surge multiplier must be positive, got {}",
                params.multiplier
            )));
        }

        Ok(Self {
            symbol,
            measure,
            history: BarHistory::new(params.lookback),
            lookback: params.lookback,
            multiplier: params.multiplier,
            take_profit_ticks: Decimal::from(params.take_profit_ticks),
            stop_loss_ticks: Decimal::from(params.stop_loss_ticks),
            new_bar: false,
            state: SignalState::default(),
        })
    }

    fn detect(&self, bar: &Bar) -> Option<OrderSide> {
        match self.measure {
            SurgeMeasure::Body => body_surge(&self.history, self.lookback, self.multiplier, bar),
            SurgeMeasure::Weighted => weighted_surge(&self.history, self.lookback, self.multiplier, bar),
        }
    }
}

impl Strategy for Surge {
    fn id(&self) -> StrategyId {
        match self.measure {
            SurgeMeasure::Body => StrategyId::PriceSurge,
            SurgeMeasure::Weighted => StrategyId::WeightedSurge,
        }
    }

    fn on_bar_update(&mut self, bar: &Bar) -> Result<Vec<Signal>, StrategyError> {
        let direction = if self.new_bar { self.detect(bar) } else { None };

        self.state = SignalState {
            is_new_bar: self.new_bar,
            buy_eligible: direction == Some(OrderSide::Buy),
            sell_eligible: direction == Some(OrderSide::Sell),
            ..SignalState::default()
        };

        let Some(side) = direction else {
            return Ok(Vec::new());
        };

        tracing::debug!(
            symbol = %self.symbol,
            bar = bar.index,
            %side,
            measure = ?self.measure,
            "surge detected"
        );
        Ok(vec![
            Signal::market(bar.index, side).with_offsets(self.take_profit_ticks, self.stop_loss_ticks),
        ])
    }

    fn on_bar_closed(&mut self, bar: &Bar) -> Result<(), StrategyError> {
        if self.history.push(*bar) {
            self.new_bar = true;
        }
        Ok(())
    }

    fn on_order_accepted(&mut self, _side: OrderSide) {
        self.new_bar = false;
    }

    fn signal_state(&self) -> SignalState {
        self.state
    }
}
