use crate::error::StrategyError;
use crate::range::RangeWindow;
use crate::signal::{PermitLatch, SignalState};
use crate::Strategy;
use configuration::RangeScalpParams;
use core_types::{Bar, Bracket, OrderSide, OrderType, Signal, StrategyId};
use rust_decimal::Decimal;

/// Breakout scalp off the range edges.
///
/// The colour of each completed bar permits the opposite side: a green bar
/// permits a sell stop under the range low, a red bar a buy stop over the
/// range high. A permission lasts until an order on that side is accepted or
/// an opposing bar closes.
pub struct RangeScalp {
    symbol: String,
    window: RangeWindow,
    latch: PermitLatch,
    trigger_offset: Decimal,
    take_profit_ticks: Decimal,
    stop_loss_ticks: Decimal,
    new_bar: bool,
    state: SignalState,
}

impl RangeScalp {
    pub fn new(params: RangeScalpParams, tick_size: Decimal, symbol: String) -> Result<Self, StrategyError> {
        if tick_size <= Decimal::ZERO {
            return Err(StrategyError::InvalidParameters(format!(
                "tick size must be positive, got {tick_size}"
            )));
        }
        if params.take_profit_ticks == 0 || params.stop_loss_ticks == 0 {
            return Err(StrategyError::InvalidParameters(
                "range_scalp bracket offsets must be at least one tick".to_string(),
            ));
        }

        Ok(Self {
            symbol,
            window: RangeWindow::new(params.lookback, params.settle, params.retain_extremes)?,
            latch: PermitLatch::default(),
            trigger_offset: Decimal::from(params.trigger_offset_ticks) * tick_size,
            take_profit_ticks: Decimal::from(params.take_profit_ticks),
            stop_loss_ticks: Decimal::from(params.stop_loss_ticks),
            new_bar: false,
            state: SignalState::default(),
        })
    }

    fn trigger(&self, side: OrderSide, high: Decimal, low: Decimal) -> Decimal {
        match side {
            OrderSide::Buy => high + self.trigger_offset,
            OrderSide::Sell => low - self.trigger_offset,
        }
    }
}

impl Strategy for RangeScalp {
    fn id(&self) -> StrategyId {
        StrategyId::RangeScalp
    }

    fn on_bar_update(&mut self, bar: &Bar) -> Result<Vec<Signal>, StrategyError> {
        self.window.advance(bar);
        let bounds = self.window.bounds();
        let ready = bounds.is_some();

        self.state = SignalState {
            buy_permitted: self.latch.buy,
            sell_permitted: self.latch.sell,
            is_new_bar: self.new_bar,
            buy_eligible: ready && self.latch.buy,
            sell_eligible: ready && self.latch.sell,
            ..SignalState::default()
        };
        self.new_bar = false;

        let Some((high, low)) = bounds else {
            return Ok(Vec::new());
        };

        let mut signals = Vec::new();
        for side in [OrderSide::Buy, OrderSide::Sell] {
            if !self.state.eligible(side) {
                continue;
            }
            let bracket = Bracket {
                side,
                entry_price: self.trigger(side, high, low),
                target_offset_ticks: self.take_profit_ticks,
                stop_offset_ticks: self.stop_loss_ticks,
            };
            tracing::debug!(
                symbol = %self.symbol,
                bar = bar.index,
                %side,
                trigger = %bracket.entry_price,
                "range scalp permitted"
            );
            signals.push(Signal::bracketed(bar.index, OrderType::Stop, &bracket));
        }
        Ok(signals)
    }

    fn on_bar_closed(&mut self, bar: &Bar) -> Result<(), StrategyError> {
        if self.window.push_closed(*bar) {
            self.latch.on_bar_closed(bar);
            self.new_bar = true;
        }
        Ok(())
    }

    fn on_order_accepted(&mut self, side: OrderSide) {
        self.latch.consume(side);
    }

    fn signal_state(&self) -> SignalState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn scalp() -> RangeScalp {
        let params = RangeScalpParams { lookback: 2, ..RangeScalpParams::default() };
        RangeScalp::new(params, dec!(0.25), "NQ".to_string()).unwrap()
    }

    fn ohlc(index: u64, open: Decimal, close: Decimal) -> Bar {
        Bar::new(index, open, open.max(close) + dec!(0.5), open.min(close) - dec!(0.5), close)
    }

    #[test]
    fn red_bar_permits_a_buy_stop_above_the_range() {
        let mut strategy = scalp();
        strategy.on_bar_closed(&ohlc(1, dec!(100), dec!(101))).unwrap();
        strategy.on_bar_closed(&ohlc(2, dec!(101), dec!(100))).unwrap();

        let signals = strategy.on_bar_update(&ohlc(3, dec!(100), dec!(100.25))).unwrap();
        assert_eq!(signals.len(), 1);
        let signal = &signals[0];
        assert_eq!(signal.side, OrderSide::Buy);
        assert_eq!(signal.order_type, OrderType::Stop);
        // Range high 101.5 plus two ticks.
        assert_eq!(signal.entry_price, Some(dec!(102.0)));
        assert_eq!(signal.take_profit_ticks, Some(dec!(6)));
        assert_eq!(signal.stop_loss_ticks, Some(dec!(40)));
        assert!(strategy.signal_state().buy_permitted);
    }

    #[test]
    fn green_bar_permits_a_sell_stop_below_the_range() {
        let mut strategy = scalp();
        strategy.on_bar_closed(&ohlc(1, dec!(101), dec!(100))).unwrap();
        strategy.on_bar_closed(&ohlc(2, dec!(100), dec!(101))).unwrap();

        let signals = strategy.on_bar_update(&ohlc(3, dec!(101), dec!(101))).unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].side, OrderSide::Sell);
        // Range low 99.5 minus two ticks.
        assert_eq!(signals[0].entry_price, Some(dec!(99.0)));
    }

    #[test]
    fn accepted_order_consumes_the_permission() {
        let mut strategy = scalp();
        strategy.on_bar_closed(&ohlc(1, dec!(100), dec!(101))).unwrap();
        strategy.on_bar_closed(&ohlc(2, dec!(101), dec!(100))).unwrap();
        assert_eq!(strategy.on_bar_update(&ohlc(3, dec!(100), dec!(100))).unwrap().len(), 1);

        strategy.on_order_accepted(OrderSide::Buy);
        assert!(strategy.on_bar_update(&ohlc(3, dec!(100), dec!(100))).unwrap().is_empty());

        // A doji does not re-arm anything.
        strategy.on_bar_closed(&ohlc(3, dec!(100), dec!(100))).unwrap();
        assert!(strategy.on_bar_update(&ohlc(4, dec!(100), dec!(100))).unwrap().is_empty());
    }

    #[test]
    fn permission_waits_for_the_range() {
        let mut strategy = scalp();
        strategy.on_bar_closed(&ohlc(1, dec!(101), dec!(100))).unwrap();
        assert!(strategy.on_bar_update(&ohlc(2, dec!(100), dec!(100))).unwrap().is_empty());
        let state = strategy.signal_state();
        assert!(state.buy_permitted && !state.buy_eligible);
    }
}
