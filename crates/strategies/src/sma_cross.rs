use crate::error::StrategyError;
use crate::signal::SignalState;
use crate::Strategy;
use configuration::SmaCrossParams;
use core_types::{Bar, OrderSide, Signal, StrategyId};
use rust_decimal::prelude::*;
use std::collections::VecDeque;
use ta::indicators::SimpleMovingAverage as Sma;
use ta::Next;

/// Moving-average spread breakout.
///
/// Enters in the direction of the fast average when the spread between the
/// fast and slow averages on the forming bar exceeds a multiple of the mean
/// spread a few bars back. After an accepted entry the side stays latched
/// until the averages cross back.
pub struct SmaCross {
    symbol: String,
    ma_fast: Sma,
    ma_slow: Sma,
    slow_period: usize,
    closed: usize,
    last_closed: Option<u64>,
    // Spreads of completed bars, newest first.
    spreads: VecDeque<Decimal>,
    spread_offset: usize,
    spread_lookback: usize,
    multiplier: Decimal,
    last_side: Option<OrderSide>,
    new_bar: bool,
    state: SignalState,
}

impl SmaCross {
    pub fn new(params: SmaCrossParams, symbol: String) -> Result<Self, StrategyError> {
        if params.fast_period == 0 || params.fast_period >= params.slow_period {
            return Err(StrategyError::InvalidParameters(
                "Fast MA period must be positive and less than Slow MA period".to_string(),
            ));
        }
        if params.spread_offset == 0 || params.spread_lookback == 0 {
            return Err(StrategyError::InvalidParameters(
                "spread_offset and spread_lookback must be at least 1".to_string(),
            ));
        }
        if params.spread_multiplier <= Decimal::ZERO {
            return Err(StrategyError::InvalidParameters(
                "spread_multiplier must be positive".to_string(),
            ));
        }

        let capacity = params.spread_offset + params.spread_lookback - 1;
        Ok(Self {
            symbol,
            ma_fast: Sma::new(params.fast_period).map_err(|e| StrategyError::IndicatorError(format!("{e:?}")))?,
            ma_slow: Sma::new(params.slow_period).map_err(|e| StrategyError::IndicatorError(format!("{e:?}")))?,
            slow_period: params.slow_period,
            closed: 0,
            last_closed: None,
            spreads: VecDeque::with_capacity(capacity),
            spread_offset: params.spread_offset,
            spread_lookback: params.spread_lookback,
            multiplier: params.spread_multiplier,
            last_side: None,
            new_bar: false,
            state: SignalState::default(),
        })
    }

    fn spread_capacity(&self) -> usize {
        self.spread_offset + self.spread_lookback - 1
    }

    /// Mean spread over the configured offsets, once enough bars have been seen.
    fn reference_spread(&self) -> Option<Decimal> {
        if self.spreads.len() < self.spread_capacity() {
            return None;
        }
        let sum: Decimal = self
            .spreads
            .iter()
            .skip(self.spread_offset - 1)
            .take(self.spread_lookback)
            .sum();
        Some(sum / Decimal::from(self.spread_lookback))
    }

    /// Releases the latch once the averages have crossed back against it.
    fn release_latch(&mut self, fast: Decimal, slow: Decimal) {
        let crossed_back = match self.last_side {
            Some(OrderSide::Buy) => fast <= slow,
            Some(OrderSide::Sell) => fast >= slow,
            None => false,
        };
        if crossed_back {
            tracing::debug!(symbol = %self.symbol, side = ?self.last_side, "averages crossed back, latch released");
            self.last_side = None;
        }
    }
}

// The `ta` crate uses `f64`. Conversions at this boundary are the only place
// precision is traded away.
fn to_f64(value: Decimal) -> Result<f64, StrategyError> {
    value
        .to_f64()
        .ok_or_else(|| StrategyError::IndicatorError(format!("{value} does not fit in f64")))
}

fn to_decimal(value: f64) -> Result<Decimal, StrategyError> {
    Decimal::from_f64(value)
        .ok_or_else(|| StrategyError::IndicatorError(format!("moving average {value} is not a finite number")))
}

impl Strategy for SmaCross {
    fn id(&self) -> StrategyId {
        StrategyId::SmaCross
    }

    fn on_bar_update(&mut self, bar: &Bar) -> Result<Vec<Signal>, StrategyError> {
        let is_new_bar = std::mem::take(&mut self.new_bar);
        self.state = SignalState { is_new_bar, ..SignalState::default() };

        if self.closed + 1 < self.slow_period {
            return Ok(Vec::new());
        }

        // The forming bar must not advance the indicators, so evaluate on copies.
        let close = to_f64(bar.close)?;
        let fast = to_decimal(self.ma_fast.clone().next(close))?;
        let slow = to_decimal(self.ma_slow.clone().next(close))?;
        self.release_latch(fast, slow);

        let Some(reference) = self.reference_spread() else {
            return Ok(Vec::new());
        };
        let spread = (fast - slow).abs();

        tracing::debug!(
            symbol = %self.symbol,
            bar = bar.index,
            %fast,
            %slow,
            %spread,
            %reference,
            "MA spread evaluated"
        );

        if spread <= self.multiplier * reference || self.last_side.is_some() {
            return Ok(Vec::new());
        }
        let side = match fast.cmp(&slow) {
            std::cmp::Ordering::Greater => OrderSide::Buy,
            std::cmp::Ordering::Less => OrderSide::Sell,
            std::cmp::Ordering::Equal => return Ok(Vec::new()),
        };

        self.state.buy_eligible = side == OrderSide::Buy;
        self.state.sell_eligible = side == OrderSide::Sell;
        Ok(vec![Signal::market(bar.index, side)])
    }

    fn on_bar_closed(&mut self, bar: &Bar) -> Result<(), StrategyError> {
        if self.last_closed.is_some_and(|last| bar.index <= last) {
            return Ok(());
        }
        self.last_closed = Some(bar.index);
        let close = to_f64(bar.close)?;
        let fast = to_decimal(self.ma_fast.next(close))?;
        let slow = to_decimal(self.ma_slow.next(close))?;
        self.closed += 1;
        self.new_bar = true;

        if self.closed >= self.slow_period {
            self.spreads.push_front((fast - slow).abs());
            self.spreads.truncate(self.spread_capacity());
        }
        Ok(())
    }

    fn on_order_accepted(&mut self, side: OrderSide) {
        self.last_side = Some(side);
    }

    fn signal_state(&self) -> SignalState {
        self.state
    }
}
