use crate::bracket::{is_placeable, BracketCalculator};
use crate::error::StrategyError;
use crate::range::RangeWindow;
use crate::signal::{fade_eligibility, inside_range, SignalState};
use crate::Strategy;
use configuration::BoxRangeParams;
use core_types::{Bar, OrderSide, OrderType, Signal, StrategyId};
use rust_decimal::Decimal;

/// Fades the edges of a quiet range.
///
/// Once the previous completed bar sat strictly inside the range and price
/// is still inside it, the strategy fades the previous bar's direction with a
/// resting entry near the range edge. Target and stop are sized from the
/// half-width of the range.
pub struct BoxRange {
    symbol: String,
    full: RangeWindow,
    half: RangeWindow,
    trade_half_range: bool,
    order_type: OrderType,
    calculator: BracketCalculator,
    warmup_updates: u64,
    updates: u64,
    new_bar: bool,
    state: SignalState,
}

impl BoxRange {
    /// Creates a new `BoxRange` for `symbol` with the instrument's tick size.
    pub fn new(params: BoxRangeParams, tick_size: Decimal, symbol: String) -> Result<Self, StrategyError> {
        if params.half_lookback > params.lookback {
            return Err(StrategyError::InvalidParameters(
                "half_lookback must not exceed lookback".to_string(),
            ));
        }

        Ok(Self {
            symbol,
            full: RangeWindow::new(params.lookback, params.settle, params.retain_extremes)?,
            half: RangeWindow::new(params.half_lookback, params.settle, params.retain_extremes)?,
            trade_half_range: params.half_range,
            order_type: if params.stop_orders { OrderType::Stop } else { OrderType::Limit },
            calculator: BracketCalculator::new(tick_size, params.offset_ticks)?,
            warmup_updates: params.warmup_updates,
            updates: 0,
            new_bar: false,
            state: SignalState::default(),
        })
    }

    fn driving_window(&self) -> &RangeWindow {
        if self.trade_half_range { &self.half } else { &self.full }
    }
}

impl Strategy for BoxRange {
    fn id(&self) -> StrategyId {
        StrategyId::BoxRange
    }

    fn on_bar_update(&mut self, bar: &Bar) -> Result<Vec<Signal>, StrategyError> {
        self.updates = self.updates.saturating_add(1);
        self.full.advance(bar);
        self.half.advance(bar);

        let prev = self.full.history().latest().copied();
        let inside = inside_range(&self.full, prev.as_ref(), bar.close);
        let inside_half = inside_range(&self.half, prev.as_ref(), bar.close);
        let driving = if self.trade_half_range { inside_half } else { inside };

        let warmed_up = self.updates > self.warmup_updates;
        let (buy_eligible, sell_eligible) = if warmed_up {
            fade_eligibility(driving, prev.as_ref())
        } else {
            (false, false)
        };

        self.state = SignalState {
            inside_range: inside,
            inside_half_range: inside_half,
            is_new_bar: self.new_bar,
            buy_eligible,
            sell_eligible,
            ..SignalState::default()
        };
        self.new_bar = false;

        tracing::debug!(
            symbol = %self.symbol,
            bar = bar.index,
            high = ?self.full.high(),
            low = ?self.full.low(),
            inside,
            inside_half,
            "box range evaluated"
        );

        let Some((high, low)) = self.driving_window().bounds() else {
            return Ok(Vec::new());
        };

        let mut signals = Vec::new();
        for side in [OrderSide::Sell, OrderSide::Buy] {
            if !self.state.eligible(side) {
                continue;
            }
            let bracket = self.calculator.compute(high, low, side, self.order_type)?;
            if !is_placeable(&bracket) {
                tracing::debug!(
                    symbol = %self.symbol,
                    bar = bar.index,
                    %side,
                    target = %bracket.target_offset_ticks,
                    stop = %bracket.stop_offset_ticks,
                    "range too narrow for a bracket, skipping"
                );
                continue;
            }
            signals.push(Signal::bracketed(bar.index, self.order_type, &bracket));
        }
        Ok(signals)
    }

    fn on_bar_closed(&mut self, bar: &Bar) -> Result<(), StrategyError> {
        let pushed = self.full.push_closed(*bar);
        self.half.push_closed(*bar);
        if pushed {
            self.new_bar = true;
        }
        Ok(())
    }

    fn on_order_accepted(&mut self, _side: OrderSide) {}

    fn signal_state(&self) -> SignalState {
        self.state
    }
}
