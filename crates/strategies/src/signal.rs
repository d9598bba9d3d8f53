//! Signal evaluation shared by the strategy variants.
//!
//! Everything here is a pure function of the windows and bars it is handed.
//! None of it looks at account or risk state.

use crate::history::BarHistory;
use crate::range::RangeWindow;
use core_types::{Bar, BarColor, OrderSide};
use rust_decimal::Decimal;
use serde::Serialize;

/// Per-tick view of a strategy's signal flags, reported by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SignalState {
    pub inside_range: bool,
    pub inside_half_range: bool,
    pub buy_permitted: bool,
    pub sell_permitted: bool,
    pub is_new_bar: bool,
    pub buy_eligible: bool,
    pub sell_eligible: bool,
}

impl SignalState {
    pub fn eligible(&self, side: OrderSide) -> bool {
        match side {
            OrderSide::Buy => self.buy_eligible,
            OrderSide::Sell => self.sell_eligible,
        }
    }
}

/// True when the previous completed bar sat strictly inside the window and
/// the current price still does.
///
/// An uninitialized window or a missing previous bar is never inside.
pub fn inside_range(window: &RangeWindow, prev: Option<&Bar>, price: Decimal) -> bool {
    let (Some((high, low)), Some(prev)) = (window.bounds(), prev) else {
        return false;
    };
    prev.high < high && prev.low > low && price > low && price < high
}

/// Splits an inside-range reading into per-side eligibility.
///
/// A green previous bar makes the fade a sell, a red one a buy. A doji gives
/// neither side.
pub fn fade_eligibility(inside: bool, prev: Option<&Bar>) -> (bool, bool) {
    match (inside, prev.map(Bar::color)) {
        (true, Some(BarColor::Red)) => (true, false),
        (true, Some(BarColor::Green)) => (false, true),
        _ => (false, false),
    }
}

/// Mean of `measure` over the `lookback` newest completed bars, or `None`
/// until that many are available.
fn trailing_mean(history: &BarHistory, lookback: usize, measure: impl Fn(&Bar) -> Decimal) -> Option<Decimal> {
    if lookback == 0 || history.len() < lookback {
        return None;
    }
    let sum: Decimal = history.iter().take(lookback).map(measure).sum();
    Some(sum / Decimal::from(lookback))
}

/// Direction of a body-size breakout on the forming bar, if any.
pub fn body_surge(
    history: &BarHistory,
    lookback: usize,
    multiplier: Decimal,
    current: &Bar,
) -> Option<OrderSide> {
    let average = trailing_mean(history, lookback, Bar::body)?;
    if current.body() > multiplier * average {
        current.color().momentum_side()
    } else {
        None
    }
}

/// Direction of a weighted-price breakout on the forming bar, if any.
pub fn weighted_surge(
    history: &BarHistory,
    lookback: usize,
    multiplier: Decimal,
    current: &Bar,
) -> Option<OrderSide> {
    let average = trailing_mean(history, lookback, Bar::weighted)?;
    if current.weighted() > multiplier * average {
        current.color().momentum_side()
    } else {
        None
    }
}

/// Colour-driven entry permissions, set at each bar boundary and consumed
/// by an accepted order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PermitLatch {
    pub buy: bool,
    pub sell: bool,
}

impl PermitLatch {
    /// A green close permits a sell, a red close a buy. A doji leaves both as they are.
    pub fn on_bar_closed(&mut self, closed: &Bar) {
        if let Some(momentum) = closed.color().momentum_side() {
            self.consume(momentum);
            self.set(momentum.opposite());
        }
    }

    fn set(&mut self, side: OrderSide) {
        match side {
            OrderSide::Buy => self.buy = true,
            OrderSide::Sell => self.sell = true,
        }
    }

    pub fn is_set(&self, side: OrderSide) -> bool {
        match side {
            OrderSide::Buy => self.buy,
            OrderSide::Sell => self.sell,
        }
    }

    pub fn consume(&mut self, side: OrderSide) {
        match side {
            OrderSide::Buy => self.buy = false,
            OrderSide::Sell => self.sell = false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ohlc(index: u64, open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> Bar {
        Bar::new(index, open, high, low, close)
    }

    fn seeded_window() -> RangeWindow {
        // Full window of two bars behind one settle bar: 100..105.
        let mut window = RangeWindow::new(2, 1, true).unwrap();
        window.push_closed(ohlc(1, dec!(101), dec!(105), dec!(101), dec!(102)));
        window.push_closed(ohlc(2, dec!(102), dec!(103), dec!(100), dec!(101)));
        window.push_closed(ohlc(3, dec!(101), dec!(102), dec!(101), dec!(101.5)));
        window.advance(&ohlc(4, dec!(101.5), dec!(102), dec!(101), dec!(102)));
        window
    }

    #[test]
    fn inside_needs_both_bars_strictly_contained() {
        let window = seeded_window();
        assert_eq!(window.bounds(), Some((dec!(105), dec!(100))));
        let prev = ohlc(3, dec!(101), dec!(102), dec!(101), dec!(101.5));
        assert!(inside_range(&window, Some(&prev), dec!(102)));

        // Price on the edge is not inside.
        assert!(!inside_range(&window, Some(&prev), dec!(105)));
        // A previous bar touching the high is not inside.
        let touching = ohlc(3, dec!(101), dec!(105), dec!(101), dec!(104));
        assert!(!inside_range(&window, Some(&touching), dec!(102)));
        assert!(!inside_range(&window, None, dec!(102)));
    }

    #[test]
    fn uninitialized_window_is_never_inside() {
        let window = RangeWindow::new(5, 1, true).unwrap();
        let prev = ohlc(1, dec!(1), dec!(2), dec!(0.5), dec!(1));
        assert!(!inside_range(&window, Some(&prev), dec!(1)));
    }

    #[test]
    fn fade_direction_follows_previous_colour() {
        let green = ohlc(1, dec!(100), dec!(102), dec!(99), dec!(101));
        let red = ohlc(1, dec!(101), dec!(102), dec!(99), dec!(100));
        let doji = ohlc(1, dec!(100), dec!(102), dec!(99), dec!(100));
        assert_eq!(fade_eligibility(true, Some(&green)), (false, true));
        assert_eq!(fade_eligibility(true, Some(&red)), (true, false));
        assert_eq!(fade_eligibility(true, Some(&doji)), (false, false));
        assert_eq!(fade_eligibility(false, Some(&red)), (false, false));
    }

    fn body_history() -> BarHistory {
        let mut history = BarHistory::new(3);
        for i in 1..=3 {
            // Body of 1.0 each.
            history.push(ohlc(i, dec!(100), dec!(101.5), dec!(99.5), dec!(101)));
        }
        history
    }

    #[test]
    fn body_surge_direction_and_threshold() {
        let history = body_history();
        let up = ohlc(4, dec!(100), dec!(101.5), dec!(100), dec!(101.25));
        assert_eq!(body_surge(&history, 3, dec!(1.15), &up), Some(OrderSide::Buy));

        let down = ohlc(4, dec!(101.25), dec!(101.5), dec!(99.5), dec!(100));
        assert_eq!(body_surge(&history, 3, dec!(1.15), &down), Some(OrderSide::Sell));

        // 1.15 is not strictly above 1.15.
        let equal = ohlc(4, dec!(100), dec!(101.5), dec!(99.5), dec!(101.15));
        assert_eq!(body_surge(&history, 3, dec!(1.15), &equal), None);
    }

    #[test]
    fn surge_waits_for_full_lookback() {
        let history = body_history();
        let up = ohlc(4, dec!(100), dec!(105), dec!(100), dec!(105));
        assert_eq!(body_surge(&history, 4, dec!(1.15), &up), None);
    }

    #[test]
    fn weighted_surge_compares_weighted_prices() {
        let mut history = BarHistory::new(2);
        history.push(ohlc(1, dec!(10), dec!(12), dec!(8), dec!(10)));
        history.push(ohlc(2, dec!(10), dec!(12), dec!(8), dec!(10)));
        // Trailing weighted mean is 10.
        let up = ohlc(3, dec!(10), dec!(14), dec!(10), dec!(12));
        // (14 + 10 + 24) / 4 = 12 > 11.5
        assert_eq!(weighted_surge(&history, 2, dec!(1.15), &up), Some(OrderSide::Buy));
        let small = ohlc(3, dec!(10), dec!(12), dec!(10), dec!(11));
        assert_eq!(weighted_surge(&history, 2, dec!(1.15), &small), None);
    }

    #[test]
    fn permit_latch_flips_on_colour_and_survives_doji() {
        let mut latch = PermitLatch::default();
        latch.on_bar_closed(&ohlc(1, dec!(100), dec!(102), dec!(99), dec!(101)));
        assert!(latch.is_set(OrderSide::Sell) && !latch.is_set(OrderSide::Buy));

        latch.on_bar_closed(&ohlc(2, dec!(100), dec!(102), dec!(99), dec!(100)));
        assert!(latch.sell);

        latch.on_bar_closed(&ohlc(3, dec!(101), dec!(102), dec!(99), dec!(100)));
        assert!(latch.buy && !latch.sell);

        latch.consume(OrderSide::Buy);
        assert_eq!(latch, PermitLatch::default());
    }
}
