use crate::error::StrategyError;
use crate::history::BarHistory;
use core_types::Bar;
use rust_decimal::Decimal;

/// Rolling high/low over a trailing count of completed bars.
///
/// The window covers the `lookback` completed bars that follow the `settle`
/// most recent ones, plus the close of the forming bar. With
/// `retain_extremes` an extreme stays in force after its bar has aged out,
/// so the range can only widen over a run.
///
/// Until `settle + lookback` bars have completed the window is uninitialized
/// and `bounds()` returns `None`.
#[derive(Debug, Clone)]
pub struct RangeWindow {
    lookback: usize,
    settle: usize,
    retain_extremes: bool,
    closed: BarHistory,
    high: Option<Decimal>,
    low: Option<Decimal>,
}

impl RangeWindow {
    pub fn new(lookback: usize, settle: usize, retain_extremes: bool) -> Result<Self, StrategyError> {
        if lookback == 0 {
            return Err(StrategyError::InvalidParameters(
                "range lookback must be at least one bar".to_string(),
            ));
        }
        Ok(Self {
            lookback,
            settle,
            retain_extremes,
            closed: BarHistory::new(settle + lookback),
            high: None,
            low: None,
        })
    }

    /// Completed bars needed before the window reports a range.
    pub fn required_bars(&self) -> usize {
        self.settle + self.lookback
    }

    /// Records a completed bar. Duplicates and stale bars are ignored.
    pub fn push_closed(&mut self, bar: Bar) -> bool {
        self.closed.push(bar)
    }

    /// Folds the forming bar into the window and recomputes its extremes.
    pub fn advance(&mut self, forming: &Bar) {
        let mut high = forming.close;
        let mut low = forming.close;

        for bar in self.closed.iter().skip(self.settle).take(self.lookback) {
            high = high.max(bar.high).max(bar.close);
            low = low.min(bar.low).min(bar.close);
        }

        if self.retain_extremes {
            if let Some(prev) = self.high {
                high = high.max(prev);
            }
            if let Some(prev) = self.low {
                low = low.min(prev);
            }
        }

        self.high = Some(high);
        self.low = Some(low);
    }

    pub fn is_initialized(&self) -> bool {
        self.high.is_some() && self.closed.len() >= self.required_bars()
    }

    /// `(high, low)` once initialized.
    pub fn bounds(&self) -> Option<(Decimal, Decimal)> {
        if !self.is_initialized() {
            return None;
        }
        Some((self.high?, self.low?))
    }

    /// Raw extremes, available before initialization for reporting.
    pub fn high(&self) -> Option<Decimal> {
        self.high
    }

    pub fn low(&self) -> Option<Decimal> {
        self.low
    }

    pub fn history(&self) -> &BarHistory {
        &self.closed
    }
}
