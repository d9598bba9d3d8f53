use crate::error::StrategyError;
use core_types::{Bracket, OrderSide, OrderType};
use rust_decimal::{Decimal, RoundingStrategy};

/// Derives entry price and target/stop offsets from a detected range.
///
/// The half-width of the range is expressed in ticks and rounded half to
/// even, then shifted by `offset_ticks`. For a sell the target widens and
/// the stop tightens by the offset; a buy is mirrored. The calculator holds
/// no state besides its parameters, so identical inputs give identical
/// brackets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BracketCalculator {
    tick_size: Decimal,
    offset_ticks: Decimal,
}

impl BracketCalculator {
    pub fn new(tick_size: Decimal, offset_ticks: u32) -> Result<Self, StrategyError> {
        if tick_size <= Decimal::ZERO {
            return Err(StrategyError::InvalidParameters(format!(
                "tick size must be positive, got {tick_size}"
            )));
        }
        Ok(Self {
            tick_size,
            offset_ticks: Decimal::from(offset_ticks),
        })
    }

    pub fn tick_size(&self) -> Decimal {
        self.tick_size
    }

    /// Half the range width in whole ticks, rounded half to even.
    pub fn bracket_ticks(&self, high: Decimal, low: Decimal) -> Result<Decimal, StrategyError> {
        if high < low {
            return Err(StrategyError::InvalidRange { high, low });
        }
        let midpoint = (high - low) / Decimal::TWO;
        Ok((midpoint / self.tick_size)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
            .normalize())
    }

    pub fn compute(
        &self,
        high: Decimal,
        low: Decimal,
        side: OrderSide,
        order_type: OrderType,
    ) -> Result<Bracket, StrategyError> {
        let ticks = self.bracket_ticks(high, low)?;
        let offset_price = self.offset_ticks * self.tick_size;

        let entry_price = match (order_type, side) {
            // Resting fades sit just inside the range edge they fade.
            (OrderType::Limit, OrderSide::Sell) => high - offset_price,
            (OrderType::Limit, OrderSide::Buy) => low + offset_price,
            // Stop entries trigger beyond the opposite edge.
            (OrderType::Stop, OrderSide::Sell) => low - offset_price,
            (OrderType::Stop, OrderSide::Buy) => high + offset_price,
            (OrderType::Market, _) => {
                return Err(StrategyError::InvalidParameters(
                    "a range bracket needs a limit or stop entry".to_string(),
                ));
            }
        };

        let (target, stop) = match side {
            OrderSide::Sell => (ticks + self.offset_ticks, ticks - self.offset_ticks),
            OrderSide::Buy => (ticks - self.offset_ticks, ticks + self.offset_ticks),
        };

        Ok(Bracket {
            side,
            entry_price,
            target_offset_ticks: target,
            stop_offset_ticks: stop,
        })
    }
}

/// A bracket can only be placed when both legs sit away from the entry.
pub fn is_placeable(bracket: &Bracket) -> bool {
    bracket.target_offset_ticks > Decimal::ZERO && bracket.stop_offset_ticks > Decimal::ZERO
}
