use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Returns the opposite side of the order
    pub fn opposite(&self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}

/// How an entry order is worked at the venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    /// Rests at `price`.
    Limit,
    /// Becomes a market order once `trigger_price` trades.
    Stop,
}

/// The colour of a bar, derived from its open/close relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarColor {
    Green,
    Red,
    Doji,
}

impl BarColor {
    /// The side a bar of this colour points to when read as momentum.
    /// A green bar points up (buy), a red one down (sell).
    pub fn momentum_side(&self) -> Option<OrderSide> {
        match self {
            BarColor::Green => Some(OrderSide::Buy),
            BarColor::Red => Some(OrderSide::Sell),
            BarColor::Doji => None,
        }
    }
}

/// Identifies which strategy variant an engine instance runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyId {
    BoxRange,
    RangeScalp,
    PriceSurge,
    WeightedSurge,
    SmaCross,
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyId::BoxRange => "box_range",
            StrategyId::RangeScalp => "range_scalp",
            StrategyId::PriceSurge => "price_surge",
            StrategyId::WeightedSurge => "weighted_surge",
            StrategyId::SmaCross => "sma_cross",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_side_flips() {
        assert_eq!(OrderSide::Buy.opposite(), OrderSide::Sell);
        assert_eq!(OrderSide::Sell.opposite(), OrderSide::Buy);
    }

    #[test]
    fn strategy_id_uses_snake_case_on_the_wire() {
        let id: StrategyId = serde_json::from_str("\"weighted_surge\"").unwrap();
        assert_eq!(id, StrategyId::WeightedSurge);
        assert_eq!(StrategyId::SmaCross.to_string(), "sma_cross");
    }
}
