use crate::enums::{BarColor, OrderSide, OrderType};
use crate::error::CoreError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One OHLC observation for a fixed time interval.
///
/// `index` increases by one per bar and never repeats within a feed. While a
/// bar is still forming the host re-delivers it with the same index and
/// updated prices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub index: u64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

impl Bar {
    pub fn new(index: u64, open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> Self {
        Self { index, open, high, low, close }
    }

    /// Rejects bars whose high/low do not enclose the open and close.
    pub fn validate(&self) -> Result<(), CoreError> {
        let top = self.open.max(self.close);
        let bottom = self.open.min(self.close);
        if self.high < top || self.low > bottom {
            return Err(CoreError::InvalidInput(
                format!("bar {}", self.index),
                format!(
                    "high {} / low {} do not enclose open {} / close {}",
                    self.high, self.low, self.open, self.close
                ),
            ));
        }
        Ok(())
    }

    /// Absolute size of the candle body.
    pub fn body(&self) -> Decimal {
        (self.open - self.close).abs()
    }

    /// Weighted close, `(high + low + 2 * close) / 4`.
    pub fn weighted(&self) -> Decimal {
        (self.high + self.low + self.close + self.close) / Decimal::from(4)
    }

    pub fn color(&self) -> BarColor {
        if self.close > self.open {
            BarColor::Green
        } else if self.close < self.open {
            BarColor::Red
        } else {
            BarColor::Doji
        }
    }
}

/// Take-profit / stop-loss offsets, in ticks from the fill, attached to an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    pub side: OrderSide,
    /// Limit price or stop trigger of the entry order.
    pub entry_price: Decimal,
    pub target_offset_ticks: Decimal,
    pub stop_offset_ticks: Decimal,
}

/// A strategy's request to open a position.
///
/// Signals carry no quantity or identity; the engine fills those in from the
/// instance configuration once the order guard admits the signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub bar_index: u64,
    pub side: OrderSide,
    pub order_type: OrderType,
    /// Limit price for `Limit`, trigger for `Stop`, `None` for `Market`.
    pub entry_price: Option<Decimal>,
    pub take_profit_ticks: Option<Decimal>,
    pub stop_loss_ticks: Option<Decimal>,
}

impl Signal {
    pub fn market(bar_index: u64, side: OrderSide) -> Self {
        Self {
            bar_index,
            side,
            order_type: OrderType::Market,
            entry_price: None,
            take_profit_ticks: None,
            stop_loss_ticks: None,
        }
    }

    /// Builds a resting entry (limit or stop) carrying the given bracket.
    pub fn bracketed(bar_index: u64, order_type: OrderType, bracket: &Bracket) -> Self {
        Self {
            bar_index,
            side: bracket.side,
            order_type,
            entry_price: match order_type {
                OrderType::Market => None,
                OrderType::Limit | OrderType::Stop => Some(bracket.entry_price),
            },
            take_profit_ticks: Some(bracket.target_offset_ticks),
            stop_loss_ticks: Some(bracket.stop_offset_ticks),
        }
    }

    pub fn with_offsets(mut self, take_profit_ticks: Decimal, stop_loss_ticks: Decimal) -> Self {
        self.take_profit_ticks = Some(take_profit_ticks);
        self.stop_loss_ticks = Some(stop_loss_ticks);
        self
    }
}

/// A fully specified order, ready for the order gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub client_order_id: Uuid,
    pub symbol: String,
    pub account: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: Decimal,
    /// Limit price, only for `OrderType::Limit`.
    pub price: Option<Decimal>,
    /// Trigger price, only for `OrderType::Stop`.
    pub trigger_price: Option<Decimal>,
    pub take_profit_ticks: Option<Decimal>,
    pub stop_loss_ticks: Option<Decimal>,
}

impl OrderIntent {
    pub fn from_signal(
        client_order_id: Uuid,
        symbol: &str,
        account: &str,
        quantity: Decimal,
        signal: &Signal,
    ) -> Self {
        let (price, trigger_price) = match signal.order_type {
            OrderType::Market => (None, None),
            OrderType::Limit => (signal.entry_price, None),
            OrderType::Stop => (None, signal.entry_price),
        };
        Self {
            client_order_id,
            symbol: symbol.to_string(),
            account: account.to_string(),
            side: signal.side,
            order_type: signal.order_type,
            quantity,
            price,
            trigger_price,
            take_profit_ticks: signal.take_profit_ticks,
            stop_loss_ticks: signal.stop_loss_ticks,
        }
    }
}

/// P&L attached to one trade confirmation. The platform may omit any field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    #[serde(default)]
    pub net_pnl: Option<Decimal>,
    #[serde(default)]
    pub gross_pnl: Option<Decimal>,
    #[serde(default)]
    pub fee: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bar(open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> Bar {
        Bar::new(7, open, high, low, close)
    }

    #[test]
    fn body_and_color() {
        let green = bar(dec!(100), dec!(102), dec!(99), dec!(101.5));
        assert_eq!(green.body(), dec!(1.5));
        assert_eq!(green.color(), BarColor::Green);

        let red = bar(dec!(100), dec!(100.25), dec!(98), dec!(98.5));
        assert_eq!(red.color(), BarColor::Red);

        let doji = bar(dec!(100), dec!(101), dec!(99), dec!(100));
        assert_eq!(doji.color(), BarColor::Doji);
        assert_eq!(doji.body(), Decimal::ZERO);
    }

    #[test]
    fn weighted_price_counts_close_twice() {
        let b = bar(dec!(10), dec!(12), dec!(8), dec!(11));
        // (12 + 8 + 22) / 4
        assert_eq!(b.weighted(), dec!(10.5));
    }

    #[test]
    fn validate_rejects_inverted_bar() {
        assert!(bar(dec!(10), dec!(9), dec!(8), dec!(9)).validate().is_err());
        assert!(bar(dec!(10), dec!(11), dec!(8), dec!(9)).validate().is_ok());
    }

    #[test]
    fn intent_routes_entry_price_by_order_type() {
        let bracket = Bracket {
            side: OrderSide::Sell,
            entry_price: dec!(104.5),
            target_offset_ticks: dec!(12),
            stop_offset_ticks: dec!(8),
        };
        let limit = Signal::bracketed(3, OrderType::Limit, &bracket);
        let intent = OrderIntent::from_signal(Uuid::nil(), "ES", "SIM", dec!(1), &limit);
        assert_eq!(intent.price, Some(dec!(104.5)));
        assert_eq!(intent.trigger_price, None);

        let stop = Signal::bracketed(3, OrderType::Stop, &bracket);
        let intent = OrderIntent::from_signal(Uuid::nil(), "ES", "SIM", dec!(1), &stop);
        assert_eq!(intent.price, None);
        assert_eq!(intent.trigger_price, Some(dec!(104.5)));
        assert_eq!(intent.take_profit_ticks, Some(dec!(12)));
    }
}
