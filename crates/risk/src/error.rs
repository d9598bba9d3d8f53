use core_types::OrderSide;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RiskError {
    #[error("Risk parameters from configuration are invalid: {0}")]
    InvalidParameters(String),
}

/// Why an entry was not admitted. None of these is a failure of the instance.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Suppression {
    #[error("the instance is halted")]
    Halted,

    #[error("an order on the {0} side is already in flight")]
    SideBusy(OrderSide),

    #[error("a position is still open")]
    NotFlat,

    #[error("trade count {count} reached the limit of {limit}")]
    MaxTrades { count: u32, limit: u32 },

    #[error("gross P&L {gross_pnl} reached the profit limit of {limit}")]
    MaxProfit { gross_pnl: Decimal, limit: Decimal },

    #[error("gross P&L {gross_pnl} reached the loss limit of -{limit}")]
    MaxLoss { gross_pnl: Decimal, limit: Decimal },
}
