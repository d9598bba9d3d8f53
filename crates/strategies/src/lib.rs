//! # Rangebot Strategy Library
//!
//! This crate contains the signal logic of the range-trading strategies. It
//! defines a universal `Strategy` trait, the building blocks the variants share
//! (range windows, signal evaluators, the bracket calculator) and the concrete
//! variants themselves.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** Strategies know nothing about orders in flight, positions or
//!   risk limits. They turn bars into `Signal`s; the `risk` crate decides whether a
//!   signal may become an order.
//! - **Strategy agnostic engine:** By using the `Strategy` trait, the `engine` can run
//!   any variant without knowing its internal details.
//! - **Extensibility:** Adding a variant means a new module implementing `Strategy`,
//!   a new `StrategyId`, a parameter block in `configuration`, and a `factory` arm.
//!
//! ## Public API
//!
//! - `Strategy`: The core trait all strategies implement.
//! - `create_strategy`: The factory function to construct a strategy instance.
//! - `RangeWindow`, `BarHistory`, `BracketCalculator`, `SignalState`: the shared pieces.
//! - The concrete strategy structs (`BoxRange`, `RangeScalp`, `Surge`, `SmaCross`).

pub mod box_range;
pub mod bracket;
pub mod error;
pub mod factory;
pub mod history;
pub mod range;
pub mod range_scalp;
pub mod signal;
pub mod sma_cross;
pub mod surge;

pub use box_range::BoxRange;
pub use bracket::BracketCalculator;
pub use error::StrategyError;
pub use factory::create_strategy;
pub use history::BarHistory;
pub use range::RangeWindow;
pub use range_scalp::RangeScalp;
pub use signal::{PermitLatch, SignalState};
pub use sma_cross::SmaCross;
pub use surge::{Surge, SurgeMeasure};

pub use core_types::StrategyId;

use core_types::{Bar, OrderSide, Signal};

/// The core trait that all trading strategies must implement.
///
/// The engine drives a strategy with two kinds of bar events. `on_bar_update`
/// is called on every tick of the still-forming bar and may return entry
/// signals; `on_bar_closed` is called once per completed bar, before the first
/// update of the next one.
///
/// The `Send + Sync` bounds allow an engine to be moved onto its own task.
pub trait Strategy: Send + Sync {
    fn id(&self) -> StrategyId;

    /// Evaluates the strategy on the forming bar.
    ///
    /// # Returns
    ///
    /// * `Ok(signals)` - at most one signal per side. Empty when no entry is warranted.
    /// * `Err(StrategyError)` - if an indicator could not be computed.
    fn on_bar_update(&mut self, bar: &Bar) -> Result<Vec<Signal>, StrategyError>;

    /// Records a completed bar. Replays of an already recorded bar are ignored.
    fn on_bar_closed(&mut self, bar: &Bar) -> Result<(), StrategyError>;

    /// Tells the strategy that an entry on `side` was accepted, so it can
    /// consume whatever latch produced it.
    fn on_order_accepted(&mut self, side: OrderSide);

    /// Signal flags as of the last update.
    fn signal_state(&self) -> SignalState;
}
