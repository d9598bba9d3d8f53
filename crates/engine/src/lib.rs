//! # Rangebot Engine
//!
//! Wires one strategy instance together: the `Strategy` chosen by the
//! configuration, the `OrderGuard` that owns per-side order state and session
//! limits, and the host that carries out orders.
//!
//! - `StrategyEngine` is a synchronous reducer. Every host callback becomes an
//!   `EngineEvent`; `handle` folds it into the instance state and returns the
//!   `Effect`s to carry out. It never touches the network.
//! - `StrategyRunner` owns an engine and an `OrderGateway`, consumes events from
//!   a single channel and executes the effects, feeding submission results back
//!   before the next event is read.

pub mod engine;
pub mod error;
pub mod runner;

pub use engine::StrategyEngine;
pub use error::EngineError;
pub use runner::{RunSummary, StrategyRunner};
