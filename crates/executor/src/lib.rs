//! # Rangebot Executor Crate
//!
//! The outbound side of a strategy instance. It defines the `OrderGateway`
//! trait the engine's runner talks to and a `PaperGateway` that keeps orders
//! in memory for replays and tests.
//!
//! ## Architectural Principles
//!
//! - **Execution Abstraction:** The runner is agnostic about whether intents go to
//!   a simulated book or a live venue; both sit behind `OrderGateway`.
//! - **Immediate answer only:** `submit` returns accept/reject. Fills and position
//!   changes arrive later as lifecycle events through the inbound channel.
//!
//! ## Public API
//!
//! - `OrderGateway`: The core trait for order routing.
//! - `PaperGateway`: The in-memory implementation.
//! - `ExecutorError`: The specific error types that can be returned from this crate.

pub mod error;
pub mod gateway;
pub mod paper;

pub use error::ExecutorError;
pub use gateway::OrderGateway;
pub use paper::PaperGateway;
