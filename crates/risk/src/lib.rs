//! # Rangebot Risk Crate
//!
//! Admission control for a single strategy instance. The `OrderGuard` decides
//! whether a strategy's signal may become an order and reconciles its view of
//! the instance with the platform's asynchronous notifications.
//!
//! ## Public API
//!
//! - `OrderGuard`: the per-instance state machine.
//! - `OrderGuardState`, `SideState`: the state it reports.
//! - `Suppression`: why an entry was held back.
//! - `GuardAction`, `SubmissionOutcome`: what reconciliation asks of the engine.

pub mod error;
pub mod guard;

pub use error::{RiskError, Suppression};
pub use guard::{GuardAction, OrderGuard, OrderGuardState, SideState, SubmissionOutcome};
