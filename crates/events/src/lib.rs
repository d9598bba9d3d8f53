//! # Rangebot Events
//!
//! This crate defines the event vocabulary spoken between a strategy engine and
//! its host: everything the host delivers (`EngineEvent`) and everything the
//! engine asks the host to do (`Effect`).
//!
//! As a Layer 0 crate, it depends only on `core-types`. All types are serde
//! (de)serializable so a session can be recorded and replayed verbatim.

// Declare the modules that make up this crate.
pub mod error;
pub mod messages;

// Re-export the core types to provide a clean public API.
pub use error::EventsError;
pub use messages::{Effect, EngineEvent, LifecycleEvent, SubmissionResult};
