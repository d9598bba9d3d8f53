use crate::error::EventsError;
use core_types::{Bar, Fill, OrderIntent, OrderSide};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order and position notifications from the trading platform, already
/// filtered to the instance's symbol and account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LifecycleEvent {
    PositionOpened { side: OrderSide, quantity: Decimal },
    PositionClosed { side: OrderSide },
    /// No position is left for the symbol/account pair.
    PositionsFlat,
    /// The platform refused an order after it had been accepted for routing.
    OrderRefused { reason: String },
    TradeFilled(Fill),
}

/// Immediate answer of the order gateway to a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionResult {
    Accepted { order_id: String },
    Rejected { reason: String },
}

/// Everything the host can deliver to a strategy engine.
///
/// The `#[serde(tag = "type", content = "payload")]` attribute keeps recorded
/// sessions readable, one event per line:
/// `{"type":"BarUpdate","payload":{"index":12,"open":"100","high":"101","low":"99.5","close":"100.75"}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum EngineEvent {
    /// The still-forming bar ticked.
    BarUpdate(Bar),
    /// A bar completed; carries the completed bar.
    NewBar(Bar),
    Lifecycle(LifecycleEvent),
    /// Result of a submission the engine previously asked for.
    Submission {
        client_order_id: Uuid,
        side: OrderSide,
        result: SubmissionResult,
    },
    /// The host is shutting the instance down.
    Stop { reason: String },
}

impl EngineEvent {
    /// Decodes one line of a recorded session. `line` is 1-based and only used in errors.
    pub fn from_json_line(line: usize, text: &str) -> Result<Self, EventsError> {
        serde_json::from_str(text).map_err(|source| EventsError::Decode { line, source })
    }

    pub fn to_json_line(&self) -> Result<String, EventsError> {
        serde_json::to_string(self).map_err(|e| EventsError::Serialization(e.to_string()))
    }
}

/// Work the engine hands back to its host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Effect {
    SubmitOrder(OrderIntent),
    CancelWorkingOrders { symbol: String, account: String },
    StopStrategy { reason: String },
}
