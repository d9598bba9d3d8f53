use crate::error::ExecutorError;
use crate::gateway::OrderGateway;
use async_trait::async_trait;
use core_types::OrderIntent;
use events::SubmissionResult;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct Book {
    next_order_id: u64,
    reject_next: Option<String>,
    submitted: Vec<OrderIntent>,
    working: Vec<(String, OrderIntent)>,
}

/// The "virtual venue" for replays and tests.
///
/// Every intent is accepted with a sequential order id and kept as working
/// until it is cancelled, unless a rejection has been armed with
/// `reject_next`. Nothing is ever filled.
#[derive(Debug, Default)]
pub struct PaperGateway {
    book: Mutex<Book>,
}

impl PaperGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next submission come back rejected with `reason`.
    pub async fn reject_next(&self, reason: impl Into<String>) {
        self.book.lock().await.reject_next = Some(reason.into());
    }

    /// Every intent received so far, accepted or not.
    pub async fn submitted(&self) -> Vec<OrderIntent> {
        self.book.lock().await.submitted.clone()
    }

    /// Order ids currently working.
    pub async fn working(&self) -> Vec<String> {
        self.book.lock().await.working.iter().map(|(id, _)| id.clone()).collect()
    }
}

#[async_trait]
impl OrderGateway for PaperGateway {
    async fn submit(&self, intent: &OrderIntent) -> Result<SubmissionResult, ExecutorError> {
        if intent.quantity <= Decimal::ZERO {
            return Err(ExecutorError::InvalidOrder(format!(
                "quantity must be positive, got {}",
                intent.quantity
            )));
        }

        let mut book = self.book.lock().await;
        book.submitted.push(intent.clone());

        if let Some(reason) = book.reject_next.take() {
            tracing::debug!(client_order_id = %intent.client_order_id, %reason, "paper order rejected");
            return Ok(SubmissionResult::Rejected { reason });
        }

        book.next_order_id += 1;
        let order_id = format!("paper-{}", book.next_order_id);
        book.working.push((order_id.clone(), intent.clone()));
        tracing::debug!(
            client_order_id = %intent.client_order_id,
            %order_id,
            side = %intent.side,
            "paper order accepted"
        );
        Ok(SubmissionResult::Accepted { order_id })
    }

    async fn cancel_working_orders(&self, symbol: &str, account: &str) -> Result<usize, ExecutorError> {
        let mut book = self.book.lock().await;
        let before = book.working.len();
        book.working
            .retain(|(_, intent)| intent.symbol != symbol || intent.account != account);
        let cancelled = before - book.working.len();
        tracing::debug!(%symbol, %account, cancelled, "paper orders cancelled");
        Ok(cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{OrderSide, Signal};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn intent(symbol: &str, quantity: Decimal) -> OrderIntent {
        let signal = Signal::market(1, OrderSide::Buy);
        OrderIntent::from_signal(Uuid::new_v4(), symbol, "SIM", quantity, &signal)
    }

    #[tokio::test]
    async fn accepts_with_sequential_ids() {
        let gateway = PaperGateway::new();
        let first = gateway.submit(&intent("ES", dec!(1))).await.unwrap();
        let second = gateway.submit(&intent("ES", dec!(1))).await.unwrap();
        assert_eq!(first, SubmissionResult::Accepted { order_id: "paper-1".to_string() });
        assert_eq!(second, SubmissionResult::Accepted { order_id: "paper-2".to_string() });
        assert_eq!(gateway.working().await.len(), 2);
    }

    #[tokio::test]
    async fn armed_rejection_applies_once() {
        let gateway = PaperGateway::new();
        gateway.reject_next("margin").await;
        let result = gateway.submit(&intent("ES", dec!(1))).await.unwrap();
        assert_eq!(result, SubmissionResult::Rejected { reason: "margin".to_string() });
        assert!(gateway.working().await.is_empty());

        let result = gateway.submit(&intent("ES", dec!(1))).await.unwrap();
        assert!(matches!(result, SubmissionResult::Accepted { .. }));
        assert_eq!(gateway.submitted().await.len(), 2);
    }

    #[tokio::test]
    async fn cancel_only_touches_matching_symbol() {
        let gateway = PaperGateway::new();
        gateway.submit(&intent("ES", dec!(1))).await.unwrap();
        gateway.submit(&intent("NQ", dec!(1))).await.unwrap();
        assert_eq!(gateway.cancel_working_orders("ES", "SIM").await.unwrap(), 1);
        assert_eq!(gateway.working().await, vec!["paper-2".to_string()]);
    }

    #[tokio::test]
    async fn zero_quantity_is_a_transport_error() {
        let gateway = PaperGateway::new();
        assert!(gateway.submit(&intent("ES", Decimal::ZERO)).await.is_err());
    }
}
