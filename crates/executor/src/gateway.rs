use crate::error::ExecutorError;
use async_trait::async_trait;
use core_types::OrderIntent;
use events::SubmissionResult;

/// A generic trait for the order route of one strategy instance.
///
/// Implementations answer a submission immediately with accept or reject. An
/// `Err` means the gateway could not be reached or the intent could not be
/// expressed at all; the caller treats it like a rejection.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    async fn submit(&self, intent: &OrderIntent) -> Result<SubmissionResult, ExecutorError>;

    /// Cancels every working order for the symbol/account pair and returns how many were cancelled.
    async fn cancel_working_orders(&self, symbol: &str, account: &str) -> Result<usize, ExecutorError>;
}
