use thiserror::Error;

/// Transport-level failures. A refusal by the venue is not an error; it comes
/// back as `SubmissionResult::Rejected`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutorError {
    #[error("Order is malformed: {0}")]
    InvalidOrder(String),

    #[error("API error: {0}")]
    Api(String),
}
