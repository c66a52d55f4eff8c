use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::OrderAttempt;

/// Why a submission did not produce a transaction id
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubmissionError {
    #[error("Quote failed: {0}")]
    QuoteFailed(String),
    #[error("Swap build failed: {0}")]
    BuildFailed(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Rejected by venue: {0}")]
    RejectedByVenue(String),
}

/// Identifier of a transaction the venue accepted. Acceptance does not mean filled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub String);

impl TransactionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Explorer link for log lines
    pub fn explorer_url(&self) -> String {
        format!("https://solscan.io/tx/{}", self.0)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Quote-then-swap submission, atomic from the caller's side.
///
/// Implementations do not retry; retry policy belongs to the executor.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SwapSubmitter: Send + Sync {
    async fn submit(&self, order: &OrderAttempt) -> Result<TransactionId, SubmissionError>;
}
