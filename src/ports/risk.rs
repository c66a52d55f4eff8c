use async_trait::async_trait;
use thiserror::Error;

use crate::domain::TokenOverview;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RiskError {
    #[error("Overview request failed: {0}")]
    Request(String),
    #[error("Overview payload malformed: {0}")]
    Malformed(String),
}

/// Optional read-only overview provider. Advisory only.
#[async_trait]
pub trait RiskPort: Send + Sync {
    async fn token_overview(&self, asset: &str) -> Result<TokenOverview, RiskError>;
}
