//! Jupiter Swap Submitter
//!
//! One submission = quote -> build swap -> sign -> broadcast (skip preflight).
//! The whole attempt is bounded by `submit_timeout`. Returning a signature only
//! means the RPC node accepted the transaction.

use async_trait::async_trait;

use crate::adapters::solana::{SolanaClient, SolanaClientError, WalletManager};
use crate::domain::{short_mint, OrderAttempt};
use crate::ports::{SubmissionError, SwapSubmitter, TransactionId};

use super::client::{JupiterClient, JupiterError};
use super::quote::{QuoteRequest, QuoteResponse};
use super::swap::SwapRequest;

#[derive(Clone)]
pub struct JupiterSwapSubmitter {
    client: JupiterClient,
    rpc: SolanaClient,
    wallet: WalletManager,
}

impl JupiterSwapSubmitter {
    pub fn new(client: JupiterClient, rpc: SolanaClient, wallet: WalletManager) -> Self {
        Self { client, rpc, wallet }
    }

    /// Quote request for an order, in base units
    pub fn quote_request(&self, order: &OrderAttempt) -> Result<QuoteRequest, SubmissionError> {
        let config = self.client.config();
        QuoteRequest::for_order(order, &config.quote_mint, config.asset_decimals, config.quote_decimals)
            .ok_or_else(|| {
                SubmissionError::QuoteFailed(format!(
                    "{} ${:.4} @ {} is below one base unit",
                    order.direction, order.notional_usd, order.reference_price
                ))
            })
    }

    /// Fetch a venue quote for an order without submitting anything
    pub async fn quote(&self, order: &OrderAttempt) -> Result<QuoteResponse, SubmissionError> {
        let request = self.quote_request(order)?;
        self.client.get_quote(&request).await.map_err(quote_error)
    }

    async fn submit_once(&self, order: &OrderAttempt) -> Result<TransactionId, SubmissionError> {
        let quote = self.quote(order).await?;
        tracing::debug!(
            "quote {} in={} out={} impact={}% route={}",
            short_mint(&order.asset),
            quote.in_amount,
            quote.out_amount,
            quote.price_impact_pct,
            quote.route_labels()
        );

        let quote_json = serde_json::to_value(&quote)
            .map_err(|e| SubmissionError::BuildFailed(format!("quote encoding: {}", e)))?;
        let request = SwapRequest::new(self.wallet.public_key(), quote_json)
            .with_priority_fee(order.priority_fee_lamports)
            .with_dynamic_compute_limit(self.client.config().dynamic_compute_units);

        let swap = self.client.get_swap_transaction(&request).await.map_err(build_error)?;
        let unsigned = swap.decode_transaction().map_err(build_error)?;
        let signed = self
            .wallet
            .sign_versioned(unsigned.message)
            .map_err(|e| SubmissionError::BuildFailed(e.to_string()))?;

        let signature = self.rpc.send_versioned_transaction(signed).await.map_err(send_error)?;
        Ok(TransactionId(signature.to_string()))
    }
}

#[async_trait]
impl SwapSubmitter for JupiterSwapSubmitter {
    async fn submit(&self, order: &OrderAttempt) -> Result<TransactionId, SubmissionError> {
        let limit = self.client.config().submit_timeout;
        match tokio::time::timeout(limit, self.submit_once(order)).await {
            Ok(result) => result,
            Err(_) => Err(SubmissionError::NetworkError(format!(
                "submission timed out after {:?}",
                limit
            ))),
        }
    }
}

fn quote_error(e: JupiterError) -> SubmissionError {
    if e.is_transient() {
        SubmissionError::NetworkError(e.to_string())
    } else {
        SubmissionError::QuoteFailed(e.to_string())
    }
}

fn build_error(e: JupiterError) -> SubmissionError {
    if e.is_transient() {
        SubmissionError::NetworkError(e.to_string())
    } else {
        SubmissionError::BuildFailed(e.to_string())
    }
}

fn send_error(e: SolanaClientError) -> SubmissionError {
    match e {
        SolanaClientError::Network(_) | SolanaClientError::Join(_) => {
            SubmissionError::NetworkError(e.to_string())
        }
        SolanaClientError::Rejected(_) | SolanaClientError::InvalidPublicKey(_) => {
            SubmissionError::RejectedByVenue(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::jupiter::JupiterConfig;
    use crate::domain::Direction;
    use std::time::Duration;

    fn unreachable_submitter() -> JupiterSwapSubmitter {
        let client = JupiterClient::new(JupiterConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout: Duration::from_secs(2),
            submit_timeout: Duration::from_secs(5),
            ..JupiterConfig::default()
        })
        .unwrap();
        let rpc = SolanaClient::new("http://127.0.0.1:1".to_string(), "confirmed");
        JupiterSwapSubmitter::new(client, rpc, WalletManager::new_random())
    }

    fn order(direction: Direction, notional_usd: f64) -> OrderAttempt {
        OrderAttempt {
            direction,
            asset: "9BB6NFEcjBCtnNLFko2FqVQBq8HHM13kCyYcdQbgpump".to_string(),
            notional_usd,
            slippage_bps: 199,
            priority_fee_lamports: 100_000,
            reference_price: 0.05,
        }
    }

    #[test]
    fn test_quote_request_uses_configured_decimals() {
        let submitter = unreachable_submitter();
        let request = submitter.quote_request(&order(Direction::Sell, 1.0)).unwrap();
        // $1 at $0.05 = 20 tokens, 6 decimals
        assert_eq!(request.amount, 20_000_000);
    }

    #[test]
    fn test_dust_order_is_quote_failure() {
        let submitter = unreachable_submitter();
        let result = submitter.quote_request(&order(Direction::Buy, 0.0000001));
        assert!(matches!(result, Err(SubmissionError::QuoteFailed(_))));
    }

    #[tokio::test]
    async fn test_unreachable_venue_is_network_error() {
        let submitter = unreachable_submitter();
        let result = submitter.submit(&order(Direction::Buy, 1.0)).await;
        assert!(matches!(result, Err(SubmissionError::NetworkError(_))));
    }

    #[test]
    fn test_error_mapping() {
        assert!(matches!(quote_error(JupiterError::Timeout), SubmissionError::NetworkError(_)));
        assert!(matches!(
            quote_error(JupiterError::Api { status: 400, body: "No routes found".to_string() }),
            SubmissionError::QuoteFailed(_)
        ));
        assert!(matches!(
            build_error(JupiterError::Decode("bad".to_string())),
            SubmissionError::BuildFailed(_)
        ));
        assert!(matches!(
            send_error(SolanaClientError::Rejected("blockhash not found".to_string())),
            SubmissionError::RejectedByVenue(_)
        ));
        assert!(matches!(
            send_error(SolanaClientError::Network("connection refused".to_string())),
            SubmissionError::NetworkError(_)
        ));
    }
}
