use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    signature::Signature,
    transaction::VersionedTransaction,
};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SolanaClientError {
    /// Could not reach the RPC node
    #[error("RPC unreachable: {0}")]
    Network(String),
    /// Node answered but refused the request or transaction
    #[error("RPC rejected request: {0}")]
    Rejected(String),
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("Task join error: {0}")]
    Join(String),
}

impl From<ClientError> for SolanaClientError {
    fn from(err: ClientError) -> Self {
        match err.kind() {
            ClientErrorKind::Io(_) | ClientErrorKind::Reqwest(_) => {
                SolanaClientError::Network(err.to_string())
            }
            _ => SolanaClientError::Rejected(err.to_string()),
        }
    }
}

/// Wrapper around Solana RPC client with async-compatible methods
#[derive(Clone)]
pub struct SolanaClient {
    client: Arc<RpcClient>,
}

impl SolanaClient {
    /// Create a new Solana RPC client. Unknown commitment strings fall back to `confirmed`.
    pub fn new(rpc_url: String, commitment: &str) -> Self {
        let commitment = CommitmentConfig::from_str(commitment).unwrap_or_else(|_| {
            tracing::warn!("unknown commitment '{}', using confirmed", commitment);
            CommitmentConfig::confirmed()
        });
        let client = Arc::new(RpcClient::new_with_commitment(rpc_url, commitment));
        Self { client }
    }

    pub fn url(&self) -> String {
        self.client.url()
    }

    /// Get SOL balance (lamports) for a public key
    pub async fn get_balance(&self, pubkey: &str) -> Result<u64, SolanaClientError> {
        let pubkey = solana_sdk::pubkey::Pubkey::from_str(pubkey)
            .map_err(|e| SolanaClientError::InvalidPublicKey(e.to_string()))?;

        // Spawn blocking to make sync RPC call async-compatible
        let client = Arc::clone(&self.client);
        tokio::task::spawn_blocking(move || client.get_balance(&pubkey).map_err(SolanaClientError::from))
            .await
            .map_err(|e| SolanaClientError::Join(e.to_string()))?
    }

    /// Broadcast a signed transaction without preflight simulation. Returns as
    /// soon as the node accepts it; landing is observed through later balance reads.
    pub async fn send_versioned_transaction(
        &self,
        transaction: VersionedTransaction,
    ) -> Result<Signature, SolanaClientError> {
        let client = Arc::clone(&self.client);
        let config = RpcSendTransactionConfig {
            skip_preflight: true,
            ..RpcSendTransactionConfig::default()
        };

        tokio::task::spawn_blocking(move || {
            client
                .send_transaction_with_config(&transaction, config)
                .map_err(SolanaClientError::from)
        })
        .await
        .map_err(|e| SolanaClientError::Join(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_creation() {
        let client = SolanaClient::new("https://api.devnet.solana.com".to_string(), "finalized");
        assert_eq!(client.url(), "https://api.devnet.solana.com");
    }

    #[tokio::test]
    async fn test_unknown_commitment_falls_back() {
        let client = SolanaClient::new("https://api.devnet.solana.com".to_string(), "whenever");
        assert_eq!(client.url(), "https://api.devnet.solana.com");
    }

    #[tokio::test]
    async fn test_invalid_pubkey() {
        let client = SolanaClient::new("http://127.0.0.1:1".to_string(), "confirmed");
        let result = client.get_balance("not-a-pubkey").await;
        assert!(matches!(result, Err(SolanaClientError::InvalidPublicKey(_))));
    }

    #[test]
    fn test_error_classification() {
        let io = ClientError::from(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"));
        assert!(matches!(SolanaClientError::from(io), SolanaClientError::Network(_)));

        let custom = ClientError::from(ClientErrorKind::Custom("blockhash not found".to_string()));
        assert!(matches!(SolanaClientError::from(custom), SolanaClientError::Rejected(_)));
    }
}
