//! Jupiter Swap Types
//!
//! Request and response structures for the Jupiter swap API.
//! The response carries an unsigned versioned transaction, base64 + bincode.

use base64::Engine;
use serde::{Deserialize, Serialize};
use solana_sdk::transaction::VersionedTransaction;

use super::client::JupiterError;

/// Request parameters for building a swap transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    /// User's public key (wallet address)
    pub user_public_key: String,
    /// The full quote response from /quote, echoed back unchanged
    pub quote_response: serde_json::Value,
    /// Prioritization fee in lamports for faster inclusion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prioritization_fee_lamports: Option<u64>,
    /// Whether to use dynamic compute unit limit calculation
    #[serde(default = "default_true")]
    pub dynamic_compute_unit_limit: bool,
    #[serde(default = "default_true")]
    pub wrap_and_unwrap_sol: bool,
}

fn default_true() -> bool {
    true
}

impl SwapRequest {
    pub fn new(user_public_key: String, quote_response: serde_json::Value) -> Self {
        Self {
            user_public_key,
            quote_response,
            prioritization_fee_lamports: None,
            dynamic_compute_unit_limit: true,
            wrap_and_unwrap_sol: true,
        }
    }

    /// Set prioritization fee for faster transaction inclusion. Zero means none.
    pub fn with_priority_fee(mut self, lamports: u64) -> Self {
        self.prioritization_fee_lamports = (lamports > 0).then_some(lamports);
        self
    }

    pub fn with_dynamic_compute_limit(mut self, enabled: bool) -> Self {
        self.dynamic_compute_unit_limit = enabled;
        self
    }
}

/// Response from Jupiter swap API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapResponse {
    /// Base64 encoded serialized transaction ready to sign and send
    pub swap_transaction: String,
    /// Last valid block height for this transaction
    pub last_valid_block_height: u64,
    /// Prioritization fee applied (in lamports)
    #[serde(default)]
    pub prioritization_fee_lamports: u64,
}

impl SwapResponse {
    /// Get the transaction bytes from base64
    pub fn transaction_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        base64::engine::general_purpose::STANDARD.decode(&self.swap_transaction)
    }

    /// Decode the unsigned transaction. Its message is what the wallet signs.
    pub fn decode_transaction(&self) -> Result<VersionedTransaction, JupiterError> {
        let bytes = self
            .transaction_bytes()
            .map_err(|e| JupiterError::Decode(format!("base64: {}", e)))?;
        bincode::deserialize(&bytes).map_err(|e| JupiterError::Decode(format!("transaction: {}", e)))
    }
}
