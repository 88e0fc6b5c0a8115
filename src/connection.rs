// Ledger connection over JSON-RPC
//
// Thin channel to a ledger cluster endpoint. Every read and confirmation is
// made at the configured commitment level. It handles:
// - Account reads (base64 encoded)
// - Recent blockhash lookup
// - Transaction submission with preflight
// - Bounded confirmation polling

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::{Commitment, PortalConfig};
use crate::{Address, PortalError};

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl RpcErrorObject {
    /// Message plus any simulation logs the node attached
    fn describe(&self) -> String {
        let logs: Vec<&str> = self
            .data
            .as_ref()
            .and_then(|d| d.get("logs"))
            .and_then(Value::as_array)
            .map(|logs| logs.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        if logs.is_empty() {
            format!("RPC error {}: {}", self.code, self.message)
        } else {
            format!("RPC error {}: {} [{}]", self.code, self.message, logs.join("; "))
        }
    }
}

/// Status of a submitted transaction as reported by the cluster
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureStatus {
    /// "processed", "confirmed" or "finalized"
    pub confirmation_status: Option<String>,
    /// Program error, if the transaction failed on-chain
    pub err: Option<String>,
}

/// Connection to a ledger cluster
///
/// Constructed once at startup and shared through the portal context.
/// `reqwest::Client` is internally Arc-based, so this is cheap to share.
pub struct LedgerConnection {
    rpc_url: String,
    commitment: Commitment,
    http_client: reqwest::Client,
    next_id: AtomicU64,
}

impl LedgerConnection {
    pub fn new(rpc_url: impl Into<String>, commitment: Commitment) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            commitment,
            http_client: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn from_config(config: &PortalConfig) -> Self {
        Self::new(config.rpc_url.clone(), config.commitment)
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    pub fn commitment(&self) -> Commitment {
        self.commitment
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, PortalError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        log::debug!("   ➡️  RPC {} (id {})", method, request.id);

        let response = self
            .http_client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                log::error!("   ❌ HTTP request failed: {}", e);
                PortalError::network(format!("{} request failed: {}", method, e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            log::error!("   ❌ HTTP error: {}", status);
            return Err(PortalError::network(format!("{} returned HTTP {}", method, status)));
        }

        let body: RpcResponse = response.json().await.map_err(|e| {
            log::error!("   ❌ JSON parse failed: {}", e);
            PortalError::network(format!("{} returned invalid JSON: {}", method, e))
        })?;

        if let Some(error) = body.error {
            let description = error.describe();
            log::warn!("   ⚠️  {} failed: {}", method, description);
            return Err(PortalError::network(description));
        }

        body.result
            .ok_or_else(|| PortalError::network(format!("{} returned no result", method)))
    }

    /// Raw account bytes, or `None` if no account exists at `address`
    pub async fn get_account_data(&self, address: &Address) -> Result<Option<Vec<u8>>, PortalError> {
        let result = self
            .call(
                "getAccountInfo",
                json!([
                    address.to_string(),
                    { "encoding": "base64", "commitment": self.commitment.as_str() }
                ]),
            )
            .await?;

        let value = &result["value"];
        if value.is_null() {
            return Ok(None);
        }

        // data is ["<base64>", "base64"]
        let encoded = value["data"][0].as_str().ok_or_else(|| {
            PortalError::network(format!("getAccountInfo: missing data for {}", address))
        })?;
        let data = STANDARD
            .decode(encoded)
            .map_err(|e| PortalError::network(format!("getAccountInfo: bad base64: {}", e)))?;
        Ok(Some(data))
    }

    pub async fn get_latest_blockhash(&self) -> Result<[u8; 32], PortalError> {
        let result = self
            .call(
                "getLatestBlockhash",
                json!([{ "commitment": self.commitment.as_str() }]),
            )
            .await?;

        let blockhash = result["value"]["blockhash"].as_str().ok_or_else(|| {
            PortalError::network("getLatestBlockhash: missing blockhash".to_string())
        })?;
        let bytes = bs58::decode(blockhash)
            .into_vec()
            .map_err(|e| PortalError::network(format!("invalid blockhash: {}", e)))?;
        bytes
            .try_into()
            .map_err(|_| PortalError::network("invalid blockhash length".to_string()))
    }

    /// Submit a signed transaction; returns its base58 signature
    pub async fn send_transaction(&self, wire_transaction: &[u8]) -> Result<String, PortalError> {
        let result = self
            .call(
                "sendTransaction",
                json!([
                    STANDARD.encode(wire_transaction),
                    {
                        "encoding": "base64",
                        "preflightCommitment": self.commitment.as_str(),
                    }
                ]),
            )
            .await?;

        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| PortalError::network("sendTransaction: signature not a string".to_string()))
    }

    pub async fn get_signature_status(
        &self,
        signature: &str,
    ) -> Result<Option<SignatureStatus>, PortalError> {
        let result = self
            .call("getSignatureStatuses", json!([[signature]]))
            .await?;

        let status = &result["value"][0];
        if status.is_null() {
            return Ok(None);
        }
        Ok(Some(SignatureStatus {
            confirmation_status: status["confirmationStatus"].as_str().map(str::to_string),
            err: match &status["err"] {
                Value::Null => None,
                err => Some(err.to_string()),
            },
        }))
    }

    /// Poll until `signature` reaches the configured commitment
    ///
    /// Gives up with `Timeout` after `max_attempts` polls.
    pub async fn confirm_transaction(
        &self,
        signature: &str,
        poll_interval: Duration,
        max_attempts: u32,
    ) -> Result<(), PortalError> {
        for attempt in 1..=max_attempts {
            if let Some(status) = self.get_signature_status(signature).await? {
                if let Some(err) = status.err {
                    log::error!("   ❌ Transaction {} failed: {}", signature, err);
                    return Err(PortalError::transaction_failed(signature, err));
                }
                if let Some(reached) = status.confirmation_status.as_deref() {
                    if self.commitment.is_satisfied_by(reached) {
                        log::debug!("   ✅ {} reached '{}' after {} polls", signature, reached, attempt);
                        return Ok(());
                    }
                }
            }
            tokio::time::sleep(poll_interval).await;
        }

        Err(PortalError::Timeout(format!(
            "transaction {} did not reach '{}' commitment",
            signature, self.commitment
        )))
    }
}
