//! JSON-RPC 2.0 provider client.
//!
//! Covers the three node calls the indexer needs: transaction lookup by
//! hash, block timestamp lookup, and block-with-transactions for the live
//! listener. Lookups sit behind [`TransactionFetcher`] so the pipeline can
//! be driven by a stub in tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use attestindex_core::{SourceError, TransactionRef};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

// ─── Wire types ──────────────────────────────────────────────────────────────

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Vec<Value>,
    pub id: u64,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params,
            id,
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

/// A JSON-RPC 2.0 response.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Extract the result payload, surfacing a node-side error if present.
    pub fn into_result(self) -> Result<Value, SourceError> {
        if let Some(err) = self.error {
            return Err(SourceError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}

// ─── Fetcher seam ────────────────────────────────────────────────────────────

/// The fields of `eth_getTransactionByHash` the decoder needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxData {
    /// Destination address; `None` for contract-creation transactions.
    pub to: Option<String>,
    /// Raw calldata.
    pub input: Vec<u8>,
}

/// Node lookups the decode pipeline depends on.
#[async_trait]
pub trait TransactionFetcher: Send + Sync {
    /// Fetch destination and calldata for a transaction.
    ///
    /// `Ok(None)` means the node does not know the hash.
    async fn transaction(&self, hash: &str) -> Result<Option<TxData>, SourceError>;

    /// On-chain timestamp of a block, in seconds since the epoch.
    async fn block_timestamp(&self, number: u64) -> Result<i64, SourceError>;
}

// ─── HTTP client ─────────────────────────────────────────────────────────────

/// HTTP JSON-RPC client with monotonically increasing request ids.
pub struct ProviderClient {
    client: Client,
    url: String,
    next_id: AtomicU64,
}

impl ProviderClient {
    pub fn new(url: impl Into<String>) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent("attestindex/0.1 (+https://github.com/attestindex/attestindex)")
            .build()
            .map_err(|e| SourceError::Http { reason: e.to_string() })?;

        Ok(Self {
            client,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, SourceError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(id, method, params);

        debug!(method, id, "JSON-RPC call");

        let resp = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SourceError::Http { reason: e.to_string() })?;

        let body: JsonRpcResponse = resp
            .json()
            .await
            .map_err(|e| SourceError::Http { reason: e.to_string() })?;

        body.into_result()
    }

    /// List the transactions of a block that are addressed to `contract`.
    ///
    /// Used by the live listener to resolve a new-head announcement into
    /// work items. Rows without a destination never match.
    pub async fn block_transactions(
        &self,
        number: u64,
        contract: &str,
    ) -> Result<Vec<TransactionRef>, SourceError> {
        let value = self
            .call(
                "eth_getBlockByNumber",
                vec![json!(format!("0x{number:x}")), json!(true)],
            )
            .await?;
        parse_block_transactions(&value, number, contract)
    }
}

#[async_trait]
impl TransactionFetcher for ProviderClient {
    async fn transaction(&self, hash: &str) -> Result<Option<TxData>, SourceError> {
        let value = self
            .call("eth_getTransactionByHash", vec![json!(hash)])
            .await?;
        parse_transaction(&value)
    }

    async fn block_timestamp(&self, number: u64) -> Result<i64, SourceError> {
        let value = self
            .call(
                "eth_getBlockByNumber",
                vec![json!(format!("0x{number:x}")), json!(false)],
            )
            .await?;
        parse_block_timestamp(&value, number)
    }
}

// ─── Response parsing ────────────────────────────────────────────────────────

/// Parse a `0x`-prefixed hex quantity.
pub fn parse_hex_u64(s: &str) -> Result<u64, SourceError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(digits, 16).map_err(|e| SourceError::InvalidResponse {
        reason: format!("hex quantity '{s}': {e}"),
    })
}

fn parse_transaction(value: &Value) -> Result<Option<TxData>, SourceError> {
    if value.is_null() {
        return Ok(None);
    }

    let input_hex = value
        .get("input")
        .and_then(Value::as_str)
        .ok_or_else(|| SourceError::InvalidResponse {
            reason: "transaction object without input field".to_string(),
        })?;
    let input = hex::decode(input_hex.strip_prefix("0x").unwrap_or(input_hex)).map_err(|e| {
        SourceError::InvalidResponse {
            reason: format!("transaction input: {e}"),
        }
    })?;

    let to = value.get("to").and_then(Value::as_str).map(String::from);

    Ok(Some(TxData { to, input }))
}

fn parse_block_timestamp(value: &Value, number: u64) -> Result<i64, SourceError> {
    if value.is_null() {
        return Err(SourceError::InvalidResponse {
            reason: format!("node does not know block {number}"),
        });
    }

    let timestamp_hex = value
        .get("timestamp")
        .and_then(Value::as_str)
        .ok_or_else(|| SourceError::InvalidResponse {
            reason: format!("block {number} without timestamp field"),
        })?;

    Ok(parse_hex_u64(timestamp_hex)? as i64)
}

fn parse_block_transactions(
    value: &Value,
    number: u64,
    contract: &str,
) -> Result<Vec<TransactionRef>, SourceError> {
    if value.is_null() {
        return Err(SourceError::InvalidResponse {
            reason: format!("node does not know block {number}"),
        });
    }

    let txs = value
        .get("transactions")
        .and_then(Value::as_array)
        .ok_or_else(|| SourceError::InvalidResponse {
            reason: format!("block {number} without transactions array"),
        })?;

    let mut refs = Vec::new();
    for tx in txs {
        let to = match tx.get("to").and_then(Value::as_str) {
            Some(to) => to,
            None => continue,
        };
        if !to.eq_ignore_ascii_case(contract) {
            continue;
        }
        match tx.get("hash").and_then(Value::as_str) {
            Some(hash) => refs.push(TransactionRef::new(hash.to_string(), number)),
            None => warn!(block = number, "block transaction without hash field"),
        }
    }

    Ok(refs)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
