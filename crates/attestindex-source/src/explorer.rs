//! Historical transaction listing via an Etherscan-compatible explorer.
//!
//! One bulk `module=account&action=txlist` GET returns every transaction
//! that ever touched an address, newest window capped by the explorer. The
//! envelope is `{status, message, result}`: `status` is the string `"1"` on
//! success, and `result` is an array of transaction rows. On failure
//! statuses some explorers put a plain string in `result`, so the field is
//! held as a raw value until the status check passes.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use attestindex_core::{IndexerConfig, SourceError, TransactionRef};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Block range bounds used when the run configuration leaves them open.
const FIRST_BLOCK: &str = "0";
const LAST_BLOCK: &str = "99999999";

// ─── Wire types ──────────────────────────────────────────────────────────────

/// Response envelope used by Etherscan-compatible explorers.
#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    status: String,
    message: String,
    #[serde(default)]
    result: Value,
}

/// One row of an account transaction listing. Only the fields the indexer
/// reads are kept; serde drops the rest.
#[derive(Debug, Deserialize)]
struct ExplorerTx {
    hash: String,
    /// Empty string for contract-creation transactions.
    #[serde(default)]
    to: String,
    /// Decimal string, unlike the hex quantities JSON-RPC uses.
    #[serde(rename = "blockNumber")]
    block_number: String,
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Historical transaction source backed by an explorer's account API.
pub struct ExplorerClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    contract: String,
    start_block: Option<u64>,
    end_block: Option<u64>,
}

impl ExplorerClient {
    /// Build a client from the run configuration.
    pub fn new(config: &IndexerConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent("attestindex/0.1 (+https://github.com/attestindex/attestindex)")
            .build()
            .map_err(|e| SourceError::Http { reason: e.to_string() })?;

        Ok(Self {
            client,
            base_url: config.explorer_url.clone(),
            api_key: config.explorer_api_key.clone(),
            contract: config.contract.clone(),
            start_block: config.start_block,
            end_block: config.end_block,
        })
    }

    /// Fetch every transaction the explorer lists for the registry contract.
    ///
    /// Rows whose `to` does not match the contract (case-insensitive) are
    /// dropped here so the pipeline never sees outbound or unrelated
    /// transactions. Listing order is preserved.
    ///
    /// # Errors
    ///
    /// A transport failure or a `status` other than `"1"` fails the whole
    /// listing. There is no partial result.
    pub async fn fetch_contract_txs(&self) -> Result<Vec<TransactionRef>, SourceError> {
        let start = self
            .start_block
            .map_or_else(|| FIRST_BLOCK.to_string(), |b| b.to_string());
        let end = self
            .end_block
            .map_or_else(|| LAST_BLOCK.to_string(), |b| b.to_string());
        let api_key = self.api_key.as_deref().unwrap_or("");

        debug!(
            contract = %self.contract,
            start = %start,
            end = %end,
            "fetching explorer transaction listing"
        );

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("module", "account"),
                ("action", "txlist"),
                ("address", self.contract.as_str()),
                ("startblock", start.as_str()),
                ("endblock", end.as_str()),
                ("sort", "asc"),
                ("apikey", api_key),
            ])
            .send()
            .await
            .map_err(|e| SourceError::Http { reason: e.to_string() })?;

        let body: ExplorerResponse = resp
            .json()
            .await
            .map_err(|e| SourceError::Http { reason: e.to_string() })?;

        parse_listing(body, &self.contract)
    }
}

/// Turn an explorer envelope into transaction refs addressed to `contract`.
fn parse_listing(
    body: ExplorerResponse,
    contract: &str,
) -> Result<Vec<TransactionRef>, SourceError> {
    if body.status != "1" {
        return Err(SourceError::ExplorerStatus {
            status: body.status,
            message: body.message,
        });
    }

    let rows: Vec<ExplorerTx> = serde_json::from_value(body.result)
        .map_err(|e| SourceError::InvalidResponse {
            reason: format!("explorer result: {e}"),
        })?;

    let mut refs = Vec::with_capacity(rows.len());
    for row in rows {
        if !row.to.eq_ignore_ascii_case(contract) {
            continue;
        }
        match row.block_number.parse::<u64>() {
            Ok(block_number) => refs.push(TransactionRef::new(row.hash, block_number)),
            Err(_) => {
                warn!(
                    hash = %row.hash,
                    block_number = %row.block_number,
                    "skipping listing row with unparseable block number"
                );
            }
        }
    }

    debug!(matched = refs.len(), "explorer listing parsed");
    Ok(refs)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
