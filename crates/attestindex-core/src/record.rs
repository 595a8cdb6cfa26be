//! Record types shared across the indexing pipeline.

use serde::{Deserialize, Serialize};

// ─── TransactionRef ──────────────────────────────────────────────────────────

/// A pointer to a candidate transaction, produced by a source and consumed
/// exactly once by a decode worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRef {
    /// Transaction hash (`0x…`).
    pub hash: String,
    /// Number of the containing block.
    pub block_number: u64,
}

impl TransactionRef {
    pub fn new(hash: impl Into<String>, block_number: u64) -> Self {
        Self {
            hash: hash.into(),
            block_number,
        }
    }
}

// ─── Attestation ─────────────────────────────────────────────────────────────

/// One fully-decoded attestation, as handed to the sink.
///
/// Every field is normalized at assembly time: addresses are EIP-55
/// checksummed, `schema_id` is 0x-prefixed hex, `timestamp` is the Unix
/// timestamp of the containing block. Records are never mutated after
/// construction and each is appended exactly once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attestation {
    /// Hash of the transaction that carried the attest call (`0x…`).
    pub tx_hash: String,
    /// Number of the containing block.
    pub block_number: u64,
    /// Attestation schema identifier (`0x…`, 32 bytes).
    pub schema_id: String,
    /// Checksummed address the attestation is about.
    pub subject: String,
    /// Whether the attestation endorses the subject.
    pub is_positive: bool,
    /// Article page the attestation refers to.
    pub article_page: String,
    /// Checksummed address that submitted the attestation.
    pub submitter: String,
    /// Unix timestamp (seconds) of the containing block.
    pub timestamp: i64,
}

// ─── Tests ────────────────────────────────────────────────────────────────────
