//! Runtime configuration for an indexing run.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::schema::SinkSchema;

/// Settings for one indexing run.
///
/// Constructed once at startup and passed explicitly into sources, pipeline,
/// and sink. Nothing below this struct reads the process environment; the
/// binary resolves env fallbacks before building it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Explorer API base URL (historical mode).
    pub explorer_url: String,
    /// Explorer API key, if the endpoint requires one.
    #[serde(default)]
    pub explorer_api_key: Option<String>,
    /// JSON-RPC HTTP endpoint.
    pub rpc_http_url: String,
    /// JSON-RPC WebSocket endpoint (live mode).
    #[serde(default)]
    pub rpc_ws_url: Option<String>,
    /// Attestation registry contract address (`0x…`).
    pub contract: String,
    /// Restrict the explorer fetch to blocks at or after this number.
    #[serde(default)]
    pub start_block: Option<u64>,
    /// Restrict the explorer fetch to blocks at or before this number.
    #[serde(default)]
    pub end_block: Option<u64>,
    /// Path of the structured (JSONL) artifact.
    #[serde(default = "default_jsonl_path")]
    pub jsonl_path: PathBuf,
    /// Path of the tabular (CSV) artifact.
    #[serde(default = "default_csv_path")]
    pub csv_path: PathBuf,
    /// Output schema version, applied to both artifacts.
    #[serde(default)]
    pub sink_schema: SinkSchema,
    /// Number of decode workers draining the transaction queue.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Capacity of the bounded transaction queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_jsonl_path() -> PathBuf {
    PathBuf::from("attestations.jsonl")
}
fn default_csv_path() -> PathBuf {
    PathBuf::from("attestations.csv")
}
fn default_workers() -> usize {
    4
}
fn default_queue_capacity() -> usize {
    1_024
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            explorer_url: String::new(),
            explorer_api_key: None,
            rpc_http_url: String::new(),
            rpc_ws_url: None,
            contract: String::new(),
            start_block: None,
            end_block: None,
            jsonl_path: default_jsonl_path(),
            csv_path: default_csv_path(),
            sink_schema: SinkSchema::default(),
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_bounded_and_versioned() {
        let cfg = IndexerConfig::default();
        assert!(cfg.workers > 0);
        assert!(cfg.queue_capacity > 0);
        assert_eq!(cfg.sink_schema, SinkSchema::RawFields);
    }

    #[test]
    fn deserializes_with_partial_fields() {
        let cfg: IndexerConfig = serde_json::from_str(
            r#"{
                "explorer_url": "https://api.example.io/api",
                "rpc_http_url": "https://rpc.example.io",
                "contract": "0x4d3a380A03f3a18A5dC44b01435b1f0c3cd6AD2b"
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.workers, 4);
        assert_eq!(cfg.queue_capacity, 1_024);
        assert!(cfg.rpc_ws_url.is_none());
    }
}
