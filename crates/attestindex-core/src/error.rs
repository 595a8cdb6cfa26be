//! Error types for the attestation indexing pipeline.
//!
//! Split by blast radius: [`DecodeError`] is per-transaction (log and skip),
//! [`SourceError`] aborts the current fetch cycle, [`SinkError`] stops the
//! run.

use thiserror::Error;

/// Errors while decoding a single transaction. Never fatal; the pipeline
/// logs the failure and moves on to the next transaction.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Calldata too short: {len} bytes")]
    CalldataTooShort { len: usize },

    #[error("Selector mismatch: got 0x{got}")]
    SelectorMismatch { got: String },

    #[error("ABI decode failed: {reason}")]
    AbiDecodeFailed { reason: String },

    #[error("Payload decode failed: {reason}")]
    PayloadDecodeFailed { reason: String },

    #[error("Subject must be 20 or 32 bytes, got {len}")]
    SubjectLength { len: usize },
}

/// Errors from a transaction source. Fatal to the current fetch cycle, but
/// not to records already written.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {reason}")]
    Http { reason: String },

    #[error("Explorer returned status {status}: {message}")]
    ExplorerStatus { status: String, message: String },

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid response: {reason}")]
    InvalidResponse { reason: String },

    #[error("Subscription failed: {reason}")]
    Subscription { reason: String },
}

/// Errors while persisting records. Fatal to the run; already-written
/// records stay intact because appends are whole lines.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
