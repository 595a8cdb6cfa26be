//! # attestindex-sink
//!
//! Durable sinks for assembled attestation records. The canonical backend is
//! [`FileSink`]: two parallel artifacts (a structured JSONL file and a
//! tabular CSV file), truncated at process start and append-only afterwards.
//! [`MemorySink`] backs tests and short-lived runs.

pub mod file;
pub mod memory;

use attestindex_core::{Attestation, SinkError};

/// Destination for assembled records.
///
/// Implementations are driven by a single writer task; append order is the
/// persisted order. Appends are whole records, never partial. Sinks do not
/// deduplicate: a transaction submitted twice lands twice, so callers keep
/// the two source modes from feeding the same run.
pub trait RecordSink: Send {
    /// Persist one record.
    fn append(&mut self, record: &Attestation) -> Result<(), SinkError>;
}

pub use file::FileSink;
pub use memory::MemorySink;
