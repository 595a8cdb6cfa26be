//! # attestindex-core
//!
//! Record types, output schema versions, error taxonomy, and run
//! configuration shared across all AttestIndex crates. The decoders, sources,
//! sink, and pipeline are built on top of the types defined here.

pub mod config;
pub mod error;
pub mod record;
pub mod schema;

pub use config::IndexerConfig;
pub use error::{DecodeError, SinkError, SourceError};
pub use record::{Attestation, TransactionRef};
pub use schema::SinkSchema;
