//! # attestindex-pipeline
//!
//! The decode pipeline: transaction refs come in over a bounded queue, a
//! fixed pool of workers fetches and decodes them, and a single writer task
//! appends the resulting records to the sink. Sources close the queue to
//! stop a run; the pipeline drains what is queued before reporting its
//! counters.

pub mod engine;

pub use engine::{Pipeline, PipelineMetrics};
