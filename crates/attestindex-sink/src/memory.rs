//! In-memory record sink.
//!
//! Collects records in RAM. Useful for tests and short-lived runs; clones
//! share the same buffer, so a test can keep one handle and give the
//! pipeline the other.

use std::sync::{Arc, Mutex};

use attestindex_core::{Attestation, SinkError};

use crate::RecordSink;

/// In-memory sink. All data is lost when the last handle drops.
#[derive(Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<Attestation>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything appended so far, in append order.
    pub fn records(&self) -> Vec<Attestation> {
        self.records.lock().unwrap().clone()
    }

    /// Number of records appended so far.
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordSink for MemorySink {
    fn append(&mut self, record: &Attestation) -> Result<(), SinkError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(block: u64) -> Attestation {
        Attestation {
            tx_hash: format!("0x{block:x}"),
            block_number: block,
            schema_id: "0x01".into(),
            subject: "0xAbCdEf0123456789AbCdEf0123456789AbCdEf01".into(),
            is_positive: true,
            article_page: "page-1".into(),
            submitter: "0x1111111111111111111111111111111111111111".into(),
            timestamp: 0,
        }
    }

    #[test]
    fn clones_share_the_buffer() {
        let sink = MemorySink::new();
        let mut handle = sink.clone();
        handle.append(&sample(1)).unwrap();
        handle.append(&sample(2)).unwrap();

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.records()[0].block_number, 1);
    }
}
