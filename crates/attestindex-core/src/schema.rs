//! Output schema versions for the persisted artifacts.
//!
//! The sink's column/field set changed once in this system's history. Both
//! sets live here behind an explicit selector so a run states which one it
//! emits; exactly one version applies per run, to the tabular and the
//! structured artifact alike.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::record::Attestation;

// ─── SinkSchema ──────────────────────────────────────────────────────────────

/// Which column/field set the sink emits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SinkSchema {
    /// v1: the raw decoded fields. Canonical default.
    #[default]
    RawFields,
    /// v2: a feedback counter pair derived from the boolean, keyed by the
    /// submitting address.
    FeedbackCounters,
}

impl SinkSchema {
    /// Header row of the tabular artifact.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            SinkSchema::RawFields => &[
                "txHash",
                "blockNumber",
                "schemaId",
                "subject",
                "isPositive",
                "articlePage",
                "submitter",
                "timestamp",
            ],
            SinkSchema::FeedbackCounters => &[
                "txHash",
                "blockNumber",
                "from",
                "positiveFeedback",
                "negativeFeedback",
                "timestamp",
            ],
        }
    }

    /// One tabular row for `record`, in `columns()` order. Values are raw;
    /// quoting is the sink's concern.
    pub fn csv_row(&self, record: &Attestation) -> Vec<String> {
        match self {
            SinkSchema::RawFields => vec![
                record.tx_hash.clone(),
                record.block_number.to_string(),
                record.schema_id.clone(),
                record.subject.clone(),
                record.is_positive.to_string(),
                record.article_page.clone(),
                record.submitter.clone(),
                record.timestamp.to_string(),
            ],
            SinkSchema::FeedbackCounters => {
                let (pos, neg) = feedback_counters(record);
                vec![
                    record.tx_hash.clone(),
                    record.block_number.to_string(),
                    record.submitter.clone(),
                    pos.to_string(),
                    neg.to_string(),
                    record.timestamp.to_string(),
                ]
            }
        }
    }

    /// One structured (JSONL) entry for `record`.
    pub fn json_line(&self, record: &Attestation) -> Result<String, serde_json::Error> {
        match self {
            SinkSchema::RawFields => serde_json::to_string(record),
            SinkSchema::FeedbackCounters => {
                let (pos, neg) = feedback_counters(record);
                serde_json::to_string(&FeedbackEntry {
                    tx_hash: &record.tx_hash,
                    block_number: record.block_number,
                    from: &record.submitter,
                    positive_feedback: pos,
                    negative_feedback: neg,
                    timestamp: record.timestamp,
                })
            }
        }
    }
}

impl fmt::Display for SinkSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkSchema::RawFields => write!(f, "raw-fields"),
            SinkSchema::FeedbackCounters => write!(f, "feedback-counters"),
        }
    }
}

impl FromStr for SinkSchema {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raw-fields" | "v1" => Ok(SinkSchema::RawFields),
            "feedback-counters" | "v2" => Ok(SinkSchema::FeedbackCounters),
            other => Err(format!(
                "unknown sink schema '{other}' (expected raw-fields or feedback-counters)"
            )),
        }
    }
}

/// The v2 structured entry. `from` is the payload submitter.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FeedbackEntry<'a> {
    tx_hash: &'a str,
    block_number: u64,
    from: &'a str,
    positive_feedback: u32,
    negative_feedback: u32,
    timestamp: i64,
}

fn feedback_counters(record: &Attestation) -> (u32, u32) {
    if record.is_positive {
        (1, 0)
    } else {
        (0, 1)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
