//! File-backed record sink.
//!
//! Writes every record twice: one JSONL line and one CSV row, both following
//! the run's selected [`SinkSchema`]. Opening the sink truncates both
//! artifacts and writes the CSV header, so each run starts from a clean
//! slate and re-runs over the same range reproduce the same files.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use attestindex_core::{Attestation, SinkError, SinkSchema};

use crate::RecordSink;

/// Append-only JSONL + CSV sink. Single-writer by construction: it is owned
/// by whoever holds it and offers no shared handles.
pub struct FileSink {
    schema: SinkSchema,
    jsonl_path: PathBuf,
    csv_path: PathBuf,
    jsonl: BufWriter<File>,
    csv: BufWriter<File>,
}

impl FileSink {
    /// Create (or truncate) both artifacts and write the CSV header row.
    pub fn create(
        jsonl_path: impl AsRef<Path>,
        csv_path: impl AsRef<Path>,
        schema: SinkSchema,
    ) -> Result<Self, SinkError> {
        let jsonl_path = jsonl_path.as_ref().to_path_buf();
        let csv_path = csv_path.as_ref().to_path_buf();

        let jsonl = BufWriter::new(File::create(&jsonl_path)?);
        let mut csv = BufWriter::new(File::create(&csv_path)?);
        writeln!(csv, "{}", schema.columns().join(","))?;
        // A run that finds nothing still leaves a valid header-only artifact.
        csv.flush()?;

        debug!(
            jsonl = %jsonl_path.display(),
            csv = %csv_path.display(),
            %schema,
            "sink initialized"
        );

        Ok(Self {
            schema,
            jsonl_path,
            csv_path,
            jsonl,
            csv,
        })
    }

    /// Path of the structured artifact.
    pub fn jsonl_path(&self) -> &Path {
        &self.jsonl_path
    }

    /// Path of the tabular artifact.
    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

impl RecordSink for FileSink {
    fn append(&mut self, record: &Attestation) -> Result<(), SinkError> {
        let line = self.schema.json_line(record)?;
        self.jsonl.write_all(line.as_bytes())?;
        self.jsonl.write_all(b"\n")?;

        let row: Vec<String> = self
            .schema
            .csv_row(record)
            .iter()
            .map(|v| csv_field(v))
            .collect();
        writeln!(self.csv, "{}", row.join(","))?;

        // Flush per record: a crash never leaves a partial line behind.
        self.jsonl.flush()?;
        self.csv.flush()?;
        Ok(())
    }
}

/// Quote a CSV field if it contains a delimiter, quote, or line break.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sample(page: &str) -> Attestation {
        Attestation {
            tx_hash: "0xdead".into(),
            block_number: 9,
            schema_id: "0x01".into(),
            subject: "0xAbCdEf0123456789AbCdEf0123456789AbCdEf01".into(),
            is_positive: true,
            article_page: page.into(),
            submitter: "0x1111111111111111111111111111111111111111".into(),
            timestamp: 1_700_000_000,
        }
    }

    fn temp_paths(tag: &str) -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir();
        let pid = std::process::id();
        (
            dir.join(format!("attestindex-{tag}-{pid}.jsonl")),
            dir.join(format!("attestindex-{tag}-{pid}.csv")),
        )
    }

    #[test]
    fn n_appends_yield_n_rows_plus_header() {
        let (jsonl, csv) = temp_paths("rows");
        let mut sink = FileSink::create(&jsonl, &csv, SinkSchema::RawFields).unwrap();
        for i in 0..3 {
            sink.append(&sample(&format!("page-{i}"))).unwrap();
        }

        let jsonl_text = fs::read_to_string(&jsonl).unwrap();
        assert_eq!(jsonl_text.lines().count(), 3);

        let csv_text = fs::read_to_string(&csv).unwrap();
        let lines: Vec<&str> = csv_text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], SinkSchema::RawFields.columns().join(","));
        assert!(lines[1].contains("page-0"));

        let _ = fs::remove_file(jsonl);
        let _ = fs::remove_file(csv);
    }

    #[test]
    fn recreate_truncates_previous_run() {
        let (jsonl, csv) = temp_paths("truncate");
        {
            let mut sink = FileSink::create(&jsonl, &csv, SinkSchema::RawFields).unwrap();
            sink.append(&sample("old-1")).unwrap();
            sink.append(&sample("old-2")).unwrap();
        }
        {
            let mut sink = FileSink::create(&jsonl, &csv, SinkSchema::RawFields).unwrap();
            sink.append(&sample("new")).unwrap();
        }

        let jsonl_text = fs::read_to_string(&jsonl).unwrap();
        assert_eq!(jsonl_text.lines().count(), 1);
        assert!(jsonl_text.contains("new"));
        assert!(!jsonl_text.contains("old-1"));

        let csv_text = fs::read_to_string(&csv).unwrap();
        assert_eq!(csv_text.lines().count(), 2);

        let _ = fs::remove_file(jsonl);
        let _ = fs::remove_file(csv);
    }

    #[test]
    fn empty_run_leaves_header_only_artifact() {
        let (jsonl, csv) = temp_paths("empty");
        let sink = FileSink::create(&jsonl, &csv, SinkSchema::FeedbackCounters).unwrap();
        drop(sink);

        let csv_text = fs::read_to_string(&csv).unwrap();
        assert_eq!(
            csv_text.trim_end(),
            SinkSchema::FeedbackCounters.columns().join(",")
        );
        assert_eq!(fs::read_to_string(&jsonl).unwrap(), "");

        let _ = fs::remove_file(jsonl);
        let _ = fs::remove_file(csv);
    }

    #[test]
    fn fields_with_delimiters_are_quoted() {
        let (jsonl, csv) = temp_paths("quoting");
        let mut sink = FileSink::create(&jsonl, &csv, SinkSchema::RawFields).unwrap();
        sink.append(&sample("page \"three\", revised")).unwrap();

        let csv_text = fs::read_to_string(&csv).unwrap();
        assert!(csv_text.contains("\"page \"\"three\"\", revised\""));

        let _ = fs::remove_file(jsonl);
        let _ = fs::remove_file(csv);
    }

    #[test]
    fn csv_field_passes_plain_values_through() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
