//! `Pipeline` — fans transaction refs out to decode workers and funnels
//! records into a single sink writer.
//!
//! # How it works
//!
//! 1. A source pushes `TransactionRef`s onto a bounded queue; a slow
//!    pipeline backpressures the source instead of buffering without limit.
//! 2. A fixed pool of workers pulls from the queue. Each worker fetches the
//!    transaction, runs the decode chain, looks up the block timestamp, and
//!    assembles the record.
//! 3. All workers feed one writer loop that owns the sink, so the artifacts
//!    only ever see a single appender. Append order is decode-completion
//!    order.
//!
//! The run drains on its own once the ref queue closes: workers finish what
//! is queued, drop their record senders, and the writer loop ends.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use attestindex_core::{Attestation, IndexerConfig, SinkError, TransactionRef};
use attestindex_evm::{assemble, decode_attestation, AttestCallDecoder};
use attestindex_sink::RecordSink;
use attestindex_source::TransactionFetcher;

type SharedReceiver = Arc<tokio::sync::Mutex<mpsc::Receiver<TransactionRef>>>;

/// Counters for one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineMetrics {
    /// Records appended to the sink.
    pub records_written: u64,
    /// Transactions that were not attestations: foreign destination, empty
    /// calldata, or an attestation carrying no data.
    pub transactions_skipped: u64,
    /// Transactions whose calldata or payload failed to decode.
    pub decode_errors: u64,
    /// Transactions or blocks the node could not resolve.
    pub fetch_errors: u64,
}

/// The decode pipeline.
pub struct Pipeline {
    decoder: AttestCallDecoder,
    fetcher: Arc<dyn TransactionFetcher>,
    workers: usize,
    queue_capacity: usize,
    metrics: Arc<Mutex<PipelineMetrics>>,
}

impl Pipeline {
    pub fn new(
        decoder: AttestCallDecoder,
        fetcher: Arc<dyn TransactionFetcher>,
        config: &IndexerConfig,
    ) -> Self {
        Self {
            decoder,
            fetcher,
            workers: config.workers.max(1),
            queue_capacity: config.queue_capacity.max(1),
            metrics: Arc::new(Mutex::new(PipelineMetrics::default())),
        }
    }

    /// Snapshot of the run counters.
    pub fn metrics(&self) -> PipelineMetrics {
        self.metrics.lock().unwrap().clone()
    }

    /// Decode a fixed listing of transactions and drain into the sink.
    ///
    /// Feeds the refs through the same bounded queue the live listener
    /// uses, so backpressure behaves identically in both modes.
    pub async fn backfill(
        self: Arc<Self>,
        refs: Vec<TransactionRef>,
        sink: Box<dyn RecordSink>,
    ) -> Result<PipelineMetrics, SinkError> {
        let (refs_tx, refs_rx) = mpsc::channel(self.queue_capacity);

        tokio::spawn(async move {
            for tx in refs {
                if refs_tx.send(tx).await.is_err() {
                    break;
                }
            }
        });

        self.run(refs_rx, sink).await
    }

    /// Drive the pipeline until the ref queue closes, then report counters.
    ///
    /// # Errors
    ///
    /// A sink failure is fatal: the run stops immediately and queued work is
    /// discarded. Per-transaction fetch and decode failures only skip that
    /// transaction.
    pub async fn run(
        self: Arc<Self>,
        refs_rx: mpsc::Receiver<TransactionRef>,
        mut sink: Box<dyn RecordSink>,
    ) -> Result<PipelineMetrics, SinkError> {
        let refs_rx: SharedReceiver = Arc::new(tokio::sync::Mutex::new(refs_rx));
        let (records_tx, mut records_rx) = mpsc::channel::<Attestation>(self.queue_capacity);

        info!(workers = self.workers, "starting decode pipeline");

        let mut handles = Vec::with_capacity(self.workers);
        for worker_id in 0..self.workers {
            let pipeline = Arc::clone(&self);
            let refs_rx = Arc::clone(&refs_rx);
            let records_tx = records_tx.clone();
            handles.push(tokio::spawn(async move {
                pipeline.worker_loop(worker_id, refs_rx, records_tx).await;
            }));
        }
        drop(records_tx);

        // Single writer: the sink never sees concurrent appends.
        while let Some(record) = records_rx.recv().await {
            if let Err(e) = sink.append(&record) {
                error!(error = %e, "sink append failed, aborting run");
                return Err(e);
            }
            self.metrics.lock().unwrap().records_written += 1;
        }

        for handle in handles {
            let _ = handle.await;
        }

        let metrics = self.metrics();
        info!(
            records = metrics.records_written,
            skipped = metrics.transactions_skipped,
            decode_errors = metrics.decode_errors,
            fetch_errors = metrics.fetch_errors,
            "pipeline run complete"
        );
        Ok(metrics)
    }

    async fn worker_loop(
        &self,
        worker_id: usize,
        refs_rx: SharedReceiver,
        records_tx: mpsc::Sender<Attestation>,
    ) {
        loop {
            let tx = { refs_rx.lock().await.recv().await };
            let tx = match tx {
                Some(tx) => tx,
                None => break,
            };

            if let Some(record) = self.process_transaction(&tx).await {
                if records_tx.send(record).await.is_err() {
                    break;
                }
            }
        }
        debug!(worker_id, "decode worker finished");
    }

    /// Fetch, decode, and assemble one transaction.
    ///
    /// `None` means the transaction produced no record; the reason has
    /// already been counted and logged.
    async fn process_transaction(&self, tx: &TransactionRef) -> Option<Attestation> {
        let data = match self.fetcher.transaction(&tx.hash).await {
            Ok(Some(data)) => data,
            Ok(None) => {
                warn!(hash = %tx.hash, "node does not know transaction, skipping");
                self.metrics.lock().unwrap().fetch_errors += 1;
                return None;
            }
            Err(e) => {
                warn!(hash = %tx.hash, error = %e, "transaction lookup failed, skipping");
                self.metrics.lock().unwrap().fetch_errors += 1;
                return None;
            }
        };

        let decoded = match decode_attestation(&self.decoder, data.to.as_deref(), &data.input) {
            Ok(Some(decoded)) => decoded,
            Ok(None) => {
                self.metrics.lock().unwrap().transactions_skipped += 1;
                return None;
            }
            Err(e) => {
                warn!(hash = %tx.hash, error = %e, "decode failed, dropping transaction");
                self.metrics.lock().unwrap().decode_errors += 1;
                return None;
            }
        };

        let timestamp = match self.fetcher.block_timestamp(tx.block_number).await {
            Ok(timestamp) => timestamp,
            Err(e) => {
                warn!(
                    hash = %tx.hash,
                    block = tx.block_number,
                    error = %e,
                    "block timestamp lookup failed, skipping"
                );
                self.metrics.lock().unwrap().fetch_errors += 1;
                return None;
            }
        };

        Some(assemble(tx, &decoded, timestamp))
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
