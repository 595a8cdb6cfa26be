//! Live transaction source via a `newHeads` WebSocket subscription.
//!
//! # How it works
//!
//! 1. Connect to the node's WebSocket endpoint and send an `eth_subscribe`
//!    request for `newHeads`.
//! 2. Each notification names a freshly mined block; resolve it through the
//!    HTTP provider into the transactions addressed to the registry.
//! 3. Push those refs onto the pipeline's bounded queue, one by one.
//!
//! A dropped connection reconnects with capped exponential backoff. Flipping
//! the shutdown signal stops feeding without touching work already queued,
//! so the pipeline drains instead of losing records.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

use attestindex_core::{SourceError, TransactionRef};

use crate::provider::ProviderClient;

/// Why a WebSocket session ended.
enum SessionEnd {
    /// The shutdown signal flipped.
    Shutdown,
    /// The pipeline's queue receiver was dropped.
    QueueClosed,
    /// The connection dropped or the server closed it.
    Disconnected,
}

/// Live block subscription feeding the decode pipeline.
pub struct BlockSubscription {
    ws_url: String,
    contract: String,
    provider: Arc<ProviderClient>,
}

impl BlockSubscription {
    pub fn new(
        ws_url: impl Into<String>,
        contract: impl Into<String>,
        provider: Arc<ProviderClient>,
    ) -> Self {
        Self {
            ws_url: ws_url.into(),
            contract: contract.into(),
            provider,
        }
    }

    /// Run until the shutdown signal flips or the queue closes.
    ///
    /// # Errors
    ///
    /// Only a malformed WebSocket URL is fatal; connection failures
    /// reconnect with backoff.
    pub async fn run(
        &self,
        queue: mpsc::Sender<TransactionRef>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), SourceError> {
        let url: Url = self.ws_url.parse().map_err(|e| SourceError::Subscription {
            reason: format!("invalid WebSocket URL '{}': {e}", self.ws_url),
        })?;

        let mut retry = 0u32;
        loop {
            if *shutdown.borrow() {
                break;
            }

            info!(url = %self.ws_url, "connecting block subscription");
            match self.run_session(url.as_str(), &queue, &mut shutdown).await {
                Ok(SessionEnd::Shutdown) | Ok(SessionEnd::QueueClosed) => break,
                Ok(SessionEnd::Disconnected) => {
                    // The session had connected; start the backoff ladder over.
                    retry = 0;
                    info!("subscription dropped, reconnecting");
                }
                Err(e) => {
                    retry += 1;
                    warn!(error = %e, retry, "subscription connect failed");
                }
            }

            let backoff = Duration::from_millis(500 * 2u64.pow(retry.min(6)));
            tokio::select! {
                _ = tokio::time::sleep(backoff) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("block subscription stopped");
        Ok(())
    }

    async fn run_session(
        &self,
        url: &str,
        queue: &mpsc::Sender<TransactionRef>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<SessionEnd, SourceError> {
        let (ws, _) = connect_async(url)
            .await
            .map_err(|e| SourceError::Subscription {
                reason: format!("connect: {e}"),
            })?;
        let (mut write, mut read) = ws.split();

        let sub_msg = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_subscribe",
            "params": ["newHeads"]
        });
        write
            .send(Message::Text(sub_msg.to_string()))
            .await
            .map_err(|e| SourceError::Subscription {
                reason: format!("subscribe: {e}"),
            })?;

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return Ok(SessionEnd::Shutdown);
                    }
                }
                msg = read.next() => {
                    let msg = match msg {
                        None => return Ok(SessionEnd::Disconnected),
                        Some(Err(e)) => {
                            warn!(error = %e, "WebSocket stream error");
                            return Ok(SessionEnd::Disconnected);
                        }
                        Some(Ok(m)) => m,
                    };

                    match msg {
                        Message::Text(text) => {
                            if let Some(number) = parse_new_head(&text) {
                                if !self.enqueue_block(number, queue).await {
                                    return Ok(SessionEnd::QueueClosed);
                                }
                            }
                        }
                        Message::Ping(data) => {
                            let _ = write.send(Message::Pong(data)).await;
                        }
                        Message::Close(_) => {
                            info!("WebSocket closed by server");
                            return Ok(SessionEnd::Disconnected);
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    /// Resolve one announced block and queue its matching refs.
    ///
    /// Returns `false` once the queue receiver is gone. A failed block
    /// lookup skips that block; the subscription itself stays up.
    async fn enqueue_block(&self, number: u64, queue: &mpsc::Sender<TransactionRef>) -> bool {
        match self.provider.block_transactions(number, &self.contract).await {
            Ok(refs) => {
                debug!(block = number, matched = refs.len(), "new head resolved");
                for tx in refs {
                    if queue.send(tx).await.is_err() {
                        return false;
                    }
                }
                true
            }
            Err(e) => {
                warn!(block = number, error = %e, "failed to resolve new head, skipping block");
                true
            }
        }
    }
}

/// Parse an `eth_subscription` newHeads notification into a block number.
///
/// Subscription confirmations (plain responses with a `result` id) and
/// unrelated messages yield `None`.
fn parse_new_head(text: &str) -> Option<u64> {
    let v: Value = serde_json::from_str(text).ok()?;

    if v.get("method")?.as_str()? != "eth_subscription" {
        return None;
    }

    let number = v.get("params")?.get("result")?.get("number")?.as_str()?;
    u64::from_str_radix(number.strip_prefix("0x").unwrap_or(number), 16).ok()
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_new_head_notification() {
        let raw = r#"{
            "jsonrpc": "2.0",
            "method": "eth_subscription",
            "params": {
                "subscription": "0x9ce59a13059e417087c02d3236a0b1cc",
                "result": {
                    "number": "0x1b4",
                    "hash": "0x1c9f6a86ccbdc69eee4b1b29e0b49e1a3c6d41e4b35c2c1f8a9f6d8e7f6a5b4c",
                    "timestamp": "0x66d9a2f0"
                }
            }
        }"#;

        assert_eq!(parse_new_head(raw), Some(0x1b4));
    }

    #[test]
    fn skip_subscription_confirmation() {
        let raw = r#"{"jsonrpc": "2.0", "id": 1, "result": "0x9ce59a13059e417087c02d3236a0b1cc"}"#;

        assert_eq!(parse_new_head(raw), None);
    }

    #[test]
    fn skip_malformed_messages() {
        assert_eq!(parse_new_head("not json"), None);
        assert_eq!(parse_new_head(r#"{"method": "eth_subscription"}"#), None);
        assert_eq!(
            parse_new_head(
                r#"{"method": "eth_subscription", "params": {"result": {"number": "zz"}}}"#
            ),
            None
        );
    }
}
