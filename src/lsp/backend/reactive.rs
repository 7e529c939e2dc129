//! Debounced user-function re-scan
//!
//! Document edits arrive far faster than a re-scan is useful. Change events are
//! coalesced per URI and a document is only re-scanned once it has been quiet
//! for the configured period; a close drops whatever is still pending for it.
//! Opens are scanned as soon as they are received.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_stream::wrappers::ReceiverStream;
use tower_lsp::lsp_types::Url;
use tracing::{debug, info, trace};

use super::state::DocumentEvent;
use crate::lsp::engine::CompletionEngine;

/// Quiet period before a changed document is re-scanned
pub const RESCAN_QUIET_PERIOD: Duration = Duration::from_millis(500);

const MAX_TICK: Duration = Duration::from_millis(50);

struct PendingScan {
    last_change: Instant,
    version: i32,
    text: Arc<String>,
}

/// Spawns the per-URI debouncer feeding `engine`.
///
/// The task ends when the event channel closes or `shutdown_rx` fires.
/// Pending re-scans are discarded at that point.
pub fn spawn_document_debouncer(
    engine: Arc<CompletionEngine>,
    doc_event_rx: mpsc::Receiver<DocumentEvent>,
    mut shutdown_rx: broadcast::Receiver<()>,
    quiet_period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut events = Box::pin(
            ReceiverStream::new(doc_event_rx)
                .take_until(async move {
                    let _ = shutdown_rx.recv().await;
                    info!("Document debouncer received shutdown signal");
                })
        );

        let tick = quiet_period.min(MAX_TICK);
        let mut pending: HashMap<Url, PendingScan> = HashMap::new();

        loop {
            tokio::select! {
                biased;

                event = events.next() => match event {
                    Some(DocumentEvent::Opened { uri, text, scanned }) => {
                        pending.remove(&uri);
                        let count = engine.update_document(&uri, &text);
                        debug!("Scanned opened {}: {} user functions", uri, count);
                        let _ = scanned.send(count);
                    }
                    Some(DocumentEvent::Changed { uri, version, text }) => {
                        trace!("Queued re-scan of {} at version {}", uri, version);
                        pending.insert(uri, PendingScan { last_change: Instant::now(), version, text });
                    }
                    Some(DocumentEvent::Closed { uri }) => {
                        if pending.remove(&uri).is_some() {
                            trace!("Dropped pending re-scan of closed {}", uri);
                        }
                        engine.close_document(&uri);
                    }
                    None => break,
                },
                _ = tokio::time::sleep(tick), if !pending.is_empty() => {
                    let now = Instant::now();
                    let ready: Vec<Url> = pending
                        .iter()
                        .filter(|(_, scan)| now.duration_since(scan.last_change) >= quiet_period)
                        .map(|(uri, _)| uri.clone())
                        .collect();

                    for uri in ready {
                        if let Some(scan) = pending.remove(&uri) {
                            let count = engine.update_document(&uri, &scan.text);
                            debug!("Re-scanned {} at version {}: {} user functions", uri, scan.version, count);
                        }
                    }
                }
            }
        }

        info!("Document debouncer task terminated");
    })
}
