//! Queue of calls awaiting user approval.
//!
//! Entries keep insertion order. Queue ids come from a process-wide counter
//! so a stale id held by the UI can never address a newer entry.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tracing::debug;

use dappshell_core::{Envelope, MethodClassifier};

use super::types::QueuedRequest;
use crate::frame::Frame;

static NEXT_QUEUE_ID: AtomicU64 = AtomicU64::new(1);

/// Ordered collection of pending calls.
#[derive(Debug, Clone, Default)]
pub struct RequestQueue {
    requests: Arc<RwLock<Vec<QueuedRequest>>>,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a call and return its queue id.
    pub async fn enqueue(&self, app_id: &str, envelope: Envelope, frame: Arc<dyn Frame>) -> u64 {
        let queue_id = NEXT_QUEUE_ID.fetch_add(1, Ordering::Relaxed);
        self.requests.write().await.push(QueuedRequest {
            queue_id,
            app_id: app_id.to_string(),
            envelope,
            frame,
        });
        debug!(queue_id, app_id, "Queued request");
        queue_id
    }

    /// Remove and return an entry. Unknown ids are a no-op.
    pub async fn dequeue(&self, queue_id: u64) -> Option<QueuedRequest> {
        let mut requests = self.requests.write().await;
        let index = requests.iter().position(|r| r.queue_id == queue_id)?;
        let request = requests.remove(index);
        drop(requests);
        debug!(queue_id, "Dequeued request");
        Some(request)
    }

    pub async fn find(&self, queue_id: u64) -> Option<QueuedRequest> {
        self.requests
            .read()
            .await
            .iter()
            .find(|r| r.queue_id == queue_id)
            .cloned()
    }

    /// Entries for `method` (directly, or as the subscribed method in
    /// `params[0]`) carrying `token`.
    pub async fn find_matching(&self, method: &str, token: Option<&str>) -> Vec<QueuedRequest> {
        self.requests
            .read()
            .await
            .iter()
            .filter(|r| {
                let env = &r.envelope;
                let method_matches = env.method.as_deref() == Some(method)
                    || env.call.params().first().and_then(|p| p.as_str()) == Some(method);
                method_matches && env.token() == token
            })
            .cloned()
            .collect()
    }

    /// Display projection: the first entry per (token, section), queue order.
    pub async fn squashed_view(&self, classifier: &MethodClassifier) -> Vec<QueuedRequest> {
        let mut seen = HashSet::new();
        self.requests
            .read()
            .await
            .iter()
            .filter(|r| {
                let section = classifier
                    .section_of(r.method())
                    .map(|s| s.name.clone());
                seen.insert((r.token().map(String::from), section))
            })
            .cloned()
            .collect()
    }

    /// All entries, queue order.
    pub async fn list(&self) -> Vec<QueuedRequest> {
        self.requests.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.requests.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.requests.read().await.is_empty()
    }
}
