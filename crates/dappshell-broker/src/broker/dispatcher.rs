//! Message dispatcher.
//!
//! Each inbound message moves `received -> validated -> {queued | executed |
//! rejected}`. User decisions on queued calls arrive through
//! [`Broker::approve_single`], [`Broker::approve_all`] and [`Broker::reject`].
//!
//! Broker state is only mutated from the caller's task, one message or
//! action at a time. Provider calls run on spawned tasks and may complete in
//! any order.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use dappshell_core::envelope::parse_envelope;
use dappshell_core::{Call, Envelope, MethodClassifier, Unsubscribe};
use dappshell_core::config::DappManifest;

use super::intrinsic::Intrinsic;
use super::types::{BrokerError, Dispatch};
use crate::dapps::DappRegistry;
use crate::frame::Frame;
use crate::permission::{PermissionStore, QueuedRequest, RequestQueue};
use crate::provider::{Provider, ProviderError};
use crate::store::KeyValueStore;
use crate::tokens::TokenRegistry;

/// Mediator between dapp frames and the RPC provider.
pub struct Broker {
    pub(super) broker_id: String,
    pub(super) tokens: TokenRegistry,
    pub(super) permissions: PermissionStore,
    pub(super) classifier: MethodClassifier,
    pub(super) queue: RequestQueue,
    pub(super) dapps: DappRegistry,
    provider: Arc<dyn Provider>,
}

impl Broker {
    /// Create a broker answering to `broker_id`, with state persisted in
    /// `store`.
    pub fn new(
        broker_id: &str,
        provider: Arc<dyn Provider>,
        store: Arc<dyn KeyValueStore>,
        dapps: &[DappManifest],
    ) -> Self {
        let tokens = TokenRegistry::new();
        Self {
            broker_id: broker_id.to_string(),
            permissions: PermissionStore::load(tokens.clone(), Arc::clone(&store)),
            tokens,
            classifier: MethodClassifier::new(),
            queue: RequestQueue::new(),
            dapps: DappRegistry::load(dapps, store),
            provider,
        }
    }

    /// Replace the built-in method sections.
    #[must_use]
    pub fn with_classifier(mut self, classifier: MethodClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn broker_id(&self) -> &str {
        &self.broker_id
    }

    pub const fn tokens(&self) -> &TokenRegistry {
        &self.tokens
    }

    pub const fn permissions(&self) -> &PermissionStore {
        &self.permissions
    }

    pub const fn classifier(&self) -> &MethodClassifier {
        &self.classifier
    }

    pub const fn queue(&self) -> &RequestQueue {
        &self.queue
    }

    pub const fn dapps(&self) -> &DappRegistry {
        &self.dapps
    }

    /// Handle one inbound frame message.
    pub async fn on_message(&self, raw: &Value, frame: Arc<dyn Frame>) -> Dispatch {
        let envelope = match parse_envelope(raw, &self.broker_id) {
            Ok(envelope) => envelope,
            Err(reason) => {
                debug!(%reason, "Dropping frame message");
                return Dispatch::Dropped(reason);
            }
        };

        if !self
            .tokens
            .is_valid(envelope.method.as_deref(), &envelope.from, envelope.token())
            .await
        {
            warn!(
                from = %envelope.from,
                method = envelope.method_label(),
                "Rejecting message with invalid token"
            );
            frame.post(envelope.rejection(&self.broker_id));
            return Dispatch::Rejected;
        }

        if let Some(method) = envelope.call.permission_key()
            && self.classifier.is_sensitive(method)
            && !self.permissions.is_allowed(method, envelope.token()).await
        {
            let app_id = match envelope.token() {
                Some(token) => self.tokens.resolve(token).await,
                None => None,
            }
            .unwrap_or_else(|| envelope.from.clone());
            let method = method.to_string();

            let queue_id = self.queue.enqueue(&app_id, envelope, frame).await;
            info!(queue_id, app_id, method, "Call awaiting approval");
            return Dispatch::Queued { queue_id };
        }

        self.execute(envelope, frame).await;
        Dispatch::Executed
    }

    /// Approve one queued call. Returns false when the id is gone.
    pub async fn approve_single(&self, queue_id: u64) -> bool {
        let Some(request) = self.queue.dequeue(queue_id).await else {
            debug!(queue_id, "Approve for unknown queue id");
            return false;
        };
        info!(queue_id, app_id = %request.app_id, method = request.method(), "Call approved");
        self.execute(request.envelope, request.frame).await;
        true
    }

    /// Approve the call's whole section for its token, then run every queued
    /// call of that section carrying the same token. Returns the number of
    /// calls executed.
    pub async fn approve_all(&self, queue_id: u64) -> usize {
        let Some(request) = self.queue.find(queue_id).await else {
            debug!(queue_id, "Approve-all for unknown queue id");
            return 0;
        };

        let Some(section) = self.classifier.section_of(request.method()) else {
            return usize::from(self.approve_single(queue_id).await);
        };

        let token = request.token();
        let mut executed = 0;
        for method in &section.methods {
            self.permissions.grant(method, token).await;
            for sibling in self.queue.find_matching(method, token).await {
                if self.approve_single(sibling.queue_id).await {
                    executed += 1;
                }
            }
        }

        info!(
            queue_id,
            app_id = %request.app_id,
            section = %section.name,
            executed,
            "Section approved"
        );
        executed
    }

    /// Refuse a queued call. Returns false when the id is gone.
    pub async fn reject(&self, queue_id: u64) -> bool {
        let Some(QueuedRequest {
            envelope, frame, app_id, ..
        }) = self.queue.dequeue(queue_id).await
        else {
            debug!(queue_id, "Reject for unknown queue id");
            return false;
        };
        info!(queue_id, app_id, method = envelope.method_label(), "Call rejected");
        frame.post(envelope.rejection(&self.broker_id));
        true
    }

    /// Run an authorized call. Posts exactly one reply, possibly later.
    async fn execute(&self, envelope: Envelope, frame: Arc<dyn Frame>) {
        let provider = Arc::clone(&self.provider);
        match envelope.call.clone() {
            Call::Method { method, params } => {
                if let Some(intrinsic) = Intrinsic::from_method(&method) {
                    let outcome = self
                        .run_intrinsic(intrinsic, &envelope, &params)
                        .await
                        .map_err(|e| e.to_string());
                    frame.post(envelope.reply(&self.broker_id, outcome));
                    return;
                }
                self.spawn_provider_call(envelope, frame, async move {
                    provider.send(&method, params).await
                });
            }
            Call::Subscribe { api, params } => {
                self.spawn_provider_call(envelope, frame, async move {
                    provider.subscribe(&api, params).await
                });
            }
            Call::Unsubscribe(Unsubscribe::One(sub_id)) => {
                self.spawn_provider_call(envelope, frame, async move {
                    provider.unsubscribe(&sub_id).await
                });
            }
            Call::Unsubscribe(Unsubscribe::All) => {
                self.spawn_provider_call(envelope, frame, async move {
                    provider.unsubscribe_all().await
                });
            }
        }
    }

    fn spawn_provider_call<F>(&self, envelope: Envelope, frame: Arc<dyn Frame>, call: F)
    where
        F: Future<Output = Result<Value, ProviderError>> + Send + 'static,
    {
        let broker_id = self.broker_id.clone();
        tokio::spawn(async move {
            let outcome = call.await.map_err(|e| {
                debug!(method = envelope.method_label(), error = %e, "Provider call failed");
                BrokerError::from(e).to_string()
            });
            frame.post(envelope.reply(&broker_id, outcome));
        });
    }
}
