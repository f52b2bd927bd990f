// src/source/memory/source.rs

//! In-memory message source implementation.
//!
//! This file contains the concrete implementation of the domain-level
//! `MessageSource` trait using in-process data structures only.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};

use crate::{
    // ---
    Envelope,
    Error,
    MessageSource,
    MessageSourcePtr,
    Result,
    Subscription,
    SubscriptionHandle,
};

/// Inbox capacity used by [`create_source`].
pub const DEFAULT_INBOX_CAPACITY: usize = 16;

/// In-memory message source.
///
/// ## Semantics
///
/// - Subscriptions are registered immediately.
/// - A subscription matches a destination when their strings are equal.
/// - Dropping a `SubscriptionHandle` implicitly unregisters the subscription.
/// - `close()` drops every inbox sender and rejects later publishes.
struct MemorySource {
    // ---
    source_id: String,
    capacity: usize,
    closed: AtomicBool,
    subscriptions: RwLock<HashMap<Subscription, Vec<mpsc::Sender<Envelope>>>>,
}

impl MemorySource {
    // ---

    fn new(source_id: String, capacity: usize) -> Self {
        Self {
            source_id,
            capacity,
            closed: AtomicBool::new(false),
            subscriptions: RwLock::new(HashMap::new()),
        }
    }

    // Drop senders whose handle is gone, and the entry once none remain
    async fn prune(&self, key: &Subscription) {
        // ---
        let mut subs = self.subscriptions.write().await;
        if let Some(senders) = subs.get_mut(key) {
            senders.retain(|s| !s.is_closed());
            if senders.is_empty() {
                subs.remove(key);
                crate::log_debug!("[{}] pruned subscription {}", self.source_id, key.0);
            }
        }
    }
}

#[async_trait::async_trait]
impl MessageSource for MemorySource {
    // ---

    fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Publish an envelope to every subscription on its destination.
    ///
    /// Waits for inbox capacity when a subscriber is behind. A closed inbox
    /// (dropped handle) is skipped and pruned from the registry.
    async fn publish(&self, env: Envelope) -> Result<()> {
        // ---
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::SourceClosed);
        }

        let key = Subscription::from(env.destination.clone());

        // Snapshot senders so the lock is not held while waiting on capacity.
        let senders = {
            let subs = self.subscriptions.read().await;
            subs.get(&key).cloned().unwrap_or_default()
        };

        if senders.is_empty() {
            crate::log_debug!(
                "[{}] no subscribers for destination {}",
                self.source_id,
                env.destination
            );
            return Ok(());
        }

        let mut stale = false;
        for sender in senders {
            // A send failure means the SubscriptionHandle was dropped.
            if sender.send(env.clone()).await.is_err() {
                stale = true;
            }
        }

        if stale {
            self.prune(&key).await;
        }

        Ok(())
    }

    /// Register a subscription.
    ///
    /// Once this function returns successfully, any subsequent calls to
    /// `publish()` on the matching destination are deliverable to the
    /// returned inbox.
    async fn subscribe(&self, sub: Subscription) -> Result<SubscriptionHandle> {
        // ---
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::SourceClosed);
        }

        let (tx, rx) = mpsc::channel(self.capacity);

        let mut subs = self.subscriptions.write().await;
        let senders = subs.entry(sub).or_default();
        senders.retain(|s| !s.is_closed());
        senders.push(tx);

        Ok(SubscriptionHandle { inbox: rx })
    }

    /// Close the source.
    ///
    /// Clears all subscriptions, which closes every outstanding inbox.
    async fn close(&self) -> Result<()> {
        // ---
        self.closed.store(true, Ordering::Release);

        let mut subs = self.subscriptions.write().await;
        subs.clear();

        crate::log_debug!("[{}] memory source closed", self.source_id);
        Ok(())
    }
}

/// Create a new in-memory message source.
///
/// This source is always available and requires no external resources.
pub async fn create_source(source_id: impl Into<String>) -> Result<MessageSourcePtr> {
    // ---
    create_source_with_capacity(source_id, DEFAULT_INBOX_CAPACITY).await
}

/// Create a new in-memory message source with a custom per-inbox capacity.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] if `capacity` is zero.
pub async fn create_source_with_capacity(
    source_id: impl Into<String>,
    capacity: usize,
) -> Result<MessageSourcePtr> {
    // ---
    if capacity == 0 {
        return Err(Error::InvalidConfig(
            "inbox capacity must be at least 1".into(),
        ));
    }

    Ok(Arc::new(MemorySource::new(source_id.into(), capacity)))
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use bytes::Bytes;

    use crate::Destination;

    fn envelope(dest: &str) -> Envelope {
        Envelope::new(Destination::from(dest), Bytes::from_static(b"x"))
    }

    #[tokio::test]
    async fn test_publish_prunes_dropped_subscriptions() {
        // ---
        let source = MemorySource::new("prune".into(), 4);

        let dropped = source.subscribe(Subscription::from("gone")).await.expect("subscribe");
        drop(dropped);

        source.publish(envelope("gone")).await.expect("publish");
        assert!(source.subscriptions.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_publish_keeps_live_subscriptions() {
        // ---
        let source = MemorySource::new("prune".into(), 4);

        let mut live = source.subscribe(Subscription::from("q")).await.expect("subscribe");
        let dropped = source.subscribe(Subscription::from("q")).await.expect("subscribe");
        drop(dropped);

        source.publish(envelope("q")).await.expect("publish");

        let subs = source.subscriptions.read().await;
        assert_eq!(subs.get(&Subscription::from("q")).map(Vec::len), Some(1));
        drop(subs);

        let got = live.inbox.recv().await.expect("delivered");
        assert_eq!(got.payload, Bytes::from_static(b"x"));
    }
}
