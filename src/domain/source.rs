// src/domain/source.rs

//! Message source domain abstraction.
//!
//! A message source is the messaging system a listener is registered
//! against. It delivers opaque envelopes to subscribers and nothing more:
//! acknowledgment, redelivery, and dead-lettering belong to the concrete
//! broker integration, never to the listener or the dispatcher.
//!
//! Concrete implementations live under `src/source/`.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::{Envelope, Result, Subscription};

/// Handle returned from a successful subscription.
///
/// The subscription remains active until either:
/// - The handle is dropped (receiver channel closes)
/// - The source is closed
///
/// # Example
///
/// ```no_run
/// # use mom_dispatch::{create_memory_source, Subscription};
/// # async fn example() -> mom_dispatch::Result<()> {
/// let source = create_memory_source("app").await?;
///
/// let mut handle = source.subscribe(Subscription::from("notifications")).await?;
///
/// while let Some(envelope) = handle.inbox.recv().await {
///     println!("received: {:?}", envelope);
/// }
/// # Ok(())
/// # }
/// ```
pub struct SubscriptionHandle {
    // ---
    /// Receiver channel for delivered envelopes matching this subscription.
    pub inbox: mpsc::Receiver<Envelope>,
}

/// Message source abstraction.
///
/// Implementations must ensure that:
/// - Once `subscribe()` returns successfully, messages published *after* that
///   point and matching the subscription are deliverable.
/// - Closing the source closes every outstanding inbox, which ends any
///   listener loop reading from it.
///
/// The in-memory source serves as the reference implementation of these
/// semantics.
#[async_trait::async_trait]
pub trait MessageSource: Send + Sync {
    // ---
    /// Identifier of this source instance, used for logging.
    fn source_id(&self) -> &str;

    /// Publish an envelope to its destination.
    async fn publish(&self, env: Envelope) -> Result<()>;

    /// Register a subscription and return a handle for receiving messages.
    async fn subscribe(&self, sub: Subscription) -> Result<SubscriptionHandle>;

    /// Close the source and release any associated resources.
    async fn close(&self) -> Result<()>;
}

/// Shared message source pointer.
///
/// `.clone()` only increments a reference count; all clones share the same
/// underlying source.
pub type MessageSourcePtr = Arc<dyn MessageSource>;
