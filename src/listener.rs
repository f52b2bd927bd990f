//! Inbound listener contract and delivery loop.
//!
//! This module provides the glue between a [`MessageSource`](crate::MessageSource)
//! and anything that wants to receive its messages, such as a
//! [`MessageDispatcher`](crate::MessageDispatcher).
//!
//! The loop is responsible for:
//! - subscribing to the configured destination
//! - driving a receive loop over the subscription inbox
//! - handing each envelope to the listener, up to `concurrency` at a time
//! - logging listener failures
//!
//! It does **not** acknowledge, retry, redeliver, or dead-letter messages.
//! Those policies belong to the broker integration behind the source.
//!
//! ## Error handling
//!
//! An error returned by [`MessageListener::on_message`] is logged at `warn`
//! level (when the `logging` feature is enabled) and the loop moves on to the
//! next message. A single failed message never stops the listener.
//!
//! ## Shutdown
//!
//! The loop ends when the source is closed or the subscription is dropped.
//! Deliveries already running are awaited before the task completes.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};

use crate::{Envelope, ListenerConfig, MessageSourcePtr, Result, Subscription};

/// Callback contract for receiving delivered messages.
///
/// `on_message` is awaited by the delivery loop; whatever time it takes is
/// time the delivering slot is busy.
#[async_trait::async_trait]
pub trait MessageListener: Send + Sync {
    /// Failure reported for a single message.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Handle one delivered message.
    async fn on_message(&self, message: Envelope) -> std::result::Result<(), Self::Error>;
}

#[async_trait::async_trait]
impl<L> MessageListener for Arc<L>
where
    L: MessageListener + ?Sized,
{
    type Error = L::Error;

    async fn on_message(&self, message: Envelope) -> std::result::Result<(), Self::Error> {
        (**self).on_message(message).await
    }
}

/// Register `listener` against `source` and start delivering messages.
///
/// Subscribes before returning, so any message published to
/// `config.destination` after this call returns is delivered.
///
/// The returned [`JoinHandle`] completes once the source closes (or drops
/// the subscription) and every in-flight delivery has finished. Dropping the
/// handle does not stop the loop.
///
/// # Errors
///
/// - [`Error::InvalidConfig`](crate::Error::InvalidConfig) if `config` fails
///   [`ListenerConfig::validate`]; nothing is subscribed in that case.
/// - The source's error if the subscription cannot be registered.
///
/// # Example
///
/// ```no_run
/// # use std::sync::Arc;
/// # use mom_dispatch::{
/// #     create_memory_source, listen, Callback, CallbackRuntime, Envelope, ListenerConfig,
/// #     MessageDispatcher,
/// # };
/// # async fn example() -> mom_dispatch::Result<()> {
/// let source = create_memory_source("broker").await?;
/// let runtime = Arc::new(CallbackRuntime::new("app"));
/// let dispatcher = MessageDispatcher::with_handler(
///     runtime,
///     Callback::raw(|env: Envelope| async move { Ok(env.payload) }),
/// );
///
/// let config = ListenerConfig::new("orders");
/// let task = listen(source.clone(), &config, dispatcher).await?;
///
/// source.close().await?;
/// let _ = task.await;
/// # Ok(())
/// # }
/// ```
pub async fn listen<L>(
    source: MessageSourcePtr,
    config: &ListenerConfig,
    listener: L,
) -> Result<JoinHandle<()>>
where
    L: MessageListener + 'static,
{
    // ---
    config.validate()?;

    let mut handle = source
        .subscribe(Subscription::from(config.destination.clone()))
        .await?;

    let listener = Arc::new(listener);
    let slots = Arc::new(Semaphore::new(config.concurrency));
    let concurrency = config.concurrency;
    let destination = config.destination.clone();
    let listener_id = config.listener_id.clone();

    let join = tokio::spawn(async move {
        // ---
        crate::log_debug!(
            "[{listener_id}] listening on {destination} (concurrency {concurrency})"
        );

        let mut in_flight = JoinSet::new();

        while let Some(env) = handle.inbox.recv().await {
            if concurrency == 1 {
                deliver(&listener_id, listener.as_ref(), env).await;
                continue;
            }

            // Wait for a free slot; the semaphore is never closed.
            let permit = match slots.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };

            let listener = listener.clone();
            let task_id = listener_id.clone();
            in_flight.spawn(async move {
                deliver(&task_id, listener.as_ref(), env).await;
                drop(permit);
            });

            // Reap finished deliveries so the set does not grow unbounded
            while let Some(done) = in_flight.try_join_next() {
                report_panic(&listener_id, done);
            }
        }

        while let Some(done) = in_flight.join_next().await {
            report_panic(&listener_id, done);
        }

        crate::log_debug!("[{listener_id}] source closed or subscription dropped on {destination}");
    });

    Ok(join)
}

// Deliver one envelope, logging a failure instead of propagating it
async fn deliver<L>(listener_id: &str, listener: &L, env: Envelope)
where
    L: MessageListener + ?Sized,
{
    // ---
    let message_id = env.message_id.clone();

    if let Err(err) = listener.on_message(env).await {
        crate::log_warn!("[{listener_id}] listener failed on message {message_id}: {err}");
    }
}

fn report_panic(listener_id: &str, done: std::result::Result<(), tokio::task::JoinError>) {
    if let Err(err) = done {
        crate::log_error!("[{listener_id}] delivery task aborted: {err}");
    }
}
