//! Message dispatcher.
//!
//! Bridges messages delivered by a message source to a handler held by a
//! [`Runtime`]. The dispatcher is a pass-through: it performs no logging,
//! retry, acknowledgment, or error translation. Every runtime failure
//! reaches the caller as the runtime raised it.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{DispatchError, Envelope, MessageListener, Runtime, RuntimePtr};

/// Dispatches each delivered message to the attached handler.
///
/// Wiring is either single-phase ([`with_handler`](Self::with_handler)) or
/// two-phase ([`new`](Self::new) followed by
/// [`attach_handler`](Self::attach_handler)). A message delivered before a
/// handler is attached fails with [`DispatchError::HandlerNotAttached`]
/// without calling the runtime.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use bytes::Bytes;
/// use mom_dispatch::{Callback, CallbackRuntime, Destination, Envelope, MessageDispatcher};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let runtime = Arc::new(CallbackRuntime::new("app"));
/// let dispatcher = MessageDispatcher::new(runtime);
///
/// dispatcher.attach_handler(Callback::raw(|env: Envelope| async move { Ok(env.payload) }));
///
/// dispatcher
///     .on_message(Envelope::new(Destination::from("orders"), Bytes::from_static(b"hi")))
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct MessageDispatcher<R: Runtime> {
    // ---
    runtime: RuntimePtr<R>,
    handler: RwLock<Option<Arc<R::Handler>>>,
}

// Acquire lock guards, ignoring poisoning
fn read_ignore_poison<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write_ignore_poison<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl<R: Runtime> MessageDispatcher<R> {
    // ---

    /// Create a dispatcher with no handler attached.
    pub fn new(runtime: RuntimePtr<R>) -> Self {
        // ---
        Self {
            runtime,
            handler: RwLock::new(None),
        }
    }

    /// Create a dispatcher with its handler already attached.
    pub fn with_handler(runtime: RuntimePtr<R>, handler: R::Handler) -> Self {
        // ---
        Self {
            runtime,
            handler: RwLock::new(Some(Arc::new(handler))),
        }
    }

    /// Attach the handler, replacing any previous one.
    ///
    /// Deliveries already in flight keep the handler they started with.
    pub fn attach_handler(&self, handler: R::Handler) {
        // ---
        *write_ignore_poison(&self.handler) = Some(Arc::new(handler));
    }

    /// Whether a handler has been attached.
    pub fn is_attached(&self) -> bool {
        read_ignore_poison(&self.handler).is_some()
    }

    /// The runtime this dispatcher invokes.
    pub fn runtime(&self) -> &RuntimePtr<R> {
        &self.runtime
    }

    /// Forward `message` to the runtime together with the attached handler.
    ///
    /// The runtime is called exactly once per message. Its return value is
    /// discarded.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::HandlerNotAttached`] if no handler was attached; the
    ///   runtime is not called.
    /// - [`DispatchError::Invocation`] carrying the runtime's error unchanged.
    pub async fn on_message(&self, message: Envelope) -> Result<(), DispatchError<R::Error>> {
        // ---
        // Snapshot the handler so no lock is held across the invocation
        let handler = read_ignore_poison(&self.handler).clone();
        let Some(handler) = handler else {
            return Err(DispatchError::HandlerNotAttached);
        };

        self.runtime
            .invoke(&handler, message)
            .await
            .map(|_output| ())
            .map_err(DispatchError::Invocation)
    }
}

#[async_trait::async_trait]
impl<R: Runtime> MessageListener for MessageDispatcher<R> {
    type Error = DispatchError<R::Error>;

    async fn on_message(&self, message: Envelope) -> Result<(), Self::Error> {
        MessageDispatcher::on_message(self, message).await
    }
}
