//! Runtime invocation interface.
//!
//! A runtime is the execution environment that owns handler code. The
//! dispatcher never looks inside a handler; it hands the handler value and
//! the delivered message back to the runtime that understands them.
//!
//! This module defines the [`Runtime`] contract and ships one in-process
//! implementation, [`CallbackRuntime`], whose handlers are async Rust
//! callbacks.

mod callback;

use std::sync::Arc;

use crate::Envelope;

pub use callback::{BoxFuture, Callback, CallbackFn, CallbackRuntime, RuntimeError};

/// Invocation entry point of an embedded runtime.
///
/// `invoke(handler, message)` runs `handler` with `message` as its sole
/// argument. The shape of `Handler` is private to the runtime; callers only
/// move it around.
///
/// Implementations decide their own thread-safety story for concurrent
/// invocations. The dispatcher calls `invoke` from whatever task delivered
/// the message and may call it concurrently from several tasks.
///
/// # Notes
///
/// This trait uses `async_trait`; the expanded documentation shows a boxed
/// `Future`. Treat `invoke` as a normal `async fn`.
#[async_trait::async_trait]
pub trait Runtime: Send + Sync {
    // ---
    /// Opaque handler value meaningful only to this runtime.
    type Handler: Send + Sync + 'static;

    /// Value produced by a successful invocation.
    type Output: Send;

    /// Failure raised by an invocation.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Invoke `handler` with `message`.
    async fn invoke(
        &self,
        handler: &Self::Handler,
        message: Envelope,
    ) -> Result<Self::Output, Self::Error>;
}

/// Shared runtime pointer.
///
/// The dispatcher holds one of these and never creates or tears down the
/// runtime behind it.
pub type RuntimePtr<R> = Arc<R>;
