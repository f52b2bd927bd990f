// src/runtime/callback.rs

//! In-process runtime whose handlers are async Rust callbacks.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use super::Runtime;
use crate::Envelope;

/// Boxed future returned by [`CallbackFn::call`].
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors raised while invoking a [`Callback`].
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The runtime was shut down before the invocation started
    #[error("runtime is shut down")]
    ShutDown,

    /// The message payload could not be decoded for a typed callback
    #[error("failed to decode message payload: {0}")]
    Decode(#[source] serde_json::Error),

    /// The callback result could not be encoded
    #[error("failed to encode handler result: {0}")]
    Encode(String),

    /// The callback itself reported a failure
    #[error("handler failed: {0}")]
    Handler(String),
}

impl RuntimeError {
    /// Shorthand for [`RuntimeError::Handler`].
    pub fn handler(msg: impl Into<String>) -> Self {
        RuntimeError::Handler(msg.into())
    }
}

/// Type-erased callback body.
///
/// Implemented for the wrappers built by [`Callback::raw`] and
/// [`Callback::json`]; implement it directly for handlers that carry their
/// own state and wrap them with [`Callback::from_fn`].
///
/// # Example
///
/// ```
/// use std::sync::atomic::{AtomicU64, Ordering};
/// use std::sync::Arc;
///
/// use bytes::Bytes;
/// use mom_dispatch::{BoxFuture, Callback, CallbackFn, Envelope, RuntimeError};
///
/// struct Sequencer {
///     next: AtomicU64,
/// }
///
/// impl CallbackFn for Sequencer {
///     fn call(&self, _message: Envelope) -> BoxFuture<'static, Result<Bytes, RuntimeError>> {
///         let seq = self.next.fetch_add(1, Ordering::Relaxed);
///         Box::pin(async move { Ok(Bytes::from(seq.to_string())) })
///     }
/// }
///
/// let handler = Callback::from_fn(Arc::new(Sequencer { next: AtomicU64::new(0) }));
/// # let _ = handler;
/// ```
pub trait CallbackFn: Send + Sync {
    fn call(&self, message: Envelope) -> BoxFuture<'static, Result<Bytes, RuntimeError>>;
}

// Callback over the raw envelope
struct RawCallback<F, Fut> {
    func: F,
    _phantom: PhantomData<fn() -> Fut>,
}

impl<F, Fut> CallbackFn for RawCallback<F, Fut>
where
    F: Fn(Envelope) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Bytes, RuntimeError>> + Send + 'static,
{
    fn call(&self, message: Envelope) -> BoxFuture<'static, Result<Bytes, RuntimeError>> {
        Box::pin((self.func)(message))
    }
}

// Callback over a JSON-decoded payload
struct JsonCallback<F, Fut, TReq, TResp> {
    func: F,
    _phantom: PhantomData<fn(TReq, TResp, Fut)>,
}

impl<F, Fut, TReq, TResp> CallbackFn for JsonCallback<F, Fut, TReq, TResp>
where
    F: Fn(TReq) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<TResp, RuntimeError>> + Send + 'static,
    TReq: DeserializeOwned + Send + 'static,
    TResp: Serialize + Send + 'static,
{
    fn call(&self, message: Envelope) -> BoxFuture<'static, Result<Bytes, RuntimeError>> {
        // Decode before calling so a bad payload never reaches the handler
        let req: TReq = match serde_json::from_slice(&message.payload) {
            Ok(r) => r,
            Err(e) => return Box::pin(async move { Err(RuntimeError::Decode(e)) }),
        };

        let fut = (self.func)(req);

        Box::pin(async move {
            let resp = fut.await?;
            let bytes =
                serde_json::to_vec(&resp).map_err(|e| RuntimeError::Encode(e.to_string()))?;
            Ok(Bytes::from(bytes))
        })
    }
}

/// Handler value understood by [`CallbackRuntime`].
///
/// Cheap to clone; clones share the same callback body.
///
/// # Example
///
/// ```
/// use mom_dispatch::{Callback, RuntimeError};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Deserialize)]
/// struct Order { qty: u32 }
///
/// #[derive(Serialize)]
/// struct Ack { accepted: bool }
///
/// let handler = Callback::json(|order: Order| async move {
///     if order.qty == 0 {
///         return Err(RuntimeError::handler("empty order"));
///     }
///     Ok(Ack { accepted: true })
/// });
/// # let _ = handler;
/// ```
#[derive(Clone)]
pub struct Callback(Arc<dyn CallbackFn>);

impl Callback {
    // ---

    /// Wrap a callback that receives the whole envelope.
    pub fn raw<F, Fut>(func: F) -> Self
    where
        F: Fn(Envelope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Bytes, RuntimeError>> + Send + 'static,
    {
        Callback(Arc::new(RawCallback {
            func,
            _phantom: PhantomData,
        }))
    }

    /// Wrap a callback that receives the payload decoded from JSON and
    /// returns a value encoded back to JSON.
    pub fn json<F, Fut, TReq, TResp>(func: F) -> Self
    where
        F: Fn(TReq) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<TResp, RuntimeError>> + Send + 'static,
        TReq: DeserializeOwned + Send + 'static,
        TResp: Serialize + Send + 'static,
    {
        Callback(Arc::new(JsonCallback {
            func,
            _phantom: PhantomData,
        }))
    }

    /// Wrap a hand-written [`CallbackFn`].
    pub fn from_fn(body: Arc<dyn CallbackFn>) -> Self {
        Callback(body)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback(..)")
    }
}

/// Runtime that executes [`Callback`] handlers on the invoking task.
///
/// After [`shutdown`](CallbackRuntime::shutdown) every new invocation fails
/// with [`RuntimeError::ShutDown`]; invocations already running complete.
#[derive(Debug)]
pub struct CallbackRuntime {
    name: String,
    shut_down: AtomicBool,
    invocations: AtomicU64,
}

impl CallbackRuntime {
    // ---

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shut_down: AtomicBool::new(false),
            invocations: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stop accepting invocations.
    pub fn shutdown(&self) {
        self.shut_down.store(true, Ordering::Release);
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Number of invocations started so far.
    pub fn invocations(&self) -> u64 {
        self.invocations.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait]
impl Runtime for CallbackRuntime {
    type Handler = Callback;
    type Output = Bytes;
    type Error = RuntimeError;

    async fn invoke(&self, handler: &Callback, message: Envelope) -> Result<Bytes, RuntimeError> {
        // ---
        if self.is_shut_down() {
            return Err(RuntimeError::ShutDown);
        }
        self.invocations.fetch_add(1, Ordering::Relaxed);

        handler.0.call(message).await
    }
}
