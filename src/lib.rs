//! Dispatch messages from a message source to handlers held by an embedded
//! runtime.
//!
//! The crate is built around one seam: a [`MessageDispatcher`] receives a
//! delivered [`Envelope`] and calls [`Runtime::invoke`] with the attached
//! handler and that message, nothing more. Runtime failures come back to the
//! caller unchanged inside [`DispatchError::Invocation`].
//!
//! Around that seam the crate provides:
//! - the [`MessageSource`] abstraction and an in-memory reference source
//! - the [`MessageListener`] callback contract and the [`listen`] delivery loop
//! - [`CallbackRuntime`], a runtime whose handlers are async Rust callbacks
//!

// Import all sub modules once...
mod dispatcher;
mod domain;
mod listener;
mod listener_config;
mod macros;
mod runtime;
mod source;

mod error;
mod message_id;

pub(crate) use macros::{log_debug, log_error, log_warn};

// Re-export main types
pub use dispatcher::MessageDispatcher;
pub use listener::{listen, MessageListener};
pub use listener_config::{ListenerConfig, ListenerConfigBuilder, DEFAULT_CONCURRENCY};

pub use runtime::{
    //
    BoxFuture,
    Callback,
    CallbackFn,
    CallbackRuntime,
    Runtime,
    RuntimeError,
    RuntimePtr,
};

pub use error::{DispatchError, Error, Result};
pub use message_id::MessageId;

pub use source::{
    //
    create_memory_source,
    create_memory_source_with_capacity,
    DEFAULT_INBOX_CAPACITY,
};

// --- public re-exports
pub use domain::{
    //
    Destination,
    Envelope,
    MessageSource,
    MessageSourcePtr,
    Subscription,
    SubscriptionHandle,
};
