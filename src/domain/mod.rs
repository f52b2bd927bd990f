//! Domain layer public interface.
//!
//! This module defines the message and message-source abstractions shared by
//! the dispatcher, the listener loop, and concrete sources. It makes no
//! reference to any broker or client library.
//!
//! All domain consumers must import symbols via this module, not by
//! referencing individual files directly.

mod message;
mod source;

// --- Message domain re-exports ---

pub use message::{
    //
    Destination,
    Envelope,
    Subscription,
};

// --- Source domain re-exports ---

pub use source::{
    //
    MessageSource,
    MessageSourcePtr,
    SubscriptionHandle,
};
