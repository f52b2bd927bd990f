// src/domain/message.rs

//! Message domain types.
//!
//! An [`Envelope`] is the unit a message source delivers to a listener. The
//! dispatcher treats it as opaque and forwards it to the runtime unmodified;
//! only runtime handlers interpret the payload.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{MessageId, Result};

/// A message destination.
///
/// A `Destination` names a topic or queue. Its syntax is interpreted only by
/// the message source; at the domain level it is an opaque identifier.
///
/// Destinations are immutable, cheap to clone, and safe to share across
/// threads.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Destination(pub Arc<str>);

impl<T> From<T> for Destination
where
    T: Into<Arc<str>>,
{
    fn from(value: T) -> Self {
        // ---
        Destination(value.into())
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A subscription key.
///
/// How a subscription matches a destination is defined by the message source.
/// The in-memory source provides the reference semantics: exact string
/// equality.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Subscription(pub Arc<str>);

impl From<Destination> for Subscription {
    fn from(destination: Destination) -> Self {
        // ---
        Subscription(destination.0)
    }
}

impl<T> From<T> for Subscription
where
    T: Into<Arc<str>>,
{
    fn from(value: T) -> Self {
        // ---
        Subscription(value.into())
    }
}

/// A delivered message.
///
/// # Examples
///
/// ```
/// # use mom_dispatch::{Envelope, Destination};
/// # use bytes::Bytes;
/// let message = Envelope::new(Destination::from("orders"), Bytes::from_static(b"{}"))
///     .with_content_type("application/json")
///     .with_property("tenant", "acme");
///
/// assert_eq!(message.property("tenant"), Some("acme"));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    // ---
    /// Identifier assigned when the message was created.
    pub message_id: MessageId,

    /// Destination the message was published to.
    pub destination: Destination,

    /// Opaque payload bytes.
    pub payload: Bytes,

    /// Optional application-level correlation identifier.
    pub correlation_id: Option<Arc<str>>,

    /// Optional destination for replies.
    pub reply_to: Option<Destination>,

    /// Optional content type metadata (e.g., "application/json").
    ///
    /// Informational only; nothing in this crate enforces it.
    pub content_type: Option<Arc<str>>,

    /// Application properties attached by the producer.
    pub properties: BTreeMap<String, String>,
}

impl Envelope {
    // ---

    /// Create a message with a fresh [`MessageId`] and no metadata.
    pub fn new(destination: Destination, payload: Bytes) -> Self {
        // ---
        Self {
            message_id: MessageId::generate(),
            destination,
            payload,
            correlation_id: None,
            reply_to: None,
            content_type: None,
            properties: BTreeMap::new(),
        }
    }

    /// Create a message whose payload is `value` encoded as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`](crate::Error::Serialization) if the
    /// value cannot be encoded.
    pub fn json<T: Serialize>(destination: Destination, value: &T) -> Result<Self> {
        // ---
        let bytes = serde_json::to_vec(value)?;
        Ok(Self::new(destination, Bytes::from(bytes)).with_content_type("application/json"))
    }

    pub fn with_correlation_id(mut self, id: impl Into<Arc<str>>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn with_reply_to(mut self, destination: Destination) -> Self {
        self.reply_to = Some(destination);
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<Arc<str>>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Look up an application property.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}
