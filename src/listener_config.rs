//! Listener configuration.
//!
//! Settings consumed by [`listen`](crate::listen). The dispatcher itself takes
//! no configuration; everything here shapes the delivery loop around it.

use tokio::sync::Semaphore;

use crate::{Destination, Error, Result};

/// Default number of deliveries a listener runs at once.
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Configuration for a single listener registration.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    // ---
    /// Destination to subscribe to.
    pub destination: Destination,

    /// Maximum number of messages delivered to the listener at the same time.
    ///
    /// With `1` messages are delivered sequentially in arrival order.
    pub concurrency: usize,

    /// Identifier used in log lines.
    pub listener_id: String,
}

impl ListenerConfig {
    /// Sequential listener on `destination`, identified by the destination name.
    pub fn new(destination: impl Into<Destination>) -> Self {
        let destination = destination.into();
        Self {
            listener_id: destination.to_string(),
            destination,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Start a [`ListenerConfigBuilder`].
    pub fn builder() -> ListenerConfigBuilder {
        ListenerConfigBuilder::new()
    }

    /// Check that the loop can run with these settings.
    ///
    /// Called by [`ListenerConfigBuilder::build`] and again by
    /// [`listen`](crate::listen), since the fields are public.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] if the destination is empty or `concurrency`
    /// is outside `1..=Semaphore::MAX_PERMITS`.
    pub fn validate(&self) -> Result<()> {
        // ---
        if self.destination.0.is_empty() {
            return Err(Error::InvalidConfig("destination must not be empty".into()));
        }

        if self.concurrency == 0 || self.concurrency > Semaphore::MAX_PERMITS {
            return Err(Error::InvalidConfig(format!(
                "concurrency must be between 1 and {}, got {}",
                Semaphore::MAX_PERMITS,
                self.concurrency
            )));
        }

        Ok(())
    }
}

/// Builder for [`ListenerConfig`].
///
/// # Example
///
/// ```
/// use mom_dispatch::ListenerConfig;
///
/// # fn example() -> mom_dispatch::Result<()> {
/// let config = ListenerConfig::builder()
///     .destination("orders")
///     .concurrency(4)
///     .listener_id("order-listener")
///     .build()?;
///
/// assert_eq!(config.concurrency, 4);
/// # Ok(())
/// # }
/// ```
pub struct ListenerConfigBuilder {
    destination: Option<Destination>,
    concurrency: usize,
    listener_id: Option<String>,
}

impl ListenerConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            destination: None,
            concurrency: DEFAULT_CONCURRENCY,
            listener_id: None,
        }
    }

    /// Set the destination to subscribe to (required).
    pub fn destination(mut self, destination: impl Into<Destination>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    /// Set the number of concurrent deliveries (must be at least 1).
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the identifier used in log lines.
    ///
    /// Defaults to the destination name.
    pub fn listener_id(mut self, id: impl Into<String>) -> Self {
        self.listener_id = Some(id.into());
        self
    }

    /// Build the configuration (consumes self).
    ///
    /// # Errors
    ///
    /// - [`Error::MissingConfig`] if no destination was set
    /// - [`Error::InvalidConfig`] if the destination is empty or `concurrency`
    ///   is 0 or above [`Semaphore::MAX_PERMITS`]
    pub fn build(self) -> Result<ListenerConfig> {
        // ---
        let destination = self
            .destination
            .ok_or_else(|| Error::MissingConfig("destination".into()))?;

        let listener_id = self
            .listener_id
            .unwrap_or_else(|| destination.to_string());

        let config = ListenerConfig {
            destination,
            concurrency: self.concurrency,
            listener_id,
        };
        config.validate()?;

        Ok(config)
    }
}

impl Default for ListenerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
