use thiserror::Error;

/// Errors raised by message sources, the listener loop, and configuration.
///
/// Handler failures never appear here; they travel through
/// [`DispatchError`] unchanged.
#[derive(Error, Debug)]
pub enum Error {
    /// The message source was closed
    #[error("message source closed")]
    SourceClosed,

    /// A required configuration value was not provided
    #[error("missing configuration: {0}")]
    MissingConfig(String),

    /// A configuration value is out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON serialization or deserialization failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for source and listener operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failure of a single message dispatch.
///
/// `E` is the error type of the runtime the dispatcher invokes. A runtime
/// failure is carried as-is: its `Display` and `source()` are forwarded
/// without any wrapping text.
#[derive(Error, Debug)]
pub enum DispatchError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// A message arrived before any handler was attached
    #[error("no handler attached to dispatcher")]
    HandlerNotAttached,

    /// The runtime invocation failed
    #[error(transparent)]
    Invocation(E),
}

impl<E> DispatchError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Returns the runtime error, if this failure came from the invocation.
    pub fn into_invocation(self) -> Option<E> {
        // ---
        match self {
            DispatchError::Invocation(err) => Some(err),
            DispatchError::HandlerNotAttached => None,
        }
    }

    /// Borrow the runtime error, if this failure came from the invocation.
    pub fn invocation(&self) -> Option<&E> {
        // ---
        match self {
            DispatchError::Invocation(err) => Some(err),
            DispatchError::HandlerNotAttached => None,
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[derive(Error, Debug, PartialEq)]
    #[error("boom: {0}")]
    struct Boom(u32);

    #[test]
    fn test_invocation_display_is_transparent() {
        // ---
        let err: DispatchError<Boom> = DispatchError::Invocation(Boom(7));
        assert_eq!(err.to_string(), "boom: 7");
        assert_eq!(err.into_invocation(), Some(Boom(7)));
    }

    #[test]
    fn test_error_display() {
        // ---
        let json_err = serde_json::from_str::<u32>("x").expect_err("not a number");
        let json_text = json_err.to_string();

        let all = [
            Error::SourceClosed,
            Error::MissingConfig("destination".into()),
            Error::InvalidConfig("concurrency".into()),
            Error::from(json_err),
        ];

        // No wildcard arm: a new variant has to be listed here
        for err in &all {
            let expected = match err {
                Error::SourceClosed => "message source closed".to_string(),
                Error::MissingConfig(_) => "missing configuration: destination".to_string(),
                Error::InvalidConfig(_) => "invalid configuration: concurrency".to_string(),
                Error::Serialization(_) => format!("serialization error: {json_text}"),
            };
            assert_eq!(err.to_string(), expected);
        }
    }

    #[test]
    fn test_not_attached_has_no_invocation() {
        // ---
        let err: DispatchError<Boom> = DispatchError::HandlerNotAttached;
        assert!(err.invocation().is_none());
        assert_eq!(err.to_string(), "no handler attached to dispatcher");
    }
}
