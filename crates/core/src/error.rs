//! Error types for the digest core.

use crate::phase::Phase;
use alloc::boxed::Box;
use alloc::string::String;

/// Result type alias for scope operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Failure raised by a user-supplied watch, listener or queued callable.
pub type CallbackError = Box<dyn core::error::Error + 'static>;

/// Error types for scope operations.
///
/// Only `ReentrantPhase`, `UnstableDigest`, `Expression` and `InvalidConfig`
/// are ever returned to a caller. The callable variants are reported through
/// the scope's error handler and never abort a digest.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A phase was entered while another one was active.
    #[error("{attempted} attempted while {active} already in progress")]
    ReentrantPhase { active: Phase, attempted: Phase },
    /// The digest did not converge within the TTL.
    #[error("{ttl} digest iterations reached, aborting")]
    UnstableDigest { ttl: usize },
    /// A watch function failed during a pass.
    #[error("watch function failed: {0}")]
    WatcherEvaluation(CallbackError),
    /// A listener failed during a pass.
    #[error("listener failed: {0}")]
    Listener(CallbackError),
    /// A queued async expression failed.
    #[error("async task failed: {0}")]
    AsyncTask(CallbackError),
    /// A post-digest callback failed.
    #[error("post-digest task failed: {0}")]
    PostDigestTask(CallbackError),
    /// The expression passed to `apply` failed.
    #[error("expression failed: {0}")]
    Expression(CallbackError),
    /// Invalid scope configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl Error {
    /// Creates a reentrant phase error.
    pub fn reentrant_phase(active: Phase, attempted: Phase) -> Self {
        Error::ReentrantPhase { active, attempted }
    }

    /// Creates an unstable digest error.
    pub fn unstable_digest(ttl: usize) -> Self {
        Error::UnstableDigest { ttl }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfig {
            message: message.into(),
        }
    }

    /// Returns true for errors that abort the operation that raised them.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ReentrantPhase { .. } | Error::UnstableDigest { .. } | Error::InvalidConfig { .. }
        )
    }

    /// Returns the failure of the user callable, if this error wraps one.
    pub fn callback_error(&self) -> Option<&CallbackError> {
        match self {
            Error::WatcherEvaluation(e)
            | Error::Listener(e)
            | Error::AsyncTask(e)
            | Error::PostDigestTask(e)
            | Error::Expression(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_error_display() {
        let e = Error::reentrant_phase(Phase::Digest, Phase::Apply);
        assert_eq!(e.to_string(), "apply attempted while digest already in progress");

        let e = Error::unstable_digest(10);
        assert_eq!(e.to_string(), "10 digest iterations reached, aborting");

        let e = Error::Listener("boom".into());
        assert_eq!(e.to_string(), "listener failed: boom");
    }

    #[test]
    fn test_error_fatal_kinds() {
        assert!(Error::unstable_digest(10).is_fatal());
        assert!(Error::reentrant_phase(Phase::Apply, Phase::Digest).is_fatal());
        assert!(!Error::AsyncTask("x".into()).is_fatal());
        assert!(!Error::PostDigestTask("x".into()).is_fatal());
    }

    #[test]
    fn test_callback_error_access() {
        let e = Error::WatcherEvaluation("bad watch".into());
        assert_eq!(e.callback_error().unwrap().to_string(), "bad watch");
        assert!(Error::unstable_digest(3).callback_error().is_none());
    }
}
