//! Side channel for failures that must not abort a digest.

use settle_core::Error;
use tracing::error;

/// Receives watcher, listener and queued-task failures.
pub trait ErrorHandler {
    fn handle(&self, error: &Error);
}

/// Logs every failure through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingErrorHandler;

impl ErrorHandler for TracingErrorHandler {
    fn handle(&self, err: &Error) {
        error!(error = %err, fatal = err.is_fatal(), "scope callback failed");
    }
}

impl<F> ErrorHandler for F
where
    F: Fn(&Error),
{
    fn handle(&self, error: &Error) {
        self(error)
    }
}
