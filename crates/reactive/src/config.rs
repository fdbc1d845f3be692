//! Scope configuration.

use settle_core::{Error, Result};

/// Number of digest passes allowed before a digest is declared unstable.
pub const DEFAULT_DIGEST_TTL: usize = 10;

/// Tunables for a scope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScopeConfig {
    /// Maximum number of passes a single digest may run.
    pub ttl: usize,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_DIGEST_TTL,
        }
    }
}

impl ScopeConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the digest TTL.
    pub fn with_ttl(mut self, ttl: usize) -> Self {
        self.ttl = ttl;
        self
    }

    /// Checks that the configuration can drive a digest.
    pub fn validate(&self) -> Result<()> {
        if self.ttl == 0 {
            return Err(Error::invalid_config("ttl must be at least 1"));
        }
        Ok(())
    }
}
