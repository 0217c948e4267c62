//! Error types for the overview cache.

use std::sync::Arc;

use thiserror::Error;

/// The injected overview fetch failed.
///
/// Cloneable so one failure can be delivered to every caller waiting on the
/// same coalesced fetch. The cache stores nothing on failure, so a held
/// entry survives a failed refresh.
#[derive(Debug, Clone, Error)]
#[error("overview fetch failed: {source}")]
pub struct FetchError {
    source: Arc<dyn std::error::Error + Send + Sync + 'static>,
}

impl FetchError {
    /// Wrap the underlying cause of a failed fetch.
    pub fn new<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            source: Arc::new(source),
        }
    }

    /// Wrap a plain message, for fetch functions without a structured cause.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(std::io::Error::other(message.into()))
    }
}
