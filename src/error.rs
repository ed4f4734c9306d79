//! Provider failure taxonomy
//!
//! Every Data Provider call resolves to `Result<Value, ProviderError>`.
//! Callers in the context layer never propagate these; they pick a fallback
//! fragment based on [`ProviderError::is_transport`].

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("no such provider: {0}")]
    UnknownProvider(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("call timed out after {0}ms")]
    Timeout(u64),

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("provider channel closed")]
    Closed,

    #[error("remote error {code}: {message}")]
    Remote {
        code: i64,
        message: String,
        data: Option<String>,
    },

    /// The provider answered, but the result carried an `error` key.
    #[error("provider reported: {0}")]
    Application(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl ProviderError {
    /// True for failures of the channel itself, as opposed to a provider
    /// that answered with an error.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ProviderError::UnknownProvider(_)
                | ProviderError::Transport(_)
                | ProviderError::Timeout(_)
                | ProviderError::Protocol(_)
                | ProviderError::Closed
                | ProviderError::Remote { .. }
        )
    }
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;
