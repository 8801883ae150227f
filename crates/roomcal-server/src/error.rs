//! Server error types.

use std::io;
use thiserror::Error;

use roomcal_core::RenderError;
use roomcal_providers::ProviderError;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// IO error (listener, signal handlers, etc.).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The upstream schedule could not be fetched or decoded.
    #[error("Fetch failed: {0}")]
    Fetch(#[from] ProviderError),

    /// A calendar document could not be rendered.
    #[error("Render failed: {0}")]
    Render(#[from] RenderError),

    /// The listen address could not be bound.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The refresh scheduler stopped after a failed cycle.
    #[error("Refresh halted: {message}")]
    Halted { message: String },
}

impl ServerError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a bind error.
    pub fn bind(addr: impl Into<String>, source: io::Error) -> Self {
        Self::Bind {
            addr: addr.into(),
            source,
        }
    }

    /// Creates a halted error.
    pub fn halted(message: impl Into<String>) -> Self {
        Self::Halted {
            message: message.into(),
        }
    }
}
