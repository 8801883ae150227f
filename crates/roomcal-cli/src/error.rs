//! CLI error types.

use std::fmt;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI.
#[derive(Debug)]
pub enum CliError {
    /// Configuration error.
    Config(String),
    /// Fetching the schedule failed.
    Provider(String),
    /// Rendering a calendar failed.
    Render(String),
    /// The server failed or its refresh loop halted.
    Server(String),
    /// A requested room has no document.
    UnknownRoom(String),
    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Provider(msg) => write!(f, "provider error: {}", msg),
            Self::Render(msg) => write!(f, "render error: {}", msg),
            Self::Server(msg) => write!(f, "server error: {}", msg),
            Self::UnknownRoom(room) => write!(f, "unknown room: {}", room),
            Self::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<roomcal_providers::ProviderError> for CliError {
    fn from(err: roomcal_providers::ProviderError) -> Self {
        Self::Provider(err.to_string())
    }
}

impl From<roomcal_core::RenderError> for CliError {
    fn from(err: roomcal_core::RenderError) -> Self {
        Self::Render(err.to_string())
    }
}

impl From<roomcal_server::ServerError> for CliError {
    fn from(err: roomcal_server::ServerError) -> Self {
        match err {
            roomcal_server::ServerError::Config { message } => Self::Config(message),
            roomcal_server::ServerError::Fetch(e) => Self::Provider(e.to_string()),
            roomcal_server::ServerError::Render(e) => Self::Render(e.to_string()),
            other => Self::Server(other.to_string()),
        }
    }
}
