//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from the engine, content loading and hooks so clients can
//! bubble them up with consistent context.

use arena_core::{AgentId, EngineError, ErrorSeverity, GameError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("failed to load content: {0:#}")]
    Content(anyhow::Error),

    #[error("runtime requires a {0} collaborator before building")]
    MissingCollaborator(&'static str),

    #[error("agent {0} does not exist")]
    UnknownAgent(AgentId),

    #[error("critical hook '{hook}' failed: {reason}")]
    Hook { hook: &'static str, reason: String },
}

impl GameError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            RuntimeError::Engine(error) => error.severity(),
            RuntimeError::Content(_) | RuntimeError::MissingCollaborator(_) => {
                ErrorSeverity::Fatal
            }
            RuntimeError::UnknownAgent(_) => ErrorSeverity::Recoverable,
            RuntimeError::Hook { .. } => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            RuntimeError::Engine(error) => error.error_code(),
            RuntimeError::Content(_) => "RUNTIME_CONTENT",
            RuntimeError::MissingCollaborator(_) => "RUNTIME_MISSING_COLLABORATOR",
            RuntimeError::UnknownAgent(_) => "RUNTIME_UNKNOWN_AGENT",
            RuntimeError::Hook { .. } => "RUNTIME_HOOK",
        }
    }
}
