//! Errors surfaced by engine entry points.

use crate::behavior::TableError;
use crate::error::{ErrorSeverity, GameError};
use crate::state::{AgentId, Archetype};

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// The phase library failed validation while the engine was built.
    #[error(transparent)]
    Table(#[from] TableError),

    /// A spawn named an owner that no longer resolves.
    #[error("owner {0} does not resolve")]
    UnknownAgent(AgentId),

    /// The owner already tracks the maximum number of children.
    #[error("{owner} cannot own another {archetype:?}")]
    ChildCapacity { owner: AgentId, archetype: Archetype },
}

impl GameError for EngineError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            EngineError::Table(error) => error.severity(),
            EngineError::UnknownAgent(_) => ErrorSeverity::Recoverable,
            EngineError::ChildCapacity { .. } => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            EngineError::Table(error) => error.error_code(),
            EngineError::UnknownAgent(_) => "ENGINE_UNKNOWN_AGENT",
            EngineError::ChildCapacity { .. } => "ENGINE_CHILD_CAPACITY",
        }
    }
}
