//! Oracle data errors.

use crate::error::{ErrorSeverity, GameError};
use crate::state::Archetype;

/// Errors raised while validating collaborator-supplied data.
///
/// Raised at load time by content loaders; the tick path never produces them.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum OracleError {
    /// A template field is outside its meaningful range.
    #[error("template for {archetype:?} has invalid {field}: {reason}")]
    InvalidTemplate {
        archetype: Archetype,
        field: &'static str,
        reason: &'static str,
    },

    /// A content file names an archetype that does not exist.
    #[error("unknown archetype '{0}'")]
    UnknownArchetype(String),
}

impl GameError for OracleError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            OracleError::InvalidTemplate { .. } => "ORACLE_INVALID_TEMPLATE",
            OracleError::UnknownArchetype(_) => "ORACLE_UNKNOWN_ARCHETYPE",
        }
    }
}
