use research_llm::GatewayError;
use thiserror::Error;

use crate::collaboration::StoreError;
use crate::collaborators::CollaboratorError;

/// Errors a capability module surfaces to its caller.
///
/// Decode failures never appear here; they are absorbed by each module's
/// fallback branch.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("LLM call failed: {0}")]
    Gateway(#[from] GatewayError),

    #[error("External lookup failed: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Validation(String),

    #[error("{context}: {source}")]
    Operation {
        context: String,
        #[source]
        source: Box<AgentError>,
    },
}

impl AgentError {
    pub fn validation(message: impl Into<String>) -> Self {
        AgentError::Validation(message.into())
    }

    /// Prefix an error with what the operation was trying to do.
    pub fn context(self, context: impl Into<String>) -> Self {
        AgentError::Operation {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// True when the request was rejected before any remote call.
    pub fn is_validation(&self) -> bool {
        match self {
            AgentError::Validation(_) => true,
            AgentError::Operation { source, .. } => source.is_validation(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;

/// Reject blank required request fields.
pub fn require_non_empty(fields: &[(&str, &str)]) -> Result<()> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else if missing.len() == 1 {
        Err(AgentError::validation(format!("{} is required", missing[0])))
    } else {
        Err(AgentError::validation(format!(
            "{} are required",
            missing.join(", ")
        )))
    }
}
