use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TablewiseError {
    SchemaDiscoveryError(String),
    OrchestrationError(String),
    ValidationError(String),
    ConfigurationError(String),
    PersistenceError(String),
    WorkflowNotFound(String),
}

impl fmt::Display for TablewiseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TablewiseError::SchemaDiscoveryError(msg) => {
                write!(f, "Schema discovery error: {msg}")
            }
            TablewiseError::OrchestrationError(msg) => write!(f, "Orchestration error: {msg}"),
            TablewiseError::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            TablewiseError::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
            TablewiseError::PersistenceError(msg) => write!(f, "Persistence error: {msg}"),
            TablewiseError::WorkflowNotFound(id) => write!(f, "Workflow not found: {id}"),
        }
    }
}

impl std::error::Error for TablewiseError {}

pub type Result<T> = std::result::Result<T, TablewiseError>;
