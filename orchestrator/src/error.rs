//! Error types for agents and the workflow engine

use thiserror::Error;

/// Fatal failure of an agent invocation
///
/// Ordinary negative answers (missing fields, unknown keys) are returned as
/// `{"status": "error", ...}` values instead; this type is reserved for
/// failures the caller cannot interpret as an answer.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    #[error("Agent invocation nested deeper than {0} levels")]
    DepthExceeded(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    Execution(String),

    #[error("Agent execution failed: {0}")]
    TaskFailed(String),
}

/// Errors from workflow lifecycle operations
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Missing {0}")]
    MissingField(&'static str),

    #[error("Unknown workflow: {name}")]
    UnknownTemplate {
        name: String,
        available: Vec<String>,
    },

    #[error("Unknown workflow ID: {0}")]
    UnknownInstance(String),

    #[error("Workflow is not running: {0}")]
    NotRunning(String),

    #[error("Workflow has no more steps: {0}")]
    Exhausted(String),

    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    #[error("Workflow parameters must be a JSON object")]
    InvalidParameters,

    #[error("Workflow state lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("Failed to load workflow template from {path}: {message}")]
    TemplateLoad { path: String, message: String },
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
