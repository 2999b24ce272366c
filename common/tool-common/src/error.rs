//! Error handling utilities for tools
//!
//! Provides the shared [`ToolError`] type and traits for converting foreign
//! errors into it, so tool implementations can use `?` freely.

/// Errors a tool can report back to the router
///
/// Every variant is rendered to the client as `{"error": <message>}`.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// A declared-required parameter was absent
    #[error("{0}")]
    Validation(String),

    /// Parameters were present but could not be decoded into the tool's type
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// The tool ran but its underlying work failed
    #[error("{0}")]
    Execution(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Result type for tool operations
pub type ToolResult<T> = Result<T, ToolError>;

/// Trait for converting errors into tool errors
///
/// # Example
///
/// ```rust,ignore
/// use tool_common::{IntoToolError, ToolError};
///
/// impl IntoToolError for MyError {
///     fn into_tool_error(self) -> ToolError {
///         ToolError::Execution(self.to_string())
///     }
/// }
/// ```
pub trait IntoToolError {
    /// Convert this error into a tool error
    fn into_tool_error(self) -> ToolError;
}

impl IntoToolError for std::io::Error {
    fn into_tool_error(self) -> ToolError {
        ToolError::Execution(format!("IO error: {}", self))
    }
}

impl IntoToolError for anyhow::Error {
    fn into_tool_error(self) -> ToolError {
        ToolError::Execution(self.to_string())
    }
}

impl IntoToolError for String {
    fn into_tool_error(self) -> ToolError {
        ToolError::Execution(self)
    }
}

impl IntoToolError for &str {
    fn into_tool_error(self) -> ToolError {
        ToolError::Execution(self.to_string())
    }
}

/// Extension trait for Result types to convert to tool errors
///
/// ```rust,ignore
/// use tool_common::ResultExt;
///
/// let response = handlers::view_file(&config, params).await.to_tool_err()?;
/// ```
pub trait ResultExt<T> {
    /// Convert the error to a tool error
    fn to_tool_err(self) -> Result<T, ToolError>;
}

impl<T, E: IntoToolError> ResultExt<T> for Result<T, E> {
    fn to_tool_err(self) -> Result<T, ToolError> {
        self.map_err(|e| e.into_tool_error())
    }
}
