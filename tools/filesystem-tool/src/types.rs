//! Type definitions for the filesystem tools

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tool_common::{IntoToolError, ToolError};

// ============================================================================
// Configuration Types
// ============================================================================

/// Configuration for filesystem access
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub limits: Limits,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Limits {
    /// Largest line span a single view_file call may request
    #[serde(default = "default_max_view_lines")]
    pub max_view_lines: usize,
    /// Maximum file size in bytes for reads and writes
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,
}

fn default_max_view_lines() -> usize {
    200
}

fn default_max_file_size() -> usize {
    10 * 1024 * 1024 // 10MB
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_view_lines: default_max_view_lines(),
            max_file_size: default_max_file_size(),
        }
    }
}

// ============================================================================
// Response Types
// ============================================================================

/// Response for view_file
#[derive(Debug, Serialize, Deserialize)]
pub struct ViewFileResponse {
    pub file_path: String,
    pub start_line: usize,
    pub end_line: usize,
    pub total_lines: usize,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Response for write_to_file
#[derive(Debug, Serialize, Deserialize)]
pub struct WriteToFileResponse {
    pub success: bool,
    pub message: String,
    pub file_path: String,
    pub is_empty: bool,
}

/// Response for edit_file
#[derive(Debug, Serialize, Deserialize)]
pub struct EditFileResponse {
    pub success: bool,
    pub message: String,
    pub file_path: String,
    pub instruction: String,
    pub language: String,
    pub lint_error_ids: Vec<String>,
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum FsError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("File already exists: {0}. Use edit_file tool instead.")]
    AlreadyExists(String),

    #[error("EndLine must be greater than or equal to StartLine")]
    InvertedRange,

    #[error("Cannot view more than {0} lines at once")]
    RangeTooLarge(usize),

    #[error("Editing {0} files is not supported")]
    UnsupportedExtension(String),

    #[error("File too large: {size} bytes (max {max})")]
    FileTooLarge { size: u64, max: usize },

    #[error("Failed to {op} file: {source}")]
    Io {
        op: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    pub(crate) fn io(op: &'static str) -> impl FnOnce(std::io::Error) -> Self {
        move |source| FsError::Io { op, source }
    }
}

impl IntoToolError for FsError {
    fn into_tool_error(self) -> ToolError {
        ToolError::Execution(self.to_string())
    }
}

pub type FsResult<T> = Result<T, FsError>;
