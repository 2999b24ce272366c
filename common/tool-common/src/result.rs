//! Result helpers for tool replies
//!
//! Helpers for decoding typed parameters and for rendering replies in the
//! wire formats clients expect.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::error::{ToolError, ToolResult};

/// Decode a parameter object into a tool's typed parameter struct
///
/// Missing or mistyped fields surface as [`ToolError::InvalidParams`].
pub fn parse_params<T: DeserializeOwned>(params: Value) -> ToolResult<T> {
    serde_json::from_value(params).map_err(|e| ToolError::InvalidParams(e.to_string()))
}

/// The `{"error": message}` object used for every failed tool call
pub fn error_value(message: impl Into<String>) -> Value {
    json!({ "error": message.into() })
}

/// Wrap a tool reply in its response tag
///
/// ```text
/// <view_file_response>
/// { ...pretty json... }
/// </view_file_response>
/// ```
pub fn format_tool_response(tool_name: &str, response: &Value) -> String {
    let body = serde_json::to_string_pretty(response).unwrap_or_else(|_| response.to_string());
    format!("<{0}_response>\n{1}\n</{0}_response>", tool_name, body)
}
