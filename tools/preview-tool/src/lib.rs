//! Preview Tool Library
//!
//! Provides the `browser_preview` tool, which registers a preview of a local
//! web server for the client to open. Nothing is launched on the host.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tool_common::{parse_params, CapabilityDescriptor, Tool, ToolError, ToolResult};

static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").expect("Invalid URL regex"));

const DESCRIPTION: &str = "Spin up a browser preview for a web server. The preview is not \
    opened automatically; the user opens it from the client.";

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct BrowserPreviewParams {
    #[schemars(
        description = "URL of the target web server, with scheme, host and port but no path"
    )]
    pub url: String,

    #[schemars(description = "A short 3-5 word title-cased name for the target web server")]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BrowserPreviewResponse {
    pub success: bool,
    pub message: String,
    pub preview_url: String,
    pub preview_name: String,
}

/// Check a URL against the accepted `http(s)://host...` shape
pub fn validate_url(url: &str) -> bool {
    URL_REGEX.is_match(url)
}

pub struct BrowserPreviewTool {
    descriptor: CapabilityDescriptor,
}

impl BrowserPreviewTool {
    pub fn new() -> Self {
        Self {
            descriptor: CapabilityDescriptor::for_params::<BrowserPreviewParams>(
                "browser_preview",
                DESCRIPTION,
            ),
        }
    }
}

impl Default for BrowserPreviewTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for BrowserPreviewTool {
    fn descriptor(&self) -> &CapabilityDescriptor {
        &self.descriptor
    }

    async fn execute(&self, params: Value) -> ToolResult<Value> {
        if let Some(message) = self.validate(&params) {
            return Err(ToolError::Validation(message));
        }
        let params: BrowserPreviewParams = parse_params(params)?;

        if !validate_url(&params.url) {
            return Err(ToolError::Execution("Invalid URL format".to_string()));
        }

        tracing::info!(url = %params.url, name = %params.name, "browser preview registered");

        let response = BrowserPreviewResponse {
            success: true,
            message: format!("Browser preview created for {} at {}", params.name, params.url),
            preview_url: params.url,
            preview_name: params.name,
        };
        Ok(serde_json::to_value(response)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("http://localhost:8080"));
        assert!(validate_url("https://127.0.0.1:3000"));
        assert!(!validate_url("ftp://localhost"));
        assert!(!validate_url("http://"));
        assert!(!validate_url("localhost:8080"));
        assert!(!validate_url("http://local host"));
    }

    #[tokio::test]
    async fn test_preview_success() {
        let tool = BrowserPreviewTool::new();
        let reply = tool
            .execute(json!({"Url": "http://localhost:8080", "Name": "Dev Server"}))
            .await
            .unwrap();

        assert_eq!(reply["success"], true);
        assert_eq!(
            reply["message"],
            "Browser preview created for Dev Server at http://localhost:8080"
        );
        assert_eq!(reply["preview_url"], "http://localhost:8080");
        assert_eq!(reply["preview_name"], "Dev Server");
    }

    #[tokio::test]
    async fn test_preview_invalid_url() {
        let tool = BrowserPreviewTool::new();
        let err = tool
            .execute(json!({"Url": "not a url", "Name": "X"}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid URL format");
    }

    #[tokio::test]
    async fn test_preview_missing_name() {
        let tool = BrowserPreviewTool::new();
        let err = tool
            .execute(json!({"Url": "http://localhost"}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing required parameter: Name");
    }
}
