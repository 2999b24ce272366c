//! The tool contract
//!
//! Every capability provider the router can call implements [`Tool`]. Tools
//! are invoked with a JSON parameter object and return either a JSON result
//! or a [`ToolError`], which the router renders as `{"error": ...}`.

use async_trait::async_trait;
use serde_json::Value;

use crate::descriptor::CapabilityDescriptor;
use crate::error::ToolResult;

/// A capability invocable by name from an inline tool call
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: the tool registry is shared by all
/// connections and tools may be called concurrently.
///
/// # Implementation
///
/// ```rust,ignore
/// #[async_trait]
/// impl Tool for ViewFileTool {
///     fn descriptor(&self) -> &CapabilityDescriptor {
///         &self.descriptor
///     }
///
///     async fn execute(&self, params: Value) -> ToolResult<Value> {
///         let params: ViewFileParams = parse_params(params)?;
///         // ...
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name, description and parameter schema of this tool
    fn descriptor(&self) -> &CapabilityDescriptor;

    /// The tool name as used in inline calls
    fn name(&self) -> &str {
        self.descriptor().name()
    }

    /// Check declared-required parameters without executing
    fn validate(&self, params: &Value) -> Option<String> {
        self.descriptor().validate(params)
    }

    /// Execute the tool with the given parameters
    async fn execute(&self, params: Value) -> ToolResult<Value>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use serde_json::json;

    struct TestTool {
        descriptor: CapabilityDescriptor,
    }

    impl TestTool {
        fn new() -> Self {
            Self {
                descriptor: CapabilityDescriptor::new(
                    "test_tool",
                    "A tool for tests",
                    json!({"type": "object", "required": ["Input"]}),
                ),
            }
        }
    }

    #[async_trait]
    impl Tool for TestTool {
        fn descriptor(&self) -> &CapabilityDescriptor {
            &self.descriptor
        }

        async fn execute(&self, params: Value) -> ToolResult<Value> {
            if let Some(message) = self.validate(&params) {
                return Err(ToolError::Validation(message));
            }
            Ok(json!({"echo": params["Input"]}))
        }
    }

    #[test]
    fn test_name_comes_from_descriptor() {
        assert_eq!(TestTool::new().name(), "test_tool");
    }

    #[test]
    fn test_validate_default_uses_descriptor() {
        let tool = TestTool::new();
        assert!(tool.validate(&json!({})).is_some());
        assert!(tool.validate(&json!({"Input": 1})).is_none());
    }

    #[test]
    fn test_execute_blocking_harness() {
        let tool = TestTool::new();
        let result = tokio_test::block_on(tool.execute(json!({"Input": "hi"}))).unwrap();
        assert_eq!(result["echo"], "hi");
    }

    #[tokio::test]
    async fn test_execute_rejects_missing_param() {
        let tool = TestTool::new();
        let result = tool.execute(json!({})).await;
        assert!(matches!(result, Err(ToolError::Validation(_))));
    }
}
