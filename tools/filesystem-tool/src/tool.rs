//! The filesystem handlers exposed as routable [`Tool`]s

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tool_common::{parse_params, CapabilityDescriptor, ResultExt, Tool, ToolError, ToolResult};

use crate::handlers;
use crate::params::{EditFileParams, ViewFileParams, WriteToFileParams};
use crate::types::Config;

const VIEW_FILE_DESCRIPTION: &str = "View the contents of a file. Lines are 0-indexed and the \
    output is the file contents from StartLine to EndLine (inclusive), optionally with a summary \
    of the lines outside that range. At most 200 lines can be viewed at a time.";

const WRITE_TO_FILE_DESCRIPTION: &str = "Create a new file, along with any missing parent \
    directories. Never use this tool to modify or overwrite existing files.";

const EDIT_FILE_DESCRIPTION: &str = "Edit an existing file. Specify only the lines to change and \
    represent all unchanged code with the placeholder {{ ... }}. Files with the .ipynb extension \
    cannot be edited.";

/// Generates a tool struct whose `execute` validates, decodes the typed
/// params and delegates to one handler.
macro_rules! filesystem_tool {
    ($tool:ident, $name:literal, $description:expr, $params:ty, $handler:path) => {
        pub struct $tool {
            descriptor: CapabilityDescriptor,
            config: Arc<Config>,
        }

        impl $tool {
            pub fn new(config: Arc<Config>) -> Self {
                Self {
                    descriptor: CapabilityDescriptor::for_params::<$params>($name, $description),
                    config,
                }
            }
        }

        #[async_trait]
        impl Tool for $tool {
            fn descriptor(&self) -> &CapabilityDescriptor {
                &self.descriptor
            }

            async fn execute(&self, params: Value) -> ToolResult<Value> {
                if let Some(message) = self.validate(&params) {
                    return Err(ToolError::Validation(message));
                }
                let params: $params = parse_params(params)?;
                let response = $handler(&self.config, params)
                    .await
                    .to_tool_err()?;
                Ok(serde_json::to_value(response)?)
            }
        }
    };
}

filesystem_tool!(ViewFileTool, "view_file", VIEW_FILE_DESCRIPTION, ViewFileParams, handlers::view_file);
filesystem_tool!(WriteToFileTool, "write_to_file", WRITE_TO_FILE_DESCRIPTION, WriteToFileParams, handlers::write_to_file);
filesystem_tool!(EditFileTool, "edit_file", EDIT_FILE_DESCRIPTION, EditFileParams, handlers::edit_file);

/// All filesystem tools sharing one config
pub fn filesystem_tools(config: Config) -> Vec<Arc<dyn Tool>> {
    let config = Arc::new(config);
    vec![
        Arc::new(ViewFileTool::new(config.clone())),
        Arc::new(WriteToFileTool::new(config.clone())),
        Arc::new(EditFileTool::new(config)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_names_and_required_params() {
        let tools = filesystem_tools(Config::default());
        let names: Vec<&str> = tools.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["view_file", "write_to_file", "edit_file"]);

        let mut required = tools[1].descriptor().required();
        required.sort();
        assert_eq!(required, vec!["CodeContent", "EmptyFile", "TargetFile"]);
    }

    #[tokio::test]
    async fn test_view_file_tool_reply_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "one\ntwo\n").unwrap();

        let tool = ViewFileTool::new(Arc::new(Config::default()));
        let reply = tool
            .execute(json!({
                "AbsolutePath": path.to_str().unwrap(),
                "StartLine": 0,
                "EndLine": 0,
                "IncludeSummaryOfOtherLines": false,
            }))
            .await
            .unwrap();

        assert_eq!(reply["content"], "one\n");
        assert_eq!(reply["total_lines"], 2);
        assert!(reply.get("summary").is_none());
    }

    #[tokio::test]
    async fn test_write_tool_missing_parameter() {
        let tool = WriteToFileTool::new(Arc::new(Config::default()));
        let err = tool
            .execute(json!({"TargetFile": "/tmp/x", "CodeContent": ""}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing required parameter: EmptyFile");
    }

    #[tokio::test]
    async fn test_edit_tool_not_found_message() {
        let tool = EditFileTool::new(Arc::new(Config::default()));
        let err = tool
            .execute(json!({
                "CodeMarkdownLanguage": "rust",
                "TargetFile": "/no/such/../file.rs",
                "Instruction": "x",
                "TargetLintErrorIds": [],
                "CodeEdit": "y",
            }))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "File not found: /no/such/file.rs");
    }
}
