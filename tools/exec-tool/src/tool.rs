//! `run_command` as a routable [`Tool`]
//!
//! The struct owns the guard, the config and the background process table;
//! the actual work is delegated to [`handlers::run_command`].

use async_trait::async_trait;
use serde_json::Value;
use tool_common::{parse_params, CapabilityDescriptor, ResultExt, Tool, ToolError, ToolResult};

use crate::guard::CommandGuard;
use crate::handlers::{self, ProcessTable};
use crate::params::RunCommandParams;
use crate::types::{Config, ExecError};

const DESCRIPTION: &str = "Run a shell command on behalf of the user. Commands not marked \
    SafeToAutoRun wait for approval; non-blocking commands return after WaitMsBeforeAsync \
    milliseconds while they keep running.";

pub struct RunCommandTool {
    descriptor: CapabilityDescriptor,
    guard: CommandGuard,
    config: Config,
    processes: ProcessTable,
}

impl RunCommandTool {
    /// Create the tool with the default guard configuration
    pub fn new() -> Result<Self, ExecError> {
        Self::with_config(Config::default())
    }

    /// Create the tool with an explicit config, compiling its guard patterns
    pub fn with_config(config: Config) -> Result<Self, ExecError> {
        let guard = CommandGuard::new(&config)?;

        Ok(Self {
            descriptor: CapabilityDescriptor::for_params::<RunCommandParams>(
                "run_command",
                DESCRIPTION,
            ),
            guard,
            config,
            processes: ProcessTable::new(),
        })
    }

    /// Background commands started by this tool that are still alive
    pub fn running_count(&self) -> usize {
        self.processes.running_count()
    }
}

#[async_trait]
impl Tool for RunCommandTool {
    fn descriptor(&self) -> &CapabilityDescriptor {
        &self.descriptor
    }

    async fn execute(&self, params: Value) -> ToolResult<Value> {
        if let Some(message) = self.validate(&params) {
            return Err(ToolError::Validation(message));
        }
        let params: RunCommandParams = parse_params(params)?;

        let reply = handlers::run_command(&self.guard, &self.config, &self.processes, params)
            .await
            .to_tool_err()?;

        Ok(serde_json::to_value(reply)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_descriptor_requires_all_fields() {
        let tool = RunCommandTool::new().unwrap();
        let mut required = tool.descriptor().required();
        required.sort();
        assert_eq!(
            required,
            vec!["Blocking", "CommandLine", "Cwd", "SafeToAutoRun", "WaitMsBeforeAsync"]
        );
    }

    #[tokio::test]
    async fn test_execute_blocking_echo() {
        let dir = tempfile::tempdir().unwrap();
        let tool = RunCommandTool::new().unwrap();

        let reply = tool
            .execute(json!({
                "CommandLine": "echo hello",
                "Cwd": dir.path().to_str().unwrap(),
                "Blocking": true,
                "WaitMsBeforeAsync": 0,
                "SafeToAutoRun": true,
            }))
            .await
            .unwrap();

        assert_eq!(reply["status"], "completed");
        assert_eq!(reply["command_id"], "cmd_1");
        assert_eq!(reply["exit_code"], 0);
        assert_eq!(reply["stdout"].as_str().unwrap().trim(), "hello");
    }

    #[tokio::test]
    async fn test_execute_waiting_for_approval() {
        let tool = RunCommandTool::new().unwrap();

        let reply = tool
            .execute(json!({
                "CommandLine": "touch x",
                "Cwd": "/tmp",
                "Blocking": true,
                "WaitMsBeforeAsync": 0,
                "SafeToAutoRun": false,
            }))
            .await
            .unwrap();

        assert_eq!(reply["status"], "waiting_for_approval");
        assert_eq!(reply["command_line"], "touch x");
        assert_eq!(reply["cwd"], "/tmp");
    }

    #[tokio::test]
    async fn test_execute_missing_parameter() {
        let tool = RunCommandTool::new().unwrap();
        let err = tool.execute(json!({"CommandLine": "ls"})).await.unwrap_err();
        assert!(err.to_string().starts_with("Missing required parameter:"));
    }

    #[tokio::test]
    async fn test_execute_wrong_type_is_invalid_params() {
        let tool = RunCommandTool::new().unwrap();
        let err = tool
            .execute(json!({
                "CommandLine": "ls",
                "Cwd": "/tmp",
                "Blocking": "yes",
                "WaitMsBeforeAsync": 0,
                "SafeToAutoRun": true,
            }))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Invalid parameters:"));
    }

    #[tokio::test]
    async fn test_execute_denied_command() {
        let tool = RunCommandTool::new().unwrap();
        let err = tool
            .execute(json!({
                "CommandLine": "shutdown -h now",
                "Cwd": "/tmp",
                "Blocking": true,
                "WaitMsBeforeAsync": 0,
                "SafeToAutoRun": true,
            }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Command denied"));
    }
}
