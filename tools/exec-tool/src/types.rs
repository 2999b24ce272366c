//! Configuration, replies and errors of the run_command tool

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tool_common::{IntoToolError, ToolError};

/// Commands no caller may run, whatever `SafeToAutoRun` says
const DEFAULT_DENY: &[&str] = &[
    r"\brm\s+-[A-Za-z]*[rf][A-Za-z]*\s+/(\s|$)",
    r"\bmkfs(\.\w+)?\b",
    r"\bdd\b.*\bof=/dev/",
    r":\(\)\s*\{.*:\s*\|\s*:.*\}",
    r"^\s*(sudo\s+)?(shutdown|reboot|halt|poweroff)\b",
    r">\s*/dev/(sd|hd|nvme)",
];

/// `[exec]` section of the hub config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub guard: GuardConfig,

    /// Hard cap on a blocking command
    #[serde(default = "default_blocking_timeout")]
    pub blocking_timeout_secs: u64,

    /// Per-stream cap on captured stdout/stderr
    #[serde(default = "default_max_output")]
    pub max_output_bytes: usize,

    #[serde(default)]
    pub env: EnvOverrides,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    #[serde(default = "default_shell")]
    pub shell: String,

    /// When non-empty, a command must match one of these
    #[serde(default)]
    pub allow: Vec<String>,

    /// Checked before `allow`
    #[serde(default = "default_deny")]
    pub deny: Vec<String>,
}

/// Environment changes applied to every spawned command
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvOverrides {
    #[serde(default)]
    pub set: HashMap<String, String>,
    #[serde(default)]
    pub unset: Vec<String>,
}

fn default_shell() -> String {
    "/bin/sh".to_string()
}

fn default_deny() -> Vec<String> {
    DEFAULT_DENY.iter().map(|p| p.to_string()).collect()
}

fn default_blocking_timeout() -> u64 {
    300
}

fn default_max_output() -> usize {
    1 << 20
}

impl Default for Config {
    fn default() -> Self {
        Self {
            guard: GuardConfig::default(),
            blocking_timeout_secs: default_blocking_timeout(),
            max_output_bytes: default_max_output(),
            env: EnvOverrides::default(),
        }
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            shell: default_shell(),
            allow: Vec::new(),
            deny: default_deny(),
        }
    }
}

/// Reply of a `run_command` call, tagged by `status`
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CommandReply {
    /// Not marked safe; nothing was started
    WaitingForApproval {
        message: String,
        command_line: String,
        cwd: String,
    },
    Completed {
        command_id: String,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
        truncated: bool,
    },
    /// Still running after the observation window
    Running { command_id: String, message: String },
}

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("Command denied: {0}")]
    Denied(String),

    #[error("Working directory not found: {0}")]
    MissingCwd(String),

    #[error("Command timed out after {0}s")]
    TimedOut(u64),

    #[error("Failed to run command: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid {kind} pattern: {message}")]
    InvalidPattern { kind: &'static str, message: String },
}

impl IntoToolError for ExecError {
    fn into_tool_error(self) -> ToolError {
        ToolError::Execution(self.to_string())
    }
}
