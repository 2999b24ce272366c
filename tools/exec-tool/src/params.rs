//! Parameter types for the run_command tool

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct RunCommandParams {
    #[schemars(description = "The exact command line string to execute.")]
    pub command_line: String,

    #[schemars(description = "The current working directory for the command")]
    pub cwd: String,

    #[schemars(
        description = "If true, the command will block until it is entirely finished. \
                       Long-running processes such as web servers should be non-blocking."
    )]
    pub blocking: bool,

    #[schemars(
        description = "Only applicable if Blocking is false. Milliseconds to wait after \
                       starting the command before returning while it keeps running."
    )]
    pub wait_ms_before_async: u64,

    #[schemars(
        description = "Set to true only if the command is safe to run WITHOUT user approval. \
                       Commands with destructive side-effects must never be auto-run."
    )]
    pub safe_to_auto_run: bool,
}
