//! Exec Tool Library
//!
//! Provides the `run_command` tool: shell command execution with a deny/allow
//! guard, an approval gate for commands not marked safe to auto-run, and
//! non-blocking launch with a short observation window.
//!
//! # Usage
//!
//! ```rust,ignore
//! use exec_tool::{Config, RunCommandTool};
//!
//! let tool = RunCommandTool::with_config(Config::default())?;
//! let reply = tool.execute(serde_json::json!({
//!     "CommandLine": "echo hello",
//!     "Cwd": "/tmp",
//!     "Blocking": true,
//!     "WaitMsBeforeAsync": 0,
//!     "SafeToAutoRun": true,
//! })).await?;
//! ```

pub mod guard;
pub mod handlers;
pub mod params;
pub mod tool;
pub mod types;

pub use guard::CommandGuard;
pub use params::RunCommandParams;
pub use tool::RunCommandTool;
pub use types::{CommandReply, Config, ExecError};
