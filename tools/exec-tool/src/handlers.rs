//! Command execution handlers
//!
//! The guard is consulted before anything is spawned. Blocking commands run
//! to completion under the configured hard timeout; non-blocking commands are
//! observed for `WaitMsBeforeAsync` milliseconds and then left running in the
//! background, tracked by the [`ProcessTable`].

use std::collections::HashMap;
use std::path::Path;
use std::process::{Output, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tokio::process::Command;
use tokio::task::JoinHandle;

use crate::guard::CommandGuard;
use crate::params::RunCommandParams;
use crate::types::{CommandReply, Config, ExecError};

type BackgroundCommand = JoinHandle<std::io::Result<Output>>;

/// Background commands owned by one tool instance
///
/// Finished entries are reaped whenever a new command is launched.
#[derive(Default)]
pub struct ProcessTable {
    counter: AtomicU64,
    running: Mutex<HashMap<String, BackgroundCommand>>,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint the next `cmd_<n>` identifier
    fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("cmd_{}", n)
    }

    fn track(&self, command_id: String, handle: BackgroundCommand) {
        if let Ok(mut running) = self.running.lock() {
            running.retain(|_, h| !h.is_finished());
            running.insert(command_id, handle);
        }
    }

    /// Number of background commands that have not exited yet
    pub fn running_count(&self) -> usize {
        self.running
            .lock()
            .map(|running| running.values().filter(|h| !h.is_finished()).count())
            .unwrap_or(0)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Truncate output to max bytes, decoding lossily
fn truncate_output(output: &[u8], max_bytes: usize) -> (String, bool) {
    if output.len() <= max_bytes {
        (String::from_utf8_lossy(output).to_string(), false)
    } else {
        (String::from_utf8_lossy(&output[..max_bytes]).to_string(), true)
    }
}

fn completed(command_id: String, output: Output, config: &Config) -> CommandReply {
    let (stdout, stdout_truncated) =
        truncate_output(&output.stdout, config.max_output_bytes);
    let (stderr, stderr_truncated) =
        truncate_output(&output.stderr, config.max_output_bytes);

    CommandReply::Completed {
        command_id,
        exit_code: output.status.code(),
        stdout,
        stderr,
        truncated: stdout_truncated || stderr_truncated,
    }
}

fn build_command(guard: &CommandGuard, config: &Config, command_line: &str, cwd: &Path) -> Command {
    let mut cmd = Command::new(guard.shell());
    cmd.arg("-c")
        .arg(command_line)
        .current_dir(cwd)
        .env("PAGER", "cat")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    for (key, value) in &config.env.set {
        cmd.env(key, value);
    }
    for key in &config.env.unset {
        cmd.env_remove(key);
    }

    cmd
}

// ============================================================================
// Handler
// ============================================================================

pub async fn run_command(
    guard: &CommandGuard,
    config: &Config,
    table: &ProcessTable,
    params: RunCommandParams,
) -> Result<CommandReply, ExecError> {
    if !params.safe_to_auto_run {
        return Ok(CommandReply::WaitingForApproval {
            message: "This command requires user approval before execution.".to_string(),
            command_line: params.command_line,
            cwd: params.cwd,
        });
    }

    guard.check(&params.command_line)?;

    let cwd = Path::new(&params.cwd);
    let is_dir = tokio::fs::metadata(cwd)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);
    if !is_dir {
        return Err(ExecError::MissingCwd(params.cwd));
    }

    let command_id = table.next_id();
    let mut cmd = build_command(guard, config, &params.command_line, cwd);

    if params.blocking {
        cmd.kill_on_drop(true);
        let timeout_secs = config.blocking_timeout_secs;
        let output = tokio::time::timeout(Duration::from_secs(timeout_secs), cmd.output())
            .await
            .map_err(|_| ExecError::TimedOut(timeout_secs))??;

        tracing::debug!(%command_id, code = ?output.status.code(), "blocking command finished");
        return Ok(completed(command_id, output, config));
    }

    let child = cmd.spawn()?;
    let mut handle: BackgroundCommand = tokio::spawn(child.wait_with_output());

    if params.wait_ms_before_async > 0 {
        let window = Duration::from_millis(params.wait_ms_before_async);
        if let Ok(joined) = tokio::time::timeout(window, &mut handle).await {
            let output = joined
                .map_err(|e| ExecError::Io(std::io::Error::other(e.to_string())))??;
            return Ok(completed(command_id, output, config));
        }
    }

    tracing::info!(%command_id, command = %params.command_line, "command running in background");
    table.track(command_id.clone(), handle);

    Ok(CommandReply::Running {
        message: format!("Command started with ID {}", command_id),
        command_id,
    })
}
