//! Hub configuration
//!
//! Configuration is read from `.agent-hub.toml`, found by walking up from the
//! current directory and then falling back to `~/.config/agent-hub/`. Every
//! section is optional:
//!
//! ```toml
//! [server]
//! host = "localhost"
//! port = 8765
//!
//! [workflow]
//! max_retries = 1
//! step_timeout_secs = 120
//! on_failure = "continue"
//! retention_secs = 3600
//! templates_dir = "workflows"
//!
//! [memory]
//! dir = ".memory"
//!
//! [exec.guard]
//! allow = ["^git\\s", "^cargo\\s"]
//!
//! [filesystem.limits]
//! max_view_lines = 200
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use orchestrator::{OrchestratorConfig, WorkflowPolicy};
use serde::Deserialize;

use crate::error::{HubError, HubResult};

pub const CONFIG_FILE: &str = ".agent-hub.toml";

/// Find a config file by walking up from the cwd, then the global config dir
fn find_config_file(filename: &str) -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let candidate = current.join(filename);
        if candidate.exists() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_path = config_dir.join("agent-hub").join(filename);
        if global_path.exists() {
            return Some(global_path);
        }
    }

    None
}

/// Top-level hub configuration (from .agent-hub.toml)
#[derive(Debug, Default, Deserialize)]
pub struct HubConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub exec: exec_tool::Config,
    #[serde(default)]
    pub filesystem: filesystem_tool::Config,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkflowConfig {
    #[serde(flatten)]
    pub policy: WorkflowPolicy,

    /// Finished instances older than this are pruned; unset keeps them forever
    #[serde(default)]
    pub retention_secs: Option<u64>,

    /// Directory of custom `*.toml` workflow templates
    #[serde(default)]
    pub templates_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_memory_dir")]
    pub dir: PathBuf,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8765
}

fn default_memory_dir() -> PathBuf {
    PathBuf::from(".memory")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            dir: default_memory_dir(),
        }
    }
}

impl HubConfig {
    /// Load the config
    ///
    /// An explicit path must exist. Otherwise the discovered file is used, or
    /// the defaults when there is none.
    pub fn load(explicit: Option<&Path>) -> HubResult<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match find_config_file(CONFIG_FILE) {
                Some(path) => path,
                None => {
                    tracing::debug!("No {} found, using defaults", CONFIG_FILE);
                    return Ok(Self::default());
                }
            },
        };

        tracing::debug!("Loading config from: {}", path.display());
        Self::load_from_path(&path)
    }

    /// Load from a specific path
    pub fn load_from_path(path: &Path) -> HubResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| HubError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| HubError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            memory_dir: self.memory.dir.clone(),
            templates_dir: self.workflow.templates_dir.clone(),
            policy: self.workflow.policy.clone(),
        }
    }

    pub fn retention(&self) -> Option<Duration> {
        self.workflow.retention_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchestrator::OnFailure;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = HubConfig::parse("").unwrap();
        assert_eq!(config.server.host, "localhost");
        assert_eq!(config.server.port, 8765);
        assert_eq!(config.memory.dir, PathBuf::from(".memory"));
        assert_eq!(config.workflow.policy.max_retries, 0);
        assert_eq!(config.workflow.policy.on_failure, OnFailure::Fail);
        assert!(config.retention().is_none());
        assert_eq!(config.exec.blocking_timeout_secs, 300);
    }

    #[test]
    fn test_full_config() {
        let config = HubConfig::parse(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [workflow]
            max_retries = 2
            step_timeout_secs = 30
            on_failure = "continue"
            retention_secs = 600
            templates_dir = "flows"

            [memory]
            dir = "/var/lib/hub"

            [exec.guard]
            allow = ["^git\\s"]
            "#,
        )
        .unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.workflow.policy.max_retries, 2);
        assert_eq!(config.workflow.policy.step_timeout_secs, Some(30));
        assert_eq!(config.workflow.policy.on_failure, OnFailure::Continue);
        assert_eq!(config.retention(), Some(Duration::from_secs(600)));
        assert_eq!(config.exec.guard.allow, vec!["^git\\s"]);

        let orch = config.orchestrator_config();
        assert_eq!(orch.memory_dir, PathBuf::from("/var/lib/hub"));
        assert_eq!(orch.templates_dir, Some(PathBuf::from("flows")));
    }

    #[test]
    fn test_load_from_path_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            HubConfig::load(Some(&missing)),
            Err(HubError::ConfigRead { .. })
        ));

        let bad = dir.path().join("bad.toml");
        let mut file = std::fs::File::create(&bad).unwrap();
        writeln!(file, "[server]\nport = \"high\"").unwrap();
        assert!(matches!(
            HubConfig::load_from_path(&bad),
            Err(HubError::ConfigParse { .. })
        ));
    }
}
