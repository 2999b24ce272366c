//! Allow/deny screening of command lines
//!
//! Deny patterns always win. An empty allow list allows everything that is
//! not denied.

use regex::RegexSet;

use crate::types::{Config, ExecError};

#[derive(Debug, Clone)]
pub struct CommandGuard {
    shell: String,
    deny: RegexSet,
    allow: Option<RegexSet>,
}

impl CommandGuard {
    pub fn new(config: &Config) -> Result<Self, ExecError> {
        let guard = &config.guard;
        let deny = compile("deny", &guard.deny)?;
        let allow = if guard.allow.is_empty() {
            None
        } else {
            Some(compile("allow", &guard.allow)?)
        };

        Ok(Self {
            shell: guard.shell.clone(),
            deny,
            allow,
        })
    }

    pub fn check(&self, command: &str) -> Result<(), ExecError> {
        if let Some(index) = self.deny.matches(command).iter().next() {
            return Err(ExecError::Denied(format!(
                "matches deny pattern {}",
                self.deny.patterns()[index]
            )));
        }

        match &self.allow {
            Some(allow) if !allow.is_match(command) => {
                Err(ExecError::Denied("not on the allow list".to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Shell that interprets `CommandLine`
    pub fn shell(&self) -> &str {
        &self.shell
    }
}

fn compile(kind: &'static str, patterns: &[String]) -> Result<RegexSet, ExecError> {
    RegexSet::new(patterns).map_err(|e| ExecError::InvalidPattern {
        kind,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_deny_list() {
        let guard = CommandGuard::new(&Config::default()).unwrap();

        for command in ["rm -rf /", "rm -fr / --no-preserve-root", "mkfs.ext4 /dev/sda1", "dd if=/dev/zero of=/dev/sda", "shutdown -h now", "sudo reboot", "echo x > /dev/sda"] {
            assert!(
                matches!(guard.check(command), Err(ExecError::Denied(_))),
                "{} should be denied",
                command
            );
        }
    }

    #[test]
    fn test_ordinary_commands_pass() {
        let guard = CommandGuard::new(&Config::default()).unwrap();

        for command in ["ls -la", "echo hello", "cargo build", "rm -rf ./target", "git status"] {
            assert!(guard.check(command).is_ok(), "{} should pass", command);
        }
    }

    #[test]
    fn test_allow_list_restricts() {
        let mut config = Config::default();
        config.guard.allow = vec![r"^git\s".to_string()];
        let guard = CommandGuard::new(&config).unwrap();

        assert!(guard.check("git status").is_ok());
        assert!(matches!(guard.check("npm install"), Err(ExecError::Denied(_))));
    }

    #[test]
    fn test_invalid_pattern() {
        let mut config = Config::default();
        config.guard.deny = vec!["(unclosed".to_string()];
        assert!(matches!(
            CommandGuard::new(&config),
            Err(ExecError::InvalidPattern { kind: "deny", .. })
        ));
    }
}
