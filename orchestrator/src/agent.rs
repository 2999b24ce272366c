//! The agent contract
//!
//! An [`Agent`] is a named, multi-action capability. Each call carries a JSON
//! message whose `action` field selects the behavior, plus an [`AgentContext`]
//! with call metadata and a handle for invoking other agents by name.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tool_common::CapabilityDescriptor;

use crate::error::AgentError;

/// Maximum depth of agent-to-agent invocation chains
pub const MAX_INVOKE_DEPTH: usize = 8;

/// Capability to invoke an agent by name
///
/// Agents receive this instead of a handle to the whole orchestrator, so the
/// only thing they can do with it is call their peers.
#[async_trait]
pub trait AgentInvoker: Send + Sync {
    async fn invoke_agent(
        &self,
        name: &str,
        message: &Value,
        ctx: &AgentContext,
    ) -> Result<Value, AgentError>;
}

/// Ambient metadata for one agent call
#[derive(Clone)]
pub struct AgentContext {
    pub timestamp: DateTime<Utc>,
    pub workflow_id: Option<String>,
    pub step: Option<usize>,
    depth: usize,
    invoker: Arc<dyn AgentInvoker>,
}

impl AgentContext {
    /// Context for a call made outside any workflow
    pub fn new(invoker: Arc<dyn AgentInvoker>) -> Self {
        Self {
            timestamp: Utc::now(),
            workflow_id: None,
            step: None,
            depth: 0,
            invoker,
        }
    }

    /// Context for a workflow step
    pub fn for_step(invoker: Arc<dyn AgentInvoker>, workflow_id: &str, step: usize) -> Self {
        Self {
            workflow_id: Some(workflow_id.to_string()),
            step: Some(step),
            ..Self::new(invoker)
        }
    }

    /// Invoke a peer agent, keeping the workflow metadata of this call
    pub async fn invoke(&self, name: &str, message: &Value) -> Result<Value, AgentError> {
        if self.depth >= MAX_INVOKE_DEPTH {
            return Err(AgentError::DepthExceeded(MAX_INVOKE_DEPTH));
        }

        let nested = Self {
            timestamp: Utc::now(),
            depth: self.depth + 1,
            ..self.clone()
        };
        self.invoker.invoke_agent(name, message, &nested).await
    }
}

impl std::fmt::Debug for AgentContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentContext")
            .field("timestamp", &self.timestamp)
            .field("workflow_id", &self.workflow_id)
            .field("step", &self.step)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

/// A task specialist addressable by name
///
/// # Thread Safety
///
/// The agent registry is shared by every connection and workflow, so agents
/// must be `Send + Sync` and guard any internal state themselves.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Name, description and message schema of this agent
    fn descriptor(&self) -> &CapabilityDescriptor;

    fn name(&self) -> &str {
        self.descriptor().name()
    }

    /// Names of the tools this agent works with
    fn tools(&self) -> Vec<String> {
        Vec::new()
    }

    /// Handle one message
    ///
    /// `Ok` covers every answer including `{"status": "error"}` ones; `Err`
    /// is reserved for failures that should fail a workflow step.
    async fn process(&self, message: &Value, ctx: &AgentContext) -> Result<Value, AgentError>;

    /// Discovery representation: `{name, description, tools}`
    fn to_definition(&self) -> Value {
        json!({
            "name": self.name(),
            "description": self.descriptor().description(),
            "tools": self.tools(),
        })
    }
}

/// Declares an action enum with `ALL`, `as_str`, `from_name` and `names`
///
/// ```rust,ignore
/// define_actions! {
///     pub enum CoderAction {
///         Plan => "plan",
///         Implement => "implement",
///     }
/// }
/// ```
#[macro_export]
macro_rules! define_actions {
    ($(#[$meta:meta])* $vis:vis enum $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }

            pub fn names() -> Vec<&'static str> {
                Self::ALL.iter().map(|action| action.as_str()).collect()
            }

            /// Message schema requiring an `action` drawn from this enum
            pub fn schema() -> serde_json::Value {
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "action": { "type": "string", "enum": Self::names() }
                    },
                    "required": ["action"]
                })
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

// ============================================================================
// Message helpers
// ============================================================================

/// The `action` field of a message, or `""`
pub fn action_of(message: &Value) -> &str {
    message.get("action").and_then(Value::as_str).unwrap_or("")
}

/// A field that is present and not empty, false, zero or null
pub fn field<'a>(message: &'a Value, key: &str) -> Option<&'a Value> {
    message.get(key).filter(|v| is_truthy(v))
}

/// A non-empty string field
pub fn str_field<'a>(message: &'a Value, key: &str) -> Option<&'a str> {
    field(message, key).and_then(Value::as_str)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// `{"status": "error", "message": ...}`
pub fn error_reply(message: impl Into<String>) -> Value {
    json!({ "status": "error", "message": message.into() })
}

/// The reply for an action the agent does not implement
pub fn unknown_action(action: &str, available: Vec<&'static str>) -> Value {
    json!({
        "status": "error",
        "message": format!("Unknown action: {}", action),
        "available_actions": available,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    define_actions! {
        enum SampleAction {
            First => "first",
            Second => "second",
        }
    }

    #[test]
    fn test_define_actions_round_trip_names() {
        assert_eq!(SampleAction::ALL.len(), 2);
        assert_eq!(SampleAction::from_name("second"), Some(SampleAction::Second));
        assert_eq!(SampleAction::from_name("third"), None);
        assert_eq!(SampleAction::names(), vec!["first", "second"]);
        assert_eq!(SampleAction::First.to_string(), "first");
        assert_eq!(SampleAction::schema()["required"], json!(["action"]));
    }

    #[test]
    fn test_field_truthiness() {
        let message = json!({
            "empty": "",
            "zero": 0,
            "list": [],
            "name": "x",
            "step_id": 2,
            "flag": false,
        });
        assert!(field(&message, "empty").is_none());
        assert!(field(&message, "zero").is_none());
        assert!(field(&message, "list").is_none());
        assert!(field(&message, "flag").is_none());
        assert!(field(&message, "missing").is_none());
        assert_eq!(str_field(&message, "name"), Some("x"));
        assert!(field(&message, "step_id").is_some());
    }

    #[test]
    fn test_unknown_action_reply() {
        let reply = unknown_action("fly", vec!["walk"]);
        assert_eq!(reply["status"], "error");
        assert_eq!(reply["message"], "Unknown action: fly");
        assert_eq!(reply["available_actions"], json!(["walk"]));
    }

    #[test]
    fn test_action_of_defaults_to_empty() {
        assert_eq!(action_of(&json!({})), "");
        assert_eq!(action_of(&json!({"action": "plan"})), "plan");
    }
}
