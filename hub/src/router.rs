//! Message router
//!
//! Turns one inbound text payload into the reply frames to send back. A
//! payload is either one or more inline tool calls
//! (`<tool_name>{...}</tool_name>`) or a single JSON message addressed by its
//! `target` field to the orchestrator or to an agent.

use std::sync::{Arc, LazyLock};

use orchestrator::{AgentRegistry, Orchestrator};
use regex::Regex;
use serde_json::{json, Value};
use tool_common::{error_value, format_tool_response, Tool};

use crate::config::HubConfig;
use crate::error::HubResult;
use crate::registry::ToolRegistry;

/// Opening tag of an inline tool call
static OPEN_TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<([A-Za-z_][A-Za-z0-9_]*)>").expect("Invalid open tag regex")
});

const INVALID_FORMAT: &str =
    "Invalid message format. Expected either tool calls or a valid JSON message.";
const UNKNOWN_FORMAT: &str =
    "Unknown message format. Expected either tool calls or a JSON message with a 'target' field.";

/// One `<name>{...}</name>` segment
#[derive(Debug, Clone, PartialEq)]
pub struct InlineCall {
    pub name: String,
    pub params: Value,
}

/// Extract inline tool calls in textual order
///
/// The body of a call ends at the first matching close tag. Bodies that are
/// not a JSON object are skipped, as are open tags with no close tag.
pub fn extract_inline_calls(text: &str) -> Vec<InlineCall> {
    let mut calls = Vec::new();
    let mut pos = 0;

    while let Some(caps) = OPEN_TAG_REGEX.captures_at(text, pos) {
        let (Some(open), Some(name)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let close = format!("</{}>", name.as_str());

        let Some(offset) = text[open.end()..].find(&close) else {
            pos = open.end();
            continue;
        };
        let body = &text[open.end()..open.end() + offset];
        pos = open.end() + offset + close.len();

        match serde_json::from_str::<Value>(body.trim()) {
            Ok(params @ Value::Object(_)) => calls.push(InlineCall {
                name: name.as_str().to_string(),
                params,
            }),
            _ => tracing::debug!(tag = name.as_str(), "skipping inline call with invalid JSON body"),
        }
    }

    calls
}

pub struct MessageRouter {
    tools: Arc<ToolRegistry>,
    orchestrator: Arc<Orchestrator>,
}

impl MessageRouter {
    pub fn new(tools: Arc<ToolRegistry>, orchestrator: Arc<Orchestrator>) -> Self {
        Self { tools, orchestrator }
    }

    /// Build the tool registry and orchestrator described by `config`
    pub fn from_config(config: &HubConfig) -> HubResult<Self> {
        let tools = ToolRegistry::with_defaults(config.exec.clone(), config.filesystem.clone())?;
        let orchestrator = Orchestrator::from_config(&config.orchestrator_config());
        Ok(Self::new(Arc::new(tools), Arc::new(orchestrator)))
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    pub fn agents(&self) -> &Arc<AgentRegistry> {
        self.orchestrator.agents()
    }

    /// Route one payload; always yields at least one reply frame
    pub async fn route(&self, text: &str) -> Vec<String> {
        let calls = extract_inline_calls(text);
        if calls.is_empty() {
            return vec![self.route_structured(text).await.to_string()];
        }

        let mut replies = Vec::with_capacity(calls.len());
        for call in calls {
            let reply = self.execute_tool(&call.name, call.params).await;
            replies.push(format_tool_response(&call.name, &reply));
        }
        replies
    }

    /// Validate and execute one tool call, rendering failures as `{"error": ...}`
    pub async fn execute_tool(&self, name: &str, params: Value) -> Value {
        let Some(tool) = self.tools.get(name) else {
            return error_value(format!("Tool not found: {}", name));
        };
        if let Some(message) = tool.validate(&params) {
            return error_value(message);
        }

        tracing::debug!(tool = name, "executing tool");
        let handle = tokio::spawn(async move { tool.execute(params).await });

        match handle.await {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                tracing::debug!(tool = name, error = %e, "tool failed");
                error_value(e.to_string())
            }
            Err(e) => {
                tracing::error!(tool = name, error = %e, "tool task failed");
                error_value(format!("Tool execution failed: {}", e))
            }
        }
    }

    async fn route_structured(&self, text: &str) -> Value {
        let message: Value = match serde_json::from_str(text) {
            Ok(message) => message,
            Err(_) => return json!({ "status": "error", "message": INVALID_FORMAT }),
        };
        let Some(target) = message.get("target") else {
            return json!({ "status": "error", "message": UNKNOWN_FORMAT });
        };
        let target = match target {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        if target == "orchestrator" {
            return self.orchestrator.process(&message).await;
        }

        if self.agents().contains(&target) {
            return match self.orchestrator.call_agent(&target, &message).await {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::warn!(agent = %target, error = %e, "agent call failed");
                    error_value(e.to_string())
                }
            };
        }

        let mut available = vec!["orchestrator".to_string()];
        available.extend(self.agents().names().map(str::to_string));
        json!({
            "status": "error",
            "message": format!("Unknown target: {}", target),
            "available_targets": available,
        })
    }
}
