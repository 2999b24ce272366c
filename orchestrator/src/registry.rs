//! Agent registry
//!
//! Built once at startup and shared read-only through `Arc`. Iteration is
//! sorted by name so listings are deterministic.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::agent::{Agent, AgentContext, AgentInvoker};
use crate::agents::{CoderAgent, DebuggerAgent, DeeperSearcherAgent, MemoryBankAgent};
use crate::error::AgentError;

/// Registry of available agents
#[derive(Default)]
pub struct AgentRegistry {
    agents: BTreeMap<String, Arc<dyn Agent>>,
}

impl AgentRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in agents
    ///
    /// The memory bank persists under `memory_dir`.
    pub fn with_defaults(memory_dir: impl Into<PathBuf>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(CoderAgent::new()));
        registry.register(Arc::new(DebuggerAgent::new()));
        registry.register(Arc::new(DeeperSearcherAgent::new()));
        registry.register(Arc::new(MemoryBankAgent::new(memory_dir)));

        tracing::info!(
            count = registry.len(),
            agents = %registry.names().collect::<Vec<_>>().join(", "),
            "registered agents"
        );
        registry
    }

    /// Register an agent under its descriptor name, replacing any previous one
    pub fn register(&mut self, agent: Arc<dyn Agent>) {
        self.agents.insert(agent.name().to_string(), agent);
    }

    /// Get an agent by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Agent>> {
        self.agents.get(name).cloned()
    }

    /// Check if an agent exists
    pub fn contains(&self, name: &str) -> bool {
        self.agents.contains_key(name)
    }

    /// List all agent names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.agents.keys().map(|s| s.as_str())
    }

    /// Iterate over all agents in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn Agent>)> {
        self.agents.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// `{name: {name, description, tools}}` for every agent
    pub fn definitions(&self) -> Value {
        let map: Map<String, Value> = self
            .iter()
            .map(|(name, agent)| (name.to_string(), agent.to_definition()))
            .collect();
        Value::Object(map)
    }
}

#[async_trait]
impl AgentInvoker for AgentRegistry {
    async fn invoke_agent(
        &self,
        name: &str,
        message: &Value,
        ctx: &AgentContext,
    ) -> Result<Value, AgentError> {
        let agent = self
            .get(name)
            .ok_or_else(|| AgentError::UnknownAgent(name.to_string()))?;
        tracing::debug!(agent = name, workflow_id = ?ctx.workflow_id, "nested agent invocation");
        agent.process(message, ctx).await
    }
}
