//! The orchestrator: direct agent calls and the workflow lifecycle
//!
//! [`Orchestrator::process`] is the entry point for every message whose
//! `target` is `"orchestrator"`. It never fails; errors are answered with
//! `{"status": "error", ...}` replies.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use crate::agent::{action_of, error_reply, field, str_field, unknown_action, AgentContext};
use crate::engine::{WorkflowEngine, WorkflowPolicy};
use crate::error::{AgentError, WorkflowError};
use crate::registry::AgentRegistry;
use crate::workflow::{builtin_templates, catalog, load_custom_templates};

crate::define_actions! {
    pub enum OrchestratorAction {
        StartWorkflow => "start_workflow",
        GetWorkflowStatus => "get_workflow_status",
        ListWorkflows => "list_workflows",
        ListAgents => "list_agents",
        DirectAgentCall => "direct_agent_call",
        ExecuteWorkflowStep => "execute_workflow_step",
        RunWorkflow => "run_workflow",
    }
}

/// Startup settings for [`Orchestrator::from_config`]
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Where the memory bank persists its index and content
    pub memory_dir: PathBuf,
    /// Project-level directory of custom `*.toml` workflow templates
    pub templates_dir: Option<PathBuf>,
    pub policy: WorkflowPolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            memory_dir: PathBuf::from(".memory"),
            templates_dir: None,
            policy: WorkflowPolicy::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Directories searched for custom templates, lowest precedence first
    pub fn template_dirs(&self) -> Vec<PathBuf> {
        let mut found = Vec::new();
        if let Some(config_dir) = dirs::config_dir() {
            found.push(config_dir.join("agent-hub").join("workflows"));
        }
        if let Some(dir) = &self.templates_dir {
            found.push(dir.clone());
        }
        found
    }
}

pub struct Orchestrator {
    agents: Arc<AgentRegistry>,
    engine: WorkflowEngine,
}

impl Orchestrator {
    pub fn new(agents: Arc<AgentRegistry>, engine: WorkflowEngine) -> Self {
        Self { agents, engine }
    }

    /// Build the default agents and the template catalog
    ///
    /// Custom templates replace built-ins of the same name.
    pub fn from_config(config: &OrchestratorConfig) -> Self {
        let agents = Arc::new(AgentRegistry::with_defaults(&config.memory_dir));

        let mut templates = builtin_templates();
        for dir in config.template_dirs() {
            match load_custom_templates(&dir) {
                Ok(custom) => {
                    if !custom.is_empty() {
                        tracing::info!(dir = %dir.display(), count = custom.len(), "loaded custom workflows");
                    }
                    templates.extend(custom);
                }
                Err(e) => tracing::warn!("{}", e),
            }
        }

        let engine = WorkflowEngine::new(agents.clone(), catalog(templates), config.policy.clone());
        Self::new(agents, engine)
    }

    pub fn agents(&self) -> &Arc<AgentRegistry> {
        &self.agents
    }

    pub fn engine(&self) -> &WorkflowEngine {
        &self.engine
    }

    /// `{name: {name, description, tools}}` for every agent
    pub fn agent_definitions(&self) -> Value {
        self.agents.definitions()
    }

    /// `{name: {description, steps}}` for every template
    pub fn workflow_definitions(&self) -> Value {
        let map: serde_json::Map<String, Value> = self
            .engine
            .templates()
            .iter()
            .map(|(name, template)| (name.clone(), template.to_definition()))
            .collect();
        Value::Object(map)
    }

    /// Invoke an agent outside any workflow
    ///
    /// The call runs on its own task, so a panicking agent becomes an error.
    pub async fn call_agent(&self, name: &str, message: &Value) -> Result<Value, AgentError> {
        let agent = self
            .agents
            .get(name)
            .ok_or_else(|| AgentError::UnknownAgent(name.to_string()))?;
        let ctx = AgentContext::new(self.agents.clone());
        let message = message.clone();

        tokio::spawn(async move { agent.process(&message, &ctx).await })
            .await
            .map_err(|e| AgentError::TaskFailed(e.to_string()))?
    }

    pub fn prune_finished(&self, max_age: Duration) -> usize {
        match self.engine.prune_finished(max_age) {
            Ok(removed) => removed,
            Err(e) => {
                tracing::warn!("Failed to prune workflows: {}", e);
                0
            }
        }
    }

    /// Handle one orchestrator message
    pub async fn process(&self, message: &Value) -> Value {
        let action = action_of(message);
        let Some(parsed) = OrchestratorAction::from_name(action) else {
            return unknown_action(action, OrchestratorAction::names());
        };

        tracing::debug!(action = %parsed, "orchestrator action");

        match parsed {
            OrchestratorAction::StartWorkflow => self.start_workflow(message),
            OrchestratorAction::GetWorkflowStatus => self.get_workflow_status(message),
            OrchestratorAction::ListWorkflows => self.list_workflows(),
            OrchestratorAction::ListAgents => self.list_agents(),
            OrchestratorAction::DirectAgentCall => self.direct_agent_call(message).await,
            OrchestratorAction::ExecuteWorkflowStep => self.execute_workflow_step(message).await,
            OrchestratorAction::RunWorkflow => self.run_workflow(message).await,
        }
    }

    // ========================================================================
    // Actions
    // ========================================================================

    fn start_workflow(&self, message: &Value) -> Value {
        let Some(name) = str_field(message, "workflow_name") else {
            return workflow_error(WorkflowError::MissingField("workflow_name"));
        };
        let parameters = message.get("parameters").cloned().unwrap_or(Value::Null);

        match self.engine.start(name, parameters) {
            Ok(workflow_id) => json!({
                "status": "success",
                "message": format!("Started workflow {}", name),
                "workflow_id": workflow_id,
            }),
            Err(e) => workflow_error(e),
        }
    }

    fn get_workflow_status(&self, message: &Value) -> Value {
        let Some(id) = str_field(message, "workflow_id") else {
            return workflow_error(WorkflowError::MissingField("workflow_id"));
        };

        match self.engine.status(id) {
            Ok(workflow) => json!({ "status": "success", "workflow": workflow }),
            Err(e) => workflow_error(e),
        }
    }

    fn list_workflows(&self) -> Value {
        let workflows: Vec<Value> = self
            .engine
            .templates()
            .values()
            .map(|t| json!({ "name": t.name, "description": t.description, "steps": t.steps.len() }))
            .collect();
        json!({ "status": "success", "workflows": workflows })
    }

    fn list_agents(&self) -> Value {
        let agents: Vec<Value> = self.agents.iter().map(|(_, a)| a.to_definition()).collect();
        json!({ "status": "success", "agents": agents })
    }

    async fn direct_agent_call(&self, message: &Value) -> Value {
        let Some(agent_name) = str_field(message, "agent_name") else {
            return error_reply("Missing agent_name");
        };
        if !self.agents.contains(agent_name) {
            return json!({
                "status": "error",
                "message": format!("Unknown agent: {}", agent_name),
                "available_agents": self.agents.names().collect::<Vec<_>>(),
            });
        }
        let Some(agent_message) = field(message, "agent_message") else {
            return error_reply("Missing agent_message");
        };

        match self.call_agent(agent_name, agent_message).await {
            Ok(result) => json!({
                "status": "success",
                "agent_name": agent_name,
                "result": result,
            }),
            Err(e) => {
                tracing::warn!(agent = agent_name, error = %e, "direct agent call failed");
                json!({
                    "status": "error",
                    "agent_name": agent_name,
                    "message": e.to_string(),
                })
            }
        }
    }

    async fn execute_workflow_step(&self, message: &Value) -> Value {
        let Some(id) = str_field(message, "workflow_id") else {
            return workflow_error(WorkflowError::MissingField("workflow_id"));
        };

        match self.engine.execute_step(id).await {
            Ok(outcome) => outcome.to_reply(),
            Err(e) => workflow_error(e),
        }
    }

    async fn run_workflow(&self, message: &Value) -> Value {
        let Some(id) = str_field(message, "workflow_id") else {
            return workflow_error(WorkflowError::MissingField("workflow_id"));
        };

        let run = self.engine.run(id).await;
        let steps: Vec<Value> = run.steps.iter().map(|o| o.to_reply()).collect();

        let workflow = match self.engine.status(id) {
            Ok(workflow) => workflow,
            Err(e) => return workflow_error(run.error.unwrap_or(e)),
        };
        match run.error {
            None => json!({ "status": "success", "workflow": workflow, "steps": steps }),
            Some(e) => json!({
                "status": "error",
                "message": e.to_string(),
                "workflow": workflow,
                "steps": steps,
            }),
        }
    }
}

fn workflow_error(error: WorkflowError) -> Value {
    match error {
        WorkflowError::UnknownTemplate { name, available } => json!({
            "status": "error",
            "message": format!("Unknown workflow: {}", name),
            "available_workflows": available,
        }),
        other => error_reply(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::workflow::WorkflowTemplate;
    use async_trait::async_trait;
    use tempfile::TempDir;
    use tool_common::CapabilityDescriptor;

    struct PanickingAgent {
        descriptor: CapabilityDescriptor,
    }

    #[async_trait]
    impl Agent for PanickingAgent {
        fn descriptor(&self) -> &CapabilityDescriptor {
            &self.descriptor
        }

        async fn process(&self, _message: &Value, _ctx: &AgentContext) -> Result<Value, AgentError> {
            panic!("agent blew up");
        }
    }

    fn orchestrator(dir: &TempDir) -> Orchestrator {
        let agents = Arc::new(AgentRegistry::with_defaults(dir.path()));
        let engine = WorkflowEngine::new(agents.clone(), catalog(builtin_templates()), WorkflowPolicy::default());
        Orchestrator::new(agents, engine)
    }

    fn orchestrator_with_panicking_agent(dir: &TempDir) -> Orchestrator {
        let mut registry = AgentRegistry::with_defaults(dir.path());
        registry.register(Arc::new(PanickingAgent {
            descriptor: CapabilityDescriptor::new("volatile", "always panics", json!({})),
        }));
        let agents = Arc::new(registry);
        let template = WorkflowTemplate::new("half_haunted")
            .with_step("coder", "plan", "Plan the work")
            .with_step("ghost", "haunt", "Nobody answers");
        let engine = WorkflowEngine::new(agents.clone(), catalog([template]), WorkflowPolicy::default());
        Orchestrator::new(agents, engine)
    }

    async fn start(orch: &Orchestrator, name: &str, parameters: Value) -> String {
        let reply = orch
            .process(&json!({"action": "start_workflow", "workflow_name": name, "parameters": parameters}))
            .await;
        assert_eq!(reply["status"], "success", "{}", reply);
        reply["workflow_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_list_agents_sorted() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir);

        let reply = orch.process(&json!({"action": "list_agents"})).await;
        assert_eq!(reply["status"], "success");
        let names: Vec<&str> = reply["agents"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["coder", "debugger", "deeper_searcher", "memory_bank"]);
        assert!(reply["agents"][0]["tools"].as_array().unwrap().len() > 0);
    }

    #[tokio::test]
    async fn test_list_workflows_counts_steps() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir);

        let reply = orch.process(&json!({"action": "list_workflows"})).await;
        let bug_fixing = reply["workflows"]
            .as_array()
            .unwrap()
            .iter()
            .find(|w| w["name"] == "bug_fixing")
            .unwrap();
        assert_eq!(bug_fixing["steps"], 6);
        assert_eq!(bug_fixing["description"], "Fix a bug in the code");
    }

    #[tokio::test]
    async fn test_start_unknown_workflow_lists_available() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir);

        let reply = orch
            .process(&json!({"action": "start_workflow", "workflow_name": "nope"}))
            .await;
        assert_eq!(reply["status"], "error");
        assert_eq!(reply["message"], "Unknown workflow: nope");
        assert_eq!(
            reply["available_workflows"],
            json!(["bug_fixing", "code_analysis", "code_implementation", "code_refactoring"])
        );

        let reply = orch.process(&json!({"action": "start_workflow"})).await;
        assert_eq!(reply["message"], "Missing workflow_name");
    }

    #[tokio::test]
    async fn test_start_does_not_execute() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir);
        let id = start(&orch, "code_analysis", json!({"folder_path": "."})).await;

        let status = orch
            .process(&json!({"action": "get_workflow_status", "workflow_id": id}))
            .await;
        assert_eq!(status["workflow"]["current_step"], 0);
        assert_eq!(status["workflow"]["status"], "running");
        assert_eq!(status["workflow"]["total_steps"], 5);
        assert_eq!(status["workflow"]["results"], json!([]));
        assert_eq!(
            status["workflow"]["current_step_description"],
            "Analyze the codebase structure"
        );
    }

    #[tokio::test]
    async fn test_status_errors() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir);

        let reply = orch.process(&json!({"action": "get_workflow_status"})).await;
        assert_eq!(reply["message"], "Missing workflow_id");

        let reply = orch
            .process(&json!({"action": "get_workflow_status", "workflow_id": "wf_x"}))
            .await;
        assert_eq!(reply["message"], "Unknown workflow ID: wf_x");
    }

    #[tokio::test]
    async fn test_direct_agent_call_plan() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir);

        let reply = orch
            .process(&json!({
                "action": "direct_agent_call",
                "agent_name": "coder",
                "agent_message": {"action": "plan", "task": "add login"},
            }))
            .await;
        assert_eq!(reply["status"], "success");
        assert_eq!(reply["agent_name"], "coder");
        let steps = reply["result"]["plan"]["steps"].as_array().unwrap();
        let ids: Vec<u64> = steps.iter().map(|s| s["id"].as_u64().unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_direct_agent_call_errors() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir);

        let reply = orch.process(&json!({"action": "direct_agent_call"})).await;
        assert_eq!(reply["message"], "Missing agent_name");

        let reply = orch
            .process(&json!({"action": "direct_agent_call", "agent_name": "ghost", "agent_message": {"action": "x"}}))
            .await;
        assert_eq!(reply["message"], "Unknown agent: ghost");
        assert_eq!(reply["available_agents"].as_array().unwrap().len(), 4);

        let reply = orch
            .process(&json!({"action": "direct_agent_call", "agent_name": "coder", "agent_message": {}}))
            .await;
        assert_eq!(reply["message"], "Missing agent_message");
    }

    #[tokio::test]
    async fn test_stepping_bug_fixing_to_completion() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir);
        let id = start(&orch, "bug_fixing", json!({"error_message": "ValueError: bad"})).await;

        for expected in 0..6 {
            let reply = orch
                .process(&json!({"action": "execute_workflow_step", "workflow_id": id}))
                .await;
            assert_eq!(reply["status"], "success", "{}", reply);
            assert_eq!(reply["step"], expected);
        }

        let status = orch
            .process(&json!({"action": "get_workflow_status", "workflow_id": id}))
            .await;
        assert_eq!(status["workflow"]["status"], "completed");
        assert!(status["workflow"]["end_time"].is_string());
        assert_eq!(status["workflow"]["current_step_description"], Value::Null);
        let steps: Vec<u64> = status["workflow"]["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["step"].as_u64().unwrap())
            .collect();
        assert_eq!(steps, vec![0, 1, 2, 3, 4, 5]);

        let reply = orch
            .process(&json!({"action": "execute_workflow_step", "workflow_id": id}))
            .await;
        assert_eq!(reply["status"], "error");
        assert_eq!(reply["message"], format!("Workflow is not running: {}", id));
    }

    #[tokio::test]
    async fn test_run_workflow_drains_instance() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir);
        let id = start(&orch, "code_refactoring", json!({"file_path": "src/lib.rs"})).await;

        let reply = orch
            .process(&json!({"action": "run_workflow", "workflow_id": id}))
            .await;
        assert_eq!(reply["status"], "success");
        assert_eq!(reply["workflow"]["status"], "completed");
        assert_eq!(reply["steps"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_run_workflow_error_keeps_completed_steps() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator_with_panicking_agent(&dir);
        let id = start(&orch, "half_haunted", json!({"task": "add login"})).await;

        let reply = orch
            .process(&json!({"action": "run_workflow", "workflow_id": id}))
            .await;
        assert_eq!(reply["status"], "error");
        assert_eq!(reply["message"], "Unknown agent: ghost");
        assert_eq!(reply["steps"].as_array().unwrap().len(), 1);
        assert_eq!(reply["steps"][0]["step"], 0);
        assert_eq!(reply["workflow"]["current_step"], 1);
        assert_eq!(reply["workflow"]["status"], "running");
    }

    #[tokio::test]
    async fn test_run_workflow_unknown_id() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir);

        let reply = orch
            .process(&json!({"action": "run_workflow", "workflow_id": "wf_x"}))
            .await;
        assert_eq!(reply["status"], "error");
        assert_eq!(reply["message"], "Unknown workflow ID: wf_x");
    }

    #[tokio::test]
    async fn test_panicking_agent_is_reported_as_error() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator_with_panicking_agent(&dir);

        let err = orch.call_agent("volatile", &json!({"action": "go"})).await.unwrap_err();
        assert!(matches!(err, AgentError::TaskFailed(_)));
        assert!(err.to_string().starts_with("Agent execution failed:"));

        let reply = orch
            .process(&json!({
                "action": "direct_agent_call",
                "agent_name": "volatile",
                "agent_message": {"action": "go"},
            }))
            .await;
        assert_eq!(reply["status"], "error");
        assert_eq!(reply["agent_name"], "volatile");

        // the orchestrator keeps serving after the panic
        let reply = orch.process(&json!({"action": "list_agents"})).await;
        assert_eq!(reply["status"], "success");
    }

    #[tokio::test]
    async fn test_unknown_action() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir);

        let reply = orch.process(&json!({"action": "dance"})).await;
        assert_eq!(reply["message"], "Unknown action: dance");
        assert_eq!(reply["available_actions"].as_array().unwrap().len(), 7);
    }

    #[test]
    fn test_workflow_definitions() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir);

        let defs = orch.workflow_definitions();
        assert_eq!(defs["bug_fixing"]["steps"][0]["agent"], "debugger");
        assert_eq!(defs["bug_fixing"]["steps"][0]["action"], "analyze_error");
    }
}
