//! Agents and workflow orchestration for agent-hub
//!
//! This crate provides:
//! - The [`Agent`] contract and the [`AgentRegistry`]
//! - The built-in agents (coder, debugger, deeper_searcher, memory_bank)
//! - Workflow templates, built-in and loaded from TOML
//! - The [`WorkflowEngine`] that advances instances one step at a time
//! - The [`Orchestrator`] that answers `target: "orchestrator"` messages
//!
//! # Example
//!
//! ```rust,ignore
//! use orchestrator::{Orchestrator, OrchestratorConfig};
//! use serde_json::json;
//!
//! let orch = Orchestrator::from_config(&OrchestratorConfig::default());
//! let reply = orch
//!     .process(&json!({"action": "start_workflow", "workflow_name": "bug_fixing"}))
//!     .await;
//! ```

pub mod agent;
pub mod agents;
pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod registry;
pub mod workflow;

pub use agent::{Agent, AgentContext, AgentInvoker, MAX_INVOKE_DEPTH};
pub use engine::{OnFailure, StepOutcome, WorkflowEngine, WorkflowPolicy, WorkflowRun};
pub use error::{AgentError, WorkflowError, WorkflowResult};
pub use orchestrator::{Orchestrator, OrchestratorAction, OrchestratorConfig};
pub use registry::AgentRegistry;
pub use workflow::{
    builtin_templates, catalog, load_custom_templates, Step, StepRecord, TemplateCatalog,
    WorkflowInstance, WorkflowStatus, WorkflowTemplate,
};
