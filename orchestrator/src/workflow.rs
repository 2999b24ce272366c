//! Workflow templates and instances
//!
//! A [`WorkflowTemplate`] is an immutable, named sequence of agent actions
//! registered at startup. A [`WorkflowInstance`] is one execution of a
//! template, advanced a step at a time by the engine.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{WorkflowError, WorkflowResult};

/// A single step: one action of one agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Name of the agent to run (must exist in the registry)
    pub agent: String,
    /// Action passed to the agent
    pub action: String,
    /// Human-readable description shown in status replies
    #[serde(default)]
    pub description: String,
}

impl Step {
    pub fn new(
        agent: impl Into<String>,
        action: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            agent: agent.into(),
            action: action.into(),
            description: description.into(),
        }
    }
}

/// A complete workflow definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowTemplate {
    /// Unique identifier for this workflow
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Steps executed in declared order
    pub steps: Vec<Step>,
}

impl WorkflowTemplate {
    /// Create a new template
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            steps: Vec::new(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Add a step
    pub fn with_step(
        mut self,
        agent: impl Into<String>,
        action: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.steps.push(Step::new(agent, action, description));
        self
    }

    /// Load a template from a TOML file
    pub fn from_toml_file(path: &Path) -> WorkflowResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| WorkflowError::TemplateLoad {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml(&content).map_err(|e| WorkflowError::TemplateLoad {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Load a template from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// `{description, steps: [{agent, action, description}]}`
    pub fn to_definition(&self) -> Value {
        json!({
            "description": self.description,
            "steps": self.steps,
        })
    }
}

/// The built-in templates
pub fn builtin_templates() -> Vec<WorkflowTemplate> {
    vec![
        WorkflowTemplate::new("code_implementation")
            .with_description("Implement a new feature or change")
            .with_step("deeper_searcher", "analyze_folder", "Analyze the codebase")
            .with_step("memory_bank", "store", "Store analysis results")
            .with_step("coder", "plan", "Create an implementation plan")
            .with_step("coder", "implement", "Implement the changes")
            .with_step("debugger", "verify_fix", "Verify the implementation"),
        WorkflowTemplate::new("bug_fixing")
            .with_description("Fix a bug in the code")
            .with_step("debugger", "analyze_error", "Analyze the error")
            .with_step("deeper_searcher", "analyze_file", "Analyze the affected files")
            .with_step("debugger", "trace_execution", "Trace code execution")
            .with_step("debugger", "suggest_fix", "Suggest a fix")
            .with_step("coder", "implement", "Implement the fix")
            .with_step("debugger", "verify_fix", "Verify the fix"),
        WorkflowTemplate::new("code_analysis")
            .with_description("Analyze the codebase")
            .with_step("deeper_searcher", "analyze_folder", "Analyze the codebase structure")
            .with_step("deeper_searcher", "find_patterns", "Identify code patterns")
            .with_step("deeper_searcher", "identify_issues", "Identify potential issues")
            .with_step("deeper_searcher", "suggest_improvements", "Suggest improvements")
            .with_step("memory_bank", "store", "Store analysis results"),
        WorkflowTemplate::new("code_refactoring")
            .with_description("Refactor code to improve quality")
            .with_step("deeper_searcher", "analyze_file", "Analyze the code to refactor")
            .with_step("deeper_searcher", "suggest_improvements", "Suggest refactoring options")
            .with_step("coder", "plan", "Create a refactoring plan")
            .with_step("coder", "refactor", "Implement the refactoring")
            .with_step("debugger", "verify_fix", "Verify the refactoring"),
    ]
}

/// Load custom templates from every `*.toml` file in a directory
///
/// A missing directory yields no templates; files that fail to parse are
/// skipped with a warning.
pub fn load_custom_templates(dir: &Path) -> WorkflowResult<Vec<WorkflowTemplate>> {
    let mut templates = Vec::new();

    if !dir.exists() {
        return Ok(templates);
    }

    let entries = std::fs::read_dir(dir).map_err(|e| WorkflowError::TemplateLoad {
        path: dir.display().to_string(),
        message: e.to_string(),
    })?;

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "toml") {
            match WorkflowTemplate::from_toml_file(&path) {
                Ok(template) => templates.push(template),
                Err(e) => tracing::warn!("Skipping workflow template: {}", e),
            }
        }
    }

    Ok(templates)
}

/// Template catalog keyed and iterated by name
pub type TemplateCatalog = BTreeMap<String, Arc<WorkflowTemplate>>;

/// Build the catalog; later templates replace earlier ones of the same name
pub fn catalog(templates: impl IntoIterator<Item = WorkflowTemplate>) -> TemplateCatalog {
    templates
        .into_iter()
        .map(|t| (t.name.clone(), Arc::new(t)))
        .collect()
}

// ============================================================================
// Instances
// ============================================================================

/// Status of a workflow instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Running,
    Completed,
    Failed,
}

impl WorkflowStatus {
    pub fn is_finished(self) -> bool {
        !matches!(self, WorkflowStatus::Running)
    }
}

/// One entry of an instance's append-only result log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: usize,
    pub agent: String,
    pub action: String,
    pub result: Value,
}

/// One execution of a template
///
/// `results.len() == current_step` holds at every observable point.
#[derive(Debug, Clone)]
pub struct WorkflowInstance {
    pub id: String,
    pub template: Arc<WorkflowTemplate>,
    pub status: WorkflowStatus,
    pub current_step: usize,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub parameters: Map<String, Value>,
    pub results: Vec<StepRecord>,
}

impl WorkflowInstance {
    pub fn new(id: String, template: Arc<WorkflowTemplate>, parameters: Map<String, Value>) -> Self {
        Self {
            id,
            template,
            status: WorkflowStatus::Running,
            current_step: 0,
            start_time: Utc::now(),
            end_time: None,
            parameters,
            results: Vec::new(),
        }
    }

    pub fn total_steps(&self) -> usize {
        self.template.steps.len()
    }

    /// The step that the next call will execute
    pub fn next_step(&self) -> Option<&Step> {
        self.template.steps.get(self.current_step)
    }

    /// Agent message for the next step: parameters plus the step's action
    pub fn step_message(&self, step: &Step) -> Value {
        let mut message = self.parameters.clone();
        message.insert("action".to_string(), Value::String(step.action.clone()));
        Value::Object(message)
    }

    /// Append a result and advance by exactly one step
    ///
    /// A `fatal` step fails the instance unless `keep_running` is set; an
    /// instance that runs out of steps completes.
    pub fn record(&mut self, step: &Step, result: Value, fatal: bool, keep_running: bool) {
        self.results.push(StepRecord {
            step: self.current_step,
            agent: step.agent.clone(),
            action: step.action.clone(),
            result,
        });
        self.current_step += 1;

        if fatal && !keep_running {
            self.finish(WorkflowStatus::Failed);
        } else if self.current_step >= self.total_steps() {
            self.finish(WorkflowStatus::Completed);
        }
    }

    fn finish(&mut self, status: WorkflowStatus) {
        self.status = status;
        self.end_time = Some(Utc::now());
    }

    /// The `workflow` object of a status reply
    pub fn snapshot(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.template.name,
            "status": self.status,
            "start_time": self.start_time,
            "end_time": self.end_time,
            "current_step": self.current_step,
            "total_steps": self.total_steps(),
            "current_step_description": self.next_step().map(|s| s.description.as_str()),
            "results": self.results,
        })
    }
}
