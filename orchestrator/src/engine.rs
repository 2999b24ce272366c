//! Workflow execution engine
//!
//! Owns the live workflow instances and advances them one step per call:
//! - Each step is one agent invocation, run on its own task
//! - Results are appended, never overwritten, and the index only moves forward
//! - Calls on the same instance are serialised; distinct instances run concurrently
//! - Retries, per-attempt timeouts and failure handling follow [`WorkflowPolicy`]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::agent::{Agent, AgentContext};
use crate::error::{WorkflowError, WorkflowResult};
use crate::registry::AgentRegistry;
use crate::workflow::{TemplateCatalog, WorkflowInstance, WorkflowStatus};

/// What happens to an instance when a step fails fatally
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnFailure {
    /// Mark the instance failed and stop
    #[default]
    Fail,
    /// Record the error result and keep going
    Continue,
}

/// Retry, timeout and failure handling for workflow steps
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowPolicy {
    /// Extra attempts after a fatal invocation
    #[serde(default)]
    pub max_retries: u32,

    /// Per-attempt timeout; unset means steps may run indefinitely
    #[serde(default)]
    pub step_timeout_secs: Option<u64>,

    #[serde(default)]
    pub on_failure: OnFailure,
}

impl WorkflowPolicy {
    fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout_secs.map(Duration::from_secs)
    }
}

/// Result of one `execute_step` call
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub workflow_id: String,
    pub step: usize,
    pub result: Value,
    /// Set when the invocation failed fatally after all attempts
    pub error: Option<String>,
}

impl StepOutcome {
    pub fn to_reply(&self) -> Value {
        match &self.error {
            None => json!({
                "status": "success",
                "workflow_id": self.workflow_id,
                "step": self.step,
                "result": self.result,
            }),
            Some(message) => json!({
                "status": "error",
                "workflow_id": self.workflow_id,
                "step": self.step,
                "message": message,
                "result": self.result,
            }),
        }
    }
}

/// Outcome of driving an instance with [`WorkflowEngine::run`]
#[derive(Debug)]
pub struct WorkflowRun {
    pub steps: Vec<StepOutcome>,
    /// Set when stepping stopped on something other than the end of the workflow
    pub error: Option<WorkflowError>,
}

/// Per-instance locks: `step_lock` serialises stepping, `state` guards the data
struct InstanceSlot {
    step_lock: tokio::sync::Mutex<()>,
    state: RwLock<WorkflowInstance>,
}

impl InstanceSlot {
    fn read(&self) -> WorkflowResult<RwLockReadGuard<'_, WorkflowInstance>> {
        self.state
            .read()
            .map_err(|e| WorkflowError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> WorkflowResult<RwLockWriteGuard<'_, WorkflowInstance>> {
        self.state
            .write()
            .map_err(|e| WorkflowError::LockPoisoned(e.to_string()))
    }
}

/// Workflow execution engine
pub struct WorkflowEngine {
    agents: Arc<AgentRegistry>,
    templates: TemplateCatalog,
    instances: RwLock<HashMap<String, Arc<InstanceSlot>>>,
    sequence: AtomicU64,
    policy: WorkflowPolicy,
}

impl WorkflowEngine {
    pub fn new(agents: Arc<AgentRegistry>, templates: TemplateCatalog, policy: WorkflowPolicy) -> Self {
        Self {
            agents,
            templates,
            instances: RwLock::new(HashMap::new()),
            sequence: AtomicU64::new(0),
            policy,
        }
    }

    pub fn agents(&self) -> &Arc<AgentRegistry> {
        &self.agents
    }

    pub fn templates(&self) -> &TemplateCatalog {
        &self.templates
    }

    pub fn policy(&self) -> &WorkflowPolicy {
        &self.policy
    }

    /// Registered template names in sorted order
    pub fn template_names(&self) -> Vec<String> {
        self.templates.keys().cloned().collect()
    }

    fn slot(&self, id: &str) -> WorkflowResult<Arc<InstanceSlot>> {
        let instances = self
            .instances
            .read()
            .map_err(|e| WorkflowError::LockPoisoned(e.to_string()))?;
        instances
            .get(id)
            .cloned()
            .ok_or_else(|| WorkflowError::UnknownInstance(id.to_string()))
    }

    /// Create a running instance at step 0 without executing anything
    ///
    /// `parameters` may be null (treated as `{}`) or an object.
    pub fn start(&self, template_name: &str, parameters: Value) -> WorkflowResult<String> {
        let template = self
            .templates
            .get(template_name)
            .cloned()
            .ok_or_else(|| WorkflowError::UnknownTemplate {
                name: template_name.to_string(),
                available: self.template_names(),
            })?;

        let parameters = match parameters {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            _ => return Err(WorkflowError::InvalidParameters),
        };

        let seq = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("wf_{}_{}_{}", Utc::now().timestamp(), seq, template_name);
        let slot = Arc::new(InstanceSlot {
            step_lock: tokio::sync::Mutex::new(()),
            state: RwLock::new(WorkflowInstance::new(id.clone(), template, parameters)),
        });

        self.instances
            .write()
            .map_err(|e| WorkflowError::LockPoisoned(e.to_string()))?
            .insert(id.clone(), slot);

        tracing::info!(workflow = template_name, workflow_id = %id, "started workflow");
        Ok(id)
    }

    /// Copy of an instance's current state
    pub fn instance(&self, id: &str) -> WorkflowResult<WorkflowInstance> {
        let slot = self.slot(id)?;
        let state = slot.read()?;
        Ok(state.clone())
    }

    /// The `workflow` object of a status reply
    pub fn status(&self, id: &str) -> WorkflowResult<Value> {
        let slot = self.slot(id)?;
        let state = slot.read()?;
        Ok(state.snapshot())
    }

    /// Execute the next step of an instance
    pub async fn execute_step(&self, id: &str) -> WorkflowResult<StepOutcome> {
        let slot = self.slot(id)?;
        let _stepping = slot.step_lock.lock().await;

        let (index, step, message) = {
            let state = slot.read()?;
            if state.status != WorkflowStatus::Running {
                return Err(WorkflowError::NotRunning(id.to_string()));
            }
            let step = state
                .next_step()
                .cloned()
                .ok_or_else(|| WorkflowError::Exhausted(id.to_string()))?;
            let message = state.step_message(&step);
            (state.current_step, step, message)
        };

        let agent = self
            .agents
            .get(&step.agent)
            .ok_or_else(|| WorkflowError::UnknownAgent(step.agent.clone()))?;

        tracing::info!(
            workflow_id = id,
            step = index,
            agent = %step.agent,
            action = %step.action,
            "executing workflow step"
        );

        let ctx = AgentContext::for_step(self.agents.clone(), id, index);
        let (result, error) = match self.invoke(agent, message, ctx).await {
            Ok(value) => (value, None),
            Err(message) => (json!({ "error": message }), Some(message)),
        };

        {
            let mut state = slot.write()?;
            state.record(
                &step,
                result.clone(),
                error.is_some(),
                self.policy.on_failure == OnFailure::Continue,
            );
            match state.status {
                WorkflowStatus::Completed => tracing::info!(workflow_id = id, "workflow completed"),
                WorkflowStatus::Failed => tracing::warn!(workflow_id = id, step = index, "workflow failed"),
                WorkflowStatus::Running => {}
            }
        }

        Ok(StepOutcome {
            workflow_id: id.to_string(),
            step: index,
            result,
            error,
        })
    }

    /// Invoke an agent under the step policy
    ///
    /// Each attempt runs on its own task so a panicking agent is reported as
    /// a failed attempt.
    async fn invoke(
        &self,
        agent: Arc<dyn Agent>,
        message: Value,
        ctx: AgentContext,
    ) -> Result<Value, String> {
        let attempts = self.policy.max_retries + 1;
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            let agent = agent.clone();
            let message = message.clone();
            let ctx = ctx.clone();
            let mut handle = tokio::spawn(async move { agent.process(&message, &ctx).await });

            let joined = match self.policy.step_timeout() {
                Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
                    Ok(joined) => Some(joined),
                    Err(_) => {
                        handle.abort();
                        None
                    }
                },
                None => Some(handle.await),
            };

            last_error = match joined {
                Some(Ok(Ok(value))) => return Ok(value),
                Some(Ok(Err(e))) => e.to_string(),
                Some(Err(e)) => format!("Agent task failed: {}", e),
                None => format!(
                    "Step timed out after {}s",
                    self.policy.step_timeout_secs.unwrap_or_default()
                ),
            };
            tracing::warn!(attempt, attempts, error = %last_error, "workflow step attempt failed");
        }

        Err(last_error)
    }

    /// Step an instance until it leaves `running`
    ///
    /// Steps taken before an error are kept in the returned [`WorkflowRun`].
    pub async fn run(&self, id: &str) -> WorkflowRun {
        let mut steps = Vec::new();
        loop {
            match self.execute_step(id).await {
                Ok(outcome) => steps.push(outcome),
                Err(WorkflowError::NotRunning(_)) | Err(WorkflowError::Exhausted(_)) => {
                    return WorkflowRun { steps, error: None };
                }
                Err(e) => return WorkflowRun { steps, error: Some(e) },
            }
        }
    }

    /// Remove finished instances whose end time is older than `max_age`
    pub fn prune_finished(&self, max_age: Duration) -> WorkflowResult<usize> {
        let now = Utc::now();
        let expired = |state: &WorkflowInstance| {
            state.status.is_finished()
                && state.end_time.is_some_and(|end| {
                    now.signed_duration_since(end)
                        .to_std()
                        .is_ok_and(|age| age >= max_age)
                })
        };

        let mut instances = self
            .instances
            .write()
            .map_err(|e| WorkflowError::LockPoisoned(e.to_string()))?;
        let before = instances.len();
        instances.retain(|_, slot| match slot.state.read() {
            Ok(state) => !expired(&*state),
            Err(_) => true,
        });

        let removed = before - instances.len();
        if removed > 0 {
            tracing::debug!(removed, "pruned finished workflows");
        }
        Ok(removed)
    }

    /// Number of instances currently tracked
    pub fn instance_count(&self) -> usize {
        self.instances.read().map(|i| i.len()).unwrap_or(0)
    }
}
