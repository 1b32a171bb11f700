//! Running execution plans against registered executors.
//!
//! Steps run in plan order. Each attempt is bounded by the step timeout and
//! retried up to the decision's retry budget; the first failing step stops
//! the run. Completed steps are checkpoints that [`PlanDispatcher::resume`]
//! skips.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::DispatchError;
use crate::router::{ExecutionPlan, ExecutionStep, ProcessorType};

/// Outputs of completed steps, keyed by step id, in completion order.
pub type StepOutputs = IndexMap<String, Value>;

/// An executor back-end for one processor type.
#[async_trait]
pub trait StepExecutor: Send + Sync {
    /// Execute one step; `previous` holds outputs of steps completed so far.
    async fn execute(&self, step: &ExecutionStep, previous: &StepOutputs) -> Result<Value, String>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletedStep {
    pub id: String,
    pub output: Value,
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepFailure {
    pub id: String,
    #[serde(serialize_with = "serialize_error")]
    pub error: DispatchError,
    pub attempts: u32,
}

fn serialize_error<S: serde::Serializer>(error: &DispatchError, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&error.to_string())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DispatchReport {
    pub completed: Vec<CompletedStep>,
    pub failure: Option<StepFailure>,
}

impl DispatchReport {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn is_completed(&self, id: &str) -> bool {
        self.completed.iter().any(|c| c.id == id)
    }

    pub fn outputs(&self) -> StepOutputs {
        self.completed
            .iter()
            .map(|c| (c.id.clone(), c.output.clone()))
            .collect()
    }

    /// Output of the last completed step.
    pub fn final_output(&self) -> Option<&Value> {
        self.completed.last().map(|c| &c.output)
    }
}

#[derive(Default)]
pub struct PlanDispatcher {
    executors: HashMap<ProcessorType, Arc<dyn StepExecutor>>,
}

impl PlanDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, processor: ProcessorType, executor: Arc<dyn StepExecutor>) -> Self {
        self.executors.insert(processor, executor);
        self
    }

    pub fn has_executor(&self, processor: ProcessorType) -> bool {
        self.executors.contains_key(&processor)
    }

    pub async fn run(&self, plan: &ExecutionPlan) -> DispatchReport {
        self.resume(plan, DispatchReport::default()).await
    }

    /// Continue a plan from an earlier report, skipping completed steps.
    pub async fn resume(&self, plan: &ExecutionPlan, report: DispatchReport) -> DispatchReport {
        let mut report = DispatchReport {
            completed: report.completed,
            failure: None,
        };
        let retries = plan.routing.execution_params.retries;

        for step in &plan.steps {
            if report.is_completed(&step.id) {
                tracing::debug!(step = %step.id, "step already completed, skipping");
                continue;
            }
            match self.run_step(step, retries, &report).await {
                Ok(completed) => {
                    tracing::info!(step = %step.id, attempts = completed.attempts, "step completed");
                    report.completed.push(completed);
                }
                Err(failure) => {
                    tracing::warn!(step = %step.id, error = %failure.error, "step failed, stopping plan");
                    report.failure = Some(failure);
                    break;
                }
            }
        }
        report
    }

    async fn run_step(
        &self,
        step: &ExecutionStep,
        retries: u32,
        report: &DispatchReport,
    ) -> Result<CompletedStep, StepFailure> {
        let fail = |error: DispatchError, attempts: u32| StepFailure {
            id: step.id.clone(),
            error,
            attempts,
        };

        if let Some(dependency) = step.dependencies.iter().find(|d| !report.is_completed(d)) {
            return Err(fail(
                DispatchError::UnmetDependency {
                    step: step.id.clone(),
                    dependency: dependency.clone(),
                },
                0,
            ));
        }
        let executor = self
            .executors
            .get(&step.processor)
            .ok_or_else(|| fail(DispatchError::MissingExecutor(step.processor.to_string()), 0))?;

        let previous = report.outputs();
        let budget = Duration::from_millis(step.timeout_ms);
        let attempts = retries.saturating_add(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            let error = match tokio::time::timeout(budget, executor.execute(step, &previous)).await {
                Ok(Ok(output)) => {
                    return Ok(CompletedStep {
                        id: step.id.clone(),
                        output,
                        attempts: attempt,
                    })
                }
                Ok(Err(message)) => DispatchError::Executor {
                    step: step.id.clone(),
                    message,
                },
                Err(_) => DispatchError::Timeout {
                    step: step.id.clone(),
                    timeout_ms: step.timeout_ms,
                },
            };
            tracing::debug!(step = %step.id, attempt, error = %error, "step attempt failed");
            last_error = Some(error);
        }

        let error = last_error.unwrap_or_else(|| DispatchError::Executor {
            step: step.id.clone(),
            message: "no attempt was made".to_string(),
        });
        Err(fail(error, attempts))
    }
}
