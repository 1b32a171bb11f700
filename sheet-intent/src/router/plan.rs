//! Routing decisions and execution plans.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::taxonomy::{classify_query, starts_with_ui_verb, QueryFamily, QueryType};
use super::ProcessorType;
use crate::config::{ProcessorLimits, RouterConfig};
use crate::error::RoutingError;
use crate::extract;

/// Timeout and retry budget attached to a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionParams {
    pub timeout_ms: u64,
    pub retries: u32,
}

impl From<ProcessorLimits> for ExecutionParams {
    fn from(limits: ProcessorLimits) -> Self {
        Self {
            timeout_ms: limits.timeout_ms,
            retries: limits.retries,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingDecision {
    pub query_type: QueryType,
    pub processor_type: ProcessorType,
    pub confidence: f64,
    pub reasoning: String,
    /// Every other processor, in fixed order.
    pub fallback_options: Vec<ProcessorType>,
    pub execution_params: ExecutionParams,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStep {
    pub id: String,
    #[serde(rename = "type")]
    pub processor: ProcessorType,
    pub command: String,
    pub description: String,
    pub dependencies: Vec<String>,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn assess(confidence: f64, processor: ProcessorType) -> Self {
        if confidence >= 0.8 && processor != ProcessorType::LegacyFallback {
            RiskLevel::Low
        } else if confidence >= 0.6 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPlan {
    pub routing: RoutingDecision,
    pub steps: Vec<ExecutionStep>,
    /// Sum of step timeouts.
    pub estimated_time_ms: u64,
    pub risk_level: RiskLevel,
}

pub const LEGACY_CONFIDENCE: f64 = 0.5;

impl ExecutionPlan {
    fn assemble(routing: RoutingDecision, steps: Vec<ExecutionStep>) -> Self {
        let estimated_time_ms = steps.iter().map(|s| s.timeout_ms).sum();
        let risk_level = RiskLevel::assess(routing.confidence, routing.processor_type);
        Self {
            routing,
            steps,
            estimated_time_ms,
            risk_level,
        }
    }

    /// The fixed plan returned whenever the routing pipeline fails.
    pub fn legacy_fallback(query: &str, limits: ProcessorLimits, reason: &str) -> Self {
        let routing = RoutingDecision {
            query_type: QueryType::Unknown,
            processor_type: ProcessorType::LegacyFallback,
            confidence: LEGACY_CONFIDENCE,
            reasoning: format!("Routing failed, using legacy path: {}", reason),
            fallback_options: Vec::new(),
            execution_params: limits.into(),
        };
        let step = ExecutionStep {
            id: step_id(1),
            processor: ProcessorType::LegacyFallback,
            command: query.to_string(),
            description: "Process with the legacy command path".to_string(),
            dependencies: Vec::new(),
            timeout_ms: limits.timeout_ms,
        };
        Self::assemble(routing, vec![step])
    }

    /// Steps are non-empty, ids unique, and every dependency names an earlier step.
    pub fn validate(&self) -> Result<(), RoutingError> {
        if self.steps.is_empty() {
            return Err(RoutingError::InvalidPlan("plan has no steps".to_string()));
        }
        let mut seen: HashSet<&str> = HashSet::new();
        for step in &self.steps {
            for dependency in &step.dependencies {
                if !seen.contains(dependency.as_str()) {
                    return Err(RoutingError::InvalidPlan(format!(
                        "step '{}' depends on unknown or later step '{}'",
                        step.id, dependency
                    )));
                }
            }
            if !seen.insert(step.id.as_str()) {
                return Err(RoutingError::InvalidPlan(format!(
                    "duplicate step id '{}'",
                    step.id
                )));
            }
        }
        Ok(())
    }

    pub fn step(&self, id: &str) -> Option<&ExecutionStep> {
        self.steps.iter().find(|s| s.id == id)
    }
}

pub fn step_id(n: usize) -> String {
    format!("step-{}", n)
}

fn describe(processor: ProcessorType) -> &'static str {
    match processor {
        ProcessorType::DirectFrontend => "Apply directly in the spreadsheet",
        ProcessorType::DirectBackend => "Answer with the backend analytics agent",
        ProcessorType::Sequential => "Run as an ordered sequence",
        ProcessorType::Orchestrated => "Coordinate with the orchestrator",
        ProcessorType::LegacyFallback => "Process with the legacy command path",
    }
}

/// Direct-frontend for UI clauses, direct-backend for analytics and charts.
/// A clause the battery cannot place on either side goes by its leading verb.
fn clause_processor(clause: &str) -> ProcessorType {
    match classify_query(clause).family() {
        QueryFamily::Ui => ProcessorType::DirectFrontend,
        QueryFamily::Analytics | QueryFamily::Visualization => ProcessorType::DirectBackend,
        QueryFamily::Mixed | QueryFamily::Compound | QueryFamily::Unknown => {
            if starts_with_ui_verb(clause) {
                ProcessorType::DirectFrontend
            } else {
                ProcessorType::DirectBackend
            }
        }
    }
}

/// Expand a decision into its plan.
///
/// Sequential routings get one step per clause, chained in stated order;
/// every other processor gets a single step carrying the whole query.
pub fn build_plan(
    routing: RoutingDecision,
    query: &str,
    config: &RouterConfig,
) -> Result<ExecutionPlan, RoutingError> {
    let steps = match routing.processor_type {
        ProcessorType::Sequential => {
            let clauses = extract::split_sub_commands(query);
            let clauses = if clauses.is_empty() {
                vec![query.trim().to_string()]
            } else {
                clauses
            };
            let per_step = config.limits(ProcessorType::Sequential);
            clauses
                .into_iter()
                .enumerate()
                .map(|(i, clause)| {
                    let processor = clause_processor(&clause);
                    ExecutionStep {
                        id: step_id(i + 1),
                        processor,
                        description: format!("{} (part {})", describe(processor), i + 1),
                        command: clause,
                        dependencies: if i == 0 {
                            Vec::new()
                        } else {
                            vec![step_id(i)]
                        },
                        timeout_ms: per_step.timeout_ms,
                    }
                })
                .collect()
        }
        processor => vec![ExecutionStep {
            id: step_id(1),
            processor,
            command: query.trim().to_string(),
            description: describe(processor).to_string(),
            dependencies: Vec::new(),
            timeout_ms: routing.execution_params.timeout_ms,
        }],
    };

    let plan = ExecutionPlan::assemble(routing, steps);
    plan.validate()?;
    Ok(plan)
}
