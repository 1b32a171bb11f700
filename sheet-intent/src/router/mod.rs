//! Universal query router
//!
//! Turns a raw query plus lightweight workspace context into an
//! [`ExecutionPlan`]: semantic pre-pass, query-type battery, capability
//! lookup, decision, plan expansion. Any failure along the way yields the
//! fixed legacy-fallback plan.

pub mod plan;
pub mod semantic;
pub mod taxonomy;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::AssertUnwindSafe;

use crate::columns::ColumnMapping;
use crate::config::RouterConfig;
use crate::error::RoutingError;

pub use plan::{ExecutionParams, ExecutionPlan, ExecutionStep, RiskLevel, RoutingDecision};
pub use semantic::{Complexity, SemanticAnalysis};
pub use taxonomy::{classify_query, QueryFamily, QueryType};

/// Executor back-ends a query can be dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessorType {
    DirectFrontend,
    DirectBackend,
    Sequential,
    Orchestrated,
    LegacyFallback,
}

impl ProcessorType {
    /// Fixed order used for fallback lists.
    pub const ALL: [ProcessorType; 5] = [
        ProcessorType::DirectFrontend,
        ProcessorType::DirectBackend,
        ProcessorType::Sequential,
        ProcessorType::Orchestrated,
        ProcessorType::LegacyFallback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessorType::DirectFrontend => "DIRECT_FRONTEND",
            ProcessorType::DirectBackend => "DIRECT_BACKEND",
            ProcessorType::Sequential => "SEQUENTIAL",
            ProcessorType::Orchestrated => "ORCHESTRATED",
            ProcessorType::LegacyFallback => "LEGACY_FALLBACK",
        }
    }
}

impl fmt::Display for ProcessorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static capability table: which processors declare support for a query type,
/// in preference order.
static CAPABILITIES: &[(QueryType, &[ProcessorType])] = &[
    (QueryType::UiBasic, &[ProcessorType::DirectFrontend]),
    (QueryType::UiFormatting, &[ProcessorType::DirectFrontend]),
    (QueryType::UiFiltering, &[ProcessorType::DirectFrontend]),
    (QueryType::UiCellOperations, &[ProcessorType::DirectFrontend]),
    (QueryType::AnalyticsStatistical, &[ProcessorType::DirectBackend]),
    (QueryType::AnalyticsComparative, &[ProcessorType::DirectBackend]),
    (QueryType::AnalyticsTrend, &[ProcessorType::DirectBackend]),
    (QueryType::AnalyticsCorrelation, &[ProcessorType::DirectBackend]),
    (QueryType::AnalyticsPredictive, &[ProcessorType::DirectBackend]),
    (QueryType::AnalyticsAggregation, &[ProcessorType::DirectBackend]),
    (QueryType::VisualizationChart, &[ProcessorType::DirectBackend]),
    (
        QueryType::VisualizationDashboard,
        &[ProcessorType::Orchestrated, ProcessorType::DirectBackend],
    ),
    (
        QueryType::MixedUiAnalytics,
        &[ProcessorType::Sequential, ProcessorType::Orchestrated],
    ),
    (QueryType::MixedAnalyticsViz, &[ProcessorType::DirectBackend]),
    (
        QueryType::TrueCompound,
        &[ProcessorType::Orchestrated, ProcessorType::Sequential],
    ),
];

/// Lightweight workspace context for routing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteContext {
    #[serde(default)]
    pub workspace_id: Option<String>,
    /// Header row of the current table.
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub row_count: usize,
}

impl RouteContext {
    pub fn new(workspace_id: impl Into<String>) -> Self {
        Self {
            workspace_id: Some(workspace_id.into()),
            ..Self::default()
        }
    }

    pub fn with_headers<S: AsRef<str>>(mut self, headers: &[S]) -> Self {
        self.headers = headers.iter().map(|h| h.as_ref().to_string()).collect();
        self
    }
}

pub struct UniversalQueryRouter {
    config: RouterConfig,
}

impl Default for UniversalQueryRouter {
    fn default() -> Self {
        Self::new(RouterConfig::default())
    }
}

impl UniversalQueryRouter {
    pub fn new(config: RouterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Route a query. Always returns a usable plan; errors and panics inside
    /// the pipeline become the legacy-fallback plan.
    pub async fn route(&self, query: &str, context: &RouteContext) -> ExecutionPlan {
        self.route_with(query, context, || self.try_route(query, context))
            .await
    }

    /// Run `pipeline` with failure containment around it.
    async fn route_with<F>(&self, query: &str, context: &RouteContext, pipeline: F) -> ExecutionPlan
    where
        F: FnOnce() -> Result<ExecutionPlan, RoutingError>,
    {
        let outcome = AssertUnwindSafe(async move { pipeline() }).catch_unwind().await;

        let plan = match outcome {
            Ok(Ok(plan)) => plan,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "routing failed, using legacy fallback plan");
                self.legacy_plan(query, &e.to_string())
            }
            Err(_) => {
                tracing::error!("routing pipeline panicked, using legacy fallback plan");
                self.legacy_plan(query, "routing pipeline panicked")
            }
        };

        tracing::info!(
            workspace = context.workspace_id.as_deref().unwrap_or("-"),
            query_type = %plan.routing.query_type,
            processor = %plan.routing.processor_type,
            confidence = plan.routing.confidence,
            risk = ?plan.risk_level,
            steps = plan.steps.len(),
            "query routed"
        );
        plan
    }

    fn legacy_plan(&self, query: &str, reason: &str) -> ExecutionPlan {
        ExecutionPlan::legacy_fallback(query, self.config.legacy_fallback, reason)
    }

    /// The fallible pipeline behind [`route`](Self::route).
    pub fn try_route(&self, query: &str, context: &RouteContext) -> Result<ExecutionPlan, RoutingError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RoutingError::EmptyQuery);
        }

        let columns = ColumnMapping::build(&context.headers);
        let analysis = semantic::analyze(query, &columns);
        let query_type = classify_query(query);
        let decision = self.decide(query_type, &analysis);
        tracing::debug!(
            query_type = %decision.query_type,
            processor = %decision.processor_type,
            complexity = ?analysis.complexity,
            "routing decision"
        );
        plan::build_plan(decision, query, &self.config)
    }

    /// Capability lookup, then the family default, then legacy.
    pub fn select_processor(&self, query_type: QueryType) -> ProcessorType {
        let declared = CAPABILITIES
            .iter()
            .find(|(qt, _)| *qt == query_type)
            .and_then(|(_, processors)| {
                processors
                    .iter()
                    .copied()
                    .find(|p| self.config.is_enabled(*p))
            });
        if let Some(processor) = declared {
            return processor;
        }

        let family_default = match query_type.family() {
            QueryFamily::Analytics | QueryFamily::Visualization => Some(ProcessorType::DirectBackend),
            QueryFamily::Ui => Some(ProcessorType::DirectFrontend),
            _ => None,
        };
        family_default
            .filter(|p| self.config.is_enabled(*p))
            .unwrap_or(ProcessorType::LegacyFallback)
    }

    fn decide(&self, query_type: QueryType, analysis: &SemanticAnalysis) -> RoutingDecision {
        let processor_type = self.select_processor(query_type);
        let confidence = analysis.confidence(query_type != QueryType::Unknown);
        let reasoning = format!(
            "{} query ({:?} complexity, {} entities, {} operations) routed to {}",
            query_type,
            analysis.complexity,
            analysis.entities.len(),
            analysis.operations.len(),
            processor_type
        );
        RoutingDecision {
            query_type,
            processor_type,
            confidence,
            reasoning,
            fallback_options: ProcessorType::ALL
                .iter()
                .copied()
                .filter(|p| *p != processor_type)
                .collect(),
            execution_params: self.config.limits(processor_type).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn comparative_goes_to_backend() {
        let router = UniversalQueryRouter::default();
        let plan = router
            .route(
                "Compare average playtime between single-player and multiplayer games",
                &RouteContext::new("ws-1"),
            )
            .await;
        assert_eq!(plan.routing.query_type, QueryType::AnalyticsComparative);
        assert_eq!(plan.routing.processor_type, ProcessorType::DirectBackend);
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.routing.execution_params.retries, 2);
    }

    #[tokio::test]
    async fn sort_goes_to_frontend() {
        let router = UniversalQueryRouter::default();
        let plan = router.route("Sort column A descending", &RouteContext::default()).await;
        assert_eq!(plan.routing.query_type, QueryType::UiBasic);
        assert_eq!(plan.routing.processor_type, ProcessorType::DirectFrontend);
        assert_eq!(
            plan.routing.fallback_options,
            vec![
                ProcessorType::DirectBackend,
                ProcessorType::Sequential,
                ProcessorType::Orchestrated,
                ProcessorType::LegacyFallback,
            ]
        );
        assert_eq!(plan.risk_level, RiskLevel::Low);
    }

    #[tokio::test]
    async fn empty_query_gets_legacy_plan() {
        let router = UniversalQueryRouter::default();
        let plan = router.route("   ", &RouteContext::default()).await;
        assert_eq!(plan.routing.processor_type, ProcessorType::LegacyFallback);
        assert_eq!(plan.routing.confidence, 0.5);
        assert!(plan.routing.fallback_options.is_empty());
    }

    #[tokio::test]
    async fn panicking_pipeline_yields_legacy_plan() {
        let router = UniversalQueryRouter::default();
        let context = RouteContext::new("ws-1");
        let plan = router
            .route_with("sort column a", &context, || panic!("category battery exploded"))
            .await;
        assert_eq!(plan.routing.processor_type, ProcessorType::LegacyFallback);
        assert_eq!(plan.routing.confidence, 0.5);
        assert!(plan.routing.fallback_options.is_empty());
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].command, "sort column a");
        assert_eq!(plan.risk_level, RiskLevel::High);
        assert!(plan.routing.reasoning.contains("panicked"));
    }

    #[tokio::test]
    async fn pipeline_error_yields_legacy_plan() {
        let router = UniversalQueryRouter::default();
        let plan = router
            .route_with("sort column a", &RouteContext::default(), || {
                Err(RoutingError::Internal("capability table missing".to_string()))
            })
            .await;
        assert_eq!(plan.routing.processor_type, ProcessorType::LegacyFallback);
        assert_eq!(plan.steps.len(), 1);
    }

    #[tokio::test]
    async fn ui_command_with_analytics_noun_stays_on_frontend() {
        let router = UniversalQueryRouter::default();
        let context = RouteContext::new("ws-1").with_headers(&["Name", "Total", "Region"]);
        let plan = router
            .route("highlight rows where total is above 100 and region is east", &context)
            .await;
        assert_eq!(plan.routing.query_type, QueryType::UiFormatting);
        assert_eq!(plan.routing.processor_type, ProcessorType::DirectFrontend);
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].processor, ProcessorType::DirectFrontend);
    }

    #[test]
    fn unknown_query_uses_legacy_processor() {
        let router = UniversalQueryRouter::default();
        assert_eq!(router.select_processor(QueryType::Unknown), ProcessorType::LegacyFallback);
    }

    #[test]
    fn disabled_processors_fall_back_to_family_default() {
        let router = UniversalQueryRouter::new(RouterConfig {
            enabled_processors: vec![ProcessorType::DirectFrontend, ProcessorType::LegacyFallback],
            ..RouterConfig::default()
        });
        assert_eq!(router.select_processor(QueryType::AnalyticsTrend), ProcessorType::LegacyFallback);
        assert_eq!(router.select_processor(QueryType::UiBasic), ProcessorType::DirectFrontend);
        assert_eq!(router.select_processor(QueryType::TrueCompound), ProcessorType::LegacyFallback);

        let no_orchestrator = UniversalQueryRouter::new(RouterConfig {
            enabled_processors: vec![
                ProcessorType::DirectFrontend,
                ProcessorType::DirectBackend,
                ProcessorType::Sequential,
            ],
            ..RouterConfig::default()
        });
        assert_eq!(
            no_orchestrator.select_processor(QueryType::VisualizationDashboard),
            ProcessorType::DirectBackend
        );
        assert_eq!(
            no_orchestrator.select_processor(QueryType::TrueCompound),
            ProcessorType::Sequential
        );
    }

    #[tokio::test]
    async fn mixed_query_becomes_sequential_chain() {
        let router = UniversalQueryRouter::default();
        let plan = router
            .route(
                "highlight the top rows and then calculate the average",
                &RouteContext::default(),
            )
            .await;
        assert_eq!(plan.routing.query_type, QueryType::MixedUiAnalytics);
        assert_eq!(plan.routing.processor_type, ProcessorType::Sequential);
        assert_eq!(plan.steps.len(), 2);
        assert!(plan.validate().is_ok());
    }
}
