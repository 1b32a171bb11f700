// sheet-intent library
// Natural-language command classification and query routing for spreadsheet workspaces

pub mod cache;
pub mod classifier;
pub mod columns;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod extract;
pub mod heuristic;
pub mod llm;
pub mod patterns;
pub mod priority;
pub mod router;
pub mod types;

pub use cache::{CacheStats, ClassificationCache};
pub use classifier::{CommandClassifier, Stage};
pub use columns::ColumnMapping;
pub use command::SpreadsheetCommand;
pub use config::{ClassifierConfig, EngineConfig, LlmConfig, LlmProviderType, RouterConfig};
pub use dispatch::{DispatchReport, PlanDispatcher, StepExecutor, StepOutputs};
pub use error::{ClassifierError, ConfigError, DispatchError, LlmError, RoutingError};
pub use llm::{LlmProvider, LlmProviderFactory, StubLlmProvider, StubReply};
pub use router::{
    ExecutionPlan, ExecutionStep, ProcessorType, QueryType, RiskLevel, RouteContext,
    RoutingDecision, UniversalQueryRouter,
};
pub use types::{Classification, Intent, Target, TargetType};
