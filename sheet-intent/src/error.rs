//! Error types for each seam of the engine.
//!
//! None of these escape `classify` or `route`: both entry points convert
//! failures into a fallback value at a single place.

use thiserror::Error;

/// Failures talking to the text-generation service.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    #[error("API key required for {0} provider")]
    MissingApiKey(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("LLM API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected LLM response envelope: {0}")]
    Envelope(String),

    #[error("LLM returned an empty completion")]
    EmptyCompletion,

    #[error("Stub provider has no scripted reply left")]
    StubExhausted,
}

/// Failures on the LLM-assisted classification path.
///
/// Every variant makes the caller fall back to the heuristic battery.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("LLM call exceeded the {budget_ms}ms budget")]
    Timeout { budget_ms: u64 },

    #[error("No parseable JSON object in LLM reply: {0}")]
    Parse(String),

    #[error("LLM reply is not a JSON object: {0}")]
    InvalidReply(String),
}

/// Failures inside the routing pipeline.
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("Query is empty")]
    EmptyQuery,

    #[error("Invalid execution plan: {0}")]
    InvalidPlan(String),

    #[error("Routing pipeline failed: {0}")]
    Internal(String),
}

/// Failures loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Failures while running a plan against executors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DispatchError {
    #[error("No executor registered for processor {0}")]
    MissingExecutor(String),

    #[error("Step '{step}' depends on '{dependency}' which has not completed")]
    UnmetDependency { step: String, dependency: String },

    #[error("Step '{step}' timed out after {timeout_ms}ms")]
    Timeout { step: String, timeout_ms: u64 },

    #[error("Step '{step}' failed: {message}")]
    Executor { step: String, message: String },
}
