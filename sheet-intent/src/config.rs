use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::router::ProcessorType;

/// Top-level engine configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub router: RouterConfig,
}

impl EngineConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }
}

/// Classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// LLM provider; `None` runs the heuristic battery only
    pub llm: Option<LlmConfig>,
    /// Budget for a single LLM call, in milliseconds
    pub llm_timeout_ms: u64,
    /// LLM results at or above this confidence are taken without consulting the heuristic
    pub llm_accept_threshold: f64,
    pub cache_enabled: bool,
    /// Skip the LLM for high-precision literal phrasings
    pub bypass_llm_for_literals: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            llm: None,
            llm_timeout_ms: 6000,
            llm_accept_threshold: 0.8,
            cache_enabled: true,
            bypass_llm_for_literals: true,
        }
    }
}

/// Supported LLM providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderType {
    OpenAI,
    Stub,
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider_type: LlmProviderType,
    /// Model name/identifier
    pub model: String,
    /// API key (can be loaded from env)
    #[serde(default)]
    pub api_key: Option<String>,
    /// Base URL for API (optional, for OpenAI-compatible endpoints)
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// HTTP client timeout in seconds
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

fn default_temperature() -> f64 {
    0.1
}

fn default_max_tokens() -> u32 {
    500
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider_type: LlmProviderType::OpenAI,
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            base_url: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_seconds: Some(30),
        }
    }
}

impl LlmConfig {
    pub fn stub() -> Self {
        Self {
            provider_type: LlmProviderType::Stub,
            model: "stub-model".to_string(),
            ..Self::default()
        }
    }

    /// Build an OpenAI-compatible config from the environment.
    ///
    /// Returns `None` when no API key is set.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("SHEET_INTENT_LLM_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .ok()
            .filter(|k| !k.trim().is_empty())?;
        let mut config = Self {
            api_key: Some(api_key),
            ..Self::default()
        };
        if let Ok(model) = std::env::var("SHEET_INTENT_LLM_MODEL") {
            config.model = model;
        }
        if let Ok(base_url) = std::env::var("SHEET_INTENT_LLM_BASE_URL") {
            config.base_url = Some(base_url);
        }
        Some(config)
    }
}

/// Timeout and retry budget assigned to a processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorLimits {
    pub timeout_ms: u64,
    pub retries: u32,
}

impl ProcessorLimits {
    pub const fn new(timeout_ms: u64, retries: u32) -> Self {
        Self {
            timeout_ms,
            retries,
        }
    }
}

/// Router configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub direct_frontend: ProcessorLimits,
    pub direct_backend: ProcessorLimits,
    /// Limits applied to each step of a sequential plan
    pub sequential: ProcessorLimits,
    pub orchestrated: ProcessorLimits,
    pub legacy_fallback: ProcessorLimits,
    /// Processors the capability table may select
    pub enabled_processors: Vec<ProcessorType>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            direct_frontend: ProcessorLimits::new(5_000, 0),
            direct_backend: ProcessorLimits::new(30_000, 2),
            sequential: ProcessorLimits::new(30_000, 1),
            orchestrated: ProcessorLimits::new(60_000, 1),
            legacy_fallback: ProcessorLimits::new(10_000, 0),
            enabled_processors: ProcessorType::ALL.to_vec(),
        }
    }
}

impl RouterConfig {
    pub fn limits(&self, processor: ProcessorType) -> ProcessorLimits {
        match processor {
            ProcessorType::DirectFrontend => self.direct_frontend,
            ProcessorType::DirectBackend => self.direct_backend,
            ProcessorType::Sequential => self.sequential,
            ProcessorType::Orchestrated => self.orchestrated,
            ProcessorType::LegacyFallback => self.legacy_fallback,
        }
    }

    pub fn is_enabled(&self, processor: ProcessorType) -> bool {
        self.enabled_processors.contains(&processor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_engine_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.classifier.llm_timeout_ms, 6000);
        assert_eq!(config.classifier.llm_accept_threshold, 0.8);
        assert!(config.classifier.llm.is_none());
        assert_eq!(
            config.router.limits(ProcessorType::DirectBackend),
            ProcessorLimits::new(30_000, 2)
        );
        assert!(config.router.is_enabled(ProcessorType::Orchestrated));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [classifier]
            llm_timeout_ms = 1500

            [classifier.llm]
            provider_type = "stub"
            model = "scripted"

            [router]
            enabled_processors = ["DIRECT_FRONTEND", "DIRECT_BACKEND", "LEGACY_FALLBACK"]

            [router.direct_frontend]
            timeout_ms = 2000
            retries = 1
            "#,
        )
        .unwrap();
        assert_eq!(config.classifier.llm_timeout_ms, 1500);
        assert!(config.classifier.cache_enabled);
        let llm = config.classifier.llm.unwrap();
        assert_eq!(llm.provider_type, LlmProviderType::Stub);
        assert_eq!(llm.temperature, 0.1);
        assert_eq!(llm.max_tokens, 500);
        assert_eq!(config.router.direct_frontend, ProcessorLimits::new(2000, 1));
        assert_eq!(config.router.orchestrated, ProcessorLimits::new(60_000, 1));
        assert!(!config.router.is_enabled(ProcessorType::Orchestrated));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = EngineConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, "[classifier]\ncache_enabled = false\n").unwrap();
        let config = EngineConfig::load(&path).unwrap();
        assert!(!config.classifier.cache_enabled);
    }
}
