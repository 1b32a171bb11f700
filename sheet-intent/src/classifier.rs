//! The `classify` entry point.
//!
//! Stages, in order: cache, priority matcher, literal bypass, LLM with
//! heuristic arbitration, heuristic battery. Every path ends in a clamped,
//! cached [`Classification`]; nothing escapes as an error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::cache::{CacheStats, ClassificationCache};
use crate::columns::ColumnMapping;
use crate::config::ClassifierConfig;
use crate::heuristic::{self, RuleInput};
use crate::llm::{LlmClassifier, LlmProvider, LlmProviderFactory};
use crate::priority;
use crate::types::{clamp_confidence, Classification};

/// High-precision phrasings that go straight to the heuristic battery.
static LITERAL_BYPASS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)^(?:please\s+)?(?:create|make|insert|add)\s+(?:a\s+|an\s+)?(?:new\s+)?table\s*[.!]*$").unwrap(),
        Regex::new(r"(?i)^(?:please\s+)?(?:remove|delete)\s+(?:all\s+)?(?:the\s+)?duplicates\s*[.!]*$").unwrap(),
    ]
});

/// Which stage produced a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Cache,
    Priority,
    LiteralBypass,
    Llm,
    Heuristic,
    /// The LLM failed and the heuristic result was used instead.
    HeuristicFallback,
}

pub struct CommandClassifier {
    config: ClassifierConfig,
    llm: Option<LlmClassifier>,
    columns: RwLock<ColumnMapping>,
    cache: ClassificationCache,
}

impl CommandClassifier {
    /// Build with an explicit provider; `None` runs without the LLM stage.
    pub fn new(config: ClassifierConfig, provider: Option<Arc<dyn LlmProvider>>) -> Self {
        let budget = Duration::from_millis(config.llm_timeout_ms);
        let llm_config = config.llm.clone().unwrap_or_default();
        let llm = provider.map(|p| LlmClassifier::new(p, &llm_config, budget));
        Self {
            config,
            llm,
            columns: RwLock::new(ColumnMapping::new()),
            cache: ClassificationCache::new(),
        }
    }

    /// Build the provider from `config.llm`. A provider that cannot be
    /// constructed leaves the classifier in heuristic-only mode.
    pub fn from_config(config: ClassifierConfig) -> Self {
        let provider = match &config.llm {
            Some(llm_config) => match LlmProviderFactory::create(llm_config) {
                Ok(provider) => Some(provider),
                Err(e) => {
                    tracing::warn!(error = %e, "LLM provider unavailable, using heuristics only");
                    None
                }
            },
            None => None,
        };
        Self::new(config, provider)
    }

    pub fn heuristic_only() -> Self {
        Self::new(ClassifierConfig::default(), None)
    }

    pub fn has_llm(&self) -> bool {
        self.llm.is_some()
    }

    /// Rebuild the column mapping from a header row and drop cached results.
    pub fn update_columns<S: AsRef<str>>(&self, headers: &[S]) {
        let mapping = ColumnMapping::build(headers);
        tracing::debug!(columns = mapping.headers().len(), aliases = mapping.alias_count(), "column mapping rebuilt");
        if let Ok(mut columns) = self.columns.write() {
            *columns = mapping;
        }
        self.cache.clear();
    }

    pub fn columns(&self) -> ColumnMapping {
        self.columns.read().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub async fn classify(&self, text: &str) -> Classification {
        self.classify_with_stage(text).await.0
    }

    /// Classify and report which stage resolved the command.
    pub async fn classify_with_stage(&self, text: &str) -> (Classification, Stage) {
        let normalized = ClassificationCache::key(text);

        if self.config.cache_enabled {
            if let Some(cached) = self.cache.get(&normalized) {
                tracing::debug!(input = %normalized, "classification cache hit");
                return (cached, Stage::Cache);
            }
        }

        let columns = self.columns();
        let (mut classification, stage) = self.resolve(&normalized, &columns).await;
        classification.confidence = clamp_confidence(classification.confidence);

        tracing::info!(
            intent = %classification.intent,
            action = %classification.action,
            confidence = classification.confidence,
            stage = ?stage,
            "command classified"
        );

        if self.config.cache_enabled {
            self.cache.set(&normalized, classification.clone());
        }
        (classification, stage)
    }

    async fn resolve(&self, text: &str, columns: &ColumnMapping) -> (Classification, Stage) {
        if text.is_empty() {
            return (Classification::unknown("Empty command"), Stage::Heuristic);
        }

        let input = RuleInput::new(text, columns);
        if let Some((classification, rule)) = priority::match_priority(&input) {
            tracing::debug!(rule, "priority rule matched");
            return (classification, Stage::Priority);
        }

        if self.config.bypass_llm_for_literals && LITERAL_BYPASS.iter().any(|re| re.is_match(text)) {
            return (heuristic::classify(&input), Stage::LiteralBypass);
        }

        let Some(llm) = &self.llm else {
            return (heuristic::classify(&input), Stage::Heuristic);
        };

        match llm.classify(text, columns).await {
            Ok(from_llm) if from_llm.confidence >= self.config.llm_accept_threshold => {
                (from_llm, Stage::Llm)
            }
            Ok(from_llm) => {
                let from_rules = heuristic::classify(&input);
                tracing::debug!(
                    llm = from_llm.confidence,
                    heuristic = from_rules.confidence,
                    "LLM below threshold, arbitrating"
                );
                if from_rules.confidence > from_llm.confidence {
                    (from_rules, Stage::Heuristic)
                } else {
                    (from_llm, Stage::Llm)
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "LLM classification failed, falling back to heuristics");
                (heuristic::classify(&input), Stage::HeuristicFallback)
            }
        }
    }
}
