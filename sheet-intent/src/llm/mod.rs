//! LLM-assisted classification: provider abstraction, prompt, reply parsing.

pub mod parsing;
pub mod prompt;
pub mod provider;

use std::sync::Arc;
use std::time::Duration;

use crate::columns::ColumnMapping;
use crate::config::LlmConfig;
use crate::error::ClassifierError;
use crate::types::Classification;

pub use parsing::parse_classification;
pub use provider::{
    ChatMessage, CompletionRequest, LlmProvider, LlmProviderFactory, LlmProviderInfo,
    OpenAiLlmProvider, StubLlmProvider, StubReply,
};

/// One bounded classification call against a provider.
pub struct LlmClassifier {
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: f64,
    max_tokens: u32,
    budget: Duration,
}

impl LlmClassifier {
    pub fn new(provider: Arc<dyn LlmProvider>, config: &LlmConfig, budget: Duration) -> Self {
        Self {
            provider,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            budget,
        }
    }

    pub fn provider_info(&self) -> LlmProviderInfo {
        self.provider.info()
    }

    pub fn request(&self, text: &str, columns: &ColumnMapping) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            messages: prompt::build_messages(text, columns),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Ask the provider, cancelling after the budget. Timeouts, transport
    /// errors and unparseable replies all come back as `Err`.
    pub async fn classify(
        &self,
        text: &str,
        columns: &ColumnMapping,
    ) -> Result<Classification, ClassifierError> {
        let request = self.request(text, columns);
        let reply = tokio::time::timeout(self.budget, self.provider.generate_text(&request))
            .await
            .map_err(|_| ClassifierError::Timeout {
                budget_ms: self.budget.as_millis() as u64,
            })??;
        parse_classification(&reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Intent;

    fn classifier(stub: StubLlmProvider, budget_ms: u64) -> LlmClassifier {
        LlmClassifier::new(
            Arc::new(stub),
            &LlmConfig::stub(),
            Duration::from_millis(budget_ms),
        )
    }

    #[tokio::test]
    async fn reply_is_parsed() {
        let llm = classifier(
            StubLlmProvider::replying(r#"{"intent":"sort","action":"sort_data","confidence":0.9}"#),
            1000,
        );
        let c = llm.classify("sort it", &ColumnMapping::new()).await.unwrap();
        assert_eq!(c.intent, Intent::Sort);
    }

    #[tokio::test]
    async fn hung_provider_times_out() {
        let llm = classifier(StubLlmProvider::with_script(vec![StubReply::Hang]), 20);
        let err = llm.classify("sort it", &ColumnMapping::new()).await.unwrap_err();
        assert!(matches!(err, ClassifierError::Timeout { budget_ms: 20 }));
    }

    #[tokio::test]
    async fn transport_errors_propagate() {
        let llm = classifier(
            StubLlmProvider::with_script(vec![StubReply::Fail("refused".to_string())]),
            1000,
        );
        let err = llm.classify("x", &ColumnMapping::new()).await.unwrap_err();
        assert!(matches!(err, ClassifierError::Llm(_)));
    }

    #[test]
    fn request_carries_config_and_prompt() {
        let llm = classifier(StubLlmProvider::replying("{}"), 1000);
        let request = llm.request("sort it", &ColumnMapping::new());
        assert_eq!(request.model, LlmConfig::stub().model);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[1].content, "Command: sort it");
    }
}
