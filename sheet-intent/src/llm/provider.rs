use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::{LlmConfig, LlmProviderType};
use crate::error::LlmError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const BODY_PREVIEW_CHARS: usize = 400;

/// Chat message in a completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// `{ model, messages, temperature, max_tokens }` request sent to the text-generation service
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Information about an LLM provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmProviderInfo {
    pub name: String,
    pub model: String,
}

/// Abstract interface for text-generation services
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Return the single text completion for a request
    async fn generate_text(&self, request: &CompletionRequest) -> Result<String, LlmError>;

    /// Get provider information
    fn info(&self) -> LlmProviderInfo;
}

/// OpenAI-compatible provider (works with OpenAI and OpenRouter)
pub struct OpenAiLlmProvider {
    config: LlmConfig,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiLlmProvider {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| LlmError::MissingApiKey("OpenAI".to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.unwrap_or(30)))
            .build()
            .map_err(|e| LlmError::Client(e.to_string()))?;
        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    fn endpoint(&self) -> String {
        let base_url = self
            .config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');
        format!("{}/chat/completions", base_url)
    }
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

fn preview(body: &str) -> String {
    if body.chars().count() > BODY_PREVIEW_CHARS {
        let head: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
        format!("{}... [truncated, {} bytes]", head, body.len())
    } else {
        body.to_string()
    }
}

#[async_trait]
impl LlmProvider for OpenAiLlmProvider {
    async fn generate_text(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let url = self.endpoint();
        tracing::debug!(%url, model = %request.model, "sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(request)
            .send()
            .await
            .map_err(|e| LlmError::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: preview(&body),
            });
        }

        let parsed: OpenAiResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::Envelope(e.to_string()))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::Envelope("no choices in response".to_string()))?;
        if content.trim().is_empty() {
            return Err(LlmError::EmptyCompletion);
        }
        Ok(content)
    }

    fn info(&self) -> LlmProviderInfo {
        LlmProviderInfo {
            name: "OpenAI".to_string(),
            model: self.config.model.clone(),
        }
    }
}

/// One scripted behaviour of the stub provider.
#[derive(Debug, Clone)]
pub enum StubReply {
    /// Return this text as the completion.
    Text(String),
    /// Fail with an HTTP-style error.
    Fail(String),
    /// Wait this long, then return the text.
    Delayed(Duration, String),
    /// Never answer within any reasonable budget.
    Hang,
}

/// Stub LLM provider for tests and offline use.
///
/// Replies are consumed in order; when the script runs out the last reply
/// is repeated, and an empty script yields [`LlmError::StubExhausted`].
pub struct StubLlmProvider {
    config: LlmConfig,
    replies: Mutex<VecDeque<StubReply>>,
    last: Mutex<Option<StubReply>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl StubLlmProvider {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            config,
            replies: Mutex::new(VecDeque::new()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A stub answering every request with the given text.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::with_script(vec![StubReply::Text(text.into())])
    }

    pub fn with_script(replies: Vec<StubReply>) -> Self {
        let stub = Self::new(LlmConfig::stub());
        if let Ok(mut queue) = stub.replies.lock() {
            queue.extend(replies);
        }
        stub
    }

    pub fn push(&self, reply: StubReply) {
        if let Ok(mut queue) = self.replies.lock() {
            queue.push_back(reply);
        }
    }

    /// Number of completion requests received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests.lock().ok().and_then(|r| r.last().cloned())
    }

    fn next_reply(&self) -> Option<StubReply> {
        let next = self.replies.lock().ok().and_then(|mut q| q.pop_front());
        let mut last = self.last.lock().ok()?;
        match next {
            Some(reply) => {
                *last = Some(reply.clone());
                Some(reply)
            }
            None => last.clone(),
        }
    }
}

#[async_trait]
impl LlmProvider for StubLlmProvider {
    async fn generate_text(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        match self.next_reply().ok_or(LlmError::StubExhausted)? {
            StubReply::Text(text) => Ok(text),
            StubReply::Fail(message) => Err(LlmError::Http(message)),
            StubReply::Delayed(delay, text) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
            StubReply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(LlmError::Http("stub hang elapsed".to_string()))
            }
        }
    }

    fn info(&self) -> LlmProviderInfo {
        LlmProviderInfo {
            name: "Stub".to_string(),
            model: self.config.model.clone(),
        }
    }
}

/// Factory for creating LLM providers
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    pub fn create(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
        match config.provider_type {
            LlmProviderType::OpenAI => Ok(Arc::new(OpenAiLlmProvider::new(config.clone())?)),
            LlmProviderType::Stub => {
                tracing::warn!("using stub LLM provider; replies are scripted");
                Ok(Arc::new(StubLlmProvider::new(config.clone())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "m".to_string(),
            messages: vec![ChatMessage::user("hi")],
            temperature: 0.1,
            max_tokens: 10,
        }
    }

    #[test]
    fn request_serializes_to_chat_shape() {
        let json = serde_json::to_value(request()).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 10);
    }

    #[test]
    fn openai_requires_api_key() {
        let err = LlmProviderFactory::create(&LlmConfig::default()).err().unwrap();
        assert!(matches!(err, LlmError::MissingApiKey(_)));
    }

    #[test]
    fn endpoint_joins_base_url() {
        let provider = OpenAiLlmProvider::new(LlmConfig {
            api_key: Some("k".to_string()),
            base_url: Some("https://openrouter.ai/api/v1/".to_string()),
            ..LlmConfig::default()
        })
        .unwrap();
        assert_eq!(provider.endpoint(), "https://openrouter.ai/api/v1/chat/completions");
        assert_eq!(provider.info().name, "OpenAI");
    }

    #[tokio::test]
    async fn stub_plays_script_then_repeats_last() {
        let stub = StubLlmProvider::with_script(vec![
            StubReply::Fail("boom".to_string()),
            StubReply::Text("{}".to_string()),
        ]);
        assert!(matches!(stub.generate_text(&request()).await, Err(LlmError::Http(_))));
        assert_eq!(stub.generate_text(&request()).await.unwrap(), "{}");
        assert_eq!(stub.generate_text(&request()).await.unwrap(), "{}");
        assert_eq!(stub.calls(), 3);
        assert_eq!(stub.last_request(), Some(request()));
    }

    #[tokio::test]
    async fn empty_stub_is_exhausted() {
        let stub = StubLlmProvider::new(LlmConfig::stub());
        assert!(matches!(
            stub.generate_text(&request()).await,
            Err(LlmError::StubExhausted)
        ));
    }
}
