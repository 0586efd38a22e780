//! OpenAI-compatible Chat Client
//!
//! Implementation of `ModelClient` for any `/chat/completions` endpoint
//! (Cerebras, OpenAI, Groq, vLLM, a local proxy...).

use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    language::{Prompt, ToolDescriptor},
    message::{Message, Role},
    provider::{ModelClient, ModelReply, ToolCallRequest},
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.cerebras.ai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b";

/// Chat client configuration
#[derive(Clone, Debug)]
pub struct ChatConfig {
    /// API base URL, without the `/chat/completions` suffix
    pub base_url: String,

    /// Bearer token; requests are unauthenticated when absent
    pub api_key: Option<String>,

    pub model: String,

    pub max_tokens: u32,

    /// Sampling temperature; the server default applies when absent
    pub temperature: Option<f32>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: None,
            model: DEFAULT_MODEL.into(),
            max_tokens: 8192,
            temperature: None,
            timeout_secs: 120,
        }
    }
}

impl ChatConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparsable numbers fall back to
    /// the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            base_url: non_empty("MODEL_BASE_URL").unwrap_or(defaults.base_url),
            api_key: non_empty("MODEL_API_KEY").or_else(|| non_empty("CEREBRAS_API_KEY")),
            model: non_empty("MODEL_NAME").unwrap_or(defaults.model),
            max_tokens: non_empty("MODEL_MAX_TOKENS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_tokens),
            temperature: non_empty("MODEL_TEMPERATURE").and_then(|v| v.parse().ok()),
            timeout_secs: non_empty("MODEL_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }
}

/// HTTP chat-completions client
pub struct ChatClient {
    client: reqwest::Client,
    config: ChatConfig,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .field("authenticated", &self.config.api_key.is_some())
            .finish_non_exhaustive()
    }
}

impl ChatClient {
    /// Create from configuration
    pub fn from_config(config: ChatConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(ChatConfig::from_env())
    }

    pub const fn config(&self) -> &ChatConfig {
        &self.config
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.config.base_url.trim_end_matches('/'))
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    /// Whether the endpoint answers its model listing
    pub async fn health_check(&self) -> Result<bool> {
        match self.request(self.client.get(self.url("models"))).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                warn!(error = %e, "chat endpoint health check failed");
                Ok(false)
            }
        }
    }

    /// Convert prompt messages to the wire format
    fn convert_messages(messages: &[Message]) -> Vec<WireMessage<'_>> {
        messages
            .iter()
            .map(|m| WireMessage {
                role: m.role,
                content: &m.content,
                tool_calls: m.tool_calls.as_ref().map(|calls| {
                    calls
                        .iter()
                        .map(|c| WireToolCall {
                            id: c.id.as_deref().unwrap_or_default(),
                            kind: "function",
                            function: WireFunction {
                                name: &c.name,
                                arguments: &c.arguments,
                            },
                        })
                        .collect()
                }),
            })
            .collect()
    }

    /// Convert the first choice into a reply
    fn convert_reply(response: ChatResponse) -> Result<ModelReply> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Provider("Response contained no choices".into()))?;

        let calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| {
                // some servers send arguments as an object instead of a string
                let arguments = match call.function.arguments {
                    Value::String(s) => s,
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                let request = ToolCallRequest::new(call.function.name, arguments);
                match call.id {
                    Some(id) => request.with_id(id),
                    None => request,
                }
            })
            .collect();

        Ok(ModelReply::from_parts(choice.message.content, calls))
    }

    fn status_error(status: StatusCode, body: &str) -> AgentError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                AgentError::Auth(format!("{status}: {body}"))
            }
            StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimited(format!("{status}: {body}")),
            _ => AgentError::Provider(format!("{status}: {body}")),
        }
    }
}

#[async_trait]
impl ModelClient for ChatClient {
    async fn generate(&self, prompt: &Prompt) -> Result<ModelReply> {
        debug!(
            model = %self.config.model,
            messages = prompt.messages.len(),
            tools = prompt.tools.len(),
            "Calling chat endpoint"
        );

        let body = ChatRequest {
            model: &self.config.model,
            messages: Self::convert_messages(&prompt.messages),
            tool_choice: (!prompt.tools.is_empty()).then_some("auto"),
            tools: &prompt.tools,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .request(self.client.post(self.url("chat/completions")))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP request failed");
                AgentError::ProviderUnavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".into());
            error!(status = %status, body = %text, "chat endpoint returned an error");
            return Err(Self::status_error(status, &text));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse chat response");
            AgentError::Provider(format!("Invalid chat response: {e}"))
        })?;

        let reply = Self::convert_reply(parsed)?;
        debug!(tool_calls = reply.tool_calls().len(), "Chat response received");
        Ok(reply)
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    tools: &'a [ToolDescriptor],
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: Role,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall<'a>>>,
}

#[derive(Serialize)]
struct WireToolCall<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunction<'a>,
}

#[derive(Serialize)]
struct WireFunction<'a> {
    name: &'a str,
    arguments: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ResponseToolCall>>,
}

#[derive(Deserialize)]
struct ResponseToolCall {
    #[serde(default)]
    id: Option<String>,
    function: ResponseFunction,
}

#[derive(Deserialize)]
struct ResponseFunction {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::language::FunctionDescriptor;
    use serde_json::json;
    use std::collections::HashMap;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: &str, api_key: Option<&str>) -> ChatClient {
        ChatClient::from_config(ChatConfig {
            base_url: base_url.into(),
            api_key: api_key.map(String::from),
            ..ChatConfig::default()
        })
        .unwrap()
    }

    fn prompt_with_tool() -> Prompt {
        Prompt {
            messages: vec![Message::system("Main Goals: win"), Message::user("your move")],
            tools: vec![ToolDescriptor {
                kind: "function".into(),
                function: FunctionDescriptor {
                    name: "implement_next_move".into(),
                    description: "Place a mark".into(),
                    parameters: json!({"type": "object", "properties": {}, "required": []}),
                },
            }],
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = ChatConfig::from_lookup(|_| None);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert!(config.api_key.is_none());
        assert!(config.temperature.is_none());
        assert_eq!(config.timeout_secs, 120);
    }

    #[test]
    fn test_config_from_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("MODEL_BASE_URL", "http://localhost:8000/v1"),
            ("CEREBRAS_API_KEY", "csk-123"),
            ("MODEL_MAX_TOKENS", "512"),
            ("MODEL_TEMPERATURE", "0.2"),
            ("MODEL_TIMEOUT_SECS", "not a number"),
        ]);
        let config = ChatConfig::from_lookup(|k| vars.get(k).map(|v| (*v).to_string()));

        assert_eq!(config.base_url, "http://localhost:8000/v1");
        assert_eq!(config.api_key.as_deref(), Some("csk-123"));
        assert_eq!(config.max_tokens, 512);
        assert_eq!(config.temperature, Some(0.2));
        assert_eq!(config.timeout_secs, 120);
    }

    #[test]
    fn test_url_trailing_slash() {
        let client = client("https://api.example.com/v1/", None);
        assert_eq!(client.url("chat/completions"), "https://api.example.com/v1/chat/completions");
    }

    #[test]
    fn test_message_conversion() {
        let reply = ModelReply::ToolCalls {
            content: None,
            calls: vec![ToolCallRequest::new("move", r#"{"row": 1}"#).with_id("call_1")],
        };
        let messages = vec![Message::user("go"), Message::from_reply(&reply)];

        let wire = serde_json::to_value(ChatClient::convert_messages(&messages)).unwrap();
        assert_eq!(wire[0], json!({"role": "user", "content": "go"}));
        assert_eq!(wire[1]["role"], "assistant");
        assert_eq!(wire[1]["content"], "");
        assert_eq!(wire[1]["tool_calls"][0]["id"], "call_1");
        assert_eq!(wire[1]["tool_calls"][0]["type"], "function");
        assert_eq!(wire[1]["tool_calls"][0]["function"]["arguments"], r#"{"row": 1}"#);
    }

    #[tokio::test]
    async fn test_generate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(json!({"model": DEFAULT_MODEL})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-1",
                "choices": [{
                    "message": {"role": "assistant", "content": "Good game!", "tool_calls": null},
                    "finish_reason": "stop"
                }]
            })))
            .mount(&server)
            .await;

        let reply = client(&server.uri(), Some("test-key"))
            .generate(&Prompt {
                messages: vec![Message::user("hi")],
                tools: Vec::new(),
            })
            .await
            .unwrap();

        assert_eq!(reply, ModelReply::text("Good game!"));
    }

    #[tokio::test]
    async fn test_generate_tool_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({
                "tool_choice": "auto",
                "tools": [{"type": "function", "function": {"name": "implement_next_move"}}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "message": {
                        "content": null,
                        "tool_calls": [
                            {
                                "id": "call_abc",
                                "type": "function",
                                "function": {
                                    "name": "implement_next_move",
                                    "arguments": "{\"row\": 0, \"col\": 2}"
                                }
                            },
                            {
                                "id": "call_def",
                                "type": "function",
                                "function": {"name": "implement_next_move", "arguments": {"row": 1, "col": 1}}
                            }
                        ]
                    },
                    "finish_reason": "tool_calls"
                }]
            })))
            .mount(&server)
            .await;

        let reply = client(&server.uri(), None)
            .generate(&prompt_with_tool())
            .await
            .unwrap();

        let calls = reply.tool_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id.as_deref(), Some("call_abc"));
        assert_eq!(calls[0].name, "implement_next_move");
        assert_eq!(calls[0].arguments, r#"{"row": 0, "col": 2}"#);
        let second: Value = serde_json::from_str(&calls[1].arguments).unwrap();
        assert_eq!(second, json!({"row": 1, "col": 1}));
        assert_eq!(reply.content(), None);
    }

    #[tokio::test]
    async fn test_error_statuses() {
        for status in [401u16, 403, 429, 500] {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/chat/completions"))
                .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
                .mount(&server)
                .await;

            let err = client(&server.uri(), None)
                .generate(&prompt_with_tool())
                .await
                .unwrap_err();
            let mapped = match status {
                401 | 403 => matches!(err, AgentError::Auth(_)),
                429 => matches!(err, AgentError::RateLimited(_)),
                _ => matches!(err, AgentError::Provider(_)),
            };
            assert!(mapped, "status {status} mapped to {err:?}");
        }
    }

    #[tokio::test]
    async fn test_empty_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = client(&server.uri(), None)
            .generate(&prompt_with_tool())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Provider(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let err = client("http://127.0.0.1:1", None)
            .generate(&prompt_with_tool())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::ProviderUnavailable(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .mount(&server)
            .await;

        assert!(client(&server.uri(), None).health_check().await.unwrap());
        assert!(!client("http://127.0.0.1:1", None).health_check().await.unwrap());
    }
}
