//! LLM Client: the single point of entry for all AI gateway calls in Career Compass.
//!
//! ARCHITECTURAL RULE: No other module may call the gateway directly.
//! All LLM interactions MUST go through this module.
//!
//! Model: google/gemini-2.5-flash (hardcoded, not configurable)
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;
pub mod sse;

use self::sse::{SseDecoder, SseItem};

/// The model used for all LLM calls in Career Compass.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "google/gemini-2.5-flash";
const MAX_RETRIES: u32 = 3;
/// Total time allowed for a non-streaming completion, body included.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("Usage limit reached")]
    UsageLimit,

    #[error("Stream interrupted: {0}")]
    Stream(String),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("No JSON object found in LLM output")]
    NoJson,
}

/// A chat turn as sent to the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<GatewayMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct GatewayMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
}

impl LlmResponse {
    /// Extracts the text content of the first choice.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct GatewayError {
    error: GatewayErrorBody,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GatewayErrorBody {
    Detailed { message: String },
    Plain(String),
}

/// Ordered text fragments decoded from a streaming completion.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// A source of streamed chat completions.
///
/// Carried in `AppState` as `Arc<dyn CompletionSource>` so the chat endpoint can be driven
/// by something other than the live gateway.
#[async_trait]
pub trait CompletionSource: Send + Sync {
    async fn stream_chat(
        &self,
        messages: &[ChatTurn],
        system: &str,
    ) -> Result<FragmentStream, LlmError>;
}

/// The single LLM client used by all services in Career Compass.
/// Wraps the OpenAI-compatible gateway with retry logic, structured output helpers,
/// and SSE streaming.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    /// No total timeout: a streamed reply may legitimately outlast `REQUEST_TIMEOUT`.
    stream_client: Client,
    api_key: String,
    gateway_url: String,
}

impl LlmClient {
    pub fn new(api_key: String, gateway_url: String) -> Self {
        Self::with_request_timeout(api_key, gateway_url, REQUEST_TIMEOUT)
    }

    /// Like `new`, with a custom total timeout for non-streaming calls.
    pub fn with_request_timeout(
        api_key: String,
        gateway_url: String,
        request_timeout: Duration,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(request_timeout)
                .connect_timeout(CONNECT_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            stream_client: Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key,
            gateway_url,
        }
    }

    async fn post(
        &self,
        messages: &[ChatTurn],
        system: &str,
        stream: bool,
    ) -> Result<Response, reqwest::Error> {
        let mut wire = Vec::with_capacity(messages.len() + 1);
        wire.push(GatewayMessage {
            role: "system",
            content: system,
        });
        wire.extend(messages.iter().map(|m| GatewayMessage {
            role: &m.role,
            content: &m.content,
        }));

        let request_body = CompletionRequest {
            model: MODEL,
            messages: wire,
            stream,
        };

        let client = if stream {
            &self.stream_client
        } else {
            &self.client
        };

        client
            .post(&self.gateway_url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
    }

    /// Makes a non-streaming completion call, returning the full response object.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    /// 402 (usage limit) is returned immediately.
    pub async fn call(
        &self,
        messages: &[ChatTurn],
        system: &str,
    ) -> Result<LlmResponse, LlmError> {
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self.post(messages, system, false).await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("AI gateway returned {}: {}", status, body);
                last_error = Some(if status.as_u16() == 429 {
                    LlmError::RateLimited { retries: attempt }
                } else {
                    LlmError::Api {
                        status: status.as_u16(),
                        message: body,
                    }
                });
                continue;
            }

            if !status.is_success() {
                return Err(status_error(response).await);
            }

            let llm_response: LlmResponse = response.json().await?;

            if let Some(usage) = &llm_response.usage {
                debug!(
                    "LLM call succeeded: prompt_tokens={:?}, completion_tokens={:?}",
                    usage.prompt_tokens, usage.completion_tokens
                );
            }

            return Ok(llm_response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }

    /// Convenience method that calls the LLM and deserializes the text response as JSON.
    /// The system prompt must instruct the model to return valid JSON.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        messages: &[ChatTurn],
        system: &str,
    ) -> Result<T, LlmError> {
        let response = self.call(messages, system).await?;

        let text = response.text().ok_or(LlmError::EmptyContent)?;

        // Strip markdown code fences if the model wraps JSON in them
        let text = strip_json_fences(text);
        let object = greedy_json_span(text).ok_or(LlmError::NoJson)?;

        serde_json::from_str(object).map_err(LlmError::Parse)
    }
}

#[async_trait]
impl CompletionSource for LlmClient {
    /// Opens a streaming completion. Status errors surface before any fragment is produced;
    /// once the body is flowing, transport failures arrive as the stream's final item.
    async fn stream_chat(
        &self,
        messages: &[ChatTurn],
        system: &str,
    ) -> Result<FragmentStream, LlmError> {
        let response = self.post(messages, system, true).await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        debug!("Streaming response from AI gateway");

        let mut body = Box::pin(response.bytes_stream());
        let fragments = async_stream::stream! {
            let mut decoder = SseDecoder::default();
            'body: loop {
                let (items, eof) = match body.next().await {
                    Some(Ok(chunk)) => (decoder.push(&chunk), false),
                    Some(Err(e)) => {
                        yield Err(LlmError::Stream(e.to_string()));
                        break 'body;
                    }
                    None => (decoder.finish(), true),
                };

                for item in items {
                    match item {
                        SseItem::Delta(text) => yield Ok(text),
                        SseItem::Done => break 'body,
                    }
                }

                if eof {
                    break;
                }
            }
        };

        Ok(Box::pin(fragments))
    }
}

/// Maps a non-success gateway response to an `LlmError`.
async fn status_error(response: Response) -> LlmError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    warn!("AI gateway error: {status} - {body}");

    match status {
        429 => LlmError::RateLimited { retries: 0 },
        402 => LlmError::UsageLimit,
        _ => {
            let message = serde_json::from_str::<GatewayError>(&body)
                .map(|e| match e.error {
                    GatewayErrorBody::Detailed { message } => message,
                    GatewayErrorBody::Plain(message) => message,
                })
                .unwrap_or(body);
            LlmError::Api { status, message }
        }
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// Returns the span from the first `{` to the last `}` in `text`, inclusive.
///
/// Greedy on purpose: prose containing braces around the object is captured too and the
/// subsequent parse fails, which callers treat as "no JSON".
pub fn greedy_json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_greedy_span_takes_first_open_to_last_close() {
        let input = "Sure! {\"a\": 1} and also {\"b\": 2} done";
        assert_eq!(greedy_json_span(input), Some("{\"a\": 1} and also {\"b\": 2}"));
    }

    #[test]
    fn test_greedy_span_none_without_braces() {
        assert_eq!(greedy_json_span("no braces here"), None);
        assert_eq!(greedy_json_span("} backwards {"), None);
    }

    fn sse_body(fragments: &[&str]) -> String {
        let mut body = String::new();
        for f in fragments {
            let chunk = serde_json::json!({"choices": [{"delta": {"content": f}}]});
            body.push_str(&format!("data: {chunk}\n\n"));
        }
        body.push_str("data: [DONE]\n\n");
        body
    }

    #[tokio::test]
    async fn test_stream_chat_yields_fragments_in_order() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(sse_body(&["Hel", "lo", " world"]))
            .create_async()
            .await;

        let client = LlmClient::new(
            "test-key".to_string(),
            format!("{}/v1/chat/completions", server.url()),
        );
        let stream = client
            .stream_chat(&[ChatTurn::user("hi")], "system")
            .await
            .unwrap();
        let fragments: Vec<String> = stream.map(|f| f.unwrap()).collect().await;

        assert_eq!(fragments, vec!["Hel", "lo", " world"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_stream_outlives_request_timeout() {
        use std::io::Write;

        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_chunked_body(|w| {
                w.write_all(sse_body(&["slow "]).trim_end_matches("data: [DONE]\n\n").as_bytes())?;
                w.flush()?;
                std::thread::sleep(Duration::from_millis(600));
                w.write_all(sse_body(&["reply"]).as_bytes())
            })
            .create_async()
            .await;

        let client = LlmClient::with_request_timeout(
            "k".to_string(),
            format!("{}/v1/chat/completions", server.url()),
            Duration::from_millis(200),
        );
        let stream = client
            .stream_chat(&[ChatTurn::user("hi")], "system")
            .await
            .unwrap();
        let fragments: Vec<Result<String, LlmError>> = stream.collect().await;

        assert_eq!(fragments.len(), 2);
        assert!(fragments.iter().all(|f| f.is_ok()));
    }

    #[tokio::test]
    async fn test_stream_chat_maps_rate_limit_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_body("{\"error\": \"slow down\"}")
            .create_async()
            .await;

        let client = LlmClient::new(
            "k".to_string(),
            format!("{}/v1/chat/completions", server.url()),
        );
        let result = client.stream_chat(&[ChatTurn::user("hi")], "system").await;
        assert!(matches!(result, Err(LlmError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn test_stream_chat_maps_payment_required() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(402)
            .create_async()
            .await;

        let client = LlmClient::new(
            "k".to_string(),
            format!("{}/v1/chat/completions", server.url()),
        );
        let result = client.stream_chat(&[ChatTurn::user("hi")], "system").await;
        assert!(matches!(result, Err(LlmError::UsageLimit)));
    }

    #[tokio::test]
    async fn test_call_json_parses_fenced_object() {
        let mut server = mockito::Server::new_async().await;
        let content = "```json\n{\"value\": 7}\n```";
        let body = serde_json::json!({
            "choices": [{"message": {"content": content}}],
            "usage": {"prompt_tokens": 3, "completion_tokens": 4}
        });
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        #[derive(Deserialize)]
        struct Out {
            value: u32,
        }

        let client = LlmClient::new(
            "k".to_string(),
            format!("{}/v1/chat/completions", server.url()),
        );
        let out: Out = client
            .call_json(&[ChatTurn::user("hi")], "system")
            .await
            .unwrap();
        assert_eq!(out.value, 7);
    }

    #[tokio::test]
    async fn test_call_does_not_retry_client_errors() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(400)
            .with_body("{\"error\": {\"message\": \"bad request\"}}")
            .expect(1)
            .create_async()
            .await;

        let client = LlmClient::new(
            "k".to_string(),
            format!("{}/v1/chat/completions", server.url()),
        );
        let result = client.call(&[ChatTurn::user("hi")], "system").await;
        match result {
            Err(LlmError::Api { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "bad request");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        mock.assert_async().await;
    }
}
