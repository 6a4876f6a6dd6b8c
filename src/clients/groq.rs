pub mod models;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use self::models::GroqModel;
use crate::config::KeyFromEnv;
use crate::core::{ChatRequest, LowLevelClient, RawByteStream};
use crate::error::{AIError, GroqError};

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

#[derive(Debug, Serialize)]
struct GroqRequest<'a> {
    model: &'a str,
    messages: Vec<GroqMessage>,
    temperature: f32,
    max_completion_tokens: u32,
    top_p: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct GroqMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct GroqResponse {
    choices: Vec<GroqChoice>,
}

#[derive(Debug, Deserialize)]
struct GroqChoice {
    message: GroqResponseMessage,
}

#[derive(Debug, Deserialize)]
struct GroqResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Sampling and endpoint settings for the Groq client.
#[derive(Debug, Clone)]
pub struct GroqConfig {
    pub model: GroqModel,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub base_url: String,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            model: GroqModel::default(),
            temperature: 1.0,
            max_tokens: 512,
            top_p: 1.0,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct GroqClient {
    config: GroqConfig,
    client: Client,
}

impl KeyFromEnv for GroqClient {
    const KEY_NAME: &'static str = "GROQ_API_KEY";
}

impl Default for GroqClient {
    fn default() -> Self {
        Self::new(GroqConfig::default())
    }
}

impl GroqClient {
    pub fn new(config: GroqConfig) -> Self {
        info!(model = %config.model.id(), "Creating new Groq client");
        Self { config, client: Client::new() }
    }

    pub fn config(&self) -> &GroqConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn body(&self, prompt: String, stream: bool) -> GroqRequest<'_> {
        GroqRequest {
            model: self.config.model.id(),
            messages: vec![GroqMessage { role: "user".to_string(), content: prompt }],
            temperature: self.config.temperature,
            max_completion_tokens: self.config.max_tokens,
            top_p: self.config.top_p,
            stream,
        }
    }

    async fn send(&self, request: ChatRequest, stream: bool) -> Result<Response, AIError> {
        let ChatRequest { api_key, prompt } = request;
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&self.body(prompt, stream))
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP request failed");
                GroqError::Http(e.to_string())
            })?;
        debug!(status = %response.status(), "Received response from Groq API");
        check_status(response).await
    }
}

async fn check_status(response: Response) -> Result<Response, AIError> {
    match response.status() {
        StatusCode::TOO_MANY_REQUESTS => {
            warn!("Groq API rate limit exceeded");
            Err(GroqError::RateLimit.into())
        }
        StatusCode::UNAUTHORIZED => {
            error!("Groq API authentication failed");
            Err(GroqError::Authentication.into())
        }
        status if !status.is_success() => {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "Groq API error");
            Err(GroqError::Api(error_text).into())
        }
        _ => Ok(response),
    }
}

#[async_trait]
impl LowLevelClient for GroqClient {
    #[instrument(skip(self, request), fields(prompt_len = request.prompt.len(), model = %self.config.model.id()))]
    async fn ask_raw(&self, request: ChatRequest) -> Result<String, AIError> {
        let response = self.send(request, false).await?;
        let parsed: GroqResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse Groq response JSON");
            GroqError::Http(e.to_string())
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GroqError::Api("No choices in response".to_string()))?;
        info!(response_len = content.len(), "Successfully received Groq response");
        Ok(content)
    }

    fn clone_box(&self) -> Box<dyn LowLevelClient> {
        Box::new(self.clone())
    }

    fn stream_raw(&self, request: ChatRequest) -> Option<RawByteStream> {
        let this = self.clone();
        let s = async_stream::try_stream! {
            let response = this.send(request, true).await?;
            let mut bytes_stream = response.bytes_stream();
            while let Some(chunk) = bytes_stream.next().await {
                let b = chunk.map_err(|e| AIError::from(GroqError::Http(e.to_string())))?;
                yield b;
            }
        };
        Some(Box::pin(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streaming::{collect_text, text_fragments};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Read one HTTP request: headers plus a `content-length` body.
    async fn read_request(socket: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    return;
                }
            }
        }
    }

    /// Client pointed at a local listener that answers one request with a canned response.
    async fn canned_server(status: &'static str, content_type: &'static str, body: &'static str) -> GroqClient {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                content_type,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        GroqClient {
            config: GroqConfig { base_url: format!("http://{}/v1", addr), ..Default::default() },
            client: Client::builder().no_proxy().build().unwrap(),
        }
    }

    fn request() -> ChatRequest {
        ChatRequest::new("gsk_test", "prompt")
    }

    #[tokio::test]
    async fn unauthorized_maps_to_authentication() {
        let client = canned_server("401 Unauthorized", "application/json", r#"{"error":{"message":"bad key"}}"#).await;
        let err = client.ask_raw(request()).await.unwrap_err();
        assert!(matches!(err, AIError::Groq(GroqError::Authentication)), "got {:?}", err);
    }

    #[tokio::test]
    async fn too_many_requests_maps_to_rate_limit_on_stream() {
        let client = canned_server("429 Too Many Requests", "application/json", "{}").await;
        let mut stream = client.stream_raw(request()).unwrap();
        let first = stream.next().await.unwrap();
        assert!(matches!(first, Err(AIError::Groq(GroqError::RateLimit))), "got {:?}", first);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn other_failure_status_keeps_body_text() {
        let client = canned_server("500 Internal Server Error", "text/plain", "upstream exploded").await;
        let err = client.ask_raw(request()).await.unwrap_err();
        match err {
            AIError::Groq(GroqError::Api(text)) => assert_eq!(text, "upstream exploded"),
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn successful_stream_yields_sse_text() {
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"[1,\"}}]}\n\n\
                    data: {\"choices\":[{\"delta\":{\"content\":\"2]\"}}]}\n\n\
                    data: [DONE]\n\n";
        let client = canned_server("200 OK", "text/event-stream", body).await;
        let stream = client.stream_raw(request()).unwrap();
        let text = collect_text(text_fragments(stream)).await.unwrap();
        assert_eq!(text, "[1,2]");
    }

    #[tokio::test]
    async fn one_shot_reads_first_choice() {
        let client = canned_server(
            "200 OK",
            "application/json",
            r#"{"choices":[{"message":{"role":"assistant","content":"[]"}}]}"#,
        )
        .await;
        assert_eq!(client.ask_raw(request()).await.unwrap(), "[]");
    }

    #[test]
    fn defaults_match_quiz_generation_settings() {
        let config = GroqConfig::default();
        assert_eq!(config.model.id(), "llama3-8b-8192");
        assert_eq!(config.max_tokens, 512);
        assert_eq!(config.temperature, 1.0);
    }

    #[test]
    fn request_body_asks_for_streaming() {
        let client = GroqClient::default();
        let body = serde_json::to_value(client.body("hello".to_string(), true)).unwrap();
        assert_eq!(body["stream"], true);
        assert_eq!(body["model"], "llama3-8b-8192");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hello");
        assert_eq!(body["max_completion_tokens"], 512);
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let client = GroqClient::new(GroqConfig { base_url: "http://localhost:8080/v1/".into(), ..Default::default() });
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/chat/completions");
    }
}
