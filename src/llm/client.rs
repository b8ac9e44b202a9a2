use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CallscopeError, Result};

use super::{Generator, SYSTEM_PROMPT};

const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Bounds on each phase of a generation request
#[derive(Debug, Clone, Copy)]
pub struct TimeoutConfig {
    pub connect: Duration,
    pub send: Duration,
    pub receive: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(60),
            send: Duration::from_secs(60),
            receive: Duration::from_secs(180),
        }
    }
}

impl TimeoutConfig {
    /// Upper bound for a whole request
    pub fn total(&self) -> Duration {
        self.connect + self.send + self.receive
    }
}

/// Configuration for the Anthropic API client
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key (from ANTHROPIC_API_KEY env var)
    pub api_key: String,
    /// Model to use (CALLSCOPE_MODEL overrides the default)
    pub model: String,
    /// Messages endpoint (CALLSCOPE_API_URL overrides the default)
    pub api_url: String,
    /// Temperature (0-1, lower = more deterministic)
    pub temperature: f64,
    /// Maximum tokens in response
    pub max_tokens: u32,
    pub timeouts: TimeoutConfig,
}

impl AnthropicConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key =
            std::env::var("ANTHROPIC_API_KEY").map_err(|_| CallscopeError::MissingApiKey {
                env_var: "ANTHROPIC_API_KEY".to_string(),
            })?;

        let mut config = Self::new(api_key, DEFAULT_MODEL.to_string());
        if let Ok(model) = std::env::var("CALLSCOPE_MODEL") {
            config.model = model;
        }
        if let Ok(url) = std::env::var("CALLSCOPE_API_URL") {
            config.api_url = url;
        }
        Ok(config)
    }

    /// Create with custom settings
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            api_url: DEFAULT_API_URL.to_string(),
            temperature: 0.2,
            max_tokens: 4096,
            timeouts: TimeoutConfig::default(),
        }
    }
}

/// Anthropic Messages API backend
pub struct AnthropicClient {
    client: Client,
    config: AnthropicConfig,
}

impl AnthropicClient {
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.timeouts.connect)
            .read_timeout(config.timeouts.receive)
            .timeout(config.timeouts.total())
            .build()?;
        Ok(Self::with_http_client(config, client))
    }

    /// Use a preconfigured HTTP client; its own timeouts apply
    pub fn with_http_client(config: AnthropicConfig, client: Client) -> Self {
        Self { client, config }
    }

    /// Send a message to Claude and get a response
    pub async fn send_message(&self, system: &str, user: &str) -> Result<String> {
        let request = AnthropicRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: Some(self.config.temperature),
            system: Some(system.to_string()),
            messages: vec![Message {
                role: "user".to_string(),
                content: user.to_string(),
            }],
        };

        debug!("Sending {} prompt chars to {}", user.len(), self.config.api_url);

        let response = self
            .client
            .post(&self.config.api_url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CallscopeError::Api { status, body });
        }

        let response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        // No text is a content problem, left for the resolver to absorb
        match extract_text(&response) {
            Some(text) => Ok(text),
            None => {
                warn!("Generation API returned no text content");
                Ok(String::new())
            }
        }
    }

    fn map_transport_error(&self, error: reqwest::Error) -> CallscopeError {
        if error.is_timeout() {
            CallscopeError::Timeout(self.config.timeouts.total())
        } else {
            CallscopeError::Http(error)
        }
    }
}

#[async_trait]
impl Generator for AnthropicClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.send_message(SYSTEM_PROMPT, prompt).await
    }
}

/// Concatenate the text blocks of a reply
fn extract_text(response: &AnthropicResponse) -> Option<String> {
    let text: Vec<&str> = response
        .content
        .iter()
        .filter(|c| c.content_type == "text")
        .map(|c| c.text.as_str())
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text.join("\n"))
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use super::*;
    use crate::stages::Analyzer;

    /// Serve one canned HTTP response on a local port, returning the endpoint URL
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });
        format!("http://{}/v1/messages", addr)
    }

    /// Consume headers and body so the client never sees a reset mid-write
    async fn read_request(socket: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);

            let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
            let content_length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                return;
            }
        }
    }

    fn local_client(url: String) -> AnthropicClient {
        let mut config = AnthropicConfig::new("key".to_string(), "model".to_string());
        config.api_url = url;
        let http = Client::builder().no_proxy().build().unwrap();
        AnthropicClient::with_http_client(config, http)
    }

    #[tokio::test]
    async fn test_reply_text_is_returned() {
        let body = r#"{"content": [{"type": "text", "text": "rating: 8"}]}"#;
        let url = serve_once("200 OK", body).await;
        let reply = local_client(url).generate("prompt").await.unwrap();
        assert_eq!(reply, "rating: 8");
    }

    #[tokio::test]
    async fn test_empty_content_is_not_an_error() {
        let url = serve_once("200 OK", r#"{"content": []}"#).await;
        let analyzer = Analyzer::new(local_client(url));
        let analysis = analyzer
            .analyze("[00:00:00] AGENT: hello", &[])
            .await
            .unwrap();

        // Nothing usable: failure defaults
        assert_eq!(analysis.agent_score.rating, 5);
        assert_eq!(analysis.sentiment_score.score, 0.5);
        assert!(!analysis.topics.is_empty());
    }

    #[tokio::test]
    async fn test_error_status_is_an_error() {
        let url = serve_once("500 Internal Server Error", r#"{"error": "overloaded"}"#).await;
        let err = local_client(url).generate("prompt").await.unwrap_err();
        match err {
            CallscopeError::Api { status, body } => {
                assert_eq!(status, 500);
                assert!(body.contains("overloaded"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_default_timeouts() {
        let timeouts = TimeoutConfig::default();
        assert_eq!(timeouts.connect, Duration::from_secs(60));
        assert_eq!(timeouts.send, Duration::from_secs(60));
        assert_eq!(timeouts.receive, Duration::from_secs(180));
        assert_eq!(timeouts.total(), Duration::from_secs(300));
    }

    #[test]
    fn test_extract_text_joins_text_blocks() {
        let response: AnthropicResponse = serde_json::from_str(
            r#"{"content": [
                {"type": "text", "text": "first"},
                {"type": "tool_use", "name": "x", "input": {}},
                {"type": "text", "text": "second"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(&response).unwrap(), "first\nsecond");
    }

    #[test]
    fn test_extract_text_without_text_blocks() {
        let response: AnthropicResponse =
            serde_json::from_str(r#"{"content": [{"type": "tool_use"}]}"#).unwrap();
        assert!(extract_text(&response).is_none());
    }

    #[test]
    fn test_client_builds_with_custom_config() {
        let config = AnthropicConfig::new("key".to_string(), "model".to_string());
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(AnthropicClient::new(config).is_ok());
    }
}
