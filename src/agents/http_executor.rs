// HTTP agent executor - calls a remote agent execution endpoint

use crate::agents::{AgentError, AgentExecutor, AgentReply, AgentRequest};
use crate::models::{ConversationContext, MessageRole};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default request timeout for the execution endpoint
pub const HTTP_TIMEOUT_SECS: u64 = 120;

/// Environment variable holding the bearer token for the execution endpoint
pub const API_TOKEN_ENV: &str = "PROMPT_ASSIST_API_TOKEN";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryEntry<'a> {
    role: MessageRole,
    content: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteRequestBody<'a> {
    input: &'a str,
    history: Vec<HistoryEntry<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a ConversationContext>,
}

impl<'a> From<&'a AgentRequest> for ExecuteRequestBody<'a> {
    fn from(request: &'a AgentRequest) -> Self {
        Self {
            input: &request.user_text,
            history: request
                .prior_turns
                .iter()
                .map(|t| HistoryEntry {
                    role: t.role,
                    content: &t.content,
                })
                .collect(),
            session_id: request.session_id.as_deref(),
            context: request.context.as_ref(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteResponseBody {
    output: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    metadata: Option<serde_json::Value>,
}

/// Agent execution over HTTP: `POST {base_url}/agents/{agent_id}/execute`
pub struct HttpAgentExecutor {
    client: reqwest::Client,
    base_url: String,
    agent_id: String,
    api_token: Option<String>,
}

impl HttpAgentExecutor {
    /// Create a new executor with the given request timeout
    pub fn new(
        base_url: impl Into<String>,
        agent_id: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, AgentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("prompt-assist")
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            agent_id: agent_id.into(),
            api_token: None,
        })
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.api_token = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Full URL of the execution endpoint
    pub fn endpoint(&self) -> String {
        format!(
            "{}/agents/{}/execute",
            self.base_url.trim_end_matches('/'),
            self.agent_id
        )
    }
}

#[async_trait]
impl AgentExecutor for HttpAgentExecutor {
    async fn execute(&self, request: AgentRequest) -> Result<AgentReply, AgentError> {
        let url = self.endpoint();
        let body = ExecuteRequestBody::from(&request);

        log::info!(
            "POST {} ({} prior turns, session: {})",
            url,
            body.history.len(),
            body.session_id.unwrap_or("none")
        );

        let mut builder = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .json(&body);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(AgentError::Http { status, body: text });
        }

        let parsed: ExecuteResponseBody = response.json().await?;
        let output = parsed
            .output
            .ok_or_else(|| AgentError::InvalidResponse("missing 'output' field".to_string()))?;

        Ok(AgentReply {
            output,
            session_id: parsed.session_id,
            metadata: parsed.metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssistTarget, ChatTurn};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve exactly one HTTP response and hand back the raw request
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&raw).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|l| {
                            let lower = l.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                        })
                        .unwrap_or(0);
                    if raw.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&raw).to_string()
        });

        (format!("http://{}", addr), handle)
    }

    fn sample_request() -> AgentRequest {
        AgentRequest {
            user_text: "Make it shorter".to_string(),
            prior_turns: vec![ChatTurn::user("Help me write a description")],
            session_id: Some("sess-9".to_string()),
            context: Some(ConversationContext::new(AssistTarget::Description, "Helper")),
        }
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let executor = HttpAgentExecutor::new("https://api.example.com/", "assist", 5).unwrap();
        assert_eq!(
            executor.endpoint(),
            "https://api.example.com/agents/assist/execute"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let request = sample_request();
        let body = serde_json::to_value(ExecuteRequestBody::from(&request)).unwrap();
        assert_eq!(body["input"], "Make it shorter");
        assert_eq!(body["history"][0]["role"], "user");
        assert_eq!(body["sessionId"], "sess-9");
        assert_eq!(body["context"]["assistTarget"], "description");
        assert_eq!(body["context"]["agentName"], "Helper");
    }

    #[tokio::test]
    async fn test_execute_success() {
        let (base_url, server) = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"output": "{\"recommendation\": \"Short\"}", "sessionId": "sess-10"}"#,
        )
        .await;

        let executor = HttpAgentExecutor::new(base_url, "assist", 5)
            .unwrap()
            .with_token(Some("secret".to_string()));
        let reply = executor.execute(sample_request()).await.unwrap();

        assert_eq!(reply.output, r#"{"recommendation": "Short"}"#);
        assert_eq!(reply.session_id.as_deref(), Some("sess-10"));

        let raw_request = server.await.unwrap();
        assert!(raw_request.starts_with("POST /agents/assist/execute"));
        assert!(raw_request
            .to_ascii_lowercase()
            .contains("authorization: bearer secret"));
    }

    #[tokio::test]
    async fn test_execute_http_error() {
        let (base_url, server) =
            serve_once("HTTP/1.1 500 Internal Server Error", r#"{"error": "boom"}"#).await;

        let executor = HttpAgentExecutor::new(base_url, "assist", 5).unwrap();
        let err = executor.execute(sample_request()).await.unwrap_err();

        match err {
            AgentError::Http { status, body } => {
                assert_eq!(status, 500);
                assert!(body.contains("boom"));
            }
            other => panic!("unexpected error: {}", other),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_execute_missing_output() {
        let (base_url, server) = serve_once("HTTP/1.1 200 OK", r#"{"sessionId": "x"}"#).await;

        let executor = HttpAgentExecutor::new(base_url, "assist", 5).unwrap();
        let err = executor.execute(sample_request()).await.unwrap_err();
        assert!(matches!(err, AgentError::InvalidResponse(_)));
        server.await.unwrap();
    }
}
