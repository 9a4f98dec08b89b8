//! Local CLI agent executor
//!
//! Runs an agent CLI (claude, opencode, cursor-agent, ...) once per turn
//! with the full assist prompt, streaming its stdout until the process exits
//! or the timeout elapses.

use crate::agents::prompt_builder::build_agent_prompt;
use crate::agents::{AgentError, AgentExecutor, AgentReply, AgentRequest, CliPathResolver};
use crate::models::AgentType;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::{timeout, Duration};

/// Default timeout for agent execution (25 minutes)
pub const AGENT_TIMEOUT_SECS: u64 = 1500;

/// Build command line arguments for the specified agent type.
///
/// Only Claude reports a session id (via JSON output) and can resume it.
pub fn build_agent_command(
    agent_type: AgentType,
    prompt: &str,
    resume_session: Option<&str>,
) -> (&'static str, Vec<String>) {
    match agent_type {
        AgentType::Claude => {
            let mut args = vec![
                "-p".to_string(),
                "--output-format".to_string(),
                "json".to_string(),
            ];
            if let Some(session_id) = resume_session {
                args.push("--resume".to_string());
                args.push(session_id.to_string());
            }
            args.push(prompt.to_string());
            (agent_type.program(), args)
        }
        AgentType::Opencode => (
            agent_type.program(),
            vec!["run".to_string(), prompt.to_string()],
        ),
        AgentType::Cursor | AgentType::Codex | AgentType::Qwen => (
            agent_type.program(),
            vec!["--prompt".to_string(), prompt.to_string()],
        ),
        AgentType::Droid => (
            agent_type.program(),
            vec![
                "chat".to_string(),
                "--prompt".to_string(),
                prompt.to_string(),
            ],
        ),
    }
}

/// Turn raw CLI output into a reply.
///
/// Claude's JSON envelope carries `result` and `session_id`; everything else
/// in the envelope is kept as metadata. Other agents print plain text.
pub fn parse_agent_output(agent_type: AgentType, raw: &str) -> Result<AgentReply, AgentError> {
    let raw = raw.trim();
    if agent_type != AgentType::Claude {
        return Ok(AgentReply::text(raw));
    }

    let mut envelope = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        // Older CLIs ignore --output-format and print text
        _ => return Ok(AgentReply::text(raw)),
    };

    let result = envelope
        .remove("result")
        .and_then(|v| v.as_str().map(|s| s.to_string()))
        .unwrap_or_default();

    if envelope
        .get("is_error")
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
    {
        return Err(AgentError::InvalidResponse(if result.is_empty() {
            "agent reported an error".to_string()
        } else {
            result
        }));
    }

    let session_id = envelope
        .get("session_id")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    Ok(AgentReply {
        output: result.trim().to_string(),
        session_id,
        metadata: Some(Value::Object(envelope)),
    })
}

/// Runs a local agent CLI for each turn
#[derive(Debug, Clone)]
pub struct CliAgentExecutor {
    agent_type: AgentType,
    program: Option<PathBuf>,
    working_dir: Option<PathBuf>,
    timeout_secs: u64,
    include_history: bool,
}

impl CliAgentExecutor {
    pub fn new(agent_type: AgentType) -> Self {
        Self {
            agent_type,
            program: None,
            working_dir: None,
            timeout_secs: AGENT_TIMEOUT_SECS,
            include_history: true,
        }
    }

    /// Use an explicit binary instead of resolving the agent's CLI
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = Some(program.into());
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_history(mut self, include_history: bool) -> Self {
        self.include_history = include_history;
        self
    }

    pub fn agent_type(&self) -> AgentType {
        self.agent_type
    }

    fn resolve_program(&self, fallback: &str) -> PathBuf {
        self.program
            .clone()
            .or_else(|| CliPathResolver::resolve(self.agent_type))
            .unwrap_or_else(|| PathBuf::from(fallback))
    }

    async fn run(&self, program: &Path, args: &[String]) -> Result<String, AgentError> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| AgentError::Spawn {
            program: program.display().to_string(),
            source: e,
        })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            AgentError::InvalidResponse("Failed to capture stdout".to_string())
        })?;

        let mut reader = BufReader::new(stdout).lines();
        let mut accumulated = String::new();

        // Stream lines with overall timeout
        let stream_result = timeout(Duration::from_secs(self.timeout_secs), async {
            while let Some(line) = reader.next_line().await? {
                if !accumulated.is_empty() {
                    accumulated.push('\n');
                }
                accumulated.push_str(&line);
                log::trace!("[{}] {}", self.agent_type, line);
            }
            Ok::<(), AgentError>(())
        })
        .await;

        match stream_result {
            Err(_) => {
                let _ = child.kill().await;
                return Err(AgentError::Timeout(self.timeout_secs));
            }
            Ok(result) => result?,
        }

        let status = child.wait().await?;

        if !status.success() {
            if let Some(code) = status.code() {
                if code == 130 || code == 137 || code == 143 {
                    return Err(AgentError::Interrupted);
                }
            }
            // If we got some output before failure, return it
            if !accumulated.trim().is_empty() {
                log::warn!(
                    "{} exited with {:?} after producing output",
                    self.agent_type,
                    status.code()
                );
                return Ok(accumulated);
            }
            return Err(AgentError::ExitStatus(status.code()));
        }

        Ok(accumulated)
    }
}

#[async_trait]
impl AgentExecutor for CliAgentExecutor {
    async fn execute(&self, request: AgentRequest) -> Result<AgentReply, AgentError> {
        let resume = request
            .session_id
            .as_deref()
            .filter(|_| self.agent_type.supports_resume());

        // A resumed session already holds the history
        let include_history = self.include_history && resume.is_none();
        let prompt = build_agent_prompt(&request, include_history);

        let (fallback_program, args) = build_agent_command(self.agent_type, &prompt, resume);
        let program = self.resolve_program(fallback_program);

        log::info!(
            "Executing {} for assist turn ({} prior turns, resume: {})",
            self.agent_type,
            request.prior_turns.len(),
            resume.is_some()
        );

        let raw = self.run(&program, &args).await?;
        parse_agent_output(self.agent_type, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str) -> AgentRequest {
        AgentRequest {
            user_text: text.to_string(),
            prior_turns: vec![],
            session_id: None,
            context: None,
        }
    }

    #[test]
    fn test_build_agent_command_claude() {
        let (program, args) = build_agent_command(AgentType::Claude, "test prompt", None);
        assert_eq!(program, "claude");
        assert_eq!(args, vec!["-p", "--output-format", "json", "test prompt"]);
    }

    #[test]
    fn test_build_agent_command_claude_resume() {
        let (_, args) = build_agent_command(AgentType::Claude, "test prompt", Some("sess-1"));
        assert_eq!(
            args,
            vec!["-p", "--output-format", "json", "--resume", "sess-1", "test prompt"]
        );
    }

    #[test]
    fn test_build_agent_command_opencode() {
        let (program, args) = build_agent_command(AgentType::Opencode, "test prompt", None);
        assert_eq!(program, "opencode");
        assert_eq!(args, vec!["run", "test prompt"]);
    }

    #[test]
    fn test_build_agent_command_droid() {
        let (program, args) = build_agent_command(AgentType::Droid, "test prompt", Some("x"));
        assert_eq!(program, "droid");
        assert_eq!(args, vec!["chat", "--prompt", "test prompt"]);
    }

    #[test]
    fn test_parse_agent_output_plain_text() {
        let reply = parse_agent_output(AgentType::Opencode, "  hello\n").unwrap();
        assert_eq!(reply.output, "hello");
        assert!(reply.session_id.is_none());
    }

    #[test]
    fn test_parse_agent_output_claude_envelope() {
        let raw = r#"{"type":"result","is_error":false,"result":"{\"recommendation\":\"Hi\"}","session_id":"abc-123","duration_ms":900}"#;
        let reply = parse_agent_output(AgentType::Claude, raw).unwrap();
        assert_eq!(reply.output, r#"{"recommendation":"Hi"}"#);
        assert_eq!(reply.session_id.as_deref(), Some("abc-123"));
        let metadata = reply.metadata.unwrap();
        assert_eq!(metadata["duration_ms"], 900);
        assert!(metadata.get("result").is_none());
    }

    #[test]
    fn test_parse_agent_output_claude_error() {
        let raw = r#"{"type":"result","is_error":true,"result":"Credit balance too low"}"#;
        let err = parse_agent_output(AgentType::Claude, raw).unwrap_err();
        assert!(err.to_string().contains("Credit balance too low"));
    }

    #[test]
    fn test_parse_agent_output_claude_plain_text() {
        let reply = parse_agent_output(AgentType::Claude, "Just text").unwrap();
        assert_eq!(reply.output, "Just text");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_captures_stdout() {
        // echo prints the opencode arguments back: "run <prompt>"
        let executor = CliAgentExecutor::new(AgentType::Opencode).with_program("echo");
        let reply = executor.execute(request("Make it shorter")).await.unwrap();
        assert!(reply.output.starts_with("run You are a Prompt Assistant"));
        assert!(reply.output.ends_with("User: Make it shorter\n\nAssistant:"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_failing_process_without_output() {
        let executor = CliAgentExecutor::new(AgentType::Opencode).with_program("false");
        let err = executor.execute(request("hi")).await.unwrap_err();
        assert!(matches!(err, AgentError::ExitStatus(Some(1))));
    }

    #[tokio::test]
    async fn test_execute_missing_program() {
        let executor = CliAgentExecutor::new(AgentType::Qwen)
            .with_program("this-command-definitely-does-not-exist-12345");
        let err = executor.execute(request("hi")).await.unwrap_err();
        assert!(matches!(err, AgentError::Spawn { .. }));
    }
}
