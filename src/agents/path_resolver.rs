// CLI binary path resolution for agent tools

use crate::models::AgentType;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of looking for an agent CLI on this machine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentAvailability {
    pub available: bool,
    pub agent: String,
    pub path: Option<String>,
    pub error: Option<String>,
}

pub struct CliPathResolver;

impl CliPathResolver {
    /// Resolve the binary for an agent type
    pub fn resolve(agent_type: AgentType) -> Option<PathBuf> {
        let home = dirs::home_dir();
        let extra_paths: Vec<Option<PathBuf>> = match agent_type {
            AgentType::Opencode => vec![home.map(|h| h.join(".opencode/bin/opencode"))],
            AgentType::Cursor => vec![home.map(|h| h.join(".cursor/bin/cursor-agent"))],
            _ => Vec::new(),
        };
        Self::resolve_cli(agent_type.program(), &extra_paths)
    }

    /// Report whether an agent CLI is installed
    pub fn check_availability(agent_type: AgentType) -> AgentAvailability {
        let program = agent_type.program();
        match Self::resolve(agent_type) {
            Some(path) => AgentAvailability {
                available: true,
                agent: program.to_string(),
                path: Some(path.to_string_lossy().to_string()),
                error: None,
            },
            None => AgentAvailability {
                available: false,
                agent: program.to_string(),
                path: None,
                error: Some(format!(
                    "'{}' not found in PATH. Please install it or add it to your PATH.",
                    program
                )),
            },
        }
    }

    /// Resolve a CLI binary by checking common paths then falling back to PATH lookup
    fn resolve_cli(name: &str, extra_paths: &[Option<PathBuf>]) -> Option<PathBuf> {
        let standard_paths = [
            dirs::home_dir().map(|h| h.join(format!(".npm-global/bin/{}", name))),
            Some(PathBuf::from(format!("/usr/local/bin/{}", name))),
            Some(PathBuf::from(format!("/opt/homebrew/bin/{}", name))),
        ];

        for path in extra_paths.iter().chain(standard_paths.iter()).flatten() {
            if path.exists() {
                log::info!("[CliPathResolver] Found {} at: {:?}", name, path);
                return Some(path.clone());
            }
        }

        Self::which(name)
    }

    fn which(cmd: &str) -> Option<PathBuf> {
        match which::which(cmd) {
            Ok(path) => {
                log::info!("[CliPathResolver] Found {} via PATH at: {:?}", cmd, path);
                Some(path)
            }
            Err(_) => None,
        }
    }
}
