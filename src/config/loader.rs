// Configuration file loading

use crate::config::merger::{ConfigMerger, PartialConfig};
use crate::models::AgentType;
use crate::parsers::ExtractionOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory holding config files, both under the home and the project root
pub const CONFIG_DIR_NAME: &str = ".prompt-assist";

/// File names probed inside a config directory, in order
const CONFIG_FILE_NAMES: &[&str] = &["config.yaml", "config.yml", "config.toml"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Prompt assist configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AssistConfig {
    /// Agent backend settings
    #[serde(default)]
    pub agent: AgentConfig,
    /// Suggestion extraction settings
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

/// Which collaborator executes assist turns
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentBackend {
    #[default]
    Cli,
    Http,
}

impl std::str::FromStr for AgentBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cli" => Ok(AgentBackend::Cli),
            "http" => Ok(AgentBackend::Http),
            _ => Err(format!("Unknown agent backend: {}", s)),
        }
    }
}

/// Agent configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentConfig {
    #[serde(default)]
    pub backend: AgentBackend,
    /// Local agent CLI to run
    #[serde(rename = "agentType", alias = "agent_type", default = "default_agent_type")]
    pub agent_type: AgentType,
    /// Explicit path to the agent binary
    #[serde(default)]
    pub program: Option<String>,
    /// Working directory for the agent process
    #[serde(rename = "workingDir", alias = "working_dir", default)]
    pub working_dir: Option<String>,
    /// Per-turn timeout; each backend has its own default
    #[serde(rename = "timeoutSecs", alias = "timeout_secs", default)]
    pub timeout_secs: Option<u64>,
    /// Replay prior turns in the CLI prompt
    #[serde(rename = "includeHistory", alias = "include_history", default = "default_true")]
    pub include_history: bool,
    /// Base URL of the execution endpoint
    #[serde(rename = "baseUrl", alias = "base_url", default)]
    pub base_url: Option<String>,
    /// Agent id used by the execution endpoint
    #[serde(rename = "agentId", alias = "agent_id", default)]
    pub agent_id: Option<String>,
}

fn default_agent_type() -> AgentType {
    AgentType::Claude
}
fn default_true() -> bool {
    true
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            backend: AgentBackend::default(),
            agent_type: default_agent_type(),
            program: None,
            working_dir: None,
            timeout_secs: None,
            include_history: default_true(),
            base_url: None,
            agent_id: None,
        }
    }
}

/// Suggestion extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractionConfig {
    /// Minimum fenced block length for the prose fallback
    #[serde(
        rename = "minFallbackLen",
        alias = "min_fallback_len",
        default = "default_min_fallback_len"
    )]
    pub min_fallback_len: usize,
    /// Render extra structured fields under their own headers
    #[serde(
        rename = "surfaceExtraFields",
        alias = "surface_extra_fields",
        default = "default_true"
    )]
    pub surface_extra_fields: bool,
}

fn default_min_fallback_len() -> usize {
    crate::parsers::fallback::DEFAULT_MIN_FALLBACK_LEN
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_fallback_len: default_min_fallback_len(),
            surface_extra_fields: default_true(),
        }
    }
}

impl ExtractionConfig {
    pub fn to_options(&self) -> ExtractionOptions {
        ExtractionOptions {
            min_fallback_len: self.min_fallback_len,
            surface_extra_fields: self.surface_extra_fields,
        }
    }
}

impl AssistConfig {
    /// Check settings that only make sense once all layers are merged
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "timeoutSecs must be greater than 0".to_string(),
            ));
        }

        if self.agent.backend == AgentBackend::Http {
            let missing = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());
            if missing(&self.agent.base_url) {
                return Err(ConfigError::Invalid(
                    "http backend requires agent.baseUrl".to_string(),
                ));
            }
            if missing(&self.agent.agent_id) {
                return Err(ConfigError::Invalid(
                    "http backend requires agent.agentId".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Config loader
pub struct ConfigLoader {
    /// Global config directory
    global_dir: Option<PathBuf>,
    /// Project config directory
    project_dir: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            global_dir: dirs::home_dir().map(|p| p.join(CONFIG_DIR_NAME)),
            project_dir: None,
        }
    }

    /// Set the project root
    pub fn with_project_path(mut self, path: &Path) -> Self {
        self.project_dir = Some(path.join(CONFIG_DIR_NAME));
        self
    }

    /// Override the global config directory
    pub fn with_global_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.global_dir = dir;
        self
    }

    /// Load the global config layer
    pub fn load_global(&self) -> Result<Option<PartialConfig>, ConfigError> {
        match self.global_config_path() {
            Some(path) => Self::load_from_path(&path),
            None => Ok(None),
        }
    }

    /// Load the project config layer
    pub fn load_project(&self) -> Result<Option<PartialConfig>, ConfigError> {
        match self.project_config_path() {
            Some(path) => Self::load_from_path(&path),
            None => Ok(None),
        }
    }

    /// Existing config file in the global directory (or its default name)
    pub fn global_config_path(&self) -> Option<PathBuf> {
        self.global_dir.as_deref().map(Self::config_file_in)
    }

    /// Existing config file in the project directory (or its default name)
    pub fn project_config_path(&self) -> Option<PathBuf> {
        self.project_dir.as_deref().map(Self::config_file_in)
    }

    fn config_file_in(dir: &Path) -> PathBuf {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|p| p.exists())
            .unwrap_or_else(|| dir.join(CONFIG_FILE_NAMES[0]))
    }

    /// Load a config layer from a specific path; a missing file is not an error.
    /// Only the fields the file sets are present in the layer.
    pub fn load_from_path(path: &Path) -> Result<Option<PartialConfig>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config = Self::parse(path, &contents)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(Some(config))
    }

    /// Load a single file resolved against the defaults
    pub fn load_resolved(path: &Path) -> Result<Option<AssistConfig>, ConfigError> {
        Ok(Self::load_from_path(path)?
            .map(|layer| ConfigMerger::new().with_project(Some(layer)).merge()))
    }

    fn parse(path: &Path, contents: &str) -> Result<PartialConfig, ConfigError> {
        let is_toml = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("toml"));

        let parsed = if is_toml {
            toml::from_str(contents).map_err(|e| e.to_string())
        } else if contents.trim().is_empty() {
            Ok(PartialConfig::default())
        } else {
            serde_yaml::from_str(contents).map_err(|e| e.to_string())
        };

        parsed.map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
