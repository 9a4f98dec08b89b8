// Configuration merging with priority

use crate::config::loader::{AgentBackend, AgentConfig, AssistConfig, ExtractionConfig};
use crate::models::AgentType;
use serde::{Deserialize, Serialize};

/// Partial configuration for merging
/// Uses Option<T> for all fields to support partial overrides
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PartialConfig {
    #[serde(default)]
    pub agent: Option<PartialAgentConfig>,
    #[serde(default)]
    pub extraction: Option<PartialExtractionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PartialAgentConfig {
    pub backend: Option<AgentBackend>,
    #[serde(alias = "agent_type")]
    pub agent_type: Option<AgentType>,
    pub program: Option<String>,
    #[serde(alias = "working_dir")]
    pub working_dir: Option<String>,
    #[serde(alias = "timeout_secs")]
    pub timeout_secs: Option<u64>,
    #[serde(alias = "include_history")]
    pub include_history: Option<bool>,
    #[serde(alias = "base_url")]
    pub base_url: Option<String>,
    #[serde(alias = "agent_id")]
    pub agent_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PartialExtractionConfig {
    #[serde(alias = "min_fallback_len")]
    pub min_fallback_len: Option<usize>,
    #[serde(alias = "surface_extra_fields")]
    pub surface_extra_fields: Option<bool>,
}

/// Configuration merger
/// Priority order: CLI -> Project -> Global -> Defaults
///
/// Every layer is partial, so a field only overrides the layers below it
/// when that layer actually sets it.
pub struct ConfigMerger {
    defaults: AssistConfig,
    global: Option<PartialConfig>,
    project: Option<PartialConfig>,
    cli: Option<PartialConfig>,
}

impl ConfigMerger {
    /// Create a new config merger with defaults
    pub fn new() -> Self {
        Self {
            defaults: AssistConfig::default(),
            global: None,
            project: None,
            cli: None,
        }
    }

    pub fn with_global(mut self, config: Option<PartialConfig>) -> Self {
        self.global = config;
        self
    }

    pub fn with_project(mut self, config: Option<PartialConfig>) -> Self {
        self.project = config;
        self
    }

    pub fn with_cli(mut self, config: Option<PartialConfig>) -> Self {
        self.cli = config;
        self
    }

    /// Merge all configs with priority
    pub fn merge(&self) -> AssistConfig {
        [&self.global, &self.project, &self.cli]
            .into_iter()
            .flatten()
            .fold(self.defaults.clone(), |result, layer| {
                self.merge_partial(&result, layer)
            })
    }

    /// Merge partial config into full config
    fn merge_partial(&self, base: &AssistConfig, partial: &PartialConfig) -> AssistConfig {
        AssistConfig {
            agent: partial
                .agent
                .as_ref()
                .map(|p| self.merge_partial_agent(&base.agent, p))
                .unwrap_or_else(|| base.agent.clone()),
            extraction: partial
                .extraction
                .as_ref()
                .map(|p| self.merge_partial_extraction(&base.extraction, p))
                .unwrap_or_else(|| base.extraction.clone()),
        }
    }

    fn merge_partial_agent(&self, base: &AgentConfig, partial: &PartialAgentConfig) -> AgentConfig {
        AgentConfig {
            backend: partial.backend.unwrap_or(base.backend),
            agent_type: partial.agent_type.unwrap_or(base.agent_type),
            program: partial.program.clone().or_else(|| base.program.clone()),
            working_dir: partial
                .working_dir
                .clone()
                .or_else(|| base.working_dir.clone()),
            timeout_secs: partial.timeout_secs.or(base.timeout_secs),
            include_history: partial.include_history.unwrap_or(base.include_history),
            base_url: partial.base_url.clone().or_else(|| base.base_url.clone()),
            agent_id: partial.agent_id.clone().or_else(|| base.agent_id.clone()),
        }
    }

    fn merge_partial_extraction(
        &self,
        base: &ExtractionConfig,
        partial: &PartialExtractionConfig,
    ) -> ExtractionConfig {
        ExtractionConfig {
            min_fallback_len: partial.min_fallback_len.unwrap_or(base.min_fallback_len),
            surface_extra_fields: partial
                .surface_extra_fields
                .unwrap_or(base.surface_extra_fields),
        }
    }
}

impl Default for ConfigMerger {
    fn default() -> Self {
        Self::new()
    }
}
