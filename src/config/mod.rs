// Layered configuration system

pub mod loader;
pub mod merger;

pub use loader::{
    AgentBackend, AgentConfig, AssistConfig, ConfigError, ConfigLoader, ExtractionConfig,
    CONFIG_DIR_NAME,
};
pub use merger::{ConfigMerger, PartialAgentConfig, PartialConfig, PartialExtractionConfig};

use std::path::{Path, PathBuf};

/// Load and merge configuration from all sources
/// Priority: CLI -> explicit file / Project -> Global -> Defaults
///
/// An explicit config file replaces the project layer and must parse;
/// unreadable global or project files are logged and skipped.
pub fn load_merged_config(
    project_path: Option<&Path>,
    explicit_file: Option<&Path>,
    cli_overrides: Option<PartialConfig>,
) -> Result<AssistConfig, ConfigError> {
    let loader = match project_path {
        Some(path) => ConfigLoader::new().with_project_path(path),
        None => ConfigLoader::new(),
    };

    let global = loader.load_global().unwrap_or_else(|e| {
        log::warn!("Ignoring global config: {}", e);
        None
    });

    let project = match explicit_file {
        Some(path) => Some(ConfigLoader::load_from_path(path)?.ok_or_else(|| {
            ConfigError::Invalid(format!("config file '{}' does not exist", path.display()))
        })?),
        None => loader.load_project().unwrap_or_else(|e| {
            log::warn!("Ignoring project config: {}", e);
            None
        }),
    };

    let config = ConfigMerger::new()
        .with_global(global)
        .with_project(project)
        .with_cli(cli_overrides)
        .merge();

    config.validate()?;
    Ok(config)
}

/// Get config file paths for debugging
pub fn get_config_paths(project_path: Option<&Path>) -> (Option<PathBuf>, Option<PathBuf>) {
    let loader = match project_path {
        Some(path) => ConfigLoader::new().with_project_path(path),
        None => ConfigLoader::new(),
    };

    (loader.global_config_path(), loader.project_config_path())
}
