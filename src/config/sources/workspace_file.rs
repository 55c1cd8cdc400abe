//! Per-workspace config files under `<workspace>/config/`.
//!
//! `config.toml` is shared by every environment; `<FRAMEBRIDGE_ENV>.toml` (default
//! `development`) is layered on top of it, so a deployment only spells out what differs.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::{Path, PathBuf};
use tracing::debug;

const ENVIRONMENT_VAR: &str = "FRAMEBRIDGE_ENV";
const DEFAULT_ENVIRONMENT: &str = "development";

/// Workspace files in the order they are applied. Missing files are skipped.
pub fn candidate_paths(workspace_root: &Path) -> Vec<PathBuf> {
    let environment =
        std::env::var(ENVIRONMENT_VAR).unwrap_or_else(|_| DEFAULT_ENVIRONMENT.to_string());
    let config_dir = workspace_root.join("config");
    vec![
        config_dir.join("config.toml"),
        config_dir.join(format!("{}.toml", environment)),
    ]
}

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let builder = candidate_paths(workspace_root)
        .into_iter()
        .filter(|path| path.is_file())
        .fold(builder, |builder, path| {
            debug!(config_path = %path.display(), "Layering workspace configuration");
            builder.add_source(File::from(path.as_path()).required(true))
        });
    Ok(builder)
}
