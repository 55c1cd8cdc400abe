//! Layered configuration loading.

use super::merge::builder_with_defaults;
use super::sources::{global_file, workspace_file};
use super::FrameBridgeSettings;
use config::{ConfigError, Environment, File};
use std::path::{Path, PathBuf};

/// Environment variable prefix; nested keys use `__`, e.g. `FRAMEBRIDGE__BRIDGE__ADDRESS`.
pub const ENV_PREFIX: &str = "FRAMEBRIDGE";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load settings for `workspace_root`.
    ///
    /// Precedence, lowest first: defaults, global file, `config/config.toml`,
    /// `config/{FRAMEBRIDGE_ENV}.toml`, environment.
    pub fn load(workspace_root: &Path) -> Result<FrameBridgeSettings, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        builder
            .add_source(Self::environment())
            .build()?
            .try_deserialize()
    }

    /// Load a single TOML file on top of the defaults.
    pub fn load_from_file(path: &Path) -> Result<FrameBridgeSettings, ConfigError> {
        builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .build()?
            .try_deserialize()
    }

    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("bridge.allowed_origins")
            .with_list_parse_key("bridge.isolation_flags")
    }
}
