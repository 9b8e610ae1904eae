//! Layered configuration loading.

use crate::config::merge::merge_policy;
use crate::config::sources::{environment, global_file, workspace_file};
use crate::config::PostsmithConfig;
use config::{ConfigError, File};
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence (highest last): defaults, global file, `config/config.toml`,
    /// `config/{POSTSMITH_ENV}.toml`, `POSTSMITH__*` environment variables.
    pub fn load(workspace_root: &Path) -> Result<PostsmithConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }

    /// Load from one explicit file; file layers are replaced, environment
    /// overrides still apply.
    pub fn load_from_file(path: &Path) -> Result<PostsmithConfig, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let builder = merge_policy::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()).required(true));
        let builder = environment::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }

    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    /// Defaults only, no files or environment
    pub fn defaults() -> Result<PostsmithConfig, ConfigError> {
        merge_policy::builder_with_defaults()?
            .build()?
            .try_deserialize()
    }
}
