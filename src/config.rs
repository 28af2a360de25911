use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::commands::DEFAULT_EXECUTABLE;
use crate::error::ForceCliError;

/// File read by [`Config::load`] when `FORCECLI_CONFIG` is not set.
pub const CONFIG_FILE_NAME: &str = "forcecli.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// CLI binary to invoke (`sfdx` unless overridden).
    pub cli_executable: String,
    /// Project root commands run in. `None` means the current directory.
    pub workspace_root: Option<PathBuf>,
    /// Let metadata creation replace an existing bundle.
    pub allow_overwrite: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cli_executable: DEFAULT_EXECUTABLE.to_string(),
            workspace_root: None,
            allow_overwrite: false,
        }
    }
}

/// On-disk shape of `forcecli.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    cli_executable: Option<String>,
    workspace_root: Option<PathBuf>,
    allow_overwrite: Option<bool>,
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(exe) = env::var("FORCECLI_EXECUTABLE")
            .ok()
            .filter(|s| !s.trim().is_empty())
        {
            config.cli_executable = exe;
        }
        if let Ok(root) = env::var("FORCECLI_WORKSPACE") {
            config.workspace_root = Some(PathBuf::from(root));
        }
        if let Ok(raw) = env::var("FORCECLI_ALLOW_OVERWRITE") {
            match parse_bool(&raw) {
                Some(v) => config.allow_overwrite = v,
                None => tracing::warn!("ignoring FORCECLI_ALLOW_OVERWRITE={raw:?}: not a boolean"),
            }
        }
        config
    }

    /// Environment first, then `$FORCECLI_CONFIG` or `./forcecli.toml` on top.
    /// A missing file is not an error; an unreadable or invalid one is.
    pub fn load() -> Result<Self, ForceCliError> {
        let config = Self::from_env();
        let path = env::var("FORCECLI_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(CONFIG_FILE_NAME));

        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file");
            return Ok(config);
        }
        config.with_file(&path)
    }

    /// Overlay the keys set in a TOML config file.
    pub fn with_file(mut self, path: &Path) -> Result<Self, ForceCliError> {
        let raw = std::fs::read_to_string(path)?;
        let file: ConfigFile = toml::from_str(&raw)
            .map_err(|e| ForceCliError::Config(format!("{}: {e}", path.display())))?;

        if let Some(exe) = file.cli_executable {
            self.cli_executable = exe;
        }
        if let Some(root) = file.workspace_root {
            self.workspace_root = Some(root);
        }
        if let Some(allow) = file.allow_overwrite {
            self.allow_overwrite = allow;
        }
        tracing::info!(path = %path.display(), "loaded config file");
        Ok(self)
    }

    /// The directory commands should run in.
    pub fn workspace(&self) -> Result<PathBuf, ForceCliError> {
        match &self.workspace_root {
            Some(root) => Ok(root.clone()),
            None => Ok(env::current_dir()?),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
