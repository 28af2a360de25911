use std::path::{Path, PathBuf};

use crate::commands::{Command, CommandBuilder, CommandExecutor, execute_logged};
use crate::config::Config;
use crate::error::ForceCliError;

pub const LIGHTNING_EVT_EXTENSION: &str = "evt";

/// Name and output directory chosen for a new metadata file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirFileNameSelection {
    pub file_name: String,
    /// Relative to the workspace root, e.g. `force-app/main/default/aura`.
    pub output_dir: String,
}

impl DirFileNameSelection {
    pub fn new(file_name: impl Into<String>, output_dir: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            output_dir: output_dir.into(),
        }
    }

    fn validate(&self) -> Result<(), ForceCliError> {
        let name = self.file_name.trim();
        if name.is_empty() {
            return Err(ForceCliError::InvalidSelection(
                "file name is empty".to_string(),
            ));
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(ForceCliError::InvalidSelection(format!(
                "file name must not be a path: {name}"
            )));
        }
        Ok(())
    }
}

/// `force:lightning:event:create`.
#[derive(Debug, Clone)]
pub struct LightningEventCreate {
    executable: String,
    allow_overwrite: bool,
}

impl LightningEventCreate {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            allow_overwrite: false,
        }
    }

    /// Executable and overwrite policy taken from the loaded config.
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.cli_executable).allow_overwrite(config.allow_overwrite)
    }

    pub fn allow_overwrite(mut self, allow: bool) -> Self {
        self.allow_overwrite = allow;
        self
    }

    pub fn build(&self, selection: &DirFileNameSelection) -> Command {
        CommandBuilder::new(&self.executable)
            .with_description("Create Lightning Event")
            .with_arg("force:lightning:event:create")
            .with_flag("--eventname", &selection.file_name)
            .with_flag("--outputdir", &selection.output_dir)
            .with_log_name("force_lightning_event_create")
            .build()
    }

    /// Create the event and return the `.evt` file the host should open.
    ///
    /// Returns `None` when the CLI exited non-zero (its stderr has already
    /// been reported) or the workspace directory is gone.
    pub async fn run<E: CommandExecutor>(
        &self,
        executor: &E,
        workspace: &Path,
        selection: &DirFileNameSelection,
    ) -> Result<Option<PathBuf>, ForceCliError> {
        selection.validate()?;

        let bundle = event_bundle_dir(workspace, selection);
        if !self.allow_overwrite && bundle.exists() {
            return Err(ForceCliError::PathExists(bundle));
        }

        let command = self.build(selection);
        let output = execute_logged(executor, &command, workspace).await?;

        if !output.success() || !workspace.is_dir() {
            return Ok(None);
        }
        Ok(Some(event_document_path(workspace, selection)))
    }
}

/// The CLI creates a bundle directory named after the event.
fn event_bundle_dir(workspace: &Path, selection: &DirFileNameSelection) -> PathBuf {
    workspace
        .join(&selection.output_dir)
        .join(&selection.file_name)
}

/// `<workspace>/<output_dir>/<name>/<name>.evt`
pub fn event_document_path(workspace: &Path, selection: &DirFileNameSelection) -> PathBuf {
    event_bundle_dir(workspace, selection).join(format!(
        "{}.{LIGHTNING_EVT_EXTENSION}",
        selection.file_name
    ))
}
