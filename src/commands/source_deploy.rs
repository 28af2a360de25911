use std::path::{Path, PathBuf};

use crate::commands::{Command, CommandBuilder, CommandExecutor, execute_logged};
use crate::config::Config;
use crate::error::ForceCliError;
use crate::parsers::deploy::DeployResultParser;

/// What `force:source:deploy` sends to the org.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployTarget {
    SourcePaths(Vec<PathBuf>),
    Manifest(PathBuf),
}

/// `force:source:deploy --json`.
#[derive(Debug, Clone)]
pub struct SourceDeploy {
    executable: String,
    target: DeployTarget,
}

impl SourceDeploy {
    pub fn paths<I, P>(executable: impl Into<String>, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            executable: executable.into(),
            target: DeployTarget::SourcePaths(paths.into_iter().map(Into::into).collect()),
        }
    }

    pub fn paths_from_config<I, P>(config: &Config, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self::paths(&config.cli_executable, paths)
    }

    pub fn manifest(executable: impl Into<String>, manifest: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            target: DeployTarget::Manifest(manifest.into()),
        }
    }

    pub fn build(&self) -> Result<Command, ForceCliError> {
        let builder = CommandBuilder::new(&self.executable)
            .with_description("Deploy Source to Org")
            .with_arg("force:source:deploy")
            .with_json()
            .with_flag("--loglevel", "fatal");

        let builder = match &self.target {
            DeployTarget::SourcePaths(paths) => {
                if paths.is_empty() {
                    return Err(ForceCliError::InvalidSelection(
                        "no source paths to deploy".to_string(),
                    ));
                }
                let joined = paths
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                builder
                    .with_flag("--sourcepath", joined)
                    .with_log_name("force_source_deploy_with_sourcepath")
            }
            DeployTarget::Manifest(manifest) => builder
                .with_flag("--manifest", manifest.display().to_string())
                .with_log_name("force_source_deploy_with_manifest"),
        };
        Ok(builder.build())
    }

    pub async fn run<E: CommandExecutor>(
        &self,
        executor: &E,
        workspace: &Path,
    ) -> Result<DeployResultParser, ForceCliError> {
        let command = self.build()?;
        run_and_parse(executor, &command, workspace).await
    }
}

/// `force:source:push --json`. Rerun with `force_overwrite` to resolve a
/// conflict in favour of local source.
#[derive(Debug, Clone)]
pub struct SourcePush {
    executable: String,
    force_overwrite: bool,
}

impl SourcePush {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            force_overwrite: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.cli_executable)
    }

    pub fn force_overwrite(mut self, force: bool) -> Self {
        self.force_overwrite = force;
        self
    }

    pub fn build(&self) -> Command {
        let mut builder = CommandBuilder::new(&self.executable)
            .with_description("Push Source to Default Scratch Org")
            .with_arg("force:source:push")
            .with_json()
            .with_flag("--loglevel", "fatal");
        if self.force_overwrite {
            builder = builder
                .with_arg("--forceoverwrite")
                .with_description("Push Source to Default Scratch Org and Override Conflicts")
                .with_log_name("force_source_push_force_overwrite");
        } else {
            builder = builder.with_log_name("force_source_push");
        }
        builder.build()
    }

    pub async fn run<E: CommandExecutor>(
        &self,
        executor: &E,
        workspace: &Path,
    ) -> Result<DeployResultParser, ForceCliError> {
        run_and_parse(executor, &self.build(), workspace).await
    }
}

/// Run a `--json` command and parse its stdout.
///
/// The CLI exits non-zero on failed deploys while still printing JSON, so the
/// exit code only matters when there is nothing to parse.
async fn run_and_parse<E: CommandExecutor>(
    executor: &E,
    command: &Command,
    workspace: &Path,
) -> Result<DeployResultParser, ForceCliError> {
    let output = execute_logged(executor, command, workspace).await?;

    match DeployResultParser::new(&output.stdout) {
        Ok(parser) => Ok(parser),
        Err(ForceCliError::NoJson) if !output.success() => Err(ForceCliError::ProcessExit {
            code: output.exit_code.unwrap_or(-1),
            stderr: output.stderr,
        }),
        Err(e) => Err(e),
    }
}
