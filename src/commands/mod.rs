pub mod lightning_event;
pub mod source_deploy;

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::time::Instant;

use crate::error::ForceCliError;

/// Executable used when the config does not name one.
pub const DEFAULT_EXECUTABLE: &str = "sfdx";

/// A fully built CLI invocation. Arguments are passed as-is, never through a
/// shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub executable: String,
    pub args: Vec<String>,
    /// Human-readable label for progress and notifications.
    pub description: Option<String>,
    /// Key used when logging how long the command took.
    pub log_name: Option<String>,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.executable)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CommandBuilder {
    command: Command,
}

impl CommandBuilder {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            command: Command {
                executable: executable.into(),
                args: Vec::new(),
                description: None,
                log_name: None,
            },
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.command.description = Some(description.into());
        self
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.command.args.push(arg.into());
        self
    }

    pub fn with_flag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.command.args.push(name.into());
        self.command.args.push(value.into());
        self
    }

    /// Ask the CLI for a JSON result. Adding it twice is a no-op.
    pub fn with_json(self) -> Self {
        if self.command.args.iter().any(|a| a == "--json") {
            return self;
        }
        self.with_arg("--json")
    }

    pub fn with_log_name(mut self, log_name: impl Into<String>) -> Self {
        self.command.log_name = Some(log_name.into());
        self
    }

    pub fn build(self) -> Command {
        self.command
    }
}

/// What a finished CLI process left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs a [`Command`] to completion and captures its output.
///
/// The host owns process spawning, streaming to an output channel and
/// cancellation. This crate only consumes the captured result.
pub trait CommandExecutor: Send + Sync {
    fn execute(
        &self,
        command: &Command,
        cwd: &Path,
    ) -> impl Future<Output = Result<CommandOutput, ForceCliError>> + Send;
}

/// Execute `command` and log its duration under the command's log name.
/// A non-empty stderr is reported at warn level.
pub async fn execute_logged<E: CommandExecutor>(
    executor: &E,
    command: &Command,
    cwd: &Path,
) -> Result<CommandOutput, ForceCliError> {
    let start = Instant::now();
    let output = executor.execute(command, cwd).await;
    let elapsed_ms = start.elapsed().as_millis() as u64;
    let log_name = command.log_name.as_deref().unwrap_or("unnamed");

    match &output {
        Ok(out) => {
            tracing::info!(
                command = log_name,
                exit_code = ?out.exit_code,
                elapsed_ms,
                "command finished"
            );
            if !out.stderr.trim().is_empty() {
                tracing::warn!(command = %command, stderr = %out.stderr, "command reported errors");
            }
        }
        Err(e) => {
            tracing::warn!(command = log_name, elapsed_ms, "command failed to run: {e}");
        }
    }
    output
}
