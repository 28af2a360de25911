use std::path::PathBuf;

use thiserror::Error;

/// How much of a failed command's stderr `user_message` keeps.
const STDERR_TAIL_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum ForceCliError {
    #[error("No JSON found in response")]
    NoJson,

    #[error("malformed JSON in response: {0}")]
    MalformedJson(serde_json::Error),

    #[error("unexpected response shape: {0}")]
    SchemaMismatch(serde_json::Error),

    #[error("process exited with code {code}: {stderr}")]
    ProcessExit { code: i32, stderr: String },

    #[error("path already exists: {}", .0.display())]
    PathExists(PathBuf),

    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for ForceCliError {
    /// Syntax and EOF errors mean the line was not JSON at all; data errors
    /// mean it was JSON the CLI should not have emitted.
    fn from(e: serde_json::Error) -> Self {
        match e.classify() {
            serde_json::error::Category::Data => Self::SchemaMismatch(e),
            _ => Self::MalformedJson(e),
        }
    }
}

impl ForceCliError {
    /// Returns true for the failures that can happen while building a parser.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::NoJson | Self::MalformedJson(_) | Self::SchemaMismatch(_)
        )
    }

    /// Produce a short message safe to show to a user.
    pub fn user_message(&self) -> String {
        match self {
            Self::NoJson => "No JSON found in response".to_string(),
            Self::MalformedJson(_) | Self::SchemaMismatch(_) => {
                "failed to parse CLI response".to_string()
            }
            Self::ProcessExit { code, stderr } => {
                if stderr.trim().is_empty() {
                    format!("CLI process exited with code {code}")
                } else {
                    // sfdx prints deprecation warnings and update notices
                    // first; the failure itself is the last thing on stderr.
                    let tail = stderr.trim_end();
                    let start = tail
                        .char_indices()
                        .rev()
                        .nth(STDERR_TAIL_CHARS - 1)
                        .map_or(0, |(i, _)| i);
                    let ellipsis = if start > 0 { "..." } else { "" };
                    format!(
                        "CLI process exited with code {code}: {ellipsis}{}",
                        &tail[start..]
                    )
                }
            }
            Self::PathExists(path) => format!("{} already exists", path.display()),
            Self::InvalidSelection(msg) => format!("invalid selection: {msg}"),
            Self::Config(msg) => format!("config error: {msg}"),
            Self::Io(_) => "I/O error while running command".to_string(),
            Self::Other(msg) => msg.clone(),
        }
    }
}
