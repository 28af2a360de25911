use serde::Serialize;

use crate::parsers::deploy::{DeployOutcome, DeployResult, ErrorResponse};

/// Machine-readable summary of a classified deploy, printed by the binary.
#[derive(Debug, Serialize)]
pub struct DeployReport {
    pub status: &'static str,
    /// The `status` the CLI reported, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cli_status: Option<i64>,
    pub deployed: Vec<DeployResult>,
    pub failures: Vec<DeployResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ReportError>,
    #[serde(serialize_with = "serialize_seconds")]
    pub duration_seconds: f64,
}

#[derive(Debug, Serialize)]
pub struct ReportError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Seconds rounded to milliseconds; NaN, infinite and negative read as 0.
fn serialize_seconds<S: serde::Serializer>(secs: &f64, s: S) -> Result<S::Ok, S::Error> {
    let secs = if secs.is_finite() && *secs > 0.0 {
        (secs * 1000.0).round() / 1000.0
    } else {
        0.0
    };
    s.serialize_f64(secs)
}

impl DeployReport {
    pub fn from_outcome(outcome: &DeployOutcome<'_>, duration_seconds: f64) -> Self {
        let empty = Self {
            status: "unknown",
            cli_status: None,
            deployed: Vec::new(),
            failures: Vec::new(),
            error: None,
            duration_seconds,
        };

        match outcome {
            DeployOutcome::Conflict { errors, partial } | DeployOutcome::Failed { errors, partial } => {
                let status = if matches!(outcome, DeployOutcome::Conflict { .. }) {
                    "conflict"
                } else {
                    "error"
                };
                Self {
                    status,
                    cli_status: Some(errors.status),
                    deployed: partial
                        .map(|p| p.deployed_source().to_vec())
                        .unwrap_or_default(),
                    failures: errors.result.to_vec(),
                    error: Some(ReportError::from(errors)),
                    ..empty
                }
            }
            DeployOutcome::Succeeded(s) => Self {
                status: "success",
                cli_status: s.status,
                deployed: s.deployed_source().to_vec(),
                ..empty
            },
            DeployOutcome::PartialSuccess(s) => Self {
                status: "partial",
                cli_status: s.status,
                deployed: s.deployed_source().to_vec(),
                ..empty
            },
            DeployOutcome::Unclassified => empty,
        }
    }

    /// Process exit code for the binary: 0 success, 1 error, 2 conflict.
    pub fn exit_code(&self) -> i32 {
        match self.status {
            "success" | "partial" => 0,
            "conflict" => 2,
            _ => 1,
        }
    }
}

impl From<&ErrorResponse<'_>> for ReportError {
    fn from(errors: &ErrorResponse<'_>) -> Self {
        Self {
            name: errors.name.map(str::to_string),
            message: errors.message.map(str::to_string),
        }
    }
}
