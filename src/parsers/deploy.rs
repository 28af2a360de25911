use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ForceCliError;
use crate::parsers::extract_json_line;

/// Error name the CLI reports when a deploy would overwrite remote changes.
pub const CONFLICT_ERROR_NAME: &str = "sourceConflictDetected";

/// Outcome for one file of a deploy or push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployResult {
    pub file_path: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub line_number: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub column_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The CLI emits positions as strings, older versions as numbers.
fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

/// Text fields on the error path. Anything that is not text reads as absent,
/// the same way a strict comparison against a string would fail.
fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

/// `warnings` is usually a list; a lone value becomes a one-item list.
fn lenient_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Value>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => vec![other],
    })
}

/// Integral numbers only, so `1.0` is `1`. Other values match no status.
fn integral_status<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    let status = match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        _ => None,
    };
    Ok(status)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Failure entries are read field by field. A component-level problem, such
/// as a bad `package.xml`, has no `filePath`, and a single such entry must not
/// hide the rest of the response.
fn failure_entry(value: Value) -> DeployResult {
    let field = |key: &str| value.get(key).and_then(scalar_text);
    match &value {
        Value::Object(_) => DeployResult {
            file_path: field("filePath").unwrap_or_default(),
            kind: field("type").unwrap_or_default(),
            full_name: field("fullName"),
            state: field("state"),
            line_number: field("lineNumber"),
            column_number: field("columnNumber"),
            error: field("error"),
        },
        other => DeployResult {
            file_path: String::new(),
            kind: String::new(),
            full_name: None,
            state: None,
            line_number: None,
            column_number: None,
            error: scalar_text(other).or_else(|| Some(other.to_string())),
        },
    }
}

/// Success-side `result` object. `pushedSource` comes from `force:source:push`,
/// `deployedSource` from `force:source:deploy`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployed_source: Option<Vec<DeployResult>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pushed_source: Option<Vec<DeployResult>>,
}

/// The `result` field, whose shape depends on the outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DeployPayload {
    /// Per-file failures, reported alongside `status: 1`. Entries missing
    /// `filePath` or `type` carry empty strings there.
    Failures(Vec<DeployResult>),
    Source(SourcePayload),
    #[default]
    Absent,
    /// Any other JSON value. Kept so unknown shapes still parse.
    Other(Value),
}

impl<'de> Deserialize<'de> for DeployPayload {
    // Dispatch on the JSON kind: success objects are decoded strictly so a
    // malformed entry is reported instead of falling through to `Other`.
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(d)?;
        match value {
            Value::Null => Ok(Self::Absent),
            Value::Array(items) => Ok(Self::Failures(
                items.into_iter().map(failure_entry).collect(),
            )),
            Value::Object(_) => serde_json::from_value(value)
                .map(Self::Source)
                .map_err(de::Error::custom),
            other => Ok(Self::Other(other)),
        }
    }
}

impl DeployPayload {
    /// Per-file failures, empty unless the payload is a sequence.
    pub fn failures(&self) -> &[DeployResult] {
        match self {
            Self::Failures(items) => items,
            _ => &[],
        }
    }
}

/// The JSON object the CLI prints with `--json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployResponse {
    #[serde(default, deserialize_with = "integral_status")]
    pub status: Option<i64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub stack: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub warnings: Vec<Value>,
    #[serde(default)]
    pub result: DeployPayload,
    #[serde(default)]
    pub partial_success: Option<Vec<DeployResult>>,
}

/// A failed response (`status: 1`), borrowed from the parser.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ErrorResponse<'a> {
    pub status: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<&'a str>,
    pub warnings: &'a [Value],
    pub result: &'a [DeployResult],
}

/// Successful files in the `{ status, result: { deployedSource } }` shape,
/// whatever shape the CLI actually used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SuccessResponse<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
    pub result: DeployedSource<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployedSource<'a> {
    pub deployed_source: &'a [DeployResult],
}

impl<'a> SuccessResponse<'a> {
    fn new(status: Option<i64>, deployed_source: &'a [DeployResult]) -> Self {
        Self {
            status,
            result: DeployedSource { deployed_source },
        }
    }

    pub fn deployed_source(&self) -> &'a [DeployResult] {
        self.result.deployed_source
    }
}

/// Every classification of a response in one value.
///
/// A failed response can also carry `partialSuccess`; both halves are kept
/// so the caller decides which to act on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeployOutcome<'a> {
    Conflict {
        errors: ErrorResponse<'a>,
        partial: Option<SuccessResponse<'a>>,
    },
    Failed {
        errors: ErrorResponse<'a>,
        partial: Option<SuccessResponse<'a>>,
    },
    Succeeded(SuccessResponse<'a>),
    /// Neither `0` nor `1`, but some files went through.
    PartialSuccess(SuccessResponse<'a>),
    Unclassified,
}

/// Parses the output of `force:source:deploy --json` and `force:source:push --json`.
///
/// The response is decoded once, in [`DeployResultParser::new`]; every query
/// afterwards is a read-only view of it.
#[derive(Debug, Clone)]
pub struct DeployResultParser {
    response: DeployResponse,
}

impl DeployResultParser {
    pub fn new(stdout: &str) -> Result<Self, ForceCliError> {
        let line = extract_json_line(stdout).ok_or(ForceCliError::NoJson)?;
        let response: DeployResponse = serde_json::from_str(line)?;
        tracing::debug!(
            status = ?response.status,
            name = response.name.as_deref().unwrap_or(""),
            "parsed deploy response"
        );
        Ok(Self { response })
    }

    pub fn response(&self) -> &DeployResponse {
        &self.response
    }

    /// The failure view, present only for `status: 1`.
    pub fn errors(&self) -> Option<ErrorResponse<'_>> {
        let r = &self.response;
        if r.status != Some(1) {
            return None;
        }
        Some(ErrorResponse {
            status: 1,
            name: r.name.as_deref(),
            message: r.message.as_deref(),
            stack: r.stack.as_deref(),
            warnings: &r.warnings,
            result: r.result.failures(),
        })
    }

    /// Successful files, normalised to `deployedSource`.
    ///
    /// `status: 0` wins over `partialSuccess`. The partial case keeps the
    /// original status, so it is not necessarily `0`.
    pub fn successes(&self) -> Option<SuccessResponse<'_>> {
        let r = &self.response;
        if r.status == Some(0) {
            let deployed: &[DeployResult] = match &r.result {
                DeployPayload::Source(SourcePayload {
                    pushed_source: Some(pushed),
                    ..
                }) => pushed,
                DeployPayload::Source(SourcePayload {
                    deployed_source: Some(deployed),
                    ..
                }) => deployed,
                _ => &[],
            };
            return Some(SuccessResponse::new(r.status, deployed));
        }
        r.partial_success
            .as_deref()
            .map(|partial| SuccessResponse::new(r.status, partial))
    }

    pub fn has_conflicts(&self) -> bool {
        self.response.status == Some(1)
            && self.response.name.as_deref() == Some(CONFLICT_ERROR_NAME)
    }

    pub fn outcome(&self) -> DeployOutcome<'_> {
        let successes = self.successes();
        match self.errors() {
            Some(errors) if self.has_conflicts() => DeployOutcome::Conflict {
                errors,
                partial: successes,
            },
            Some(errors) => DeployOutcome::Failed {
                errors,
                partial: successes,
            },
            None => match successes {
                Some(s) if self.response.status == Some(0) => DeployOutcome::Succeeded(s),
                Some(s) => DeployOutcome::PartialSuccess(s),
                None => DeployOutcome::Unclassified,
            },
        }
    }
}

impl FromStr for DeployResultParser {
    type Err = ForceCliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
