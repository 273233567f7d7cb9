use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// A single rejected field of a generation request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// High-level error type shared across pomsmith components.
#[derive(Debug, Error)]
pub enum PomsmithError {
    #[error("invalid request: {}", join_violations(.0))]
    InvalidRequest(Vec<FieldViolation>),
    #[error("manifest input must not be empty")]
    EmptyManifest,
    #[error("malformed manifest: {0}")]
    MalformedManifest(String),
    #[error("project generation failed: {0}")]
    Generation(String),
    #[error("template error: {0}")]
    Template(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("archive error: {0}")]
    Archive(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for PomsmithError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for PomsmithError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl PomsmithError {
    pub fn context<T: fmt::Display>(self, ctx: T) -> Self {
        match self {
            PomsmithError::MalformedManifest(msg) => {
                PomsmithError::MalformedManifest(format!("{ctx}: {msg}"))
            }
            PomsmithError::Generation(msg) => PomsmithError::Generation(format!("{ctx}: {msg}")),
            PomsmithError::Template(msg) => PomsmithError::Template(format!("{ctx}: {msg}")),
            PomsmithError::Config(msg) => PomsmithError::Config(format!("{ctx}: {msg}")),
            PomsmithError::Archive(msg) => PomsmithError::Archive(format!("{ctx}: {msg}")),
            PomsmithError::Serialization(msg) => {
                PomsmithError::Serialization(format!("{ctx}: {msg}"))
            }
            other => other,
        }
    }

    /// Folds an internal failure into the single error reported for a run.
    /// Request validation and filesystem write failures keep their own shape.
    pub fn into_generation(self) -> Self {
        match self {
            err @ (PomsmithError::InvalidRequest(_)
            | PomsmithError::Generation(_)
            | PomsmithError::Write { .. }) => err,
            other => PomsmithError::Generation(other.to_string()),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PomsmithError::Write {
            path: path.into(),
            source,
        }
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
