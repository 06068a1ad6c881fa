//! Error types for the structure model

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// A named reference that could not be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingRef {
    /// Kind of entity that was expected ("load", "set", "material", ...)
    pub kind: String,
    /// The name that was looked up
    pub name: String,
    /// Who referenced it, e.g. `step 'step_load'`
    pub referrer: String,
}

impl MissingRef {
    pub fn new(kind: &str, name: &str, referrer: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            name: name.to_string(),
            referrer: referrer.into(),
        }
    }
}

impl fmt::Display for MissingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' (referenced by {})", self.kind, self.name, self.referrer)
    }
}

/// Main error type for model building, deck writing and analysis
#[derive(Error, Debug)]
pub enum FEAError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Duplicate name '{0}' already exists")]
    DuplicateName(String),

    #[error("Missing references: {}", join_refs(.0))]
    MissingReference(Vec<MissingRef>),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("Snapshot I/O error for {path}: {source}")]
    SnapshotIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Snapshot format error for {path}: {source}")]
    SnapshotFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FEAError {
    /// Names listed by a `MissingReference` error, empty for any other kind
    pub fn missing_names(&self) -> Vec<&str> {
        match self {
            FEAError::MissingReference(refs) => refs.iter().map(|r| r.name.as_str()).collect(),
            _ => Vec::new(),
        }
    }
}

fn join_refs(refs: &[MissingRef]) -> String {
    refs.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for model operations
pub type FEAResult<T> = Result<T, FEAError>;
