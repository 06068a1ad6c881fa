use fea_model::model::Structure;
use fea_model::results::Results;
use serde::{Deserialize, Serialize};

use crate::dialects::{DeckOptions, DialectKind};

/// A structure as posted to the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub structure: Structure,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub nodes: usize,
    pub elements: usize,
    pub steps: Vec<String>,
    pub message: String,
}

/// Render one deck
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckRequest {
    pub structure: Structure,
    pub dialect: DialectKind,
    #[serde(default)]
    pub options: DeckOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckResponse {
    pub dialect: DialectKind,
    /// `{name}.{ext}` the deck would be written to
    pub file_name: String,
    pub deck: String,
    pub lines: usize,
    pub timestamp: String,
}

/// Write, run and extract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub structure: Structure,
    #[serde(default = "default_dialect")]
    pub dialect: DialectKind,
    #[serde(default)]
    pub options: DeckOptions,
    #[serde(default)]
    pub cpus: Option<usize>,
    #[serde(default)]
    pub license: Option<String>,
}

fn default_dialect() -> DialectKind {
    DialectKind::Abaqus
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub job_id: String,
    pub status: AnalysisStatus,
    pub results: Option<Results>,
    pub error_message: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AnalysisStatus {
    Success,
    Failed,
}

/// One entry of `GET /api/v1/dialects`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialectInfo {
    pub name: String,
    pub extension: String,
    pub comment: String,
    pub executable: String,
    /// Whether results can be read back after a run
    pub extraction: bool,
}
