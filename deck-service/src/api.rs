use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use fea_model::error::{FEAError, FEAResult};
use fea_model::model::Structure;
use fea_model::results::Results;
use fea_model::validate::resolve;
use serde_json::json;
use std::fs;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::analysis::Analyse;
use crate::config::ServiceConfig;
use crate::dialects::{render_deck, DialectKind};
use crate::extract::extractor_for;
use crate::models::{
    AnalysisRequest, AnalysisResponse, AnalysisStatus, DeckRequest, DeckResponse, DialectInfo,
    ValidateRequest, ValidateResponse,
};

/// Application state
pub struct AppState {
    config: ServiceConfig,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> Self {
        Self { config }
    }
}

/// Build the API router
pub fn create_router(config: ServiceConfig) -> Router {
    let state = AppState::new(config);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/api/v1/version", get(version_handler))
        .route("/api/v1/dialects", get(dialects_handler))
        .route("/api/v1/validate", post(validate_handler))
        .route("/api/v1/deck", post(deck_handler))
        .route("/api/v1/analyze", post(analyze_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Root endpoint
async fn root_handler() -> Json<serde_json::Value> {
    Json(json!({
        "service": "FEA Deck Service",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "description": "Solver input decks for Abaqus/CalculiX, Ansys, OpenSees and SOFiSTiK",
        "dialects": DialectKind::ALL.iter().map(|k| k.name()).collect::<Vec<_>>(),
    }))
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let mut solvers = serde_json::Map::new();
    for kind in DialectKind::ALL {
        let exe = state.config.executable(kind);
        let available = tokio::process::Command::new(&exe)
            .arg("-v")
            .output()
            .await
            .is_ok();
        solvers.insert(
            kind.name().to_string(),
            json!({ "command": exe, "available": available }),
        );
    }

    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "solvers": solvers,
    }))
}

/// Version endpoint
async fn version_handler() -> Json<serde_json::Value> {
    Json(json!({
        "service": "FEA Deck Service",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "v1",
    }))
}

async fn dialects_handler(State(state): State<Arc<AppState>>) -> Json<Vec<DialectInfo>> {
    Json(
        DialectKind::ALL
            .iter()
            .map(|&kind| DialectInfo {
                name: kind.name().to_string(),
                extension: kind.extension().to_string(),
                comment: kind.comment().to_string(),
                executable: state.config.executable(kind),
                extraction: extractor_for(kind).is_ok(),
            })
            .collect(),
    )
}

/// Indexes are not part of the wire format
fn prepare(mut structure: Structure) -> Result<Structure, ApiError> {
    structure.rebuild_indexes()?;
    Ok(structure)
}

/// Run the pre-write resolution pass without rendering
async fn validate_handler(
    Json(request): Json<ValidateRequest>,
) -> Result<Json<ValidateResponse>, ApiError> {
    let structure = prepare(request.structure)?;
    tracing::info!("Validating structure '{}'", structure.name);

    let resolved = resolve(&structure)?;
    Ok(Json(ValidateResponse {
        valid: true,
        nodes: structure.node_count(),
        elements: structure.element_count(),
        steps: resolved.steps.iter().map(|s| s.step.name.clone()).collect(),
        message: "Structure validation passed".to_string(),
    }))
}

/// Render a deck and return its text
async fn deck_handler(Json(request): Json<DeckRequest>) -> Result<Json<DeckResponse>, ApiError> {
    let structure = prepare(request.structure)?;
    tracing::info!(
        "Rendering {} deck for '{}': {} nodes, {} elements",
        request.dialect,
        structure.name,
        structure.node_count(),
        structure.element_count()
    );

    let deck = render_deck(&structure, request.dialect, &request.options)?;
    Ok(Json(DeckResponse {
        dialect: request.dialect,
        file_name: format!("{}.{}", structure.name, request.dialect.extension()),
        lines: deck.lines().count(),
        deck,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}

/// Write, run and extract on a blocking worker
async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let job_id = Uuid::new_v4().to_string();
    let mut structure = prepare(request.structure)?;
    let decks = state.config.scratch_dir.join("decks");

    let mut options = state.config.analysis_options(request.dialect);
    options.deck = request.options;
    options.cpus = request.cpus.unwrap_or(1);
    options.license = request.license;

    tracing::info!(
        "Analysis {} of '{}' with {} ({} cpus)",
        job_id,
        structure.name,
        request.dialect,
        options.cpus
    );

    let prefix = format!("{job_id}_");
    let outcome = tokio::task::spawn_blocking(move || -> FEAResult<Results> {
        // decks land under the service's scratch root, never a client-chosen path
        fs::create_dir_all(&decks)?;
        let deck_dir = tempfile::Builder::new().prefix(&prefix).tempdir_in(&decks)?;
        structure.path = deck_dir.path().to_path_buf();
        let outcome = structure.analyse_and_extract(&options).cloned();
        if options.keep_scratch {
            let kept = deck_dir.into_path();
            tracing::info!("Keeping deck directory {:?}", kept);
        }
        outcome
    })
    .await
    .map_err(|e| ApiError::InternalError(format!("analysis worker failed: {e}")))?;

    let response = match outcome {
        Ok(results) => AnalysisResponse {
            job_id,
            status: AnalysisStatus::Success,
            results: Some(results),
            error_message: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        },
        Err(FEAError::AnalysisFailed(msg)) => {
            tracing::error!("Analysis {} failed: {}", job_id, msg);
            AnalysisResponse {
                job_id,
                status: AnalysisStatus::Failed,
                results: None,
                error_message: Some(msg),
                timestamp: chrono::Utc::now().to_rfc3339(),
            }
        }
        Err(e) => return Err(e.into()),
    };
    Ok(Json(response))
}

/// API Errors
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Unsupported: {0}")]
    Unsupported(String),
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<FEAError> for ApiError {
    fn from(err: FEAError) -> Self {
        match err {
            e @ (FEAError::Validation(_)
            | FEAError::DuplicateName(_)
            | FEAError::MissingReference(_)
            | FEAError::InvariantViolation(_)) => ApiError::ValidationError(e.to_string()),
            FEAError::UnsupportedFeature(msg) => ApiError::Unsupported(msg),
            e => ApiError::InternalError(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unsupported(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fea_model::prelude::*;

    fn tower() -> Structure {
        let mut s = Structure::new("tower", "/tmp");
        let base = s
            .add_nodes(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]])
            .unwrap();
        let top = s.add_node([0.0, 0.0, 1.0]).unwrap();
        for b in base {
            s.add_element(ElementType::Truss, vec![b, top]).unwrap();
        }
        s.add(vec![
            Material::elastic_isotropic("steel", 200e9, 0.3, 7850.0).into(),
            Section::truss("bar", 1e-4).into(),
            ElementProperties::new("ep", "steel", "bar", "elset_all").into(),
            Set::nodes("base", vec![0, 1, 2]).into(),
            Displacement::pinned("pinned", "base").into(),
            Load::point("tip", vec![top], Dofs::xyz(2000.0, 1000.0, -100000.0)).into(),
            Step::general("load", &["pinned"], &["tip"]).into(),
        ])
        .unwrap();
        s
    }

    /// What a client would post
    fn over_the_wire(s: &Structure) -> Structure {
        serde_json::from_value(serde_json::to_value(s).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_deck_handler_renders() {
        let request = DeckRequest {
            structure: over_the_wire(&tower()),
            dialect: DialectKind::OpenSees,
            options: Default::default(),
        };
        let Json(response) = deck_handler(Json(request)).await.unwrap();
        assert_eq!(response.file_name, "tower.tcl");
        assert!(response.deck.contains("node 4 0"));
        assert_eq!(response.lines, response.deck.lines().count());
    }

    #[tokio::test]
    async fn test_validate_handler_reports_missing_references() {
        let mut s = tower();
        s.add(vec![Step::general("extra", &[], &["ghost"]).into()])
            .unwrap();
        let err = validate_handler(Json(ValidateRequest {
            structure: over_the_wire(&s),
        }))
        .await
        .unwrap_err();
        assert!(matches!(&err, ApiError::ValidationError(msg) if msg.contains("ghost")));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_error_status_mapping() {
        let unsupported: ApiError = FEAError::UnsupportedFeature("heat".into()).into();
        assert_eq!(
            unsupported.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        let failed: ApiError = FEAError::AnalysisFailed("exit 1".into()).into();
        assert_eq!(
            failed.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_analyze_handler_removes_its_deck_directory() {
        let scratch = tempfile::tempdir().unwrap();
        let root = scratch.path().to_string_lossy().into_owned();
        let config = ServiceConfig::from_lookup(|key| match key {
            "DECK_SCRATCH_DIR" => Some(root.clone()),
            "ABAQUS_PATH" => Some("false".to_string()),
            _ => None,
        });
        let state = Arc::new(AppState::new(config));
        for _ in 0..2 {
            let request = AnalysisRequest {
                structure: over_the_wire(&tower()),
                dialect: DialectKind::Abaqus,
                options: Default::default(),
                cpus: None,
                license: None,
            };
            let Json(response) = analyze_handler(State(state.clone()), Json(request))
                .await
                .unwrap();
            assert_eq!(response.status, AnalysisStatus::Failed);
            assert!(response.error_message.is_some());
        }
        let decks = scratch.path().join("decks");
        assert_eq!(fs::read_dir(&decks).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_dialects_handler_lists_all() {
        let state = Arc::new(AppState::new(ServiceConfig::from_lookup(|_| None)));
        let Json(list) = dialects_handler(State(state)).await;
        assert_eq!(list.len(), 4);
        assert!(list.iter().any(|d| d.name == "abaqus" && d.extraction));
        assert!(list.iter().any(|d| d.name == "sofistik" && !d.extraction));
    }
}
