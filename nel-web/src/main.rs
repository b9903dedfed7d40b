//! Servidor HTTP Axum para a ligação de entidades.
//!
//! Os recursos (PageRank, matriz, modelo de frases, classificador) são carregados
//! uma vez na partida e compartilhados somente-leitura entre as requisições. O
//! pipeline é síncrono e pesado em CPU, então roda em `spawn_blocking`.

mod config;

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use nel_core::entity::{format_qid, parse_qid};
use nel_core::linker::TaggedDocument;
use nel_core::{BowLanguageModel, DisambiguationClassifier, GraphStore, Mention, NelError, NelPipeline, PhraseModel};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

/// Estado compartilhado da aplicação
struct AppState {
    pipeline: NelPipeline,
    similarity_steps: usize,
    restart_probability: f64,
}

#[derive(Serialize)]
struct AnnotateResponse {
    text: String,
    annotations: Vec<Mention>,
}

#[derive(Deserialize)]
struct SimilarityQuery {
    a: String,
    b: String,
}

#[derive(Serialize)]
struct SimilarityResponse {
    a: String,
    b: String,
    score: f64,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    entities: usize,
    matrix: bool,
    classifier: bool,
}

/// Erros das rotas, já com o código HTTP correspondente.
enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl From<NelError> for ApiError {
    fn from(err: NelError) -> Self {
        match err {
            NelError::InvalidEntityId(_) | NelError::MalformedRecord { .. } => ApiError::BadRequest(err.to_string()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::load()?;
    let state = Arc::new(load_state(&config)?);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!("Servidor NEL iniciado em http://{}", config.bind_address());
    axum::serve(listener, app(state)).await?;
    Ok(())
}

/// Carrega os snapshots indicados na configuração.
fn load_state(config: &ServerConfig) -> nel_core::Result<AppState> {
    let graph = GraphStore::load(config.matrix_path.as_deref(), &config.pagerank_path)?;
    let phrase_model: Box<dyn PhraseModel> = match &config.language_model_path {
        Some(path) => Box::new(BowLanguageModel::load(path)?),
        None => {
            warn!("sem modelo de frases: log-verossimilhança zerada");
            Box::new(BowLanguageModel::new())
        }
    };
    let mut pipeline = NelPipeline::new(graph, phrase_model, config.builder);
    if let Some(path) = &config.classifier_path {
        pipeline = pipeline.with_classifier(DisambiguationClassifier::load(path)?);
    }
    Ok(AppState {
        pipeline,
        similarity_steps: config.similarity_steps,
        restart_probability: config.restart_probability,
    })
}

fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/annotate", post(annotate_handler))
        .route("/api/similarity", get(similarity_handler))
        .route("/api/health", get(health_handler))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state)
}

/// Anota um documento já passado pelo tagger.
async fn annotate_handler(
    State(state): State<Arc<AppState>>,
    Json(document): Json<TaggedDocument>,
) -> Result<Json<AnnotateResponse>, ApiError> {
    info!(chars = document.text.len(), candidates = document.candidates.len(), "anotando documento");
    let annotations = tokio::task::spawn_blocking(move || {
        let annotations = state.pipeline.annotate(&document);
        AnnotateResponse {
            text: document.text,
            annotations,
        }
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(annotations))
}

/// Similaridade por vizinhança entre duas entidades (exige a matriz carregada).
async fn similarity_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SimilarityQuery>,
) -> Result<Json<SimilarityResponse>, ApiError> {
    let a = parse_qid(&query.a)?;
    let b = parse_qid(&query.b)?;
    if state.pipeline.graph().matrix().is_none() {
        return Err(ApiError::NotFound("matriz de adjacência não carregada".to_string()));
    }

    let score = tokio::task::spawn_blocking(move || {
        state
            .pipeline
            .graph()
            .similarity(a, b, state.similarity_steps, state.restart_probability)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?
    .unwrap_or(0.0);

    Ok(Json(SimilarityResponse {
        a: format_qid(a),
        b: format_qid(b),
        score,
    }))
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let graph = state.pipeline.graph();
    Json(HealthResponse {
        status: "ok",
        entities: graph.pagerank().len(),
        matrix: graph.matrix().is_some(),
        classifier: state.pipeline.classifier().is_some(),
    })
}
