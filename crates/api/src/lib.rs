mod config;
mod session_gate;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use reqwest::Client;
use serde::Serialize;
use stroll_agents::{GeminiClient, TourResolver};
use stroll_core::{
    specialty_guidance, TourCategory, TourError, TourRequestInput, DURATION_PRESETS_MINUTES,
};
use stroll_observability::AppMetrics;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};

pub use config::AppConfig;
pub use session_gate::{SessionGate, SessionPass};

const SESSION_HEADER: &str = "x-session-id";
const MAX_SESSION_ID_LEN: usize = 128;
const MAX_BODY_BYTES: usize = 16 * 1024;

#[derive(Clone)]
pub struct ApiState {
    pub resolver: Arc<TourResolver<GeminiClient>>,
    pub metrics: Arc<AppMetrics>,
    pub gate: SessionGate,
    pub model: String,
    pub allowed_origins: Arc<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    metrics: stroll_observability::MetricsSnapshot,
    capabilities: HealthCapabilities,
}

#[derive(Debug, Serialize)]
struct HealthCapabilities {
    model: String,
    model_configured: bool,
    map_images: bool,
    response_mode: &'static str,
}

#[derive(Debug, Serialize)]
struct CatalogCategory {
    slug: &'static str,
    label: &'static str,
    specialty: bool,
}

#[derive(Debug, Serialize)]
struct CatalogResponse {
    categories: Vec<CatalogCategory>,
    durations_minutes: Vec<u32>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub async fn build_app(config: AppConfig) -> Result<Router> {
    let metrics = AppMetrics::shared();

    let http_client = Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.http_timeout)
        .build()
        .context("failed to build HTTP client")?;
    let model = GeminiClient::new(
        http_client,
        config.gemini_base_url.clone(),
        config.model.clone(),
    );

    let model_name = model.model().to_string();
    let resolver = TourResolver::new(model, config.resolver_config(), metrics.clone());
    if !resolver.model_configured() {
        warn!("no usable Gemini API key configured; tour requests will fail");
    }

    let state = ApiState {
        resolver: Arc::new(resolver),
        metrics,
        gate: SessionGate::new(),
        model: model_name,
        allowed_origins: Arc::new(config.allowed_origins.clone()),
    };

    Ok(build_router(state))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/catalog", get(catalog))
        .route("/v1/tour", post(create_tour))
        .layer(build_cors_layer(&state.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        metrics: state.metrics.snapshot(),
        capabilities: HealthCapabilities {
            model: state.model.clone(),
            model_configured: state.resolver.model_configured(),
            map_images: state.resolver.map_images_enabled(),
            response_mode: state.resolver.mode().as_str(),
        },
    };

    (StatusCode::OK, Json(payload))
}

async fn catalog() -> impl IntoResponse {
    Json(CatalogResponse {
        categories: TourCategory::ALL
            .iter()
            .map(|category| CatalogCategory {
                slug: category.slug(),
                label: category.label(),
                specialty: specialty_guidance(*category).is_some(),
            })
            .collect(),
        durations_minutes: DURATION_PRESETS_MINUTES.to_vec(),
    })
}

#[instrument(skip_all)]
async fn create_tour(
    State(state): State<ApiState>,
    headers: HeaderMap,
    payload: Result<Json<TourRequestInput>, JsonRejection>,
) -> Response {
    let _pass = match session_id_from_headers(&headers) {
        Some(session_id) => match state.gate.try_enter(&session_id) {
            Some(pass) => Some(pass),
            None => {
                info!(session_id = %session_id, "overlapping tour request refused");
                return error_response(
                    StatusCode::CONFLICT,
                    "A tour is already being generated for this session.",
                );
            }
        },
        None => None,
    };

    let result = match payload {
        Ok(Json(input)) => state.resolver.resolve_input(input).await,
        Err(rejection) => Err(TourError::validation(rejection.body_text())),
    };

    match result {
        Ok(itinerary) => (StatusCode::OK, Json(itinerary)).into_response(),
        Err(error) => {
            warn!(kind = error.kind(), error = %error, "tour request failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, error.user_message())
        }
    }
}

fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty() && value.len() <= MAX_SESSION_ID_LEN)
        .map(ToString::to_string)
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}

fn build_cors_layer(allowed_origins: &Arc<Vec<String>>) -> CorsLayer {
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::HeaderName::from_static(SESSION_HEADER),
        ])
}
