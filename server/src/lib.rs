pub mod config;
pub mod error;
pub mod metrics;
pub mod validation;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Mutex};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::GlobalKeyExtractor, GovernorLayer,
};
use tracing::{info, warn};

use cartesia_core::{start_session, HandoffItem, SessionHandle, TtsConfig, WAV_MIME};

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::metrics::{MetricsResponse, StreamMetrics, SystemMetrics};
use crate::validation::validate_speak_request;

static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Record the process start for uptime reporting.
pub fn init_start_time() {
    let _ = START_TIME.get_or_init(Instant::now);
}

/// One active session and its hand-off queue.
///
/// Single-active-session policy: starting a new session cancels and
/// replaces the previous one.
pub struct ActiveSession {
    handle: SessionHandle,
    queue: mpsc::UnboundedReceiver<HandoffItem>,
}

#[derive(Clone)]
pub struct AppState {
    pub tts: TtsConfig,
    pub session: Arc<Mutex<Option<ActiveSession>>>,
    pub metrics: Arc<StreamMetrics>,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(tts: TtsConfig, config: ServerConfig) -> Self {
        Self {
            tts,
            session: Arc::new(Mutex::new(None)),
            metrics: Arc::new(StreamMetrics::default()),
            config,
        }
    }
}

#[derive(Deserialize)]
pub struct SpeakRequest {
    pub text: String,
}

#[derive(Serialize)]
pub struct SpeakResponse {
    pub context_id: String,
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct StopResponse {
    pub status: &'static str,
}

/// What the polling UI receives, at most one item per call.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PollResponse {
    /// No session is active.
    Idle,
    /// The session is running but nothing is queued yet.
    Pending,
    Started {
        context_id: String,
        started_at: DateTime<Utc>,
    },
    Audio {
        audio_base64: String,
        mime_type: &'static str,
    },
    Completed,
    Failed {
        cause: String,
    },
    Cancelled,
}

pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn speak_endpoint(
    State(state): State<AppState>,
    Json(req): Json<SpeakRequest>,
) -> Result<Json<SpeakResponse>, ApiError> {
    state.metrics.record_request();
    validate_speak_request(&req.text)?;

    let mut active = state.session.lock().await;
    if let Some(previous) = active.take() {
        info!(
            context_id = previous.handle.context_id(),
            "replacing active session"
        );
        previous.handle.cancel();
    }

    let (handle, queue) = start_session(state.tts.clone(), req.text);
    let context_id = handle.context_id().to_string();
    state.metrics.record_session_started();
    info!(%context_id, "session started");
    *active = Some(ActiveSession { handle, queue });

    Ok(Json(SpeakResponse {
        context_id,
        status: "started",
    }))
}

/// Remove at most one hand-off item per poll, in insertion order. A
/// terminal item clears the active session.
pub async fn poll_endpoint(State(state): State<AppState>) -> Json<PollResponse> {
    state.metrics.record_request();
    let mut active = state.session.lock().await;
    let Some(session) = active.as_mut() else {
        return Json(PollResponse::Idle);
    };

    match session.queue.try_recv() {
        Ok(item) => {
            let terminal = item.is_terminal();
            let response = match item {
                HandoffItem::Started {
                    context_id,
                    started_at,
                } => PollResponse::Started {
                    context_id,
                    started_at,
                },
                HandoffItem::Audio { wav } => {
                    state.metrics.record_container(wav.len());
                    PollResponse::Audio {
                        audio_base64: STANDARD.encode(wav),
                        mime_type: WAV_MIME,
                    }
                }
                HandoffItem::Completed => PollResponse::Completed,
                HandoffItem::Failed { cause } => {
                    warn!(%cause, "session reported failure");
                    PollResponse::Failed { cause }
                }
                HandoffItem::Cancelled => PollResponse::Cancelled,
            };
            if terminal {
                *active = None;
            }
            Json(response)
        }
        Err(mpsc::error::TryRecvError::Empty) => Json(PollResponse::Pending),
        Err(mpsc::error::TryRecvError::Disconnected) => {
            // Worker gone without a terminal marker reaching us; drop it.
            *active = None;
            Json(PollResponse::Idle)
        }
    }
}

pub async fn stop_endpoint(State(state): State<AppState>) -> Result<Json<StopResponse>, ApiError> {
    state.metrics.record_request();
    let active = state.session.lock().await;
    match active.as_ref() {
        Some(session) => {
            info!(context_id = session.handle.context_id(), "stop requested");
            session.handle.cancel();
            // The Cancelled marker stays pollable until it is consumed.
            Ok(Json(StopResponse { status: "stopping" }))
        }
        None => Err(ApiError::NoActiveSession),
    }
}

pub async fn metrics_endpoint(State(state): State<AppState>) -> Json<MetricsResponse> {
    let mut system = sysinfo::System::new();
    system.refresh_cpu();
    system.refresh_memory();

    let cpu_usage = system.global_cpu_info().cpu_usage();
    let memory_used = system.used_memory();
    let memory_total = system.total_memory();
    let memory_usage_percent = if memory_total > 0 {
        (memory_used as f64 / memory_total as f64 * 100.0) as f32
    } else {
        0.0
    };

    let uptime = START_TIME
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0);

    // System load (Unix-like systems only)
    let system_load = {
        #[cfg(unix)]
        {
            use std::fs;
            if let Ok(loadavg) = fs::read_to_string("/proc/loadavg") {
                loadavg
                    .split_whitespace()
                    .next()
                    .and_then(|s| s.parse::<f64>().ok())
            } else {
                None
            }
        }
        #[cfg(not(unix))]
        None
    };

    Json(MetricsResponse {
        timestamp: Utc::now(),
        system: SystemMetrics {
            cpu_usage_percent: cpu_usage,
            memory_used_mb: memory_used / 1024 / 1024,
            memory_total_mb: memory_total / 1024 / 1024,
            memory_usage_percent,
            uptime_seconds: uptime,
            system_load,
        },
        streaming: state.metrics.snapshot(),
    })
}

/// Request ID middleware for tracing
async fn add_request_id(mut request: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    request.headers_mut().insert(
        "x-request-id",
        axum::http::HeaderValue::from_str(&request_id).unwrap(),
    );
    let mut response = next.run(request).await;
    response.headers_mut().insert(
        "x-request-id",
        axum::http::HeaderValue::from_str(&request_id).unwrap(),
    );
    response
}

fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers(tower_http::cors::Any)
        .allow_credentials(false)
}

// CORS configuration - environment-aware
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    if let Some(ref allowed_origins) = config.cors_allowed_origins {
        // Production: use specific origins from the environment
        let origins: Vec<axum::http::HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin: &String| origin.parse::<axum::http::HeaderValue>().ok())
            .collect();

        if origins.is_empty() {
            warn!("CORS_ALLOWED_ORIGINS is empty, falling back to permissive CORS");
            permissive_cors()
        } else {
            info!("CORS configured for {} origin(s)", origins.len());
            CorsLayer::new()
                .allow_origin(tower_http::cors::AllowOrigin::list(origins))
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers(tower_http::cors::Any)
                .allow_credentials(false)
        }
    } else {
        // Development: allow all origins (with warning)
        warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (development mode)");
        permissive_cors()
    }
}

/// Assemble the full router with the middleware stack.
pub fn build_app(state: AppState) -> Router {
    let config = state.config.clone();

    let cors = cors_layer(&config);

    // Rate limiting with a global key: all requests share one limit, which
    // behaves predictably behind Docker/proxy setups where IP extraction
    // is unreliable.
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second((config.rate_limit_per_minute / 60).max(1) as u64)
            .burst_size(config.rate_limit_per_minute)
            .key_extractor(GlobalKeyExtractor)
            .finish()
            .unwrap(),
    );

    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(GovernorLayer::new(governor_conf))
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(cors)
        .into_inner();

    let api = Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
        .route("/speak", post(speak_endpoint))
        .route("/poll", get(poll_endpoint))
        .route("/stop", post(stop_endpoint))
        .route("/metrics", get(metrics_endpoint));

    Router::new()
        .merge(api.clone()) // root paths
        .nest("/api", api) // /api prefix
        .layer(axum::middleware::from_fn(add_request_id))
        .layer(middleware_stack)
        .with_state(state)
}
