//! Common utilities for integration tests

use std::time::Duration;

use axum::Router;
use cartesia_core::TtsConfig;
use server::config::ServerConfig;
use server::{build_app, AppState};

/// A synthesis config pointing at an address nothing listens on; good for
/// tests that never reach the connect step.
pub fn offline_tts_config() -> TtsConfig {
    TtsConfig {
        api_key: "test-key".to_string(),
        ws_url: "ws://127.0.0.1:9".to_string(),
        sample_rate: 8_000,
        min_chunk_seconds: 0.25,
        inactivity_timeout: Duration::from_secs(2),
        ..Default::default()
    }
}

/// Create a test app instance
pub fn create_test_app() -> Router {
    create_test_app_with(offline_tts_config())
}

/// Create a test app around a specific synthesis config (e.g. one pointed
/// at a local mock service).
pub fn create_test_app_with(tts: TtsConfig) -> Router {
    // Generous rate limit so polling loops in tests never trip it.
    let config = ServerConfig {
        rate_limit_per_minute: 600,
        ..Default::default()
    };
    build_app(AppState::new(tts, config))
}
