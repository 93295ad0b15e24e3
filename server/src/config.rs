// Configuration for the server and the synthesis session

use std::str::FromStr;
use std::time::Duration;

use cartesia_core::TtsConfig;

#[derive(Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub rate_limit_per_minute: u32,
    pub request_timeout_secs: u64,
    pub cors_allowed_origins: Option<Vec<String>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8085,
            rate_limit_per_minute: 60,
            request_timeout_secs: 60,
            cors_allowed_origins: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .ok()
            .map(|origins| origins.split(',').map(|s| s.trim().to_string()).collect());

        Self {
            port: env_parsed("PORT", defaults.port),
            rate_limit_per_minute: env_parsed(
                "RATE_LIMIT_PER_MINUTE",
                defaults.rate_limit_per_minute,
            ),
            request_timeout_secs: env_parsed("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
            cors_allowed_origins,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Build the synthesis configuration from the environment.
///
/// Every field has a documented default except the API key, whose absence
/// is a startup-time error surfaced to the operator.
pub fn load_tts_config() -> anyhow::Result<TtsConfig> {
    let defaults = TtsConfig::default();

    let config = TtsConfig {
        api_key: std::env::var("CARTESIA_API_KEY").unwrap_or_default(),
        version: env_or("CARTESIA_VERSION", defaults.version),
        model_id: env_or("CARTESIA_MODEL_ID", defaults.model_id),
        voice_id: env_or("CARTESIA_VOICE_ID", defaults.voice_id),
        sample_rate: env_parsed("CARTESIA_SAMPLE_RATE", defaults.sample_rate),
        language: env_or("CARTESIA_LANGUAGE", defaults.language),
        ws_url: env_or("CARTESIA_WS_URL", defaults.ws_url),
        max_chunk_chars: env_parsed("MAX_CHARS_PER_CHUNK", defaults.max_chunk_chars),
        min_chunk_seconds: env_parsed("MIN_CHUNK_SECONDS", defaults.min_chunk_seconds),
        inactivity_timeout: Duration::from_secs(env_parsed("INACTIVITY_TIMEOUT_SECS", 30)),
    };

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("{e}. Set CARTESIA_API_KEY in the environment."))?;

    Ok(config)
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(default)
}

fn env_parsed<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
