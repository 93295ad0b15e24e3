use std::time::Duration;

use crate::error::TtsError;

/// Connection and session settings for the Cartesia streaming API.
///
/// Passed explicitly to the client and the session; never read from
/// ambient state.
#[derive(Debug, Clone)]
pub struct TtsConfig {
    /// API credential. Required; there is no default.
    pub api_key: String,
    /// Protocol version date string.
    pub version: String,
    pub model_id: String,
    pub voice_id: String,
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    pub language: String,
    /// WebSocket endpoint; auth and version query parameters are appended
    /// on connect.
    pub ws_url: String,
    /// Maximum characters per transcript chunk.
    pub max_chunk_chars: usize,
    /// Minimum buffered duration before a playable container is emitted.
    pub min_chunk_seconds: f64,
    /// How long to wait between inbound messages before failing the session.
    pub inactivity_timeout: Duration,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            version: "2025-04-16".to_string(),
            model_id: "sonic-2".to_string(),
            voice_id: "a0e99841-438c-4a64-b679-ae501e7d6091".to_string(),
            sample_rate: 44_100,
            language: "en".to_string(),
            ws_url: "wss://api.cartesia.ai/tts/websocket".to_string(),
            max_chunk_chars: 900,
            min_chunk_seconds: 1.0,
            inactivity_timeout: Duration::from_secs(30),
        }
    }
}

impl TtsConfig {
    /// Validate required values. Run before any session starts.
    pub fn validate(&self) -> Result<(), TtsError> {
        if self.api_key.trim().is_empty() {
            return Err(TtsError::Config("Cartesia API key is required".to_string()));
        }
        if self.sample_rate == 0 {
            return Err(TtsError::Config("sample rate must be positive".to_string()));
        }
        if self.max_chunk_chars == 0 {
            return Err(TtsError::Config(
                "max chunk size must be positive".to_string(),
            ));
        }
        if self.min_chunk_seconds <= 0.0 {
            return Err(TtsError::Config(
                "minimum chunk duration must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the WebSocket URL with auth and version query parameters.
    pub(crate) fn endpoint(&self) -> String {
        format!(
            "{}?api_key={}&cartesia_version={}",
            self.ws_url, self.api_key, self.version
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_missing_the_credential() {
        let err = TtsConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    fn config_with_key_validates() {
        let config = TtsConfig {
            api_key: "key".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_sample_rate_is_rejected() {
        let config = TtsConfig {
            api_key: "key".to_string(),
            sample_rate: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn endpoint_carries_auth_and_version() {
        let config = TtsConfig {
            api_key: "secret".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.endpoint(),
            "wss://api.cartesia.ai/tts/websocket?api_key=secret&cartesia_version=2025-04-16"
        );
    }
}
