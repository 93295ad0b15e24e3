use thiserror::Error;

/// Session-level failure taxonomy.
///
/// Every variant except `Config` is caught at the session boundary and
/// converted into a single `failed` hand-off marker; none of them
/// propagate into the presentation layer as faults.
#[derive(Debug, Error)]
pub enum TtsError {
    /// Missing or invalid settings; surfaced before any session starts.
    #[error("configuration error: {0}")]
    Config(String),

    /// WebSocket handshake failure.
    #[error("connection error: {0}")]
    Connection(String),

    /// Malformed inbound message. Tolerated per message; the session only
    /// fails when these repeat.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Transport dropped before the stream reported done or error.
    #[error("stream interrupted: {0}")]
    StreamInterrupted(String),

    /// No inbound message within the configured inactivity window.
    #[error("timed out waiting for audio from the synthesis service")]
    Timeout,

    /// Corrupt fragment payload; buffering cannot safely continue.
    #[error(transparent)]
    Decode(#[from] audio_core::DecodeError),

    /// The service itself reported a synthesis failure.
    #[error("synthesis service error: {0}")]
    Service(String),
}
