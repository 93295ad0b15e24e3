mod client;
mod config;
mod error;
mod protocol;
mod session;

pub use client::{Connection, RequestWriter, ResponseReader, SynthClient};
pub use config::TtsConfig;
pub use error::TtsError;
pub use protocol::{CancelRequest, InboundMessage, OutputFormat, SynthesisRequest, VoiceSelector};
pub use session::{start_session, HandoffItem, SessionHandle, WAV_MIME};
