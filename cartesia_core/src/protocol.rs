use serde::{Deserialize, Serialize};

use crate::config::TtsConfig;

/// One outbound transcript chunk of a streaming synthesis session. The
/// service concatenates transcripts sharing a `context_id` into one
/// continuous utterance.
#[derive(Debug, Serialize)]
pub struct SynthesisRequest<'a> {
    pub model_id: &'a str,
    pub transcript: &'a str,
    pub voice: VoiceSelector<'a>,
    pub language: &'a str,
    pub context_id: &'a str,
    pub output_format: OutputFormat,
    pub add_timestamps: bool,
    /// True for every chunk except the last one.
    #[serde(rename = "continue")]
    pub continues: bool,
}

impl<'a> SynthesisRequest<'a> {
    pub fn new(
        config: &'a TtsConfig,
        transcript: &'a str,
        context_id: &'a str,
        continues: bool,
    ) -> Self {
        Self {
            model_id: &config.model_id,
            transcript,
            voice: VoiceSelector::by_id(&config.voice_id),
            language: &config.language,
            context_id,
            output_format: OutputFormat::raw_pcm(config.sample_rate),
            add_timestamps: false,
            continues,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VoiceSelector<'a> {
    pub mode: &'a str,
    pub id: &'a str,
}

impl<'a> VoiceSelector<'a> {
    pub fn by_id(id: &'a str) -> Self {
        Self { mode: "id", id }
    }
}

#[derive(Debug, Serialize)]
pub struct OutputFormat {
    pub container: &'static str,
    pub encoding: &'static str,
    pub sample_rate: u32,
}

impl OutputFormat {
    pub fn raw_pcm(sample_rate: u32) -> Self {
        Self {
            container: "raw",
            encoding: "pcm_s16le",
            sample_rate,
        }
    }
}

/// Tells the service to drop all pending synthesis for a context.
#[derive(Debug, Serialize)]
pub struct CancelRequest<'a> {
    pub context_id: &'a str,
    pub cancel: bool,
}

impl<'a> CancelRequest<'a> {
    pub fn new(context_id: &'a str) -> Self {
        Self {
            context_id,
            cancel: true,
        }
    }
}

/// Inbound messages, discriminated by `type`. Unrecognized types map to
/// `Unknown` so newer server-side message kinds don't break a session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Carries a base64-encoded raw PCM fragment.
    Chunk {
        #[serde(default)]
        data: String,
    },
    /// Terminal: the utterance is complete.
    Done,
    /// Terminal: the service reports a failure. The service emits the
    /// detail under `error`; `message` is accepted as well.
    Error {
        #[serde(alias = "error", default)]
        message: String,
    },
    #[serde(other)]
    Unknown,
}
