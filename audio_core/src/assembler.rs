use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

use crate::wav::{pcm16_to_wav, BYTES_PER_SAMPLE};

#[derive(Debug, Error)]
#[error("invalid audio fragment encoding: {0}")]
pub struct DecodeError(#[from] base64::DecodeError);

/// Accumulates raw PCM fragments and emits self-contained WAV containers
/// once a minimum playable duration's worth of bytes has buffered.
///
/// Accounting is byte-exact; a fragment boundary may split a sample pair,
/// in which case the odd byte is dropped when the buffer is wrapped.
#[derive(Debug)]
pub struct AudioAssembler {
    buffer: Vec<u8>,
    min_chunk_bytes: usize,
    sample_rate: u32,
}

impl AudioAssembler {
    pub fn new(sample_rate: u32, min_chunk_seconds: f64) -> Self {
        let min_chunk_bytes =
            (min_chunk_seconds * sample_rate as f64 * BYTES_PER_SAMPLE as f64).ceil() as usize;
        Self {
            buffer: Vec::new(),
            min_chunk_bytes,
            sample_rate,
        }
    }

    /// Decode one base64 fragment into the buffer; returns a WAV container
    /// when the buffered bytes reach the minimum chunk size.
    pub fn offer(&mut self, encoded: &str) -> Result<Option<Vec<u8>>, DecodeError> {
        let pcm = STANDARD.decode(encoded)?;
        self.buffer.extend_from_slice(&pcm);
        if !self.buffer.is_empty() && self.buffer.len() >= self.min_chunk_bytes {
            return Ok(Some(self.wrap_and_clear()));
        }
        Ok(None)
    }

    /// Wrap whatever is buffered regardless of size. Called once at session
    /// end; an empty buffer emits nothing.
    pub fn flush(&mut self) -> Option<Vec<u8>> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(self.wrap_and_clear())
        }
    }

    pub fn buffered_bytes(&self) -> usize {
        self.buffer.len()
    }

    pub fn min_chunk_bytes(&self) -> usize {
        self.min_chunk_bytes
    }

    fn wrap_and_clear(&mut self) -> Vec<u8> {
        let pcm = std::mem::take(&mut self.buffer);
        pcm16_to_wav(&pcm, self.sample_rate)
    }
}
