use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use audio_core::{split_transcript, AudioAssembler};

use crate::client::{RequestWriter, SynthClient};
use crate::config::TtsConfig;
use crate::error::TtsError;
use crate::protocol::{InboundMessage, SynthesisRequest};

/// MIME type of the emitted audio containers.
pub const WAV_MIME: &str = "audio/wav";

/// Consecutive malformed inbound messages tolerated before the session
/// gives up on the stream.
const MAX_PROTOCOL_ERRORS: u32 = 3;

/// Items delivered to the polling consumer, in insertion order. One
/// `Started` marker comes first, then zero or more `Audio` containers,
/// then exactly one terminal marker and nothing after it.
#[derive(Debug)]
pub enum HandoffItem {
    Started {
        context_id: String,
        started_at: DateTime<Utc>,
    },
    /// A self-contained `audio/wav` container ready for playback.
    Audio { wav: Vec<u8> },
    Completed,
    Failed { cause: String },
    Cancelled,
}

impl HandoffItem {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            HandoffItem::Completed | HandoffItem::Failed { .. } | HandoffItem::Cancelled
        )
    }
}

/// Where an active session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Connecting,
    Streaming,
    Draining,
}

/// How the session ended. Exactly one of these becomes the terminal marker.
#[derive(Debug)]
enum Outcome {
    Completed,
    Failed(TtsError),
    Cancelled,
}

/// Control handle for one session, owned by the caller. Dropping the
/// handle does not stop the worker; call [`SessionHandle::cancel`].
pub struct SessionHandle {
    context_id: String,
    cancel: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    /// Signal cancellation. The background worker observes the signal at
    /// its next suspension point, stops all sends and receives, closes
    /// the connection, and pushes a single `Cancelled` marker.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Start a streaming synthesis session on a background task.
///
/// Returns the control handle and the consuming end of the hand-off
/// queue. The queue is the only structure shared with the consumer; the
/// audio buffer and session state stay exclusive to the worker.
pub fn start_session(
    config: TtsConfig,
    text: String,
) -> (SessionHandle, mpsc::UnboundedReceiver<HandoffItem>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let context_id = Uuid::new_v4().to_string();

    let task = tokio::spawn(run_session(config, text, context_id.clone(), tx, cancel_rx));

    (
        SessionHandle {
            context_id,
            cancel: cancel_tx,
            task,
        },
        rx,
    )
}

async fn run_session(
    config: TtsConfig,
    text: String,
    context_id: String,
    tx: mpsc::UnboundedSender<HandoffItem>,
    cancel: watch::Receiver<bool>,
) {
    // The consumer may be gone already (e.g. a newer session replaced this
    // one), so every hand-off send is best-effort.
    let _ = tx.send(HandoffItem::Started {
        context_id: context_id.clone(),
        started_at: Utc::now(),
    });

    match drive_session(&config, &text, &context_id, &tx, cancel).await {
        Outcome::Completed => {
            info!(%context_id, "session completed");
            let _ = tx.send(HandoffItem::Completed);
        }
        Outcome::Failed(err) => {
            warn!(%context_id, error = %err, "session failed");
            let _ = tx.send(HandoffItem::Failed {
                cause: err.to_string(),
            });
        }
        Outcome::Cancelled => {
            info!(%context_id, "session cancelled");
            let _ = tx.send(HandoffItem::Cancelled);
        }
    }
}

async fn drive_session(
    config: &TtsConfig,
    text: &str,
    context_id: &str,
    tx: &mpsc::UnboundedSender<HandoffItem>,
    mut cancel: watch::Receiver<bool>,
) -> Outcome {
    let mut state = SessionState::Connecting;
    debug!(%context_id, ?state, "session starting");

    let chunks = match split_transcript(text, config.max_chunk_chars) {
        Ok(chunks) => chunks,
        Err(e) => return Outcome::Failed(TtsError::Config(e.to_string())),
    };
    if chunks.is_empty() {
        // Nothing to synthesize; no reason to open a connection.
        return Outcome::Completed;
    }
    if *cancel.borrow() {
        return Outcome::Cancelled;
    }

    let client = SynthClient::new(config.clone());
    let connection = match client.connect().await {
        Ok(connection) => connection,
        Err(e) => return Outcome::Failed(e),
    };
    state = SessionState::Streaming;
    debug!(%context_id, ?state, chunks = chunks.len(), "streaming transcript");

    let (writer, mut reader) = connection.split();
    // Shared so the receive side can still issue the protocol cancel after
    // the send task has finished.
    let writer = Arc::new(Mutex::new(writer));

    let send_task = spawn_send_task(
        config.clone(),
        chunks,
        context_id.to_string(),
        Arc::clone(&writer),
        cancel.clone(),
    );

    let mut assembler = AudioAssembler::new(config.sample_rate, config.min_chunk_seconds);
    let mut protocol_errors = 0u32;

    let outcome = loop {
        let message = tokio::select! {
            _ = wait_cancelled(&mut cancel) => {
                let mut writer = writer.lock().await;
                if let Err(e) = writer.cancel(context_id).await {
                    debug!(%context_id, error = %e, "cancel message not delivered");
                }
                writer.close().await;
                break Outcome::Cancelled;
            }
            received = timeout(config.inactivity_timeout, reader.next_message()) => {
                match received {
                    Err(_) => break Outcome::Failed(TtsError::Timeout),
                    Ok(Ok(Some(message))) => message,
                    Ok(Ok(None)) => {
                        break Outcome::Failed(TtsError::StreamInterrupted(
                            "stream closed before completion".to_string(),
                        ));
                    }
                    Ok(Err(TtsError::Protocol(detail))) => {
                        protocol_errors += 1;
                        warn!(%context_id, %detail, "malformed message from service");
                        if protocol_errors >= MAX_PROTOCOL_ERRORS {
                            break Outcome::Failed(TtsError::Protocol(detail));
                        }
                        continue;
                    }
                    Ok(Err(e)) => break Outcome::Failed(e),
                }
            }
        };
        protocol_errors = 0;

        match message {
            InboundMessage::Chunk { data } => match assembler.offer(&data) {
                Ok(Some(wav)) => {
                    let _ = tx.send(HandoffItem::Audio { wav });
                }
                Ok(None) => {}
                Err(e) => break Outcome::Failed(TtsError::Decode(e)),
            },
            InboundMessage::Done => {
                state = SessionState::Draining;
                debug!(%context_id, ?state, leftover = assembler.buffered_bytes(), "draining");
                if let Some(wav) = assembler.flush() {
                    let _ = tx.send(HandoffItem::Audio { wav });
                }
                break Outcome::Completed;
            }
            InboundMessage::Error { message } => {
                break Outcome::Failed(TtsError::Service(message));
            }
            InboundMessage::Unknown => {
                debug!(%context_id, "ignoring unrecognized message type");
            }
        }
    };

    send_task.abort();
    outcome
}

/// Resolves when cancellation is signalled; pends forever once the handle
/// is gone and cancellation can no longer arrive.
async fn wait_cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

fn spawn_send_task(
    config: TtsConfig,
    chunks: Vec<String>,
    context_id: String,
    writer: Arc<Mutex<RequestWriter>>,
    cancel: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let last = chunks.len() - 1;
        for (idx, chunk) in chunks.iter().enumerate() {
            if *cancel.borrow() {
                return;
            }
            let continues = idx < last;
            // Trailing space keeps word separation intact when the service
            // concatenates consecutive transcripts.
            let transcript = if continues {
                format!("{chunk} ")
            } else {
                chunk.clone()
            };
            let request = SynthesisRequest::new(&config, &transcript, &context_id, continues);
            let mut writer = writer.lock().await;
            if let Err(e) = writer.send_chunk(&request).await {
                // The receive loop will observe the broken transport.
                warn!(%context_id, error = %e, "failed to send transcript chunk");
                return;
            }
        }
        debug!(%context_id, chunks = chunks.len(), "transcript fully sent");
    })
}
