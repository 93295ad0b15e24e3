use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::config::TtsConfig;
use crate::error::TtsError;
use crate::protocol::{CancelRequest, InboundMessage, SynthesisRequest};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Low-level Cartesia WebSocket client for sending text and receiving audio.
///
/// Performs network I/O only; buffering and audio framing live in the
/// assembler.
#[derive(Debug, Clone)]
pub struct SynthClient {
    config: TtsConfig,
}

impl SynthClient {
    pub fn new(config: TtsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TtsConfig {
        &self.config
    }

    /// Open the bidirectional stream for one synthesis session.
    pub async fn connect(&self) -> Result<Connection, TtsError> {
        self.config.validate()?;
        let (ws, response) = connect_async(self.config.endpoint())
            .await
            .map_err(|e| TtsError::Connection(e.to_string()))?;
        debug!(status = %response.status(), "synthesis stream connected");
        Ok(Connection { ws })
    }
}

/// A live synthesis stream, scoped to one session.
pub struct Connection {
    ws: WsStream,
}

impl Connection {
    /// Split into independently usable halves so fragments can be read
    /// while later chunks are still being written.
    pub fn split(self) -> (RequestWriter, ResponseReader) {
        let (sink, stream) = self.ws.split();
        (RequestWriter { sink }, ResponseReader { stream })
    }
}

pub struct RequestWriter {
    sink: SplitSink<WsStream, Message>,
}

impl RequestWriter {
    /// Serialize and send one transcript chunk. Chunks must go out strictly
    /// in order; the service reconstructs the utterance by concatenation.
    pub async fn send_chunk(&mut self, request: &SynthesisRequest<'_>) -> Result<(), TtsError> {
        let payload =
            serde_json::to_string(request).map_err(|e| TtsError::Protocol(e.to_string()))?;
        self.sink
            .send(Message::text(payload))
            .await
            .map_err(|e| TtsError::StreamInterrupted(e.to_string()))
    }

    /// Ask the service to drop all pending synthesis for this context.
    pub async fn cancel(&mut self, context_id: &str) -> Result<(), TtsError> {
        let payload = serde_json::to_string(&CancelRequest::new(context_id))
            .map_err(|e| TtsError::Protocol(e.to_string()))?;
        self.sink
            .send(Message::text(payload))
            .await
            .map_err(|e| TtsError::StreamInterrupted(e.to_string()))
    }

    pub async fn close(&mut self) {
        let _ = self.sink.close().await;
    }
}

pub struct ResponseReader {
    stream: SplitStream<WsStream>,
}

impl ResponseReader {
    /// Next typed message from the wire. `Ok(None)` means the peer closed
    /// the stream. Malformed JSON surfaces as a per-message
    /// [`TtsError::Protocol`] without closing the stream; transport
    /// failures as [`TtsError::StreamInterrupted`].
    pub async fn next_message(&mut self) -> Result<Option<InboundMessage>, TtsError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return serde_json::from_str::<InboundMessage>(text.as_str())
                        .map(Some)
                        .map_err(|e| TtsError::Protocol(format!("invalid JSON from server: {e}")));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                // Ping/pong and stray binary frames are transport noise.
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(TtsError::StreamInterrupted(e.to_string())),
            }
        }
    }
}
