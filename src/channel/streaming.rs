//! Streaming transcription over a WebSocket.
//!
//! Audio chunks go out as binary frames while the recognizer pushes back
//! JSON text frames, each either an interim/final transcript or an error.
//! A spawned reader task translates frames into [`ChannelEvent`]s; stop
//! sends the `{"type":"stop"}` control message so the server can flush a
//! last final transcript before closing.

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite};
use tracing::{debug, warn};

use crate::channel::TranscriptionChannel;
use crate::channel::event::{AudioChunk, ChannelEvent, TranscriptEvent};
use crate::channel::protocol::{ControlMessage, ServerMessage};
use crate::defaults;
use crate::error::{DictamergeError, Result};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, tungstenite::Message>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// WebSocket-backed channel delivering interim and final transcripts.
pub struct StreamingChannel {
    url: String,
    writer: Option<WsSink>,
    reader: Option<JoinHandle<()>>,
}

impl StreamingChannel {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            writer: None,
            reader: None,
        }
    }
}

impl Default for StreamingChannel {
    fn default() -> Self {
        Self::new(defaults::STREAMING_URL)
    }
}

/// Drains the socket, translating frames into channel events until the
/// server closes or the transport fails. Always ends with `Closed`.
async fn read_loop(mut source: WsSource, events: mpsc::Sender<ChannelEvent>) {
    while let Some(message) = source.next().await {
        let message = match message {
            Ok(m) => m,
            Err(e) => {
                warn!(error = %e, "websocket transport error");
                let _ = events.send(ChannelEvent::Error(e.to_string())).await;
                break;
            }
        };

        let text = match message {
            tungstenite::Message::Text(t) => t,
            tungstenite::Message::Close(_) => break,
            _ => continue,
        };

        match ServerMessage::from_json(text.as_str()) {
            Ok(ServerMessage::Transcript {
                transcript,
                is_final,
            }) => {
                let event = ChannelEvent::Transcript(TranscriptEvent::new(transcript, is_final));
                if events.send(event).await.is_err() {
                    // Receiver dropped, nobody is listening anymore.
                    return;
                }
            }
            Ok(ServerMessage::Error { error }) => {
                let _ = events.send(ChannelEvent::Error(error)).await;
            }
            Err(e) => {
                warn!(error = %e, raw = %text.as_str(), "skipping malformed server message");
            }
        }
    }
    let _ = events.send(ChannelEvent::Closed).await;
}

#[async_trait]
impl TranscriptionChannel for StreamingChannel {
    async fn start(&mut self) -> Result<mpsc::Receiver<ChannelEvent>> {
        if let Some(task) = self.reader.take() {
            task.abort();
        }

        let (stream, _) = connect_async(self.url.as_str()).await.map_err(|e| {
            DictamergeError::ChannelConnect {
                message: format!("{}: {}", self.url, e),
            }
        })?;
        debug!(url = %self.url, "websocket connected");

        let (writer, reader) = stream.split();
        let (events_tx, events_rx) = mpsc::channel(defaults::EVENT_QUEUE_CAPACITY);
        self.writer = Some(writer);
        self.reader = Some(tokio::spawn(read_loop(reader, events_tx)));
        Ok(events_rx)
    }

    async fn send_audio(&mut self, chunk: AudioChunk) -> Result<()> {
        let writer = match self.writer.as_mut() {
            Some(w) => w,
            None => {
                debug!(sequence = chunk.sequence, "channel not open, dropping chunk");
                return Ok(());
            }
        };
        writer
            .send(tungstenite::Message::Binary(chunk.data.into()))
            .await
            .map_err(|e| DictamergeError::ChannelSend {
                message: e.to_string(),
            })
    }

    async fn stop(&mut self) -> Result<()> {
        let mut writer = match self.writer.take() {
            Some(w) => w,
            None => return Ok(()),
        };

        let stop =
            ControlMessage::Stop
                .to_json()
                .map_err(|e| DictamergeError::ChannelSend {
                    message: e.to_string(),
                })?;
        if let Err(e) = writer.send(tungstenite::Message::Text(stop.into())).await {
            warn!(error = %e, "failed to send stop message");
        }
        // The reader keeps draining until the server closes, so the final
        // transcript sent after stop still reaches the session.
        let _ = writer.close().await;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "streaming"
    }
}
