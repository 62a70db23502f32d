//! Batch transcription: accumulate audio locally, upload once on stop.
//!
//! No network traffic happens while recording. `stop()` wraps the
//! accumulated PCM in a WAV container, posts it as one multipart request,
//! and queues the single final transcript (or the failure) before
//! returning, so the session can drain it right after stopping.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::audio::wav;
use crate::channel::TranscriptionChannel;
use crate::channel::event::{AudioChunk, ChannelEvent, TranscriptEvent};
use crate::channel::protocol::BatchReply;
use crate::defaults;
use crate::error::{DictamergeError, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP-backed channel that delivers one final transcript per recording.
pub struct BatchChannel {
    url: String,
    sample_rate: u32,
    recorded: Vec<u8>,
    events_tx: Option<mpsc::Sender<ChannelEvent>>,
}

impl BatchChannel {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            sample_rate: defaults::SAMPLE_RATE,
            recorded: Vec::new(),
            events_tx: None,
        }
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Raw PCM bytes accumulated so far.
    pub fn recorded_bytes(&self) -> usize {
        self.recorded.len()
    }

    async fn upload(&self) -> Result<String> {
        let wav_data = wav::encode_pcm16(&self.recorded, self.sample_rate)?;
        debug!(url = %self.url, bytes = wav_data.len(), "uploading recording");

        let part = Part::bytes(wav_data)
            .file_name(defaults::BATCH_AUDIO_FILENAME)
            .mime_str("audio/wav")
            .map_err(|e| DictamergeError::BatchUpload {
                message: e.to_string(),
            })?;
        let form = Form::new().part(defaults::BATCH_AUDIO_FIELD, part);

        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(UPLOAD_TIMEOUT)
            .build()
            .map_err(|e| DictamergeError::BatchUpload {
                message: e.to_string(),
            })?;

        let response = client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| DictamergeError::BatchUpload {
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DictamergeError::BatchUpload {
                message: e.to_string(),
            })?;
        parse_reply(status, &body)
    }
}

impl Default for BatchChannel {
    fn default() -> Self {
        Self::new(defaults::BATCH_URL)
    }
}

/// Maps the endpoint's reply body onto a transcript or a rejection.
fn parse_reply(status: reqwest::StatusCode, body: &str) -> Result<String> {
    match BatchReply::from_json(body) {
        Ok(BatchReply::Result {
            success: true,
            transcript,
        }) => Ok(transcript),
        Ok(BatchReply::Result { success: false, .. }) => Err(DictamergeError::BatchRejected {
            detail: format!("server reported failure (status {})", status),
        }),
        Ok(BatchReply::Error { detail }) => Err(DictamergeError::BatchRejected { detail }),
        Err(e) => {
            if status.is_success() {
                Err(DictamergeError::BatchUpload {
                    message: format!("unparseable reply: {}", e),
                })
            } else {
                Err(DictamergeError::BatchRejected {
                    detail: format!("status {}: {}", status, body.trim()),
                })
            }
        }
    }
}

#[async_trait]
impl TranscriptionChannel for BatchChannel {
    async fn start(&mut self) -> Result<mpsc::Receiver<ChannelEvent>> {
        self.recorded.clear();
        let (events_tx, events_rx) = mpsc::channel(defaults::EVENT_QUEUE_CAPACITY);
        self.events_tx = Some(events_tx);
        Ok(events_rx)
    }

    async fn send_audio(&mut self, chunk: AudioChunk) -> Result<()> {
        if self.events_tx.is_none() {
            debug!(sequence = chunk.sequence, "channel not open, dropping chunk");
            return Ok(());
        }
        self.recorded.extend_from_slice(&chunk.data);
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        let events_tx = match self.events_tx.take() {
            Some(tx) => tx,
            None => return Ok(()),
        };

        if self.recorded.is_empty() {
            debug!("no audio recorded, skipping upload");
            let _ = events_tx.send(ChannelEvent::Closed).await;
            return Ok(());
        }

        match self.upload().await {
            Ok(transcript) => {
                let event = ChannelEvent::Transcript(TranscriptEvent::new(transcript, true));
                let _ = events_tx.send(event).await;
            }
            Err(e) => {
                warn!(error = %e, "batch upload failed");
                let _ = events_tx.send(ChannelEvent::Error(e.to_string())).await;
            }
        }
        let _ = events_tx.send(ChannelEvent::Closed).await;
        self.recorded.clear();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "batch"
    }
}
