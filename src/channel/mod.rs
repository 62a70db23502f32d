//! Transcription channel abstraction.
//!
//! Two interchangeable delivery modes sit behind one trait: a streaming
//! socket that returns interim/final events continuously, and a batch
//! accumulate-then-upload request that returns one final event. Both
//! normalize into the same [`ChannelEvent`] stream consumed by the session.

pub mod batch;
pub mod event;
pub mod protocol;
pub mod streaming;

pub use batch::BatchChannel;
pub use event::{AudioChunk, ChannelEvent, TranscriptEvent};
pub use streaming::StreamingChannel;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{DictamergeError, Result};

/// Delivery mode for recognizer results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelMode {
    /// Persistent socket with continuous interim/final events.
    Streaming,
    /// Record everything, upload once, receive one final transcript.
    Batch,
}

/// One transcription delivery channel.
///
/// This trait allows swapping implementations (streaming vs batch vs mock).
#[async_trait]
pub trait TranscriptionChannel: Send {
    /// Opens the channel and returns the receiver the session drains for
    /// transcript, error, and close events.
    async fn start(&mut self) -> Result<mpsc::Receiver<ChannelEvent>>;

    /// Forwards one captured audio chunk. A chunk sent before the channel
    /// is open is dropped rather than queued.
    async fn send_audio(&mut self, chunk: AudioChunk) -> Result<()>;

    /// Closes the channel. For the batch mode this is where the upload
    /// happens, so the final transcript event is queued before it returns.
    async fn stop(&mut self) -> Result<()>;

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "channel"
    }
}

/// Scripted channel for tests.
///
/// Clones share state, so a test keeps one copy for inspection and hands
/// the other to the session. Events queued with
/// [`MockChannel::with_events`] are delivered on start; events queued with
/// [`MockChannel::with_stop_events`] are delivered inside stop, mirroring
/// the batch upload. [`MockChannel::push`] injects events mid-session.
#[derive(Clone)]
pub struct MockChannel {
    start_events: Vec<ChannelEvent>,
    stop_events: Vec<ChannelEvent>,
    should_fail_start: bool,
    should_fail_send: bool,
    should_fail_stop: bool,
    error_message: String,
    sent: Arc<Mutex<Vec<AudioChunk>>>,
    stopped: Arc<Mutex<bool>>,
    events_tx: Arc<Mutex<Option<mpsc::Sender<ChannelEvent>>>>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            start_events: Vec::new(),
            stop_events: Vec::new(),
            should_fail_start: false,
            should_fail_send: false,
            should_fail_stop: false,
            error_message: "mock channel error".to_string(),
            sent: Arc::new(Mutex::new(Vec::new())),
            stopped: Arc::new(Mutex::new(false)),
            events_tx: Arc::new(Mutex::new(None)),
        }
    }

    /// Events delivered as soon as the channel starts.
    pub fn with_events(mut self, events: Vec<ChannelEvent>) -> Self {
        self.start_events = events;
        self
    }

    /// Events delivered inside stop(), before it returns.
    pub fn with_stop_events(mut self, events: Vec<ChannelEvent>) -> Self {
        self.stop_events = events;
        self
    }

    /// Configure the mock to fail on start.
    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }

    /// Configure the mock to fail on send_audio.
    pub fn with_send_failure(mut self) -> Self {
        self.should_fail_send = true;
        self
    }

    /// Configure the mock to fail on stop.
    pub fn with_stop_failure(mut self) -> Self {
        self.should_fail_stop = true;
        self
    }

    /// Configure the error message for failures.
    pub fn with_error_message(mut self, message: &str) -> Self {
        self.error_message = message.to_string();
        self
    }

    /// Injects an event into a started channel, as the server would.
    pub fn push(&self, event: ChannelEvent) {
        if let Ok(guard) = self.events_tx.lock() {
            if let Some(tx) = guard.as_ref() {
                let _ = tx.try_send(event);
            }
        }
    }

    /// Chunks received through send_audio so far.
    pub fn sent_chunks(&self) -> Vec<AudioChunk> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Whether stop() has been called.
    pub fn was_stopped(&self) -> bool {
        self.stopped.lock().map(|s| *s).unwrap_or(false)
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptionChannel for MockChannel {
    async fn start(&mut self) -> Result<mpsc::Receiver<ChannelEvent>> {
        if self.should_fail_start {
            return Err(DictamergeError::ChannelConnect {
                message: self.error_message.clone(),
            });
        }
        let (tx, rx) = mpsc::channel(crate::defaults::EVENT_QUEUE_CAPACITY);
        for event in self.start_events.drain(..) {
            let _ = tx.try_send(event);
        }
        if let Ok(mut guard) = self.events_tx.lock() {
            *guard = Some(tx);
        }
        Ok(rx)
    }

    async fn send_audio(&mut self, chunk: AudioChunk) -> Result<()> {
        if self.should_fail_send {
            return Err(DictamergeError::ChannelSend {
                message: self.error_message.clone(),
            });
        }
        let started = self.events_tx.lock().map(|g| g.is_some()).unwrap_or(false);
        if !started {
            // Not open yet: the chunk is dropped, matching the real modes.
            return Ok(());
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(chunk);
        }
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        if let Ok(mut stopped) = self.stopped.lock() {
            *stopped = true;
        }
        if self.should_fail_stop {
            return Err(DictamergeError::BatchUpload {
                message: self.error_message.clone(),
            });
        }
        let tx = self.events_tx.lock().ok().and_then(|g| g.clone());
        if let Some(tx) = tx {
            for event in self.stop_events.drain(..) {
                let _ = tx.try_send(event);
            }
        }
        if let Ok(mut guard) = self.events_tx.lock() {
            *guard = None;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
