//! Recording session orchestration.
//!
//! One [`RecordingSession`] owns the audio device and the transcription
//! channel, runs a single event loop over capture ticks and channel events,
//! and lands merged text in the host buffer. start/stop/toggle are the
//! whole surface a host UI needs.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

use crate::audio::AudioSource;
#[cfg(feature = "cpal-audio")]
use crate::audio::CpalAudioSource;
use crate::buffer::{SharedBuffer, append_to_end, apply_mutation};
use crate::channel::{
    AudioChunk, BatchChannel, ChannelEvent, ChannelMode, StreamingChannel, TranscriptEvent,
    TranscriptionChannel,
};
use crate::config::Config;
use crate::defaults;
use crate::error::{DictamergeError, Result};
use crate::merge::SegmentMerger;

/// Longest the shutdown path waits for the channel to deliver its remaining
/// events after stop.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Lifecycle state of a [`RecordingSession`], published through a watch
/// channel so host UIs can render it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Connecting,
    Recording,
    /// Batch mode only: the recording is uploaded and awaiting a transcript.
    Processing,
    Error,
}

/// Runtime knobs for a session, usually derived from [`Config`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Which delivery mode the channel uses.
    pub mode: ChannelMode,
    /// Cadence at which captured samples are drained and forwarded.
    pub chunk_interval: Duration,
    /// Bounded wait after a batch stop for in-flight capture to land.
    pub batch_grace: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: ChannelMode::Streaming,
            chunk_interval: Duration::from_millis(defaults::CHUNK_INTERVAL_MS),
            batch_grace: Duration::from_millis(defaults::BATCH_GRACE_MS),
        }
    }
}

impl SessionConfig {
    /// Builds session settings from the loaded application config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            mode: config.channel.mode,
            chunk_interval: Duration::from_millis(config.channel.chunk_interval_ms),
            batch_grace: Duration::from_millis(config.channel.batch_grace_ms),
        }
    }
}

/// Builds the configured channel implementation.
pub fn channel_from_config(config: &Config) -> Box<dyn TranscriptionChannel> {
    match config.channel.mode {
        ChannelMode::Streaming => {
            Box::new(StreamingChannel::new(config.server.streaming_url.clone()))
        }
        ChannelMode::Batch => Box::new(
            BatchChannel::new(config.server.batch_url.clone())
                .with_sample_rate(config.audio.sample_rate),
        ),
    }
}

/// Control messages from the session handle into the run loop.
enum Control {
    Stop,
}

/// Why the run loop left its select loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    /// The handle asked for an orderly stop.
    Stopped,
    /// A device read or channel transport failure.
    Failed,
    /// The channel closed on its own.
    Closed,
}

/// Handle to the spawned loop of a running session.
struct RunningSession {
    control_tx: mpsc::Sender<Control>,
    task: JoinHandle<(Box<dyn AudioSource>, Box<dyn TranscriptionChannel>)>,
}

/// Drives one dictation session at a time.
///
/// The device and channel are owned exclusively: while a session runs they
/// live inside the spawned loop, and they are handed back when it exits so
/// the next start can reuse them. Dropping the handle mid-session closes
/// the control channel, which the loop treats as a stop.
pub struct RecordingSession {
    config: SessionConfig,
    buffer: SharedBuffer,
    source: Option<Box<dyn AudioSource>>,
    channel: Option<Box<dyn TranscriptionChannel>>,
    status_tx: watch::Sender<SessionStatus>,
    status_rx: watch::Receiver<SessionStatus>,
    last_error: Arc<Mutex<Option<String>>>,
    running: Option<RunningSession>,
}

impl RecordingSession {
    /// Creates a session over an audio source and a channel.
    ///
    /// The buffer handle is shared with the host UI; the session only locks
    /// it for individual reads and mutations.
    pub fn new(
        config: SessionConfig,
        buffer: SharedBuffer,
        source: Box<dyn AudioSource>,
        channel: Box<dyn TranscriptionChannel>,
    ) -> Self {
        let (status_tx, status_rx) = watch::channel(SessionStatus::Idle);
        Self {
            config,
            buffer,
            source: Some(source),
            channel: Some(channel),
            status_tx,
            status_rx,
            last_error: Arc::new(Mutex::new(None)),
            running: None,
        }
    }

    /// Creates a session wired from config: the cpal input device plus the
    /// configured channel mode.
    #[cfg(feature = "cpal-audio")]
    pub fn from_config(config: &Config, buffer: SharedBuffer) -> Result<Self> {
        let source = CpalAudioSource::new(config.audio.device.as_deref())?
            .with_sample_rate(config.audio.sample_rate);
        let channel = channel_from_config(config);
        Ok(Self::new(
            SessionConfig::from_config(config),
            buffer,
            Box::new(source),
            channel,
        ))
    }

    /// Starts dictation.
    ///
    /// The device is acquired before any network resource, so a capture
    /// failure leaves nothing to clean up. A channel failure releases the
    /// device again. On success the run loop is spawned and the status is
    /// `Recording`.
    pub async fn start(&mut self) -> Result<()> {
        if let Some(running) = self.running.take() {
            if !running.task.is_finished() {
                self.running = Some(running);
                return Err(DictamergeError::SessionState {
                    message: "session already running".to_string(),
                });
            }
            // The loop exited on its own (channel closed or failed);
            // reclaim the device and channel so this start can reuse them.
            match running.task.await {
                Ok((source, channel)) => {
                    self.source = Some(source);
                    self.channel = Some(channel);
                }
                Err(e) => {
                    return Err(DictamergeError::SessionState {
                        message: format!("previous session task panicked: {e}"),
                    });
                }
            }
        }

        let (mut source, mut channel) = match (self.source.take(), self.channel.take()) {
            (Some(source), Some(channel)) => (source, channel),
            (source, channel) => {
                self.source = source;
                self.channel = channel;
                return Err(DictamergeError::SessionState {
                    message: "session components unavailable".to_string(),
                });
            }
        };

        self.clear_error();

        if let Err(e) = source.start() {
            self.source = Some(source);
            self.channel = Some(channel);
            self.fail_start(&e);
            return Err(e);
        }

        self.set_status(SessionStatus::Connecting);
        let events = match channel.start().await {
            Ok(events) => events,
            Err(e) => {
                if let Err(stop_err) = source.stop() {
                    warn!(error = %stop_err, "audio source stop failed");
                }
                self.source = Some(source);
                self.channel = Some(channel);
                self.fail_start(&e);
                return Err(e);
            }
        };
        self.set_status(SessionStatus::Recording);

        let (control_tx, control_rx) = mpsc::channel(1);
        let run = RunLoop {
            config: self.config.clone(),
            buffer: Arc::clone(&self.buffer),
            source,
            channel,
            merger: SegmentMerger::new(),
            sequence: 0,
            status_tx: self.status_tx.clone(),
            last_error: Arc::clone(&self.last_error),
        };
        let task = tokio::spawn(run.run(events, control_rx));
        self.running = Some(RunningSession { control_tx, task });
        Ok(())
    }

    /// Stops dictation and waits for the loop to wind down.
    ///
    /// Idempotent: calling it while idle is a no-op. The shutdown releases
    /// the device and closes the channel on every path, and a pending
    /// interim segment is finalized before this returns.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };
        if running.control_tx.send(Control::Stop).await.is_err() {
            debug!("run loop already exited before stop");
        }
        match running.task.await {
            Ok((source, channel)) => {
                self.source = Some(source);
                self.channel = Some(channel);
                Ok(())
            }
            Err(e) => Err(DictamergeError::SessionState {
                message: format!("session task panicked: {e}"),
            }),
        }
    }

    /// Stops if running, starts otherwise.
    pub async fn toggle(&mut self) -> Result<()> {
        if self.is_running() {
            self.stop().await
        } else {
            self.start().await
        }
    }

    /// Whether the run loop is currently alive.
    pub fn is_running(&self) -> bool {
        self.running.as_ref().is_some_and(|r| !r.task.is_finished())
    }

    /// Current status snapshot.
    pub fn status(&self) -> SessionStatus {
        *self.status_rx.borrow()
    }

    /// Watch receiver for status transitions, for host UI updates.
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status_rx.clone()
    }

    /// The message behind an `Error` status, if any.
    pub fn last_error(&self) -> Option<String> {
        let slot = self.last_error.lock().ok()?;
        (*slot).clone()
    }

    /// The delivery mode this session drives.
    pub fn mode(&self) -> ChannelMode {
        self.config.mode
    }

    fn set_status(&self, status: SessionStatus) {
        debug!(status = ?status, "session status");
        self.status_tx.send_replace(status);
    }

    fn clear_error(&self) {
        if let Ok(mut slot) = self.last_error.lock() {
            *slot = None;
        }
    }

    fn fail_start(&self, error: &DictamergeError) {
        warn!(error = %error, "session start failed");
        if let Ok(mut slot) = self.last_error.lock() {
            *slot = Some(error.to_string());
        }
        self.set_status(SessionStatus::Error);
    }
}

/// The spawned half of a running session.
///
/// Owns the device and the channel for the duration of the run and hands
/// both back on exit. All buffer mutation happens here, one event at a
/// time, which is what keeps merge ordering strict.
struct RunLoop {
    config: SessionConfig,
    buffer: SharedBuffer,
    source: Box<dyn AudioSource>,
    channel: Box<dyn TranscriptionChannel>,
    merger: SegmentMerger,
    sequence: u64,
    status_tx: watch::Sender<SessionStatus>,
    last_error: Arc<Mutex<Option<String>>>,
}

impl RunLoop {
    async fn run(
        mut self,
        mut events: mpsc::Receiver<ChannelEvent>,
        mut control: mpsc::Receiver<Control>,
    ) -> (Box<dyn AudioSource>, Box<dyn TranscriptionChannel>) {
        let mut ticker = time::interval(self.config.chunk_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; wait a full interval instead.
        ticker.tick().await;

        let exit = loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.forward_chunk().await {
                        self.record_error(&e.to_string());
                        break Exit::Failed;
                    }
                }
                event = events.recv() => {
                    match event {
                        Some(ChannelEvent::Transcript(transcript)) => {
                            self.merge_transcript(&transcript);
                        }
                        Some(ChannelEvent::Error(message)) => {
                            self.record_error(&message);
                            break Exit::Failed;
                        }
                        Some(ChannelEvent::Closed) | None => break Exit::Closed,
                    }
                }
                command = control.recv() => {
                    match command {
                        Some(Control::Stop) | None => break Exit::Stopped,
                    }
                }
            }
        };

        debug!(exit = ?exit, "run loop exiting");
        self.shutdown(exit, &mut events).await;

        (self.source, self.channel)
    }

    /// Drains captured samples and forwards them as one sequenced chunk.
    async fn forward_chunk(&mut self) -> Result<()> {
        let samples = self.source.read_samples()?;
        if samples.is_empty() {
            return Ok(());
        }
        let chunk = AudioChunk::from_samples(self.sequence, &samples);
        self.sequence += 1;
        self.channel.send_audio(chunk).await
    }

    /// Routes one transcript event through the merger into the buffer.
    fn merge_transcript(&mut self, event: &TranscriptEvent) {
        let Ok(mut buffer) = self.buffer.lock() else {
            warn!("buffer lock poisoned, dropping transcript event");
            return;
        };
        let Some(selection) = buffer.selection() else {
            // Degraded host without an addressable cursor: only finals
            // land, appended at the end of the buffer.
            if event.is_final {
                if let Err(e) = append_to_end(&mut *buffer, &event.text) {
                    warn!(error = %e, "append failed");
                }
            }
            return;
        };
        let value = buffer.value();
        if let Some(mutation) = self.merger.merge(&value, selection, event) {
            if let Err(e) = apply_mutation(&mut *buffer, &mutation) {
                warn!(error = %e, "mutation rejected, resetting segment state");
                self.merger.reset();
            }
        }
    }

    /// Winds the session down along the path the exit reason requires.
    ///
    /// The device is released on every path. The channel is stopped except
    /// after a failure in batch mode, where an upload of a broken recording
    /// would be discarded anyway. After a failure no further events are
    /// merged; otherwise the remaining events are drained within a bounded
    /// window and a still-pending interim is finalized.
    async fn shutdown(&mut self, exit: Exit, events: &mut mpsc::Receiver<ChannelEvent>) {
        if exit == Exit::Stopped && self.config.mode == ChannelMode::Batch {
            self.set_status(SessionStatus::Processing);
            // Let in-flight capture callbacks land before the final read.
            time::sleep(self.config.batch_grace).await;
            if let Err(e) = self.forward_chunk().await {
                warn!(error = %e, "final chunk forward failed");
            }
        }

        if let Err(e) = self.source.stop() {
            warn!(error = %e, "audio source stop failed");
        }

        let stop_channel = match exit {
            Exit::Stopped | Exit::Closed => true,
            Exit::Failed => self.config.mode == ChannelMode::Streaming,
        };
        if stop_channel {
            if let Err(e) = self.channel.stop().await {
                self.record_error(&e.to_string());
            }
        }

        if exit != Exit::Failed {
            self.drain_events(events).await;
            self.flush_pending();
        }

        let status = if self.has_error() {
            SessionStatus::Error
        } else {
            SessionStatus::Idle
        };
        self.set_status(status);
    }

    /// Consumes the events still queued after stop, merging transcripts in
    /// order, until the channel reports closed or the window elapses.
    async fn drain_events(&mut self, events: &mut mpsc::Receiver<ChannelEvent>) {
        let drained = time::timeout(DRAIN_TIMEOUT, async {
            while let Some(event) = events.recv().await {
                match event {
                    ChannelEvent::Transcript(transcript) => self.merge_transcript(&transcript),
                    ChannelEvent::Error(message) => self.record_error(&message),
                    ChannelEvent::Closed => break,
                }
            }
        })
        .await;
        if drained.is_err() {
            debug!("drain window elapsed before channel closed");
        }
    }

    /// Finalizes an interim segment the server never confirmed.
    fn flush_pending(&mut self) {
        if !self.merger.has_active_segment() {
            return;
        }
        let Ok(mut buffer) = self.buffer.lock() else {
            return;
        };
        let Some(selection) = buffer.selection() else {
            return;
        };
        let value = buffer.value();
        if let Some(mutation) = self.merger.flush(&value, selection) {
            if let Err(e) = apply_mutation(&mut *buffer, &mutation) {
                warn!(error = %e, "flush mutation rejected");
            }
        }
    }

    /// Records the first session-aborting error; later ones only log.
    fn record_error(&self, message: &str) {
        warn!(error = %message, "session error");
        if let Ok(mut slot) = self.last_error.lock() {
            if slot.is_none() {
                *slot = Some(message.to_string());
            }
        }
    }

    fn has_error(&self) -> bool {
        self.last_error.lock().map(|slot| slot.is_some()).unwrap_or(true)
    }

    fn set_status(&self, status: SessionStatus) {
        debug!(status = ?status, "session status");
        self.status_tx.send_replace(status);
    }
}
