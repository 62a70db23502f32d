//! Event types flowing between a transcription channel and the session.

/// A captured slice of audio ready for transmission.
///
/// The payload is opaque little-endian 16-bit PCM. Ephemeral: a streaming
/// channel transmits and drops it, a batch channel accumulates it until
/// upload.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Raw PCM bytes.
    pub data: Vec<u8>,
    /// Capture order, starting at 0 for the first chunk of a session.
    pub sequence: u64,
}

impl AudioChunk {
    /// Creates a chunk from raw PCM bytes.
    pub fn new(sequence: u64, data: Vec<u8>) -> Self {
        Self { data, sequence }
    }

    /// Packs 16-bit samples into a little-endian chunk payload.
    pub fn from_samples(sequence: u64, samples: &[i16]) -> Self {
        let data = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        Self { data, sequence }
    }

    /// Returns the duration of this chunk in milliseconds.
    pub fn duration_ms(&self, sample_rate: u32) -> u32 {
        let samples = (self.data.len() / 2) as u32;
        (samples * 1000) / sample_rate
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// One recognizer result for the current segment.
///
/// In streaming mode `text` is cumulative: it always carries the full
/// segment from its start, superseding every earlier event for the segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEvent {
    pub text: String,
    pub is_final: bool,
}

impl TranscriptEvent {
    pub fn new(text: impl Into<String>, is_final: bool) -> Self {
        Self {
            text: text.into(),
            is_final,
        }
    }
}

/// Everything a transcription channel can report to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// A transcript arrived (interim or final).
    Transcript(TranscriptEvent),
    /// The channel failed; the session stops but keeps merged text.
    Error(String),
    /// The channel finished cleanly.
    Closed,
}

impl ChannelEvent {
    /// Returns true if this is a transcript event.
    pub fn is_transcript(&self) -> bool {
        matches!(self, ChannelEvent::Transcript(_))
    }

    /// Returns true if this is an error event.
    pub fn is_error(&self) -> bool {
        matches!(self, ChannelEvent::Error(_))
    }

    /// Extracts the transcript if this is a Transcript variant.
    pub fn into_transcript(self) -> Option<TranscriptEvent> {
        match self {
            ChannelEvent::Transcript(t) => Some(t),
            _ => None,
        }
    }
}
