//! Default configuration constants for dictamerge.
//!
//! This module provides shared constants used across different configuration types
//! to ensure consistency and eliminate duplication.

/// Default audio sample rate in Hz.
///
/// 16kHz is the standard for speech recognition and provides a good balance
/// between quality and computational efficiency for voice applications.
pub const SAMPLE_RATE: u32 = 16000;

/// Number of capture channels. Recognition services expect mono input.
pub const CHANNELS: u16 = 1;

/// Default audio chunk cadence in milliseconds.
///
/// Captured samples are drained and forwarded to the transcription channel
/// on this interval. 250ms keeps streaming latency low without flooding the
/// socket with tiny frames.
pub const CHUNK_INTERVAL_MS: u64 = 250;

/// Grace period in milliseconds after stop() in batch mode.
///
/// One bounded wait that lets in-flight capture callbacks deliver their
/// trailing samples before the recording is sealed and uploaded. The only
/// deliberate delay in the whole stop path.
pub const BATCH_GRACE_MS: u64 = 100;

/// Default streaming recognizer endpoint.
pub const STREAMING_URL: &str = "ws://127.0.0.1:8765/stream";

/// Default batch recognizer endpoint.
pub const BATCH_URL: &str = "http://127.0.0.1:8765/transcribe";

/// Multipart field name the batch recognizer expects the audio under.
pub const BATCH_AUDIO_FIELD: &str = "audio";

/// File name attached to the uploaded batch audio part.
pub const BATCH_AUDIO_FILENAME: &str = "recording.wav";

/// Capacity of the channel event queue between a transcription channel and
/// the session loop.
///
/// Recognizer events are small and consumed promptly; 64 absorbs bursts
/// without unbounded growth.
pub const EVENT_QUEUE_CAPACITY: usize = 64;

/// Punctuation that must never be preceded by a space.
pub const CLOSING_PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':'];

/// Sentence-ending punctuation that forces capitalization of what follows.
pub const SENTENCE_ENDINGS: &[char] = &['.', '!', '?'];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_cadence_divides_a_second_evenly() {
        assert_eq!(1000 % CHUNK_INTERVAL_MS, 0);
    }

    #[test]
    fn sentence_endings_are_closing_punctuation() {
        for c in SENTENCE_ENDINGS {
            assert!(CLOSING_PUNCTUATION.contains(c));
        }
    }

    #[test]
    fn grace_is_shorter_than_chunk_cadence() {
        assert!(BATCH_GRACE_MS < CHUNK_INTERVAL_MS);
    }
}
