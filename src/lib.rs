//! dictamerge - Real-time dictation merging for text buffers
//!
//! Turns interim and final speech-recognizer transcripts into clean,
//! cursor-aware edits of a host text buffer, over a streaming socket or a
//! batch upload.

// Library code propagates errors, it never panics.
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
pub mod buffer;
pub mod channel;
pub mod config;
pub mod defaults;
pub mod error;
pub mod merge;
pub mod normalize;
pub mod session;

// Core traits (capture → channel → merge → buffer)
pub use audio::AudioSource;
pub use buffer::{InMemoryBuffer, Mutation, SharedBuffer, TextBuffer, shared};
pub use channel::{
    AudioChunk, BatchChannel, ChannelEvent, ChannelMode, StreamingChannel, TranscriptEvent,
    TranscriptionChannel,
};
pub use merge::SegmentMerger;

// Session orchestration
pub use session::{RecordingSession, SessionConfig, SessionStatus};

// Error handling
pub use error::{DictamergeError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
