//! Error types for dictamerge.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DictamergeError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Audio device errors: these fail start() before any network resource
    // is allocated, so the session acquires no partial state.
    #[error("Audio device not found: {device}")]
    AudioDeviceNotFound { device: String },

    #[error("Audio encoding unsupported: {message}")]
    AudioUnsupported { message: String },

    #[error("Audio capture failed: {message}")]
    AudioCapture { message: String },

    // Transcription channel errors: the session stops but all text merged
    // so far stays in the buffer.
    #[error("Channel connection failed: {message}")]
    ChannelConnect { message: String },

    #[error("Channel closed unexpectedly: {message}")]
    ChannelClosed { message: String },

    #[error("Channel send failed: {message}")]
    ChannelSend { message: String },

    // Batch processing errors: the upload failed or was rejected, and the
    // buffer is left untouched.
    #[error("Batch upload failed: {message}")]
    BatchUpload { message: String },

    #[error("Batch transcription rejected: {detail}")]
    BatchRejected { detail: String },

    // Buffer mutation errors
    #[error("Mutation range {start}..{end} out of bounds for buffer of length {len}")]
    BufferRange { start: usize, end: usize, len: usize },

    // Session lifecycle errors
    #[error("Invalid session state: {message}")]
    SessionState { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, DictamergeError>;
