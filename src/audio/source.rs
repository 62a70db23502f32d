use std::sync::{Arc, Mutex};

use crate::error::{DictamergeError, Result};

/// Trait for audio capture devices.
///
/// This trait allows swapping implementations (real audio device vs mock).
pub trait AudioSource: Send + Sync {
    /// Start capturing audio from the device.
    fn start(&mut self) -> Result<()>;

    /// Stop capturing and release the device.
    fn stop(&mut self) -> Result<()>;

    /// Drain the samples captured since the previous read.
    ///
    /// Returns 16-bit PCM mono samples. An empty vector means nothing was
    /// captured in the interval, which is normal between callbacks.
    fn read_samples(&mut self) -> Result<Vec<i16>>;
}

/// Mock audio source for testing.
///
/// Clones share the started flag and read counter, so a test can hand one
/// copy to a session and watch device state through the other.
#[derive(Debug, Clone)]
pub struct MockAudioSource {
    started: Arc<Mutex<bool>>,
    reads: Arc<Mutex<u64>>,
    samples: Vec<i16>,
    should_fail_start: bool,
    should_fail_stop: bool,
    should_fail_read: bool,
    error_message: String,
}

impl MockAudioSource {
    /// Create a new mock audio source with default settings
    pub fn new() -> Self {
        Self {
            started: Arc::new(Mutex::new(false)),
            reads: Arc::new(Mutex::new(0)),
            samples: vec![0i16; 160],
            should_fail_start: false,
            should_fail_stop: false,
            should_fail_read: false,
            error_message: "mock audio error".to_string(),
        }
    }

    /// Configure the mock to return specific samples on every read
    pub fn with_samples(mut self, samples: Vec<i16>) -> Self {
        self.samples = samples;
        self
    }

    /// Configure the mock to fail on start
    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }

    /// Configure the mock to fail on stop
    pub fn with_stop_failure(mut self) -> Self {
        self.should_fail_stop = true;
        self
    }

    /// Configure the mock to fail on read
    pub fn with_read_failure(mut self) -> Self {
        self.should_fail_read = true;
        self
    }

    /// Configure the error message for failures
    pub fn with_error_message(mut self, message: &str) -> Self {
        self.error_message = message.to_string();
        self
    }

    /// Check if the audio source is started
    pub fn is_started(&self) -> bool {
        self.started.lock().map(|s| *s).unwrap_or(false)
    }

    /// Number of read_samples calls so far
    pub fn read_count(&self) -> u64 {
        self.reads.lock().map(|r| *r).unwrap_or(0)
    }
}

impl Default for MockAudioSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSource for MockAudioSource {
    fn start(&mut self) -> Result<()> {
        if self.should_fail_start {
            Err(DictamergeError::AudioCapture {
                message: self.error_message.clone(),
            })
        } else {
            if let Ok(mut started) = self.started.lock() {
                *started = true;
            }
            Ok(())
        }
    }

    fn stop(&mut self) -> Result<()> {
        if self.should_fail_stop {
            Err(DictamergeError::AudioCapture {
                message: self.error_message.clone(),
            })
        } else {
            if let Ok(mut started) = self.started.lock() {
                *started = false;
            }
            Ok(())
        }
    }

    fn read_samples(&mut self) -> Result<Vec<i16>> {
        if let Ok(mut reads) = self.reads.lock() {
            *reads += 1;
        }
        if self.should_fail_read {
            Err(DictamergeError::AudioCapture {
                message: self.error_message.clone(),
            })
        } else {
            Ok(self.samples.clone())
        }
    }
}
