//! Audio capture: the device trait, the CPAL implementation, and WAV
//! encoding for the batch payload.

#[cfg(feature = "cpal-audio")]
pub mod capture;
pub mod source;
pub mod wav;

#[cfg(feature = "cpal-audio")]
pub use capture::{CpalAudioSource, list_devices};
pub use source::{AudioSource, MockAudioSource};
