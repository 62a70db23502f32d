//! WAV container encoding for the batch upload payload.

use std::io::Cursor;

use crate::defaults;
use crate::error::{DictamergeError, Result};

/// Wraps raw little-endian PCM16 mono audio in a WAV container.
///
/// The input is the byte stream the capture side produces (two bytes per
/// sample, little-endian). A trailing odd byte is dropped.
pub fn encode_pcm16(pcm: &[u8], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: defaults::CHANNELS,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| DictamergeError::AudioCapture {
                message: format!("Failed to create WAV writer: {}", e),
            })?;

        for sample in samples_from_le_bytes(pcm) {
            writer
                .write_sample(sample)
                .map_err(|e| DictamergeError::AudioCapture {
                    message: format!("Failed to write WAV sample: {}", e),
                })?;
        }

        writer
            .finalize()
            .map_err(|e| DictamergeError::AudioCapture {
                message: format!("Failed to finalize WAV: {}", e),
            })?;
    }

    Ok(cursor.into_inner())
}

/// Reinterprets little-endian PCM16 bytes as samples.
pub fn samples_from_le_bytes(pcm: &[u8]) -> impl Iterator<Item = i16> + '_ {
    pcm.chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(wav: &[u8]) -> (hound::WavSpec, Vec<i16>) {
        let mut reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
        let spec = reader.spec();
        let samples = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        (spec, samples)
    }

    fn pcm_bytes(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn test_encode_roundtrips_samples() {
        let samples = vec![0i16, 1000, -1000, i16::MAX, i16::MIN];
        let wav = encode_pcm16(&pcm_bytes(&samples), defaults::SAMPLE_RATE).unwrap();

        let (spec, decoded) = decode(&wav);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16000);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(decoded, samples);
    }

    #[test]
    fn test_encode_empty_pcm_is_valid_wav() {
        let wav = encode_pcm16(&[], defaults::SAMPLE_RATE).unwrap();
        let (_, decoded) = decode(&wav);
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_encode_drops_trailing_odd_byte() {
        let mut pcm = pcm_bytes(&[100, 200]);
        pcm.push(0xFF);

        let wav = encode_pcm16(&pcm, defaults::SAMPLE_RATE).unwrap();
        let (_, decoded) = decode(&wav);
        assert_eq!(decoded, vec![100, 200]);
    }

    #[test]
    fn test_samples_from_le_bytes() {
        let pcm = [0x01, 0x00, 0xFF, 0xFF];
        let samples: Vec<i16> = samples_from_le_bytes(&pcm).collect();
        assert_eq!(samples, vec![1, -1]);
    }

    #[test]
    fn test_encode_respects_sample_rate() {
        let wav = encode_pcm16(&pcm_bytes(&[1, 2, 3]), 8000).unwrap();
        let (spec, _) = decode(&wav);
        assert_eq!(spec.sample_rate, 8000);
    }
}
