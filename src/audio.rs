//! Announcement audio loading.
//!
//! The modem is configured for 8-bit linear samples at 8000 Hz
//! (`AT+VSM=128,8000`), so that is the only WAV format accepted. The file is
//! validated and decoded once at startup, before the port is opened.

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Sample rate the voice channel is configured for.
pub const MODEM_SAMPLE_RATE: u32 = 8000;

/// Errors loading or validating the announcement file.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("failed to read audio file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    #[error("announcement must be mono, file has {0} channels")]
    UnsupportedChannels(u16),

    #[error("announcement must be {MODEM_SAMPLE_RATE} Hz, file is {0} Hz")]
    UnsupportedSampleRate(u32),

    #[error("announcement must be 8-bit PCM, file is {0}-bit")]
    UnsupportedBitDepth(u16),

    #[error("announcement must be integer PCM, file is float")]
    UnsupportedSampleFormat,

    #[error("announcement contains no samples")]
    Empty,
}

/// The decoded announcement: raw unsigned 8-bit samples ready for the wire.
///
/// WAV stores 8-bit audio unsigned but `hound` normalizes to signed; samples
/// are shifted back here because the modem consumes the unsigned encoding.
#[derive(Debug, Clone)]
pub struct Announcement {
    samples: Vec<u8>,
    sample_rate: u32,
}

impl Announcement {
    /// Load and validate a WAV announcement.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AudioError> {
        let path = path.as_ref();
        let mut reader = hound::WavReader::open(path).map_err(|source| AudioError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let spec = reader.spec();
        if spec.channels != 1 {
            return Err(AudioError::UnsupportedChannels(spec.channels));
        }
        if spec.sample_rate != MODEM_SAMPLE_RATE {
            return Err(AudioError::UnsupportedSampleRate(spec.sample_rate));
        }
        if spec.sample_format != hound::SampleFormat::Int {
            return Err(AudioError::UnsupportedSampleFormat);
        }
        if spec.bits_per_sample != 8 {
            return Err(AudioError::UnsupportedBitDepth(spec.bits_per_sample));
        }

        let samples = reader
            .samples::<i8>()
            .map(|s| s.map(|v| (v as i16 + 128) as u8))
            .collect::<Result<Vec<u8>, hound::Error>>()
            .map_err(|source| AudioError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        Self::from_raw(samples)
    }

    /// Build an announcement from raw unsigned 8-bit samples at the modem
    /// rate. Used by tests and by callers that synthesize audio.
    pub fn from_raw(samples: Vec<u8>) -> Result<Self, AudioError> {
        if samples.is_empty() {
            return Err(AudioError::Empty);
        }
        Ok(Self {
            samples,
            sample_rate: MODEM_SAMPLE_RATE,
        })
    }

    /// Number of samples (one byte each).
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Playback duration at the modem sample rate.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }

    /// The sample stream as fixed-size chunks for paced streaming. The last
    /// chunk may be short.
    pub fn chunks(&self, frames: usize) -> std::slice::Chunks<'_, u8> {
        self.samples.chunks(frames.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(spec: hound::WavSpec, samples: &[i8]) -> tempfile::TempPath {
        let file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
        let path = file.into_temp_path();
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        path
    }

    fn modem_spec() -> hound::WavSpec {
        hound::WavSpec {
            channels: 1,
            sample_rate: MODEM_SAMPLE_RATE,
            bits_per_sample: 8,
            sample_format: hound::SampleFormat::Int,
        }
    }

    #[test]
    fn test_load_valid_announcement() {
        let path = write_wav(modem_spec(), &[-128, 0, 127]);
        let announcement = Announcement::load(&path).unwrap();
        assert_eq!(announcement.len(), 3);
        // Signed samples shifted back to the unsigned wire encoding.
        assert_eq!(
            announcement.chunks(8).next().unwrap(),
            &[0u8, 128, 255][..]
        );
    }

    #[test]
    fn test_duration() {
        let samples = vec![0i8; MODEM_SAMPLE_RATE as usize];
        let path = write_wav(modem_spec(), &samples);
        let announcement = Announcement::load(&path).unwrap();
        assert_eq!(announcement.duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_chunking() {
        let announcement = Announcement::from_raw(vec![0u8; 2500]).unwrap();
        let chunks: Vec<&[u8]> = announcement.chunks(1024).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 1024);
        assert_eq!(chunks[2].len(), 452);
    }

    #[test]
    fn test_zero_chunk_size_clamped() {
        let announcement = Announcement::from_raw(vec![0u8; 4]).unwrap();
        assert_eq!(announcement.chunks(0).count(), 4);
    }

    #[test]
    fn test_rejects_wrong_sample_rate() {
        let spec = hound::WavSpec {
            sample_rate: 44_100,
            ..modem_spec()
        };
        let path = write_wav(spec, &[0, 1, 2]);
        assert!(matches!(
            Announcement::load(&path),
            Err(AudioError::UnsupportedSampleRate(44_100))
        ));
    }

    #[test]
    fn test_rejects_stereo() {
        let spec = hound::WavSpec {
            channels: 2,
            ..modem_spec()
        };
        let path = write_wav(spec, &[0, 1, 2, 3]);
        assert!(matches!(
            Announcement::load(&path),
            Err(AudioError::UnsupportedChannels(2))
        ));
    }

    #[test]
    fn test_rejects_16_bit() {
        let spec = hound::WavSpec {
            bits_per_sample: 16,
            ..modem_spec()
        };
        let file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
        let path = file.into_temp_path();
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        writer.write_sample(0i16).unwrap();
        writer.finalize().unwrap();

        assert!(matches!(
            Announcement::load(&path),
            Err(AudioError::UnsupportedBitDepth(16))
        ));
    }

    #[test]
    fn test_rejects_missing_file() {
        assert!(matches!(
            Announcement::load("/nonexistent/sample.wav"),
            Err(AudioError::Read { .. })
        ));
    }

    #[test]
    fn test_rejects_empty() {
        assert!(matches!(
            Announcement::from_raw(Vec::new()),
            Err(AudioError::Empty)
        ));
    }
}
