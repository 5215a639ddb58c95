//! Configuration schema definitions.
//!
//! This module defines the structure of the configuration file using serde.
//! Defaults reproduce the line settings and timings voice modems are
//! commonly deployed with; a daemon started with no config file at all is
//! fully functional.

use super::error::{ConfigError, ConfigResult};
use crate::modem::PlaybackSettings;
use crate::port::{DataBits, FlowControl, Parity, PortConfiguration, StopBits};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial line parameters
    pub serial: SerialConfig,
    /// Auto-answer policy
    pub answer: AnswerConfig,
    /// Announcement playback
    pub audio: AudioConfig,
    /// Call record file
    pub call_log: CallLogConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            serial: SerialConfig::default(),
            answer: AnswerConfig::default(),
            audio: AudioConfig::default(),
            call_log: CallLogConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Reject values the daemon cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.serial.baud == 0 {
            return Err(ConfigError::validation("serial.baud", "must be non-zero"));
        }
        if self.serial.timeout_ms == 0 {
            return Err(ConfigError::validation(
                "serial.timeout_ms",
                "must be non-zero",
            ));
        }
        if self.answer.rings == 0 {
            return Err(ConfigError::validation(
                "answer.rings",
                "must answer after at least one ring",
            ));
        }
        if self.audio.chunk_frames == 0 {
            return Err(ConfigError::validation(
                "audio.chunk_frames",
                "must be non-zero",
            ));
        }
        Ok(())
    }
}

/// Serial line configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device path the modem is attached to
    pub port: String,
    /// Baud rate
    pub baud: u32,
    /// Data bits per character
    pub data_bits: DataBits,
    /// Parity checking
    pub parity: Parity,
    /// Stop bits
    pub stop_bits: StopBits,
    /// Flow control
    pub flow_control: FlowControl,
    /// Read/write timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".to_string(),
            baud: 57_600,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
            timeout_ms: 3000,
        }
    }
}

impl SerialConfig {
    /// Get the I/O timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Assemble the port layer's configuration.
    pub fn port_configuration(&self) -> PortConfiguration {
        PortConfiguration {
            baud_rate: self.baud,
            data_bits: self.data_bits,
            flow_control: self.flow_control,
            parity: self.parity,
            stop_bits: self.stop_bits,
            timeout: self.timeout(),
        }
    }
}

/// Auto-answer configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerConfig {
    /// Rings before auto-answer
    pub rings: u32,
    /// Silence after which a partial ring count is discarded, in
    /// milliseconds. Ring cadence is 5-6 s; longer silence means the
    /// caller gave up.
    pub ring_silence_reset_ms: u64,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            rings: 2,
            ring_silence_reset_ms: 8000,
        }
    }
}

impl AnswerConfig {
    /// Get the ring staleness window as Duration
    pub fn ring_silence_reset(&self) -> Duration {
        Duration::from_millis(self.ring_silence_reset_ms)
    }
}

/// Announcement playback configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// WAV file streamed to callers (8-bit mono PCM at 8000 Hz)
    pub file: PathBuf,
    /// Samples per write to the voice channel
    pub chunk_frames: usize,
    /// Pause between chunk writes in milliseconds
    pub inter_chunk_delay_ms: u64,
    /// Pause after the voice channel connects, in milliseconds
    pub settle_delay_ms: u64,
    /// How long to wait for the modem's OK after the stream terminator
    pub drain_timeout_secs: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("sample.wav"),
            chunk_frames: 1024,
            inter_chunk_delay_ms: 120,
            settle_delay_ms: 1000,
            drain_timeout_secs: 120,
        }
    }
}

impl AudioConfig {
    /// Assemble playback pacing for the modem layer.
    pub fn playback_settings(&self) -> PlaybackSettings {
        PlaybackSettings {
            chunk_frames: self.chunk_frames,
            inter_chunk_delay: Duration::from_millis(self.inter_chunk_delay_ms),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            drain_timeout: Duration::from_secs(self.drain_timeout_secs),
        }
    }
}

/// Call log configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CallLogConfig {
    /// JSON-lines file answered calls are appended to (disabled if unset)
    pub file: Option<PathBuf>,
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Log format: "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Pretty format with colors
    Pretty,
    /// Compact format
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        Self::Pretty
    }
}
