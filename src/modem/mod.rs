//! Modem command/response state machine.
//!
//! [`Modem`] owns the serial port exclusively. Command exchanges and idle
//! line reading therefore cannot interleave: there is no listener thread to
//! gate and no shared flag to race on.

pub mod caller_id;
pub mod command;
pub mod line;
pub mod response;

pub use caller_id::{CallerId, CidField, CidTag};
pub use command::{Accept, AtCommand};
pub use line::LineBuffer;
pub use response::{classify, ModemLine};

use crate::audio::Announcement;
use crate::port::{PortError, SerialPortAdapter};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

/// Errors from modem command exchanges.
#[derive(Debug, Error)]
pub enum ModemError {
    /// The modem answered, but not with the expected keyword, or stayed
    /// silent past the line timeout.
    #[error("modem rejected command '{command}' (response: {response:?})")]
    CommandFailed { command: String, response: String },

    /// The serial link itself failed.
    #[error(transparent)]
    Port(#[from] PortError),
}

/// Pacing parameters for streaming the announcement.
#[derive(Debug, Clone)]
pub struct PlaybackSettings {
    /// Samples per write to the voice channel.
    pub chunk_frames: usize,
    /// Pause between chunk writes. At 8000 Hz a 1024-frame chunk carries
    /// 128 ms of audio; pacing slightly under that keeps the modem's
    /// transmit buffer fed without overrunning it.
    pub inter_chunk_delay: Duration,
    /// Pause after `AT+VTX` connects, before the first sample.
    pub settle_delay: Duration,
    /// How long to wait for the modem's `OK` after the stream terminator.
    pub drain_timeout: Duration,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            chunk_frames: 1024,
            inter_chunk_delay: Duration::from_millis(120),
            settle_delay: Duration::from_secs(1),
            drain_timeout: Duration::from_secs(120),
        }
    }
}

/// The modem state machine, generic over the serial transport.
#[derive(Debug)]
pub struct Modem<P: SerialPortAdapter> {
    port: P,
    lines: LineBuffer,
}

impl<P: SerialPortAdapter> Modem<P> {
    pub fn new(port: P) -> Self {
        Self {
            port,
            lines: LineBuffer::new(),
        }
    }

    /// The underlying port, for identification and tests.
    pub fn port(&self) -> &P {
        &self.port
    }

    /// Consume the modem and recover the port.
    pub fn into_port(self) -> P {
        self.port
    }

    /// Run the startup sequence that puts the modem into a known command
    /// state: flush stale chatter, then `AT`, `ATZ3`, `ATV1`, `ATE1`,
    /// `AT+VCID=1`, each of which must be accepted.
    pub fn initialize(&mut self) -> Result<(), ModemError> {
        info!(port = self.port.name(), "initializing modem");
        self.port.clear_buffers()?;
        for cmd in command::INIT_SEQUENCE {
            self.command(cmd)?;
        }
        Ok(())
    }

    /// Execute one AT exchange: write the command with its trailing CR,
    /// gather up to two response lines (echo plus result, since echo is
    /// on), and check the acceptance keyword.
    pub fn command(&mut self, cmd: AtCommand) -> Result<String, ModemError> {
        debug!(command = cmd.command, "sending AT command");

        let mut wire = Vec::with_capacity(cmd.command.len() + 1);
        wire.extend_from_slice(cmd.command.as_bytes());
        wire.push(b'\r');
        self.write_all(&wire)?;

        let mut response = String::new();
        for _ in 0..2 {
            if let Some(line) = self.read_line()? {
                if !response.is_empty() {
                    response.push('\n');
                }
                response.push_str(&line);
            }
        }
        trace!(command = cmd.command, %response, "modem response");

        if cmd.matches(&response) {
            Ok(response)
        } else {
            Err(ModemError::CommandFailed {
                command: cmd.command.to_string(),
                response,
            })
        }
    }

    /// Read one line of modem output, bounded by the port's read timeout.
    ///
    /// `Ok(None)` means the line was silent for a full timeout interval,
    /// the idle state while waiting for a call, never an error.
    pub fn read_line(&mut self) -> Result<Option<String>, ModemError> {
        loop {
            if let Some(line) = self.lines.pop_line() {
                return Ok(Some(line));
            }
            let mut chunk = [0u8; 256];
            match self.port.read_bytes(&mut chunk) {
                Ok(0) => return Ok(None),
                Ok(n) => self.lines.push(&chunk[..n]),
                Err(e) if e.is_timeout() => return Ok(None),
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Drain modem output until a line containing `keyword` arrives or the
    /// deadline passes. Returns whether the keyword was seen.
    pub fn wait_for(&mut self, keyword: &str, timeout: Duration) -> Result<bool, ModemError> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Some(line) = self.read_line()? {
                trace!(%line, "draining modem output");
                if line.contains(keyword) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Answer the line and stream the announcement to the caller.
    ///
    /// Sequence: voice class, sampling format, line select, `AT+VTX`
    /// (accepting `CONNECT`), a settle pause, the paced sample chunks, the
    /// DLE/ETX terminator, a bounded wait for `OK`, then hang up. A missing
    /// final `OK` is logged and tolerated; a rejected AT step is returned
    /// as the error.
    pub fn play_announcement(
        &mut self,
        announcement: &Announcement,
        settings: &PlaybackSettings,
    ) -> Result<(), ModemError> {
        info!(
            duration_ms = announcement.duration().as_millis() as u64,
            "playing announcement"
        );

        for cmd in command::VOICE_SETUP {
            self.command(cmd)?;
        }

        std::thread::sleep(settings.settle_delay);

        for chunk in announcement.chunks(settings.chunk_frames) {
            self.write_all(chunk)?;
            std::thread::sleep(settings.inter_chunk_delay);
        }

        self.write_all(&command::DLE_ETX)?;
        if !self.wait_for("OK", settings.drain_timeout)? {
            warn!("modem did not acknowledge end of voice stream");
        }

        self.hang_up()
    }

    /// Go on-hook.
    pub fn hang_up(&mut self) -> Result<(), ModemError> {
        self.command(command::HANG_UP).map(|_| ())
    }

    fn write_all(&mut self, mut data: &[u8]) -> Result<(), ModemError> {
        while !data.is_empty() {
            let written = self.port.write_bytes(data)?;
            if written == 0 {
                return Err(PortError::Io(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "serial port accepted no bytes",
                ))
                .into());
            }
            data = &data[written..];
        }
        Ok(())
    }
}
