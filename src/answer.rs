//! Ring detection and auto-answer control loop.
//!
//! A single-threaded loop owns the modem: it polls for unsolicited output,
//! counts `RING` indications, collects caller ID tags, and answers once the
//! configured threshold is reached. Playback failures are logged and the
//! loop keeps listening; only a broken serial link ends the loop with an
//! error.

use crate::audio::Announcement;
use crate::call_log::{CallLog, CallOutcome, CallRecord};
use crate::error::AppError;
use crate::modem::{classify, CallerId, Modem, ModemLine, PlaybackSettings};
use crate::port::SerialPortAdapter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Auto-answer policy.
#[derive(Debug, Clone)]
pub struct AnswerSettings {
    /// Rings to count before answering.
    pub rings_before_answer: u32,
    /// A ring burst that goes silent for this long is a caller who gave
    /// up; the partial count is discarded. Ring cadence is 5-6 s.
    pub ring_silence_reset: Duration,
    /// Pacing for the announcement stream.
    pub playback: PlaybackSettings,
}

impl Default for AnswerSettings {
    fn default() -> Self {
        Self {
            rings_before_answer: 2,
            ring_silence_reset: Duration::from_secs(8),
            playback: PlaybackSettings::default(),
        }
    }
}

/// What one poll of the line produced. Exposed so tests can drive the loop
/// step by step instead of racing a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEvent {
    /// Nothing arrived within the read timeout.
    Idle,
    /// A ring was counted; threshold not yet reached.
    Ring { count: u32 },
    /// A stale ring burst was discarded.
    RingsExpired,
    /// A caller ID tag was folded into the pending record.
    CallerIdUpdate,
    /// The call was answered and playback attempted.
    CallAnswered { rings: u32, outcome: CallOutcome },
}

/// The answering machine: modem, announcement, policy, and per-call state.
pub struct AnswerMachine<P: SerialPortAdapter> {
    modem: Modem<P>,
    announcement: Announcement,
    settings: AnswerSettings,
    call_log: Option<CallLog>,
    shutdown: Arc<AtomicBool>,
    rings: u32,
    caller: CallerId,
    last_ring: Option<Instant>,
    calls_answered: u64,
}

impl<P: SerialPortAdapter> AnswerMachine<P> {
    pub fn new(
        modem: Modem<P>,
        announcement: Announcement,
        settings: AnswerSettings,
        call_log: Option<CallLog>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            modem,
            announcement,
            settings,
            call_log,
            shutdown,
            rings: 0,
            caller: CallerId::default(),
            last_ring: None,
            calls_answered: 0,
        }
    }

    /// Rings counted toward the current (unanswered) call.
    pub fn pending_rings(&self) -> u32 {
        self.rings
    }

    /// Caller ID collected for the current (unanswered) call.
    pub fn pending_caller(&self) -> &CallerId {
        &self.caller
    }

    /// Consume the machine and recover the modem.
    pub fn into_modem(self) -> Modem<P> {
        self.modem
    }

    /// Run until the shutdown flag is set, then hang up and return.
    pub fn run(mut self) -> Result<(), AppError> {
        info!(
            rings = self.settings.rings_before_answer,
            "listening for incoming calls"
        );
        while !self.shutdown.load(Ordering::Relaxed) {
            self.poll()?;
        }
        info!(calls = self.calls_answered, "shutting down; going on-hook");
        if let Err(e) = self.modem.hang_up() {
            warn!(error = %e, "final hangup failed");
        }
        Ok(())
    }

    /// Process at most one line of modem output.
    ///
    /// Bounded by the port's read timeout, so the run loop observes the
    /// shutdown flag at least once per timeout interval.
    pub fn poll(&mut self) -> Result<LoopEvent, AppError> {
        if self.rings > 0 {
            if let Some(last) = self.last_ring {
                if last.elapsed() >= self.settings.ring_silence_reset {
                    debug!(rings = self.rings, "ring burst went silent; caller gave up");
                    self.reset_call_state();
                    return Ok(LoopEvent::RingsExpired);
                }
            }
        }

        let line = match self.modem.read_line()? {
            Some(line) => line,
            None => return Ok(LoopEvent::Idle),
        };

        match classify(&line) {
            ModemLine::Ring => {
                self.rings += 1;
                self.last_ring = Some(Instant::now());
                info!(
                    count = self.rings,
                    threshold = self.settings.rings_before_answer,
                    "ring"
                );
                if self.rings >= self.settings.rings_before_answer {
                    self.answer()
                } else {
                    Ok(LoopEvent::Ring { count: self.rings })
                }
            }
            ModemLine::CallerId(tag) => {
                debug!(field = ?tag.field, value = %tag.value, "caller ID");
                self.caller.apply(tag);
                Ok(LoopEvent::CallerIdUpdate)
            }
            ModemLine::Empty => Ok(LoopEvent::Idle),
            other => {
                trace!(?other, "unsolicited modem output");
                Ok(LoopEvent::Idle)
            }
        }
    }

    fn answer(&mut self) -> Result<LoopEvent, AppError> {
        let rings = self.rings;
        let caller = std::mem::take(&mut self.caller);
        if caller.is_empty() {
            info!(rings, "answering call");
        } else {
            info!(rings, caller = %caller, "answering call");
        }

        let outcome = match self
            .modem
            .play_announcement(&self.announcement, &self.settings.playback)
        {
            Ok(()) => CallOutcome::Played,
            Err(e) => {
                warn!(error = %e, "announcement playback failed");
                if let Err(e) = self.modem.hang_up() {
                    warn!(error = %e, "hangup after failed playback also failed");
                }
                CallOutcome::Failed
            }
        };

        self.calls_answered += 1;
        let record = CallRecord::new(rings, (!caller.is_empty()).then_some(caller), outcome);
        if let Some(log) = &mut self.call_log {
            if let Err(e) = log.append(&record) {
                warn!(error = %e, "failed to append call record");
            }
        }

        self.reset_call_state();
        Ok(LoopEvent::CallAnswered { rings, outcome })
    }

    fn reset_call_state(&mut self) {
        self.rings = 0;
        self.last_ring = None;
        self.caller = CallerId::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::MockSerialPort;

    fn fast_settings() -> AnswerSettings {
        AnswerSettings {
            rings_before_answer: 2,
            ring_silence_reset: Duration::from_millis(40),
            playback: PlaybackSettings {
                chunk_frames: 8,
                inter_chunk_delay: Duration::ZERO,
                settle_delay: Duration::ZERO,
                drain_timeout: Duration::from_millis(5),
            },
        }
    }

    fn machine_with(
        script: impl FnOnce(&mut MockSerialPort),
    ) -> (AnswerMachine<MockSerialPort>, MockSerialPort) {
        let mut port = MockSerialPort::new("MOCK0");
        script(&mut port);
        let handle = port.clone();
        let machine = AnswerMachine::new(
            Modem::new(port),
            Announcement::from_raw(vec![0x80; 16]).unwrap(),
            fast_settings(),
            None,
            Arc::new(AtomicBool::new(false)),
        );
        (machine, handle)
    }

    #[test]
    fn test_idle_poll() {
        let (mut machine, _) = machine_with(|_| {});
        assert_eq!(machine.poll().unwrap(), LoopEvent::Idle);
        assert_eq!(machine.pending_rings(), 0);
    }

    #[test]
    fn test_first_ring_counts_without_answering() {
        let (mut machine, handle) = machine_with(|port| {
            port.enqueue_line("RING");
        });
        assert_eq!(machine.poll().unwrap(), LoopEvent::Ring { count: 1 });
        // No AT traffic: answering starts at the threshold, not before.
        assert!(handle.write_log().is_empty());
    }

    #[test]
    fn test_caller_id_collected_between_rings() {
        let (mut machine, _) = machine_with(|port| {
            port.enqueue_line("RING");
            port.enqueue_line("NMBR = 5550100");
        });
        machine.poll().unwrap();
        assert_eq!(machine.poll().unwrap(), LoopEvent::CallerIdUpdate);
        assert_eq!(
            machine.pending_caller().number.as_deref(),
            Some("5550100")
        );
    }

    #[test]
    fn test_stale_ring_burst_resets() {
        let (mut machine, _) = machine_with(|port| {
            port.enqueue_line("RING");
        });
        assert_eq!(machine.poll().unwrap(), LoopEvent::Ring { count: 1 });

        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(machine.poll().unwrap(), LoopEvent::RingsExpired);
        assert_eq!(machine.pending_rings(), 0);
    }

    #[test]
    fn test_second_ring_answers() {
        let (mut machine, handle) = machine_with(|port| {
            port.enqueue_line("RING");
            port.enqueue_line("RING");
            port.enqueue_exchange("AT+FCLASS=8", "OK");
            port.enqueue_exchange("AT+VSM=128,8000", "OK");
            port.enqueue_exchange("AT+VLS=1", "OK");
            port.enqueue_exchange("AT+VTX", "CONNECT");
            port.enqueue_line("OK"); // stream drain acknowledgment
            port.enqueue_exchange("ATH", "OK");
        });

        assert_eq!(machine.poll().unwrap(), LoopEvent::Ring { count: 1 });
        assert_eq!(
            machine.poll().unwrap(),
            LoopEvent::CallAnswered {
                rings: 2,
                outcome: CallOutcome::Played
            }
        );
        assert_eq!(machine.pending_rings(), 0);

        let written = handle.written_string();
        assert!(written.contains("AT+FCLASS=8\r"));
        assert!(written.contains("AT+VTX\r"));
        assert!(written.ends_with("ATH\r"));
    }

    #[test]
    fn test_failed_voice_setup_keeps_listening() {
        let (mut machine, handle) = machine_with(|port| {
            port.enqueue_line("RING");
            port.enqueue_line("RING");
            port.enqueue_exchange("AT+FCLASS=8", "ERROR");
            port.enqueue_exchange("ATH", "OK"); // hangup after the failure
        });

        machine.poll().unwrap();
        assert_eq!(
            machine.poll().unwrap(),
            LoopEvent::CallAnswered {
                rings: 2,
                outcome: CallOutcome::Failed
            }
        );

        // The loop is ready for the next call.
        assert_eq!(machine.pending_rings(), 0);
        assert!(handle.written_string().contains("ATH\r"));
    }
}
