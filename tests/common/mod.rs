//! Shared test utilities for the answer-flow tests.
//!
//! Provides scripted mock ports (the "modem side" of each exchange), fast
//! playback settings so tests never sleep on real pacing, and small audio
//! fixtures.

#![allow(dead_code)]

use modem_answer_agent::answer::AnswerSettings;
use modem_answer_agent::audio::Announcement;
use modem_answer_agent::modem::{command, PlaybackSettings};
use modem_answer_agent::port::MockSerialPort;
use std::time::Duration;

/// Playback pacing with no real sleeps and a token drain wait.
pub fn fast_playback() -> PlaybackSettings {
    PlaybackSettings {
        chunk_frames: 8,
        inter_chunk_delay: Duration::ZERO,
        settle_delay: Duration::ZERO,
        drain_timeout: Duration::from_millis(10),
    }
}

/// Answer policy for tests: configurable threshold, short staleness window.
pub fn fast_settings(rings_before_answer: u32) -> AnswerSettings {
    AnswerSettings {
        rings_before_answer,
        ring_silence_reset: Duration::from_millis(40),
        playback: fast_playback(),
    }
}

/// Script the modem side of the full initialization sequence.
pub fn script_init(port: &mut MockSerialPort) {
    for cmd in command::INIT_SEQUENCE {
        port.enqueue_exchange(cmd.command, "OK");
    }
}

/// Script the modem side of answering a call: voice setup (with `CONNECT`
/// for the transmit channel), the drain acknowledgment, and the hangup.
pub fn script_answer(port: &mut MockSerialPort) {
    port.enqueue_exchange("AT+FCLASS=8", "OK");
    port.enqueue_exchange("AT+VSM=128,8000", "OK");
    port.enqueue_exchange("AT+VLS=1", "OK");
    port.enqueue_exchange("AT+VTX", "CONNECT");
    port.enqueue_line("OK"); // acknowledgment after <DLE><ETX>
    port.enqueue_exchange("ATH", "OK");
}

/// A flat announcement of `len` mid-scale samples.
pub fn test_announcement(len: usize) -> Announcement {
    Announcement::from_raw(vec![0x80; len]).unwrap()
}
