//! Modem Answer Agent Library
//!
//! Core functionality for an answering-machine daemon driving a
//! voice-capable analog modem over a serial link: initialize the modem
//! into a known command state, count incoming rings, auto-answer, stream
//! a WAV announcement to the caller, and hang up.
//!
//! # Modules
//!
//! - `config`: Configuration management with TOML support
//! - `port`: Serial port abstraction (real hardware and scripted mock)
//! - `modem`: AT command/response state machine and line classification
//! - `audio`: Announcement loading and validation
//! - `answer`: Ring-detection and auto-answer control loop
//! - `call_log`: JSON-lines record of answered calls
//! - `error`: Unified error handling

pub mod answer;
pub mod audio;
pub mod call_log;
pub mod config;
pub mod error;
pub mod modem;
pub mod port;

// Re-export commonly used types for convenience
pub use answer::{AnswerMachine, AnswerSettings, LoopEvent};
pub use audio::{Announcement, AudioError};
pub use call_log::{CallLog, CallOutcome, CallRecord};
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
pub use error::AppError;
pub use modem::{CallerId, Modem, ModemError, PlaybackSettings};
pub use port::{
    DataBits, FlowControl, MockSerialPort, Parity, PortConfiguration, PortError,
    SerialPortAdapter, StopBits, SyncSerialPort,
};
