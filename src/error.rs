//! Unified application error type.
//!
//! Startup propagates any of these to `main`, which logs and exits
//! nonzero: a modem that cannot be initialized, a port that cannot be
//! opened, or an announcement that cannot be decoded leaves nothing to
//! daemonize.

use thiserror::Error;

/// Top-level error for daemon startup and the answer loop.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error(transparent)]
    Port(#[from] crate::port::PortError),

    #[error(transparent)]
    Modem(#[from] crate::modem::ModemError),

    #[error(transparent)]
    Audio(#[from] crate::audio::AudioError),

    #[error(transparent)]
    CallLog(#[from] crate::call_log::CallLogError),
}
