//! Configuration management with TOML support.
//!
//! Settings resolve from a config file (explicit path, working directory,
//! or XDG location), environment overrides, and built-in defaults.

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use schema::{
    AnswerConfig, AudioConfig, CallLogConfig, Config, LogFormat, LoggingConfig, SerialConfig,
};
