//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use std::path::{Path, PathBuf};

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "MODEM_ANSWER";

/// Config file name
const CONFIG_FILE_NAME: &str = "modem-answer.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "MODEM_ANSWER_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `MODEM_ANSWER_CONFIG` environment variable (explicit path)
    /// 2. `./modem-answer.toml` (current directory)
    /// 3. `~/.config/modem-answer/modem-answer.toml` (XDG)
    /// 4. Built-in defaults (no file required)
    ///
    /// Environment variables can override any config file values.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = if let Some(ref path) = config_path {
            load_from_file(path)?
        } else {
            Config::default()
        };

        apply_env_overrides(&mut config)?;

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        // Still apply env overrides even with defaults
        let _ = apply_env_overrides(&mut config);

        Self {
            config_path: None,
            config,
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    // 1. Explicit environment variable
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. Current directory
    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    // 3. XDG config directory
    if let Some(config_dir) = get_config_dir() {
        let app_config = config_dir.join("modem-answer").join(CONFIG_FILE_NAME);
        if app_config.exists() {
            return Some(app_config);
        }
    }

    // 4. No config file found - will use defaults
    None
}

/// Get the platform-specific config directory.
fn get_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }
}

/// Load configuration from a file.
fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(ConfigError::ParseError)
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern: `MODEM_ANSWER_<SECTION>_<KEY>`
/// For example:
/// - `MODEM_ANSWER_SERIAL_PORT=/dev/ttyUSB0`
/// - `MODEM_ANSWER_ANSWER_RINGS=4`
/// - `MODEM_ANSWER_AUDIO_FILE=/srv/announce.wav`
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    // Serial overrides
    if let Ok(val) = std::env::var(format!("{}_SERIAL_PORT", ENV_PREFIX)) {
        config.serial.port = val;
    }
    if let Ok(val) = std::env::var(format!("{}_SERIAL_BAUD", ENV_PREFIX)) {
        config.serial.baud = val.parse().map_err(|_| {
            ConfigError::env_parse(format!("{}_SERIAL_BAUD", ENV_PREFIX), "Invalid baud rate")
        })?;
    }
    if let Ok(val) = std::env::var(format!("{}_SERIAL_TIMEOUT_MS", ENV_PREFIX)) {
        config.serial.timeout_ms = val.parse().map_err(|_| {
            ConfigError::env_parse(
                format!("{}_SERIAL_TIMEOUT_MS", ENV_PREFIX),
                "Invalid timeout",
            )
        })?;
    }

    // Answer overrides
    if let Ok(val) = std::env::var(format!("{}_ANSWER_RINGS", ENV_PREFIX)) {
        config.answer.rings = val.parse().map_err(|_| {
            ConfigError::env_parse(format!("{}_ANSWER_RINGS", ENV_PREFIX), "Invalid ring count")
        })?;
    }
    if let Ok(val) = std::env::var(format!("{}_ANSWER_RING_SILENCE_RESET_MS", ENV_PREFIX)) {
        config.answer.ring_silence_reset_ms = val.parse().map_err(|_| {
            ConfigError::env_parse(
                format!("{}_ANSWER_RING_SILENCE_RESET_MS", ENV_PREFIX),
                "Invalid duration",
            )
        })?;
    }

    // Audio overrides
    if let Ok(val) = std::env::var(format!("{}_AUDIO_FILE", ENV_PREFIX)) {
        config.audio.file = PathBuf::from(val);
    }

    // Call log overrides
    if let Ok(val) = std::env::var(format!("{}_CALL_LOG_FILE", ENV_PREFIX)) {
        config.call_log.file = Some(PathBuf::from(val));
    }

    // Logging overrides
    if let Ok(val) = std::env::var(format!("{}_LOGGING_LEVEL", ENV_PREFIX)) {
        config.logging.level = val;
    }

    Ok(())
}
