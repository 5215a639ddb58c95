use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use modem_answer_agent::answer::{AnswerMachine, AnswerSettings};
use modem_answer_agent::audio::Announcement;
use modem_answer_agent::call_log::CallLog;
use modem_answer_agent::config::{ConfigLoader, LogFormat, LoggingConfig};
use modem_answer_agent::modem::Modem;
use modem_answer_agent::port::SyncSerialPort;

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "An answering-machine daemon for voice-capable analog modems on a serial line.",
    long_about = "Initializes a voice modem over a serial link, counts incoming rings, auto-answers after the configured count, streams a WAV announcement to the caller, and hangs up. Configuration comes from a TOML file, environment overrides, and the flags below."
)]
struct Args {
    /// Path to the configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial port the modem is attached to (overrides config).
    #[arg(short, long)]
    port: Option<String>,

    /// WAV announcement to play to callers (overrides config).
    #[arg(short, long)]
    audio: Option<PathBuf>,

    /// Rings before auto-answer (overrides config).
    #[arg(short, long)]
    rings: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loader = match &args.config {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    let mut config = loader.into_config();

    if let Some(port) = args.port {
        config.serial.port = port;
    }
    if let Some(audio) = args.audio {
        config.audio.file = audio;
    }
    if let Some(rings) = args.rings {
        config.answer.rings = rings;
    }
    config.validate()?;

    init_tracing(&config.logging);
    info!(
        port = %config.serial.port,
        baud = config.serial.baud,
        rings = config.answer.rings,
        "modem answer agent starting"
    );

    // Fail on a bad announcement before touching the hardware.
    let announcement = Announcement::load(&config.audio.file)?;
    info!(
        file = %config.audio.file.display(),
        duration_ms = announcement.duration().as_millis() as u64,
        "announcement loaded"
    );

    let call_log = match &config.call_log.file {
        Some(path) => Some(CallLog::open(path)?),
        None => None,
    };

    let port = SyncSerialPort::open(&config.serial.port, config.serial.port_configuration())?;
    let mut modem = Modem::new(port);
    modem.initialize()?;

    let settings = AnswerSettings {
        rings_before_answer: config.answer.rings,
        ring_silence_reset: config.answer.ring_silence_reset(),
        playback: config.audio.playback_settings(),
    };

    let shutdown = Arc::new(AtomicBool::new(false));
    let machine = AnswerMachine::new(modem, announcement, settings, call_log, shutdown.clone());

    // The answer loop is blocking serial I/O; run it off the async runtime
    // and keep this task free to watch for signals.
    let mut worker = tokio::task::spawn_blocking(move || machine.run());

    tokio::select! {
        result = &mut worker => {
            result??;
        }
        _ = shutdown_signal() => {
            info!("signal received, starting graceful shutdown");
            shutdown.store(true, Ordering::Relaxed);
            worker.await??;
        }
    }

    info!("modem answer agent stopped");
    Ok(())
}

fn init_tracing(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    match config.format {
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init(),
    }
}

// --- Graceful Shutdown Handler ---
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
