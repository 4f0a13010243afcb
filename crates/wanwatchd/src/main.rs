// # wanwatchd - WAN Address Watcher Daemon
//
// The daemon is a thin integration layer: it reads configuration from the
// environment, wires the OPNsense source, the SMTP notifier and the file
// state store into the engine, and runs it until a shutdown signal.
// All watching logic lives in wanwatch-core.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Appliance API
// - `WANWATCH_API_URL`: Base URL of the appliance (required)
// - `WANWATCH_API_KEY`: API key (required)
// - `WANWATCH_API_SECRET`: API secret (required)
// - `WANWATCH_INTERFACE`: Interface name to monitor (required)
// - `WANWATCH_FETCH_TIMEOUT_SECS`: Request timeout (default 5)
//
// ### Mail
// - `WANWATCH_SMTP_HOST`: Mail server hostname (required)
// - `WANWATCH_SMTP_PORT`: Mail server port, implicit TLS (default 465)
// - `WANWATCH_SMTP_USERNAME`: Login username (required)
// - `WANWATCH_SMTP_PASSWORD`: Login password (required)
// - `WANWATCH_MAIL_FROM`: Sender address (required)
// - `WANWATCH_MAIL_TO`: Recipient address (required)
//
// ### Watcher
// - `WANWATCH_STATE_PATH`: Path of the address state file (required)
// - `WANWATCH_POLL_INTERVAL_SECS`: Seconds between cycles (default 60)
// - `WANWATCH_LOG_LEVEL`: trace|debug|info|warn|error (default info)
//
// ## Example
//
// ```bash
// export WANWATCH_API_URL=https://firewall.example.net
// export WANWATCH_API_KEY=your_key
// export WANWATCH_API_SECRET=your_secret
// export WANWATCH_INTERFACE=wan
// export WANWATCH_STATE_PATH=/var/lib/wanwatch/addresses.txt
// export WANWATCH_SMTP_HOST=mail.example.net
// export WANWATCH_SMTP_USERNAME=wanwatch@example.net
// export WANWATCH_SMTP_PASSWORD=your_password
// export WANWATCH_MAIL_FROM=wanwatch@example.net
// export WANWATCH_MAIL_TO=ops@example.net
//
// wanwatchd
// ```

use std::env;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use wanwatch_core::{FileStateStore, WatchConfig, WatchEngine};
use wanwatch_notify_smtp::{SmtpConfig, SmtpNotifier};
use wanwatch_source_opnsense::{OpnsenseAddressSource, OpnsenseConfig};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum WanwatchExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<WanwatchExitCode> for ExitCode {
    fn from(code: WanwatchExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    api_url: String,
    api_key: String,
    api_secret: String,
    interface: String,
    fetch_timeout_secs: u64,
    poll_interval_secs: u64,
    state_path: String,
    smtp_host: String,
    smtp_port: u16,
    smtp_username: String,
    smtp_password: String,
    mail_from: String,
    mail_to: String,
    log_level: String,
}

/// Read a required variable; missing and empty are the same startup error
fn required(name: &str) -> Result<String> {
    let value = env::var(name).with_context(|| format!("{} is required", name))?;
    if value.trim().is_empty() {
        anyhow::bail!("{} is set but empty", name);
    }
    Ok(value)
}

/// Read an optional numeric variable, failing loudly on garbage instead of
/// silently falling back to the default
fn optional_parsed<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} is not a valid number ({}): {}", name, raw, e)),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            api_url: required("WANWATCH_API_URL")?,
            api_key: required("WANWATCH_API_KEY")?,
            api_secret: required("WANWATCH_API_SECRET")?,
            interface: required("WANWATCH_INTERFACE")?,
            fetch_timeout_secs: optional_parsed("WANWATCH_FETCH_TIMEOUT_SECS", 5)?,
            poll_interval_secs: optional_parsed("WANWATCH_POLL_INTERVAL_SECS", 60)?,
            state_path: required("WANWATCH_STATE_PATH")?,
            smtp_host: required("WANWATCH_SMTP_HOST")?,
            smtp_port: optional_parsed("WANWATCH_SMTP_PORT", 465)?,
            smtp_username: required("WANWATCH_SMTP_USERNAME")?,
            smtp_password: required("WANWATCH_SMTP_PASSWORD")?,
            mail_from: required("WANWATCH_MAIL_FROM")?,
            mail_to: required("WANWATCH_MAIL_TO")?,
            log_level: env::var("WANWATCH_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if !self.api_url.starts_with("https://") && !self.api_url.starts_with("http://") {
            anyhow::bail!(
                "WANWATCH_API_URL must use HTTP or HTTPS scheme. Got: {}",
                self.api_url
            );
        }

        if self.api_url.starts_with("http://") {
            eprintln!(
                "WARNING: WANWATCH_API_URL uses HTTP (not HTTPS). \
                 API credentials will travel in the clear."
            );
        }

        if !(1..=300).contains(&self.fetch_timeout_secs) {
            anyhow::bail!(
                "WANWATCH_FETCH_TIMEOUT_SECS must be between 1 and 300 seconds. Got: {}",
                self.fetch_timeout_secs
            );
        }

        if !(5..=86400).contains(&self.poll_interval_secs) {
            anyhow::bail!(
                "WANWATCH_POLL_INTERVAL_SECS must be between 5 and 86400 seconds. Got: {}",
                self.poll_interval_secs
            );
        }

        if self.smtp_port == 0 {
            anyhow::bail!("WANWATCH_SMTP_PORT must be a valid port number");
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "WANWATCH_LOG_LEVEL '{}' is not valid. \
                 Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return WanwatchExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return WanwatchExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return WanwatchExitCode::ConfigError.into();
    }

    info!("Starting wanwatchd");
    info!(
        "Watching interface {} every {}s",
        config.interface, config.poll_interval_secs
    );

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return WanwatchExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {}", e);
            WanwatchExitCode::RuntimeError
        } else {
            WanwatchExitCode::CleanShutdown
        }
    })
    .into()
}

/// Wire the components and run the engine until a shutdown signal
async fn run_daemon(config: Config) -> Result<()> {
    let source = OpnsenseAddressSource::new(
        OpnsenseConfig::new(&config.api_url, &config.api_key, &config.api_secret)
            .with_timeout(Duration::from_secs(config.fetch_timeout_secs)),
    )?;

    let notifier = SmtpNotifier::new(
        SmtpConfig::new(
            &config.smtp_host,
            &config.smtp_username,
            &config.smtp_password,
            &config.mail_from,
        )
        .with_port(config.smtp_port),
    )?;

    let state_store = FileStateStore::new(&config.state_path).await?;

    let watch_config = WatchConfig::new(&config.interface, &config.mail_to)
        .with_poll_interval_secs(config.poll_interval_secs);

    let (engine, mut event_rx) = WatchEngine::new(
        Box::new(source),
        Box::new(notifier),
        Box::new(state_store),
        watch_config,
    )?;

    // Drain engine events so the bounded channel never fills
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            tracing::debug!("Engine event: {:?}", event);
        }
    });

    // Translate process signals into the engine's shutdown channel
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => info!("Received {}", signal),
            Err(e) => error!("Signal handling error: {}", e),
        }
        let _ = shutdown_tx.send(());
    });

    engine.run_with_shutdown(Some(shutdown_rx)).await?;

    info!("wanwatchd stopped");
    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };

    Ok(signal)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
