//! Structured Logger
//!
//! Wraps `tracing` to provide a console layer, a daily-rotated NDJSON file,
//! and environment-based level control.

use textgate_config::LoggingConfig;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the global structured logger.
///
/// `RUST_LOG` takes precedence over `config.level`. Console output goes to
/// stderr so command output on stdout stays machine readable. Calling this
/// twice is harmless; the second subscriber is ignored.
pub fn init_logger(config: &LoggingConfig) -> Result<(), InitError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    // Rolling file appender: writes NDJSON to `<dir>/<file_name>.YYYY-MM-DD`
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(&config.file_name)
        .build(&config.dir)?;

    let file_layer = fmt::layer()
        .json()
        .with_writer(file_appender)
        .with_ansi(false);

    let console_layer = if config.json_console {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(true)
            .boxed()
    };

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();
    Ok(())
}
