//! Structured logging for the pose matcher
//!
//! Console and rolling-file output through `tracing-subscriber`, plus a
//! per-thread correlation id that ties the log lines of one match request
//! to its report.

pub mod config;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use uuid::Uuid;

pub use config::{FileRotation, LoggingConfig};

thread_local! {
    static CORRELATION_ID: std::cell::RefCell<Option<Uuid>> =
        const { std::cell::RefCell::new(None) };
}

const LOG_FILE_PREFIX: &str = "posematch.log";

/// Initialize the global subscriber.
///
/// When file logging is enabled the returned guard flushes the background
/// writer on drop, so keep it alive for the lifetime of the program.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    config.validate().map_err(anyhow::Error::msg)?;

    let crate_name = env!("CARGO_PKG_NAME").replace('-', "_");
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.filter_directives(&crate_name)))?;

    let mut layers = Vec::new();
    let mut guard = None;

    if config.console_output {
        let console_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(config.include_file_location)
            .with_file(config.include_file_location);
        layers.push(console_layer.boxed());
    }

    if let Some(ref log_dir) = config.log_directory {
        std::fs::create_dir_all(log_dir)?;
        let file_appender = match config.rotation {
            FileRotation::Hourly => tracing_appender::rolling::hourly(log_dir, LOG_FILE_PREFIX),
            FileRotation::Daily => tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX),
            FileRotation::Never => tracing_appender::rolling::never(log_dir, LOG_FILE_PREFIX),
        };
        let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(file_guard);

        let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);
        if config.json_file_output {
            layers.push(file_layer.json().boxed());
        } else {
            layers.push(file_layer.boxed());
        }
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()?;

    tracing::info!(?config, "logging initialized");
    Ok(guard)
}

/// Set a correlation ID for the current thread
pub fn set_correlation_id(id: Uuid) {
    CORRELATION_ID.with(|correlation_id| {
        *correlation_id.borrow_mut() = Some(id);
    });
}

/// Get the current correlation ID for this thread
pub fn get_correlation_id() -> Option<Uuid> {
    CORRELATION_ID.with(|correlation_id| *correlation_id.borrow())
}

/// Generate a new correlation ID and set it for the current thread
pub fn new_correlation_id() -> Uuid {
    let id = Uuid::new_v4();
    set_correlation_id(id);
    id
}

/// Clear the correlation ID for the current thread
pub fn clear_correlation_id() {
    CORRELATION_ID.with(|correlation_id| {
        *correlation_id.borrow_mut() = None;
    });
}

/// Run `f` with `id` as the thread's correlation ID, restoring the previous one afterwards.
pub fn with_correlation_id<T>(id: Option<Uuid>, f: impl FnOnce() -> T) -> T {
    let previous = get_correlation_id();
    match id {
        Some(id) => set_correlation_id(id),
        None => clear_correlation_id(),
    }
    let out = f();
    match previous {
        Some(previous) => set_correlation_id(previous),
        None => clear_correlation_id(),
    }
    out
}

/// Create a span with correlation ID automatically included
#[macro_export]
macro_rules! correlation_span {
    ($level:expr, $name:expr) => {
        if let Some(correlation_id) = $crate::logging::get_correlation_id() {
            tracing::span!($level, $name, correlation_id = %correlation_id)
        } else {
            tracing::span!($level, $name)
        }
    };
    ($level:expr, $name:expr, $($field:tt)*) => {
        if let Some(correlation_id) = $crate::logging::get_correlation_id() {
            tracing::span!($level, $name, correlation_id = %correlation_id, $($field)*)
        } else {
            tracing::span!($level, $name, $($field)*)
        }
    };
}
