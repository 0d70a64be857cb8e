use std::{backtrace::Backtrace, panic::PanicHookInfo, thread};

use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;

/// `RUST_LOG` wins over the configured filter when both are present.
pub fn init_tracing(cfg: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.rust_log));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .init();
    std::panic::set_hook(Box::new(log_panic));
}

fn log_panic(info: &PanicHookInfo<'_>) {
    let payload = info.payload();
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic");
    let location = info
        .location()
        .map(ToString::to_string)
        .unwrap_or_else(|| "unknown".to_string());
    let current = thread::current();

    tracing::error!(
        panic = %message,
        location = %location,
        thread = current.name().unwrap_or("unnamed"),
        backtrace = %Backtrace::capture(),
        "panic"
    );
}
