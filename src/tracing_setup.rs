use fmt::format::FmtSpan;

use tracing_appender::non_blocking::WorkerGuard;

use tracing_subscriber::filter;
use tracing_subscriber::filter::FilterExt;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub struct LoggingGuards {
    /// Guard for the main app log
    pub main: WorkerGuard,
    /// Guard for the gateway request/response log
    pub api: WorkerGuard,
}

/// Install file-based logging. Nothing may write to stdout/stderr while the
/// terminal UI owns the screen, so both layers go to rolling files.
pub fn init_tracing() -> LoggingGuards {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("debug,hyper=error,hyper_util=error,reqwest=warn"));

    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("promptdeck/logs");
    std::fs::create_dir_all(&log_dir).expect("Failed to create logs directory");

    let file_appender = tracing_appender::rolling::daily(&log_dir, "promptdeck.log");
    let (non_blocking_file, main_guard) = tracing_appender::non_blocking(file_appender);

    let common_fmt = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(false);

    let main_layer = common_fmt.with_writer(non_blocking_file);

    // Separate rolling file holding only raw gateway traffic, one entry per
    // request or response. Diagnostic only; nothing asserts on this output.
    let api_appender = tracing_appender::rolling::daily(log_dir, "gateway_api.log");
    let (api_non_blocking, api_guard) = tracing_appender::non_blocking(api_appender);

    let api_layer = fmt::layer()
        .with_writer(api_non_blocking)
        .with_ansi(false)
        .with_level(false)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .without_time();

    // This layer only receives events tagged with target="api_json"
    let only_api_json = filter::filter_fn(|meta| meta.target() == "api_json").and(LevelFilter::INFO);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(main_layer)
        .with(api_layer.with_filter(only_api_json))
        .try_init();

    LoggingGuards {
        main: main_guard,
        api: api_guard,
    }
}
