//! Shared logging utilities for consistent tracing across binaries and tests

use chrono::{DateTime, Utc};

/// Initialize the stdout tracing subscriber with an optional base level.
///
/// The noisy HTTP internals (reqwest/hyper) are pinned to `warn` regardless
/// of the requested level, the same way every process configures itself.
pub fn init_tracing(log_level: Option<&str>) {
    use tracing_subscriber::{EnvFilter, fmt};

    let base_level = log_level.unwrap_or("info");
    let directives = format!("client={base_level},shared={base_level},reqwest=warn,hyper=warn");

    fmt()
        .with_env_filter(EnvFilter::new(&directives))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// Get formatted timestamp for consistent logging
pub fn format_timestamp() -> String {
    let now: DateTime<Utc> = Utc::now();
    now.format("%H:%M:%S%.3f").to_string()
}
