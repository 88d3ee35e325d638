use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

/// Maps the configured level names onto `tracing` directives.
pub fn directive_for(log_level: &str) -> &'static str {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug",
        "WARNING" => "warn",
        "ERROR" | "CRITICAL" => "error",
        _ => "info",
    }
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over the configured level.
pub fn init(app: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("medqa={}", directive_for(&app.log_level))));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(app.debug)
        .with_file(app.debug)
        .with_line_number(app.debug)
        .with_writer(std::io::stderr)
        .try_init();
}
