//! Logging bootstrap.
//!
//! Logs always go to stderr: stdout is reserved for the probe's console lines.

use facturacion_kernel::{LogFormat, TelemetrySettings};
use tracing_subscriber::EnvFilter;

/// Build the filter from `RUST_LOG`, falling back to the configured level.
pub fn env_filter(settings: &TelemetrySettings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the tracing/logging pipeline.
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init(settings: &TelemetrySettings) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(settings))
        .with_writer(std::io::stderr)
        .with_target(true);

    let installed = match settings.log_format {
        LogFormat::Pretty => builder.try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    };

    if installed {
        tracing::debug!(
            target: "facturacion-telemetry",
            format = ?settings.log_format,
            level = %settings.log_level,
            "telemetry initialized"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let settings = TelemetrySettings::default();
        init(&settings);
        init(&settings);
    }

    #[test]
    fn invalid_level_falls_back_to_info() {
        let settings = TelemetrySettings {
            log_format: LogFormat::Json,
            log_level: "not[a=valid".to_string(),
        };
        // Only asserts that building the filter does not panic.
        let _ = env_filter(&settings);
    }
}
