//! facturacion application library
//!
//! Wires layered settings, logging and the driver registry into a single
//! connection probe run.

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use facturacion_db::{ConnectionProbe, DriverRegistry, ProbeOutcome};
use facturacion_kernel::Settings;

/// Load and validate settings, then install the log subscriber.
pub fn bootstrap() -> anyhow::Result<Settings> {
    bootstrap_with(|_| Ok(()))
}

/// Like [`bootstrap`], applying `overrides` before validation.
pub fn bootstrap_with<F>(overrides: F) -> anyhow::Result<Settings>
where
    F: FnOnce(&mut Settings) -> anyhow::Result<()>,
{
    let mut settings =
        Settings::load().with_context(|| "failed to load facturacion settings")?;
    facturacion_telemetry::init(&settings.telemetry);
    overrides(&mut settings)?;
    settings.validate()?;

    tracing::info!(
        env = ?settings.environment,
        driver = %settings.database.driver,
        host = %settings.database.host,
        port = settings.database.port,
        database = %settings.database.name,
        "facturacion bootstrap complete"
    );

    Ok(settings)
}

/// Build a probe against every driver this build ships with.
pub fn build_probe(settings: &Settings) -> ConnectionProbe {
    let registry = Arc::new(DriverRegistry::with_default_drivers());
    ConnectionProbe::from_settings(registry, &settings.database)
}

/// Probe once, printing the outcome lines to `out`.
pub async fn run<W>(settings: &Settings, out: &mut W) -> ProbeOutcome
where
    W: Write + ?Sized,
{
    build_probe(settings).probe(out).await
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use super::*;
    use facturacion_db::probe::{CONNECTION_FAILED, DRIVER_FAILED, DRIVER_LOADED};

    #[tokio::test]
    async fn unknown_driver_prints_only_driver_failure() {
        let mut settings = Settings::default();
        settings.database.driver = "org.h2.Driver".to_string();

        let mut out = Vec::new();
        let outcome = run(&settings, &mut out).await;

        assert!(matches!(outcome, ProbeOutcome::DriverUnavailable { .. }));
        let printed = String::from_utf8(out).unwrap();
        assert_eq!(printed.lines().count(), 1);
        assert!(printed.starts_with(DRIVER_FAILED));
    }

    #[tokio::test]
    async fn closed_port_reports_connection_failure() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let mut settings = Settings::default();
        settings.database.driver = "com.mysql.cj.jdbc.Driver".to_string();
        settings.database.host = "127.0.0.1".to_string();
        settings.database.port = port;
        settings.database.connect_timeout_ms = Some(5_000);

        let mut out = Vec::new();
        let outcome = run(&settings, &mut out).await;

        assert!(matches!(
            outcome,
            ProbeOutcome::ConnectionFailed { driver: "mysql", .. }
        ));
        let printed = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = printed.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], DRIVER_LOADED);
        assert!(lines[1].starts_with(CONNECTION_FAILED));
        assert!(lines[1].len() > CONNECTION_FAILED.len());
    }

    #[tokio::test]
    async fn connect_timeout_is_printed_as_connection_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let mut settings = Settings::default();
        settings.database.host = "127.0.0.1".to_string();
        settings.database.port = listener.local_addr().unwrap().port();
        settings.database.connect_timeout_ms = Some(200);

        let mut out = Vec::new();
        let outcome = run(&settings, &mut out).await;

        assert_eq!(
            outcome,
            ProbeOutcome::ConnectionFailed {
                driver: "mysql",
                reason: "connection attempt timed out after 200ms".to_string(),
            }
        );
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!(
                "{DRIVER_LOADED}\n{CONNECTION_FAILED}connection attempt timed out after 200ms\n"
            )
        );
        drop(listener);
    }
}
