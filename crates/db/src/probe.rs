//! Two-step availability check: resolve the driver, then open one connection.
//!
//! Each step is reported on the console in Spanish. Failures are printed,
//! never propagated.

use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use facturacion_kernel::DatabaseSettings;

use crate::driver::{ConnectionTarget, Credentials};
use crate::registry::DriverRegistry;

pub const DRIVER_LOADED: &str = "Driver cargado con éxito.";
pub const DRIVER_FAILED: &str = "Ha ocurrido un error al cargar el driver: ";
pub const CONNECTED: &str = "Conexión realizada con éxito.";
pub const CONNECTION_FAILED: &str =
    "Ha ocurrido un error al intentar conectar con la base de datos: ";

/// What a single probe observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    DriverUnavailable { reason: String },
    ConnectionFailed { driver: &'static str, reason: String },
    Connected { driver: &'static str },
}

impl ProbeOutcome {
    pub fn is_connected(&self) -> bool {
        matches!(self, ProbeOutcome::Connected { .. })
    }
}

pub struct ConnectionProbe {
    registry: Arc<DriverRegistry>,
    driver: String,
    target: ConnectionTarget,
    credentials: Credentials,
}

impl ConnectionProbe {
    pub fn new(
        registry: Arc<DriverRegistry>,
        driver: impl Into<String>,
        target: ConnectionTarget,
        credentials: Credentials,
    ) -> Self {
        Self {
            registry,
            driver: driver.into(),
            target,
            credentials,
        }
    }

    pub fn from_settings(registry: Arc<DriverRegistry>, settings: &DatabaseSettings) -> Self {
        Self::new(
            registry,
            settings.driver.clone(),
            ConnectionTarget::from(settings),
            Credentials::from(settings),
        )
    }

    pub fn target(&self) -> &ConnectionTarget {
        &self.target
    }

    /// Run the check once, writing one line per step to `out`.
    pub async fn probe<W>(&self, out: &mut W) -> ProbeOutcome
    where
        W: Write + ?Sized,
    {
        let driver = match self.registry.resolve(&self.driver) {
            Ok(driver) => driver,
            Err(err) => {
                tracing::error!(driver = %self.driver, error = %err, "driver unavailable");
                let reason = err.to_string();
                report(out, &format!("{DRIVER_FAILED}{reason}"));
                return ProbeOutcome::DriverUnavailable { reason };
            }
        };
        tracing::info!(driver = driver.name(), requested = %self.driver, "driver resolved");
        report(out, DRIVER_LOADED);

        let started = Instant::now();
        let mut conn = match driver.connect(&self.target, &self.credentials).await {
            Ok(conn) => conn,
            Err(err) => {
                tracing::error!(
                    driver = driver.name(),
                    uri = %self.target,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %err,
                    "connection failed"
                );
                let reason = err.to_string();
                report(out, &format!("{CONNECTION_FAILED}{reason}"));
                return ProbeOutcome::ConnectionFailed {
                    driver: driver.name(),
                    reason,
                };
            }
        };
        tracing::info!(
            driver = driver.name(),
            uri = %self.target,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "connection established"
        );
        report(out, CONNECTED);

        if let Err(err) = conn.close().await {
            tracing::warn!(driver = driver.name(), error = %err, "failed to close connection");
        }

        ProbeOutcome::Connected {
            driver: driver.name(),
        }
    }
}

fn report<W>(out: &mut W, line: &str)
where
    W: Write + ?Sized,
{
    if let Err(err) = writeln!(out, "{line}").and_then(|_| out.flush()) {
        tracing::warn!(error = %err, "failed to write probe output");
    }
}
