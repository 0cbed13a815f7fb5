use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use facturacion_kernel::{DatabaseSettings, Secret};

use crate::error::DbError;

/// Where to connect: server address, database and session options.
///
/// Credentials are kept apart so the target can be logged freely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub use_unicode: bool,
    pub server_timezone: String,
    pub connect_timeout: Option<Duration>,
}

impl From<&DatabaseSettings> for ConnectionTarget {
    fn from(settings: &DatabaseSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            database: settings.name.clone(),
            use_unicode: settings.use_unicode,
            server_timezone: settings.server_timezone.clone(),
            connect_timeout: settings.connect_timeout_ms.map(Duration::from_millis),
        }
    }
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}/{}?useUnicode={}&serverTimezone={}",
            self.host, self.port, self.database, self.use_unicode, self.server_timezone
        )
    }
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: Secret,
}

impl From<&DatabaseSettings> for Credentials {
    fn from(settings: &DatabaseSettings) -> Self {
        Self {
            username: settings.username.clone(),
            password: settings.password.clone(),
        }
    }
}

/// A client library able to open sessions against one kind of server.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Canonical identifier used for lookup.
    fn name(&self) -> &'static str;

    /// Additional identifiers this driver answers to.
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// Open a single session. No retries.
    async fn connect(
        &self,
        target: &ConnectionTarget,
        credentials: &Credentials,
    ) -> Result<Box<dyn DriverConnection>, DbError>;
}

/// A live session handed out by a [`Driver`].
#[async_trait]
pub trait DriverConnection: Send {
    /// Release the session. Closing twice is a no-op.
    async fn close(&mut self) -> Result<(), DbError>;
}
