//! MySQL driver backed by `sqlx`.

use std::time::Instant;

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{ConnectOptions, Connection};

use crate::driver::{ConnectionTarget, Credentials, Driver, DriverConnection};
use crate::error::DbError;

/// Class name the JDBC ecosystem uses for the MySQL Connector/J driver.
pub const JDBC_DRIVER_CLASS: &str = "com.mysql.cj.jdbc.Driver";

const UNICODE_CHARSET: &str = "utf8mb4";
const LEGACY_CHARSET: &str = "latin1";

#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlDriver;

impl MySqlDriver {
    pub const fn new() -> Self {
        Self
    }

    /// Translate a target and credentials into `sqlx` options.
    pub fn connect_options(
        target: &ConnectionTarget,
        credentials: &Credentials,
    ) -> MySqlConnectOptions {
        let charset = if target.use_unicode {
            UNICODE_CHARSET
        } else {
            LEGACY_CHARSET
        };

        MySqlConnectOptions::new()
            .host(&target.host)
            .port(target.port)
            .database(&target.database)
            .username(&credentials.username)
            .password(credentials.password.expose())
            .charset(charset)
            .timezone(session_timezone(&target.server_timezone))
    }
}

/// Map a server timezone name to the value sent as `time_zone`.
///
/// UTC aliases become the `+00:00` offset, which works even when the server
/// has no timezone tables loaded. Anything else is passed through.
pub fn session_timezone(server_timezone: &str) -> Option<String> {
    let value = server_timezone.trim();
    if value.is_empty() {
        return None;
    }
    match value.to_ascii_uppercase().as_str() {
        "UTC" | "GMT" | "Z" | "ETC/UTC" => Some("+00:00".to_string()),
        _ => Some(value.to_string()),
    }
}

#[async_trait]
impl Driver for MySqlDriver {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &[JDBC_DRIVER_CLASS]
    }

    async fn connect(
        &self,
        target: &ConnectionTarget,
        credentials: &Credentials,
    ) -> Result<Box<dyn DriverConnection>, DbError> {
        let options = Self::connect_options(target, credentials);
        let started = Instant::now();

        tracing::debug!(
            driver = self.name(),
            uri = %format_args!("mysql://{}", target),
            username = %credentials.username,
            "opening mysql connection"
        );

        let conn = match target.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, options.connect())
                .await
                .map_err(|_| DbError::Timeout(limit))??,
            None => options.connect().await?,
        };

        tracing::debug!(
            driver = self.name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "mysql connection established"
        );

        Ok(Box::new(MySqlSession { conn: Some(conn) }))
    }
}

struct MySqlSession {
    conn: Option<MySqlConnection>,
}

#[async_trait]
impl DriverConnection for MySqlSession {
    async fn close(&mut self) -> Result<(), DbError> {
        if let Some(conn) = self.conn.take() {
            conn.close().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use super::*;
    use facturacion_kernel::DatabaseSettings;

    fn closed_local_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        port
    }

    #[test]
    fn options_follow_target() {
        let settings = DatabaseSettings::default();
        let options = MySqlDriver::connect_options(
            &ConnectionTarget::from(&settings),
            &Credentials::from(&settings),
        );
        assert_eq!(options.get_host(), "localhost");
        assert_eq!(options.get_port(), 3306);
        assert_eq!(options.get_database(), Some("facturacion_db"));
        assert_eq!(options.get_charset(), "utf8mb4");
    }

    #[test]
    fn unicode_off_selects_legacy_charset() {
        let settings = DatabaseSettings {
            use_unicode: false,
            ..DatabaseSettings::default()
        };
        let options = MySqlDriver::connect_options(
            &ConnectionTarget::from(&settings),
            &Credentials::from(&settings),
        );
        assert_eq!(options.get_charset(), "latin1");
    }

    #[test]
    fn utc_names_map_to_zero_offset() {
        assert_eq!(session_timezone("UTC").as_deref(), Some("+00:00"));
        assert_eq!(session_timezone("utc").as_deref(), Some("+00:00"));
        assert_eq!(session_timezone("Etc/UTC").as_deref(), Some("+00:00"));
        assert_eq!(session_timezone("+02:00").as_deref(), Some("+02:00"));
        assert_eq!(session_timezone("Europe/Madrid").as_deref(), Some("Europe/Madrid"));
        assert_eq!(session_timezone(""), None);
    }

    #[test]
    fn answers_to_jdbc_class_name() {
        let driver = MySqlDriver::new();
        assert_eq!(driver.name(), "mysql");
        assert_eq!(driver.aliases(), &[JDBC_DRIVER_CLASS]);
    }

    #[tokio::test]
    async fn refused_connection_surfaces_io_error() {
        let settings = DatabaseSettings {
            host: "127.0.0.1".to_string(),
            port: closed_local_port(),
            connect_timeout_ms: Some(5_000),
            ..DatabaseSettings::default()
        };

        let result = MySqlDriver::new()
            .connect(
                &ConnectionTarget::from(&settings),
                &Credentials::from(&settings),
            )
            .await;

        match result {
            Err(DbError::Sqlx(sqlx::Error::Io(_))) => {}
            Err(other) => panic!("expected an io error, got {other:?}"),
            Ok(_) => panic!("connection to a closed port succeeded"),
        }
    }

    #[tokio::test]
    async fn closing_released_session_is_a_no_op() {
        let mut session = MySqlSession { conn: None };
        assert!(session.close().await.is_ok());
        assert!(session.close().await.is_ok());
    }

    #[tokio::test]
    async fn silent_server_hits_connect_timeout() {
        // Accepts TCP but never sends the MySQL greeting.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let settings = DatabaseSettings {
            host: "127.0.0.1".to_string(),
            port: listener.local_addr().unwrap().port(),
            connect_timeout_ms: Some(200),
            ..DatabaseSettings::default()
        };

        let result = MySqlDriver::new()
            .connect(
                &ConnectionTarget::from(&settings),
                &Credentials::from(&settings),
            )
            .await;

        match result {
            Err(err @ DbError::Timeout(_)) => {
                assert_eq!(err.to_string(), "connection attempt timed out after 200ms");
            }
            Err(other) => panic!("expected a timeout, got {other:?}"),
            Ok(_) => panic!("handshake completed against a silent listener"),
        }
        drop(listener);
    }
}
