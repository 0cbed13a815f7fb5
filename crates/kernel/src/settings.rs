use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use serde::Deserialize;

use crate::secret::Secret;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "FACTURACION_ENV";
const CONFIG_DIR_ENV: &str = "FACTURACION_CONFIG_DIR";
const ENV_PREFIX: &str = "FACTURACION";

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl Environment {
    fn parse(value: &str) -> anyhow::Result<Self> {
        match value {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, and environment overlay.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            // Default to the `config` directory next to the working directory.
            Err(_) => std::env::current_dir()
                .with_context(|| "unable to resolve current directory")?
                .join("config"),
        };

        Self::load_from(&config_dir, &environment)
    }

    /// Load configuration from an explicit directory and environment name.
    ///
    /// Reads `base.toml` then `<environment>.toml` (both optional), then
    /// `FACTURACION_*` variables with `__` as the nesting separator.
    pub fn load_from(config_dir: &Path, environment: &str) -> anyhow::Result<Self> {
        Self::load_layered(config_dir, environment, None)
    }

    /// Shared loader. `vars` replaces the process environment when given.
    fn load_layered(
        config_dir: &Path,
        environment: &str,
        vars: Option<config::Map<String, String>>,
    ) -> anyhow::Result<Self> {
        let parsed_environment = Environment::parse(environment)?;

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        let builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            // No `try_parsing`: values stay strings and serde converts typed fields.
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .source(vars),
            );

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        // The selected environment wins over anything written in the files.
        settings.environment = parsed_environment;

        Ok(settings)
    }

    /// Reject settings the probe cannot act on.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.database
            .validate()
            .with_context(|| "invalid [database] settings")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "DatabaseSettings::default_driver")]
    pub driver: String,
    #[serde(default = "DatabaseSettings::default_host")]
    pub host: String,
    #[serde(default = "DatabaseSettings::default_port")]
    pub port: u16,
    #[serde(default = "DatabaseSettings::default_name")]
    pub name: String,
    #[serde(default = "DatabaseSettings::default_username")]
    pub username: String,
    #[serde(default = "DatabaseSettings::default_password")]
    pub password: Secret,
    #[serde(default = "DatabaseSettings::default_use_unicode")]
    pub use_unicode: bool,
    #[serde(default = "DatabaseSettings::default_server_timezone")]
    pub server_timezone: String,
    /// Upper bound for opening the connection. Unset means no timeout.
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,
}

impl DatabaseSettings {
    fn default_driver() -> String {
        "mysql".to_string()
    }

    fn default_host() -> String {
        "localhost".to_string()
    }

    fn default_port() -> u16 {
        3306
    }

    fn default_name() -> String {
        "facturacion_db".to_string()
    }

    fn default_username() -> String {
        "root".to_string()
    }

    fn default_password() -> Secret {
        Secret::new("root")
    }

    fn default_use_unicode() -> bool {
        true
    }

    fn default_server_timezone() -> String {
        "UTC".to_string()
    }

    fn validate(&self) -> anyhow::Result<()> {
        let required = [
            ("driver", &self.driver),
            ("host", &self.host),
            ("name", &self.name),
            ("username", &self.username),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                bail!("missing required key 'database.{}'", key);
            }
        }
        if self.port == 0 {
            bail!("'database.port' must be between 1 and 65535");
        }
        if self.connect_timeout_ms == Some(0) {
            bail!("'database.connect_timeout_ms' must be greater than zero when set");
        }
        Ok(())
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            driver: Self::default_driver(),
            host: Self::default_host(),
            port: Self::default_port(),
            name: Self::default_name(),
            username: Self::default_username(),
            password: Self::default_password(),
            use_unicode: Self::default_use_unicode(),
            server_timezone: Self::default_server_timezone(),
            connect_timeout_ms: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default = "TelemetrySettings::default_log_level")]
    pub log_level: String,
}

impl TelemetrySettings {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            log_level: Self::default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}
