use std::time::Duration;

use thiserror::Error;

/// Failures raised while resolving a driver or talking to the server.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("no driver registered for '{requested}' (available: {available})")]
    DriverUnavailable { requested: String, available: String },

    #[error("connection attempt timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("{0}")]
    Connect(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DbError {
    /// Create a driver-unavailable error listing what is registered.
    pub fn driver_unavailable(requested: impl Into<String>, available: &[&str]) -> Self {
        let available = if available.is_empty() {
            "none".to_string()
        } else {
            available.join(", ")
        };
        Self::DriverUnavailable {
            requested: requested.into(),
            available,
        }
    }

    /// Create a connection error from a plain message.
    pub fn connect(message: impl Into<String>) -> Self {
        Self::Connect(message.into())
    }
}
