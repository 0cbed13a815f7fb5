//! Settings shared by every facturacion crate.

pub mod secret;
pub mod settings;

pub use secret::Secret;
pub use settings::{DatabaseSettings, Environment, LogFormat, Settings, TelemetrySettings};
