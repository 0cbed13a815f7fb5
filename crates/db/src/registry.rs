use std::sync::Arc;

use crate::driver::Driver;
use crate::error::DbError;
use crate::mysql::MySqlDriver;

/// Drivers linked into this binary, looked up by name or alias.
pub struct DriverRegistry {
    drivers: Vec<Arc<dyn Driver>>,
}

impl DriverRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            drivers: Vec::new(),
        }
    }

    /// Registry holding every driver this build ships with
    pub fn with_default_drivers() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(MySqlDriver::new()));
        registry
    }

    /// Register a driver. A driver with the same name replaces the old one.
    pub fn register(&mut self, driver: Arc<dyn Driver>) {
        if let Some(slot) = self.drivers.iter_mut().find(|d| d.name() == driver.name()) {
            tracing::debug!(driver = driver.name(), "replacing registered driver");
            *slot = driver;
        } else {
            tracing::debug!(driver = driver.name(), "registering driver");
            self.drivers.push(driver);
        }
    }

    /// Every identifier that resolves, names first then aliases
    pub fn identifiers(&self) -> Vec<&'static str> {
        let mut identifiers: Vec<&'static str> = self.drivers.iter().map(|d| d.name()).collect();
        for driver in &self.drivers {
            identifiers.extend(driver.aliases().iter().copied());
        }
        identifiers
    }

    /// Find the driver answering to `identifier`, ignoring ASCII case
    pub fn resolve(&self, identifier: &str) -> Result<Arc<dyn Driver>, DbError> {
        let identifier = identifier.trim();
        self.drivers
            .iter()
            .find(|driver| {
                driver.name().eq_ignore_ascii_case(identifier)
                    || driver
                        .aliases()
                        .iter()
                        .any(|alias| alias.eq_ignore_ascii_case(identifier))
            })
            .cloned()
            .ok_or_else(|| DbError::driver_unavailable(identifier, &self.identifiers()))
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}
