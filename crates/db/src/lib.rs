//! Database drivers and the connection probe.

pub mod driver;
pub mod error;
pub mod mysql;
pub mod probe;
pub mod registry;

pub use driver::{ConnectionTarget, Credentials, Driver, DriverConnection};
pub use error::DbError;
pub use mysql::MySqlDriver;
pub use probe::{ConnectionProbe, ProbeOutcome};
pub use registry::DriverRegistry;
