//! Database driver implementations.
//!
//! Each driver implements [`DumpSource`](crate::core::DumpSource) for one
//! database engine:
//!
//! - [`mysql`]: MySQL/MariaDB (feature `mysql`, enabled by default)
//!
//! # Adding New Databases
//!
//! 1. Create a new module under `drivers/`
//! 2. Implement `DumpSource` (list/describe/version/select-all)
//! 3. Gate the driver with a feature flag in `Cargo.toml`

#[cfg(feature = "mysql")]
pub mod mysql;

#[cfg(feature = "mysql")]
pub use mysql::MysqlReader;
