//! MySQL/MariaDB database driver.
//!
//! - [`MysqlReader`]: [`DumpSource`](crate::core::DumpSource) over a SQLx pool
//!
//! # Feature Flag
//!
//! This module is only available when the `mysql` feature is enabled
//! (it is part of the default features).
//!
//! # Supported Versions
//!
//! - MySQL 5.7+, 8.0+
//! - MariaDB 10.2+

mod reader;

pub use reader::MysqlReader;
