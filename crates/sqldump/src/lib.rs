//! # sqldump
//!
//! Logical MySQL dumps with per-column obfuscation.
//!
//! This library produces a single restorable SQL script containing the DDL
//! and data of every table in a database:
//!
//! - **Catalog order**: tables appear in the order the server lists them
//! - **All-or-nothing**: the first failing table aborts the dump
//! - **Obfuscation**: per-table, per-column transformers (hashes, fake
//!   emails, redaction) applied to non-NULL values before they are written
//! - **Safe output**: an existing dump is never overwritten; by default the
//!   file is published with an atomic rename
//!
//! ## Example
//!
//! ```rust,no_run
//! use sqldump::{Config, Dumper, MysqlReader, TransformerRegistry};
//!
//! #[tokio::main]
//! async fn main() -> sqldump::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let obfuscation = config.obfuscation(&TransformerRegistry::with_builtins())?;
//!     let reader = MysqlReader::new(&config.source).await?;
//!     let mut dumper = Dumper::new(reader, config.dump_options())?;
//!     let result = dumper.dump(&obfuscation).await?;
//!     println!("Dump written to {}", result.path.display());
//!     dumper.close().await
//! }
//! ```

pub mod config;
pub mod core;
pub mod drivers;
pub mod dump;
pub mod error;
pub mod obfuscate;
pub mod orchestrator;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenient access
pub use config::{Config, OutputConfig, SourceConfig};
pub use core::{CreateTable, DumpSource, NullableValue, QuoteStyle, RowStream, ValueCodec};
#[cfg(feature = "mysql")]
pub use drivers::MysqlReader;
pub use dump::{DumpAssembler, DumpDocument, Table};
pub use error::{DumpError, Result};
pub use obfuscate::{ColumnTransformer, ObfuscationMap, TransformerRegistry};
pub use orchestrator::{DumpOptions, DumpResult, Dumper};
