//! The export pipeline.
//!
//! Leaves first:
//!
//! - [`RowSerializer`]: all rows of one table → one `VALUES` fragment
//! - [`TableExporter`]: DDL + rows of one table → [`Table`]
//! - [`CatalogEnumerator`]: table list and server version
//! - [`DumpAssembler`]: every table, in catalog order → [`DumpDocument`]
//! - [`template`]: pure rendering of a [`DumpDocument`] to text
//!
//! Everything runs sequentially; each stage issues at most one query at a
//! time and the first error aborts the whole dump.

mod assembler;
mod catalog;
mod rows;
mod table;
pub mod template;

pub use assembler::{DumpAssembler, COMPLETION_TIME_FORMAT};
pub use catalog::CatalogEnumerator;
pub use rows::RowSerializer;
pub use table::TableExporter;

/// Version of the dump document layout.
pub const FORMAT_VERSION: &str = "0.2.3";

/// One exported table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Table name as enumerated from the catalog.
    pub name: String,
    /// `CREATE TABLE` statement without trailing semicolon.
    pub ddl: String,
    /// Comma-joined row tuples; empty when the table has no rows.
    pub values: String,
}

impl Table {
    /// True when the table contributes an `INSERT` statement.
    pub fn has_rows(&self) -> bool {
        !self.values.is_empty()
    }
}

/// A fully assembled dump, ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpDocument {
    /// Layout version written in the header.
    pub format_version: String,
    /// Server version text, empty when unknown.
    pub server_version: String,
    /// Tables in catalog enumeration order.
    pub tables: Vec<Table>,
    /// When the last table finished exporting.
    pub completed_at: String,
}

impl DumpDocument {
    /// Render the document text.
    pub fn render(&self) -> String {
        template::render(self)
    }
}
