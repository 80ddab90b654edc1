//! Whole-database assembly.

use chrono::Local;
use tracing::{debug, info};

use crate::core::{DumpSource, ValueCodec};
use crate::error::Result;
use crate::obfuscate::ObfuscationMap;

use super::catalog::CatalogEnumerator;
use super::table::TableExporter;
use super::{DumpDocument, FORMAT_VERSION};

/// Timestamp layout written on the `Dump completed on` line.
pub const COMPLETION_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f %z";

/// Builds a [`DumpDocument`] from every table of a source.
///
/// All-or-nothing: the first failing table aborts assembly and its error is
/// returned as is. Nothing is retried and no partial document exists.
pub struct DumpAssembler<'a, S: ?Sized> {
    source: &'a S,
    codec: ValueCodec,
}

impl<'a, S: DumpSource + ?Sized> DumpAssembler<'a, S> {
    pub fn new(source: &'a S, codec: ValueCodec) -> Self {
        Self { source, codec }
    }

    /// Enumerate the catalog and assemble every table in catalog order.
    pub async fn assemble_all(&self, obfuscation: &ObfuscationMap) -> Result<DumpDocument> {
        let catalog = CatalogEnumerator::new(self.source);
        let server_version = catalog.server_version().await?;
        let tables = catalog.list_tables().await?;
        info!("Found {} tables to dump", tables.len());
        self.assemble_tables(server_version, &tables, obfuscation)
            .await
    }

    /// Assemble the given tables, in the given order.
    pub async fn assemble(
        &self,
        table_names: &[String],
        obfuscation: &ObfuscationMap,
    ) -> Result<DumpDocument> {
        let server_version = CatalogEnumerator::new(self.source)
            .server_version()
            .await?;
        self.assemble_tables(server_version, table_names, obfuscation)
            .await
    }

    async fn assemble_tables(
        &self,
        server_version: String,
        table_names: &[String],
        obfuscation: &ObfuscationMap,
    ) -> Result<DumpDocument> {
        let exporter = TableExporter::new(self.source, self.codec);
        let mut tables = Vec::with_capacity(table_names.len());

        for (i, name) in table_names.iter().enumerate() {
            debug!("[{}/{}] Dumping table {}", i + 1, table_names.len(), name);
            let table = exporter
                .export_table(name, obfuscation.for_table(name))
                .await?;
            tables.push(table);
        }

        Ok(DumpDocument {
            format_version: FORMAT_VERSION.to_string(),
            server_version,
            tables,
            completed_at: Local::now().format(COMPLETION_TIME_FORMAT).to_string(),
        })
    }
}
