//! Single-table export: DDL plus serialized rows.

use tracing::debug;

use crate::core::{DumpSource, ValueCodec};
use crate::error::{DumpError, Result};
use crate::obfuscate::ColumnObfuscation;

use super::rows::RowSerializer;
use super::Table;

/// Exports one table at a time.
pub struct TableExporter<'a, S: ?Sized> {
    source: &'a S,
    codec: ValueCodec,
}

impl<'a, S: DumpSource + ?Sized> TableExporter<'a, S> {
    /// Create an exporter reading from `source`.
    pub fn new(source: &'a S, codec: ValueCodec) -> Self {
        Self { source, codec }
    }

    /// Fetch the DDL for `name`, guarding against the server answering for a
    /// different table.
    pub async fn create_table_sql(&self, name: &str) -> Result<String> {
        let created = self
            .source
            .show_create_table(name)
            .await
            .map_err(|e| match e {
                DumpError::DdlFetch { .. } => e,
                other => DumpError::ddl_fetch(name, other),
            })?;

        if created.table != name {
            return Err(DumpError::DdlMismatch {
                requested: name.to_string(),
                returned: created.table,
            });
        }

        Ok(created.ddl)
    }

    /// Export `name`. Row errors propagate with their kind unchanged.
    pub async fn export_table(
        &self,
        name: &str,
        obfuscation: Option<&ColumnObfuscation>,
    ) -> Result<Table> {
        let ddl = self.create_table_sql(name).await?;
        let values = RowSerializer::new(self.source, self.codec)
            .serialize_rows(name, obfuscation)
            .await?;

        debug!(
            "Exported table {} ({} obfuscated columns)",
            name,
            obfuscation.map_or(0, ColumnObfuscation::len)
        );

        Ok(Table {
            name: name.to_string(),
            ddl,
            values,
        })
    }
}
