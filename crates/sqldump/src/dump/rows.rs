//! Row serialization: one table's rows into a `VALUES` fragment.

use tracing::debug;

use crate::core::{DumpSource, ValueCodec};
use crate::error::{DumpError, Result};
use crate::obfuscate::{ColumnObfuscation, ColumnTransformer};

/// Turns every row of a table into `(v1,v2,...),(v1,v2,...)`.
pub struct RowSerializer<'a, S: ?Sized> {
    source: &'a S,
    codec: ValueCodec,
}

impl<'a, S: DumpSource + ?Sized> RowSerializer<'a, S> {
    /// Create a serializer reading from `source`.
    pub fn new(source: &'a S, codec: ValueCodec) -> Self {
        Self { source, codec }
    }

    /// Serialize all rows of `table`.
    ///
    /// Cells keep the column order reported when the stream was opened.
    /// Returns an empty string for a table without rows. A table without
    /// columns is an [`DumpError::EmptySchema`]; a row whose width differs
    /// from the column list is a [`DumpError::RowFetch`]. No partial
    /// fragment is ever returned.
    pub async fn serialize_rows(
        &self,
        table: &str,
        obfuscation: Option<&ColumnObfuscation>,
    ) -> Result<String> {
        let mut stream = self.source.select_all_rows(table).await?;

        let columns = stream.columns().to_vec();
        if columns.is_empty() {
            return Err(DumpError::EmptySchema(table.to_string()));
        }

        let transforms: Vec<Option<&ColumnTransformer>> = columns
            .iter()
            .map(|column| obfuscation.and_then(|o| o.get(column)))
            .collect();

        let mut fragment = String::new();
        let mut row_count = 0usize;

        while let Some(row) = stream.next_row().await {
            let row = row?;
            if row.len() != columns.len() {
                return Err(DumpError::row_fetch(
                    table,
                    format!(
                        "row {} has {} values, expected {} columns",
                        row_count + 1,
                        row.len(),
                        columns.len()
                    ),
                ));
            }

            if row_count > 0 {
                fragment.push(',');
            }
            fragment.push('(');
            for (i, (value, transform)) in row.iter().zip(&transforms).enumerate() {
                if i > 0 {
                    fragment.push(',');
                }
                fragment.push_str(&self.codec.encode(value, *transform));
            }
            fragment.push(')');
            row_count += 1;
        }

        debug!(
            "Serialized {} rows from {} ({} bytes)",
            row_count,
            table,
            fragment.len()
        );

        Ok(fragment)
    }
}
