//! The database capability consumed by the dump pipeline.
//!
//! - [`DumpSource`]: list tables, describe a table, read the server version,
//!   stream all rows of a table
//! - [`RowStream`]: column names plus a channel of decoded rows
//!
//! Connection pooling, retries and timeouts belong to the implementation;
//! the pipeline only issues one query at a time.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;

use super::value::NullableValue;

/// Rows buffered between the reader task and the serializer.
pub const ROW_CHANNEL_CAPACITY: usize = 1024;

/// Result of a `SHOW CREATE TABLE` lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTable {
    /// Table identifier reported by the server.
    pub table: String,
    /// The `CREATE TABLE` statement, without trailing semicolon.
    pub ddl: String,
}

/// All rows of one table, in fetch order.
///
/// The column list is fixed when the stream is opened. Dropping the stream
/// closes the channel, which stops the producer and releases its result set.
#[derive(Debug)]
pub struct RowStream {
    columns: Vec<String>,
    rows: mpsc::Receiver<Result<Vec<NullableValue>>>,
}

impl RowStream {
    /// Create a stream from a column list and a row receiver.
    pub fn new(columns: Vec<String>, rows: mpsc::Receiver<Result<Vec<NullableValue>>>) -> Self {
        Self { columns, rows }
    }

    /// Create a stream over rows that are already in memory.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Result<Vec<NullableValue>>>) -> Self {
        let (tx, rx) = mpsc::channel(rows.len().max(1));
        for row in rows {
            // Capacity covers every row, so this never fails.
            let _ = tx.try_send(row);
        }
        Self::new(columns, rx)
    }

    /// Column names in `SELECT *` order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Next row, or `None` once the table is exhausted.
    pub async fn next_row(&mut self) -> Option<Result<Vec<NullableValue>>> {
        self.rows.recv().await
    }
}

/// Read schema and data from a source database.
///
/// Each call acquires whatever result set it needs and releases it before
/// returning (or, for [`select_all_rows`](DumpSource::select_all_rows), when
/// the returned stream is dropped).
#[async_trait]
pub trait DumpSource: Send + Sync {
    /// Table names in the order the catalog returns them.
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Server version string. `None` when the server reports NULL or an
    /// unreadable value.
    async fn server_version(&self) -> Result<Option<String>>;

    /// Fetch the `CREATE TABLE` statement for `table`.
    async fn show_create_table(&self, table: &str) -> Result<CreateTable>;

    /// Start streaming every row of `table`.
    async fn select_all_rows(&self, table: &str) -> Result<RowStream>;

    /// Get the database type identifier (e.g., "mysql").
    fn db_type(&self) -> &str;

    /// Close the connection pool.
    async fn close(&self);
}

#[async_trait]
impl<T: DumpSource + ?Sized> DumpSource for Arc<T> {
    async fn list_tables(&self) -> Result<Vec<String>> {
        (**self).list_tables().await
    }

    async fn server_version(&self) -> Result<Option<String>> {
        (**self).server_version().await
    }

    async fn show_create_table(&self, table: &str) -> Result<CreateTable> {
        (**self).show_create_table(table).await
    }

    async fn select_all_rows(&self, table: &str) -> Result<RowStream> {
        (**self).select_all_rows(table).await
    }

    fn db_type(&self) -> &str {
        (**self).db_type()
    }

    async fn close(&self) {
        (**self).close().await
    }
}
