//! MySQL/MariaDB dump source.
//!
//! Implements [`DumpSource`] with SQLx. Statements are sent with
//! [`sqlx::raw_sql`], which uses the text protocol, so every cell arrives in
//! the textual form the server would print and is read as raw bytes.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow, MySqlSslMode};
use sqlx::{Column, Row};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::SourceConfig;
use crate::core::identifier::quote_mysql;
use crate::core::{CreateTable, DumpSource, NullableValue, RowStream, ROW_CHANNEL_CAPACITY};
use crate::error::{DumpError, Result};

/// Connection pool timeout.
const POOL_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// MySQL/MariaDB source reader.
pub struct MysqlReader {
    pool: MySqlPool,
    database: String,
}

impl MysqlReader {
    /// Connect using the source configuration.
    pub async fn new(config: &SourceConfig) -> Result<Self> {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.database)
            .username(&config.user)
            .password(&config.password)
            .ssl_mode(MySqlSslMode::Preferred);

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(POOL_CONNECTION_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(|e| DumpError::connection(e, "creating MySQL source pool"))?;

        let reader = Self {
            pool,
            database: config.database.clone(),
        };
        reader.test_connection().await?;

        info!(
            "Connected to MySQL source: {}:{}/{}",
            config.host, config.port, config.database
        );

        Ok(reader)
    }

    /// Database this reader is connected to.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Test the database connection, returning the round-trip time.
    pub async fn test_connection(&self) -> Result<Duration> {
        let start = Instant::now();
        sqlx::raw_sql("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DumpError::connection(e, "testing MySQL connection"))?;
        Ok(start.elapsed())
    }

    /// Column names of `table` in ordinal order. Used as the column list of
    /// tables that return no rows.
    async fn load_columns(&self, table: &str, quoted: &str) -> Result<Vec<String>> {
        let sql = format!("SHOW COLUMNS FROM {}", quoted);
        let rows: Vec<MySqlRow> = sqlx::raw_sql(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DumpError::row_fetch(table, e))?;

        rows.iter()
            .map(|row| {
                raw_cell(row, 0)
                    .map_err(|e| e.to_string())
                    .and_then(|b| required_text("Field", b.as_deref()))
                    .map_err(|e| DumpError::row_fetch(table, e))
            })
            .collect()
    }
}

/// Read one cell as raw bytes. NULL is `None`.
fn raw_cell(row: &MySqlRow, idx: usize) -> std::result::Result<Option<Vec<u8>>, sqlx::Error> {
    row.try_get_unchecked::<Option<Vec<u8>>, _>(idx)
}

/// Convert one text-protocol cell. Bytes that are not UTF-8 are an error:
/// replacing them would silently change the dumped data.
fn decode_cell(column: &str, bytes: Option<&[u8]>) -> std::result::Result<NullableValue, String> {
    match bytes {
        None => Ok(NullableValue::null()),
        Some(b) => std::str::from_utf8(b).map(NullableValue::text).map_err(|e| {
            format!(
                "column {} is not valid UTF-8 (invalid byte at offset {})",
                column,
                e.valid_up_to()
            )
        }),
    }
}

/// A cell that must be present and textual, such as a table name.
fn required_text(column: &str, bytes: Option<&[u8]>) -> std::result::Result<String, String> {
    match decode_cell(column, bytes)?.raw() {
        Some(text) => Ok(text.to_string()),
        None => Err(format!("column {} is NULL", column)),
    }
}

/// Convert one row of cells, checking it against the expected columns.
fn decode_cells(
    columns: &[String],
    cells: &[Option<Vec<u8>>],
) -> std::result::Result<Vec<NullableValue>, String> {
    if cells.len() != columns.len() {
        return Err(format!(
            "row has {} values, expected {} columns",
            cells.len(),
            columns.len()
        ));
    }
    columns
        .iter()
        .zip(cells)
        .map(|(column, cell)| decode_cell(column, cell.as_deref()))
        .collect()
}

/// The result set must carry exactly the columns the stream was opened with,
/// in the same order, or transformers would be applied to the wrong values.
fn check_columns(expected: &[String], actual: &[&str]) -> std::result::Result<(), String> {
    if expected.len() == actual.len() && expected.iter().zip(actual).all(|(e, a)| e == a) {
        Ok(())
    } else {
        Err(format!(
            "result columns [{}] do not match table columns [{}]",
            actual.join(", "),
            expected.join(", ")
        ))
    }
}

/// Map the two cells of a `SHOW CREATE TABLE` row.
fn create_table_from_cells(
    requested: &str,
    name: Option<&[u8]>,
    ddl: Option<&[u8]>,
) -> Result<CreateTable> {
    let table = required_text("Table", name).map_err(|e| DumpError::ddl_fetch(requested, e))?;
    let ddl = required_text("Create Table", ddl).map_err(|e| DumpError::ddl_fetch(requested, e))?;
    Ok(CreateTable { table, ddl })
}

fn version_text(cell: Option<Vec<u8>>) -> Option<String> {
    cell.and_then(|b| String::from_utf8(b).ok())
}

fn decode_row(row: &MySqlRow, columns: &[String]) -> std::result::Result<Vec<NullableValue>, String> {
    let cells = (0..row.len())
        .map(|i| raw_cell(row, i))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| e.to_string())?;
    decode_cells(columns, &cells)
}

#[async_trait]
impl DumpSource for MysqlReader {
    async fn list_tables(&self) -> Result<Vec<String>> {
        let rows: Vec<MySqlRow> = sqlx::raw_sql("SHOW TABLES")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DumpError::Catalog(format!("SHOW TABLES: {}", e)))?;

        rows.iter()
            .map(|row| {
                raw_cell(row, 0)
                    .map_err(|e| e.to_string())
                    .and_then(|b| required_text("Tables", b.as_deref()))
                    .map_err(|e| DumpError::Catalog(format!("SHOW TABLES: {}", e)))
            })
            .collect()
    }

    async fn server_version(&self) -> Result<Option<String>> {
        let rows: Vec<MySqlRow> = sqlx::raw_sql("SELECT version()")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DumpError::Catalog(format!("SELECT version(): {}", e)))?;

        // No row, a NULL or an unreadable cell all mean "unknown"
        let cell = rows.first().and_then(|row| raw_cell(row, 0).ok().flatten());
        Ok(version_text(cell))
    }

    async fn show_create_table(&self, table: &str) -> Result<CreateTable> {
        let quoted = quote_mysql(table).map_err(|e| DumpError::ddl_fetch(table, e))?;
        let sql = format!("SHOW CREATE TABLE {}", quoted);

        let row = sqlx::raw_sql(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DumpError::ddl_fetch(table, e))?;

        let name = raw_cell(&row, 0).map_err(|e| DumpError::ddl_fetch(table, e))?;
        let ddl = raw_cell(&row, 1).map_err(|e| DumpError::ddl_fetch(table, e))?;
        create_table_from_cells(table, name.as_deref(), ddl.as_deref())
    }

    async fn select_all_rows(&self, table: &str) -> Result<RowStream> {
        let quoted = quote_mysql(table).map_err(|e| DumpError::row_fetch(table, e))?;
        let columns = self.load_columns(table, &quoted).await?;

        let (tx, rx) = mpsc::channel(ROW_CHANNEL_CAPACITY);
        let pool = self.pool.clone();
        let sql = format!("SELECT * FROM {}", quoted);
        let table_name = table.to_string();
        let expected = columns.clone();

        tokio::spawn(async move {
            let mut rows = sqlx::raw_sql(&sql).fetch(&pool);
            let mut count = 0usize;
            loop {
                let item = match rows.try_next().await {
                    Ok(Some(row)) => {
                        let checked = if count == 0 {
                            let names: Vec<&str> = row.columns().iter().map(|c| c.name()).collect();
                            check_columns(&expected, &names)
                        } else {
                            Ok(())
                        };
                        checked
                            .and_then(|_| decode_row(&row, &expected))
                            .map_err(|e| DumpError::row_fetch(&table_name, e))
                    }
                    Ok(None) => break,
                    Err(e) => Err(DumpError::row_fetch(&table_name, e)),
                };
                let failed = item.is_err();
                // A closed channel means the consumer gave up; stop reading.
                if tx.send(item).await.is_err() || failed {
                    break;
                }
                count += 1;
            }
            debug!("Reader for {} finished after {} rows", table_name, count);
        });

        Ok(RowStream::new(columns, rx))
    }

    fn db_type(&self) -> &str {
        "mysql"
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
