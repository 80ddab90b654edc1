//! In-memory [`DumpSource`] used by the unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::core::{CreateTable, DumpSource, NullableValue, RowStream};
use crate::error::{DumpError, Result};

#[derive(Debug, Clone)]
pub(crate) struct MemoryTable {
    pub name: String,
    pub ddl: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<NullableValue>>,
}

impl MemoryTable {
    pub fn new(name: &str, columns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            ddl: format!("CREATE TABLE `{}` (...)", name),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, cells: &[Option<&str>]) -> Self {
        self.rows.push(
            cells
                .iter()
                .map(|c| NullableValue::from(c.map(str::to_string)))
                .collect(),
        );
        self
    }
}

#[derive(Debug, Default)]
pub(crate) struct MemorySource {
    pub tables: Vec<MemoryTable>,
    pub version: Option<String>,
    /// Table name reported back by SHOW CREATE TABLE, keyed by requested name.
    pub ddl_aliases: HashMap<String, String>,
    /// Tables whose row stream yields a decode error after the first row.
    pub broken_rows: HashSet<String>,
    pub fail_catalog: bool,
    pub queries: AtomicUsize,
    pub closed: AtomicBool,
}

impl MemorySource {
    pub fn new(tables: Vec<MemoryTable>) -> Self {
        Self {
            tables,
            version: Some("8.0.36".to_string()),
            ..Self::default()
        }
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn table(&self, name: &str) -> Option<&MemoryTable> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.tables.iter().find(|t| t.name == name)
    }
}

#[async_trait]
impl DumpSource for MemorySource {
    async fn list_tables(&self) -> Result<Vec<String>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_catalog {
            return Err(DumpError::Catalog("SHOW TABLES failed".into()));
        }
        Ok(self.tables.iter().map(|t| t.name.clone()).collect())
    }

    async fn server_version(&self) -> Result<Option<String>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.version.clone())
    }

    async fn show_create_table(&self, table: &str) -> Result<CreateTable> {
        let t = self
            .table(table)
            .ok_or_else(|| DumpError::ddl_fetch(table, "Table doesn't exist"))?;
        let reported = self
            .ddl_aliases
            .get(table)
            .cloned()
            .unwrap_or_else(|| t.name.clone());
        Ok(CreateTable {
            table: reported,
            ddl: t.ddl.clone(),
        })
    }

    async fn select_all_rows(&self, table: &str) -> Result<RowStream> {
        let t = self
            .table(table)
            .ok_or_else(|| DumpError::row_fetch(table, "Table doesn't exist"))?;
        let mut rows: Vec<Result<Vec<NullableValue>>> = t.rows.iter().cloned().map(Ok).collect();
        if self.broken_rows.contains(table) {
            rows.truncate(1);
            rows.push(Err(DumpError::row_fetch(table, "malformed packet")));
        }
        Ok(RowStream::from_rows(t.columns.clone(), rows))
    }

    fn db_type(&self) -> &str {
        "memory"
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
