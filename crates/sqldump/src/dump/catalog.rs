//! Catalog enumeration: table names and server version.

use crate::core::DumpSource;
use crate::error::{DumpError, Result};

/// Reads the table list and server version from a source.
pub struct CatalogEnumerator<'a, S: ?Sized> {
    source: &'a S,
}

impl<'a, S: DumpSource + ?Sized> CatalogEnumerator<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Table names, verbatim and in catalog order. An empty list is valid.
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        self.source.list_tables().await.map_err(into_catalog_error)
    }

    /// Server version text; empty when the server reports none.
    pub async fn server_version(&self) -> Result<String> {
        let version = self
            .source
            .server_version()
            .await
            .map_err(into_catalog_error)?;
        Ok(version.unwrap_or_default())
    }
}

fn into_catalog_error(e: DumpError) -> DumpError {
    match e {
        DumpError::Catalog(_) => e,
        other => DumpError::Catalog(other.to_string()),
    }
}
