//! Per-column value obfuscation.
//!
//! An [`ObfuscationMap`] is explicit configuration passed to each dump call:
//! table name → column name → [`ColumnTransformer`]. Transformers are named,
//! pure `&str -> String` functions. The [`TransformerRegistry`] resolves the
//! names used in YAML configuration to the built-in (or custom) functions.

mod transformers;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::error::{DumpError, Result};

pub use transformers::{hash_email, md5_hex, sha256_hex, HASH_EMAIL_DOMAIN, REDACTED};

type TransformFn = dyn Fn(&str) -> String + Send + Sync;

/// A named, pure string transformation applied to one column's values.
#[derive(Clone)]
pub struct ColumnTransformer {
    name: String,
    func: Arc<TransformFn>,
}

impl ColumnTransformer {
    /// Wrap a function as a transformer.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Name the transformer was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Transform one raw value.
    pub fn apply(&self, raw: &str) -> String {
        (self.func)(raw)
    }
}

impl fmt::Debug for ColumnTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnTransformer")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Transformers for the columns of a single table.
#[derive(Debug, Clone, Default)]
pub struct ColumnObfuscation {
    columns: HashMap<String, ColumnTransformer>,
}

impl ColumnObfuscation {
    /// Transformer registered for `column`, if any.
    pub fn get(&self, column: &str) -> Option<&ColumnTransformer> {
        self.columns.get(column)
    }

    /// Number of obfuscated columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True when no column of the table is obfuscated.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Table → column → transformer mapping, read-only during a dump.
///
/// A missing table or column means the value is written unchanged.
#[derive(Debug, Clone, Default)]
pub struct ObfuscationMap {
    tables: HashMap<String, ColumnObfuscation>,
}

impl ObfuscationMap {
    /// Create an empty map (no obfuscation).
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transformer for `table.column`, replacing any previous one.
    pub fn with_column(
        mut self,
        table: impl Into<String>,
        column: impl Into<String>,
        transformer: ColumnTransformer,
    ) -> Self {
        self.tables
            .entry(table.into())
            .or_default()
            .columns
            .insert(column.into(), transformer);
        self
    }

    /// Build from configuration, resolving transformer names in `registry`.
    pub fn from_config(
        config: &BTreeMap<String, BTreeMap<String, String>>,
        registry: &TransformerRegistry,
    ) -> Result<Self> {
        let mut map = Self::new();
        for (table, columns) in config {
            for (column, name) in columns {
                let transformer = registry.get(name).ok_or_else(|| {
                    DumpError::Config(format!(
                        "obfuscate.{}.{}: unknown transformer '{}' (known: {})",
                        table,
                        column,
                        name,
                        registry.names().join(", ")
                    ))
                })?;
                map = map.with_column(table.as_str(), column.as_str(), transformer);
            }
        }
        Ok(map)
    }

    /// Column transformers for `table`, if any are registered.
    pub fn for_table(&self, table: &str) -> Option<&ColumnObfuscation> {
        self.tables.get(table)
    }

    /// True when nothing is obfuscated.
    pub fn is_empty(&self) -> bool {
        self.tables.values().all(ColumnObfuscation::is_empty)
    }
}

/// Registry of named transformers.
///
/// Constructed explicitly and handed to [`ObfuscationMap::from_config`];
/// there is no global registry.
#[derive(Debug, Clone, Default)]
pub struct TransformerRegistry {
    transformers: HashMap<String, ColumnTransformer>,
}

impl TransformerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in transformers registered.
    ///
    /// - `md5`, `hash`: lower-hex MD5 digest
    /// - `sha256`: lower-hex SHA-256 digest
    /// - `hash-email`, `email`: first 16 MD5 hex chars at [`HASH_EMAIL_DOMAIN`]
    /// - `redact`: the constant [`REDACTED`]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_fn("md5", md5_hex);
        registry.register_fn("hash", md5_hex);
        registry.register_fn("sha256", sha256_hex);
        registry.register_fn("hash-email", hash_email);
        registry.register_fn("email", hash_email);
        registry.register_fn("redact", |_| REDACTED.to_string());
        registry
    }

    /// Register a transformer under its own name.
    pub fn register(&mut self, transformer: ColumnTransformer) {
        self.transformers
            .insert(transformer.name().to_string(), transformer);
    }

    /// Register a plain function under `name`.
    pub fn register_fn<F>(&mut self, name: &str, func: F)
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.register(ColumnTransformer::new(name, func));
    }

    /// Look up a transformer by name.
    pub fn get(&self, name: &str) -> Option<ColumnTransformer> {
        self.transformers.get(name).cloned()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.transformers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
