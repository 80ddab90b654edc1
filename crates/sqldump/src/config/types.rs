//! Configuration type definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::QuoteStyle;

/// Placeholder in `output.filename_format` replaced by the database name.
pub const DATABASE_PLACEHOLDER: &str = "{database}";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source database configuration (MySQL).
    pub source: SourceConfig,

    /// Where and how the dump file is written.
    #[serde(default)]
    pub output: OutputConfig,

    /// Per-table, per-column transformer names.
    #[serde(default)]
    pub obfuscate: BTreeMap<String, BTreeMap<String, String>>,
}

/// Source database (MySQL) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Database type (always "mysql" for now).
    #[serde(default = "default_mysql")]
    pub r#type: String,

    /// Database host (default: 127.0.0.1).
    #[serde(default = "default_host")]
    pub host: String,

    /// Database port (default: 3306).
    #[serde(default = "default_mysql_port")]
    pub port: u16,

    /// Database name.
    #[serde(default)]
    pub database: String,

    /// Username (default: root).
    #[serde(default = "default_user")]
    pub user: String,

    /// Password. Never serialized.
    #[serde(default, skip_serializing)]
    pub password: String,

    /// Pool size. The dump issues one query at a time, so 1 is enough.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("type", &self.r#type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// Output file configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory the dump is written to. Must already exist.
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// chrono strftime pattern for the file name (without `.sql`).
    /// `{database}` is replaced by the source database name.
    #[serde(default = "default_filename_format")]
    pub filename_format: String,

    /// Write to a temporary file and rename it into place on success
    /// (default: true). When false the target is created before the dump
    /// starts and a failed dump leaves a partial file behind.
    #[serde(default = "default_true")]
    pub atomic_write: bool,

    /// Escape quotes and backslashes in values (default: false).
    /// Changes the output format for affected values.
    #[serde(default)]
    pub escape_values: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            filename_format: default_filename_format(),
            atomic_write: true,
            escape_values: false,
        }
    }
}

impl OutputConfig {
    /// File name pattern with the database placeholder substituted.
    pub fn filename_pattern(&self, database: &str) -> String {
        self.filename_format.replace(DATABASE_PLACEHOLDER, database)
    }

    /// Value quoting selected by `escape_values`.
    pub fn quote_style(&self) -> QuoteStyle {
        if self.escape_values {
            QuoteStyle::Escaped
        } else {
            QuoteStyle::Raw
        }
    }
}

// Default value functions for serde
fn default_mysql() -> String {
    "mysql".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_mysql_port() -> u16 {
    3306
}

fn default_user() -> String {
    "root".to_string()
}

fn default_max_connections() -> u32 {
    1
}

fn default_directory() -> PathBuf {
    PathBuf::from("dumps")
}

fn default_filename_format() -> String {
    format!("{}-%Y.%m.%d_%H.%M.%S", DATABASE_PLACEHOLDER)
}

fn default_true() -> bool {
    true
}
