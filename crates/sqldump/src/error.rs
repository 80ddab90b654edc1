//! Error types for the dump library.

use std::path::PathBuf;

use thiserror::Error;

/// Exit code for configuration errors (invalid YAML, missing fields, bad directory).
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code for connection failures.
pub const EXIT_CONNECTION_ERROR: u8 = 2;
/// Exit code for catalog, DDL or row read failures.
pub const EXIT_SOURCE_ERROR: u8 = 3;
/// Exit code when the dump file already exists.
pub const EXIT_ALREADY_EXISTS: u8 = 4;
/// Exit code for render or write failures.
pub const EXIT_RENDER_ERROR: u8 = 5;
/// Exit code when the dumper was used after close.
pub const EXIT_CLOSED: u8 = 6;
/// Exit code for IO errors (config file not found, etc.)
pub const EXIT_IO_ERROR: u8 = 7;

/// Main error type for dump operations.
///
/// Every variant aborts the whole dump; there is no per-table skip.
#[derive(Error, Debug)]
pub enum DumpError {
    /// Configuration error (invalid YAML, missing fields, invalid output directory)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection pool error with context
    #[error("Connection error: {message}\n  Context: {context}")]
    Connection { message: String, context: String },

    /// The target dump file is already present
    #[error("Dump '{}' already exists", .0.display())]
    AlreadyExists(PathBuf),

    /// Table list or server version could not be read
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// SHOW CREATE TABLE failed
    #[error("Failed to fetch DDL for table {table}: {message}")]
    DdlFetch { table: String, message: String },

    /// SHOW CREATE TABLE answered for a different table
    #[error("Returned table {returned} is not the same as requested table {requested}")]
    DdlMismatch { requested: String, returned: String },

    /// Row stream could not be opened or a row could not be decoded
    #[error("Failed to fetch rows for table {table}: {message}")]
    RowFetch { table: String, message: String },

    /// Table reported zero columns
    #[error("No columns in table {0}")]
    EmptySchema(String),

    /// Document assembly or write failed
    #[error("Render error: {0}")]
    Render(String),

    /// The dumper's database handle has been released
    #[error("Dumper is closed")]
    Closed,

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl DumpError {
    /// Create a Connection error with context about where it occurred
    pub fn connection(message: impl ToString, context: impl Into<String>) -> Self {
        DumpError::Connection {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create a DdlFetch error
    pub fn ddl_fetch(table: impl Into<String>, message: impl ToString) -> Self {
        DumpError::DdlFetch {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Create a RowFetch error
    pub fn row_fetch(table: impl Into<String>, message: impl ToString) -> Self {
        DumpError::RowFetch {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            DumpError::Config(_) | DumpError::Yaml(_) => EXIT_CONFIG_ERROR,
            DumpError::Connection { .. } => EXIT_CONNECTION_ERROR,
            DumpError::Catalog(_)
            | DumpError::DdlFetch { .. }
            | DumpError::DdlMismatch { .. }
            | DumpError::RowFetch { .. }
            | DumpError::EmptySchema(_) => EXIT_SOURCE_ERROR,
            DumpError::AlreadyExists(_) => EXIT_ALREADY_EXISTS,
            DumpError::Render(_) => EXIT_RENDER_ERROR,
            DumpError::Closed => EXIT_CLOSED,
            DumpError::Io(_) => EXIT_IO_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for dump operations.
pub type Result<T> = std::result::Result<T, DumpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(DumpError::Config("x".into()).exit_code(), EXIT_CONFIG_ERROR);
        assert_eq!(
            DumpError::AlreadyExists(PathBuf::from("a.sql")).exit_code(),
            EXIT_ALREADY_EXISTS
        );
        assert_eq!(
            DumpError::ddl_fetch("user", "boom").exit_code(),
            EXIT_SOURCE_ERROR
        );
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert_eq!(DumpError::from(io).exit_code(), EXIT_IO_ERROR);
    }

    #[test]
    fn test_messages_carry_table_name() {
        let err = DumpError::row_fetch("orders", "connection reset");
        assert_eq!(
            err.to_string(),
            "Failed to fetch rows for table orders: connection reset"
        );

        let err = DumpError::DdlMismatch {
            requested: "user".into(),
            returned: "users".into(),
        };
        assert!(err.to_string().contains("requested table user"));
    }

    #[test]
    fn test_format_detailed_includes_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let detailed = DumpError::from(io).format_detailed();
        assert!(detailed.starts_with("Error: IO error: denied"));
    }
}
