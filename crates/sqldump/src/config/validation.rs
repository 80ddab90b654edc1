//! Configuration validation.

use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use chrono::Utc;

use super::Config;
use crate::core::identifier::validate_identifier;
use crate::error::{DumpError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Source validation
    if config.source.host.is_empty() {
        return Err(DumpError::Config("source.host is required".into()));
    }
    if config.source.database.is_empty() {
        return Err(DumpError::Config("source.database is required".into()));
    }
    if config.source.user.is_empty() {
        return Err(DumpError::Config("source.user is required".into()));
    }
    if config.source.r#type != "mysql" {
        return Err(DumpError::Config(format!(
            "source.type must be 'mysql', got '{}'",
            config.source.r#type
        )));
    }
    if config.source.max_connections == 0 {
        return Err(DumpError::Config(
            "source.max_connections must be at least 1".into(),
        ));
    }

    // Output validation
    let pattern = config.output.filename_pattern(&config.source.database);
    validate_filename_pattern(&pattern)?;

    // Obfuscation keys are table/column identifiers
    for (table, columns) in &config.obfuscate {
        validate_identifier(table)
            .map_err(|e| DumpError::Config(format!("obfuscate: invalid table name: {}", e)))?;
        for column in columns.keys() {
            validate_identifier(column).map_err(|e| {
                DumpError::Config(format!("obfuscate.{}: invalid column name: {}", table, e))
            })?;
        }
    }

    Ok(())
}

/// Check that a file name pattern is a usable strftime pattern.
pub fn validate_filename_pattern(pattern: &str) -> Result<()> {
    if pattern.trim().is_empty() {
        return Err(DumpError::Config(
            "output.filename_format cannot be empty".into(),
        ));
    }
    if has_path_separator(pattern) {
        return Err(DumpError::Config(format!(
            "output.filename_format must not contain a path separator: {:?}",
            pattern
        )));
    }
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(DumpError::Config(format!(
            "output.filename_format is not a valid strftime pattern: {:?}",
            pattern
        )));
    }

    // %D, %x and friends expand to text containing '/'
    let mut sample = String::new();
    write!(
        sample,
        "{}",
        Utc::now().format_with_items(StrftimeItems::new(pattern))
    )
    .map_err(|_| {
        DumpError::Config(format!(
            "output.filename_format cannot be formatted: {:?}",
            pattern
        ))
    })?;
    if has_path_separator(&sample) {
        return Err(DumpError::Config(format!(
            "output.filename_format expands to a path ({:?}): {:?}",
            sample, pattern
        )));
    }
    Ok(())
}

/// True if `name` would not stay a single file name inside a directory.
pub fn has_path_separator(name: &str) -> bool {
    name.contains('/') || name.contains('\\')
}
