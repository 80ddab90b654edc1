//! MySQL identifier checks for the statements a dump builds by hand.
//!
//! `SHOW CREATE TABLE`, `SHOW COLUMNS` and `SELECT *` take the table name
//! as part of the statement text, never as a bound parameter.

use crate::error::{DumpError, Result};

/// MySQL limit for table and column names, in characters.
const MAX_IDENTIFIER_CHARS: usize = 64;

/// Check that `name` is something MySQL could have created.
pub fn validate_identifier(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        "name is empty"
    } else if name.contains('\0') {
        "name contains a NUL character"
    } else if name.ends_with(' ') {
        "name ends with a space"
    } else if name.chars().count() > MAX_IDENTIFIER_CHARS {
        "name is longer than 64 characters"
    } else {
        return Ok(());
    };

    Err(DumpError::Config(format!("{}: {:?}", reason, name)))
}

/// Backtick-quote a validated table name; embedded backticks are doubled.
pub fn quote_mysql(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("`{}`", name.replace('`', "``")))
}
