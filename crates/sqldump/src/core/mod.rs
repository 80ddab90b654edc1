//! Core abstractions shared by the dump pipeline and the drivers.
//!
//! - [`value`]: fetched cells and their literal encoding
//! - [`traits`]: the [`DumpSource`] capability and [`RowStream`]
//! - [`identifier`]: identifier validation and quoting

pub mod identifier;
pub mod traits;
pub mod value;

pub use traits::{CreateTable, DumpSource, RowStream, ROW_CHANNEL_CAPACITY};
pub use value::{escape_mysql_string, NullableValue, QuoteStyle, ValueCodec};
