//! Cell values and their literal encoding.
//!
//! Every cell is fetched in its textual form, so a value is either SQL NULL
//! or a string. [`ValueCodec`] turns one cell into the literal that appears
//! inside an `INSERT ... VALUES` tuple.

use crate::obfuscate::ColumnTransformer;

/// One fetched cell: NULL or its raw text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NullableValue {
    raw: Option<String>,
}

impl NullableValue {
    /// A NULL cell.
    #[must_use]
    pub fn null() -> Self {
        Self { raw: None }
    }

    /// A non-NULL cell with the given text.
    #[must_use]
    pub fn text(raw: impl Into<String>) -> Self {
        Self {
            raw: Some(raw.into()),
        }
    }

    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.raw.is_none()
    }

    /// Raw text, `None` for NULL.
    #[must_use]
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }
}

impl From<Option<String>> for NullableValue {
    fn from(raw: Option<String>) -> Self {
        Self { raw }
    }
}

impl From<&str> for NullableValue {
    fn from(v: &str) -> Self {
        Self::text(v)
    }
}

/// How non-NULL literals are quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuoteStyle {
    /// Wrap in single quotes without escaping anything.
    ///
    /// This is the historical dump format. A value containing `'` or `\`
    /// produces a document that cannot be restored.
    #[default]
    Raw,

    /// Wrap in single quotes and escape the value the way MySQL string
    /// literals require. Changes the output for affected values.
    Escaped,
}

/// Encodes single cells into SQL literal text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueCodec {
    quoting: QuoteStyle,
}

impl ValueCodec {
    /// Create a codec with the given quoting.
    pub fn new(quoting: QuoteStyle) -> Self {
        Self { quoting }
    }

    /// Quoting used by this codec.
    pub fn quoting(&self) -> QuoteStyle {
        self.quoting
    }

    /// Encode one cell.
    ///
    /// NULL always renders as the bare literal `null` and is never passed to
    /// the transformer. Otherwise the transformer (if any) is applied to the
    /// raw text before quoting.
    #[must_use]
    pub fn encode(&self, value: &NullableValue, transform: Option<&ColumnTransformer>) -> String {
        let Some(raw) = value.raw() else {
            return "null".to_string();
        };

        let text = match transform {
            Some(t) => t.apply(raw),
            None => raw.to_string(),
        };

        match self.quoting {
            QuoteStyle::Raw => format!("'{}'", text),
            QuoteStyle::Escaped => format!("'{}'", escape_mysql_string(&text)),
        }
    }
}

/// Escape a string for use inside a single-quoted MySQL literal.
pub fn escape_mysql_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\0' => out.push_str("\\0"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x1a' => out.push_str("\\Z"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upper() -> ColumnTransformer {
        ColumnTransformer::new("upper", |s| s.to_uppercase())
    }

    #[test]
    fn test_null_is_unquoted_and_untransformed() {
        let codec = ValueCodec::default();
        let t = upper();
        assert_eq!(codec.encode(&NullableValue::null(), None), "null");
        assert_eq!(codec.encode(&NullableValue::null(), Some(&t)), "null");
    }

    #[test]
    fn test_text_is_single_quoted() {
        let codec = ValueCodec::default();
        assert_eq!(codec.encode(&"42".into(), None), "'42'");
        assert_eq!(codec.encode(&"".into(), None), "''");
        // The literal string "null" is still data
        assert_eq!(codec.encode(&"null".into(), None), "'null'");
    }

    #[test]
    fn test_transform_applies_before_quoting() {
        let codec = ValueCodec::default();
        let t = upper();
        assert_eq!(codec.encode(&"a@x.com".into(), Some(&t)), "'A@X.COM'");
    }

    #[test]
    fn test_encode_is_deterministic() {
        let codec = ValueCodec::default();
        let t = upper();
        let v = NullableValue::text("same");
        assert_eq!(codec.encode(&v, Some(&t)), codec.encode(&v, Some(&t)));
    }

    #[test]
    fn test_raw_style_does_not_escape() {
        let codec = ValueCodec::new(QuoteStyle::Raw);
        assert_eq!(codec.encode(&"O'Brien".into(), None), "'O'Brien'");
    }

    #[test]
    fn test_escaped_style() {
        let codec = ValueCodec::new(QuoteStyle::Escaped);
        assert_eq!(codec.encode(&"O'Brien".into(), None), "'O\\'Brien'");
        assert_eq!(codec.encode(&"a\\b".into(), None), "'a\\\\b'");
        assert_eq!(codec.encode(&"line\nbreak".into(), None), "'line\\nbreak'");
        assert_eq!(codec.encode(&NullableValue::null(), None), "null");
    }

    #[test]
    fn test_escape_applies_to_transformed_text() {
        let codec = ValueCodec::new(QuoteStyle::Escaped);
        let t = ColumnTransformer::new("quote", |_| "it's".to_string());
        assert_eq!(codec.encode(&"x".into(), Some(&t)), "'it\\'s'");
    }
}
