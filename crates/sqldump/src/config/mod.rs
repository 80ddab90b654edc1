//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;
pub use validation::{has_path_separator, validate_filename_pattern};

use std::path::Path;

use crate::error::Result;
use crate::obfuscate::{ObfuscationMap, TransformerRegistry};
use crate::orchestrator::DumpOptions;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// Resolve the `obfuscate` section against `registry`.
    pub fn obfuscation(&self, registry: &TransformerRegistry) -> Result<ObfuscationMap> {
        ObfuscationMap::from_config(&self.obfuscate, registry)
    }

    /// Dump options derived from the `output` section.
    pub fn dump_options(&self) -> DumpOptions {
        DumpOptions::new(
            self.output.directory.clone(),
            self.output.filename_pattern(&self.source.database),
        )
        .with_atomic_write(self.output.atomic_write)
        .with_quoting(self.output.quote_style())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::QuoteStyle;
    use crate::error::DumpError;

    const YAML: &str = r#"
source:
  host: db.internal
  database: shop
  user: dumper
  password: secret
output:
  directory: /var/backups
  escape_values: true
obfuscate:
  user:
    username: md5
    email: hash-email
"#;

    #[test]
    fn test_from_yaml_with_defaults() {
        let config = Config::from_yaml(YAML).unwrap();
        assert_eq!(config.source.r#type, "mysql");
        assert_eq!(config.source.port, 3306);
        assert_eq!(config.source.max_connections, 1);
        assert!(config.output.atomic_write);
        assert_eq!(
            config.output.filename_pattern(&config.source.database),
            "shop-%Y.%m.%d_%H.%M.%S"
        );
    }

    #[test]
    fn test_dump_options() {
        let config = Config::from_yaml(YAML).unwrap();
        let options = config.dump_options();
        assert_eq!(options.directory, Path::new("/var/backups"));
        assert_eq!(options.filename_format, "shop-%Y.%m.%d_%H.%M.%S");
        assert!(options.atomic_write);
        assert_eq!(options.quoting, QuoteStyle::Escaped);
    }

    #[test]
    fn test_obfuscation_section() {
        let config = Config::from_yaml(YAML).unwrap();
        let map = config
            .obfuscation(&TransformerRegistry::with_builtins())
            .unwrap();
        let user = map.for_table("user").unwrap();
        assert_eq!(user.get("email").unwrap().name(), "hash-email");
        assert!(user.get("auth_key").is_none());
    }

    #[test]
    fn test_empty_yaml_is_error() {
        assert!(matches!(Config::from_yaml(""), Err(DumpError::Yaml(_))));
    }

    #[test]
    fn test_missing_database_is_config_error() {
        let err = Config::from_yaml("source:\n  host: localhost\n").unwrap_err();
        assert!(matches!(err, DumpError::Config(_)));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = Config::load("definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, DumpError::Io(_)));
    }
}
