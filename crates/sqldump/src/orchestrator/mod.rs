//! Dump orchestrator - owns the database handle and the output file.

use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::format::StrftimeItems;
use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{has_path_separator, validate_filename_pattern};
use crate::core::{DumpSource, QuoteStyle, ValueCodec};
use crate::dump::{DumpAssembler, DumpDocument};
use crate::error::{DumpError, Result};
use crate::obfuscate::ObfuscationMap;

/// Where and how a dump file is written.
#[derive(Debug, Clone)]
pub struct DumpOptions {
    /// Existing directory that receives the dump.
    pub directory: PathBuf,
    /// chrono strftime pattern for the file name, without the `.sql` suffix.
    pub filename_format: String,
    /// Publish through a temporary file and no-clobber rename.
    pub atomic_write: bool,
    /// Literal quoting for cell values.
    pub quoting: QuoteStyle,
}

impl DumpOptions {
    /// Options with atomic writes and the historical (unescaped) quoting.
    pub fn new(directory: impl Into<PathBuf>, filename_format: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            filename_format: filename_format.into(),
            atomic_write: true,
            quoting: QuoteStyle::Raw,
        }
    }

    pub fn with_atomic_write(mut self, atomic: bool) -> Self {
        self.atomic_write = atomic;
        self
    }

    pub fn with_quoting(mut self, quoting: QuoteStyle) -> Self {
        self.quoting = quoting;
        self
    }
}

/// Result of a successful dump.
#[derive(Debug, Clone, Serialize)]
pub struct DumpResult {
    /// Path of the written dump.
    pub path: PathBuf,
    /// Number of tables in the dump.
    pub tables: usize,
    /// Size of the dump in bytes.
    pub bytes: usize,
    /// Total duration in seconds.
    pub duration_seconds: f64,
}

/// Dump orchestrator.
///
/// Owns the [`DumpSource`] for its whole lifetime. Dumps run one at a time
/// (`&self` methods never overlap queries) and all-or-nothing: an existing
/// target is never overwritten, and any error aborts the dump.
pub struct Dumper<S: DumpSource> {
    source: Option<S>,
    options: DumpOptions,
}

impl<S: DumpSource> Dumper<S> {
    /// Create a dumper. The output directory must already exist.
    pub fn new(source: S, options: DumpOptions) -> Result<Self> {
        if !options.directory.is_dir() {
            return Err(DumpError::Config(format!(
                "invalid directory: {}",
                options.directory.display()
            )));
        }
        validate_filename_pattern(&options.filename_format)?;

        Ok(Self {
            source: Some(source),
            options,
        })
    }

    /// Options this dumper was created with.
    pub fn options(&self) -> &DumpOptions {
        &self.options
    }

    /// The underlying source, or [`DumpError::Closed`] after [`close`](Self::close).
    pub fn source(&self) -> Result<&S> {
        self.source.as_ref().ok_or(DumpError::Closed)
    }

    /// Output path for a dump started at `at`.
    pub fn output_path(&self, at: DateTime<Local>) -> Result<PathBuf> {
        let mut name = String::new();
        write!(
            name,
            "{}",
            at.format_with_items(StrftimeItems::new(&self.options.filename_format))
        )
        .map_err(|_| {
            DumpError::Config(format!(
                "invalid filename format: {:?}",
                self.options.filename_format
            ))
        })?;
        if has_path_separator(&name) {
            return Err(DumpError::Config(format!(
                "filename format {:?} expands to a path: {:?}",
                self.options.filename_format, name
            )));
        }

        Ok(self.options.directory.join(format!("{}.sql", name)))
    }

    /// Dump the whole database, naming the file after the current time.
    pub async fn dump(&self, obfuscation: &ObfuscationMap) -> Result<DumpResult> {
        self.dump_at(obfuscation, Local::now()).await
    }

    /// Dump the whole database, naming the file after `at`.
    pub async fn dump_at(
        &self,
        obfuscation: &ObfuscationMap,
        at: DateTime<Local>,
    ) -> Result<DumpResult> {
        let source = self.source()?;
        let path = self.output_path(at)?;

        if path.exists() {
            return Err(DumpError::AlreadyExists(path));
        }

        let start = Instant::now();
        info!(
            "Starting dump of {} source to {}",
            source.db_type(),
            path.display()
        );

        let assembler = DumpAssembler::new(source, ValueCodec::new(self.options.quoting));

        let (tables, bytes) = if self.options.atomic_write {
            let doc = assembler.assemble_all(obfuscation).await?;
            let rendered = doc.render();
            write_atomic(&path, rendered.as_bytes())?;
            (doc.tables.len(), rendered.len())
        } else {
            let mut file = create_new(&path)?;
            let written = assemble_into(&assembler, obfuscation, &mut file).await;
            if written.is_err() {
                warn!("Dump failed; partial file may remain at {}", path.display());
            }
            written?
        };

        let duration_seconds = start.elapsed().as_secs_f64();
        info!(
            "Dump completed: {} tables, {} bytes in {:.2}s -> {}",
            tables,
            bytes,
            duration_seconds,
            path.display()
        );

        Ok(DumpResult {
            path,
            tables,
            bytes,
            duration_seconds,
        })
    }

    /// Release the database handle. A second call, or any dump after it,
    /// fails with [`DumpError::Closed`].
    pub async fn close(&mut self) -> Result<()> {
        let source = self.source.take().ok_or(DumpError::Closed)?;
        source.close().await;
        info!("Closed {} source", source.db_type());
        Ok(())
    }
}

async fn assemble_into<S: DumpSource + ?Sized>(
    assembler: &DumpAssembler<'_, S>,
    obfuscation: &ObfuscationMap,
    file: &mut std::fs::File,
) -> Result<(usize, usize)> {
    let doc: DumpDocument = assembler.assemble_all(obfuscation).await?;
    let rendered = doc.render();
    file.write_all(rendered.as_bytes())
        .and_then(|_| file.sync_all())
        .map_err(|e| DumpError::Render(format!("writing dump: {}", e)))?;
    Ok((doc.tables.len(), rendered.len()))
}

fn create_new(path: &Path) -> Result<std::fs::File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => DumpError::AlreadyExists(path.to_path_buf()),
            _ => DumpError::Io(e),
        })
}

/// Write `contents` to a temporary file next to `path`, then rename it into
/// place only if `path` still does not exist.
fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".sqldump-")
        .suffix(".tmp")
        .tempfile_in(dir)?;

    tmp.write_all(contents)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| DumpError::Render(format!("writing dump: {}", e)))?;

    tmp.persist_noclobber(path).map_err(|e| match e.error.kind() {
        ErrorKind::AlreadyExists => DumpError::AlreadyExists(path.to_path_buf()),
        _ => DumpError::Render(format!("publishing dump: {}", e.error)),
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obfuscate::{md5_hex, ColumnTransformer};
    use crate::testing::{MemorySource, MemoryTable};
    use chrono::TimeZone;
    use std::sync::atomic::Ordering;

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap()
    }

    fn dumper(dir: &Path, source: MemorySource) -> Dumper<MemorySource> {
        Dumper::new(source, DumpOptions::new(dir, "app-%Y.%m.%d_%H.%M.%S")).unwrap()
    }

    fn two_tables() -> MemorySource {
        MemorySource::new(vec![
            MemoryTable::new("user", &["id", "email"]).row(&[Some("1"), Some("a@x.com")]),
            MemoryTable::new("empty_table", &["id"]),
        ])
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_output_path() {
        let dir = tempfile::tempdir().unwrap();
        let dumper = dumper(dir.path(), MemorySource::new(Vec::new()));
        assert_eq!(
            dumper.output_path(at()).unwrap(),
            dir.path().join("app-2024.05.06_07.08.09.sql")
        );
    }

    #[test]
    fn test_invalid_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = Dumper::new(MemorySource::new(Vec::new()), DumpOptions::new(missing, "x"))
            .err()
            .unwrap();
        assert!(matches!(err, DumpError::Config(ref m) if m.contains("invalid directory")));
    }

    #[tokio::test]
    async fn test_filename_format_expanding_to_a_path_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = Dumper::new(two_tables(), DumpOptions::new(dir.path(), "app-%D"))
            .err()
            .unwrap();
        assert!(matches!(err, DumpError::Config(_)));

        // Options built by hand bypass `new`; the path check still holds
        let mut dumper = dumper(dir.path(), two_tables());
        dumper.options.filename_format = "app-%x".to_string();
        assert!(matches!(dumper.output_path(at()), Err(DumpError::Config(_))));
        let err = dumper.dump_at(&ObfuscationMap::new(), at()).await.unwrap_err();
        assert!(matches!(err, DumpError::Config(_)));
        assert_eq!(dumper.source().unwrap().query_count(), 0);
        assert!(entries(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_end_to_end_with_obfuscation() {
        let dir = tempfile::tempdir().unwrap();
        let dumper = dumper(dir.path(), two_tables());
        let f = |s: &str| format!("{}@obfuscated", md5_hex(s));
        let map = ObfuscationMap::new().with_column("user", "email", ColumnTransformer::new("f", f));

        let result = dumper.dump_at(&map, at()).await.unwrap();
        assert_eq!(result.tables, 2);
        assert_eq!(result.path, dir.path().join("app-2024.05.06_07.08.09.sql"));

        let text = std::fs::read_to_string(&result.path).unwrap();
        assert_eq!(text.len(), result.bytes);
        assert!(text.contains(&format!("INSERT INTO user VALUES ('1','{}');", f("a@x.com"))));
        assert!(!text.contains("a@x.com"));
        assert!(!text.contains("INSERT INTO empty_table"));
        assert!(text.contains("LOCK TABLES empty_table WRITE;"));
        assert!(text.contains("-- Server version\t8.0.36"));

        // Only the published dump is left behind
        assert_eq!(entries(dir.path()), vec!["app-2024.05.06_07.08.09.sql"]);
    }

    #[tokio::test]
    async fn test_existing_file_is_never_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let dumper = dumper(dir.path(), two_tables());
        let path = dumper.output_path(at()).unwrap();
        std::fs::write(&path, "keep me").unwrap();

        let err = dumper.dump_at(&ObfuscationMap::new(), at()).await.unwrap_err();
        assert!(matches!(err, DumpError::AlreadyExists(ref p) if p == &path));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep me");
        assert_eq!(dumper.source().unwrap().query_count(), 0);
    }

    #[tokio::test]
    async fn test_existing_file_is_never_overwritten_non_atomic() {
        let dir = tempfile::tempdir().unwrap();
        let options = DumpOptions::new(dir.path(), "app-%Y").with_atomic_write(false);
        let dumper = Dumper::new(two_tables(), options).unwrap();
        let path = dumper.output_path(at()).unwrap();
        std::fs::write(&path, "keep me").unwrap();

        let err = dumper.dump_at(&ObfuscationMap::new(), at()).await.unwrap_err();
        assert!(matches!(err, DumpError::AlreadyExists(_)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep me");
    }

    #[tokio::test]
    async fn test_ddl_mismatch_produces_no_document() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = two_tables();
        source
            .ddl_aliases
            .insert("empty_table".into(), "other_table".into());
        let dumper = dumper(dir.path(), source);

        let err = dumper.dump_at(&ObfuscationMap::new(), at()).await.unwrap_err();
        assert!(matches!(err, DumpError::DdlMismatch { .. }));
        assert!(entries(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_non_atomic_failure_leaves_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = two_tables();
        source.broken_rows.insert("user".into());
        let options = DumpOptions::new(dir.path(), "app-%Y").with_atomic_write(false);
        let dumper = Dumper::new(source, options).unwrap();

        let err = dumper.dump_at(&ObfuscationMap::new(), at()).await.unwrap_err();
        assert!(matches!(err, DumpError::RowFetch { .. }));
        assert_eq!(entries(dir.path()), vec!["app-2024.sql"]);
    }

    #[tokio::test]
    async fn test_non_atomic_success() {
        let dir = tempfile::tempdir().unwrap();
        let options = DumpOptions::new(dir.path(), "app-%Y").with_atomic_write(false);
        let dumper = Dumper::new(two_tables(), options).unwrap();

        let result = dumper.dump_at(&ObfuscationMap::new(), at()).await.unwrap();
        let text = std::fs::read_to_string(&result.path).unwrap();
        assert!(text.contains("INSERT INTO user VALUES ('1','a@x.com');"));
        assert!(text.ends_with("\n"));
    }

    #[tokio::test]
    async fn test_empty_database() {
        let dir = tempfile::tempdir().unwrap();
        let dumper = dumper(dir.path(), MemorySource::new(Vec::new()));

        let result = dumper.dump_at(&ObfuscationMap::new(), at()).await.unwrap();
        assert_eq!(result.tables, 0);
        let text = std::fs::read_to_string(&result.path).unwrap();
        assert!(!text.contains("Table structure"));
        assert!(text.contains("-- Dump completed on "));
    }

    #[tokio::test]
    async fn test_close_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut dumper = dumper(dir.path(), two_tables());

        assert!(dumper.close().await.is_ok());
        assert!(matches!(dumper.close().await, Err(DumpError::Closed)));
        assert!(matches!(
            dumper.dump_at(&ObfuscationMap::new(), at()).await,
            Err(DumpError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_close_releases_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = std::sync::Arc::new(two_tables());
        let mut dumper = dumper_arc(dir.path(), source.clone());
        dumper.close().await.unwrap();
        assert!(source.closed.load(Ordering::SeqCst));
    }

    fn dumper_arc(
        dir: &Path,
        source: std::sync::Arc<MemorySource>,
    ) -> Dumper<std::sync::Arc<MemorySource>> {
        Dumper::new(source, DumpOptions::new(dir, "app-%Y")).unwrap()
    }
}
