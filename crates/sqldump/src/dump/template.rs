//! Dump document rendering.
//!
//! The layout is consumed by restore tooling and must stay byte-for-byte
//! stable: header, fixed session preamble, one block per table (with the
//! `INSERT` omitted entirely for empty tables), and the completion footer.

use super::DumpDocument;

/// Tool name written in the first header line.
///
/// Dumps from the earlier tool start with `-- Go SQL Dump`; this one writes
/// `-- SQL Dump`. Parsers that match on the first line must accept both.
pub const TOOL_NAME: &str = "SQL";

const PREAMBLE: &str = "\
/*!40101 SET @OLD_CHARACTER_SET_CLIENT=@@CHARACTER_SET_CLIENT */;
/*!40101 SET @OLD_CHARACTER_SET_RESULTS=@@CHARACTER_SET_RESULTS */;
/*!40101 SET @OLD_COLLATION_CONNECTION=@@COLLATION_CONNECTION */;
/*!40101 SET NAMES utf8 */;
/*!40103 SET @OLD_TIME_ZONE=@@TIME_ZONE */;
/*!40103 SET TIME_ZONE='+00:00' */;
/*!40014 SET @OLD_UNIQUE_CHECKS=@@UNIQUE_CHECKS, UNIQUE_CHECKS=0 */;
/*!40014 SET @OLD_FOREIGN_KEY_CHECKS=@@FOREIGN_KEY_CHECKS, FOREIGN_KEY_CHECKS=0 */;
/*!40101 SET @OLD_SQL_MODE=@@SQL_MODE, SQL_MODE='NO_AUTO_VALUE_ON_ZERO' */;
/*!40111 SET @OLD_SQL_NOTES=@@SQL_NOTES, SQL_NOTES=0 */;
";

/// Render a document to its final text.
pub fn render(doc: &DumpDocument) -> String {
    let body: usize = doc
        .tables
        .iter()
        .map(|t| t.ddl.len() + t.values.len() + 512)
        .sum();
    let mut out = String::with_capacity(PREAMBLE.len() + body + 128);

    out.push_str(&format!("-- {} Dump {}\n", TOOL_NAME, doc.format_version));
    out.push_str("--\n");
    out.push_str("-- ------------------------------------------------------\n");
    out.push_str(&format!("-- Server version\t{}\n", doc.server_version));
    out.push_str(PREAMBLE);

    for table in &doc.tables {
        let name = &table.name;
        out.push_str("\n--\n");
        out.push_str(&format!("-- Table structure for table {}\n", name));
        out.push_str("--\n");
        out.push_str(&format!("DROP TABLE IF EXISTS {};\n", name));
        out.push_str("/*!40101 SET @saved_cs_client     = @@character_set_client */;\n");
        out.push_str("/*!40101 SET character_set_client = utf8 */;\n");
        out.push_str(&format!("{};\n", table.ddl));
        out.push_str("/*!40101 SET character_set_client = @saved_cs_client */;\n");
        out.push_str("--\n");
        out.push_str(&format!("-- Dumping data for table {}\n", name));
        out.push_str("--\n");
        out.push_str(&format!("LOCK TABLES {} WRITE;\n", name));
        out.push_str(&format!("/*!40000 ALTER TABLE {} DISABLE KEYS */;\n", name));
        if table.has_rows() {
            out.push_str(&format!("\nINSERT INTO {} VALUES {};\n", name, table.values));
        }
        out.push_str(&format!("\n/*!40000 ALTER TABLE {} ENABLE KEYS */;\n", name));
        out.push_str("UNLOCK TABLES;\n");
    }

    out.push_str(&format!("\n-- Dump completed on {}\n", doc.completed_at));
    out
}
