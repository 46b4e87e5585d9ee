use crate::error::{DirhashError, Result};
use crate::index::Algorithm;
use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const FORMAT_VERSION: i32 = 1;

/// Every SQLite database file starts with these 16 bytes.
pub const SQLITE_MAGIC: &[u8; 16] = b"SQLite format 3\0";

pub const HASH_TABLE: &str = "hash_table";
pub const META_TABLE: &str = "inventory_meta";

/// Creates the inventory tables. The digest column is named after the algorithm.
pub fn initialize_schema(conn: &Connection, algorithm: Algorithm) -> Result<()> {
    let column = algorithm.as_str();
    conn.execute_batch(&format!(
        r#"
        CREATE TABLE {HASH_TABLE} (
            "{column}"      TEXT,
            path            TEXT
        );

        CREATE INDEX idx_hash_table_digest ON {HASH_TABLE}("{column}");

        CREATE TABLE {META_TABLE} (
            key             TEXT PRIMARY KEY,
            value           TEXT
        );
        "#
    ))?;

    set_meta(conn, "format_version", &FORMAT_VERSION.to_string())?;
    set_meta(conn, "algorithm", column)?;

    Ok(())
}

pub fn set_meta(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        &format!("INSERT OR REPLACE INTO {META_TABLE} (key, value) VALUES (?1, ?2)"),
        (key, value),
    )?;
    Ok(())
}

fn table_exists(conn: &Connection, schema: &str, table: &str) -> Result<bool> {
    let found: Option<String> = conn
        .query_row(
            &format!("SELECT name FROM \"{schema}\".sqlite_master WHERE type = 'table' AND name = ?1"),
            [table],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Reads the metadata table, or an empty map for inventories written without one.
pub fn read_meta(conn: &Connection, schema: &str) -> Result<HashMap<String, String>> {
    if !table_exists(conn, schema, META_TABLE)? {
        return Ok(HashMap::new());
    }

    let mut stmt = conn.prepare(&format!("SELECT key, value FROM \"{schema}\".{META_TABLE}"))?;
    let pairs = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(pairs
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k, v)))
        .collect())
}

/// Finds the digest column of `hash_table` and the algorithm it names.
///
/// The column name is matched case-insensitively; the name as stored is
/// returned so queries can quote it exactly.
pub fn digest_column(conn: &Connection, schema: &str, path: &Path) -> Result<(String, Algorithm)> {
    if !table_exists(conn, schema, HASH_TABLE)? {
        return Err(DirhashError::MalformedArtifact {
            path: path.to_path_buf(),
            reason: format!("missing table '{}'", HASH_TABLE),
        });
    }

    let mut stmt = conn.prepare(&format!("PRAGMA \"{schema}\".table_info({HASH_TABLE})"))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    if !columns.iter().any(|c| c == "path") {
        return Err(DirhashError::MalformedArtifact {
            path: path.to_path_buf(),
            reason: "missing 'path' column".to_string(),
        });
    }

    columns
        .into_iter()
        .filter(|c| c != "path")
        .find_map(|c| c.parse::<Algorithm>().ok().map(|alg| (c, alg)))
        .ok_or_else(|| DirhashError::MalformedArtifact {
            path: path.to_path_buf(),
            reason: "no digest column named after a supported algorithm".to_string(),
        })
}

/// Signature sniff: true iff the file begins with the SQLite header.
pub fn has_sqlite_signature<P: AsRef<Path>>(path: P) -> Result<bool> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|e| DirhashError::file_io(path, e))?;
    let mut magic = [0u8; 16];

    let mut filled = 0;
    while filled < magic.len() {
        let n = file.read(&mut magic[filled..])?;
        if n == 0 {
            return Ok(false);
        }
        filled += n;
    }

    Ok(&magic == SQLITE_MAGIC)
}
