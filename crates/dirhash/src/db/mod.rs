pub mod schema;

use crate::error::{DirhashError, Result};
use crate::index::Algorithm;
use chrono::Utc;
use rusqlite::{Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One `(digest, path)` row of an inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub digest: String,
    pub path: String,
}

impl InventoryEntry {
    pub fn new(digest: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            digest: digest.into(),
            path: path.into(),
        }
    }
}

/// Metadata recorded alongside the entries. Legacy inventories carry none of it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InventoryMeta {
    pub algorithm: Option<String>,
    pub root: Option<String>,
    pub created_at: Option<String>,
    pub finished_at: Option<String>,
    pub outcome: Option<String>,
    pub format_version: Option<i32>,
}

impl InventoryMeta {
    fn from_map(mut map: HashMap<String, String>) -> Self {
        Self {
            algorithm: map.remove("algorithm"),
            root: map.remove("root"),
            created_at: map.remove("created_at"),
            finished_at: map.remove("finished_at"),
            outcome: map.remove("outcome"),
            format_version: map.remove("format_version").and_then(|v| v.parse().ok()),
        }
    }
}

/// Write side of an inventory's queryable store.
///
/// Every insert runs in its own implicit transaction, so an entry is durable as
/// soon as [`InventoryStore::insert`] returns.
pub struct InventoryStore {
    conn: Connection,
    path: PathBuf,
    algorithm: Algorithm,
}

impl InventoryStore {
    pub fn create<P: AsRef<Path>>(path: P, algorithm: Algorithm, root: &str) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Err(DirhashError::AlreadyExists(path.to_path_buf()));
        }

        let conn = Connection::open(path)?;
        schema::initialize_schema(&conn, algorithm)?;
        schema::set_meta(&conn, "root", root)?;
        schema::set_meta(&conn, "created_at", &Utc::now().to_rfc3339())?;
        schema::set_meta(&conn, "outcome", "in_progress")?;

        log::debug!("Created inventory store {} ({})", path.display(), algorithm);

        Ok(Self {
            conn,
            path: path.to_path_buf(),
            algorithm,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn insert(&self, entry: &InventoryEntry) -> Result<()> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "INSERT INTO {} (\"{}\", path) VALUES (?1, ?2)",
            schema::HASH_TABLE,
            self.algorithm.as_str()
        ))?;
        stmt.execute((&entry.digest, &entry.path))?;
        Ok(())
    }

    /// Records how the run ended and releases the connection.
    pub fn close(self, outcome: &str) -> Result<()> {
        schema::set_meta(&self.conn, "outcome", outcome)?;
        schema::set_meta(&self.conn, "finished_at", &Utc::now().to_rfc3339())?;
        self.conn.close().map_err(|(_, e)| DirhashError::Database(e))
    }
}

/// Read side of a finished inventory.
pub struct InventoryReader {
    conn: Connection,
    path: PathBuf,
    column: String,
    algorithm: Algorithm,
    meta: InventoryMeta,
}

impl InventoryReader {
    /// Opens an inventory read-only after checking it really is one.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(DirhashError::FileNotFound(path.to_path_buf()));
        }
        if !schema::has_sqlite_signature(path)? {
            return Err(DirhashError::MalformedArtifact {
                path: path.to_path_buf(),
                reason: "not an SQLite database".to_string(),
            });
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let (column, algorithm) = schema::digest_column(&conn, "main", path)?;
        let meta = InventoryMeta::from_map(schema::read_meta(&conn, "main")?);

        if let Some(recorded) = &meta.algorithm {
            if !recorded.eq_ignore_ascii_case(algorithm.as_str()) {
                return Err(DirhashError::MalformedArtifact {
                    path: path.to_path_buf(),
                    reason: format!(
                        "metadata algorithm '{}' disagrees with digest column '{}'",
                        recorded, column
                    ),
                });
            }
        }

        Ok(Self {
            conn,
            path: path.to_path_buf(),
            column,
            algorithm,
            meta,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Digest column name exactly as stored.
    pub fn digest_column(&self) -> &str {
        &self.column
    }

    pub fn meta(&self) -> &InventoryMeta {
        &self.meta
    }

    /// Fails with `AlgorithmMismatch` unless the inventory was built with `expected`.
    pub fn ensure_algorithm(&self, expected: Algorithm) -> Result<()> {
        if self.algorithm == expected {
            Ok(())
        } else {
            Err(DirhashError::AlgorithmMismatch {
                expected: expected.to_string(),
                found: self.algorithm.to_string(),
                path: self.path.clone(),
            })
        }
    }

    pub fn len(&self) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", schema::HASH_TABLE),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Streams entries in insertion order.
    pub fn for_each_entry<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(InventoryEntry) -> Result<()>,
    {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT \"{}\", path FROM {} ORDER BY rowid",
            self.column,
            schema::HASH_TABLE
        ))?;
        let mut rows = stmt.query([])?;

        while let Some(row) = rows.next()? {
            f(InventoryEntry {
                digest: row.get(0)?,
                path: row.get(1)?,
            })?;
        }

        Ok(())
    }

    pub fn entries(&self) -> Result<Vec<InventoryEntry>> {
        let mut entries = Vec::new();
        self.for_each_entry(|entry| {
            entries.push(entry);
            Ok(())
        })?;
        Ok(entries)
    }
}

/// Removes a stale artifact. Returns whether anything was deleted.
pub fn delete_if_exists<P: AsRef<Path>>(path: P) -> Result<bool> {
    let path = path.as_ref();
    match std::fs::remove_file(path) {
        Ok(()) => {
            log::info!("Deleted existing {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(DirhashError::file_io(path, e)),
    }
}
