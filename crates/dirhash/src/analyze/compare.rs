use crate::db::{schema::HASH_TABLE, InventoryEntry, InventoryReader};
use crate::error::{DirhashError, Result};
use crate::index::Algorithm;
use rusqlite::Connection;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Result of matching two inventories by digest.
///
/// `common_in_first` and `common_in_second` hold the entries of each side whose
/// digest also appears on the other side; an identical file present in both
/// shows up once in each, under its own path.
#[derive(Debug, Clone)]
pub struct ComparisonResult {
    pub first: PathBuf,
    pub second: PathBuf,
    pub algorithm: Algorithm,
    pub common_in_first: Vec<InventoryEntry>,
    pub common_in_second: Vec<InventoryEntry>,
    pub unique_to_first: Vec<InventoryEntry>,
    pub unique_to_second: Vec<InventoryEntry>,
}

impl ComparisonResult {
    pub fn common(&self) -> impl Iterator<Item = &InventoryEntry> {
        self.common_in_first.iter().chain(self.common_in_second.iter())
    }

    pub fn summary(&self) -> ComparisonSummary {
        ComparisonSummary {
            first: self.first.to_string_lossy().to_string(),
            second: self.second.to_string_lossy().to_string(),
            algorithm: self.algorithm,
            common: self.common_in_first.len() + self.common_in_second.len(),
            common_in_first: self.common_in_first.len(),
            common_in_second: self.common_in_second.len(),
            unique_to_first: self.unique_to_first.len(),
            unique_to_second: self.unique_to_second.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonSummary {
    pub first: String,
    pub second: String,
    pub algorithm: Algorithm,
    pub common: usize,
    pub common_in_first: usize,
    pub common_in_second: usize,
    pub unique_to_first: usize,
    pub unique_to_second: usize,
}

/// Classifies every entry of both inventories as common or unique by exact
/// digest equality.
///
/// Both stores are attached to a scratch in-memory connection and queried with
/// set membership, so memory use does not grow with inventory size beyond the
/// result vectors. Inventories built with different algorithms are rejected.
pub fn compare_inventories(first: &InventoryReader, second: &InventoryReader) -> Result<ComparisonResult> {
    if first.algorithm() != second.algorithm() {
        return Err(DirhashError::AlgorithmMismatch {
            expected: first.algorithm().to_string(),
            found: second.algorithm().to_string(),
            path: second.path().to_path_buf(),
        });
    }

    let conn = Connection::open_in_memory()?;
    conn.execute("ATTACH DATABASE ?1 AS inv_a", [first.path().to_string_lossy()])?;
    conn.execute("ATTACH DATABASE ?1 AS inv_b", [second.path().to_string_lossy()])?;

    let a = Side {
        schema: "inv_a",
        column: first.digest_column(),
    };
    let b = Side {
        schema: "inv_b",
        column: second.digest_column(),
    };

    let result = ComparisonResult {
        first: first.path().to_path_buf(),
        second: second.path().to_path_buf(),
        algorithm: first.algorithm(),
        common_in_first: membership_query(&conn, &a, &b, true)?,
        common_in_second: membership_query(&conn, &b, &a, true)?,
        unique_to_first: membership_query(&conn, &a, &b, false)?,
        unique_to_second: membership_query(&conn, &b, &a, false)?,
    };

    log::info!(
        "Compared {} and {}: {} common, {} unique to first, {} unique to second",
        result.first.display(),
        result.second.display(),
        result.common_in_first.len() + result.common_in_second.len(),
        result.unique_to_first.len(),
        result.unique_to_second.len()
    );

    Ok(result)
}

struct Side<'a> {
    schema: &'static str,
    column: &'a str,
}

fn membership_query(conn: &Connection, from: &Side, against: &Side, present: bool) -> Result<Vec<InventoryEntry>> {
    let sql = format!(
        "SELECT \"{fc}\", path FROM {fs}.{HASH_TABLE}
         WHERE \"{fc}\" IS NOT NULL AND \"{fc}\" {op} (
             SELECT \"{ac}\" FROM {as_}.{HASH_TABLE} WHERE \"{ac}\" IS NOT NULL
         )
         ORDER BY rowid",
        fc = from.column,
        fs = from.schema,
        ac = against.column,
        as_ = against.schema,
        op = if present { "IN" } else { "NOT IN" },
    );

    let mut stmt = conn.prepare(&sql)?;
    let entries = stmt
        .query_map([], |row| {
            Ok(InventoryEntry {
                digest: row.get(0)?,
                path: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(entries)
}

/// Paths of the files written by [`write_comparison`].
#[derive(Debug, Clone)]
pub struct ComparisonArtifacts {
    pub common: PathBuf,
    pub unique_to_first: PathBuf,
    pub unique_to_second: PathBuf,
    pub summary: PathBuf,
}

/// Writes the three `digest|path` listings plus a JSON summary into `out_dir`.
pub fn write_comparison(result: &ComparisonResult, out_dir: &Path) -> Result<ComparisonArtifacts> {
    let (first_label, second_label) = artifact_labels(&result.first, &result.second);

    let artifacts = ComparisonArtifacts {
        common: out_dir.join(format!("common_to_{}_and_{}.txt", first_label, second_label)),
        unique_to_first: out_dir.join(format!("unique_to_{}.txt", first_label)),
        unique_to_second: out_dir.join(format!("unique_to_{}.txt", second_label)),
        summary: out_dir.join("summary.json"),
    };

    write_listing(&artifacts.common, result.common())?;
    write_listing(&artifacts.unique_to_first, result.unique_to_first.iter())?;
    write_listing(&artifacts.unique_to_second, result.unique_to_second.iter())?;

    let summary = File::create(&artifacts.summary).map_err(|e| DirhashError::file_io(&artifacts.summary, e))?;
    serde_json::to_writer_pretty(summary, &result.summary())?;

    Ok(artifacts)
}

fn write_listing<'a>(path: &Path, entries: impl Iterator<Item = &'a InventoryEntry>) -> Result<()> {
    let file = File::create(path).map_err(|e| DirhashError::file_io(path, e))?;
    let mut writer = BufWriter::new(file);
    for entry in entries {
        writeln!(writer, "{}|{}", entry.digest, entry.path).map_err(|e| DirhashError::file_io(path, e))?;
    }
    writer.flush().map_err(|e| DirhashError::file_io(path, e))?;
    Ok(())
}

/// File-name labels for the two inputs, disambiguated when they collide.
fn artifact_labels(first: &Path, second: &Path) -> (String, String) {
    let label = |p: &Path| {
        p.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "inventory".to_string())
    };
    let (a, b) = (label(first), label(second));
    if a == b {
        (format!("{}_1", a), format!("{}_2", b))
    } else {
        (a, b)
    }
}
