#![allow(dead_code)]

use dirhash_lib::{
    walk_and_record, Algorithm, HashEngine, Inventory, InventoryEntry, InventoryReader, InventoryStore, NoopObserver,
    Result, RunStatistics, ScanOptions,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A scratch directory holding one or more trees plus their artifacts.
pub struct TestFixture {
    pub temp_dir: TempDir,
}

impl TestFixture {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Creates `name/` and writes each `(relative path, contents)` pair under it.
    pub fn tree(&self, name: &str, files: &[(&str, &[u8])]) -> PathBuf {
        let root = self.path().join(name);
        fs::create_dir_all(&root).unwrap();
        for (rel, contents) in files {
            write_file(&root, rel, contents);
        }
        root
    }

    pub fn db(&self, name: &str) -> PathBuf {
        self.path().join(format!("{}.db", name))
    }

    pub fn mirror(&self, name: &str) -> PathBuf {
        self.path().join(format!("{}.txt", name))
    }

    /// Builds `<name>.db` / `<name>.txt` for `root` with default options.
    pub fn build(&self, name: &str, root: &Path, algorithm: Algorithm) -> Result<RunStatistics> {
        let mut inventory = Inventory::open(self.db(name), self.mirror(name), algorithm, root)?;
        walk_and_record(
            &mut inventory,
            root,
            &HashEngine::new(algorithm),
            &ScanOptions::default(),
            &mut NoopObserver,
        )
    }
}

pub fn write_file(root: &Path, rel: &str, contents: &[u8]) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

pub fn digest_of(algorithm: Algorithm, data: &[u8]) -> String {
    HashEngine::new(algorithm).digest_reader(data).unwrap().digest
}

/// Writes an inventory directly from rows, bypassing the walk.
pub fn inventory_from_rows(path: &Path, algorithm: Algorithm, rows: &[InventoryEntry]) -> InventoryReader {
    let store = InventoryStore::create(path, algorithm, "/fixture").unwrap();
    for row in rows {
        store.insert(row).unwrap();
    }
    store.close("completed").unwrap();
    InventoryReader::open(path).unwrap()
}
