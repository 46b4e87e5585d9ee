use crate::db::{InventoryEntry, InventoryStore};
use crate::error::{DirhashError, Result};
use crate::index::mirror::MirrorWriter;
use crate::index::stats::{RunOutcome, RunStatistics};
use crate::index::Algorithm;
use std::path::{Path, PathBuf};

/// An inventory being built: the SQLite store and the text mirror, written in lockstep.
///
/// Entries are appended to both forms before [`Inventory::record_file`] returns.
/// [`Inventory::finalize`] closes both and writes the statistics block; it is
/// idempotent and also runs on drop, so every exit path releases the artifacts.
pub struct Inventory {
    store: Option<InventoryStore>,
    mirror: Option<MirrorWriter>,
    db_path: PathBuf,
    mirror_path: PathBuf,
    stats: RunStatistics,
    last_dir: Option<String>,
    finalized: bool,
    echo: bool,
}

impl Inventory {
    /// Fails with `AlreadyExists` for the first path that is already taken.
    pub fn ensure_absent(paths: &[&Path]) -> Result<()> {
        match paths.iter().find(|p| p.exists()) {
            Some(taken) => Err(DirhashError::AlreadyExists(taken.to_path_buf())),
            None => Ok(()),
        }
    }

    pub fn open<P, Q>(db_path: P, mirror_path: Q, algorithm: Algorithm, root: &Path) -> Result<Self>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let db_path = db_path.as_ref();
        let mirror_path = mirror_path.as_ref();
        Self::ensure_absent(&[db_path, mirror_path])?;

        let store = InventoryStore::create(db_path, algorithm, &root.to_string_lossy())?;
        let mirror = match MirrorWriter::create(mirror_path) {
            Ok(mirror) => mirror,
            Err(e) => {
                drop(store);
                let _ = std::fs::remove_file(db_path);
                return Err(e);
            }
        };

        log::info!(
            "Building {} inventory of {} into {} and {}",
            algorithm,
            root.display(),
            db_path.display(),
            mirror_path.display()
        );

        Ok(Self {
            store: Some(store),
            mirror: Some(mirror),
            db_path: db_path.to_path_buf(),
            mirror_path: mirror_path.to_path_buf(),
            stats: RunStatistics::start(algorithm),
            last_dir: None,
            finalized: false,
            echo: false,
        })
    }

    /// Print the statistics block on stdout when finalizing.
    pub fn with_console_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn algorithm(&self) -> Algorithm {
        self.stats.algorithm
    }

    /// The store and mirror paths, in that order.
    pub fn artifact_paths(&self) -> [&Path; 2] {
        [&self.db_path, &self.mirror_path]
    }

    pub fn stats(&self) -> &RunStatistics {
        &self.stats
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Appends one entry. `dir` is the root-relative directory ("" for the root).
    pub fn record_file(&mut self, dir: &str, file_name: &str, digest: &str, bytes: u64) -> Result<InventoryEntry> {
        let (store, mirror) = match (&self.store, &mut self.mirror) {
            (Some(store), Some(mirror)) if !self.finalized => (store, mirror),
            _ => {
                return Err(DirhashError::Config(
                    "inventory is already finalized".to_string(),
                ))
            }
        };

        let entry = InventoryEntry::new(digest, join_relative(dir, file_name));
        let new_dir = self.last_dir.as_deref() != Some(dir);

        store.insert(&entry)?;
        mirror.append(&entry, new_dir)?;

        self.stats.record_file(bytes, new_dir);
        if new_dir {
            self.last_dir = Some(dir.to_string());
        }

        Ok(entry)
    }

    pub fn record_skip(&mut self) {
        self.stats.record_skip();
    }

    /// Notes the error that ends the run; it is written into the statistics block.
    pub fn record_failure(&mut self, reason: impl Into<String>) {
        if !self.finalized {
            self.stats.record_failure(reason);
        }
    }

    /// Commits the store, closes the mirror with the statistics block and returns
    /// the final statistics. Later calls return the same statistics untouched.
    pub fn finalize(&mut self, outcome: RunOutcome) -> Result<RunStatistics> {
        if self.finalized {
            return Ok(self.stats.clone());
        }
        self.finalized = true;
        self.stats.finish(outcome);

        let trailer = self.stats.render();
        let store_result = self
            .store
            .take()
            .map_or(Ok(()), |store| store.close(outcome.as_str()));
        let mirror_result = self
            .mirror
            .take()
            .map_or(Ok(()), |mirror| mirror.close(&trailer));

        log::info!(
            "Inventory {}: {} files, {} directories, {} bytes",
            outcome,
            self.stats.file_count,
            self.stats.dir_count,
            self.stats.total_bytes
        );
        if self.echo {
            println!("\n{}", trailer);
        }

        store_result?;
        mirror_result?;
        Ok(self.stats.clone())
    }
}

impl Drop for Inventory {
    fn drop(&mut self) {
        if !self.finalized {
            if let Err(e) = self.finalize(RunOutcome::Aborted) {
                log::warn!("Failed to finalize inventory on drop: {}", e);
            }
        }
    }
}

fn join_relative(dir: &str, file_name: &str) -> String {
    if dir.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", dir, file_name)
    }
}
