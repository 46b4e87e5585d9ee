use crate::db::InventoryEntry;
use crate::error::{DirhashError, Result};
use crate::index::hasher::HashEngine;
use crate::index::inventory::Inventory;
use crate::index::stats::{RunOutcome, RunStatistics};
use crate::index::CancelToken;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use walkdir::{DirEntry, WalkDir};

/// What to do when a single file cannot be hashed during a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Finalize what was recorded so far, then fail the run.
    #[default]
    Abort,
    /// Log the file, count it as skipped and keep walking.
    Skip,
}

impl ErrorPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorPolicy::Abort => "abort",
            ErrorPolicy::Skip => "skip",
        }
    }
}

impl FromStr for ErrorPolicy {
    type Err = DirhashError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(ErrorPolicy::Abort),
            "skip" => Ok(ErrorPolicy::Skip),
            _ => Err(DirhashError::Config(format!(
                "Invalid error policy '{}'. Use 'abort' or 'skip'",
                s
            ))),
        }
    }
}

/// Options for a hashing walk
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub error_policy: ErrorPolicy,
    pub cancel: Option<CancelToken>,
}

/// Hooks for reporting walk progress. All methods default to no-ops.
pub trait ScanObserver {
    fn on_entry(&mut self, _entry: &InventoryEntry, _new_dir: bool) {}
    fn on_skip(&mut self, _path: &Path, _error: &DirhashError) {}
}

pub struct NoopObserver;

impl ScanObserver for NoopObserver {}

/// Walks `root` recursively, hashing every regular file into `inventory`.
///
/// Within a directory, files come before subdirectories and both are sorted by
/// name, so the order is deterministic and each directory's files are
/// contiguous. The inventory is finalized on every exit path: `Completed` at the
/// end of the walk, `Interrupted` when the cancel token fires (the file being
/// hashed at that moment is dropped) and `Aborted` on a fatal error.
pub fn walk_and_record<P: AsRef<Path>>(
    inventory: &mut Inventory,
    root: P,
    engine: &HashEngine,
    options: &ScanOptions,
    observer: &mut dyn ScanObserver,
) -> Result<RunStatistics> {
    let root = root.as_ref();

    if !root.is_dir() {
        let err = DirhashError::FileNotFound(root.to_path_buf());
        inventory.record_failure(err.to_string());
        inventory.finalize(RunOutcome::Aborted)?;
        return Err(err);
    }

    let engine = match &options.cancel {
        Some(token) => engine.clone().with_cancel(token.clone()),
        None => engine.clone(),
    };
    let is_cancelled = || options.cancel.as_ref().map_or(false, CancelToken::is_cancelled);

    let own_artifacts = artifacts_within(root, &inventory.artifact_paths());
    let walker = WalkDir::new(root).sort_by(files_first);

    for entry in walker {
        if is_cancelled() {
            log::warn!("Walk interrupted after {} files", inventory.stats().file_count);
            return inventory.finalize(RunOutcome::Interrupted);
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                let err = DirhashError::file_io(path.clone(), e.into());
                handle_failure(inventory, options.error_policy, &path, err, observer)?;
                continue;
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }

        let is_own_artifact = entry
            .path()
            .strip_prefix(root)
            .map_or(false, |rel| own_artifacts.iter().any(|a| a.as_path() == rel));
        if is_own_artifact {
            log::debug!("Not hashing the inventory's own artifact {}", entry.path().display());
            continue;
        }

        if !is_hashable(&entry) {
            log::debug!("Skipping special file {}", entry.path().display());
            continue;
        }

        let (dir, file_name) = match relative_parts(root, &entry) {
            Ok(parts) => parts,
            Err(e) => {
                handle_failure(inventory, options.error_policy, entry.path(), e, observer)?;
                continue;
            }
        };

        match engine.digest_file(entry.path()) {
            Ok(output) => {
                let dirs_before = inventory.stats().dir_count;
                let recorded = match inventory.record_file(&dir, &file_name, &output.digest, output.bytes) {
                    Ok(recorded) => recorded,
                    Err(e) => {
                        inventory.record_failure(e.to_string());
                        inventory.finalize(RunOutcome::Aborted)?;
                        return Err(e);
                    }
                };
                observer.on_entry(&recorded, inventory.stats().dir_count != dirs_before);
            }
            Err(DirhashError::Cancelled) => {
                log::warn!("Abandoned {} on interrupt", entry.path().display());
                return inventory.finalize(RunOutcome::Interrupted);
            }
            Err(e) => {
                handle_failure(inventory, options.error_policy, entry.path(), e, observer)?;
            }
        }
    }

    inventory.finalize(RunOutcome::Completed)
}

fn handle_failure(
    inventory: &mut Inventory,
    policy: ErrorPolicy,
    path: &Path,
    err: DirhashError,
    observer: &mut dyn ScanObserver,
) -> Result<()> {
    match policy {
        ErrorPolicy::Abort => {
            log::error!("Aborting walk at {}: {}", path.display(), err);
            inventory.record_failure(err.to_string());
            inventory.finalize(RunOutcome::Aborted)?;
            Err(err)
        }
        ErrorPolicy::Skip => {
            log::warn!("Skipping {}: {}", path.display(), err);
            inventory.record_skip();
            observer.on_skip(path, &err);
            Ok(())
        }
    }
}

fn files_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

/// Regular files, plus symlinks that do not point at a directory. A dangling
/// link is still attempted so the failure goes through the error policy.
fn is_hashable(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    file_type.is_file() || (file_type.is_symlink() && !entry.path().is_dir())
}

/// Splits an entry into its root-relative directory ("" at the root) and file name.
/// Stored paths are text, so a component that is not valid UTF-8 is an error
/// rather than a lossy rewrite.
fn relative_parts(root: &Path, entry: &DirEntry) -> Result<(String, String)> {
    let dir = match entry.path().parent().and_then(|parent| parent.strip_prefix(root).ok()) {
        Some(rel) => path_to_slash(rel).ok_or_else(|| not_utf8(entry.path()))?,
        None => String::new(),
    };
    let file_name = entry
        .file_name()
        .to_str()
        .ok_or_else(|| not_utf8(entry.path()))?
        .to_string();
    Ok((dir, file_name))
}

fn path_to_slash(path: &Path) -> Option<String> {
    path.components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()
        .map(|parts| parts.join("/"))
}

fn not_utf8(path: &Path) -> DirhashError {
    DirhashError::file_io(
        path,
        io::Error::new(io::ErrorKind::InvalidData, "file name is not valid UTF-8"),
    )
}

/// Paths of the inventory's own artifacts relative to `root`, when they live inside it.
pub fn artifacts_within(root: &Path, artifacts: &[&Path]) -> Vec<PathBuf> {
    let Ok(root) = root.canonicalize() else {
        return Vec::new();
    };
    artifacts
        .iter()
        .filter_map(|artifact| {
            let parent = artifact.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let parent = parent.canonicalize().ok()?;
            let full = parent.join(artifact.file_name()?);
            full.strip_prefix(&root).ok().map(Path::to_path_buf)
        })
        .collect()
}
