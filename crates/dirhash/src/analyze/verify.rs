use crate::db::InventoryReader;
use crate::error::{DirhashError, Result};
use crate::index::{Algorithm, HashEngine};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};

/// Verdict for one inventory entry.
#[derive(Debug, Clone, Serialize)]
pub struct EntryOutcome {
    /// 1-based, in inventory order.
    pub sequence: u64,
    pub path: PathBuf,
    pub recorded: String,
    pub computed: Option<String>,
    pub error: Option<String>,
    pub matched: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub inventory: PathBuf,
    pub root: PathBuf,
    pub algorithm: Algorithm,
    pub outcomes: Vec<EntryOutcome>,
    pub total: u64,
    pub matched_count: u64,
    pub failed_count: u64,
    pub interrupted: bool,
}

impl VerificationReport {
    pub fn passed(&self) -> bool {
        self.failed_count == 0 && !self.interrupted
    }
}

/// Joins a recorded path onto the live root. Leading root or prefix components
/// are dropped, so a path recorded as absolute still resolves under `root`.
pub fn resolve_live_path(root: &Path, recorded: &str) -> PathBuf {
    let relative: PathBuf = Path::new(recorded)
        .components()
        .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
        .collect();
    root.join(relative)
}

/// Re-hashes every file the inventory lists under `root` and compares digests.
///
/// `engine` must use the algorithm the inventory was built with; a different one
/// is rejected up front with `AlgorithmMismatch`. A file that cannot be read is
/// reported as a failed entry, not an error. `observer` sees each outcome as soon
/// as it is known. If the engine's cancel token fires, the report is returned
/// with `interrupted` set and only the entries processed so far.
pub fn verify_inventory<F>(
    inventory: &InventoryReader,
    root: &Path,
    engine: &HashEngine,
    mut observer: F,
) -> Result<VerificationReport>
where
    F: FnMut(&EntryOutcome) -> Result<()>,
{
    inventory.ensure_algorithm(engine.algorithm())?;
    if !root.is_dir() {
        return Err(DirhashError::FileNotFound(root.to_path_buf()));
    }

    let mut outcomes = Vec::new();
    let mut matched_count = 0u64;

    let walk = inventory.for_each_entry(|entry| {
        let sequence = outcomes.len() as u64 + 1;
        let path = resolve_live_path(root, &entry.path);

        let outcome = match engine.digest_file(&path) {
            Ok(output) => EntryOutcome {
                sequence,
                matched: output.digest == entry.digest,
                computed: Some(output.digest),
                error: None,
                recorded: entry.digest,
                path,
            },
            Err(DirhashError::Cancelled) => return Err(DirhashError::Cancelled),
            Err(e) => {
                log::warn!("Cannot verify {}: {}", path.display(), e);
                EntryOutcome {
                    sequence,
                    matched: false,
                    computed: None,
                    error: Some(e.to_string()),
                    recorded: entry.digest,
                    path,
                }
            }
        };

        if outcome.matched {
            matched_count += 1;
        } else {
            log::debug!("Mismatch #{}: {}", outcome.sequence, outcome.path.display());
        }
        observer(&outcome)?;
        outcomes.push(outcome);
        Ok(())
    });

    let interrupted = match walk {
        Ok(()) => false,
        Err(DirhashError::Cancelled) => {
            log::warn!("Verification interrupted after {} entries", outcomes.len());
            true
        }
        Err(e) => return Err(e),
    };

    let total = outcomes.len() as u64;
    Ok(VerificationReport {
        inventory: inventory.path().to_path_buf(),
        root: root.to_path_buf(),
        algorithm: engine.algorithm(),
        outcomes,
        total,
        matched_count,
        failed_count: total - matched_count,
        interrupted,
    })
}

/// Report lines for one entry.
pub fn render_outcome(outcome: &EntryOutcome, algorithm: Algorithm) -> Vec<String> {
    let name = algorithm.as_str().to_ascii_uppercase();
    let computed = match (&outcome.computed, &outcome.error) {
        (Some(digest), _) => digest.clone(),
        (None, Some(error)) => format!("<unavailable: {}>", error),
        (None, None) => "<unavailable>".to_string(),
    };

    vec![
        format!("{:0>4}:", outcome.sequence),
        format!("File: {}", outcome.path.display()),
        format!("{} as in inventory: {}", name, outcome.recorded),
        format!("{} computed: {}", name, computed),
        if outcome.matched {
            format!("{} match OK", name)
        } else {
            format!("*** {} MATCH FAILED ***", name)
        },
        String::new(),
    ]
}

/// Closing aggregate block.
pub fn render_summary(report: &VerificationReport) -> Vec<String> {
    let mut lines = vec![
        "Statistics:".to_string(),
        String::new(),
        format!("Number of files processed: {}", report.total),
        format!("Number of hash matches: {}", report.matched_count),
        format!("Number of hash fails: {}", report.failed_count),
    ];

    if report.interrupted {
        lines.push("***** Verification INTERRUPTED before the end of the inventory *****".to_string());
    }
    if report.failed_count > 0 {
        lines.push("***** Folder integrity check FAILED *****".to_string());
        lines.push(format!("Number of CORRUPT or MISSING files: {}", report.failed_count));
    } else if !report.interrupted {
        lines.push("***** All files verified OK *****".to_string());
    }
    lines.push(format!("Result: {}", if report.passed() { "PASS" } else { "FAIL" }));

    lines
}
