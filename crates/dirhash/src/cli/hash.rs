use console::style;
use dialoguer::Confirm;
use dirhash_lib::{
    delete_if_exists, util::format::format_bytes, util::progress::create_walk_spinner, walk_and_record, Algorithm, CancelToken, Config,
    DirhashError, ErrorPolicy, HashEngine, Inventory, InventoryEntry, Result, RunOutcome, ScanObserver, ScanOptions,
};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Decides whether an existing artifact may be replaced.
pub trait ConfirmOverwrite {
    fn confirm_overwrite(&mut self, path: &Path) -> Result<bool>;
}

/// Asks on the terminal.
pub struct PromptConfirm;

impl ConfirmOverwrite for PromptConfirm {
    fn confirm_overwrite(&mut self, path: &Path) -> Result<bool> {
        let answer = Confirm::new()
            .with_prompt(format!("{} already exists. Overwrite?", path.display()))
            .default(false)
            .interact()?;
        Ok(answer)
    }
}

/// `--yes`
pub struct AssumeYes;

impl ConfirmOverwrite for AssumeYes {
    fn confirm_overwrite(&mut self, _path: &Path) -> Result<bool> {
        Ok(true)
    }
}

pub struct HashArgs {
    pub root: PathBuf,
    pub algorithm: Option<String>,
    pub db: Option<PathBuf>,
    pub txt: Option<PathBuf>,
    pub on_error: Option<String>,
    pub yes: bool,
}

struct ConsoleObserver {
    spinner: Option<ProgressBar>,
    verbose: bool,
}

impl ScanObserver for ConsoleObserver {
    fn on_entry(&mut self, entry: &InventoryEntry, new_dir: bool) {
        if let Some(spinner) = &self.spinner {
            spinner.inc(1);
        }
        if self.verbose {
            if new_dir {
                println!();
            }
            println!("{} {}", style(&entry.digest).dim(), entry.path);
        }
    }

    fn on_skip(&mut self, path: &Path, error: &DirhashError) {
        let line = format!("{} Skipped {}: {}", style("!").yellow(), path.display(), error);
        match &self.spinner {
            Some(spinner) => spinner.println(line),
            None => eprintln!("{}", line),
        }
    }
}

pub fn handle_hash_command(config: &Config, args: HashArgs, verbose: bool, quiet: bool) -> Result<()> {
    let mut confirm: Box<dyn ConfirmOverwrite> = if args.yes {
        Box::new(AssumeYes)
    } else {
        Box::new(PromptConfirm)
    };
    let cancel = super::signal::install_interrupt_handler();
    run_hash(config, args, confirm.as_mut(), cancel, verbose, quiet)
}

fn run_hash(
    config: &Config,
    args: HashArgs,
    confirm: &mut dyn ConfirmOverwrite,
    cancel: CancelToken,
    verbose: bool,
    quiet: bool,
) -> Result<()> {
    if !args.root.is_dir() {
        return Err(DirhashError::FileNotFound(args.root));
    }

    let algorithm = match &args.algorithm {
        Some(name) => Algorithm::from_str(name)?,
        None => config.algorithm,
    };
    let error_policy = match &args.on_error {
        Some(policy) => ErrorPolicy::from_str(policy)?,
        None => config.on_error,
    };
    let (db_path, mirror_path) = artifact_paths(&args.root, args.db, args.txt);

    for path in [&db_path, &mirror_path] {
        if path.exists() {
            if !confirm.confirm_overwrite(path)? {
                return Err(DirhashError::UserInput(format!(
                    "Refusing to overwrite {}",
                    path.display()
                )));
            }
            delete_if_exists(path)?;
        }
    }

    if !quiet {
        println!(
            "{} Hashing {} with {}...",
            style(">>>").cyan(),
            style(args.root.display()).bold(),
            style(algorithm).bold()
        );
    }

    let root = args.root.canonicalize().map_err(|e| DirhashError::file_io(&args.root, e))?;
    let mut inventory = Inventory::open(&db_path, &mirror_path, algorithm, &root)?.with_console_echo(!quiet);

    let engine = HashEngine::new(algorithm).with_buffer_size(config.buffer_size);
    let options = ScanOptions {
        error_policy,
        cancel: Some(cancel),
    };

    let mut observer = ConsoleObserver {
        spinner: (!quiet && !verbose).then(create_walk_spinner),
        verbose: verbose && !quiet,
    };

    let result = walk_and_record(&mut inventory, &root, &engine, &options, &mut observer);
    if let Some(spinner) = observer.spinner.take() {
        spinner.finish_and_clear();
    }
    let stats = result?;

    if !quiet {
        println!("  Inventory: {}", style(db_path.display()).cyan());
        println!("  Mirror:    {}", style(mirror_path.display()).cyan());
        println!(
            "  {} files in {} directories, {}",
            style(stats.file_count).cyan(),
            style(stats.dir_count).cyan(),
            format_bytes(stats.total_bytes)
        );
        if stats.skipped_files > 0 {
            println!("  Skipped: {}", style(stats.skipped_files).yellow());
        }
    }

    match stats.outcome {
        RunOutcome::Interrupted => Err(DirhashError::Cancelled),
        _ => {
            if !quiet {
                println!("\n{} Inventory complete", style("✓").green());
            }
            Ok(())
        }
    }
}

/// Explicit paths win; otherwise `<root name>.db` and `<root name>.txt` in the working directory.
fn artifact_paths(root: &Path, db: Option<PathBuf>, txt: Option<PathBuf>) -> (PathBuf, PathBuf) {
    let name = root
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .unwrap_or_else(|| "root".to_string());

    (
        db.unwrap_or_else(|| PathBuf::from(format!("{}.db", name))),
        txt.unwrap_or_else(|| PathBuf::from(format!("{}.txt", name))),
    )
}
