use console::style;
use dirhash_lib::{
    analyze::{render_outcome, render_summary},
    util::progress::create_verify_bar,
    util::sink::{create_output_dir, LogSink, LOG_FILE},
    verify_inventory, Algorithm, CancelToken, Config, DirhashError, HashEngine, InventoryReader, Result,
    VerificationReport,
};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const REPORT_FILE: &str = "report.txt";
pub const SUMMARY_FILE: &str = "summary.json";

pub struct VerifyArgs {
    pub db: PathBuf,
    pub folder: PathBuf,
    pub algorithm: Option<String>,
    pub out_dir: Option<PathBuf>,
}

/// Runs a verification and returns the report. A FAIL report is not an error here;
/// the caller maps it to the exit status.
pub fn handle_verify_command(config: &Config, args: VerifyArgs, verbose: bool, quiet: bool) -> Result<VerificationReport> {
    let cancel = super::signal::install_interrupt_handler();
    run_verify(config, args, cancel, verbose, quiet)
}

fn run_verify(
    config: &Config,
    args: VerifyArgs,
    cancel: CancelToken,
    verbose: bool,
    quiet: bool,
) -> Result<VerificationReport> {
    let base = args.out_dir.clone().unwrap_or_else(|| config.output_dir.clone());
    let run_dir = create_output_dir(&base)?;

    // Entry blocks are echoed only in verbose mode; the progress bar covers the rest.
    let mut report_sink = LogSink::create(run_dir.join(LOG_FILE), verbose && !quiet)?;
    report_sink.add_file(run_dir.join(REPORT_FILE))?;

    match verify_into(config, &args, &run_dir, &mut report_sink, cancel, verbose, quiet) {
        Ok(report) => Ok(report),
        Err(e) => {
            report_sink.error(format!("Verification failed: {}", e))?;
            Err(e)
        }
    }
}

fn verify_into(
    config: &Config,
    args: &VerifyArgs,
    run_dir: &Path,
    report_sink: &mut LogSink,
    cancel: CancelToken,
    verbose: bool,
    quiet: bool,
) -> Result<VerificationReport> {
    let reader = open_checked(&args.db, args.algorithm.as_deref())?;

    let algorithm = reader.algorithm();
    report_sink.line(format!("Inventory: {}", args.db.display()))?;
    report_sink.line(format!("Folder: {}", args.folder.display()))?;
    report_sink.line(format!("Algorithm: {}", algorithm))?;
    report_sink.line("")?;

    if !quiet {
        println!(
            "{} Verifying {} against {}...",
            style(">>>").cyan(),
            style(args.folder.display()).bold(),
            style(args.db.display()).bold()
        );
    }

    let total = reader.len()?;
    let pb = (!quiet && !verbose).then(|| create_verify_bar(total));

    let engine = HashEngine::new(algorithm)
        .with_buffer_size(config.buffer_size)
        .with_cancel(cancel);

    let result = verify_inventory(&reader, &args.folder, &engine, |outcome| {
        if let Some(pb) = &pb {
            pb.inc(1);
            if !outcome.matched {
                pb.println(format!("{} {}", style("×").red(), outcome.path.display()));
            }
        }
        for line in render_outcome(outcome, algorithm) {
            report_sink.line(line)?;
        }
        Ok(())
    });

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let report = result?;

    // The aggregate block is shown even when entry blocks are not echoed.
    let echo_summary = !quiet && !verbose;
    for line in render_summary(&report) {
        report_sink.line(&line)?;
        if echo_summary {
            println!("{}", line);
        }
    }

    let summary_path = run_dir.join(SUMMARY_FILE);
    let file = std::fs::File::create(&summary_path).map_err(|e| DirhashError::file_io(&summary_path, e))?;
    serde_json::to_writer_pretty(file, &report)?;

    if !quiet {
        let verdict = if report.passed() {
            style("PASS").green().bold()
        } else {
            style("FAIL").red().bold()
        };
        println!("\n{} Report in {}", verdict, style(run_dir.display()).cyan());
    }

    Ok(report)
}

fn open_checked(db: &Path, algorithm: Option<&str>) -> Result<InventoryReader> {
    let reader = InventoryReader::open(db)?;
    if let Some(name) = algorithm {
        reader.ensure_algorithm(Algorithm::from_str(name)?)?;
    }
    Ok(reader)
}
