mod cli;

use clap::Parser;
use console::style;
use dirhash_lib::{Config, DirhashError, Result};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(code) => code,
        Err(DirhashError::Cancelled) => {
            eprintln!("{} Interrupted; partial results were saved", style("!").yellow());
            ExitCode::from(130)
        }
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: cli::Cli) -> Result<ExitCode> {
    let config = Config::load(cli.config)?;
    let verbose = cli.verbose > 0;

    match cli.command {
        cli::Commands::Hash {
            root,
            algorithm,
            db,
            txt,
            on_error,
            yes,
        } => {
            let args = cli::hash::HashArgs {
                root,
                algorithm,
                db,
                txt,
                on_error,
                yes,
            };
            cli::hash::handle_hash_command(&config, args, verbose, cli.quiet)?;
            Ok(ExitCode::SUCCESS)
        }

        cli::Commands::Compare { first, second, out_dir } => {
            cli::compare::handle_compare_command(&config, first, second, out_dir, cli.quiet)?;
            Ok(ExitCode::SUCCESS)
        }

        cli::Commands::Verify {
            db,
            folder,
            algorithm,
            out_dir,
        } => {
            let args = cli::verify::VerifyArgs {
                db,
                folder,
                algorithm,
                out_dir,
            };
            let report = cli::verify::handle_verify_command(&config, args, verbose, cli.quiet)?;
            if report.interrupted {
                Err(DirhashError::Cancelled)
            } else if report.passed() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

/// `-q` keeps errors only; each `-v` raises the level. `RUST_LOG` still wins.
fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => log::LevelFilter::Error,
        (false, 0) => log::LevelFilter::Warn,
        (false, 1) => log::LevelFilter::Info,
        (false, _) => log::LevelFilter::Debug,
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).format_timestamp(None);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}
