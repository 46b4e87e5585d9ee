pub mod compare;
pub mod hash;
pub mod signal;
pub mod verify;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dirhash")]
#[command(about = "Content-hash inventories of directory trees: build, compare, verify", long_about = None)]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a TOML config file")]
    pub config: Option<PathBuf>,

    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count, help = "Verbose output (repeat for more)")]
    pub verbose: u8,

    #[arg(long, short = 'q', global = true, help = "Suppress non-error output")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Hash every file under a directory into a new inventory")]
    Hash {
        #[arg(help = "Directory to inventory")]
        root: PathBuf,

        #[arg(long, short = 'a', help = "Hash algorithm (md5, sha1, sha224, sha256, sha384, sha512)")]
        algorithm: Option<String>,

        #[arg(long, help = "Inventory database path [default: <root name>.db]")]
        db: Option<PathBuf>,

        #[arg(long, help = "Text mirror path [default: <root name>.txt]")]
        txt: Option<PathBuf>,

        #[arg(long, help = "What to do when a file cannot be read (abort, skip)")]
        on_error: Option<String>,

        #[arg(long, short = 'y', help = "Overwrite existing artifacts without asking")]
        yes: bool,
    },

    #[command(about = "Compare two inventories by content digest")]
    Compare {
        #[arg(help = "First inventory database")]
        first: PathBuf,

        #[arg(help = "Second inventory database")]
        second: PathBuf,

        #[arg(long, help = "Base directory for the run's output directory")]
        out_dir: Option<PathBuf>,
    },

    #[command(about = "Re-hash a directory and check it against an inventory")]
    Verify {
        #[arg(long, help = "Inventory database to verify against")]
        db: PathBuf,

        #[arg(long, help = "Live directory to check")]
        folder: PathBuf,

        #[arg(long, short = 'a', help = "Expected hash algorithm [default: the inventory's]")]
        algorithm: Option<String>,

        #[arg(long, help = "Base directory for the run's output directory")]
        out_dir: Option<PathBuf>,
    },
}
