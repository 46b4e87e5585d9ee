pub mod analyze;
pub mod config;
pub mod db;
pub mod error;
pub mod index;
pub mod util;

pub use analyze::{
    compare_inventories, verify_inventory, write_comparison, ComparisonResult, EntryOutcome, VerificationReport,
};
pub use config::Config;
pub use db::{delete_if_exists, InventoryEntry, InventoryMeta, InventoryReader, InventoryStore};
pub use error::{DirhashError, Result};
pub use index::{
    walk_and_record, Algorithm, CancelToken, ErrorPolicy, HashEngine, HashOutput, Inventory, NoopObserver, RunOutcome,
    RunStatistics, ScanObserver, ScanOptions,
};
