pub mod cancel;
pub mod hasher;
pub mod inventory;
pub mod mirror;
pub mod scanner;
pub mod stats;

pub use cancel::CancelToken;
pub use hasher::{Algorithm, HashEngine, HashOutput, DEFAULT_BUFFER_SIZE};
pub use inventory::Inventory;
pub use mirror::MirrorWriter;
pub use scanner::{walk_and_record, ErrorPolicy, NoopObserver, ScanObserver, ScanOptions};
pub use stats::{RunOutcome, RunStatistics};
