pub mod compare;
pub mod verify;

pub use compare::{compare_inventories, write_comparison, ComparisonArtifacts, ComparisonResult, ComparisonSummary};
pub use verify::{render_outcome, render_summary, resolve_live_path, verify_inventory, EntryOutcome, VerificationReport};
