pub mod format;
pub mod progress;
pub mod sink;

pub use format::{format_bytes, format_elapsed, format_timestamp};
pub use progress::{create_verify_bar, create_walk_spinner};
pub use sink::{create_output_dir, LogSink, LOG_FILE, OUT_DIR_PREFIX};
