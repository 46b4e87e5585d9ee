use indicatif::{ProgressBar, ProgressStyle};

const VERIFY_TEMPLATE: &str = "{spinner:.green} Verifying [{bar:40.cyan/blue}] {pos}/{len} entries ({per_sec}, {eta} left)";
const WALK_TEMPLATE: &str = "{spinner:.green} [{elapsed}] {pos} files hashed {wide_msg:.dim}";

/// Bar over the inventory's entry count.
pub fn create_verify_bar(entries: u64) -> ProgressBar {
    let style = ProgressStyle::with_template(VERIFY_TEMPLATE)
        .map(|s| s.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    ProgressBar::new(entries).with_style(style)
}

/// The walk's length is unknown up front, so hashing only counts.
pub fn create_walk_spinner() -> ProgressBar {
    let style = ProgressStyle::with_template(WALK_TEMPLATE).unwrap_or_else(|_| ProgressStyle::default_spinner());
    ProgressBar::new_spinner().with_style(style)
}
