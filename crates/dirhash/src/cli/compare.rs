use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use console::style;
use dirhash_lib::{
    compare_inventories, util::format::format_elapsed, util::sink::create_output_dir, util::sink::LogSink,
    util::sink::LOG_FILE, write_comparison, Config, InventoryReader, Result,
};
use std::path::PathBuf;
use std::time::Instant;

pub fn handle_compare_command(
    config: &Config,
    first: PathBuf,
    second: PathBuf,
    out_dir: Option<PathBuf>,
    quiet: bool,
) -> Result<()> {
    let started = Instant::now();

    let base = out_dir.unwrap_or_else(|| config.output_dir.clone());
    let run_dir = create_output_dir(&base)?;
    let mut log = LogSink::create(run_dir.join(LOG_FILE), !quiet)?;

    log.line(format!("Comparing {} and {}", first.display(), second.display()))?;

    let outcome = (|| {
        let a = InventoryReader::open(&first)?;
        let b = InventoryReader::open(&second)?;
        let result = compare_inventories(&a, &b)?;
        let artifacts = write_comparison(&result, &run_dir)?;
        Ok((result, artifacts))
    })();

    let (result, artifacts) = match outcome {
        Ok(done) => done,
        Err(e) => {
            log.error(format!("Comparison failed: {}", e))?;
            return Err(e);
        }
    };

    let summary = result.summary();
    log.line(format!("Algorithm: {}", summary.algorithm))?;
    log.line(format!("Common files (both sides): {}", summary.common))?;
    log.line(format!("Unique to {}: {}", first.display(), summary.unique_to_first))?;
    log.line(format!("Unique to {}: {}", second.display(), summary.unique_to_second))?;
    log.line(format!("Common listing: {}", artifacts.common.display()))?;
    log.line(format!("Unique listings: {} and {}", artifacts.unique_to_first.display(), artifacts.unique_to_second.display()))?;
    log.line(format!("Elapsed: {}", format_elapsed(started.elapsed())))?;

    if !quiet {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec![
            Cell::new("Inventory").fg(Color::Cyan),
            Cell::new("Entries").fg(Color::Cyan),
            Cell::new("Common").fg(Color::Cyan),
            Cell::new("Unique").fg(Color::Cyan),
        ]);
        table.add_row(vec![
            Cell::new(first.display()),
            Cell::new(summary.common_in_first + summary.unique_to_first),
            Cell::new(summary.common_in_first),
            Cell::new(summary.unique_to_first),
        ]);
        table.add_row(vec![
            Cell::new(second.display()),
            Cell::new(summary.common_in_second + summary.unique_to_second),
            Cell::new(summary.common_in_second),
            Cell::new(summary.unique_to_second),
        ]);

        println!("\n{}", table);
        println!("\n{} Results in {}", style("✓").green(), style(run_dir.display()).cyan());
    }

    Ok(())
}
