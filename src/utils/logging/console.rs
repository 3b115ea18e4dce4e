//! Console output utilities

use crate::aggregate::YearlyCategoryCounts;
use crate::pipeline::PipelineSummary;

/// Print the cleaning and load counts of a run
pub fn print_run_summary(summary: &PipelineSummary) {
    let cleaning = &summary.cleaning;
    println!("Read {} rows from {} files", cleaning.input_rows, summary.source_files);
    println!("  duplicate identities removed: {}", cleaning.duplicates_removed);
    println!("  invalid rows removed:         {}", cleaning.invalid_removed);
    println!("  rows retained:                {}", cleaning.retained_rows);
    println!(
        "Loaded {} rows into '{}' ({})",
        summary.load.rows_written, summary.load.table, summary.load.write_mode
    );
}

/// Print category counts as a year-by-label table
pub fn print_category_counts(counts: &YearlyCategoryCounts) {
    println!("{}:", counts.field);
    let header = counts
        .years
        .iter()
        .map(|y| format!("{y:>8}"))
        .collect::<String>();
    println!("  {:<28}{header}", "");
    for (label, series) in &counts.counts {
        let row = series.iter().map(|c| format!("{c:>8}")).collect::<String>();
        println!("  {label:<28}{row}");
    }
}
