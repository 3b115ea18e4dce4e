use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use survey_etl::config::DEFAULT_TABLE_NAME;
use survey_etl::utils::logging::console::{print_category_counts, print_run_summary};
use survey_etl::{Pipeline, PipelineConfig, SurveyField, WriteMode};

/// Clean, recode and load household food-security survey extracts
#[derive(Parser, Debug)]
#[command(name = "survey-etl")]
#[command(version)]
struct Args {
    /// Directory holding one extract (CSV or Parquet) per census year
    #[arg(short, long, env = "SURVEY_SOURCE_DIR")]
    source_dir: PathBuf,

    /// Sink connection string: a SQLite database path or :memory:
    #[arg(long, env = "SURVEY_SINK")]
    sink: String,

    /// Name of the sink table
    #[arg(short, long, default_value = DEFAULT_TABLE_NAME)]
    table: String,

    /// What to do when the table exists: replace or fail
    #[arg(short, long, default_value = "fail")]
    mode: WriteMode,

    /// Categorical fields to summarize per census year
    #[arg(short, long, value_delimiter = ',', default_value = "HRFS12MD")]
    aggregate: Vec<SurveyField>,

    /// Write the run summary as JSON to this file
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// Disable the progress spinner
    #[arg(long)]
    no_progress: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    // batch size comes from SURVEY_BATCH_SIZE through the config default
    let config = PipelineConfig::new(&args.source_dir, args.sink)
        .with_table_name(args.table)
        .with_write_mode(args.mode)
        .with_aggregate_fields(args.aggregate)
        .with_progress(!args.no_progress);
    config.validate().context("Invalid configuration")?;

    info!("Processing survey extracts in {}", args.source_dir.display());
    let summary = Pipeline::new(config)
        .run()
        .with_context(|| format!("Pipeline failed for {}", args.source_dir.display()))?;

    print_run_summary(&summary);
    for counts in &summary.aggregates {
        print_category_counts(counts);
    }

    if let Some(path) = args.summary_json {
        std::fs::write(&path, summary.to_json()?)
            .with_context(|| format!("Cannot write summary to {}", path.display()))?;
        info!("Wrote run summary to {}", path.display());
    }

    Ok(())
}
