//! Pipeline orchestration: source adapter, cleaning, recoding, then the
//! loader and aggregator as independent consumers of the recoded table.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aggregate::{TemporalAggregator, YearlyCategoryCounts};
use crate::clean::{CleaningEngine, CleaningReport};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::loader::{LoadReport, SqliteLoader};
use crate::reader::SourceAdapter;
use crate::recode::{RecodedTable, Recoder};
use crate::utils::logging::StageProgress;

const STAGES: u64 = 5;

/// Outcome of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Number of source extracts read
    pub source_files: usize,
    pub cleaning: CleaningReport,
    pub load: LoadReport,
    pub aggregates: Vec<YearlyCategoryCounts>,
}

impl PipelineSummary {
    /// Serialize the summary
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A configured pipeline run
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    #[must_use]
    pub const fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage once
    ///
    /// # Errors
    /// Returns the first stage error; nothing is written to the sink unless
    /// cleaning and recoding succeeded
    pub fn run(&self) -> Result<PipelineSummary> {
        self.config.validate()?;
        let progress = StageProgress::new(STAGES, self.config.show_progress);
        let result = self.run_stages(&progress);
        match &result {
            Ok(_) => progress.finish("Pipeline complete"),
            Err(e) => {
                progress.abandon();
                if e.is_logic_fault() {
                    log::error!("Aborting on logic fault: {e}");
                }
            }
        }
        result.map(|(summary, _)| summary)
    }

    /// Run every stage and also hand back the recoded table
    pub fn run_with_table(&self) -> Result<(PipelineSummary, RecodedTable)> {
        self.config.validate()?;
        self.run_stages(&StageProgress::new(STAGES, false))
    }

    fn run_stages(&self, progress: &StageProgress) -> Result<(PipelineSummary, RecodedTable)> {
        let started_at = Utc::now();
        log::info!(
            "Starting run over {} into table '{}' ({})",
            self.config.source_dir.display(),
            self.config.table_name,
            self.config.write_mode
        );

        progress.start("Reading source extracts");
        let raw = SourceAdapter::new(&self.config.source_dir)
            .with_batch_size(self.config.batch_size)
            .load()?;
        progress.complete();

        progress.start("Cleaning");
        let (cleaned, cleaning) = CleaningEngine::new().clean_raw(&raw)?;
        progress.complete();

        progress.start("Recoding");
        let recoded = Recoder::standard()?.recode(cleaned)?;
        progress.complete();

        progress.start("Loading");
        let mut loader = SqliteLoader::open(&self.config.sink)?;
        let load = loader.load(&recoded, &self.config.table_name, self.config.write_mode)?;
        progress.complete();

        progress.start("Aggregating");
        let aggregates = self
            .config
            .aggregate_fields
            .iter()
            .map(|&field| TemporalAggregator::aggregate(&recoded, field))
            .collect::<Result<Vec<_>>>()?;
        progress.complete();

        let summary = PipelineSummary {
            started_at,
            finished_at: Utc::now(),
            source_files: raw.files.len(),
            cleaning,
            load,
            aggregates,
        };
        log::info!(
            "Run finished: {} rows loaded, {} duplicates and {} invalid rows removed",
            summary.load.rows_written,
            summary.cleaning.duplicates_removed,
            summary.cleaning.invalid_removed
        );
        Ok((summary, recoded))
    }
}
