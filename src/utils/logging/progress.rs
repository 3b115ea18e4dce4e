//! Progress reporting for pipeline stages, using the indicatif crate.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Template for the stage spinner
pub const STAGE_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{pos}/{len}] {msg}";

/// Spinner that advances once per pipeline stage.
///
/// Disabled instances are hidden, so callers never branch on whether
/// progress is shown.
pub struct StageProgress {
    bar: ProgressBar,
}

impl StageProgress {
    /// Create a stage tracker over `stages` steps
    #[must_use]
    pub fn new(stages: u64, enabled: bool) -> Self {
        let bar = if enabled {
            let bar = ProgressBar::new(stages);
            if let Ok(style) = ProgressStyle::default_spinner().template(STAGE_TEMPLATE) {
                bar.set_style(style);
            }
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        } else {
            ProgressBar::hidden()
        };
        Self { bar }
    }

    /// Announce the stage that is starting
    pub fn start(&self, stage: &str) {
        self.bar.set_message(stage.to_string());
    }

    /// Mark the current stage as done
    pub fn complete(&self) {
        self.bar.inc(1);
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Clear the spinner after a failure
    pub fn abandon(&self) {
        self.bar.finish_and_clear();
    }
}
