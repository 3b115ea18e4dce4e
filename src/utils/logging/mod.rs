//! Logging utilities for stage reporting and progress tracking

pub mod console;
pub mod log;
pub mod progress;

pub use log::{log_operation_complete, log_operation_start, log_stage, log_warning};
pub use progress::StageProgress;
