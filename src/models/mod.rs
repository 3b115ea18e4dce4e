//! Domain models for the survey pipeline
//!
//! The composite identity and typed row views of the source and recoded tables.

pub mod identity;
pub mod record;

pub use identity::CompositeKey;
pub use record::{RecodedRecord, SurveyRecord};
