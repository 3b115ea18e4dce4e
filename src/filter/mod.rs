//! Row filters used by the cleaning engine
//!
//! Each filter implements [`BatchFilter`] and returns a new batch holding only
//! the retained rows; the input batch is never modified.

pub mod core;
pub mod identity;
pub mod validity;

pub use self::core::{AndFilter, BatchFilter, filter_record_batch, int32_column, int64_column};
pub use identity::{DeduplicateFilter, KeyColumns};
pub use validity::{CompleteIdentityFilter, MinValueFilter};
