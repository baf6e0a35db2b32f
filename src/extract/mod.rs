//! Spreadsheet extract layer: workbook opening and template
//! normalization.
//!
//! Turns an uploaded floor-report workbook into a materialized sequence
//! of [`crate::domain::RawExtractRow`] with the canonical column schema.

pub mod normalizer;
pub mod workbook;

pub use normalizer::normalize_sheet;
pub use workbook::read_first_sheet;
