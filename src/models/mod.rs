//! Report document models and DTOs.

pub mod additional_report;
pub mod finding;
pub mod report;
