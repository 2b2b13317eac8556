//! Helm-specific collaborators for the IRR engine: chart loading from
//! disk, the registry mapping file format, and `helm template`-backed
//! validation.

pub mod chart;
pub mod mapping_file;
pub mod validate;

pub use chart::load_chart;
pub use mapping_file::load_mapping_file;
pub use validate::{validate, ValidateOutcome};
