//! Error taxonomy (§7): every failure mode the generator controller can
//! surface, plus the exit-code mapping the CLI binary reads off of it (§6).

use thiserror::Error;

use crate::mapping::UnmappedRegistry;
use crate::model::Unsupported;
use irr_values::SetPathError;

/// The chart or its values file(s) could not be loaded at all.
///
/// `ChartNotFound`/`Io` are input/config problems (a bad path, an
/// unreadable mapping file); `ValuesParse`/`ChartMetadata` are chart
/// *parsing* failures once a readable file turned out to be malformed.
/// The two groups map to different exit codes (§6: 2 vs. 10).
#[derive(Debug, Error)]
pub enum LoadingError {
    #[error("chart path `{path}` does not exist or is not readable")]
    ChartNotFound { path: String },
    #[error("I/O error at `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse values file `{path}`: {source}")]
    ValuesParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Chart.yaml at `{path}` is missing or malformed: {source}")]
    ChartMetadata {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

impl LoadingError {
    fn exit_code(&self) -> i32 {
        match self {
            LoadingError::ChartNotFound { .. } | LoadingError::Io { .. } => 2,
            LoadingError::ValuesParse { .. } | LoadingError::ChartMetadata { .. } => 10,
        }
    }
}

/// Step 3 of the controller's orchestration (§4.9): under `--strict`, a
/// template or otherwise unparseable site detected by the walker aborts
/// the run before any output is formed.
#[derive(Debug, Error)]
#[error("unsupported structure at `{path}`: {detail}")]
pub struct UnsupportedStructureError {
    pub path: String,
    pub detail: String,
}

/// The aggregated per-site failures from the filter/parse/resolve/path/
/// assemble loop (§4.9 step 4). Not fatal by itself -- the controller
/// returns a result alongside these unless `--strict` is set, in which
/// case they're wrapped in a [`ProcessingError`].
#[derive(Debug, Error)]
#[error("{} of {} eligible image sites could not be processed", .sites.len(), .total_eligible)]
pub struct ImageProcessingError {
    pub sites: Vec<Unsupported>,
    pub total_eligible: usize,
}

/// The run's success rate fell below the configured threshold.
#[derive(Debug, Error)]
#[error("success rate {achieved:.1}% is below the required {required:.1}% ({processed}/{eligible} processed)")]
pub struct ThresholdError {
    pub achieved: f64,
    pub required: f64,
    pub processed: usize,
    pub eligible: usize,
}

/// Step 6 of the controller's orchestration: under `--strict`, any
/// per-site error from the loop fails the whole run.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ProcessingError(#[from] pub ImageProcessingError);

/// A failure writing a single rule's parameter into the overlay.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct RuleApplicationError(#[from] pub SetPathError);

/// The top-level error the generator controller returns. Each variant's
/// exit code is fixed by [`GeneratorError::exit_code`]; see §6 for the
/// CLI-facing contract.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error(transparent)]
    Loading(#[from] LoadingError),
    #[error(transparent)]
    UnsupportedStructure(#[from] UnsupportedStructureError),
    #[error(transparent)]
    Processing(#[from] ProcessingError),
    #[error(transparent)]
    Threshold(#[from] ThresholdError),
    #[error(transparent)]
    UnmappedRegistry(#[from] UnmappedRegistry),
    #[error(transparent)]
    RuleApplication(#[from] RuleApplicationError),
    /// Validation against the rendered chart failed with Helm's own exit
    /// code attached (see [`crate::rules::bitnami::check_validation_failure`]
    /// for the one fallback path that retries instead of surfacing this).
    #[error("chart validation failed (helm exit code {helm_exit_code}): {stderr}")]
    ValidationFailed { helm_exit_code: i32, stderr: String },
    #[error("operation canceled")]
    Canceled,
}

impl GeneratorError {
    /// The process exit code this error maps to (§6).
    pub fn exit_code(&self) -> i32 {
        match self {
            GeneratorError::Loading(inner) => inner.exit_code(),
            GeneratorError::Processing(_) => 11,
            GeneratorError::UnsupportedStructure(_) => 12,
            GeneratorError::Threshold(_) => 13,
            // An unmapped registry under the mapping file's own strict
            // mode is a per-site processing failure that happens to be
            // detected during mapping resolution rather than assembly.
            GeneratorError::UnmappedRegistry(_) => 11,
            GeneratorError::RuleApplication(_) => 20,
            GeneratorError::ValidationFailed { .. } => 16,
            GeneratorError::Canceled => 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_the_documented_mapping() {
        assert_eq!(
            GeneratorError::Loading(LoadingError::ChartNotFound {
                path: "chart".into()
            })
            .exit_code(),
            2
        );
        assert_eq!(
            GeneratorError::Loading(LoadingError::ValuesParse {
                path: "values.yaml".into(),
                source: serde_yaml::from_str::<serde_yaml::Value>(":: not yaml").unwrap_err(),
            })
            .exit_code(),
            10
        );
        assert_eq!(
            GeneratorError::Processing(ProcessingError(ImageProcessingError {
                sites: vec![],
                total_eligible: 1
            }))
            .exit_code(),
            11
        );
        assert_eq!(
            GeneratorError::UnsupportedStructure(UnsupportedStructureError {
                path: "image".into(),
                detail: "template".into(),
            })
            .exit_code(),
            12
        );
        assert_eq!(
            GeneratorError::Threshold(ThresholdError {
                achieved: 50.0,
                required: 100.0,
                processed: 1,
                eligible: 2,
            })
            .exit_code(),
            13
        );
        assert_eq!(
            GeneratorError::UnmappedRegistry(UnmappedRegistry("quay.io".into())).exit_code(),
            11
        );
        assert_eq!(
            GeneratorError::ValidationFailed {
                helm_exit_code: 16,
                stderr: String::new()
            }
            .exit_code(),
            16
        );
    }
}
