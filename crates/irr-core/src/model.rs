//! Shared data model (§3): the record types produced and consumed by the
//! walker, filter, rules engine, and generator controller.

use indexmap::IndexMap;
use irr_values::{Path, Value};
use serde::Serialize;

/// The shape an [`ImagePattern`] site had in the source tree.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternType {
    String,
    Map,
}

/// A located occurrence of an image reference inside the values tree.
#[derive(Clone, Debug, Serialize)]
pub struct ImagePattern {
    pub path: Path,
    pub pattern_type: PatternType,
    /// The sibling keys of the image site, when `pattern_type == Map`.
    pub structure: Option<IndexMap<String, Value>>,
    /// Reconstructed canonical string, for reporting.
    pub value: String,
    pub count: u32,
}

/// A site whose leaf key is `global` or begins with `global.`, recorded
/// for observability only -- it is never overridden.
#[derive(Clone, Debug, Serialize)]
pub struct GlobalPattern {
    pub path: Path,
}

/// The reason a site could not be turned into an override.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum UnsupportedKind {
    HelmTemplate,
    InvalidImageFormat,
    OverrideSetError,
    AnalysisError,
    UnmappedRegistry,
}

#[derive(Clone, Debug, Serialize)]
pub struct Unsupported {
    pub path: Path,
    pub kind: UnsupportedKind,
    /// A human-readable detail, typically the offending original value.
    pub detail: String,
}

/// The generated overlay, plus the bookkeeping the controller aggregated
/// while producing it.
#[derive(Clone, Debug, Serialize)]
pub struct OverrideFile {
    pub chart_path: String,
    pub chart_name: String,
    pub values: Value,
    pub unsupported: Vec<Unsupported>,
    pub processed_count: usize,
    pub total_count: usize,
    pub success_rate: f64,
}

/// Confidence that a provider-specific rule's detector has correctly
/// identified the provider.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Confidence from an indicator count: 0 -> None, 1 -> Low, 2 -> Medium,
    /// >= 3 -> High.
    pub fn from_indicator_count(count: usize) -> Self {
        match count {
            0 => Confidence::None,
            1 => Confidence::Low,
            2 => Confidence::Medium,
            _ => Confidence::High,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub enum Provider {
    Unknown,
    Bitnami,
    Other(String),
}

/// The result of running one provider detector against a chart.
#[derive(Clone, Debug, Serialize)]
pub struct Detection {
    pub provider: Provider,
    pub confidence: Confidence,
    pub indicators: Vec<String>,
}

impl Detection {
    pub fn none() -> Self {
        Self {
            provider: Provider::Unknown,
            confidence: Confidence::None,
            indicators: Vec::new(),
        }
    }
}

/// Whether a rule's parameter is safe to write to the generated overlay.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum ParameterType {
    /// Required for the rewritten images to actually deploy; written to
    /// the overlay.
    DeploymentCritical,
    /// Useful for validation tooling, but never written to the overlay.
    TestValidationOnly,
}

#[derive(Clone, Debug, Serialize)]
pub struct Parameter {
    /// Dot-notated path, e.g. `global.security.allowInsecureImages`.
    pub path: String,
    pub value: Value,
    pub parameter_type: ParameterType,
}

/// The minimal chart metadata a [`crate::rules::Rule`] needs in order to
/// decide whether it applies. Populated by the chart-loading collaborator.
#[derive(Clone, Debug, Default)]
pub struct ChartMetadata {
    pub name: String,
    pub home: Option<String>,
    pub maintainers: Vec<String>,
    pub dependencies: Vec<String>,
}

/// One entry in a registry mapping file (§6).
#[derive(Clone, Debug)]
pub struct RegistryMapping {
    pub source: String,
    pub target: String,
}

/// Parsed registry-mapping configuration: precedence rules for C6.
#[derive(Clone, Debug, Default)]
pub struct MappingConfig {
    pub mappings: Vec<RegistryMapping>,
    pub default_target: Option<String>,
    pub strict_mode: bool,
}
