//! Filter Engine (C4): accepts or rejects detected patterns by source and
//! exclude registry lists.

use crate::model::{ImagePattern, MappingConfig, Unsupported, UnsupportedKind};
use crate::reference::{self, parse_map, parse_string, ImageReference, ParseError};

/// Source/exclude configuration for the filter engine.
#[derive(Clone, Debug, Default)]
pub struct FilterConfig {
    pub sources: Vec<String>,
    pub excludes: Vec<String>,
}

impl FilterConfig {
    /// Builds a [`FilterConfig`], deriving `sources` from the mapping
    /// file's entries when the caller didn't explicitly provide any.
    ///
    /// Explicit sources always suppress derivation, even if empty was
    /// meant literally -- callers that want "no sources" should filter
    /// upstream instead of relying on this constructor.
    pub fn new(sources: Vec<String>, excludes: Vec<String>, mapping: &MappingConfig) -> Self {
        let sources: Vec<String> = if sources.is_empty() {
            let derived: Vec<String> = mapping
                .mappings
                .iter()
                .map(|m| reference::normalize_registry(&m.source))
                .collect();
            tracing::debug!(sources = ?derived, "derived source registries from mapping file");
            derived
        } else {
            sources
                .iter()
                .map(|s| reference::normalize_registry(s))
                .collect()
        };

        let excludes = excludes
            .iter()
            .map(|s| reference::normalize_registry(s))
            .collect();

        Self { sources, excludes }
    }

    fn accepts(&self, registry: &str) -> bool {
        let normalized = reference::normalize_registry_for_comparison(registry);
        let excluded = self
            .excludes
            .iter()
            .any(|e| reference::normalize_registry_for_comparison(e) == normalized);
        if excluded {
            return false;
        }
        self.sources
            .iter()
            .any(|s| reference::normalize_registry_for_comparison(s) == normalized)
    }
}

/// An eligible pattern, paired with its parsed reference.
pub struct Eligible {
    pub pattern: ImagePattern,
    pub reference: ImageReference,
}

/// The distinct, normalized source registries actually present among a
/// set of detected patterns, in first-seen order -- used by
/// `--generate-config-skeleton` (§6) to derive a mapping template from
/// the chart being inspected rather than emitting a generic placeholder.
pub fn detected_registries(patterns: &[ImagePattern]) -> Vec<String> {
    let mut seen = Vec::new();
    for pattern in patterns {
        let parsed = match &pattern.structure {
            Some(map) => parse_map(map, &pattern.path),
            None => parse_string(&pattern.value, &pattern.path),
        };
        if let Ok(reference) = parsed {
            let normalized = reference::normalize_registry(&reference.registry);
            if !seen.contains(&normalized) {
                seen.push(normalized);
            }
        }
    }
    seen
}

/// Parses every pattern and keeps only those whose registry passes the
/// filter. Parse failures and filtered-out sites are both dropped, but
/// only parse failures are recorded as unsupported -- a site that's
/// simply out of scope for this run isn't a defect.
pub fn filter(patterns: Vec<ImagePattern>, config: &FilterConfig) -> (Vec<Eligible>, Vec<Unsupported>) {
    let mut eligible = Vec::new();
    let mut unsupported = Vec::new();

    for pattern in patterns {
        let parsed = match &pattern.structure {
            Some(map) => parse_map(map, &pattern.path),
            None => parse_string(&pattern.value, &pattern.path),
        };

        let reference = match parsed {
            Ok(r) => r,
            Err(ParseError::HelmTemplate { path, original }) => {
                unsupported.push(Unsupported {
                    path,
                    kind: UnsupportedKind::HelmTemplate,
                    detail: original,
                });
                continue;
            }
            Err(ParseError::InvalidImageFormat { path, original }) => {
                unsupported.push(Unsupported {
                    path,
                    kind: UnsupportedKind::InvalidImageFormat,
                    detail: original,
                });
                continue;
            }
        };

        if config.accepts(&reference.registry) {
            eligible.push(Eligible { pattern, reference });
        }
    }

    (eligible, unsupported)
}
