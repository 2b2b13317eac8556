//! Rules Engine (C8): provider detection and priority-sorted parameter
//! injection for deployment-critical overlay keys.

pub mod bitnami;

use std::sync::{Arc, RwLock};

use irr_values::{Path, Value};
use thiserror::Error;

use crate::model::{ChartMetadata, Confidence, Detection, Parameter, ParameterType};

/// A provider-specific rule: detects whether it applies to a chart, and
/// exposes the overlay parameters it wants injected when it does.
pub trait Rule: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// Higher runs first; rules are sorted by priority at registration.
    fn priority(&self) -> i32;
    fn applies_to(&self, chart: &ChartMetadata) -> Detection;
    fn parameters(&self) -> Vec<Parameter>;
}

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rule `{rule}` failed to apply parameter `{path}`: {source}")]
    Apply {
        rule: &'static str,
        path: String,
        #[source]
        source: irr_values::SetPathError,
    },
}

/// A process-wide registry of [`Rule`]s.
///
/// Mutation (registering a rule) is serialized behind a single writer;
/// readers (rule enumeration during generation) take a read lock and
/// never observe a half-registered rule. Snapshots handed to callers are
/// `Arc` clones, not references into the lock.
pub struct RuleRegistry {
    rules: RwLock<Vec<Arc<dyn Rule>>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self {
            rules: RwLock::new(Vec::new()),
        }
    }

    /// The default registry: every built-in rule, in priority order.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register(Arc::new(bitnami::BitnamiRule));
        registry
    }

    /// Registers a rule and re-sorts the registry by priority
    /// (descending; ties keep registration order).
    pub fn register(&self, rule: Arc<dyn Rule>) {
        let mut rules = self.rules.write().expect("rule registry lock poisoned");
        rules.push(rule);
        rules.sort_by_key(|r| std::cmp::Reverse(r.priority()));
    }

    /// A read-only copy of the currently registered rules, in
    /// priority-then-registration order.
    pub fn snapshot(&self) -> Vec<Arc<dyn Rule>> {
        self.rules
            .read()
            .expect("rule registry lock poisoned")
            .clone()
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// One deployment-critical parameter the rules engine wrote to the
/// overlay, for reporting.
#[derive(Debug)]
pub struct AppliedParameter {
    pub rule: &'static str,
    pub parameter: Parameter,
}

/// Runs every registered rule against `chart`; for each whose detector
/// reports `confidence >= Medium`, writes its `DeploymentCritical`
/// parameters into `root`. `TestValidationOnly` parameters are returned
/// for validation tooling but never written.
pub fn apply_rules(
    registry: &RuleRegistry,
    chart: &ChartMetadata,
    root: &mut Value,
) -> Result<(Vec<AppliedParameter>, Vec<Parameter>), RuleError> {
    let mut applied = Vec::new();
    let mut test_only = Vec::new();

    for rule in registry.snapshot() {
        let detection = rule.applies_to(chart);
        if detection.confidence < Confidence::Medium {
            tracing::debug!(rule = rule.name(), confidence = ?detection.confidence, "rule skipped");
            continue;
        }

        tracing::info!(
            rule = rule.name(),
            confidence = ?detection.confidence,
            indicators = ?detection.indicators,
            "rule applies to chart"
        );

        for parameter in rule.parameters() {
            match parameter.parameter_type {
                ParameterType::DeploymentCritical => {
                    let path = parse_dot_path(&parameter.path);
                    root.set_path(&path, parameter.value.clone())
                        .map_err(|source| RuleError::Apply {
                            rule: rule.name(),
                            path: parameter.path.clone(),
                            source,
                        })?;
                    tracing::debug!(rule = rule.name(), path = %parameter.path, "wrote deployment-critical parameter");
                    applied.push(AppliedParameter {
                        rule: rule.name(),
                        parameter,
                    });
                }
                ParameterType::TestValidationOnly => test_only.push(parameter),
            }
        }
    }

    Ok((applied, test_only))
}

/// Parses a dot-notated parameter path (`global.security.allowInsecureImages`)
/// into a [`Path`]. Rule parameters never need bracket/index segments.
pub fn parse_dot_path(s: &str) -> Path {
    Path::from_segments(s.split('.').map(Into::into))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct HighPriority;
    impl Rule for HighPriority {
        fn name(&self) -> &'static str {
            "high"
        }
        fn description(&self) -> &'static str {
            "runs first"
        }
        fn priority(&self) -> i32 {
            100
        }
        fn applies_to(&self, _chart: &ChartMetadata) -> Detection {
            Detection {
                confidence: Confidence::High,
                ..Detection::none()
            }
        }
        fn parameters(&self) -> Vec<Parameter> {
            vec![]
        }
    }

    struct LowPriority;
    impl Rule for LowPriority {
        fn name(&self) -> &'static str {
            "low"
        }
        fn description(&self) -> &'static str {
            "runs second"
        }
        fn priority(&self) -> i32 {
            1
        }
        fn applies_to(&self, _chart: &ChartMetadata) -> Detection {
            Detection::none()
        }
        fn parameters(&self) -> Vec<Parameter> {
            vec![]
        }
    }

    #[test]
    fn registry_sorts_by_priority_descending() {
        let registry = RuleRegistry::new();
        registry.register(Arc::new(LowPriority));
        registry.register(Arc::new(HighPriority));

        let snapshot = registry.snapshot();
        assert_eq!(snapshot[0].name(), "high");
        assert_eq!(snapshot[1].name(), "low");
    }

    #[test]
    fn parses_dot_paths() {
        let path = parse_dot_path("global.security.allowInsecureImages");
        assert_eq!(path.render(), "global.security.allowInsecureImages");
    }
}
