//! Bitnami provider detection and its post-validation fallback handler.

use irr_values::Value;

use crate::model::{ChartMetadata, Confidence, Detection, Parameter, ParameterType, Provider};

const BITNAMI_HOME_MARKER: &str = "bitnami.com";
const BITNAMI_MAINTAINER_MARKER: &str = "bitnami";
const BITNAMI_DEPENDENCY_MARKER: &str = "bitnami/common";

/// Detects Bitnami charts and injects the `global.security.allowInsecureImages`
/// override their substituted image registry requires.
///
/// Grounded on the home/maintainer/dependency indicator scoring zizmor's
/// [`crate::rules`] trait mirrors from `audit::Audit`, but the indicator set
/// itself -- home domain, maintainer name, the `bitnami/common` library
/// dependency -- is specific to this provider.
pub struct BitnamiRule;

impl super::Rule for BitnamiRule {
    fn name(&self) -> &'static str {
        "bitnami"
    }

    fn description(&self) -> &'static str {
        "Detects Bitnami-published charts and unlocks global.security.allowInsecureImages"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn applies_to(&self, chart: &ChartMetadata) -> Detection {
        let mut indicators = Vec::new();

        let home_hit = chart
            .home
            .as_deref()
            .is_some_and(|home| home.to_lowercase().contains(BITNAMI_HOME_MARKER));
        if home_hit {
            indicators.push(format!("home contains `{BITNAMI_HOME_MARKER}`"));
        }

        let maintainer_hit = chart
            .maintainers
            .iter()
            .any(|m| m.to_lowercase().contains(BITNAMI_MAINTAINER_MARKER));
        if maintainer_hit {
            indicators.push("maintainer name contains `bitnami`".to_string());
        }

        let dependency_hit = chart
            .dependencies
            .iter()
            .any(|d| d.to_lowercase().contains(BITNAMI_DEPENDENCY_MARKER));
        if dependency_hit {
            indicators.push(format!("depends on `{BITNAMI_DEPENDENCY_MARKER}`"));
        }

        // Home and maintainer together are conclusive regardless of how
        // many other indicators fired.
        let confidence = if home_hit && maintainer_hit {
            Confidence::High
        } else {
            Confidence::from_indicator_count(indicators.len())
        };

        if confidence == Confidence::None {
            return Detection::none();
        }

        Detection {
            provider: Provider::Bitnami,
            confidence,
            indicators,
        }
    }

    fn parameters(&self) -> Vec<Parameter> {
        vec![Parameter {
            path: "global.security.allowInsecureImages".to_string(),
            value: Value::Bool(true),
            parameter_type: ParameterType::DeploymentCritical,
        }]
    }
}

/// The substrings `helm template`/`helm install --dry-run` emits when a
/// Bitnami chart rejects a rewritten registry under its default image
/// verification policy.
const FALLBACK_MARKERS: [&str; 3] = [
    "original containers have been substituted for unrecognized ones",
    "non-standard containers",
    "global.security.allowinsecureimages",
];

/// What to do in response to a Bitnami validation failure: re-run
/// validation with the named override set.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FallbackDirective {
    pub set_path: &'static str,
    pub set_value: bool,
}

/// Inspects a `helm template`/`helm install --dry-run` failure for the
/// Bitnami image-verification signature (exit code 16 plus the three
/// marker substrings, matched case-insensitively since Helm's own casing
/// has varied across versions) and, if found, returns the retry directive.
pub fn check_validation_failure(exit_code: i32, stderr: &str) -> Option<FallbackDirective> {
    if exit_code != 16 {
        return None;
    }

    let lower = stderr.to_lowercase();
    let all_markers_present = FALLBACK_MARKERS.iter().all(|marker| lower.contains(marker));

    if all_markers_present {
        Some(FallbackDirective {
            set_path: "global.security.allowInsecureImages",
            set_value: true,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rule;

    fn chart(home: Option<&str>, maintainers: &[&str], dependencies: &[&str]) -> ChartMetadata {
        ChartMetadata {
            name: "test".to_string(),
            home: home.map(str::to_string),
            maintainers: maintainers.iter().map(|s| s.to_string()).collect(),
            dependencies: dependencies.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn no_indicators_means_no_detection() {
        let rule = BitnamiRule;
        let detection = rule.applies_to(&chart(None, &[], &[]));
        assert_eq!(detection.confidence, Confidence::None);
    }

    #[test]
    fn home_and_maintainer_together_is_high_confidence_regardless_of_count() {
        let rule = BitnamiRule;
        let detection = rule.applies_to(&chart(
            Some("https://bitnami.com/stacks/postgresql"),
            &["Bitnami Team"],
            &[],
        ));
        assert_eq!(detection.confidence, Confidence::High);
        assert_eq!(detection.provider, Provider::Bitnami);
    }

    #[test]
    fn single_indicator_is_low_confidence() {
        let rule = BitnamiRule;
        let detection = rule.applies_to(&chart(None, &[], &["bitnami/common"]));
        assert_eq!(detection.confidence, Confidence::Low);
    }

    #[test]
    fn parameters_write_allow_insecure_images() {
        let rule = BitnamiRule;
        let params = rule.parameters();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].path, "global.security.allowInsecureImages");
        assert_eq!(params[0].value, Value::Bool(true));
        assert_eq!(params[0].parameter_type, ParameterType::DeploymentCritical);
    }

    #[test]
    fn recognizes_full_bitnami_failure_signature() {
        let stderr = "Error: INSTALLATION FAILED: original containers have been \
            substituted for unrecognized ones; set global.security.allowInsecureImages=true \
            to allow non-standard containers";
        let directive = check_validation_failure(16, stderr).unwrap();
        assert_eq!(directive.set_path, "global.security.allowInsecureImages");
        assert!(directive.set_value);
    }

    #[test]
    fn wrong_exit_code_is_not_a_bitnami_fallback() {
        assert!(check_validation_failure(1, "non-standard containers").is_none());
    }

    #[test]
    fn partial_marker_match_is_not_a_bitnami_fallback() {
        assert!(check_validation_failure(16, "non-standard containers only").is_none());
    }
}
