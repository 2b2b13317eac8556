//! Mapping Resolver (C6): resolves source -> target registry redirection.

use thiserror::Error;

use crate::model::MappingConfig;
use crate::reference::normalize_registry_for_comparison;

#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("registry `{0}` has no mapping and the mapping file is in strict mode")]
pub struct UnmappedRegistry(pub String);

/// The outcome of resolving one registry against a [`MappingConfig`].
pub struct Resolved {
    pub target: String,
    /// `true` iff neither an explicit mapping nor `defaultTarget` matched,
    /// and resolution fell through to the CLI-level target registry.
    pub unmapped: bool,
}

/// Resolves `registry` against `mapping`, falling back to `cli_target`.
///
/// Precedence, highest first: (1) the first explicit mapping whose
/// normalized source equals `registry`; (2) `mapping.default_target`;
/// (3) `cli_target`. If resolution reaches (3) and `mapping.strict_mode`
/// is set, the registry is unmapped under strict mode and this returns
/// an error instead.
pub fn resolve(
    mapping: &MappingConfig,
    registry: &str,
    cli_target: &str,
) -> Result<Resolved, UnmappedRegistry> {
    let normalized = normalize_registry_for_comparison(registry);

    if let Some(entry) = mapping
        .mappings
        .iter()
        .find(|m| normalize_registry_for_comparison(&m.source) == normalized)
    {
        tracing::debug!(registry, target = %entry.target, "resolved via explicit mapping");
        return Ok(Resolved {
            target: entry.target.clone(),
            unmapped: false,
        });
    }

    if let Some(default_target) = &mapping.default_target {
        tracing::debug!(registry, target = %default_target, "resolved via defaultTarget");
        return Ok(Resolved {
            target: default_target.clone(),
            unmapped: false,
        });
    }

    if mapping.strict_mode {
        tracing::warn!(registry, "unmapped registry rejected under mapping strict mode");
        return Err(UnmappedRegistry(registry.to_string()));
    }

    tracing::debug!(registry, target = cli_target, "falling back to CLI target registry");
    Ok(Resolved {
        target: cli_target.to_string(),
        unmapped: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RegistryMapping;

    #[test]
    fn explicit_mapping_wins_over_default_and_cli() {
        let config = MappingConfig {
            mappings: vec![RegistryMapping {
                source: "docker.io".into(),
                target: "harbor.local/dockerio".into(),
            }],
            default_target: Some("harbor.local/generic".into()),
            strict_mode: false,
        };

        let resolved = resolve(&config, "docker.io", "cli.target").unwrap();
        assert_eq!(resolved.target, "harbor.local/dockerio");
        assert!(!resolved.unmapped);
    }

    #[test]
    fn default_target_wins_over_cli() {
        let config = MappingConfig {
            mappings: vec![],
            default_target: Some("harbor.local/generic".into()),
            strict_mode: false,
        };
        let resolved = resolve(&config, "quay.io", "cli.target").unwrap();
        assert_eq!(resolved.target, "harbor.local/generic");
    }

    #[test]
    fn falls_back_to_cli_target_when_unmapped_and_not_strict() {
        let config = MappingConfig::default();
        let resolved = resolve(&config, "quay.io", "cli.target").unwrap();
        assert_eq!(resolved.target, "cli.target");
        assert!(resolved.unmapped);
    }

    #[test]
    fn strict_mode_rejects_unmapped_registry() {
        let config = MappingConfig {
            strict_mode: true,
            ..Default::default()
        };
        let err = resolve(&config, "quay.io", "cli.target").unwrap_err();
        assert_eq!(err.0, "quay.io");
    }
}
