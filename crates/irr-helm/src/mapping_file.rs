//! Registry mapping file (§6): the on-disk YAML format for
//! [`MappingConfig`], and the `--generate-config-skeleton` template.

use camino::Utf8Path;
use irr_core::errors::LoadingError;
use irr_core::model::{MappingConfig, RegistryMapping};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RawMapping {
    source: String,
    target: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawMappingFile {
    registries: RawRegistries,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRegistries {
    #[serde(default)]
    mappings: Vec<RawMapping>,
    #[serde(default)]
    default_target: Option<String>,
    #[serde(default)]
    strict_mode: bool,
}

/// Parses a registry mapping YAML file into a [`MappingConfig`].
pub fn load_mapping_file(path: &Utf8Path) -> Result<MappingConfig, LoadingError> {
    let contents = std::fs::read_to_string(path).map_err(|source| LoadingError::Io {
        path: path.to_string(),
        source,
    })?;

    let raw: RawMappingFile =
        serde_yaml::from_str(&contents).map_err(|source| LoadingError::ValuesParse {
            path: path.to_string(),
            source,
        })?;

    Ok(MappingConfig {
        mappings: raw
            .registries
            .mappings
            .into_iter()
            .map(|m| RegistryMapping {
                source: m.source,
                target: m.target,
            })
            .collect(),
        default_target: raw.registries.default_target,
        strict_mode: raw.registries.strict_mode,
    })
}

/// Builds the `--generate-config-skeleton` template (§6): one `mappings`
/// entry per source registry actually detected in the inspected chart,
/// each with a placeholder target the user fills in.
pub fn skeleton_yaml_for(detected_registries: &[String]) -> String {
    let mut out = String::from(
        "# Registry mapping configuration for irr.\n\
         #\n\
         # Each entry under `registries.mappings` redirects images from\n\
         # `source` to `target`. `defaultTarget` is used for any registry\n\
         # not listed under `mappings`; when both are absent, irr falls\n\
         # back to the target registry passed on the command line (unless\n\
         # `strictMode` is set, in which case an unmapped registry is an\n\
         # error).\n\
         registries:\n  mappings:\n",
    );
    if detected_registries.is_empty() {
        out.push_str("    - source: docker.io\n      target: registry.example.com/dockerio\n");
    } else {
        for registry in detected_registries {
            out.push_str(&format!(
                "    - source: {registry}\n      target: registry.example.com/{registry}\n",
            ));
        }
    }
    out.push_str("  defaultTarget: registry.example.com/generic\n  strictMode: false\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_mapping_file() {
        let dir = camino::Utf8PathBuf::from(std::env::temp_dir().to_string_lossy().to_string());
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("irr-helm-test-mapping-file.yaml");
        std::fs::write(
            &path,
            "registries:\n  mappings:\n    - source: docker.io\n      target: harbor.local/dockerio\n  defaultTarget: harbor.local/generic\n  strictMode: true\n",
        )
        .unwrap();

        let config = load_mapping_file(&path).unwrap();
        assert_eq!(config.mappings.len(), 1);
        assert_eq!(config.mappings[0].source, "docker.io");
        assert_eq!(config.default_target.as_deref(), Some("harbor.local/generic"));
        assert!(config.strict_mode);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn a_file_not_nested_under_registries_fails_to_parse() {
        let dir = camino::Utf8PathBuf::from(std::env::temp_dir().to_string_lossy().to_string());
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("irr-helm-test-mapping-file-flat.yaml");
        std::fs::write(
            &path,
            "mappings:\n  - source: docker.io\n    target: harbor.local/dockerio\n",
        )
        .unwrap();

        let err = load_mapping_file(&path).unwrap_err();
        assert!(matches!(err, LoadingError::ValuesParse { .. }));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn skeleton_parses_as_a_valid_mapping_file_and_lists_detected_registries() {
        let skeleton = skeleton_yaml_for(&["docker.io".to_string(), "quay.io".to_string()]);
        let raw: serde_yaml::Value = serde_yaml::from_str(&skeleton).unwrap();
        let mappings = raw.get("registries").unwrap().get("mappings").unwrap();
        assert_eq!(mappings.as_sequence().unwrap().len(), 2);
    }

    #[test]
    fn skeleton_falls_back_to_a_placeholder_when_nothing_was_detected() {
        let skeleton = skeleton_yaml_for(&[]);
        let raw: serde_yaml::Value = serde_yaml::from_str(&skeleton).unwrap();
        assert!(raw.get("registries").unwrap().get("mappings").is_some());
    }
}
