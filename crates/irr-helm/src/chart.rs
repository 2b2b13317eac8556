//! Chart loading: reads `Chart.yaml` and `values.yaml` off disk and
//! produces the [`ChartMetadata`] and merged [`Value`] tree the engine
//! operates on.

use camino::Utf8Path;
use indexmap::IndexMap;
use irr_core::errors::LoadingError;
use irr_core::model::ChartMetadata;
use irr_values::Value;
use serde::Deserialize;

/// The subset of `Chart.yaml` the rules engine's provider detectors need.
/// Helm's own `Chart.yaml` schema carries far more (icon, keywords,
/// annotations, ...); nothing else is read.
#[derive(Debug, Deserialize)]
struct RawChartYaml {
    #[serde(default)]
    name: String,
    #[serde(default)]
    home: Option<String>,
    #[serde(default)]
    maintainers: Vec<RawMaintainer>,
    #[serde(default)]
    dependencies: Vec<RawDependency>,
}

#[derive(Debug, Deserialize)]
struct RawMaintainer {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawDependency {
    #[serde(default)]
    name: String,
    #[serde(default)]
    repository: Option<String>,
    #[serde(default)]
    alias: Option<String>,
}

fn read_chart_yaml(chart_dir: &Utf8Path) -> Result<RawChartYaml, LoadingError> {
    let path = chart_dir.join("Chart.yaml");
    let contents =
        std::fs::read_to_string(&path).map_err(|_| LoadingError::ChartNotFound {
            path: path.to_string(),
        })?;
    serde_yaml::from_str(&contents).map_err(|source| LoadingError::ChartMetadata {
        path: path.to_string(),
        source,
    })
}

fn read_values_yaml(chart_dir: &Utf8Path) -> Result<Value, LoadingError> {
    let path = chart_dir.join("values.yaml");
    match std::fs::read_to_string(&path) {
        Ok(contents) => {
            let raw: serde_yaml::Value =
                serde_yaml::from_str(&contents).map_err(|source| LoadingError::ValuesParse {
                    path: path.to_string(),
                    source,
                })?;
            Ok(Value::from(raw))
        }
        // A chart with no values.yaml is valid Helm; it just has nothing
        // for the walker to inspect.
        Err(_) => Ok(Value::empty_map()),
    }
}

/// Recursively loads a chart directory's own values merged with each
/// vendored subchart's own values, keyed by the dependency's alias
/// (§4.3 "Subchart semantics": the walker runs once over the parent's
/// *merged* values, with each dependency's values nested under its alias).
///
/// A dependency not vendored under `charts/<name>/` is skipped -- it's
/// either fetched at `helm dependency update` time or not present in this
/// checkout, and there is nothing on disk to merge.
fn load_merged_values(chart_dir: &Utf8Path) -> Result<Value, LoadingError> {
    let raw = read_chart_yaml(chart_dir)?;
    let own_values = read_values_yaml(chart_dir)?;

    let charts_dir = chart_dir.join("charts");
    let mut subchart_tree = IndexMap::new();
    for dep in &raw.dependencies {
        let dep_dir = charts_dir.join(&dep.name);
        if !dep_dir.join("Chart.yaml").is_file() {
            continue;
        }
        let alias = dep.alias.clone().unwrap_or_else(|| dep.name.clone());
        let sub_values = load_merged_values(&dep_dir)?;
        subchart_tree.insert(alias, sub_values);
    }

    Ok(merge_values(Value::Map(subchart_tree), own_values))
}

/// Layers `over` on top of `base`, recursing into maps and merging keys;
/// a parent chart's own `values.yaml` entry for a subchart's alias (or
/// any other key) always wins over the subchart's own default.
fn merge_values(base: Value, over: Value) -> Value {
    match (base, over) {
        (Value::Map(mut base_map), Value::Map(over_map)) => {
            for (key, over_val) in over_map {
                let merged = match base_map.shift_remove(&key) {
                    Some(base_val) => merge_values(base_val, over_val),
                    None => over_val,
                };
                base_map.insert(key, merged);
            }
            Value::Map(base_map)
        }
        (_, over) => over,
    }
}

/// Reads `<chart_path>/Chart.yaml` and merges `<chart_path>/values.yaml`
/// with every vendored subchart's own values under its alias.
pub fn load_chart(chart_path: &Utf8Path) -> Result<(ChartMetadata, Value), LoadingError> {
    if !chart_path.exists() {
        return Err(LoadingError::ChartNotFound {
            path: chart_path.to_string(),
        });
    }

    let raw = read_chart_yaml(chart_path)?;
    let metadata = ChartMetadata {
        name: raw.name.clone(),
        home: raw.home.clone(),
        maintainers: raw.maintainers.iter().map(|m| m.name.clone()).collect(),
        dependencies: raw
            .dependencies
            .iter()
            .map(|d| match &d.repository {
                Some(repo) => format!("{}:{repo}", d.name),
                None => d.name.clone(),
            })
            .collect(),
    };

    let values = load_merged_values(chart_path)?;

    Ok((metadata, values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_chart(dir: &camino::Utf8Path, chart_yaml: &str, values_yaml: Option<&str>) {
        std::fs::create_dir_all(dir).unwrap();
        let mut chart_file = std::fs::File::create(dir.join("Chart.yaml")).unwrap();
        chart_file.write_all(chart_yaml.as_bytes()).unwrap();
        if let Some(values) = values_yaml {
            let mut values_file = std::fs::File::create(dir.join("values.yaml")).unwrap();
            values_file.write_all(values.as_bytes()).unwrap();
        }
    }

    #[test]
    fn loads_metadata_and_values() {
        let dir = camino::Utf8PathBuf::from(std::env::temp_dir().to_string_lossy().to_string())
            .join("irr-helm-test-loads-metadata-and-values");
        write_chart(
            &dir,
            "name: demo\nhome: https://bitnami.com/stacks/demo\nmaintainers:\n  - name: Bitnami Team\n",
            Some("image:\n  repository: myorg/demo\n  tag: v1\n"),
        );

        let (metadata, values) = load_chart(&dir).unwrap();
        assert_eq!(metadata.name, "demo");
        assert_eq!(metadata.home.as_deref(), Some("https://bitnami.com/stacks/demo"));
        assert_eq!(metadata.maintainers, vec!["Bitnami Team".to_string()]);

        let image = values.as_map().unwrap().get("image").unwrap().as_map().unwrap();
        assert_eq!(image.get("repository").unwrap().as_str(), Some("myorg/demo"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_values_yaml_is_not_an_error() {
        let dir = camino::Utf8PathBuf::from(std::env::temp_dir().to_string_lossy().to_string())
            .join("irr-helm-test-missing-values-yaml");
        write_chart(&dir, "name: demo\n", None);

        let (_, values) = load_chart(&dir).unwrap();
        assert!(values.as_map().unwrap().is_empty());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_chart_yaml_is_a_loading_error() {
        let dir = camino::Utf8PathBuf::from(std::env::temp_dir().to_string_lossy().to_string())
            .join("irr-helm-test-nonexistent-chart");
        std::fs::remove_dir_all(&dir).ok();

        let err = load_chart(&dir).unwrap_err();
        assert!(matches!(err, LoadingError::ChartNotFound { .. }));
    }

    #[test]
    fn merges_vendored_subchart_values_under_its_alias() {
        let dir = camino::Utf8PathBuf::from(std::env::temp_dir().to_string_lossy().to_string())
            .join("irr-helm-test-subchart-merge");
        std::fs::remove_dir_all(&dir).ok();

        write_chart(
            &dir,
            "name: parent\ndependencies:\n  - name: child\n    alias: childAlias\n    repository: https://example.com/charts\n",
            Some("parentImage: docker.io/parent/app:v1\n"),
        );
        write_chart(
            &dir.join("charts/child"),
            "name: child\n",
            Some("image:\n  repository: my-child-repo\n  tag: child-tag\n"),
        );

        let (metadata, values) = load_chart(&dir).unwrap();
        assert_eq!(metadata.name, "parent");

        let root = values.as_map().unwrap();
        assert_eq!(
            root.get("parentImage").unwrap().as_str(),
            Some("docker.io/parent/app:v1")
        );

        let child_image = root
            .get("childAlias")
            .unwrap()
            .as_map()
            .unwrap()
            .get("image")
            .unwrap()
            .as_map()
            .unwrap();
        assert_eq!(child_image.get("repository").unwrap().as_str(), Some("my-child-repo"));
        assert_eq!(child_image.get("tag").unwrap().as_str(), Some("child-tag"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn parent_values_override_subchart_defaults_for_the_same_alias_key() {
        let dir = camino::Utf8PathBuf::from(std::env::temp_dir().to_string_lossy().to_string())
            .join("irr-helm-test-subchart-override");
        std::fs::remove_dir_all(&dir).ok();

        write_chart(
            &dir,
            "name: parent\ndependencies:\n  - name: child\n",
            Some("child:\n  replicaCount: 3\n"),
        );
        write_chart(
            &dir.join("charts/child"),
            "name: child\n",
            Some("replicaCount: 1\nimage:\n  repository: my-child-repo\n  tag: v1\n"),
        );

        let (_, values) = load_chart(&dir).unwrap();
        let child = values.as_map().unwrap().get("child").unwrap().as_map().unwrap();
        assert_eq!(child.get("replicaCount"), Some(&Value::Int(3)));
        assert_eq!(
            child.get("image").unwrap().as_map().unwrap().get("repository").unwrap().as_str(),
            Some("my-child-repo")
        );

        std::fs::remove_dir_all(&dir).ok();
    }
}
