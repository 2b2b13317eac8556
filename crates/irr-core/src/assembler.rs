//! Override Assembler (C7): builds the minimal nested override tree,
//! preserving each site's original shape.

use indexmap::IndexMap;
use irr_values::{Path, SetPathError, Value};

use crate::model::PatternType;
use crate::reference::ImageReference;

/// Joins a target registry and a repository path with exactly one `/`,
/// regardless of whether either side carries a stray leading/trailing
/// slash.
fn join_address(target_registry: &str, new_path: &str) -> String {
    format!(
        "{}/{}",
        target_registry.trim_end_matches('/'),
        new_path.trim_start_matches('/')
    )
}

/// Writes one site's override into `root` at `path`, reconstructing only
/// the nested maps/sequences required to reach it -- no sibling key from
/// the original site is carried over.
///
/// `pattern_type` determines the written shape: a `String` site becomes a
/// single scalar (`"<target>/<path>:<tag>"` or `"...@<digest>"`), a `Map`
/// site becomes `{repository, tag|digest}` with the registry folded into
/// `repository` (the canonical Bitnami-compatible layout; no standalone
/// `registry` key is emitted).
pub fn assemble(
    root: &mut Value,
    path: &Path,
    pattern_type: PatternType,
    reference: &ImageReference,
    target_registry: &str,
    new_path: &str,
) -> Result<(), SetPathError> {
    let address = join_address(target_registry, new_path);

    let value = match pattern_type {
        PatternType::String => {
            let mut s = address;
            if let Some(digest) = &reference.digest {
                s.push('@');
                s.push_str(digest);
            } else if let Some(tag) = &reference.tag {
                s.push(':');
                s.push_str(tag);
            }
            Value::String(s)
        }
        PatternType::Map => {
            let mut map = IndexMap::new();
            map.insert("repository".to_string(), Value::String(address));
            if let Some(digest) = &reference.digest {
                map.insert("digest".to_string(), Value::String(digest.clone()));
            } else if let Some(tag) = &reference.tag {
                map.insert("tag".to_string(), Value::String(tag.clone()));
            }
            Value::Map(map)
        }
    };

    root.set_path(path, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::parse_string;

    #[test]
    fn string_site_joins_target_and_path_with_one_slash() {
        let path = Path::root().child("workerImage");
        let reference = parse_string("docker.io/myorg/stringapp:v2", &path).unwrap();
        let mut root = Value::empty_map();

        assemble(
            &mut root,
            &path,
            PatternType::String,
            &reference,
            "harbor.local/",
            "/dockerio/myorg/stringapp",
        )
        .unwrap();

        assert_eq!(
            root.get_path(&path).unwrap(),
            &Value::String("harbor.local/dockerio/myorg/stringapp:v2".into())
        );
    }

    #[test]
    fn map_site_folds_registry_into_repository_and_omits_siblings() {
        let path = Path::root().child("appImage");
        let reference = parse_string("docker.io/myorg/myapp:1.0.0", &path).unwrap();
        let mut root = Value::empty_map();

        assemble(
            &mut root,
            &path,
            PatternType::Map,
            &reference,
            "harbor.local",
            "dockerio/myorg/myapp",
        )
        .unwrap();

        let site = root.get_path(&path).unwrap().as_map().unwrap();
        assert_eq!(site.len(), 2);
        assert_eq!(
            site.get("repository"),
            Some(&Value::String("harbor.local/dockerio/myorg/myapp".into()))
        );
        assert_eq!(site.get("tag"), Some(&Value::String("1.0.0".into())));
        assert!(site.get("registry").is_none());
    }

    #[test]
    fn digest_wins_over_tag_in_both_shapes() {
        let digest = "sha256:".to_string() + &"a".repeat(64);
        let path = Path::root().child("image");
        let reference = parse_string(&format!("quay.io/org/app@{digest}"), &path).unwrap();
        let mut root = Value::empty_map();

        assemble(
            &mut root,
            &path,
            PatternType::Map,
            &reference,
            "harbor.local",
            "quayio/org/app",
        )
        .unwrap();

        let site = root.get_path(&path).unwrap().as_map().unwrap();
        assert_eq!(site.get("digest"), Some(&Value::String(digest)));
        assert!(site.get("tag").is_none());
    }
}
