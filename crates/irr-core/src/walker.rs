//! Values Walker / Pattern Detector (C3).
//!
//! A single-threaded, deterministic depth-first traversal over a chart's
//! merged values tree. Map iteration order follows [`indexmap::IndexMap`]'s
//! insertion order, which is itself fixed by the order the loader produced
//! (typically source-document order) -- stable within one run, per the
//! walker's determinism invariant.

use indexmap::IndexMap;

use irr_values::{Path, Value};

use crate::cancel::CancellationToken;
use crate::model::{GlobalPattern, ImagePattern, PatternType, Unsupported, UnsupportedKind};
use crate::reference::is_template;

/// Everything the walker observed on one pass over a values tree.
#[derive(Debug, Default)]
pub struct WalkResult {
    pub patterns: Vec<ImagePattern>,
    pub unsupported: Vec<Unsupported>,
    pub globals: Vec<GlobalPattern>,
    /// Set when a cancellation signal interrupted the walk before every
    /// top-level key was visited; any patterns collected so far are
    /// partial.
    pub canceled: bool,
}

/// Runs the walker over `root`, the chart's merged values document,
/// polling `cancel` once per top-level key (§5: "per top-level values
/// key, per pattern").
pub fn walk(root: &Value, cancel: &CancellationToken) -> WalkResult {
    let mut result = WalkResult::default();
    walk_node(root, &Path::root(), cancel, &mut result);
    result
}

fn walk_node(node: &Value, path: &Path, cancel: &CancellationToken, result: &mut WalkResult) {
    match node {
        Value::Map(map) => walk_map(map, path, cancel, result),
        Value::Seq(seq) => walk_seq(seq, path, cancel, result),
        // A bare top-level string/scalar has no key to apply the
        // image-key heuristic against, so there's nothing to detect.
        _ => {}
    }
}

fn walk_map(
    map: &IndexMap<String, Value>,
    path: &Path,
    cancel: &CancellationToken,
    result: &mut WalkResult,
) {
    if is_image_map_shape(map) {
        emit_map_pattern(map, path, result);
        return;
    }

    for (key, value) in map {
        if path.is_root() && cancel.is_canceled() {
            result.canceled = true;
            return;
        }

        let child_path = path.child(key.as_str());

        if is_global_leaf_key(key) {
            result.globals.push(GlobalPattern {
                path: child_path.clone(),
            });
        }

        match value {
            Value::String(s) => {
                if is_template(s) {
                    result.unsupported.push(Unsupported {
                        path: child_path,
                        kind: UnsupportedKind::HelmTemplate,
                        detail: s.clone(),
                    });
                } else if is_image_key(key) && looks_like_image_string(s) {
                    result.patterns.push(ImagePattern {
                        path: child_path,
                        pattern_type: PatternType::String,
                        structure: None,
                        value: s.clone(),
                        count: 1,
                    });
                }
            }
            _ => walk_node(value, &child_path, cancel, result),
        }
    }
}

fn walk_seq(seq: &[Value], path: &Path, cancel: &CancellationToken, result: &mut WalkResult) {
    for (i, element) in seq.iter().enumerate() {
        let elem_path = path.child(i);

        match element {
            Value::Map(map) if is_image_map_shape(map) => {
                emit_map_pattern(map, &elem_path, result);
            }
            Value::Map(map) => {
                if let Some(Value::String(s)) = map.get("image") {
                    if is_template(s) {
                        result.unsupported.push(Unsupported {
                            path: elem_path.child("image"),
                            kind: UnsupportedKind::HelmTemplate,
                            detail: s.clone(),
                        });
                        continue;
                    } else if looks_like_image_string(s) {
                        result.patterns.push(ImagePattern {
                            path: elem_path.child("image"),
                            pattern_type: PatternType::String,
                            structure: None,
                            value: s.clone(),
                            count: 1,
                        });
                        continue;
                    }
                }
                walk_map(map, &elem_path, cancel, result);
            }
            Value::String(s) if is_template(s) => {
                result.unsupported.push(Unsupported {
                    path: elem_path,
                    kind: UnsupportedKind::HelmTemplate,
                    detail: s.clone(),
                });
            }
            Value::String(s) if looks_like_image_string(s) => {
                result.patterns.push(ImagePattern {
                    path: elem_path,
                    pattern_type: PatternType::String,
                    structure: None,
                    value: s.clone(),
                    count: 1,
                });
            }
            Value::Seq(inner) => walk_seq(inner, &elem_path, cancel, result),
            _ => {}
        }
    }
}

fn emit_map_pattern(map: &IndexMap<String, Value>, path: &Path, result: &mut WalkResult) {
    result.patterns.push(ImagePattern {
        path: path.clone(),
        pattern_type: PatternType::Map,
        structure: Some(map.clone()),
        value: render_map_value(map),
        count: 1,
    });
}

fn render_map_value(map: &IndexMap<String, Value>) -> String {
    let registry = map.get("registry").and_then(Value::as_str).unwrap_or("");
    let repository = map.get("repository").and_then(Value::as_str).unwrap_or("");
    let mut s = if registry.is_empty() {
        repository.to_string()
    } else {
        format!("{registry}/{repository}")
    };
    if let Some(digest) = map.get("digest").and_then(Value::as_str) {
        s.push('@');
        s.push_str(digest);
    } else if let Some(tag) = map.get("tag") {
        if let Some(tag) = tag.as_coerced_tag() {
            s.push(':');
            s.push_str(&tag);
        }
    }
    s
}

/// A map matches the "image-map shape" iff it has `repository` and at
/// least one of `registry`, `tag`, or `digest`.
///
/// The spec's literal wording only names `registry`/`tag` as the
/// alternative; `digest` is included too so that digest-pinned,
/// registry-less sites (common in Bitnami-style charts) are still
/// detected as map sites rather than falling through undetected.
fn is_image_map_shape(map: &IndexMap<String, Value>) -> bool {
    map.contains_key("repository")
        && (map.contains_key("registry") || map.contains_key("tag") || map.contains_key("digest"))
}

fn is_image_key(key: &str) -> bool {
    key.to_lowercase().contains("image")
}

/// A leaf key is a "global" site iff it equals `global`, or begins with
/// the literal substring `global.` (a single dotted key, not a nested
/// path).
fn is_global_leaf_key(key: &str) -> bool {
    key == "global" || key.starts_with("global.")
}

/// The walker's string heuristic: at least two `/`-delimited parts, with
/// the last part containing `:` or `@`.
fn looks_like_image_string(s: &str) -> bool {
    let parts: Vec<&str> = s.split('/').collect();
    parts.len() >= 2
        && parts
            .last()
            .is_some_and(|last| last.contains(':') || last.contains('@'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn map(pairs: &[(&str, Value)]) -> Value {
        let mut m = IndexMap::new();
        for (k, v) in pairs {
            m.insert(k.to_string(), v.clone());
        }
        Value::Map(m)
    }

    #[test]
    fn detects_map_shaped_site_without_recursing() {
        let root = map(&[(
            "appImage",
            map(&[
                ("registry", Value::String("docker.io".into())),
                ("repository", Value::String("myorg/myapp".into())),
                ("tag", Value::String("1.0.0".into())),
            ]),
        )]);

        let result = walk(&root, &CancellationToken::new());
        assert_eq!(result.patterns.len(), 1);
        assert_eq!(result.patterns[0].path.render(), "appImage");
        assert_eq!(result.patterns[0].pattern_type, PatternType::Map);
    }

    #[test]
    fn detects_string_site_by_image_key_and_shape() {
        let root = map(&[(
            "workerImage",
            Value::String("docker.io/myorg/stringapp:v2".into()),
        )]);

        let result = walk(&root, &CancellationToken::new());
        assert_eq!(result.patterns.len(), 1);
        assert_eq!(result.patterns[0].path.render(), "workerImage");
        assert_eq!(result.patterns[0].pattern_type, PatternType::String);
    }

    #[test]
    fn does_not_detect_string_without_image_key() {
        let root = map(&[("repo", Value::String("docker.io/myorg/app:v2".into()))]);
        let result = walk(&root, &CancellationToken::new());
        assert!(result.patterns.is_empty());
    }

    #[test]
    fn records_templates_as_unsupported_not_patterns() {
        let root = map(&[("image", Value::String("{{ .Values.tag }}".into()))]);
        let result = walk(&root, &CancellationToken::new());
        assert!(result.patterns.is_empty());
        assert_eq!(result.unsupported.len(), 1);
        assert_eq!(result.unsupported[0].kind, UnsupportedKind::HelmTemplate);
    }

    #[test]
    fn records_global_leaf_key() {
        let root = map(&[("global", map(&[("image", Value::String("x".into()))]))]);
        let result = walk(&root, &CancellationToken::new());
        assert_eq!(result.globals.len(), 1);
        assert_eq!(result.globals[0].path.render(), "global");
    }

    #[test]
    fn records_dotted_global_prefixed_leaf_key() {
        let root = map(&[(
            "global.registry",
            map(&[("image", Value::String("x".into()))]),
        )]);
        let result = walk(&root, &CancellationToken::new());
        assert_eq!(result.globals.len(), 1);
        assert_eq!(result.globals[0].path.render(), "global.registry");
    }

    #[test]
    fn recurses_into_sequence_elements_needing_further_descent() {
        let root = map(&[(
            "items",
            Value::Seq(vec![map(&[(
                "nested",
                map(&[
                    ("repository", Value::String("my-child-repo".into())),
                    ("tag", Value::String("child-tag".into())),
                ]),
            )])]),
        )]);

        let result = walk(&root, &CancellationToken::new());
        assert_eq!(result.patterns.len(), 1);
        assert_eq!(result.patterns[0].path.render(), "items[0].nested");
    }

    #[test]
    fn a_canceled_token_stops_the_walk_before_later_top_level_keys() {
        let root = map(&[
            ("firstImage", Value::String("docker.io/myorg/first-image:v1".into())),
            ("secondImage", Value::String("docker.io/myorg/second-image:v1".into())),
        ]);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = walk(&root, &cancel);

        assert!(result.canceled);
        assert!(result.patterns.is_empty());
    }
}
