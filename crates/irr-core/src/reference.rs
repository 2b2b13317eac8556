//! Image Reference Parser (C1) and Registry Normalizer (C2).

use std::sync::LazyLock;

use irr_values::{Path, Value};
use regex::Regex;
use thiserror::Error;

pub const DOCKER_HUB_DOMAIN: &str = "docker.io";
pub const DOCKER_LIBRARY_NAMESPACE: &str = "library";
const DEFAULT_TAG: &str = "latest";

static DIGEST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^sha256:[a-f0-9]{64}$").unwrap());

/// A fully parsed, canonicalized image reference.
///
/// Invariant: exactly one of `tag`/`digest` is populated once parsing
/// succeeds; `repository` is non-empty; `registry` defaults to
/// [`DOCKER_HUB_DOMAIN`] when the input omitted one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageReference {
    pub registry: String,
    pub repository: String,
    pub tag: Option<String>,
    pub digest: Option<String>,
    pub original: String,
}

impl ImageReference {
    /// The canonical string form, digest taking precedence over tag.
    pub fn canonical(&self) -> String {
        let mut s = format!("{}/{}", self.registry, self.repository);
        if let Some(digest) = &self.digest {
            s.push('@');
            s.push_str(digest);
        } else if let Some(tag) = &self.tag {
            s.push(':');
            s.push_str(tag);
        }
        s
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid image format at `{path}`: `{original}`")]
    InvalidImageFormat { path: Path, original: String },
    #[error("template expression at `{path}`: `{original}`")]
    HelmTemplate { path: Path, original: String },
}

impl ParseError {
    pub fn path(&self) -> &Path {
        match self {
            ParseError::InvalidImageFormat { path, .. } => path,
            ParseError::HelmTemplate { path, .. } => path,
        }
    }
}

/// Returns `true` if `s` contains a `{{ ... }}` Helm template expression.
///
/// Template detection is orthogonal to the image-reference heuristics: a
/// templated value is never handed to the parser, and is recorded as an
/// unsupported site instead of a parse failure.
pub fn is_template(s: &str) -> bool {
    if let Some(open) = s.find("{{") {
        s[open + 2..].contains("}}")
    } else {
        false
    }
}

/// Parses a verbatim image string (`registry/repo:tag`, `repo@digest`, ...).
pub fn parse_string(s: &str, path: &Path) -> Result<ImageReference, ParseError> {
    if is_template(s) {
        return Err(ParseError::HelmTemplate {
            path: path.clone(),
            original: s.to_string(),
        });
    }

    parse_string_inner(s, path).or_else(|_| {
        // Recovery heuristic: retry as if a `:latest` tag had been given,
        // but never for a bare `repo:tag` with no registry/namespace
        // separator -- that's an invalid reference, not a missing tag.
        if s.contains('/') && !s.contains(':') && !s.contains('@') {
            parse_string_inner(&format!("{s}:{DEFAULT_TAG}"), path)
        } else {
            Err(ParseError::InvalidImageFormat {
                path: path.clone(),
                original: s.to_string(),
            })
        }
    })
}

fn parse_string_inner(s: &str, path: &Path) -> Result<ImageReference, ParseError> {
    let invalid = || ParseError::InvalidImageFormat {
        path: path.clone(),
        original: s.to_string(),
    };

    if s.is_empty() {
        return Err(invalid());
    }

    // Split off a trailing `@sha256:...` digest or `:tag`, preferring the
    // digest form since `@` never appears in a registry/repository.
    let (name_and_registry, tag, digest) = if let Some((rest, digest)) = s.split_once('@') {
        if !DIGEST_RE.is_match(digest) {
            return Err(invalid());
        }
        (rest, None, Some(digest.to_string()))
    } else {
        split_name_and_tag(s)
    };

    if name_and_registry.is_empty() {
        return Err(invalid());
    }

    // A single-component value (no `/`) whose pre-tag portion itself
    // looks registry-like (`localhost:5000`, `registry.example.com:1.0`)
    // is ambiguous between "registry:port with no repository" and
    // "repo:tag" -- don't guess a registry for it, just reject it.
    if tag.is_some()
        && !name_and_registry.contains('/')
        && (name_and_registry.contains('.')
            || name_and_registry.contains(':')
            || name_and_registry == "localhost")
    {
        return Err(invalid());
    }

    let (registry, repository) = split_registry_and_repository(name_and_registry);

    if repository.is_empty() {
        return Err(invalid());
    }

    let registry = normalize_registry(registry.unwrap_or(DOCKER_HUB_DOMAIN));

    let repository = if registry == DOCKER_HUB_DOMAIN && !repository.contains('/') {
        format!("{DOCKER_LIBRARY_NAMESPACE}/{repository}")
    } else {
        repository
    };

    let tag = match (&tag, &digest) {
        (_, Some(_)) => None,
        (Some(tag), None) => Some(tag.clone()),
        (None, None) => Some(DEFAULT_TAG.to_string()),
    };

    Ok(ImageReference {
        registry,
        repository,
        tag,
        digest,
        original: s.to_string(),
    })
}

/// Splits `repo:tag` on the last colon, but only when that colon comes
/// after the last `/` -- a colon before the last slash is a registry port
/// (`localhost:5000/repo`), not a tag separator.
fn split_name_and_tag(s: &str) -> (&str, Option<&str>, Option<String>) {
    let last_slash = s.rfind('/');
    if let Some(colon) = s.rfind(':') {
        if last_slash.is_none_or(|slash| colon > slash) {
            return (&s[..colon], Some(&s[colon + 1..]), None);
        }
    }
    (s, None, None)
}

/// Splits a `registry/repository` prefix into its optional registry
/// component and the remaining repository path.
///
/// A leading component is a registry iff it contains `.` or `:`, or
/// equals `localhost` -- otherwise the whole prefix is the repository
/// and the registry is left unset (caller defaults to `docker.io`).
fn split_registry_and_repository(s: &str) -> (Option<&str>, String) {
    match s.split_once('/') {
        Some((first, rest)) if first.contains('.') || first.contains(':') || first == "localhost" => {
            (Some(first), rest.to_string())
        }
        _ => (None, s.to_string()),
    }
}

/// Normalizes a registry string: trims a trailing slash, and rewrites a
/// bare short name with neither `.` nor `:` (other than `docker.io`
/// itself) to `docker.io/<name>`, preserving Bitnami-style short names
/// like `bitnami` without inventing a registry out of nothing.
pub fn normalize_registry(registry: &str) -> String {
    let trimmed = registry.trim_end_matches('/');
    if trimmed.is_empty() {
        return DOCKER_HUB_DOMAIN.to_string();
    }
    if trimmed == DOCKER_HUB_DOMAIN || trimmed.contains('.') || trimmed.contains(':') {
        trimmed.to_string()
    } else {
        format!("{DOCKER_HUB_DOMAIN}/{trimmed}")
    }
}

/// Normalizes a registry for equality comparison only: lowercased, never
/// persisted to output.
pub fn normalize_registry_for_comparison(registry: &str) -> String {
    normalize_registry(registry).to_lowercase()
}

/// Parses an image-map site (`{registry, repository, tag, digest}`).
pub fn parse_map(map: &indexmap::IndexMap<String, Value>, path: &Path) -> Result<ImageReference, ParseError> {
    let invalid = || ParseError::InvalidImageFormat {
        path: path.clone(),
        original: format!("{map:?}"),
    };

    let repository = match map.get("repository").and_then(Value::as_str) {
        Some(r) if !r.is_empty() => r.to_string(),
        _ => return Err(invalid()),
    };

    let registry_field = map.get("registry").and_then(Value::as_str);
    let registry = normalize_registry(registry_field.unwrap_or(DOCKER_HUB_DOMAIN));

    let repository = if registry == DOCKER_HUB_DOMAIN && !repository.contains('/') {
        format!("{DOCKER_LIBRARY_NAMESPACE}/{repository}")
    } else {
        repository
    };

    let digest = map
        .get("digest")
        .and_then(Value::as_str)
        .filter(|d| !d.is_empty())
        .map(|d| d.to_string());

    if let Some(digest) = &digest {
        if !DIGEST_RE.is_match(digest) {
            return Err(invalid());
        }
    }

    // Numeric tag is coerced to its decimal string (`3.14 -> "3"`); a
    // missing tag and missing digest defaults to `"latest"`.
    let tag = if digest.is_some() {
        None
    } else {
        match map.get("tag") {
            Some(v) if !v.is_null() => v.as_coerced_tag(),
            _ => None,
        }
        .or_else(|| Some(DEFAULT_TAG.to_string()))
    };

    Ok(ImageReference {
        registry,
        repository,
        tag,
        digest,
        original: format!("{registry_field:?}/{}", map.get("repository").and_then(Value::as_str).unwrap_or_default()),
    })
}
