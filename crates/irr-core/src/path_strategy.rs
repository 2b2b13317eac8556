//! Path Strategy (C5): computes the new repository path from a source
//! reference. Pluggable; the assembler composes the target registry with
//! whatever the active strategy returns.

use crate::reference::ImageReference;

/// Computes the repository portion of a rewritten image address.
///
/// Implementations return only the repository path -- never the target
/// registry -- so that changing the mapping resolution doesn't require
/// changing path computation.
pub trait PathStrategy {
    fn generate_path(&self, reference: &ImageReference) -> String;
}

/// The default strategy: prefix the repository with a sanitized form of
/// the source registry, e.g. `docker.io/myorg/myapp` ->
/// `dockerio/myorg/myapp`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PrefixSourceRegistry;

impl PathStrategy for PrefixSourceRegistry {
    fn generate_path(&self, reference: &ImageReference) -> String {
        format!("{}/{}", sanitize_registry(&reference.registry), reference.repository)
    }
}

/// Removes `.`, preserves `-`, and drops any `:port` suffix from a
/// registry string so it can be safely embedded as a repository path
/// segment (`gcr.io` -> `gcrio`, `localhost:5000` -> `localhost`).
fn sanitize_registry(registry: &str) -> String {
    let without_port = registry.split(':').next().unwrap_or(registry);
    without_port.chars().filter(|c| *c != '.').collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::parse_string;
    use irr_values::Path;

    #[test]
    fn sanitizes_dots_and_ports() {
        assert_eq!(sanitize_registry("gcr.io"), "gcrio");
        assert_eq!(sanitize_registry("localhost:5000"), "localhost");
        assert_eq!(sanitize_registry("my-registry.example.com"), "my-registryexamplecom");
    }

    #[test]
    fn prefixes_repository_with_sanitized_registry() {
        let path = Path::root().child("image");
        let reference = parse_string("docker.io/myorg/myapp:v1", &path).unwrap();
        let strategy = PrefixSourceRegistry;
        assert_eq!(strategy.generate_path(&reference), "dockerio/myorg/myapp");
    }
}
