use std::path::Path;

use super::Scanner;
use crate::models::{Dependency, Ecosystem};

pub struct DockerScanner;

impl Scanner for DockerScanner {
    fn manager(&self) -> &'static str {
        "docker"
    }

    fn manifests(&self) -> &'static [&'static str] {
        &["Dockerfile"]
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Docker
    }

    fn scan(&self, root: &Path) -> Vec<Dependency> {
        let manifest = root.join("Dockerfile");
        let Ok(text) = std::fs::read_to_string(&manifest) else { return Vec::new() };

        let mut results = Vec::new();
        for raw_line in text.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some(rest) = line.strip_prefix("FROM ") else { continue };
            let image = rest.split_whitespace().next().unwrap_or(rest);
            let (name, version) = match image.rsplit_once(':') {
                Some((n, v)) if !n.is_empty() => (n.to_string(), v.to_string()),
                _ => (image.to_string(), "latest".to_string()),
            };
            if name.eq_ignore_ascii_case("scratch") {
                continue;
            }
            let mut dep = self.dependency(name, version, &manifest, false);
            dep.metadata.insert("from".to_string(), serde_json::json!("Dockerfile"));
            results.push(dep);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_from_lines_as_docker_image_dependencies() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("Dockerfile"), "FROM rust:1.74 as builder\nFROM debian:bookworm-slim\n").unwrap();
        let deps = DockerScanner.scan(dir.path());
        assert_eq!(deps.len(), 2);
        assert!(deps.iter().all(|d| !d.direct));
    }
}
