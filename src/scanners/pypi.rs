use std::collections::BTreeMap;
use std::path::Path;

use super::common::{normalize_version, parse_requirements_text, read_toml};
use super::Scanner;
use crate::models::{Dependency, Ecosystem};

pub struct PypiScanner;

impl Scanner for PypiScanner {
    fn manager(&self) -> &'static str {
        "pypi"
    }

    fn manifests(&self) -> &'static [&'static str] {
        &[
            "pyproject.toml",
            "poetry.lock",
            "requirements.txt",
            "requirements.in",
            "constraints.txt",
            "Pipfile",
            "Pipfile.lock",
        ]
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Pypi
    }

    fn scan(&self, root: &Path) -> Vec<Dependency> {
        let mut dependencies: BTreeMap<String, String> = BTreeMap::new();
        let mut origins: BTreeMap<String, std::path::PathBuf> = BTreeMap::new();

        let pyproject = root.join("pyproject.toml");
        if let Some(toml::Value::Table(data)) = read_toml(&pyproject) {
            if let Some(toml::Value::Array(deps)) = data
                .get("project")
                .and_then(|v| v.as_table())
                .and_then(|t| t.get("dependencies"))
            {
                for entry in deps {
                    if let Some(spec) = entry.as_str() {
                        if let Some((name, version)) = parse_pep508(spec) {
                            dependencies.insert(name.clone(), version);
                            origins.insert(name, pyproject.clone());
                        }
                    }
                }
            }
            if let Some(poetry_deps) = data
                .get("tool")
                .and_then(|v| v.as_table())
                .and_then(|t| t.get("poetry"))
                .and_then(|v| v.as_table())
                .and_then(|t| t.get("dependencies"))
                .and_then(|v| v.as_table())
            {
                for (name, version) in poetry_deps {
                    let version_str = version.as_str().map(str::to_string).unwrap_or_else(|| version.to_string());
                    dependencies.entry(name.clone()).or_insert(version_str);
                    origins.entry(name.clone()).or_insert_with(|| pyproject.clone());
                }
            }
        }

        for filename in ["requirements.txt", "requirements.in", "constraints.txt"] {
            let path = root.join(filename);
            if let Ok(text) = std::fs::read_to_string(&path) {
                for (name, version) in parse_requirements_text(&text) {
                    dependencies.entry(name.clone()).or_insert(version);
                    origins.entry(name).or_insert_with(|| path.clone());
                }
            }
        }

        dependencies
            .into_iter()
            .map(|(name, version)| {
                let manifest = origins.get(&name).cloned().unwrap_or_else(|| root.to_path_buf());
                self.dependency(name, normalize_version(&version), &manifest, true)
            })
            .collect()
    }
}

fn parse_pep508(spec: &str) -> Option<(String, String)> {
    let cleaned = spec.trim();
    if cleaned.is_empty() {
        return None;
    }
    if let Some((name, version)) = cleaned.split_once("==") {
        return Some((name.trim().to_string(), version.trim().to_string()));
    }
    let name: String = cleaned
        .chars()
        .take_while(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();
    if name.is_empty() {
        return None;
    }
    Some((name, "*".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_pinned_requirements() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("requirements.txt"), "requests==2.31.0\n# comment\nflask>=2.0\n").unwrap();
        let deps = PypiScanner.scan(dir.path());
        assert_eq!(deps.len(), 2);
        let requests = deps.iter().find(|d| d.name == "requests").unwrap();
        assert_eq!(requests.version, "2.31.0");
    }
}
