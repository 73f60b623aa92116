use std::collections::BTreeMap;
use std::path::Path;

use super::common::{parse_requirement_line, read_yaml};
use super::Scanner;
use crate::models::{Dependency, Ecosystem};

pub struct CondaScanner;

impl Scanner for CondaScanner {
    fn manager(&self) -> &'static str {
        "conda"
    }

    fn manifests(&self) -> &'static [&'static str] {
        &["environment.yml", "environment.yaml"]
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Conda
    }

    fn scan(&self, root: &Path) -> Vec<Dependency> {
        let mut dependencies: BTreeMap<String, String> = BTreeMap::new();
        let mut manifest = root.join("environment.yml");

        for filename in ["environment.yml", "environment.yaml"] {
            let path = root.join(filename);
            let Some(data) = read_yaml(&path) else { continue };
            manifest = path;
            let Some(entries) = data.get("dependencies").and_then(|v| v.as_sequence()) else { continue };
            for entry in entries {
                if let Some(text) = entry.as_str() {
                    if let Some((name, version)) = parse_conda_dependency(text) {
                        dependencies.entry(name).or_insert(version);
                    }
                } else if let Some(mapping) = entry.as_mapping() {
                    let pip_key = serde_yaml::Value::String("pip".to_string());
                    if let Some(pip_entries) = mapping.get(&pip_key).and_then(|v| v.as_sequence()) {
                        for pip_entry in pip_entries {
                            if let Some(text) = pip_entry.as_str() {
                                if let Some((name, version)) = parse_requirement_line(text) {
                                    dependencies.entry(name).or_insert(version);
                                }
                            }
                        }
                    }
                }
            }
            break;
        }

        dependencies
            .into_iter()
            .map(|(name, version)| self.dependency(name, version, &manifest, true))
            .collect()
    }
}

fn parse_conda_dependency(entry: &str) -> Option<(String, String)> {
    let mut candidate = entry.trim();
    if candidate.is_empty() || candidate.starts_with('#') {
        return None;
    }
    if let Some((_, rest)) = candidate.split_once("::") {
        candidate = rest.trim();
    }
    if candidate.contains('=') {
        let parts: Vec<&str> = candidate.split('=').map(str::trim).filter(|s| !s.is_empty()).collect();
        if parts.is_empty() {
            return None;
        }
        let version = parts.get(1).map(|s| s.to_string()).unwrap_or_else(|| "*".to_string());
        return Some((parts[0].to_string(), version));
    }
    let pieces: Vec<&str> = candidate.split_whitespace().collect();
    if pieces.is_empty() {
        return None;
    }
    let version = if pieces.len() > 1 { pieces[1..].join(" ") } else { "*".to_string() };
    Some((pieces[0].to_string(), version))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_environment_yml_dependencies() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("environment.yml"), "dependencies:\n  - numpy=1.26.0\n  - conda-forge::pandas=2.1\n").unwrap();
        let deps = CondaScanner.scan(dir.path());
        assert_eq!(deps.len(), 2);
    }
}
