use std::collections::BTreeMap;
use std::path::Path;

use super::common::{normalize_version, read_toml};
use super::Scanner;
use crate::models::{Dependency, Ecosystem};

pub struct CargoScanner;

const SECTIONS: [&str; 3] = ["dependencies", "dev-dependencies", "build-dependencies"];

impl Scanner for CargoScanner {
    fn manager(&self) -> &'static str {
        "cargo"
    }

    fn manifests(&self) -> &'static [&'static str] {
        &["Cargo.toml", "Cargo.lock"]
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Crates
    }

    fn scan(&self, root: &Path) -> Vec<Dependency> {
        let mut dependencies: BTreeMap<String, String> = BTreeMap::new();

        let cargo_lock = root.join("Cargo.lock");
        if let Some(toml::Value::Table(data)) = read_toml(&cargo_lock) {
            if let Some(toml::Value::Array(packages)) = data.get("package") {
                for package in packages {
                    if let (Some(name), Some(version)) = (
                        package.get("name").and_then(|v| v.as_str()),
                        package.get("version").and_then(|v| v.as_str()),
                    ) {
                        dependencies.entry(name.to_string()).or_insert_with(|| version.to_string());
                    }
                }
            }
        }

        let cargo_toml = root.join("Cargo.toml");
        let manifest = if cargo_toml.exists() { cargo_toml.clone() } else { cargo_lock.clone() };
        if let Some(toml::Value::Table(data)) = read_toml(&cargo_toml) {
            for section in SECTIONS {
                let Some(toml::Value::Table(entries)) = data.get(section) else { continue };
                for (name, info) in entries {
                    let version = match info {
                        toml::Value::Table(t) => t.get("version").and_then(|v| v.as_str()).unwrap_or("*").to_string(),
                        toml::Value::String(s) => s.clone(),
                        _ => "*".to_string(),
                    };
                    dependencies.entry(name.clone()).or_insert(version);
                }
            }
        }

        dependencies
            .into_iter()
            .map(|(name, version)| self.dependency(name, normalize_version(&version), &manifest, true))
            .collect()
    }

    /// `Cargo.lock` gives each package's own dependency list as bare names
    /// (unambiguous) or `"name version"` pairs (when more than one version
    /// of that name is locked). Bare names are resolved against the
    /// lockfile's own name→version index; an ambiguous bare name with no
    /// version suffix is skipped rather than guessed.
    fn relationships(&self, root: &Path) -> Vec<(String, String)> {
        let Some(toml::Value::Table(data)) = read_toml(&root.join("Cargo.lock")) else {
            return Vec::new();
        };
        let Some(toml::Value::Array(packages)) = data.get("package") else {
            return Vec::new();
        };

        let mut versions_by_name: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for package in packages {
            if let (Some(name), Some(version)) = (
                package.get("name").and_then(|v| v.as_str()),
                package.get("version").and_then(|v| v.as_str()),
            ) {
                versions_by_name.entry(name.to_string()).or_default().push(version.to_string());
            }
        }

        let coordinate = |name: &str, version: &str| format!("{}:{name}@{}", self.ecosystem().as_str(), normalize_version(version));

        let mut edges = Vec::new();
        for package in packages {
            let (Some(name), Some(version)) = (
                package.get("name").and_then(|v| v.as_str()),
                package.get("version").and_then(|v| v.as_str()),
            ) else {
                continue;
            };
            let Some(toml::Value::Array(deps)) = package.get("dependencies") else { continue };
            for dep in deps {
                let Some(raw) = dep.as_str() else { continue };
                let mut parts = raw.split_whitespace();
                let Some(dep_name) = parts.next() else { continue };
                let dep_version = match parts.next() {
                    Some(v) => Some(v.to_string()),
                    None => versions_by_name.get(dep_name).filter(|v| v.len() == 1).map(|v| v[0].clone()),
                };
                if let Some(dep_version) = dep_version {
                    edges.push((coordinate(name, version), coordinate(dep_name, &dep_version)));
                }
            }
        }
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_cargo_toml_dependency_tables() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("Cargo.toml"),
            "[dependencies]\nserde = \"1\"\ntokio = { version = \"1\", features = [\"full\"] }\n",
        )
        .unwrap();
        let deps = CargoScanner.scan(dir.path());
        assert_eq!(deps.len(), 2);
    }

    #[test]
    fn relationships_resolve_bare_names_against_the_lockfile_index() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("Cargo.lock"),
            r#"
[[package]]
name = "demo"
version = "0.1.0"
dependencies = ["serde"]

[[package]]
name = "serde"
version = "1.0.0"
dependencies = ["serde_derive 1.0.0"]

[[package]]
name = "serde_derive"
version = "1.0.0"
dependencies = []
"#,
        )
        .unwrap();
        let edges = CargoScanner.relationships(dir.path());
        assert_eq!(edges.len(), 2);
        assert!(edges.contains(&("crates:demo@0.1.0".to_string(), "crates:serde@1.0.0".to_string())));
        assert!(edges.contains(&(
            "crates:serde@1.0.0".to_string(),
            "crates:serde_derive@1.0.0".to_string()
        )));
    }

    #[test]
    fn ambiguous_bare_names_with_no_version_suffix_are_skipped() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("Cargo.lock"),
            r#"
[[package]]
name = "demo"
version = "0.1.0"
dependencies = ["ambiguous"]

[[package]]
name = "ambiguous"
version = "1.0.0"
dependencies = []

[[package]]
name = "ambiguous"
version = "2.0.0"
dependencies = []
"#,
        )
        .unwrap();
        let edges = CargoScanner.relationships(dir.path());
        assert!(edges.is_empty());
    }
}
