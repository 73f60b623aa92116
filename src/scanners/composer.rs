use std::collections::BTreeMap;
use std::path::Path;

use super::common::{normalize_version, read_json};
use super::Scanner;
use crate::models::{Dependency, Ecosystem};

pub struct ComposerScanner;

impl Scanner for ComposerScanner {
    fn manager(&self) -> &'static str {
        "composer"
    }

    fn manifests(&self) -> &'static [&'static str] {
        &["composer.json", "composer.lock"]
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Packagist
    }

    fn scan(&self, root: &Path) -> Vec<Dependency> {
        let mut dependencies: BTreeMap<String, (String, bool, &'static str)> = BTreeMap::new();
        let manifest = root.join("composer.json");

        if let Some(data) = read_json(&manifest) {
            for (section, scope) in [("require", "production"), ("require-dev", "development")] {
                let Some(entries) = data.get(section).and_then(|v| v.as_object()) else { continue };
                for (name, version) in entries {
                    let version_str = version.as_str().map(str::to_string).unwrap_or_else(|| version.to_string());
                    dependencies.insert(name.clone(), (version_str, true, scope));
                }
            }
        }

        let lock = root.join("composer.lock");
        let lock_data = read_json(&lock);
        if let Some(data) = &lock_data {
            for section in ["packages", "packages-dev"] {
                let Some(entries) = data.get(section).and_then(|v| v.as_array()) else { continue };
                for package in entries {
                    let (Some(name), Some(version)) = (
                        package.get("name").and_then(|v| v.as_str()),
                        package.get("version").and_then(|v| v.as_str()),
                    ) else {
                        continue;
                    };
                    dependencies
                        .entry(name.to_string())
                        .and_modify(|(v, _, _)| *v = version.to_string())
                        .or_insert((version.to_string(), false, "transitive"));
                }
            }
        }

        dependencies
            .into_iter()
            .map(|(name, (version, direct, scope))| {
                let manifest = if direct || lock_data.is_none() { manifest.clone() } else { lock.clone() };
                let mut dep = self.dependency(name, normalize_version(&version), &manifest, direct);
                dep.metadata.insert("scope".to_string(), serde_json::json!(scope));
                dep
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_composer_require_section() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("composer.json"), r#"{"require": {"symfony/symfony": "^6.0"}}"#).unwrap();
        let deps = ComposerScanner.scan(dir.path());
        assert_eq!(deps.len(), 1);
        assert!(deps[0].direct);
    }
}
