use std::collections::BTreeMap;
use std::path::Path;

use super::common::read_json;
use super::Scanner;
use crate::models::{Dependency, Ecosystem};

pub struct NpmScanner;

const SECTIONS: [(&str, &str); 4] = [
    ("dependencies", "production"),
    ("devDependencies", "development"),
    ("optionalDependencies", "optional"),
    ("peerDependencies", "peer"),
];

impl Scanner for NpmScanner {
    fn manager(&self) -> &'static str {
        "npm"
    }

    fn manifests(&self) -> &'static [&'static str] {
        &["package.json", "package-lock.json", "yarn.lock", "pnpm-lock.yaml"]
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Npm
    }

    fn scan(&self, root: &Path) -> Vec<Dependency> {
        let mut dependencies: BTreeMap<String, (String, bool, &'static str)> = BTreeMap::new();
        let manifest = root.join("package.json");

        if let Some(data) = read_json(&manifest) {
            for (section, scope) in SECTIONS {
                let Some(entries) = data.get(section).and_then(|v| v.as_object()) else { continue };
                for (name, spec) in entries {
                    let version = spec.as_str().map(str::to_string).unwrap_or_else(|| spec.to_string());
                    dependencies.insert(name.clone(), (version, true, scope));
                }
            }
        }

        let lock = root.join("package-lock.json");
        if let Some(data) = read_json(&lock) {
            if let Some(packages) = data.get("packages").and_then(|v| v.as_object()) {
                for (raw_name, meta) in packages {
                    if raw_name.is_empty() {
                        continue;
                    }
                    let name = normalize_lock_name(raw_name);
                    let version = meta
                        .get("version")
                        .and_then(|v| v.as_str())
                        .unwrap_or("0.0.0")
                        .to_string();
                    dependencies
                        .entry(name)
                        .and_modify(|(v, _, _)| *v = version.clone())
                        .or_insert((version, false, "transitive"));
                }
            }
        }

        dependencies
            .into_iter()
            .map(|(name, (version, direct, scope))| {
                let mut dep = self.dependency(name, super::common::normalize_version(&version), &manifest, direct);
                dep.metadata.insert("scope".to_string(), serde_json::json!(scope));
                dep
            })
            .collect()
    }
}

fn normalize_lock_name(raw: &str) -> String {
    let trimmed = raw.strip_prefix("./").unwrap_or(raw);
    if let Some(rest) = trimmed.strip_prefix("node_modules/") {
        rest.split_once('/').map(|(_, tail)| tail).unwrap_or(rest).to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_direct_dependencies_from_package_json() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            r#"{"dependencies": {"left-pad": "^1.0.0"}, "devDependencies": {"jest": "29.0.0"}}"#,
        )
        .unwrap();
        let deps = NpmScanner.scan(dir.path());
        assert_eq!(deps.len(), 2);
        assert!(deps.iter().all(|d| d.direct));
    }
}
