use std::collections::BTreeMap;
use std::path::Path;

use super::Scanner;
use crate::models::{Dependency, Ecosystem};

pub struct GoScanner;

impl Scanner for GoScanner {
    fn manager(&self) -> &'static str {
        "go"
    }

    fn manifests(&self) -> &'static [&'static str] {
        &["go.mod", "go.sum"]
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Go
    }

    fn scan(&self, root: &Path) -> Vec<Dependency> {
        let mut dependencies: BTreeMap<String, String> = BTreeMap::new();

        let go_mod = root.join("go.mod");
        let manifest = if go_mod.exists() { go_mod.clone() } else { root.join("go.sum") };
        if let Ok(text) = std::fs::read_to_string(&go_mod) {
            let mut in_block = false;
            for raw_line in text.lines() {
                let line = raw_line.trim();
                if line.is_empty() || line.starts_with("module") || line.starts_with("//") || line.starts_with("replace") {
                    continue;
                }
                if line.starts_with("require (") {
                    in_block = true;
                    continue;
                }
                if in_block && line.starts_with(')') {
                    in_block = false;
                    continue;
                }
                let entry = if in_block {
                    Some(line)
                } else if let Some(rest) = line.strip_prefix("require") {
                    let rest = rest.trim();
                    if rest.is_empty() || rest.ends_with('(') {
                        None
                    } else {
                        Some(rest)
                    }
                } else {
                    None
                };
                if let Some(entry) = entry {
                    let mut parts = entry.split_whitespace();
                    if let (Some(name), Some(version)) = (parts.next(), parts.next()) {
                        dependencies.entry(name.to_string()).or_insert_with(|| version.to_string());
                    }
                }
            }
        }

        let go_sum = root.join("go.sum");
        if let Ok(text) = std::fs::read_to_string(&go_sum) {
            for line in text.lines() {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() >= 2 {
                    let name = parts[0].strip_suffix("/go.mod").unwrap_or(parts[0]);
                    dependencies.entry(name.to_string()).or_insert_with(|| parts[1].to_string());
                }
            }
        }

        dependencies
            .into_iter()
            .map(|(name, version)| self.dependency(name, version, &manifest, true))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_single_line_require_directives() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("go.mod"),
            "module example.com/foo\n\nrequire github.com/pkg/errors v0.9.1\n\nrequire (\n\tgithub.com/spf13/cobra v1.7.0\n)\n",
        )
        .unwrap();
        let deps = GoScanner.scan(dir.path());
        assert_eq!(deps.len(), 2);
    }
}
