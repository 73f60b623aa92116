use std::collections::BTreeMap;
use std::path::Path;

use super::Scanner;
use crate::models::{Dependency, Ecosystem};

pub struct RubyGemsScanner;

impl Scanner for RubyGemsScanner {
    fn manager(&self) -> &'static str {
        "rubygems"
    }

    fn manifests(&self) -> &'static [&'static str] {
        &["Gemfile", "Gemfile.lock"]
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Rubygems
    }

    fn scan(&self, root: &Path) -> Vec<Dependency> {
        let mut dependencies: BTreeMap<String, String> = BTreeMap::new();

        let gemfile = root.join("Gemfile");
        if let Ok(text) = std::fs::read_to_string(&gemfile) {
            for line in text.lines() {
                let trimmed = line.trim();
                let Some(rest) = trimmed.strip_prefix("gem ") else { continue };
                let mut parts = rest.split(',');
                let Some(name) = parts.next().map(|s| s.trim().trim_matches(['\'', '"'])) else { continue };
                if name.is_empty() {
                    continue;
                }
                let version = parts
                    .next()
                    .map(|s| s.trim().trim_matches(['\'', '"']).to_string())
                    .unwrap_or_else(|| "*".to_string());
                dependencies.insert(name.to_string(), version);
            }
        }

        let lock = root.join("Gemfile.lock");
        let manifest = if gemfile.exists() { gemfile.clone() } else { lock.clone() };
        if let Ok(text) = std::fs::read_to_string(&lock) {
            for raw_line in text.lines() {
                if raw_line.starts_with(' ') || raw_line.starts_with('-') {
                    continue;
                }
                let line = raw_line.trim();
                if let Some((name, rest)) = line.split_once(" (") {
                    if let Some(version) = rest.strip_suffix(')') {
                        dependencies.entry(name.trim().to_string()).or_insert_with(|| version.to_string());
                    }
                }
            }
        }

        dependencies
            .into_iter()
            .map(|(name, version)| self.dependency(name, super::common::normalize_version(&version), &manifest, true))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_gemfile_declarations() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("Gemfile"), "gem 'rails', '7.0.0'\ngem 'rake'\n").unwrap();
        let deps = RubyGemsScanner.scan(dir.path());
        assert_eq!(deps.len(), 2);
    }
}
