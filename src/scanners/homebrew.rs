use std::path::Path;

use super::Scanner;
use crate::models::{Dependency, Ecosystem};

pub struct HomebrewScanner;

impl Scanner for HomebrewScanner {
    fn manager(&self) -> &'static str {
        "brew"
    }

    fn manifests(&self) -> &'static [&'static str] {
        &["Brewfile"]
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Homebrew
    }

    fn scan(&self, root: &Path) -> Vec<Dependency> {
        let manifest = root.join("Brewfile");
        let Ok(text) = std::fs::read_to_string(&manifest) else { return Vec::new() };

        let mut results = Vec::new();
        for raw_line in text.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') || !line.starts_with("brew") {
                continue;
            }
            let parts: Vec<&str> = line.splitn(2, ',').collect();
            let Some(name) = parts[0].split_whitespace().nth(1) else { continue };
            let name = name.trim_matches(['\'', '"']);
            if name.is_empty() {
                continue;
            }
            let version = parts
                .get(1)
                .filter(|rest| rest.contains("version"))
                .and_then(|rest| rest.split_once(':'))
                .map(|(_, v)| v.trim().trim_matches([' ', '"', '\'']).to_string())
                .unwrap_or_else(|| "latest".to_string());
            results.push(self.dependency(name, version, &manifest, true));
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_brewfile_formula_declarations() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("Brewfile"), "brew 'wget'\nbrew 'node', version: '20'\n").unwrap();
        let deps = HomebrewScanner.scan(dir.path());
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[1].version, "20");
    }
}
