use std::collections::BTreeMap;
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;

use super::common::{normalize_version, xml_tag_text};
use super::Scanner;
use crate::models::{Dependency, Ecosystem};

pub struct MavenScanner;

const GRADLE_DECLARATIONS: [&str; 4] = ["implementation", "api", "compileOnly", "runtimeOnly"];

lazy_static! {
    static ref GRADLE_KEY_VALUE: Regex = Regex::new(r#"(group|name|version)\s*[:=]\s*['"]([^'"]+)['"]"#).unwrap();
}

impl Scanner for MavenScanner {
    fn manager(&self) -> &'static str {
        "maven"
    }

    fn manifests(&self) -> &'static [&'static str] {
        &["pom.xml", "build.gradle", "build.gradle.kts"]
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Maven
    }

    fn scan(&self, root: &Path) -> Vec<Dependency> {
        let mut dependencies: BTreeMap<String, String> = BTreeMap::new();

        let pom = root.join("pom.xml");
        let mut manifest = pom.clone();
        if let Ok(text) = std::fs::read_to_string(&pom) {
            for block in find_blocks(&text, "dependency") {
                let group = xml_tag_text(&block, "groupId");
                let artifact = xml_tag_text(&block, "artifactId");
                let version = xml_tag_text(&block, "version").unwrap_or("0.0.0");
                if let (Some(group), Some(artifact)) = (group, artifact) {
                    dependencies.entry(format!("{group}:{artifact}")).or_insert_with(|| version.to_string());
                }
            }
        }

        for gradle_name in ["build.gradle", "build.gradle.kts"] {
            let path = root.join(gradle_name);
            let Ok(text) = std::fs::read_to_string(&path) else { continue };
            if dependencies.is_empty() && !pom.exists() {
                manifest = path.clone();
            }
            for line in text.lines() {
                if let Some((name, version)) = extract_gradle_dependency(line) {
                    dependencies.entry(name).or_insert(version);
                }
            }
        }

        dependencies
            .into_iter()
            .map(|(name, version)| self.dependency(name, normalize_version(&version), &manifest, true))
            .collect()
    }
}

fn find_blocks(text: &str, tag: &str) -> Vec<String> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let mut out = Vec::new();
    let mut search_from = 0;
    while let Some(rel_start) = text[search_from..].find(&open) {
        let start = search_from + rel_start;
        let Some(rel_end) = text[start..].find(&close) else { break };
        let end = start + rel_end + close.len();
        out.push(text[start..end].to_string());
        search_from = end;
    }
    out
}

fn extract_gradle_dependency(line: &str) -> Option<(String, String)> {
    let stripped = line.trim();
    if stripped.is_empty() || stripped.starts_with("//") {
        return None;
    }
    for declaration in GRADLE_DECLARATIONS {
        let Some(remainder) = stripped.strip_prefix(declaration) else { continue };
        let mut remainder = remainder.trim();
        if remainder.is_empty() {
            continue;
        }
        remainder = remainder.trim_end_matches('{').trim();
        if remainder.starts_with('(') && remainder.ends_with(')') {
            remainder = &remainder[1..remainder.len() - 1];
        }
        remainder = remainder.trim().trim_end_matches(',');
        if let Some((before, _)) = remainder.split_once("//") {
            remainder = before.trim();
        }
        if remainder.is_empty() {
            continue;
        }
        if let Some(quote) = remainder.chars().next().filter(|c| *c == '\'' || *c == '"') {
            if let Some(closing_rel) = remainder[1..].find(quote) {
                let literal = &remainder[1..1 + closing_rel];
                let parts: Vec<&str> = literal.split(':').map(str::trim).filter(|s| !s.is_empty()).collect();
                if parts.len() >= 3 {
                    return Some((format!("{}:{}", parts[0], parts[1]), parts[parts.len() - 1].to_string()));
                }
            }
        }
        let mut group = None;
        let mut artifact = None;
        let mut version = None;
        for capture in GRADLE_KEY_VALUE.captures_iter(remainder) {
            match &capture[1] {
                "group" => group = Some(capture[2].to_string()),
                "name" => artifact = Some(capture[2].to_string()),
                "version" => version = Some(capture[2].to_string()),
                _ => {}
            }
        }
        if let (Some(group), Some(artifact), Some(version)) = (group, artifact, version) {
            return Some((format!("{group}:{artifact}"), version));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_pom_xml_dependencies() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("pom.xml"),
            "<project><dependencies><dependency><groupId>com.google.guava</groupId><artifactId>guava</artifactId><version>32.1.3</version></dependency></dependencies></project>",
        )
        .unwrap();
        let deps = MavenScanner.scan(dir.path());
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name, "com.google.guava:guava");
    }

    #[test]
    fn extracts_gradle_shorthand_notation() {
        let (name, version) = extract_gradle_dependency("implementation 'com.squareup.okhttp3:okhttp:4.11.0'").unwrap();
        assert_eq!(name, "com.squareup.okhttp3:okhttp");
        assert_eq!(version, "4.11.0");
    }
}
