//! # SBOM Builder
//!
//! Renders a [`Report`] as a CycloneDX 1.5 JSON document: components are
//! merged by coordinate (scope upgrades to `required` if any contributor is
//! direct, licenses deduplicated), vulnerabilities merged by
//! `(source, identifier)` with their highest observed severity.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::error::SbomError;
use crate::models::{Ecosystem, PackageFinding, Report};

const TOOL_VENDOR: &str = "Kevin Delfour";
const TOOL_NAME: &str = "deptrust";

fn purl_ecosystem(ecosystem: Ecosystem) -> &'static str {
    match ecosystem {
        Ecosystem::Pypi => "pypi",
        Ecosystem::Npm => "npm",
        Ecosystem::Maven => "maven",
        Ecosystem::Crates => "cargo",
        Ecosystem::Go => "golang",
        Ecosystem::Packagist => "composer",
        Ecosystem::Nuget => "nuget",
        Ecosystem::Rubygems => "gem",
        Ecosystem::Homebrew => "generic",
        Ecosystem::Conda => "conda",
        Ecosystem::Docker => "docker",
    }
}

fn purl(finding: &PackageFinding) -> Result<String, SbomError> {
    let dep = &finding.dependency;
    let ecosystem = purl_ecosystem(dep.ecosystem);
    if dep.ecosystem == Ecosystem::Maven {
        let Some((group, artifact)) = dep.name.split_once(':') else {
            return Err(SbomError::InvalidMavenCoordinate(dep.name.clone()));
        };
        return Ok(format!("pkg:maven/{group}/{artifact}@{}", dep.version));
    }
    Ok(format!("pkg:{ecosystem}/{}@{}", dep.name, dep.version))
}

/// Normalize a dependency's `license` metadata field into a CycloneDX
/// `licenses[]` array, defaulting to a single `UNKNOWN` entry when absent.
fn normalize_licenses(metadata: &crate::models::Metadata) -> Vec<Value> {
    let mut entries = Vec::new();
    match metadata.get("license") {
        Some(Value::String(s)) => {
            if let Some(entry) = license_entry_from_string(s) {
                entries.push(entry);
            }
        }
        Some(Value::Object(obj)) => {
            entries.push(license_entry_from_object(obj));
        }
        Some(Value::Array(items)) => {
            for item in items {
                match item {
                    Value::String(s) => {
                        if let Some(entry) = license_entry_from_string(s) {
                            entries.push(entry);
                        }
                    }
                    Value::Object(obj) => entries.push(license_entry_from_object(obj)),
                    _ => {}
                }
            }
        }
        _ => {}
    }

    if entries.is_empty() {
        entries.push(json!({"license": {"id": "UNKNOWN"}}));
    }
    dedup_by_key(entries, license_key)
}

fn license_entry_from_string(raw: &str) -> Option<Value> {
    let cleaned = raw.trim();
    if cleaned.is_empty() {
        return None;
    }
    Some(json!({"license": {"id": cleaned}}))
}

fn license_entry_from_object(obj: &serde_json::Map<String, Value>) -> Value {
    let identifier = obj.get("id").or_else(|| obj.get("name")).and_then(|v| v.as_str());
    if let Some(id) = identifier.map(str::trim).filter(|s| !s.is_empty()) {
        return json!({"license": {"id": id}});
    }
    if let Some(nested) = obj.get("license") {
        return json!({"license": nested});
    }
    json!({"license": obj})
}

fn license_key(entry: &Value) -> String {
    entry.get("license").and_then(|l| l.get("id")).and_then(|v| v.as_str()).unwrap_or("").to_string()
}

fn dedup_by_key(items: Vec<Value>, key_of: impl Fn(&Value) -> String) -> Vec<Value> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for item in items {
        let key = key_of(&item);
        if seen.insert(key) {
            out.push(item);
        }
    }
    out
}

/// Build the CycloneDX document for a completed report.
pub fn generate_sbom(report: &Report) -> Result<Value, SbomError> {
    let mut components: BTreeMap<String, Value> = BTreeMap::new();
    let mut vulnerabilities: BTreeMap<(String, String), Value> = BTreeMap::new();
    let mut component_order: Vec<String> = Vec::new();
    let mut vulnerability_order: Vec<(String, String)> = Vec::new();

    for finding in &report.findings {
        let coordinate = finding.dependency.coordinate();
        let component_purl = purl(finding)?;
        let licenses = normalize_licenses(&finding.dependency.metadata);
        let scope = if finding.dependency.direct { "required" } else { "optional" };

        match components.get_mut(&coordinate) {
            None => {
                component_order.push(coordinate.clone());
                components.insert(
                    coordinate.clone(),
                    json!({
                        "type": "library",
                        "name": finding.dependency.name,
                        "version": finding.dependency.version,
                        "purl": component_purl,
                        "scope": scope,
                        "licenses": licenses,
                    }),
                );
            }
            Some(existing) => {
                if existing["scope"] != "required" && scope == "required" {
                    existing["scope"] = json!("required");
                }
                let mut merged_licenses: Vec<Value> =
                    existing["licenses"].as_array().cloned().unwrap_or_default();
                merged_licenses.extend(licenses);
                existing["licenses"] = json!(dedup_by_key(merged_licenses, license_key));
            }
        }

        for advisory in &finding.advisories {
            let key = (advisory.source.clone(), advisory.identifier.clone());
            let references: Vec<Value> = advisory
                .references
                .iter()
                .map(|r| r.trim())
                .filter(|r| !r.is_empty())
                .map(|r| json!({"url": r}))
                .collect();
            let affects_entry = json!({"ref": component_purl});

            match vulnerabilities.get_mut(&key) {
                None => {
                    vulnerability_order.push(key.clone());
                    vulnerabilities.insert(
                        key,
                        json!({
                            "id": advisory.identifier,
                            "source": {"name": advisory.source},
                            "ratings": [{"severity": advisory.severity.as_str()}],
                            "affects": [affects_entry],
                            "description": advisory.summary,
                            "references": references,
                        }),
                    );
                }
                Some(entry) => {
                    let existing_severity =
                        entry["ratings"][0]["severity"].as_str().map(crate::models::Severity::from_label).unwrap_or(advisory.severity);
                    if advisory.severity > existing_severity {
                        entry["ratings"][0]["severity"] = json!(advisory.severity.as_str());
                    }
                    if entry["description"].as_str().unwrap_or("").is_empty() && !advisory.summary.is_empty() {
                        entry["description"] = json!(advisory.summary);
                    }
                    let mut affects: Vec<Value> = entry["affects"].as_array().cloned().unwrap_or_default();
                    affects.push(affects_entry);
                    entry["affects"] = json!(dedup_by_key(affects, |v| v["ref"].as_str().unwrap_or("").to_string()));
                    let mut refs: Vec<Value> = entry["references"].as_array().cloned().unwrap_or_default();
                    refs.extend(references);
                    entry["references"] = json!(dedup_by_key(refs, |v| v["url"].as_str().unwrap_or("").to_string()));
                }
            }
        }
    }

    Ok(json!({
        "bomFormat": "CycloneDX",
        "specVersion": "1.5",
        "version": 1,
        "metadata": {
            "timestamp": report.generated_at.to_rfc3339(),
            "tools": [{
                "vendor": TOOL_VENDOR,
                "name": TOOL_NAME,
                "version": env!("CARGO_PKG_VERSION"),
            }],
        },
        "components": component_order.into_iter().filter_map(|c| components.remove(&c)).collect::<Vec<_>>(),
        "vulnerabilities": vulnerability_order.into_iter().filter_map(|k| vulnerabilities.remove(&k)).collect::<Vec<_>>(),
    }))
}

pub fn write_sbom(report: &Report, path: &std::path::Path) -> Result<(), crate::error::DeptrustError> {
    let payload = generate_sbom(report)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| crate::error::ReportRenderingError::WriteError {
            path: path.display().to_string(),
            source,
        })?;
    }
    let text = serde_json::to_string_pretty(&payload)?;
    std::fs::write(path, text).map_err(|source| crate::error::ReportRenderingError::WriteError {
        path: path.display().to_string(),
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::models::{Advisory, Dependency, Severity};

    fn finding(ecosystem: Ecosystem, name: &str, version: &str, direct: bool) -> PackageFinding {
        PackageFinding {
            dependency: Dependency::new(ecosystem, name, version, direct, PathBuf::from("manifest")),
            advisories: Vec::new(),
            signals: Vec::new(),
            score: 0.0,
        }
    }

    #[test]
    fn maven_purl_splits_group_and_artifact() {
        let f = finding(Ecosystem::Maven, "com.google.guava:guava", "32.1.3", true);
        assert_eq!(purl(&f).unwrap(), "pkg:maven/com.google.guava/guava@32.1.3");
    }

    #[test]
    fn maven_purl_without_colon_is_an_error() {
        let f = finding(Ecosystem::Maven, "guava", "32.1.3", true);
        assert!(purl(&f).is_err());
    }

    #[test]
    fn missing_license_metadata_defaults_to_unknown() {
        let metadata = crate::models::Metadata::new();
        let licenses = normalize_licenses(&metadata);
        assert_eq!(licenses, vec![json!({"license": {"id": "UNKNOWN"}})]);
    }

    #[test]
    fn component_scope_upgrades_to_required_when_any_contributor_is_direct() {
        let report = Report {
            path: PathBuf::from("/tmp/project"),
            managers: vec!["npm".to_string()],
            findings: vec![
                finding(Ecosystem::Npm, "left-pad", "1.0.0", false),
                finding(Ecosystem::Npm, "left-pad", "1.0.0", true),
            ],
            generated_at: chrono::Utc::now(),
            stats: Default::default(),
        };
        let sbom = generate_sbom(&report).unwrap();
        let components = sbom["components"].as_array().unwrap();
        assert_eq!(components.len(), 1);
        assert_eq!(components[0]["scope"], "required");
    }

    #[test]
    fn vulnerabilities_merge_by_source_and_identifier_keeping_max_severity() {
        let mut low = finding(Ecosystem::Npm, "left-pad", "1.0.0", true);
        low.advisories.push(Advisory {
            identifier: "OSV-1".to_string(),
            source: "osv".to_string(),
            severity: Severity::Low,
            summary: String::new(),
            references: Vec::new(),
        });
        let mut high = finding(Ecosystem::Npm, "left-pad", "2.0.0", true);
        high.advisories.push(Advisory {
            identifier: "OSV-1".to_string(),
            source: "osv".to_string(),
            severity: Severity::High,
            summary: "details".to_string(),
            references: Vec::new(),
        });
        let report = Report {
            path: PathBuf::from("/tmp/project"),
            managers: vec!["npm".to_string()],
            findings: vec![low, high],
            generated_at: chrono::Utc::now(),
            stats: Default::default(),
        };
        let sbom = generate_sbom(&report).unwrap();
        let vulns = sbom["vulnerabilities"].as_array().unwrap();
        assert_eq!(vulns.len(), 1);
        assert_eq!(vulns[0]["ratings"][0]["severity"], "high");
        assert_eq!(vulns[0]["description"], "details");
    }
}
