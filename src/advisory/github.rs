//! GitHub-style per-package GraphQL vulnerability queries.

use serde::Deserialize;

use crate::models::{Ecosystem, Severity};

pub const GRAPHQL_QUERY: &str = r#"
query($ecosystem: SecurityAdvisoryEcosystem!, $package: String!) {
  securityVulnerabilities(ecosystem: $ecosystem, package: $package, first: 100) {
    nodes {
      advisory {
        identifiers { type value }
        summary
        permalink
        severity
      }
      vulnerableVersionRange
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
pub struct GraphqlEnvelope {
    #[serde(default)]
    pub data: Option<GraphqlData>,
    #[serde(default)]
    pub errors: Option<Vec<GraphqlErrorEntry>>,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlErrorEntry {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlData {
    #[serde(rename = "securityVulnerabilities")]
    pub security_vulnerabilities: SecurityVulnerabilities,
}

#[derive(Debug, Deserialize)]
pub struct SecurityVulnerabilities {
    #[serde(default)]
    pub nodes: Vec<VulnerabilityNode>,
}

#[derive(Debug, Deserialize)]
pub struct VulnerabilityNode {
    pub advisory: AdvisoryNode,
}

#[derive(Debug, Deserialize)]
pub struct AdvisoryNode {
    #[serde(default)]
    pub identifiers: Vec<IdentifierNode>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IdentifierNode {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl AdvisoryNode {
    pub fn identifier(&self) -> String {
        self.identifiers
            .iter()
            .find(|i| i.kind == "GHSA")
            .or_else(|| self.identifiers.first())
            .map(|i| i.value.clone())
            .unwrap_or_default()
    }
}

/// The GraphQL ecosystem enum value for a given ecosystem, or `None` if
/// GitHub's advisory database does not index it.
pub fn github_ecosystem_label(ecosystem: Ecosystem) -> Option<&'static str> {
    match ecosystem {
        Ecosystem::Pypi => Some("PIP"),
        Ecosystem::Npm => Some("NPM"),
        Ecosystem::Maven => Some("MAVEN"),
        Ecosystem::Go => Some("GO"),
        Ecosystem::Crates => Some("RUST"),
        Ecosystem::Packagist => Some("COMPOSER"),
        Ecosystem::Nuget => Some("NUGET"),
        Ecosystem::Rubygems => Some("RUBYGEMS"),
        Ecosystem::Homebrew | Ecosystem::Conda | Ecosystem::Docker => None,
    }
}

/// Case-insensitive map `critical|high|moderate/medium|low -> Severity`;
/// unknown or missing labels default to LOW.
pub fn severity_from_github_label(label: Option<&str>) -> Severity {
    match label.map(|l| l.to_lowercase()) {
        Some(ref l) if l == "critical" => Severity::Critical,
        Some(ref l) if l == "high" => Severity::High,
        Some(ref l) if l == "moderate" || l == "medium" => Severity::Medium,
        Some(ref l) if l == "low" => Severity::Low,
        _ => Severity::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_label_mapping() {
        assert_eq!(severity_from_github_label(Some("CRITICAL")), Severity::Critical);
        assert_eq!(severity_from_github_label(Some("HIGH")), Severity::High);
        assert_eq!(severity_from_github_label(Some("MODERATE")), Severity::Medium);
        assert_eq!(severity_from_github_label(Some("LOW")), Severity::Low);
    }

    #[test]
    fn unknown_or_missing_defaults_to_low() {
        assert_eq!(severity_from_github_label(Some("weird")), Severity::Low);
        assert_eq!(severity_from_github_label(None), Severity::Low);
    }

    #[test]
    fn identifier_prefers_ghsa() {
        let advisory = AdvisoryNode {
            identifiers: vec![
                IdentifierNode { kind: "CVE".into(), value: "CVE-1".into() },
                IdentifierNode { kind: "GHSA".into(), value: "GHSA-1".into() },
            ],
            summary: String::new(),
            permalink: None,
            severity: None,
        };
        assert_eq!(advisory.identifier(), "GHSA-1");
    }
}
