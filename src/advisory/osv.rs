//! OSV-style batch vulnerability queries.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::{Dependency, Severity};

lazy_static::lazy_static! {
    static ref NUMERIC_SCORE: Regex = Regex::new(r"(\d+(?:\.\d+)?)").unwrap();
}

#[derive(Debug, Serialize)]
pub struct OsvPackage {
    pub name: String,
    pub ecosystem: String,
}

#[derive(Debug, Serialize)]
pub struct OsvQuery {
    pub package: OsvPackage,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct OsvBatchQuery {
    pub queries: Vec<OsvQuery>,
}

#[derive(Debug, Deserialize, Default)]
pub struct OsvBatchResponse {
    #[serde(default)]
    pub results: Vec<OsvResult>,
}

#[derive(Debug, Deserialize, Default)]
pub struct OsvResult {
    #[serde(default)]
    pub vulns: Vec<OsvVuln>,
}

#[derive(Debug, Deserialize)]
pub struct OsvVuln {
    pub id: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub severity: Vec<OsvSeverityEntry>,
    #[serde(default)]
    pub references: Vec<OsvReference>,
    #[serde(default)]
    pub database_specific: Option<OsvDatabaseSpecific>,
}

#[derive(Debug, Deserialize)]
pub struct OsvSeverityEntry {
    #[serde(default)]
    pub score: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OsvReference {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OsvDatabaseSpecific {
    #[serde(default)]
    pub severity: Option<String>,
}

/// Build a batch query body for a set of dependencies. Caller is expected to
/// have already filtered to OSV-supported ecosystems.
pub fn build_batch_query(deps: &[&Dependency]) -> OsvBatchQuery {
    OsvBatchQuery {
        queries: deps
            .iter()
            .map(|d| OsvQuery {
                package: OsvPackage {
                    name: d.name.clone(),
                    ecosystem: d.ecosystem.osv_label().unwrap_or_default().to_string(),
                },
                version: d.version.clone(),
            })
            .collect(),
    }
}

/// Extract the first decimal number in an OSV severity score field, which
/// may be a bare number or a CVSS vector string.
fn extract_numeric_score(raw: &str) -> Option<f64> {
    NUMERIC_SCORE.captures(raw).and_then(|c| c.get(1)).and_then(|m| m.as_str().parse().ok())
}

fn severity_from_label(label: &str) -> Severity {
    let lowered = label.to_lowercase();
    if lowered.contains("critical") {
        Severity::Critical
    } else if lowered.contains("high") {
        Severity::High
    } else if lowered.contains("moderate") || lowered.contains("medium") {
        Severity::Medium
    } else if lowered.contains("low") {
        Severity::Low
    } else {
        Severity::Low
    }
}

/// Map an OSV vulnerability onto our severity scale: prefer a numeric score,
/// fall back to the free-text `database_specific.severity` label.
pub fn severity_from_osv(vuln: &OsvVuln) -> Severity {
    for entry in &vuln.severity {
        if let Some(score_raw) = &entry.score {
            if let Some(score) = extract_numeric_score(score_raw) {
                return if score >= 9.0 {
                    Severity::Critical
                } else if score >= 7.0 {
                    Severity::High
                } else if score >= 4.0 {
                    Severity::Medium
                } else if score > 0.0 {
                    Severity::Low
                } else {
                    Severity::None
                };
            }
        }
    }
    match vuln.database_specific.as_ref().and_then(|d| d.severity.as_deref()) {
        Some(label) => severity_from_label(label),
        None => Severity::None,
    }
}
