//! Core data model: dependencies, severities, advisories, signals, and findings.
//!
//! Every type here is an immutable value. `Dependency` is the unit the rest of
//! the pipeline keys on via its [`Dependency::coordinate`].

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Rank used to totally order [`Severity`] values; mirrors the fixed
/// `SEVERITY_RANK` table.
pub const SEVERITY_RANK: [(Severity, u8); 5] = [
    (Severity::None, 0),
    (Severity::Low, 1),
    (Severity::Medium, 2),
    (Severity::High, 3),
    (Severity::Critical, 4),
];

/// Totally ordered severity scale shared by advisories, signals, and findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Numeric score used by the policy engine's scalar scoring.
    pub fn score(self) -> f64 {
        match self {
            Severity::None => 0.0,
            Severity::Low => 0.3,
            Severity::Medium => 0.6,
            Severity::High => 0.85,
            Severity::Critical => 1.0,
        }
    }

    /// Rank used for ordering comparisons and histogram iteration.
    pub fn rank(self) -> u8 {
        match self {
            Severity::None => 0,
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
            Severity::Critical => 4,
        }
    }

    /// Map a scalar risk score back onto the severity scale.
    pub fn from_score(score: f64) -> Severity {
        if score >= 0.85 {
            Severity::Critical
        } else if score >= 0.7 {
            Severity::High
        } else if score >= 0.4 {
            Severity::Medium
        } else if score > 0.0 {
            Severity::Low
        } else {
            Severity::None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// Case-insensitive parse from a free-text severity label (used when an
    /// upstream source reports severity as a string rather than a score).
    pub fn from_label(label: &str) -> Severity {
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
}

impl Default for Severity {
    fn default() -> Self {
        Severity::None
    }
}

/// The closed set of ecosystems this crate understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    Npm,
    Pypi,
    Maven,
    Crates,
    Go,
    Packagist,
    Nuget,
    Rubygems,
    Homebrew,
    Conda,
    Docker,
}

impl Ecosystem {
    pub fn as_str(self) -> &'static str {
        match self {
            Ecosystem::Npm => "npm",
            Ecosystem::Pypi => "pypi",
            Ecosystem::Maven => "maven",
            Ecosystem::Crates => "crates",
            Ecosystem::Go => "go",
            Ecosystem::Packagist => "packagist",
            Ecosystem::Nuget => "nuget",
            Ecosystem::Rubygems => "rubygems",
            Ecosystem::Homebrew => "homebrew",
            Ecosystem::Conda => "conda",
            Ecosystem::Docker => "docker",
        }
    }

    pub fn parse(raw: &str) -> Option<Ecosystem> {
        match raw.to_lowercase().as_str() {
            "npm" => Some(Ecosystem::Npm),
            "pypi" => Some(Ecosystem::Pypi),
            "maven" => Some(Ecosystem::Maven),
            "crates" | "crates.io" | "cargo" => Some(Ecosystem::Crates),
            "go" | "golang" => Some(Ecosystem::Go),
            "packagist" | "composer" => Some(Ecosystem::Packagist),
            "nuget" => Some(Ecosystem::Nuget),
            "rubygems" | "gem" => Some(Ecosystem::Rubygems),
            "homebrew" | "brew" => Some(Ecosystem::Homebrew),
            "conda" => Some(Ecosystem::Conda),
            "docker" => Some(Ecosystem::Docker),
            _ => None,
        }
    }

    /// The exact ecosystem label OSV expects in a batch query, or `None` if
    /// OSV does not index this ecosystem at all.
    pub fn osv_label(self) -> Option<&'static str> {
        match self {
            Ecosystem::Pypi => Some("PyPI"),
            Ecosystem::Npm => Some("npm"),
            Ecosystem::Maven => Some("Maven"),
            Ecosystem::Go => Some("Go"),
            Ecosystem::Crates => Some("crates.io"),
            Ecosystem::Packagist => Some("Packagist"),
            Ecosystem::Nuget => Some("NuGet"),
            Ecosystem::Rubygems => Some("RubyGems"),
            Ecosystem::Homebrew | Ecosystem::Conda | Ecosystem::Docker => None,
        }
    }
}

/// A free-form metadata mapping attached to a dependency: source filename,
/// scope, flags, license, or (after a merge) a `manifests` list.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// An immutable third-party package reference as discovered by a scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub ecosystem: Ecosystem,
    pub name: String,
    pub version: String,
    pub direct: bool,
    pub manifest: PathBuf,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Dependency {
    pub fn new(
        ecosystem: Ecosystem,
        name: impl Into<String>,
        version: impl Into<String>,
        direct: bool,
        manifest: PathBuf,
    ) -> Self {
        Self {
            ecosystem,
            name: name.into(),
            version: version.into(),
            direct,
            manifest,
            metadata: Metadata::new(),
        }
    }

    /// The primary key used throughout the pipeline: `ecosystem:name@version`.
    pub fn coordinate(&self) -> String {
        format!("{}:{}@{}", self.ecosystem.as_str(), self.name, self.version)
    }

    pub fn normalized_name(&self) -> String {
        self.name.to_lowercase()
    }

    pub fn normalized_ecosystem(&self) -> String {
        self.ecosystem.as_str().to_lowercase()
    }

    /// Fold a newly discovered duplicate into an existing dependency with the
    /// same coordinate: direct-ness is OR'd, metadata from `new` overlays
    /// `existing`, and the `manifests` key becomes an insertion-order-unique
    /// list of every contributing manifest.
    pub fn merge(existing: &Dependency, new: &Dependency) -> Dependency {
        let mut merged = existing.clone();
        merged.direct = existing.direct || new.direct;

        let mut manifests: Vec<String> = Vec::new();
        if let Some(serde_json::Value::Array(prior)) = existing.metadata.get("manifests") {
            for entry in prior {
                if let Some(s) = entry.as_str() {
                    if !manifests.iter().any(|m| m == s) {
                        manifests.push(s.to_string());
                    }
                }
            }
        } else {
            manifests.push(existing.manifest.display().to_string());
        }
        let new_manifest = new.manifest.display().to_string();
        if !manifests.iter().any(|m| m == &new_manifest) {
            manifests.push(new_manifest);
        }

        for (key, value) in &new.metadata {
            merged.metadata.insert(key.clone(), value.clone());
        }
        merged.metadata.insert(
            "manifests".to_string(),
            serde_json::Value::Array(manifests.into_iter().map(serde_json::Value::String).collect()),
        );
        merged
    }
}

/// A known vulnerability affecting a package, deduplicated by `(source, identifier)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    pub identifier: String,
    pub source: String,
    pub severity: Severity,
    pub summary: String,
    #[serde(default)]
    pub references: Vec<String>,
}

/// One fixed-category trust signal derived by the policy engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustSignal {
    pub category: SignalCategory,
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub evidence: Metadata,
}

/// The closed set of signal categories the policy engine can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalCategory {
    ReleaseMetadata,
    Abandonment,
    Churn,
    Maintainer,
    Maturity,
    CompromisedMaintainer,
    Typosquat,
}

impl SignalCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            SignalCategory::ReleaseMetadata => "release-metadata",
            SignalCategory::Abandonment => "abandonment",
            SignalCategory::Churn => "churn",
            SignalCategory::Maintainer => "maintainer",
            SignalCategory::Maturity => "maturity",
            SignalCategory::CompromisedMaintainer => "compromised-maintainer",
            SignalCategory::Typosquat => "typosquat",
        }
    }
}

/// Churn band derived from releases in the trailing 30 days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChurnBand {
    Normal,
    Medium,
    High,
}

/// Release/maintainer metadata for a package, version-independent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseMetadata {
    pub latest_release: Option<chrono::DateTime<chrono::Utc>>,
    pub releases_last_30d: u64,
    pub total_releases: u64,
    pub maintainers: Vec<String>,
    pub ecosystem: String,
}

impl ReleaseMetadata {
    pub fn empty(ecosystem: impl Into<String>) -> Self {
        Self {
            latest_release: None,
            releases_last_30d: 0,
            total_releases: 0,
            maintainers: Vec::new(),
            ecosystem: ecosystem.into(),
        }
    }

    pub fn is_abandoned(&self, threshold_days: i64) -> bool {
        match self.days_since_latest() {
            Some(days) => days >= threshold_days,
            None => false,
        }
    }

    pub fn days_since_latest(&self) -> Option<i64> {
        self.latest_release
            .map(|latest| (chrono::Utc::now() - latest).num_days())
    }

    pub fn has_suspicious_churn(&self) -> bool {
        self.churn_band() != ChurnBand::Normal
    }

    pub fn churn_band_with(&self, high: u64, medium: u64) -> ChurnBand {
        if self.releases_last_30d >= high {
            ChurnBand::High
        } else if self.releases_last_30d >= medium {
            ChurnBand::Medium
        } else {
            ChurnBand::Normal
        }
    }

    /// Churn band using the shipped defaults (`high=10, medium=5`).
    pub fn churn_band(&self) -> ChurnBand {
        self.churn_band_with(10, 5)
    }

    /// Case-insensitive, trimmed, deduplicated maintainer count.
    pub fn maintainer_count(&self) -> usize {
        let mut seen: Vec<String> = Vec::new();
        for name in &self.maintainers {
            let key = name.trim().to_lowercase();
            if key.is_empty() {
                continue;
            }
            if !seen.contains(&key) {
                seen.push(key);
            }
        }
        seen.len()
    }

    pub fn has_maintainers(&self) -> bool {
        self.maintainer_count() > 0
    }

    pub fn is_low_maturity(&self, minimum_releases: u64) -> bool {
        minimum_releases > 0 && self.total_releases < minimum_releases
    }
}

/// The per-package result of policy analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageFinding {
    pub dependency: Dependency,
    #[serde(default)]
    pub advisories: Vec<Advisory>,
    #[serde(default)]
    pub signals: Vec<TrustSignal>,
    pub score: f64,
}

impl PackageFinding {
    /// `max(Severity::from_score(score), max advisory severity, max signal severity)`.
    pub fn verdict(&self) -> Severity {
        let mut verdict = Severity::from_score(self.score);
        for advisory in &self.advisories {
            if advisory.severity > verdict {
                verdict = advisory.severity;
            }
        }
        for signal in &self.signals {
            if signal.severity > verdict {
                verdict = signal.severity;
            }
        }
        verdict
    }

    /// Flattened serialization shape used by the JSON report's `findings[]`.
    pub fn to_report_json(&self) -> serde_json::Value {
        serde_json::json!({
            "dependency": self.dependency.coordinate(),
            "ecosystem": self.dependency.ecosystem.as_str(),
            "name": self.dependency.name,
            "version": self.dependency.version,
            "direct": self.dependency.direct,
            "manifest": self.dependency.manifest.display().to_string(),
            "metadata": self.dependency.metadata,
            "score": self.score,
            "verdict": self.verdict().as_str(),
            "advisories": self.advisories,
            "signals": self.signals,
        })
    }
}

/// Per-category and global severity histograms derived from a finding set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SignalSummary {
    pub category_counts: BTreeMap<String, u64>,
    pub category_severity: BTreeMap<String, BTreeMap<String, u64>>,
    pub severity_totals: BTreeMap<String, u64>,
}

const SEVERITY_ORDER: [Severity; 5] = [
    Severity::None,
    Severity::Low,
    Severity::Medium,
    Severity::High,
    Severity::Critical,
];

impl SignalSummary {
    pub fn from_findings(findings: &[PackageFinding]) -> Self {
        let mut category_counts: BTreeMap<String, u64> = BTreeMap::new();
        let mut category_severity: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();
        let mut severity_totals: BTreeMap<String, u64> = BTreeMap::new();

        // Seed every severity bucket so histograms iterate low-to-high rank
        // even for zero counts.
        for severity in SEVERITY_ORDER {
            severity_totals.entry(severity.as_str().to_string()).or_insert(0);
        }

        for finding in findings {
            for signal in &finding.signals {
                let category = signal.category.as_str().to_string();
                *category_counts.entry(category.clone()).or_insert(0) += 1;
                let bucket = category_severity.entry(category).or_default();
                for severity in SEVERITY_ORDER {
                    bucket.entry(severity.as_str().to_string()).or_insert(0);
                }
                *bucket.entry(signal.severity.as_str().to_string()).or_insert(0) += 1;
                *severity_totals.entry(signal.severity.as_str().to_string()).or_insert(0) += 1;
            }
        }

        Self {
            category_counts,
            category_severity,
            severity_totals,
        }
    }

    pub fn has_data(&self) -> bool {
        !self.category_counts.is_empty()
    }
}

/// Exit-code mapping shared by [`Report::exit_code`] and the CLI's `report`
/// command, which only has the severity label from a saved JSON report.
pub fn exit_code_for_severity_label(label: &str) -> i32 {
    match label {
        "critical" | "high" => 2,
        "medium" => 1,
        _ => 0,
    }
}

/// A complete scan result: findings, discovery stats, and the manager list
/// that contributed dependencies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub path: PathBuf,
    pub managers: Vec<String>,
    pub findings: Vec<PackageFinding>,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub stats: HashMap<String, serde_json::Value>,
}

impl Report {
    pub fn highest_severity(&self) -> Severity {
        self.findings
            .iter()
            .map(|f| f.verdict())
            .max()
            .unwrap_or(Severity::None)
    }

    /// Exit code mapping: CRITICAL/HIGH -> 2, MEDIUM -> 1, else 0.
    pub fn exit_code(&self) -> i32 {
        exit_code_for_severity_label(self.highest_severity().as_str())
    }

    pub fn signal_summary(&self) -> SignalSummary {
        SignalSummary::from_findings(&self.findings)
    }

    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "path": self.path.display().to_string(),
            "dependency_count": self.findings.len(),
            "highest_severity": self.highest_severity().as_str(),
            "managers": self.managers,
        })
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "summary": self.summary(),
            "findings": self.findings.iter().map(|f| f.to_report_json()).collect::<Vec<_>>(),
            "stats": self.stats,
            "signal_summary": self.signal_summary(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dep(direct: bool, manifest: &str) -> Dependency {
        let mut d = Dependency::new(Ecosystem::Pypi, "requests", "2.31.0", direct, PathBuf::from(manifest));
        d.metadata.insert("source".to_string(), serde_json::json!(manifest));
        d
    }

    #[test]
    fn severity_from_score_thresholds() {
        assert_eq!(Severity::from_score(0.0), Severity::None);
        assert_eq!(Severity::from_score(0.1), Severity::Low);
        assert_eq!(Severity::from_score(0.4), Severity::Medium);
        assert_eq!(Severity::from_score(0.7), Severity::High);
        assert_eq!(Severity::from_score(0.85), Severity::Critical);
        assert_eq!(Severity::from_score(1.0), Severity::Critical);
    }

    #[test]
    fn severity_ordering_is_total() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert!(Severity::Low > Severity::None);
    }

    #[test]
    fn coordinate_format() {
        let d = dep(true, "requirements.txt");
        assert_eq!(d.coordinate(), "pypi:requests@2.31.0");
    }

    #[test]
    fn merge_ors_direct_and_unions_manifests() {
        let existing = dep(true, "requirements.txt");
        let new = dep(false, "pyproject.toml");
        let merged = Dependency::merge(&existing, &new);
        assert!(merged.direct);
        let manifests = merged.metadata.get("manifests").unwrap().as_array().unwrap();
        assert_eq!(manifests.len(), 2);
        assert_eq!(manifests[0], serde_json::json!("requirements.txt"));
        assert_eq!(manifests[1], serde_json::json!("pyproject.toml"));
    }

    #[test]
    fn merge_is_idempotent() {
        let existing = dep(true, "requirements.txt");
        let new = dep(false, "pyproject.toml");
        let once = Dependency::merge(&existing, &new);
        let twice = Dependency::merge(&existing, &once);
        assert_eq!(once.metadata.get("manifests"), twice.metadata.get("manifests"));
        assert_eq!(once.direct, twice.direct);
    }

    #[test]
    fn maintainer_count_is_case_insensitive_and_trimmed() {
        let meta = ReleaseMetadata {
            latest_release: None,
            releases_last_30d: 0,
            total_releases: 1,
            maintainers: vec!["Alice".into(), " alice ".into(), "Bob".into()],
            ecosystem: "pypi".into(),
        };
        assert_eq!(meta.maintainer_count(), 2);
    }

    #[test]
    fn churn_band_thresholds() {
        let mut meta = ReleaseMetadata::empty("pypi");
        meta.releases_last_30d = 4;
        assert_eq!(meta.churn_band(), ChurnBand::Normal);
        meta.releases_last_30d = 5;
        assert_eq!(meta.churn_band(), ChurnBand::Medium);
        meta.releases_last_30d = 10;
        assert_eq!(meta.churn_band(), ChurnBand::High);
    }

    #[test]
    fn finding_verdict_takes_max_across_score_advisories_signals() {
        let finding = PackageFinding {
            dependency: dep(true, "requirements.txt"),
            advisories: vec![Advisory {
                identifier: "GHSA-1".into(),
                source: "github".into(),
                severity: Severity::High,
                summary: "test".into(),
                references: vec![],
            }],
            signals: vec![TrustSignal {
                category: SignalCategory::Typosquat,
                severity: Severity::Critical,
                message: "m".into(),
                evidence: Metadata::new(),
            }],
            score: 0.1,
        };
        assert_eq!(finding.verdict(), Severity::Critical);
    }

    #[test]
    fn report_exit_code_is_monotone() {
        let mut finding = PackageFinding {
            dependency: dep(true, "requirements.txt"),
            advisories: vec![],
            signals: vec![],
            score: 0.0,
        };
        let mut report = Report {
            path: PathBuf::from("."),
            managers: vec![],
            findings: vec![finding.clone()],
            generated_at: chrono::Utc::now(),
            stats: HashMap::new(),
        };
        assert_eq!(report.exit_code(), 0);

        finding.score = 0.5;
        report.findings = vec![finding.clone()];
        assert_eq!(report.exit_code(), 1);

        finding.score = 0.9;
        report.findings = vec![finding];
        assert_eq!(report.exit_code(), 2);
    }
}
