//! # Trust Policy Engine
//!
//! Derives a fixed set of [`TrustSignal`]s from a dependency's release
//! metadata plus two static datasets (popular package names, known
//! compromised maintainers), then folds those signals and the dependency's
//! advisories into a single scalar risk score.

use std::collections::HashMap;

use serde::Deserialize;

use crate::config::PolicyThresholds;
use crate::error::PolicyError;
use crate::models::{Advisory, Dependency, PackageFinding, ReleaseMetadata, Severity, SignalCategory, TrustSignal};

const TOP_PACKAGES_JSON: &str = include_str!("../../resources/top_packages.json");
const COMPROMISED_MAINTAINERS_JSON: &str = include_str!("../../resources/compromised_maintainers.json");

#[derive(Debug, Deserialize)]
struct CompromisedEntry {
    ecosystem: String,
    package: String,
    #[serde(default)]
    reference: Option<String>,
}

/// Lowercased, trimmed, order-preserving dedup of a name list.
fn unique_casefolded(names: &[String]) -> Vec<(String, String)> {
    let mut seen: Vec<String> = Vec::new();
    let mut out = Vec::new();
    for name in names {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            continue;
        }
        let folded = trimmed.to_lowercase();
        if seen.contains(&folded) {
            continue;
        }
        seen.push(folded.clone());
        out.push((trimmed.to_string(), folded));
    }
    out
}

/// Edit distance with early cutoffs: equal strings, an empty side, and a
/// length-difference or row-minimum short circuit once `max_distance` is
/// provably exceeded.
pub fn levenshtein(a: &str, b: &str, max_distance: usize) -> usize {
    if a == b {
        return 0;
    }
    if a.is_empty() {
        return b.chars().count();
    }
    if b.is_empty() {
        return a.chars().count();
    }

    let (shorter, longer) = if a.chars().count() > b.chars().count() { (b, a) } else { (a, b) };
    let shorter: Vec<char> = shorter.chars().collect();
    let longer: Vec<char> = longer.chars().collect();

    if longer.len() - shorter.len() > max_distance {
        return max_distance + 1;
    }

    let mut prev_row: Vec<usize> = (0..=longer.len()).collect();
    for (i, &char_a) in shorter.iter().enumerate() {
        let mut row = vec![i + 1];
        let mut min_in_row = row[0];
        for (j, &char_b) in longer.iter().enumerate() {
            let cost = if char_a == char_b { 0 } else { 1 };
            let value = (row[j] + 1).min(prev_row[j + 1] + 1).min(prev_row[j] + cost);
            row.push(value);
            min_in_row = min_in_row.min(value);
        }
        if min_in_row > max_distance {
            return max_distance + 1;
        }
        prev_row = row;
    }
    let distance = prev_row[longer.len()];
    if distance > max_distance {
        max_distance + 1
    } else {
        distance
    }
}

pub struct TrustPolicyEngine {
    thresholds: PolicyThresholds,
    top_package_pairs: HashMap<String, Vec<(String, String)>>,
    compromised_index: HashMap<(String, String), String>,
}

impl TrustPolicyEngine {
    pub fn new(thresholds: PolicyThresholds) -> Result<Self, PolicyError> {
        let raw_top: HashMap<String, Vec<String>> =
            serde_json::from_str(TOP_PACKAGES_JSON).map_err(|e| PolicyError::TopPackagesLoadError {
                path: "resources/top_packages.json".to_string(),
                reason: e.to_string(),
            })?;
        let mut top_package_pairs = HashMap::new();
        for (ecosystem, names) in raw_top {
            let cleaned = unique_casefolded(&names);
            if cleaned.is_empty() {
                continue;
            }
            top_package_pairs.insert(ecosystem.to_lowercase(), cleaned);
        }

        let compromised_entries: Vec<CompromisedEntry> = serde_json::from_str(COMPROMISED_MAINTAINERS_JSON)
            .map_err(|e| PolicyError::CompromiseIndexLoadError {
                path: "resources/compromised_maintainers.json".to_string(),
                reason: e.to_string(),
            })?;
        let mut compromised_index = HashMap::new();
        for entry in compromised_entries {
            let key = (entry.ecosystem.to_lowercase(), entry.package.to_lowercase());
            compromised_index.insert(key, entry.reference.unwrap_or_default());
        }

        Ok(Self {
            thresholds,
            top_package_pairs,
            compromised_index,
        })
    }

    pub fn analyze(&self, dependency: &Dependency, advisories: &[Advisory], metadata: &ReleaseMetadata) -> PackageFinding {
        let signals = self.derive_signals(dependency, metadata);

        let mut score = advisories.iter().map(|a| a.severity.score()).fold(0.0_f64, f64::max);
        for signal in &signals {
            score = score.max(signal.severity.score());
        }

        PackageFinding {
            dependency: dependency.clone(),
            advisories: advisories.to_vec(),
            signals,
            score: score.min(1.0),
        }
    }

    fn derive_signals(&self, dependency: &Dependency, metadata: &ReleaseMetadata) -> Vec<TrustSignal> {
        let mut signals = Vec::new();

        if metadata.latest_release.is_none() {
            signals.push(TrustSignal {
                category: SignalCategory::ReleaseMetadata,
                severity: Severity::Medium,
                message: "Upstream registry does not publish release timestamps".to_string(),
                evidence: evidence([("ecosystem", serde_json::json!(metadata.ecosystem))]),
            });
        }

        if metadata.is_abandoned(self.thresholds.abandonment_threshold_days) {
            signals.push(TrustSignal {
                category: SignalCategory::Abandonment,
                severity: Severity::High,
                message: "No release in the last 18 months".to_string(),
                evidence: evidence([
                    ("latest_release", serde_json::json!(metadata.latest_release)),
                    ("days_since_release", serde_json::json!(metadata.days_since_latest())),
                ]),
            });
        }

        match metadata.churn_band_with(self.thresholds.churn_high, self.thresholds.churn_medium) {
            crate::models::ChurnBand::High => signals.push(TrustSignal {
                category: SignalCategory::Churn,
                severity: Severity::High,
                message: "Extreme release velocity in the last 30 days".to_string(),
                evidence: evidence([("releases_last_30d", serde_json::json!(metadata.releases_last_30d))]),
            }),
            crate::models::ChurnBand::Medium => signals.push(TrustSignal {
                category: SignalCategory::Churn,
                severity: Severity::Medium,
                message: "High release velocity in the last 30 days".to_string(),
                evidence: evidence([("releases_last_30d", serde_json::json!(metadata.releases_last_30d))]),
            }),
            crate::models::ChurnBand::Normal => {}
        }

        let maintainer_count = metadata.maintainer_count();
        if maintainer_count == 0 {
            signals.push(TrustSignal {
                category: SignalCategory::Maintainer,
                severity: Severity::Medium,
                message: "No maintainers listed in upstream metadata".to_string(),
                evidence: evidence([("maintainers", serde_json::json!(metadata.maintainers))]),
            });
        } else if maintainer_count == 1 {
            signals.push(TrustSignal {
                category: SignalCategory::Maintainer,
                severity: Severity::Low,
                message: "Single maintainer detected".to_string(),
                evidence: evidence([("maintainers", serde_json::json!(metadata.maintainers))]),
            });
        }

        if metadata.is_low_maturity(self.thresholds.low_maturity_threshold) {
            signals.push(TrustSignal {
                category: SignalCategory::Maturity,
                severity: Severity::Low,
                message: "Limited release history detected".to_string(),
                evidence: evidence([("total_releases", serde_json::json!(metadata.total_releases))]),
            });
        }

        let ecosystem_key = dependency.normalized_ecosystem();
        let name_key = dependency.normalized_name();
        if let Some(reference) = self.compromised_index.get(&(ecosystem_key.clone(), name_key.clone())) {
            signals.push(TrustSignal {
                category: SignalCategory::CompromisedMaintainer,
                severity: Severity::Critical,
                message: "Package previously compromised".to_string(),
                evidence: evidence([("reference", serde_json::json!(reference))]),
            });
        }

        if let Some(pairs) = self.top_package_pairs.get(&ecosystem_key) {
            for (top_name, normalized) in pairs {
                if &name_key == normalized {
                    continue;
                }
                let distance = levenshtein(&name_key, normalized, self.thresholds.typosquat_max_distance);
                if distance == 1 {
                    signals.push(TrustSignal {
                        category: SignalCategory::Typosquat,
                        severity: Severity::High,
                        message: format!("Name is 1 edit away from popular package '{top_name}'"),
                        evidence: evidence([("target", serde_json::json!(top_name))]),
                    });
                    break;
                }
                if distance == 2 {
                    signals.push(TrustSignal {
                        category: SignalCategory::Typosquat,
                        severity: Severity::Medium,
                        message: format!("Name is 2 edits away from popular package '{top_name}'"),
                        evidence: evidence([("target", serde_json::json!(top_name))]),
                    });
                    break;
                }
            }
        }

        signals
    }
}

fn evidence<const N: usize>(pairs: [(&str, serde_json::Value); N]) -> crate::models::Metadata {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::models::Ecosystem;

    #[test]
    fn levenshtein_matches_known_distances() {
        assert_eq!(levenshtein("requests", "requests", 2), 0);
        assert_eq!(levenshtein("requests", "request", 2), 1);
        assert_eq!(levenshtein("requests", "requsts", 2), 1);
        assert_eq!(levenshtein("requests", "rqsts", 2), 3);
    }

    #[test]
    fn levenshtein_respects_empty_strings() {
        assert_eq!(levenshtein("", "abc", 5), 3);
        assert_eq!(levenshtein("abc", "", 5), 3);
    }

    #[test]
    fn static_resources_parse_and_build_engine() {
        let engine = TrustPolicyEngine::new(PolicyThresholds::default()).expect("resources parse");
        assert!(engine.top_package_pairs.contains_key("pypi"));
        assert!(engine.compromised_index.contains_key(&("npm".to_string(), "event-stream".to_string())));
    }

    #[test]
    fn typosquat_signal_fires_for_a_one_edit_name() {
        let engine = TrustPolicyEngine::new(PolicyThresholds::default()).unwrap();
        let dep = Dependency::new(Ecosystem::Pypi, "request", "1.0.0", true, PathBuf::from("requirements.txt"));
        let metadata = ReleaseMetadata {
            latest_release: Some(chrono::Utc::now()),
            releases_last_30d: 1,
            total_releases: 20,
            maintainers: vec!["alice".to_string(), "bob".to_string()],
            ecosystem: "pypi".to_string(),
        };
        let signals = engine.derive_signals(&dep, &metadata);
        assert!(signals.iter().any(|s| s.category == SignalCategory::Typosquat && s.severity == Severity::High));
    }

    #[test]
    fn compromised_maintainer_signal_is_critical() {
        let engine = TrustPolicyEngine::new(PolicyThresholds::default()).unwrap();
        let dep = Dependency::new(Ecosystem::Npm, "event-stream", "3.3.6", true, PathBuf::from("package.json"));
        let metadata = ReleaseMetadata {
            latest_release: Some(chrono::Utc::now()),
            releases_last_30d: 0,
            total_releases: 10,
            maintainers: vec!["dominictarr".to_string()],
            ecosystem: "npm".to_string(),
        };
        let signals = engine.derive_signals(&dep, &metadata);
        assert!(signals
            .iter()
            .any(|s| s.category == SignalCategory::CompromisedMaintainer && s.severity == Severity::Critical));
    }

    #[test]
    fn analyze_score_is_the_max_across_advisories_and_signals() {
        let engine = TrustPolicyEngine::new(PolicyThresholds::default()).unwrap();
        let dep = Dependency::new(Ecosystem::Npm, "left-pad", "1.0.0", true, PathBuf::from("package.json"));
        let metadata = ReleaseMetadata::empty("npm");
        let advisories = vec![Advisory {
            identifier: "OSV-1".to_string(),
            source: "osv".to_string(),
            severity: Severity::Medium,
            summary: "test".to_string(),
            references: Vec::new(),
        }];
        let finding = engine.analyze(&dep, &advisories, &metadata);
        assert_eq!(finding.verdict(), Severity::Medium);
    }
}
