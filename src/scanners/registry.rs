//! Resolves a requested list of manager names into [`Scanner`] instances,
//! case-folded and deduplicated, collecting every unrecognized name into one
//! error rather than failing on the first miss.

use crate::error::ScanError;
use crate::scanners::{
    cargo::CargoScanner, composer::ComposerScanner, conda::CondaScanner, docker::DockerScanner, go::GoScanner,
    homebrew::HomebrewScanner, maven::MavenScanner, npm::NpmScanner, nuget::NuGetScanner, pypi::PypiScanner,
    rubygems::RubyGemsScanner, Scanner,
};

const KNOWN_MANAGERS: [&str; 11] =
    ["npm", "pypi", "maven", "cargo", "go", "composer", "nuget", "rubygems", "brew", "conda", "docker"];

pub fn known_managers() -> &'static [&'static str] {
    &KNOWN_MANAGERS
}

fn build(name: &str) -> Option<Box<dyn Scanner>> {
    match name {
        "npm" => Some(Box::new(NpmScanner)),
        "pypi" => Some(Box::new(PypiScanner)),
        "maven" => Some(Box::new(MavenScanner)),
        "cargo" => Some(Box::new(CargoScanner)),
        "go" => Some(Box::new(GoScanner)),
        "composer" => Some(Box::new(ComposerScanner)),
        "nuget" => Some(Box::new(NuGetScanner)),
        "rubygems" => Some(Box::new(RubyGemsScanner)),
        "brew" => Some(Box::new(HomebrewScanner)),
        "conda" => Some(Box::new(CondaScanner)),
        "docker" => Some(Box::new(DockerScanner)),
        _ => None,
    }
}

/// `names = None` selects every known scanner; otherwise names are
/// case-folded, deduplicated in input order, and every unknown name is
/// collected (in order of first appearance) into one [`ScanError`].
pub fn get_scanners(names: Option<&[String]>) -> Result<Vec<Box<dyn Scanner>>, ScanError> {
    let selected: Vec<String> = match names {
        None => KNOWN_MANAGERS.iter().map(|s| s.to_string()).collect(),
        Some(names) => names.to_vec(),
    };

    let mut scanners = Vec::new();
    let mut unknown = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for raw_name in selected {
        let normalized = raw_name.to_lowercase();
        if !seen.insert(normalized.clone()) {
            continue;
        }
        match build(&normalized) {
            Some(scanner) => scanners.push(scanner),
            None => unknown.push(raw_name),
        }
    }

    if !unknown.is_empty() {
        return Err(ScanError::UnknownManagers(unknown));
    }
    Ok(scanners)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_selects_every_known_manager() {
        let scanners = get_scanners(None).unwrap();
        assert_eq!(scanners.len(), KNOWN_MANAGERS.len());
    }

    #[test]
    fn unknown_names_are_all_collected_in_order() {
        let names = vec!["npm".to_string(), "bogus1".to_string(), "cargo".to_string(), "bogus2".to_string()];
        let err = get_scanners(Some(&names)).unwrap_err();
        match err {
            ScanError::UnknownManagers(unknown) => assert_eq!(unknown, vec!["bogus1".to_string(), "bogus2".to_string()]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn duplicate_names_are_case_folded_and_deduped() {
        let names = vec!["NPM".to_string(), "npm".to_string()];
        let scanners = get_scanners(Some(&names)).unwrap();
        assert_eq!(scanners.len(), 1);
    }
}
