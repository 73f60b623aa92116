use std::collections::BTreeMap;
use std::path::Path;

use super::common::{detect_files, read_json, xml_attr, xml_tag_text};
use super::Scanner;
use crate::models::{Dependency, Ecosystem};

pub struct NuGetScanner;

impl Scanner for NuGetScanner {
    fn manager(&self) -> &'static str {
        "nuget"
    }

    fn manifests(&self) -> &'static [&'static str] {
        &["packages.lock.json", "*.csproj", "*.fsproj"]
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Nuget
    }

    fn scan(&self, root: &Path) -> Vec<Dependency> {
        let mut dependencies: BTreeMap<String, String> = BTreeMap::new();
        let mut origins: BTreeMap<String, std::path::PathBuf> = BTreeMap::new();

        let lock = root.join("packages.lock.json");
        if let Some(data) = read_json(&lock) {
            if let Some(entries) = data.get("dependencies").and_then(|v| v.as_object()) {
                for (name, info) in entries {
                    let version = info
                        .get("resolved")
                        .or_else(|| info.get("version"))
                        .and_then(|v| v.as_str())
                        .unwrap_or("0.0.0");
                    dependencies.entry(name.clone()).or_insert_with(|| version.to_string());
                    origins.entry(name.clone()).or_insert_with(|| lock.clone());
                }
            }
        }

        for path in detect_files(root, &["*.csproj", "*.fsproj"]) {
            let Ok(text) = std::fs::read_to_string(&path) else { continue };
            for element in find_elements(&text, "PackageReference") {
                let Some(name) = xml_attr(&element, "Include") else { continue };
                let version = xml_attr(&element, "Version")
                    .map(str::to_string)
                    .or_else(|| xml_tag_text(&element, "Version").map(str::to_string));
                let Some(version) = version else { continue };
                if name.is_empty() || version.is_empty() {
                    continue;
                }
                dependencies.entry(name.to_string()).or_insert(version);
                origins.entry(name.to_string()).or_insert_with(|| path.clone());
            }
        }

        dependencies
            .into_iter()
            .map(|(name, version)| {
                let manifest = origins.get(&name).cloned().unwrap_or_else(|| root.to_path_buf());
                self.dependency(name, version, &manifest, true)
            })
            .collect()
    }
}

/// Finds `<Tag ... />` or `<Tag ...>...</Tag>` elements (self-closing or
/// not), returning each element's full text for attribute/child extraction.
fn find_elements(text: &str, tag: &str) -> Vec<String> {
    let mut out = Vec::new();
    let open = format!("<{tag}");
    let mut search_from = 0;
    while let Some(rel_start) = text[search_from..].find(&open) {
        let start = search_from + rel_start;
        let Some(rel_end) = text[start..].find('>') else { break };
        let end = start + rel_end + 1;
        out.push(text[start..end].to_string());
        search_from = end;
    }
    out
}
