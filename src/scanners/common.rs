//! Shared manifest-parsing helpers used by every ecosystem scanner.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use globset::Glob;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref INLINE_COMMENT: Regex = Regex::new(r"\s+#.*$").unwrap();
}

/// True if any pattern (plain filename or single-directory glob like
/// `*.csproj`) has a match directly under `root`.
pub fn has_matching_file(root: &Path, patterns: &[&str]) -> bool {
    !detect_files(root, patterns).is_empty()
}

/// Non-recursive glob: only matches files directly under `root`, mirroring
/// a single-directory listing rather than a full filesystem walk.
pub fn detect_files(root: &Path, patterns: &[&str]) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for pattern in patterns {
        if pattern.contains(['*', '?', '[']) {
            let Ok(glob) = Glob::new(pattern) else { continue };
            let matcher = glob.compile_matcher();
            let Ok(entries) = std::fs::read_dir(root) else { continue };
            for entry in entries.flatten() {
                let path = entry.path();
                if let Some(file_name) = path.file_name() {
                    if matcher.is_match(file_name) && !found.contains(&path) {
                        found.push(path);
                    }
                }
            }
        } else {
            let candidate = root.join(pattern);
            if candidate.exists() && !found.contains(&candidate) {
                found.push(candidate);
            }
        }
    }
    found.sort();
    found
}

pub fn read_json(path: &Path) -> Option<serde_json::Value> {
    let text = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&text).ok()
}

pub fn read_toml(path: &Path) -> Option<toml::Value> {
    let text = std::fs::read_to_string(path).ok()?;
    toml::from_str(&text).ok()
}

pub fn read_yaml(path: &Path) -> Option<serde_yaml::Value> {
    let text = std::fs::read_to_string(path).ok()?;
    serde_yaml::from_str(&text).ok()
}

/// Best-effort version cleanup: trims whitespace and a leading `v`/`=`.
/// Unlike a real semver parser this never rejects malformed input, it just
/// passes it through — registries report version strings in far too many
/// shapes to validate strictly here.
pub fn normalize_version(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "0.0.0".to_string();
    }
    trimmed.trim_start_matches(['v', '=']).trim().to_string()
}

fn strip_inline_comment(line: &str) -> String {
    INLINE_COMMENT.replace(line, "").trim().to_string()
}

/// Parse one `name==version` / `name>=version` / bare-`name` requirement
/// line, skipping comments, blanks, and `-r`/`-e` directives.
pub fn parse_requirement_line(line: &str) -> Option<(String, String)> {
    let cleaned = strip_inline_comment(line);
    if cleaned.is_empty() || cleaned.starts_with('#') || cleaned.starts_with('-') {
        return None;
    }
    if let Some((name, version)) = cleaned.split_once("==") {
        return Some((name.trim().to_string(), version.trim().to_string()));
    }
    for op in ["~=", ">=", "<=", ">", "<", "!="] {
        if let Some((name, version)) = cleaned.split_once(op) {
            return Some((name.trim().to_string(), format!("{op}{}", version.trim())));
        }
    }
    let name: String = cleaned
        .chars()
        .take_while(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();
    if name.is_empty() {
        return None;
    }
    Some((name, "*".to_string()))
}

pub fn parse_requirements_text(text: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for line in text.lines() {
        if let Some((name, version)) = parse_requirement_line(line) {
            out.entry(name).or_insert(version);
        }
    }
    out
}

/// Extract the first occurrence of `<tag>value</tag>` within a block of XML
/// text. Not a general XML parser: `pom.xml`/`.csproj` inputs are small,
/// flat dependency declarations, so a tag-scoped regex is sufficient.
pub fn xml_tag_text<'a>(block: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = block.find(&open)? + open.len();
    let end = block[start..].find(&close)? + start;
    Some(block[start..end].trim())
}

pub fn xml_attr<'a>(element: &'a str, attr: &str) -> Option<&'a str> {
    let needle = format!("{attr}=\"");
    let start = element.find(&needle)? + needle.len();
    let end = element[start..].find('"')? + start;
    Some(&element[start..end])
}
