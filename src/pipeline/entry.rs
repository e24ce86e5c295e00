use std::path::Path;

use regex::Regex;

/// Identifier fields of the encyclopedic entry being narrated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub number: String,
    pub name: String,
    pub class: String,
}

impl EntryInfo {
    const UNKNOWN_NUMBER: &'static str = "SCP-?";
    const UNKNOWN: &'static str = "Unknown";

    /// Parses a script file stem such as `SCP-173-The-Sculpture-Class-Euclid`.
    /// Partially matching stems fill what they can; the rest stays unknown.
    pub fn from_file_stem(stem: &str) -> Self {
        if let Some(info) = parse_full_stem(stem) {
            return info;
        }
        Self {
            number: capture(r"(?i)(SCP-\d+)", stem)
                .map(|n| n.to_uppercase())
                .unwrap_or_else(|| Self::UNKNOWN_NUMBER.to_string()),
            name: Self::UNKNOWN.to_string(),
            class: capture(r"(?i)Class-(\w+)", stem)
                .map(|c| capitalize(&c))
                .unwrap_or_else(|| Self::UNKNOWN.to_string()),
        }
    }

    pub fn from_path(path: &Path) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_file_stem(&stem)
    }

    /// Second intro line as displayed under the number.
    pub fn name_line(&self) -> String {
        format!("- {}", self.name)
    }

    /// Directory name used for this entry's artifacts.
    pub fn artifact_id(&self) -> &str {
        &self.number
    }
}

fn parse_full_stem(stem: &str) -> Option<EntryInfo> {
    let re = Regex::new(r"(?i)(SCP-\d+)-(.+)-Class-([\w-]+)").ok()?;
    let caps = re.captures(stem)?;
    Some(EntryInfo {
        number: caps.get(1)?.as_str().to_uppercase(),
        name: caps.get(2)?.as_str().replace('-', " "),
        class: capitalize(caps.get(3)?.as_str()),
    })
}

fn capture(pattern: &str, haystack: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    Some(re.captures(haystack)?.get(1)?.as_str().to_string())
}

/// First character upper-cased, the rest lower-cased.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
