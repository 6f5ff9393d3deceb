//! File naming and content selection for saved artifacts.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::protocol::{Artifact, Part};

/// The bytes-to-be of an artifact file.
#[derive(Debug, Clone, PartialEq)]
pub enum Content<'a> {
    Text(&'a str),
    Data(&'a Value),
    Empty,
}

impl Content<'_> {
    /// The part that becomes the file body. When several parts are present
    /// the last one wins.
    pub fn of(artifact: &Artifact) -> Content<'_> {
        match artifact.parts.last() {
            Some(Part::Text { text }) => Content::Text(text),
            Some(Part::Data { data }) => Content::Data(data),
            None => Content::Empty,
        }
    }

    fn extension(&self) -> &'static str {
        match self {
            Content::Data(_) => "json",
            Content::Text(_) | Content::Empty => "txt",
        }
    }
}

/// Name derived from the artifact itself, reduced to a bare file name.
///
/// Returns `None` for empty names and for names with no final component
/// (`..`, `/`), so a remote agent cannot steer writes outside the
/// destination directory.
pub fn artifact_file_name(artifact: &Artifact) -> Option<String> {
    let name = artifact.name.trim();
    if name.is_empty() {
        return None;
    }
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .map(str::to_owned)
}

/// Deterministic fallback name: `artifact_<unix-seconds>_<index>.<ext>`.
pub fn synthesized_name(artifact: &Artifact, index: usize, unix_secs: i64) -> String {
    let ext = Content::of(artifact).extension();
    format!("artifact_{unix_secs}_{index}.{ext}")
}

/// The name an occurrence would get before any collision suffix.
///
/// An explicit name wins, then the artifact's own name, then a synthesized
/// one.
pub fn base_name(
    artifact: &Artifact,
    explicit: Option<&str>,
    index: usize,
    unix_secs: i64,
) -> String {
    explicit
        .map(str::to_owned)
        .or_else(|| artifact_file_name(artifact))
        .unwrap_or_else(|| synthesized_name(artifact, index, unix_secs))
}

/// Insert `_<n>` before the extension of the final path component.
///
/// `out.json` -> `out_1.json`, `reports/out.json` -> `reports/out_1.json`,
/// `Makefile` -> `Makefile_1`.
pub fn with_suffix(name: &str, n: usize) -> PathBuf {
    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file = match path.extension() {
        Some(ext) => format!("{stem}_{n}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{n}"),
    };
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(file),
        _ => PathBuf::from(file),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn artifact(name: &str, parts: Vec<Part>) -> Artifact {
        Artifact::new(name, parts)
    }

    #[test]
    fn last_part_wins() {
        let a = artifact("x", vec![Part::text("first"), Part::data(json!({"a": 1}))]);
        assert_eq!(Content::of(&a), Content::Data(&json!({"a": 1})));

        let b = artifact("x", vec![Part::data(json!(1)), Part::text("second")]);
        assert_eq!(Content::of(&b), Content::Text("second"));

        assert_eq!(Content::of(&artifact("x", vec![])), Content::Empty);
    }

    #[test]
    fn suffix_goes_before_extension() {
        assert_eq!(with_suffix("out.json", 1), PathBuf::from("out_1.json"));
        assert_eq!(with_suffix("archive.tar.gz", 2), PathBuf::from("archive.tar_2.gz"));
        assert_eq!(with_suffix("Makefile", 3), PathBuf::from("Makefile_3"));
        assert_eq!(
            with_suffix("reports/out.json", 1),
            PathBuf::from("reports").join("out_1.json")
        );
    }

    #[test]
    fn artifact_names_are_confined_to_a_file_name() {
        assert_eq!(
            artifact_file_name(&artifact("../../etc/passwd", vec![])).as_deref(),
            Some("passwd")
        );
        assert_eq!(artifact_file_name(&artifact("..", vec![])), None);
        assert_eq!(artifact_file_name(&artifact("   ", vec![])), None);
    }

    #[test]
    fn base_name_precedence() {
        let named = artifact("report.txt", vec![Part::text("x")]);
        let unnamed = artifact("", vec![Part::data(json!({}))]);

        assert_eq!(base_name(&named, Some("out.md"), 0, 10), "out.md");
        assert_eq!(base_name(&named, None, 0, 10), "report.txt");
        assert_eq!(base_name(&unnamed, None, 4, 1700000000), "artifact_1700000000_4.json");
    }
}
