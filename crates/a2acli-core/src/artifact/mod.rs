//! Artifact materialization: writing agent artifacts to local files.
//!
//! - [`write_artifact`] writes a single occurrence given its index within
//!   the session.
//! - [`ArtifactSink`] owns the per-session bookkeeping so repeated names
//!   never overwrite each other.
//!
//! Writes go to a temporary file in the destination directory which is then
//! renamed over the target, so an interrupted write never leaves a half
//! written file in place of an earlier good one.

pub mod naming;

use std::collections::{HashMap, HashSet};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::protocol::Artifact;

use naming::Content;

/// Where artifacts of a session should be written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactDestination {
    /// Directory to write into. Relative to the working directory when unset.
    pub dir: Option<PathBuf>,
    /// Explicit file name overriding the artifact's own name.
    pub file_name: Option<String>,
}

impl ArtifactDestination {
    pub fn new(dir: Option<PathBuf>, file_name: Option<String>) -> Self {
        Self {
            dir: dir.filter(|d| !d.as_os_str().is_empty()),
            file_name: file_name.filter(|f| !f.trim().is_empty()),
        }
    }

    /// Artifacts are only saved when a directory or a file name was given.
    pub fn is_configured(&self) -> bool {
        self.dir.is_some() || self.file_name.is_some()
    }

    fn join(&self, name: &Path) -> PathBuf {
        match &self.dir {
            Some(dir) => dir.join(name),
            None => name.to_path_buf(),
        }
    }
}

/// Outcome of one successful artifact write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactWriteRecord {
    pub name: String,
    pub path: PathBuf,
    pub bytes: usize,
}

/// Errors from writing an artifact. Never fatal to a session.
#[derive(Debug, thiserror::Error)]
pub enum MaterializeError {
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to encode artifact {name:?}: {source}")]
    Encode {
        name: String,
        source: serde_json::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Write one artifact occurrence.
///
/// `index` is the occurrence's position within the session. With an
/// explicit `file_name`, every earlier occurrence shares that name, so the
/// write lands on `<stem>_<index>.<ext>` once `index > 0`. Otherwise the
/// artifact's own name is used, or a synthesized
/// `artifact_<timestamp>_<index>` name when it has none.
pub fn write_artifact(
    artifact: &Artifact,
    index: usize,
    dir: Option<&Path>,
    file_name: Option<&str>,
) -> Result<ArtifactWriteRecord, MaterializeError> {
    let mut sink = ArtifactSink::new(ArtifactDestination::new(
        dir.map(Path::to_path_buf),
        file_name.map(str::to_owned),
    ));
    sink.skip(index);
    sink.write(artifact)
}

/// Per-session artifact writer guaranteeing distinct output paths.
#[derive(Debug)]
pub struct ArtifactSink {
    destination: ArtifactDestination,
    /// Occurrences handed to this sink so far.
    occurrences: usize,
    /// Next suffix to try for each base name.
    next_suffix: HashMap<String, usize>,
    produced: HashSet<PathBuf>,
}

impl ArtifactSink {
    pub fn new(destination: ArtifactDestination) -> Self {
        Self {
            destination,
            occurrences: 0,
            next_suffix: HashMap::new(),
            produced: HashSet::new(),
        }
    }

    /// Account for `count` occurrences of this session written elsewhere.
    fn skip(&mut self, count: usize) {
        self.occurrences += count;
        if let Some(name) = &self.destination.file_name {
            let next = self.next_suffix.entry(name.clone()).or_insert(0);
            *next += count;
        }
    }

    pub fn is_configured(&self) -> bool {
        self.destination.is_configured()
    }

    /// Save the next artifact occurrence of this session.
    ///
    /// The n-th repeat of a base name is written as `<stem>_<n>.<ext>`,
    /// skipping any path this sink already produced.
    pub fn write(&mut self, artifact: &Artifact) -> Result<ArtifactWriteRecord, MaterializeError> {
        let index = self.occurrences;
        self.occurrences += 1;

        let now = chrono::Utc::now().timestamp();
        let base = naming::base_name(artifact, self.destination.file_name.as_deref(), index, now);

        let mut n = self.next_suffix.get(&base).copied().unwrap_or(0);
        let path = loop {
            let relative = if n == 0 {
                PathBuf::from(&base)
            } else {
                naming::with_suffix(&base, n)
            };
            let candidate = self.destination.join(&relative);
            if !self.produced.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };
        self.next_suffix.insert(base, n + 1);

        let record = persist(artifact, &path)?;
        self.produced.insert(path);
        tracing::debug!(
            artifact = %record.name,
            path = %record.path.display(),
            bytes = record.bytes,
            "artifact saved"
        );
        Ok(record)
    }
}

fn encode(artifact: &Artifact) -> Result<Vec<u8>, MaterializeError> {
    match Content::of(artifact) {
        Content::Text(text) => Ok(text.as_bytes().to_vec()),
        Content::Data(data) => {
            serde_json::to_vec_pretty(data).map_err(|source| MaterializeError::Encode {
                name: artifact.name.clone(),
                source,
            })
        }
        Content::Empty => Ok(Vec::new()),
    }
}

/// Replace the file at `path` with the artifact's content.
fn persist(artifact: &Artifact, path: &Path) -> Result<ArtifactWriteRecord, MaterializeError> {
    let bytes = encode(artifact)?;

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(|source| MaterializeError::CreateDir {
        path: parent.clone(),
        source,
    })?;

    let write_err = |source: io::Error| MaterializeError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = NamedTempFile::new_in(&parent).map_err(write_err)?;
    tmp.write_all(&bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;

    // Temp files are created owner-only; artifacts are ordinary output files.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o644);
        tmp.as_file().set_permissions(perms).map_err(write_err)?;
    }

    tmp.persist(path).map_err(|e| write_err(e.error))?;

    Ok(ArtifactWriteRecord {
        name: artifact.name.clone(),
        path: path.to_path_buf(),
        bytes: bytes.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Part;
    use serde_json::json;

    fn text_artifact(name: &str, text: &str) -> Artifact {
        Artifact::new(name, vec![Part::text(text)])
    }

    #[test]
    fn writes_text_verbatim_and_creates_dirs() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("out");

        let record = write_artifact(&text_artifact("report.txt", "hello"), 0, Some(&dir), None)
            .expect("write should succeed");

        assert_eq!(record.path, dir.join("report.txt"));
        assert_eq!(record.bytes, 5);
        assert_eq!(std::fs::read_to_string(&record.path).unwrap(), "hello");
    }

    #[test]
    fn data_part_roundtrips_through_pretty_json() {
        let tmp = tempfile::TempDir::new().unwrap();
        let payload = json!({"rows": [1, 2, 3], "meta": {"ok": true, "label": "x"}});
        let artifact = Artifact::new("data.json", vec![Part::data(payload.clone())]);

        let record = write_artifact(&artifact, 0, Some(tmp.path()), None).unwrap();
        let written = std::fs::read_to_string(&record.path).unwrap();

        assert!(written.contains('\n'), "expected indented output: {written}");
        let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, payload);
    }

    #[test]
    fn explicit_name_gets_index_suffix_after_first() {
        let tmp = tempfile::TempDir::new().unwrap();
        let a = text_artifact("ignored.txt", "one");

        let first = write_artifact(&a, 0, Some(tmp.path()), Some("out.json")).unwrap();
        let second = write_artifact(&a, 1, Some(tmp.path()), Some("out.json")).unwrap();

        assert_eq!(first.path, tmp.path().join("out.json"));
        assert_eq!(second.path, tmp.path().join("out_1.json"));
    }

    #[test]
    fn indexed_write_matches_the_sink() {
        let tmp = tempfile::TempDir::new().unwrap();
        let a = text_artifact("ignored.txt", "x");

        let mut sink = ArtifactSink::new(ArtifactDestination::new(
            Some(tmp.path().join("sink")),
            Some("out.json".into()),
        ));
        for index in 0..3 {
            let from_sink = sink.write(&a).unwrap().path;
            let direct =
                write_artifact(&a, index, Some(&tmp.path().join("sink")), Some("out.json"))
                    .unwrap()
                    .path;
            assert_eq!(from_sink, direct);
        }

        let named = text_artifact("report.txt", "y");
        let again = write_artifact(&named, 5, Some(tmp.path()), None).unwrap();
        assert_eq!(again.path, tmp.path().join("report.txt"));
    }

    #[test]
    fn sink_keeps_repeated_names_distinct() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut sink = ArtifactSink::new(ArtifactDestination::new(
            Some(tmp.path().to_path_buf()),
            None,
        ));

        let paths: Vec<PathBuf> = ["a.txt", "a.txt", "b.txt", "a.txt", "a_1.txt"]
            .iter()
            .enumerate()
            .map(|(i, name)| {
                sink.write(&text_artifact(name, &i.to_string()))
                    .unwrap()
                    .path
            })
            .collect();

        let unique: HashSet<&PathBuf> = paths.iter().collect();
        assert_eq!(unique.len(), paths.len(), "paths collided: {paths:?}");
        assert_eq!(paths[1], tmp.path().join("a_1.txt"));
        assert_eq!(paths[3], tmp.path().join("a_2.txt"));
        // "a_1.txt" was already produced as a suffixed repeat.
        assert_eq!(paths[4], tmp.path().join("a_1_1.txt"));
        assert_eq!(std::fs::read_to_string(&paths[1]).unwrap(), "1");
    }

    #[test]
    fn sink_synthesizes_names_for_unnamed_artifacts() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut sink = ArtifactSink::new(ArtifactDestination::new(
            Some(tmp.path().to_path_buf()),
            None,
        ));

        let first = sink.write(&text_artifact("", "x")).unwrap();
        let second = sink.write(&text_artifact("", "y")).unwrap();

        let name = first.path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("artifact_"), "unexpected name: {name}");
        assert!(name.ends_with("_0.txt"), "unexpected name: {name}");
        assert_ne!(first.path, second.path);
    }

    #[test]
    fn overwrite_replaces_whole_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("r.txt");
        std::fs::write(&path, "a much longer previous content").unwrap();

        write_artifact(&text_artifact("r.txt", "short"), 0, Some(tmp.path()), None).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "short");
    }

    #[cfg(unix)]
    #[test]
    fn unwritable_directory_reports_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "i am a file").unwrap();

        let err = write_artifact(&text_artifact("x.txt", "x"), 0, Some(&blocker), None)
            .expect_err("writing under a regular file must fail");
        assert!(matches!(err, MaterializeError::CreateDir { .. }), "got {err:?}");
    }

    #[test]
    fn destination_is_configured_only_when_set() {
        assert!(!ArtifactDestination::new(None, None).is_configured());
        assert!(!ArtifactDestination::new(Some(PathBuf::new()), Some(" ".into())).is_configured());
        assert!(ArtifactDestination::new(None, Some("out.json".into())).is_configured());
    }
}
