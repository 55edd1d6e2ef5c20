//! Document and iteration-history stores.
//!
//! The gate evaluator never touches the filesystem directly; it reads phase
//! artifacts and iteration history through the traits defined here.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use super::iteration::IterationAnalysis;
use crate::core::{ArtifactKind, Phase};

/// Directory under a project that holds Specgate's own state.
const STATE_DIR: &str = ".specgate";

/// Errors raised by a store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing a path failed.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A history file could not be encoded or decoded.
    #[error("Malformed history at {}: {source}", .path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The project id cannot be used as a namespace.
    #[error("Invalid project id '{0}'")]
    InvalidProject(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A phase's current artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum PhaseArtifact {
    /// A single document (spec, plan)
    Document(String),
    /// Relative paths of the files in a directory (tasks, implement)
    Directory(Vec<String>),
}

/// One recorded revision of a phase document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    /// When the revision was recorded
    pub timestamp: DateTime<Utc>,

    /// Characters in `content`
    pub content_length: usize,

    /// Overall quality score of this revision
    pub quality_score: u32,

    /// Full document text
    pub content: String,

    /// SHA-256 of `content`, hex encoded
    pub content_hash: String,

    /// One-line delta summary
    pub summary: String,

    /// Recommendations produced for this revision
    #[serde(default)]
    pub suggestions: Vec<String>,

    /// Comparison against the previous revision
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<IterationAnalysis>,

    /// Why `quality_score` is approximate, if an analyzer failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degraded: Option<String>,
}

impl IterationRecord {
    /// Create a record stamped with the current time.
    pub fn new(
        content: String,
        quality_score: u32,
        suggestions: Vec<String>,
        analysis: Option<IterationAnalysis>,
    ) -> Self {
        let summary = analysis
            .as_ref()
            .map_or_else(|| "Initial version".to_string(), |a| a.summary.clone());
        Self {
            timestamp: Utc::now(),
            content_length: content.chars().count(),
            quality_score,
            content_hash: content_hash(&content),
            content,
            summary,
            suggestions,
            analysis,
            degraded: None,
        }
    }

    /// Mark the score as approximate.
    pub fn with_degraded(mut self, reason: Option<String>) -> Self {
        self.degraded = reason;
        self
    }

    /// Whether the tracker judged this revision a real improvement.
    pub fn is_meaningful(&self) -> bool {
        self.analysis.as_ref().is_some_and(|a| a.meaningful)
    }
}

/// Hex-encoded SHA-256 digest of `content`.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Reject project ids that would escape the store's namespace.
pub fn validate_project(project: &str) -> StoreResult<()> {
    let trimmed = project.trim();
    if trimmed.is_empty()
        || trimmed.starts_with('.')
        || project.contains(['/', '\\'])
        || project.contains("..")
    {
        return Err(StoreError::InvalidProject(project.to_string()));
    }
    Ok(())
}

/// Source of phase artifacts.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read the current artifact of `phase`, or `None` if it does not exist.
    async fn read_document(&self, project: &str, phase: Phase) -> StoreResult<Option<PhaseArtifact>>;

    /// Replace the document of `phase`.
    ///
    /// For directory phases the text is written as `<phase>.md` inside the
    /// phase directory.
    async fn write_document(&self, project: &str, phase: Phase, content: &str) -> StoreResult<()>;
}

/// Append-only iteration history, one list per project and phase.
#[async_trait]
pub trait IterationStore: Send + Sync {
    /// All records for `phase`, oldest first. Empty if none were recorded.
    async fn read_history(&self, project: &str, phase: Phase) -> StoreResult<Vec<IterationRecord>>;

    /// Append one record.
    async fn append_history(
        &self,
        project: &str,
        phase: Phase,
        record: IterationRecord,
    ) -> StoreResult<()>;
}

/// A store providing both documents and history.
pub trait WorkflowStore: DocumentStore + IterationStore {}

impl<T: DocumentStore + IterationStore> WorkflowStore for T {}

fn directory_entry(phase: Phase) -> String {
    format!("{}.md", phase.as_str())
}

/// Filesystem store.
///
/// Layout under `root`:
///
/// ```text
/// <project>/spec.md
/// <project>/plan.md
/// <project>/tasks/...
/// <project>/implement/...
/// <project>/.specgate/iterations/<phase>.json
/// ```
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Create a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The workspace root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of one project.
    pub fn project_dir(&self, project: &str) -> StoreResult<PathBuf> {
        validate_project(project)?;
        Ok(self.root.join(project))
    }

    /// Path of a phase artifact.
    pub fn artifact_path(&self, project: &str, phase: Phase) -> StoreResult<PathBuf> {
        Ok(self.project_dir(project)?.join(phase.artifact_name()))
    }

    /// Path of a phase's history file.
    pub fn history_path(&self, project: &str, phase: Phase) -> StoreResult<PathBuf> {
        Ok(self
            .project_dir(project)?
            .join(STATE_DIR)
            .join("iterations")
            .join(format!("{}.json", phase.as_str())))
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io { path: path.to_path_buf(), source }
}

/// Relative paths of the visible files under `dir`, sorted.
fn list_directory(dir: &Path) -> StoreResult<Vec<String>> {
    let mut entries = Vec::new();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !e.file_name().to_string_lossy().starts_with('.'));

    for entry in walker {
        let entry = entry.map_err(|e| StoreError::Io {
            path: e.path().map_or_else(|| dir.to_path_buf(), Path::to_path_buf),
            source: e.into_io_error().unwrap_or_else(|| std::io::Error::other("filesystem loop")),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(dir) {
            entries.push(relative.to_string_lossy().replace('\\', "/"));
        }
    }

    Ok(entries)
}

#[async_trait]
impl DocumentStore for FsStore {
    async fn read_document(&self, project: &str, phase: Phase) -> StoreResult<Option<PhaseArtifact>> {
        let path = self.artifact_path(project, phase)?;

        match phase.artifact_kind() {
            ArtifactKind::File => match tokio::fs::read_to_string(&path).await {
                Ok(text) => Ok(Some(PhaseArtifact::Document(text))),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(io_error(&path)(e)),
            },
            ArtifactKind::Directory => {
                if !path.is_dir() {
                    return Ok(None);
                }
                let dir = path.clone();
                let entries = tokio::task::spawn_blocking(move || list_directory(&dir))
                    .await
                    .map_err(|e| StoreError::Io { path, source: std::io::Error::other(e) })??;
                Ok(Some(PhaseArtifact::Directory(entries)))
            }
        }
    }

    async fn write_document(&self, project: &str, phase: Phase, content: &str) -> StoreResult<()> {
        let artifact = self.artifact_path(project, phase)?;
        let path = match phase.artifact_kind() {
            ArtifactKind::File => artifact,
            ArtifactKind::Directory => artifact.join(directory_entry(phase)),
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_error(parent))?;
        }
        tokio::fs::write(&path, content).await.map_err(io_error(&path))?;

        tracing::debug!(project, phase = %phase, path = %path.display(), "Wrote document");
        Ok(())
    }
}

#[async_trait]
impl IterationStore for FsStore {
    async fn read_history(&self, project: &str, phase: Phase) -> StoreResult<Vec<IterationRecord>> {
        let path = self.history_path(project, phase)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&path)(e)),
        };

        serde_json::from_str(&content).map_err(|source| StoreError::Serialization { path, source })
    }

    async fn append_history(
        &self,
        project: &str,
        phase: Phase,
        record: IterationRecord,
    ) -> StoreResult<()> {
        // Read-modify-write without locking; concurrent appends for the same
        // project and phase can lose a record.
        let mut history = self.read_history(project, phase).await?;
        history.push(record);

        let path = self.history_path(project, phase)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_error(parent))?;
        }
        let json = serde_json::to_string_pretty(&history)
            .map_err(|source| StoreError::Serialization { path: path.clone(), source })?;
        tokio::fs::write(&path, json).await.map_err(io_error(&path))?;

        tracing::debug!(project, phase = %phase, records = history.len(), "Appended iteration record");
        Ok(())
    }
}

type Key = (String, Phase);

/// In-memory store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<Key, PhaseArtifact>>,
    history: RwLock<HashMap<Key, Vec<IterationRecord>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a phase artifact directly.
    pub fn insert_artifact(
        &self,
        project: &str,
        phase: Phase,
        artifact: PhaseArtifact,
    ) -> StoreResult<()> {
        validate_project(project)?;
        self.documents.write().insert((project.to_string(), phase), artifact);
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn read_document(&self, project: &str, phase: Phase) -> StoreResult<Option<PhaseArtifact>> {
        validate_project(project)?;
        Ok(self.documents.read().get(&(project.to_string(), phase)).cloned())
    }

    async fn write_document(&self, project: &str, phase: Phase, content: &str) -> StoreResult<()> {
        let artifact = match phase.artifact_kind() {
            ArtifactKind::File => PhaseArtifact::Document(content.to_string()),
            ArtifactKind::Directory => PhaseArtifact::Directory(vec![directory_entry(phase)]),
        };
        self.insert_artifact(project, phase, artifact)
    }
}

#[async_trait]
impl IterationStore for MemoryStore {
    async fn read_history(&self, project: &str, phase: Phase) -> StoreResult<Vec<IterationRecord>> {
        validate_project(project)?;
        Ok(self.history.read().get(&(project.to_string(), phase)).cloned().unwrap_or_default())
    }

    async fn append_history(
        &self,
        project: &str,
        phase: Phase,
        record: IterationRecord,
    ) -> StoreResult<()> {
        validate_project(project)?;
        self.history.write().entry((project.to_string(), phase)).or_default().push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_project() {
        assert!(validate_project("checkout-flow").is_ok());
        assert!(validate_project("team_a.v2").is_ok());
        for bad in ["", "  ", "../etc", "a/b", "a\\b", ".hidden", "x..y"] {
            assert!(
                matches!(validate_project(bad), Err(StoreError::InvalidProject(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_content_hash() {
        assert_eq!(
            content_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(content_hash("abc").len(), 64);
    }

    #[test]
    fn test_record_without_analysis() {
        let record = IterationRecord::new("# Spec".to_string(), 42, vec!["Add users".into()], None);
        assert_eq!(record.summary, "Initial version");
        assert_eq!(record.content_length, 6);
        assert!(!record.is_meaningful());
        assert!(record.degraded.is_none());
    }

    #[test]
    fn test_degraded_marker_is_optional_on_disk() {
        let record = IterationRecord::new("# Spec".to_string(), 30, Vec::new(), None)
            .with_degraded(Some("Clarity analysis failed".to_string()));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["degraded"], "Clarity analysis failed");

        let mut legacy = json;
        legacy.as_object_mut().unwrap().remove("degraded");
        let parsed: IterationRecord = serde_json::from_value(legacy).unwrap();
        assert!(parsed.degraded.is_none());
    }

    #[tokio::test]
    async fn test_fs_store_documents() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());

        assert!(store.read_document("demo", Phase::Spec).await.unwrap().is_none());
        assert!(store.read_document("demo", Phase::Tasks).await.unwrap().is_none());

        store.write_document("demo", Phase::Spec, "# Spec\n").await.unwrap();
        assert_eq!(
            store.read_document("demo", Phase::Spec).await.unwrap(),
            Some(PhaseArtifact::Document("# Spec\n".to_string()))
        );
        assert!(dir.path().join("demo/spec.md").is_file());

        std::fs::create_dir_all(dir.path().join("demo/tasks/backend")).unwrap();
        std::fs::write(dir.path().join("demo/tasks/backend/api.md"), "- [ ] api").unwrap();
        std::fs::write(dir.path().join("demo/tasks/.DS_Store"), "").unwrap();
        store.write_document("demo", Phase::Tasks, "- [ ] first").await.unwrap();

        assert_eq!(
            store.read_document("demo", Phase::Tasks).await.unwrap(),
            Some(PhaseArtifact::Directory(vec![
                "backend/api.md".to_string(),
                "tasks.md".to_string(),
            ]))
        );
    }

    #[tokio::test]
    async fn test_fs_store_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("demo/implement")).unwrap();
        let store = FsStore::new(dir.path());
        assert_eq!(
            store.read_document("demo", Phase::Implement).await.unwrap(),
            Some(PhaseArtifact::Directory(Vec::new()))
        );
    }

    #[tokio::test]
    async fn test_fs_store_history_appends() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());

        assert!(store.read_history("demo", Phase::Plan).await.unwrap().is_empty());

        for score in [40, 65] {
            let record = IterationRecord::new(format!("v{score}"), score, Vec::new(), None);
            store.append_history("demo", Phase::Plan, record).await.unwrap();
        }

        let history = store.read_history("demo", Phase::Plan).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].quality_score, 40);
        assert_eq!(history[1].content, "v65");
        assert!(dir.path().join("demo/.specgate/iterations/plan.json").is_file());
        assert!(store.read_history("demo", Phase::Spec).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fs_store_malformed_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let path = store.history_path("demo", Phase::Spec).unwrap();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();

        let err = store.read_history("demo", Phase::Spec).await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization { .. }));
    }

    #[tokio::test]
    async fn test_fs_store_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let err = store.read_document("../outside", Phase::Spec).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidProject(_)));
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryStore::new();
        store.write_document("demo", Phase::Plan, "# Plan").await.unwrap();
        store.write_document("demo", Phase::Implement, "notes").await.unwrap();

        assert_eq!(
            store.read_document("demo", Phase::Plan).await.unwrap(),
            Some(PhaseArtifact::Document("# Plan".to_string()))
        );
        assert_eq!(
            store.read_document("demo", Phase::Implement).await.unwrap(),
            Some(PhaseArtifact::Directory(vec!["implement.md".to_string()]))
        );

        let record = IterationRecord::new("# Plan".to_string(), 10, Vec::new(), None);
        store.append_history("demo", Phase::Plan, record).await.unwrap();
        assert_eq!(store.read_history("demo", Phase::Plan).await.unwrap().len(), 1);
        assert!(store.read_history("other", Phase::Plan).await.unwrap().is_empty());
    }
}
