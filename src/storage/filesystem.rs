//! Filesystem-based idea store.
//!
//! Stores each idea as `<id>.md` under a base directory. Writes go to a
//! temporary file in the same directory which is then renamed over the
//! target, so readers never observe a half-written idea.
//!
//! # Security
//!
//! - **Path traversal**: identifiers are validated before they touch the path
//! - **File size limits**: files over [`MAX_FILE_SIZE`] are rejected

use super::frontmatter::{FrontMatter, IdeaFrontMatter};
use super::traits::IdeaStore;
use crate::models::{Idea, IdeaSummary};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Maximum size of an idea file (1MB).
pub const MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Extension of idea files.
const EXTENSION: &str = "md";

/// Heading of the derived back-reference section.
const RELATED_HEADING: &str = "## Related Ideas";

/// Filesystem-based idea store.
#[derive(Debug, Clone)]
pub struct FilesystemIdeaStore {
    /// Base directory for storage.
    base_path: PathBuf,
}

impl FilesystemIdeaStore {
    /// Creates a new store rooted at `base_path`.
    ///
    /// The directory is created lazily on first write.
    #[must_use]
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Returns the base path.
    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Returns the path for an idea file.
    fn idea_path(&self, id: &str) -> Result<PathBuf> {
        if !Self::is_safe_filename(id) {
            return Err(Error::InvalidInput(format!(
                "Idea ID contains invalid characters: {id}"
            )));
        }
        Ok(self.base_path.join(format!("{id}.{EXTENSION}")))
    }

    /// Checks if a filename is safe (no path traversal).
    fn is_safe_filename(name: &str) -> bool {
        !name.is_empty()
            && name.len() <= 255
            && name
                .chars()
                .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    }

    /// Reads an idea file, enforcing the size limit.
    fn read_file(path: &Path) -> Result<String> {
        let metadata = fs::metadata(path).map_err(|e| Error::OperationFailed {
            operation: "read_file_metadata".to_string(),
            cause: e.to_string(),
        })?;

        if metadata.len() > MAX_FILE_SIZE {
            return Err(Error::InvalidInput(format!(
                "Idea file exceeds maximum size of {MAX_FILE_SIZE} bytes: {}",
                path.display()
            )));
        }

        fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_idea_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })
    }

    /// Returns the file's modification time, used when `created` is missing.
    fn modified_time(path: &Path) -> DateTime<Utc> {
        fs::metadata(path)
            .and_then(|m| m.modified())
            .map_or_else(|_| Utc::now(), DateTime::<Utc>::from)
    }

    /// Decodes an idea file. Returns `None` if it has no frontmatter.
    fn decode_file(path: &Path, stem: &str) -> Result<Option<Idea>> {
        let text = Self::read_file(path)?;
        let Some((fields, body)) = FrontMatter::decode(&text) else {
            return Ok(None);
        };
        let header = IdeaFrontMatter::from_fields(fields);
        Ok(Some(header.into_idea(stem, Self::modified_time(path), body)))
    }

    /// Decodes every idea file, skipping the ones that fail.
    fn scan(&self) -> Result<Vec<Idea>> {
        if !self.base_path.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.base_path).map_err(|e| Error::OperationFailed {
            operation: "read_storage_dir".to_string(),
            cause: e.to_string(),
        })?;

        let mut ideas = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(stem) = extract_idea_stem(&path) else {
                continue;
            };
            match Self::decode_file(&path, stem) {
                Ok(Some(idea)) => ideas.push(idea),
                Ok(None) => {
                    tracing::warn!(path = %path.display(), "Skipping idea file without frontmatter");
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable idea file");
                },
            }
        }

        ideas.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| a.id.cmp(&b.id)));
        Ok(ideas)
    }

    /// Writes `contents` to `path` via a temporary file and rename.
    fn write_atomic(&self, path: &Path, contents: &str) -> Result<()> {
        fs::create_dir_all(&self.base_path).map_err(|e| Error::OperationFailed {
            operation: "create_storage_dir".to_string(),
            cause: e.to_string(),
        })?;

        let mut tmp =
            tempfile::NamedTempFile::new_in(&self.base_path).map_err(|e| Error::OperationFailed {
                operation: "create_temp_file".to_string(),
                cause: e.to_string(),
            })?;

        tmp.write_all(contents.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| Error::OperationFailed {
                operation: "write_idea_file".to_string(),
                cause: e.to_string(),
            })?;

        tmp.persist(path).map_err(|e| Error::OperationFailed {
            operation: "persist_idea_file".to_string(),
            cause: e.error.to_string(),
        })?;

        Ok(())
    }
}

impl IdeaStore for FilesystemIdeaStore {
    fn list_all(&self) -> Result<Vec<IdeaSummary>> {
        Ok(self.scan()?.iter().map(Idea::summary).collect())
    }

    fn load_one(&self, id: &str) -> Result<Idea> {
        let path = self.idea_path(id).map_err(|_| not_found(id))?;
        if !path.exists() {
            return Err(not_found(id));
        }

        Self::decode_file(&path, id)?.ok_or_else(|| Error::OperationFailed {
            operation: "decode_idea_file".to_string(),
            cause: format!("{} has no frontmatter", path.display()),
        })
    }

    fn load_raw(&self, id: &str) -> Result<String> {
        let path = self.idea_path(id).map_err(|_| not_found(id))?;
        if !path.exists() {
            return Err(not_found(id));
        }
        Self::read_file(&path)
    }

    fn save(&self, idea: &Idea) -> Result<String> {
        validate_for_save(idea)?;
        let path = self.idea_path(idea.id.as_str())?;

        let body = with_related_section(&idea.content, &idea.connections);
        let header = IdeaFrontMatter::from_idea(idea);
        let text = FrontMatter::encode(&header.to_fields(), &body);

        self.write_atomic(&path, &text)?;
        tracing::debug!(id = %idea.id, path = %path.display(), "Saved idea");

        Ok(idea.id.as_str().to_string())
    }

    fn load_all_full(&self) -> Result<Vec<Idea>> {
        self.scan()
    }

    fn exists(&self, id: &str) -> bool {
        self.idea_path(id).is_ok_and(|path| path.exists())
    }
}

fn not_found(id: &str) -> Error {
    Error::NotFound(format!("idea '{id}'"))
}

/// Checks the fields an idea must have before it may be written.
fn validate_for_save(idea: &Idea) -> Result<()> {
    if idea.id.is_blank() {
        return Err(Error::InvalidInput("Idea id cannot be empty".to_string()));
    }
    if idea.title.trim().is_empty() {
        return Err(Error::InvalidInput("Idea title cannot be empty".to_string()));
    }
    if idea.content.trim().is_empty() {
        return Err(Error::InvalidInput("Idea content cannot be empty".to_string()));
    }
    Ok(())
}

/// Appends the back-reference section unless there is nothing to list or the
/// body already has one.
fn with_related_section(body: &str, connections: &[String]) -> String {
    if connections.is_empty() || body.contains(RELATED_HEADING) {
        return body.to_string();
    }

    let mut out = body.trim_end().to_string();
    out.push_str("\n\n");
    out.push_str(RELATED_HEADING);
    out.push_str("\n\n");
    for connection in connections {
        out.push_str("- [[");
        out.push_str(connection);
        out.push_str("]]\n");
    }
    out
}

/// Extracts the idea id from a markdown file path.
fn extract_idea_stem(path: &Path) -> Option<&str> {
    if path.extension().is_none_or(|ext| ext != EXTENSION) {
        return None;
    }
    path.file_stem()?.to_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IdeaId;
    use tempfile::TempDir;

    fn create_test_idea(id: &str, created: &str) -> Idea {
        Idea {
            id: IdeaId::new(id),
            title: format!("Title {id}"),
            content: "Test content".to_string(),
            tags: vec!["test".to_string()],
            connections: Vec::new(),
            created: DateTime::parse_from_rfc3339(created)
                .unwrap()
                .with_timezone(&Utc),
            modified: None,
            original: "raw text".to_string(),
            source: "test".to_string(),
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemIdeaStore::new(dir.path());

        let idea = create_test_idea("id1", "2024-01-01T00:00:00Z");
        let key = store.save(&idea).unwrap();
        assert_eq!(key, "id1");

        let loaded = store.load_one("id1").unwrap();
        assert_eq!(loaded, idea);
    }

    #[test]
    fn test_save_creates_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested").join("ideas");
        let store = FilesystemIdeaStore::new(&nested);

        store.save(&create_test_idea("id1", "2024-01-01T00:00:00Z")).unwrap();
        assert!(nested.join("id1.md").exists());
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemIdeaStore::new(dir.path());

        assert!(matches!(store.load_one("missing"), Err(Error::NotFound(_))));
        assert!(matches!(store.load_raw("missing"), Err(Error::NotFound(_))));
        assert!(matches!(store.load_one("../etc/passwd"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_save_rejects_blank_fields_before_writing() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemIdeaStore::new(dir.path().join("ideas"));

        let mut idea = create_test_idea("id1", "2024-01-01T00:00:00Z");
        idea.title = "  ".to_string();
        assert!(matches!(store.save(&idea), Err(Error::InvalidInput(_))));

        let mut idea = create_test_idea("id2", "2024-01-01T00:00:00Z");
        idea.content = String::new();
        assert!(matches!(store.save(&idea), Err(Error::InvalidInput(_))));

        let idea = create_test_idea("", "2024-01-01T00:00:00Z");
        assert!(matches!(store.save(&idea), Err(Error::InvalidInput(_))));

        assert!(!dir.path().join("ideas").exists());
    }

    #[test]
    fn test_related_section_appended_once() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemIdeaStore::new(dir.path());

        let mut idea = create_test_idea("id1", "2024-01-01T00:00:00Z");
        idea.connections = vec!["Seed Library".to_string(), "Compost".to_string()];
        store.save(&idea).unwrap();

        let raw = store.load_raw("id1").unwrap();
        assert!(raw.contains("## Related Ideas\n\n- [[Seed Library]]\n- [[Compost]]\n"));

        let reloaded = store.load_one("id1").unwrap();
        store.save(&reloaded).unwrap();
        let raw = store.load_raw("id1").unwrap();
        assert_eq!(raw.matches(RELATED_HEADING).count(), 1);
    }

    #[test]
    fn test_no_related_section_without_connections() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemIdeaStore::new(dir.path());
        store.save(&create_test_idea("id1", "2024-01-01T00:00:00Z")).unwrap();
        assert!(!store.load_raw("id1").unwrap().contains(RELATED_HEADING));
    }

    #[test]
    fn test_list_skips_undecodable_files() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemIdeaStore::new(dir.path());

        store.save(&create_test_idea("good1", "2024-01-01T00:00:00Z")).unwrap();
        store.save(&create_test_idea("good2", "2024-02-01T00:00:00Z")).unwrap();
        fs::write(dir.path().join("bad1.md"), "no header here").unwrap();
        fs::write(dir.path().join("bad2.md"), "---\ntitle: \"never closed\"\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let ideas = store.list_all().unwrap();
        let ids: Vec<_> = ideas.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["good2", "good1"]);

        assert_eq!(store.load_all_full().unwrap().len(), 2);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_list_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemIdeaStore::new(dir.path().join("absent"));
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_header_without_id_uses_file_stem() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemIdeaStore::new(dir.path());
        fs::write(
            dir.path().join("handwritten.md"),
            "---\ntitle: \"Handwritten\"\n---\n\nBody",
        )
        .unwrap();

        let idea = store.load_one("handwritten").unwrap();
        assert_eq!(idea.id.as_str(), "handwritten");
        assert_eq!(idea.title, "Handwritten");
        assert_eq!(idea.content, "Body");
    }

    #[test]
    fn test_oversized_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemIdeaStore::new(dir.path());
        let big = "x".repeat(usize::try_from(MAX_FILE_SIZE).unwrap() + 1);
        fs::write(dir.path().join("big.md"), format!("---\n---\n{big}")).unwrap();

        assert!(matches!(store.load_raw("big"), Err(Error::InvalidInput(_))));
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_rewrite_replaces_file() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemIdeaStore::new(dir.path());

        let mut idea = create_test_idea("id1", "2024-01-01T00:00:00Z");
        store.save(&idea).unwrap();
        idea.content = "Updated content".to_string();
        idea.modified = Some(Utc::now());
        store.save(&idea).unwrap();

        let loaded = store.load_one("id1").unwrap();
        assert_eq!(loaded.content, "Updated content");
        assert!(loaded.modified.is_some());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_exists() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemIdeaStore::new(dir.path());
        assert!(!store.exists("id1"));

        store.save(&create_test_idea("id1", "2024-05-01T10:00:00Z")).unwrap();
        assert!(store.exists("id1"));
        assert!(!store.exists("../id1"));
    }

    #[test]
    fn test_safe_filename_validation() {
        assert!(FilesystemIdeaStore::is_safe_filename("valid_id"));
        assert!(FilesystemIdeaStore::is_safe_filename(
            "5b0c2f6e-0d5e-4c43-9a55-1d6f0c9c1f11"
        ));
        assert!(!FilesystemIdeaStore::is_safe_filename(""));
        assert!(!FilesystemIdeaStore::is_safe_filename("../path"));
        assert!(!FilesystemIdeaStore::is_safe_filename("path/to/file"));
        assert!(!FilesystemIdeaStore::is_safe_filename("file.md"));
        assert!(!FilesystemIdeaStore::is_safe_filename("file with space"));
    }
}
