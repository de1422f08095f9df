//! Project storage.
//!
//! [`ProjectStore`] is the persisted-state interface the editor and the
//! runtime load documents through. Two implementations ship here:
//!
//! - [`MemoryStore`], an in-process map (also what a decoded bundle becomes)
//! - [`FsProjectStore`], one JSON file per document under a root directory:
//!
//! ```text
//! <root>/<project>/project.json
//! <root>/<project>/pages/<page>.json
//! ```
//!
//! Ids are escaped into file names one-to-one, and a loaded document must
//! carry the ids it was requested by.
//!
//! Missing documents load as `Ok(None)`; only real I/O or codec failures are
//! errors.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::codec::JsonDocument;
use crate::error::{FolioError, FolioResult};
use crate::ids::{PageId, ProjectId};
use crate::page::Page;
use crate::project::Project;

/// Name of the project document inside a project directory.
const PROJECT_FILE: &str = "project.json";

/// Directory holding page documents inside a project directory.
const PAGES_DIR: &str = "pages";

/// Persisted-state interface for projects and pages.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Ids of every stored project.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FolioError::StoreIo`] if the store is unreachable.
    async fn list_project_ids(&self) -> FolioResult<Vec<ProjectId>>;

    /// Load a project, or `None` if it is not stored.
    ///
    /// # Errors
    ///
    /// Returns an I/O or codec error if the document cannot be read.
    async fn load_project(&self, id: &ProjectId) -> FolioResult<Option<Project>>;

    /// Load a page of a project, or `None` if it is not stored.
    ///
    /// # Errors
    ///
    /// Returns an I/O or codec error if the document cannot be read.
    async fn load_page(&self, project: &ProjectId, page: &PageId) -> FolioResult<Option<Page>>;

    /// Persist a project document.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FolioError::StoreIo`] if the write fails.
    async fn save_project(&self, project: &Project) -> FolioResult<()>;

    /// Persist a page document under its `project_id`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FolioError::StoreIo`] if the write fails.
    async fn save_page(&self, page: &Page) -> FolioResult<()>;

    /// Delete a project and all of its pages. Deleting a missing project is
    /// not an error.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FolioError::StoreIo`] if the removal fails.
    async fn delete_project(&self, id: &ProjectId) -> FolioResult<()>;

    /// Delete one page. Deleting a missing page is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FolioError::StoreIo`] if the removal fails.
    async fn delete_page(&self, project: &ProjectId, page: &PageId) -> FolioResult<()>;

    /// Refresh `updated_at` and save the page.
    ///
    /// # Errors
    ///
    /// Same as [`ProjectStore::save_page`].
    async fn commit_page(&self, page: &mut Page) -> FolioResult<()> {
        page.touch();
        self.save_page(page).await
    }

    /// Refresh `updated_at` and save the project.
    ///
    /// # Errors
    ///
    /// Same as [`ProjectStore::save_project`].
    async fn commit_project(&self, project: &mut Project) -> FolioResult<()> {
        project.touch();
        self.save_project(project).await
    }
}

type PageKey = (ProjectId, PageId);

/// In-process project store.
///
/// Cloning shares the underlying maps.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    projects: Arc<RwLock<BTreeMap<ProjectId, Project>>>,
    pages: Arc<RwLock<BTreeMap<PageKey, Page>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given documents.
    #[must_use]
    pub fn from_documents(
        projects: impl IntoIterator<Item = Project>,
        pages: impl IntoIterator<Item = Page>,
    ) -> Self {
        let projects = projects
            .into_iter()
            .map(|project| (project.id.clone(), project))
            .collect();
        let pages = pages
            .into_iter()
            .map(|page| ((page.project_id.clone(), page.id.clone()), page))
            .collect();
        Self {
            projects: Arc::new(RwLock::new(projects)),
            pages: Arc::new(RwLock::new(pages)),
        }
    }

    /// Number of stored pages across all projects.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn list_project_ids(&self) -> FolioResult<Vec<ProjectId>> {
        let projects = self
            .projects
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(projects.keys().cloned().collect())
    }

    async fn load_project(&self, id: &ProjectId) -> FolioResult<Option<Project>> {
        let projects = self
            .projects
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(projects.get(id).cloned())
    }

    async fn load_page(&self, project: &ProjectId, page: &PageId) -> FolioResult<Option<Page>> {
        let pages = self
            .pages
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(pages.get(&(project.clone(), page.clone())).cloned())
    }

    async fn save_project(&self, project: &Project) -> FolioResult<()> {
        let mut projects = self
            .projects
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        projects.insert(project.id.clone(), project.clone());
        Ok(())
    }

    async fn save_page(&self, page: &Page) -> FolioResult<()> {
        let mut pages = self
            .pages
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        pages.insert((page.project_id.clone(), page.id.clone()), page.clone());
        Ok(())
    }

    async fn delete_project(&self, id: &ProjectId) -> FolioResult<()> {
        self.projects
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(id);
        self.pages
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .retain(|(project, _), _| project != id);
        Ok(())
    }

    async fn delete_page(&self, project: &ProjectId, page: &PageId) -> FolioResult<()> {
        self.pages
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(&(project.clone(), page.clone()));
        Ok(())
    }
}

/// Filesystem project store.
#[derive(Debug, Clone)]
pub struct FsProjectStore {
    root: PathBuf,
}

impl FsProjectStore {
    /// Create a store rooted at `root`. The directory is created on first
    /// write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding a project's documents.
    #[must_use]
    pub fn project_dir(&self, id: &ProjectId) -> PathBuf {
        self.root.join(encode_file_name(id.as_str()))
    }

    fn project_path(&self, id: &ProjectId) -> PathBuf {
        self.project_dir(id).join(PROJECT_FILE)
    }

    fn page_path(&self, project: &ProjectId, page: &PageId) -> PathBuf {
        self.project_dir(project)
            .join(PAGES_DIR)
            .join(format!("{}.json", encode_file_name(page.as_str())))
    }
}

#[async_trait]
impl ProjectStore for FsProjectStore {
    async fn list_project_ids(&self) -> FolioResult<Vec<ProjectId>> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path().join(PROJECT_FILE);
            let Some(text) = read_optional(&path).await? else {
                continue;
            };
            match Project::from_json_str(&text) {
                Ok(project) => ids.push(project.id),
                Err(e) => tracing::warn!("Skipping unreadable project {}: {e}", path.display()),
            }
        }
        ids.sort();
        Ok(ids)
    }

    async fn load_project(&self, id: &ProjectId) -> FolioResult<Option<Project>> {
        let Some(text) = read_optional(&self.project_path(id)).await? else {
            return Ok(None);
        };
        let project = Project::from_json_str(&text)?;
        ensure_stored_id("project", project.id.as_str(), id.as_str())?;
        Ok(Some(project))
    }

    async fn load_page(&self, project: &ProjectId, page: &PageId) -> FolioResult<Option<Page>> {
        let Some(text) = read_optional(&self.page_path(project, page)).await? else {
            return Ok(None);
        };
        let loaded = Page::from_json_str(&text)?;
        ensure_stored_id("page", loaded.id.as_str(), page.as_str())?;
        ensure_stored_id("project", loaded.project_id.as_str(), project.as_str())?;
        Ok(Some(loaded))
    }

    async fn save_project(&self, project: &Project) -> FolioResult<()> {
        let json = project.to_json_string()?;
        write_atomically(&self.project_path(&project.id), &json).await?;
        tracing::debug!("Saved project {}", project.id);
        Ok(())
    }

    async fn save_page(&self, page: &Page) -> FolioResult<()> {
        let json = page.to_json_string()?;
        write_atomically(&self.page_path(&page.project_id, &page.id), &json).await?;
        tracing::debug!("Saved page {} of project {}", page.id, page.project_id);
        Ok(())
    }

    async fn delete_project(&self, id: &ProjectId) -> FolioResult<()> {
        match tokio::fs::remove_dir_all(self.project_dir(id)).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    async fn delete_page(&self, project: &ProjectId, page: &PageId) -> FolioResult<()> {
        match tokio::fs::remove_file(self.page_path(project, page)).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Read a file, mapping "not found" to `None`.
async fn read_optional(path: &Path) -> FolioResult<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Write to a sibling temp file, then rename over the target.
async fn write_atomically(path: &Path, contents: &str) -> FolioResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("json.tmp");
    if let Err(e) = tokio::fs::write(&tmp, contents).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Encode an id as a file or directory name.
///
/// ASCII letters, digits and `-` are kept; every other byte becomes `_`
/// followed by two hex digits. The mapping is injective, so distinct ids
/// never share a path, and no output contains a separator or `..`.
pub(crate) fn encode_file_name(id: &str) -> String {
    if id.is_empty() {
        return "_".to_string();
    }
    let mut name = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            name.push(char::from(byte));
        } else {
            let _ = write!(name, "_{byte:02x}");
        }
    }
    name
}

/// Fail when a stored document does not carry the id it was loaded by.
fn ensure_stored_id(kind: &str, stored: &str, requested: &str) -> FolioResult<()> {
    if stored == requested {
        Ok(())
    } else {
        Err(FolioError::MalformedDocument(format!(
            "{kind} file for {requested} holds {kind} {stored}"
        )))
    }
}
