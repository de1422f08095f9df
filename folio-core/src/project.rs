//! Projects - named, ordered lists of page ids.
//!
//! A project owns which page ids are valid, not the page bodies; those are
//! loaded from a [`crate::store::ProjectStore`] by id.

use chrono::{DateTime, Utc};

use crate::geometry::Size;
use crate::ids::{PageId, ProjectId};
use crate::page::Page;

/// Page size given to new projects.
pub const DEFAULT_PAGE_SIZE: Size = Size::new(800.0, 600.0);

/// A layout project.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    /// Unique identifier.
    pub id: ProjectId,
    /// Display name.
    pub name: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last save time.
    pub updated_at: DateTime<Utc>,
    /// Page ids; the first one is the entry page.
    pub page_ids: Vec<PageId>,
    /// Size given to new pages.
    pub default_page_size: Size,
    /// Location of the project in the editor's store.
    pub project_path: String,
}

impl Project {
    /// Create an empty project.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ProjectId::generate(),
            name: name.into(),
            created_at: now,
            updated_at: now,
            page_ids: Vec::new(),
            default_page_size: DEFAULT_PAGE_SIZE,
            project_path: String::new(),
        }
    }

    /// Set the id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<ProjectId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the default page size.
    #[must_use]
    pub fn with_default_page_size(mut self, size: Size) -> Self {
        self.default_page_size = size;
        self
    }

    /// Create a page sized to the project default and register its id.
    pub fn add_page(&mut self, name: impl Into<String>) -> Page {
        let page = Page::new(name, self.id.clone(), self.default_page_size);
        self.page_ids.push(page.id.clone());
        self.touch();
        page
    }

    /// Register an existing page id at the end of the page list.
    ///
    /// Returns false if the id was already listed.
    pub fn register_page(&mut self, id: PageId) -> bool {
        if self.contains_page(&id) {
            return false;
        }
        self.page_ids.push(id);
        self.touch();
        true
    }

    /// Drop a page id. Returns whether it was listed.
    pub fn remove_page(&mut self, id: &PageId) -> bool {
        let before = self.page_ids.len();
        self.page_ids.retain(|page| page != id);
        let removed = self.page_ids.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    /// The page a viewer opens first.
    #[must_use]
    pub fn entry_page_id(&self) -> Option<&PageId> {
        self.page_ids.first()
    }

    /// Whether `id` is one of this project's pages.
    #[must_use]
    pub fn contains_page(&self, id: &PageId) -> bool {
        self.page_ids.contains(id)
    }

    /// Refresh the last-save timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_page_uses_defaults() {
        let mut project = Project::new("Site").with_default_page_size(Size::new(1024.0, 768.0));
        let page = project.add_page("Home");
        assert_eq!(page.project_id, project.id);
        assert_eq!(page.page_size, Size::new(1024.0, 768.0));
        assert_eq!(project.entry_page_id(), Some(&page.id));
    }

    #[test]
    fn test_register_and_remove() {
        let mut project = Project::new("Site");
        assert!(project.register_page(PageId::from("a")));
        assert!(!project.register_page(PageId::from("a")));
        assert!(project.register_page(PageId::from("b")));
        assert!(project.remove_page(&PageId::from("a")));
        assert!(!project.remove_page(&PageId::from("a")));
        assert_eq!(project.entry_page_id(), Some(&PageId::from("b")));
    }
}
