//! Project consistency checks.
//!
//! A project is usable when its page list resolves. Dangling page ids and
//! unresolved button links are reported, not fatal: the project still
//! opens, the missing pages are simply not navigable and the affected
//! buttons are inert.

use std::collections::{BTreeSet, HashMap};

use crate::error::FolioError;
use crate::ids::{ItemId, PageId, ProjectId};
use crate::page::Page;
use crate::project::Project;

/// An item whose `linkedPageId` does not resolve to a page of the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedLink {
    /// Page holding the item.
    pub page_id: PageId,
    /// The linking item.
    pub item_id: ItemId,
    /// The missing target.
    pub target: PageId,
}

/// Result of checking a project against its loaded pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectReport {
    /// Project checked.
    pub project_id: ProjectId,
    /// Page ids with a matching page body, in project order.
    pub resolved_pages: Vec<PageId>,
    /// Page ids with no body, or whose body belongs to another project.
    pub dangling_pages: Vec<PageId>,
    /// Page ids listed more than once (reported once each).
    pub duplicate_page_ids: Vec<PageId>,
    /// Links that point outside the resolved pages.
    pub unresolved_links: Vec<UnresolvedLink>,
}

impl ProjectReport {
    /// Check `project` against the page bodies that could be loaded.
    ///
    /// Pages not listed in the project are ignored.
    pub fn build<'a>(project: &Project, pages: impl IntoIterator<Item = &'a Page>) -> Self {
        let bodies: HashMap<&PageId, &Page> =
            pages.into_iter().map(|page| (&page.id, page)).collect();

        let mut report = Self {
            project_id: project.id.clone(),
            resolved_pages: Vec::new(),
            dangling_pages: Vec::new(),
            duplicate_page_ids: Vec::new(),
            unresolved_links: Vec::new(),
        };
        let mut seen = BTreeSet::new();
        for id in &project.page_ids {
            if !seen.insert(id) {
                if !report.duplicate_page_ids.contains(id) {
                    report.duplicate_page_ids.push(id.clone());
                }
                continue;
            }
            match bodies.get(id) {
                Some(page) if page.project_id == project.id => {
                    report.resolved_pages.push(id.clone());
                }
                _ => report.dangling_pages.push(id.clone()),
            }
        }

        for id in &report.resolved_pages {
            let Some(page) = bodies.get(id) else { continue };
            for item in page.items() {
                let Some(target) = &item.linked_page_id else { continue };
                if !report.resolved_pages.contains(target) {
                    report.unresolved_links.push(UnresolvedLink {
                        page_id: id.clone(),
                        item_id: item.id.clone(),
                        target: target.clone(),
                    });
                }
            }
        }
        report
    }

    /// Whether nothing was reported.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.dangling_pages.is_empty()
            && self.duplicate_page_ids.is_empty()
            && self.unresolved_links.is_empty()
    }

    /// The first resolved page: where a viewer starts.
    #[must_use]
    pub fn entry_page(&self) -> Option<&PageId> {
        self.resolved_pages.first()
    }

    /// Whether `page` can be navigated to.
    #[must_use]
    pub fn is_navigable(&self, page: &PageId) -> bool {
        self.resolved_pages.contains(page)
    }

    /// One [`FolioError::DanglingPageReference`] per dangling page.
    #[must_use]
    pub fn dangling_errors(&self) -> Vec<FolioError> {
        self.dangling_pages
            .iter()
            .map(|page| FolioError::DanglingPageReference {
                project: self.project_id.to_string(),
                page: page.to_string(),
            })
            .collect()
    }

    /// Emit a warning for every reported problem.
    pub fn log_warnings(&self) {
        for page in &self.dangling_pages {
            tracing::warn!(
                "Project {} lists page {page} but it cannot be loaded",
                self.project_id
            );
        }
        for page in &self.duplicate_page_ids {
            tracing::warn!("Project {} lists page {page} more than once", self.project_id);
        }
        for link in &self.unresolved_links {
            tracing::warn!(
                "Item {} on page {} links to unknown page {}",
                link.item_id,
                link.page_id,
                link.target
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use crate::item::CanvasItem;
    use crate::widget::WidgetKind;

    fn page(id: &str, project: &str) -> Page {
        Page::new(id, ProjectId::from(project), Size::new(400.0, 300.0)).with_id(id)
    }

    #[test]
    fn test_dangling_page_reported() {
        let mut project = Project::new("Site").with_id("site");
        project.page_ids = vec![PageId::from("p1"), PageId::from("missing")];
        let p1 = page("p1", "site");

        let report = ProjectReport::build(&project, [&p1]);
        assert_eq!(report.resolved_pages, vec![PageId::from("p1")]);
        assert_eq!(report.dangling_pages, vec![PageId::from("missing")]);
        assert_eq!(report.entry_page(), Some(&PageId::from("p1")));
        assert!(!report.is_navigable(&PageId::from("missing")));

        let errors = report.dangling_errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].is_recoverable());
    }

    #[test]
    fn test_foreign_page_is_dangling() {
        let mut project = Project::new("Site").with_id("site");
        project.page_ids = vec![PageId::from("p1")];
        let foreign = page("p1", "other");
        let report = ProjectReport::build(&project, [&foreign]);
        assert!(report.resolved_pages.is_empty());
        assert_eq!(report.entry_page(), None);
    }

    #[test]
    fn test_unresolved_links() {
        let mut project = Project::new("Site").with_id("site");
        project.page_ids = vec![PageId::from("home"), PageId::from("about"), PageId::from("gone")];
        let mut home = page("home", "site");
        home.push_item(CanvasItem::bare("ok", WidgetKind::Button).with_link("about"))
            .expect("push");
        home.push_item(CanvasItem::bare("bad", WidgetKind::Button).with_link("gone"))
            .expect("push");
        home.push_item(CanvasItem::bare("worse", WidgetKind::Button).with_link("nowhere"))
            .expect("push");
        let about = page("about", "site");

        let report = ProjectReport::build(&project, [&home, &about]);
        let targets: Vec<&str> = report
            .unresolved_links
            .iter()
            .map(|link| link.target.as_str())
            .collect();
        assert_eq!(targets, vec!["gone", "nowhere"]);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_duplicate_page_ids() {
        let mut project = Project::new("Site").with_id("site");
        project.page_ids = vec![PageId::from("a"), PageId::from("a"), PageId::from("a")];
        let a = page("a", "site");
        let report = ProjectReport::build(&project, [&a]);
        assert_eq!(report.resolved_pages, vec![PageId::from("a")]);
        assert_eq!(report.duplicate_page_ids, vec![PageId::from("a")]);
    }

    #[test]
    fn test_clean_project() {
        let mut project = Project::new("Site").with_id("site");
        project.page_ids = vec![PageId::from("a")];
        let a = page("a", "site");
        assert!(ProjectReport::build(&project, [&a]).is_clean());
    }
}
