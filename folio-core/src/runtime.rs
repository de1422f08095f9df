//! Navigation runtime.
//!
//! [`Runtime`] drives a [`NavigationState`] against a project store: a page
//! body is loaded first and the navigation is committed only once the load
//! succeeded, so the state never points at a page that failed to load.
//! Every committed state is published on a `watch` channel for renderers to
//! follow.

use std::sync::Arc;

use tokio::sync::watch;

use crate::bundle::Bundle;
use crate::cache::DocumentCache;
use crate::error::{FolioError, FolioResult};
use crate::geometry::Offset;
use crate::ids::{ItemId, PageId, ProjectId};
use crate::item::CanvasItem;
use crate::navigation::NavigationState;
use crate::page::Page;
use crate::project::Project;
use crate::store::ProjectStore;
use crate::validation::ProjectReport;
use crate::widget::WidgetKind;

/// Outcome of pressing an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// The linked page is now current.
    Navigated(PageId),
    /// Nothing happened: not a button, unlinked, or the link is unresolved.
    Inert,
}

/// Loads projects and pages and tracks navigation between them.
pub struct Runtime {
    store: Arc<dyn ProjectStore>,
    cache: Arc<DocumentCache>,
    project: Option<Arc<Project>>,
    report: Option<ProjectReport>,
    current: Option<Arc<Page>>,
    state: watch::Sender<NavigationState>,
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("project", &self.project.as_ref().map(|p| &p.id))
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl Runtime {
    /// Create a runtime over `store` with a fresh cache.
    #[must_use]
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        let (state, _) = watch::channel(NavigationState::new());
        Self {
            store,
            cache: Arc::new(DocumentCache::new()),
            project: None,
            report: None,
            current: None,
            state,
        }
    }

    /// Share an existing cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<DocumentCache>) -> Self {
        self.cache = cache;
        self
    }

    /// The document cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<DocumentCache> {
        &self.cache
    }

    /// Current navigation state.
    #[must_use]
    pub fn state(&self) -> NavigationState {
        self.state.borrow().clone()
    }

    /// Follow state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<NavigationState> {
        self.state.subscribe()
    }

    /// Open project, if any.
    #[must_use]
    pub fn project(&self) -> Option<&Project> {
        self.project.as_deref()
    }

    /// Consistency report of the open project.
    #[must_use]
    pub fn report(&self) -> Option<&ProjectReport> {
        self.report.as_ref()
    }

    /// Page on screen, if any.
    #[must_use]
    pub fn current_page(&self) -> Option<Arc<Page>> {
        self.current.clone()
    }

    /// Open a project and show its entry page.
    ///
    /// Pages that are missing or fail to decode are reported as dangling;
    /// the project still opens.
    ///
    /// # Errors
    ///
    /// - [`FolioError::ProjectNotFound`] if the project is not stored.
    /// - Store errors and project decode errors. The previous project stays
    ///   open in that case.
    pub async fn open_project(&mut self, id: &ProjectId) -> FolioResult<&ProjectReport> {
        let (project, pages, report) = self.load_project_pages(id).await?;

        let mut state = self.state.borrow().load_project(id.clone());
        let entry = report
            .entry_page()
            .and_then(|entry| pages.iter().find(|page| &page.id == entry))
            .cloned();
        if let Some(page) = &entry {
            state = state.navigate_to_page(page.id.clone());
        }

        tracing::info!(
            "Opened project {id}: {} of {} pages available",
            report.resolved_pages.len(),
            project.page_ids.len()
        );
        self.project = Some(project);
        self.current = entry;
        self.state.send_replace(state);
        Ok(self.report.insert(report))
    }

    /// Load `page_id` and make it current, pushing the previous page onto
    /// the history.
    ///
    /// # Errors
    ///
    /// - [`FolioError::NoProjectLoaded`] before [`Runtime::open_project`].
    /// - [`FolioError::DanglingPageReference`] if the page is not part of the
    ///   open project or cannot be found.
    /// - Store and codec errors from loading the page.
    ///
    /// On any error the navigation state is left unchanged.
    pub async fn navigate_to(&mut self, page_id: &PageId) -> FolioResult<Arc<Page>> {
        let page = self.load_navigable(page_id).await?;
        let next = self.state.borrow().navigate_to_page(page_id.clone());
        tracing::debug!("Navigated to page {page_id}");
        self.commit(next, Arc::clone(&page));
        Ok(page)
    }

    /// Return to the previous page. `Ok(None)` when there is no history.
    ///
    /// # Errors
    ///
    /// Same as [`Runtime::navigate_to`]; on error the state is unchanged.
    pub async fn go_back(&mut self) -> FolioResult<Option<Arc<Page>>> {
        let Some(previous) = self.state.borrow().previous_page().cloned() else {
            return Ok(None);
        };
        let page = self.load_navigable(&previous).await?;
        let next = self.state.borrow().go_back();
        tracing::debug!("Went back to page {previous}");
        self.commit(next, Arc::clone(&page));
        Ok(Some(page))
    }

    /// Press an item on the current page.
    ///
    /// Linked buttons navigate. Everything else is inert; a button whose
    /// link does not resolve is inert with a warning.
    ///
    /// # Errors
    ///
    /// - [`FolioError::NoProjectLoaded`] if no page is showing.
    /// - [`FolioError::ItemNotFound`] if the item is not on the current page.
    /// - Errors from [`Runtime::navigate_to`] other than an unresolved link.
    pub async fn activate(&mut self, item_id: &ItemId) -> FolioResult<Activation> {
        let page = self.current.clone().ok_or(FolioError::NoProjectLoaded)?;
        let item = page
            .item(item_id)
            .ok_or_else(|| FolioError::ItemNotFound(item_id.to_string()))?;
        self.activate_item(item).await
    }

    /// Press whatever is topmost at `point` on the current page.
    ///
    /// # Errors
    ///
    /// Same as [`Runtime::activate`].
    pub async fn activate_at(&mut self, point: Offset) -> FolioResult<Activation> {
        let page = self.current.clone().ok_or(FolioError::NoProjectLoaded)?;
        match page.item_at(point) {
            Some(item) => self.activate_item(item).await,
            None => Ok(Activation::Inert),
        }
    }

    /// Save every document of `bundle` into the store, then drop all cached
    /// documents.
    ///
    /// When the bundle replaces the open project, the project and its report
    /// are reloaded and the current page is swapped for its imported copy.
    /// The navigation state is left as it was.
    ///
    /// # Errors
    ///
    /// Returns the first store error, or an error from reloading the open
    /// project.
    pub async fn import_bundle(&mut self, bundle: &Bundle) -> FolioResult<()> {
        bundle.save_into(self.store.as_ref()).await?;
        self.cache.invalidate_all();
        tracing::info!(
            "Imported project {} with {} pages",
            bundle.project.id,
            bundle.pages.len()
        );

        let id = &bundle.project.id;
        if self.project.as_ref().is_some_and(|open| &open.id == id) {
            let (project, pages, report) = self.load_project_pages(id).await?;
            let current_id = self.state.borrow().current_page_id.clone();
            if let Some(current_id) = current_id {
                if let Some(page) = pages.iter().find(|page| page.id == current_id) {
                    self.current = Some(Arc::clone(page));
                } else {
                    tracing::warn!("Current page {current_id} is no longer part of project {id}");
                }
            }
            tracing::debug!(
                "Reloaded open project {id}: {} of {} pages available",
                report.resolved_pages.len(),
                project.page_ids.len()
            );
            self.project = Some(project);
            self.report = Some(report);
        }
        Ok(())
    }

    /// Load a project with every page it lists and check them together.
    ///
    /// Pages that are missing or fail to decode are left out and show up in
    /// the report as dangling.
    async fn load_project_pages(
        &self,
        id: &ProjectId,
    ) -> FolioResult<(Arc<Project>, Vec<Arc<Page>>, ProjectReport)> {
        let project = self
            .cache
            .project(self.store.as_ref(), id)
            .await?
            .ok_or_else(|| FolioError::ProjectNotFound(id.to_string()))?;

        let mut pages = Vec::new();
        for page_id in &project.page_ids {
            match self.cache.page(self.store.as_ref(), id, page_id).await {
                Ok(Some(page)) => pages.push(page),
                Ok(None) => {}
                Err(e @ (FolioError::MalformedDocument(_) | FolioError::UnknownWidgetType(_))) => {
                    tracing::warn!("Page {page_id} of project {id} failed to decode: {e}");
                }
                Err(e) => return Err(e),
            }
        }

        let report = ProjectReport::build(&project, pages.iter().map(|page| &**page));
        report.log_warnings();
        Ok((project, pages, report))
    }

    async fn activate_item(&mut self, item: &CanvasItem) -> FolioResult<Activation> {
        if item.kind != WidgetKind::Button {
            return Ok(Activation::Inert);
        }
        let Some(target) = &item.linked_page_id else {
            tracing::debug!("Button {} has no link", item.id);
            return Ok(Activation::Inert);
        };
        match self.navigate_to(target).await {
            Ok(_) => Ok(Activation::Navigated(target.clone())),
            Err(FolioError::DanglingPageReference { .. }) => {
                tracing::warn!("Button {} links to unavailable page {target}", item.id);
                Ok(Activation::Inert)
            }
            Err(e) => Err(e),
        }
    }

    async fn load_navigable(&self, page_id: &PageId) -> FolioResult<Arc<Page>> {
        let (Some(project), Some(report)) = (&self.project, &self.report) else {
            return Err(FolioError::NoProjectLoaded);
        };
        let dangling = || FolioError::DanglingPageReference {
            project: project.id.to_string(),
            page: page_id.to_string(),
        };
        if !report.is_navigable(page_id) {
            tracing::warn!("Page {page_id} is not navigable in project {}", project.id);
            return Err(dangling());
        }
        self.cache
            .page(self.store.as_ref(), &project.id, page_id)
            .await?
            .ok_or_else(dangling)
    }

    fn commit(&mut self, next: NavigationState, page: Arc<Page>) {
        self.current = Some(page);
        self.state.send_replace(next);
    }
}
