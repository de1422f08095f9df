//! Page navigation state machine.
//!
//! Every transition takes the current state by reference and returns the
//! next one, so a state value never changes after it has been published.

use serde::{Deserialize, Serialize};

use crate::ids::{PageId, ProjectId};

/// Coarse phase of a [`NavigationState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationPhase {
    /// Nothing loaded yet.
    NoProject,
    /// A project is open but no page has been shown.
    ProjectLoaded,
    /// A project and one of its pages are showing.
    PageLoaded,
}

/// Current project, current page and back-stack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationState {
    /// Open project, if any.
    pub current_project_id: Option<ProjectId>,
    /// Page on screen, if any.
    pub current_page_id: Option<PageId>,
    /// Previously shown pages, oldest first.
    pub history: Vec<PageId>,
}

impl NavigationState {
    /// The empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a project. Clears the page and the history.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn load_project(&self, project_id: ProjectId) -> Self {
        Self {
            current_project_id: Some(project_id),
            current_page_id: None,
            history: Vec::new(),
        }
    }

    /// Show `page_id`, pushing the current page (if any) onto the history.
    #[must_use]
    pub fn navigate_to_page(&self, page_id: PageId) -> Self {
        let mut history = self.history.clone();
        if let Some(current) = &self.current_page_id {
            history.push(current.clone());
        }
        Self {
            current_project_id: self.current_project_id.clone(),
            current_page_id: Some(page_id),
            history,
        }
    }

    /// Return to the previous page. Unchanged when the history is empty.
    #[must_use]
    pub fn go_back(&self) -> Self {
        let mut history = self.history.clone();
        match history.pop() {
            Some(previous) => Self {
                current_project_id: self.current_project_id.clone(),
                current_page_id: Some(previous),
                history,
            },
            None => self.clone(),
        }
    }

    /// Page [`Self::go_back`] would return to.
    #[must_use]
    pub fn previous_page(&self) -> Option<&PageId> {
        self.history.last()
    }

    /// Whether there is a page to go back to.
    #[must_use]
    pub fn can_go_back(&self) -> bool {
        !self.history.is_empty()
    }

    /// Which phase the state is in.
    #[must_use]
    pub fn phase(&self) -> NavigationPhase {
        match (&self.current_project_id, &self.current_page_id) {
            (_, Some(_)) => NavigationPhase::PageLoaded,
            (Some(_), None) => NavigationPhase::ProjectLoaded,
            (None, None) => NavigationPhase::NoProject,
        }
    }
}
