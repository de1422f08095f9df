//! Explicit document cache.
//!
//! Loaded projects, pages and resolved assets are cached by id for the
//! lifetime of the cache object. Entries are never replaced once populated;
//! the only way to drop them is [`DocumentCache::invalidate_all`], which a
//! bulk import triggers. Failed loads and not-found results are never
//! cached, so a transient error cannot poison later lookups.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::asset::{AssetResolver, ResolvedAsset};
use crate::error::FolioResult;
use crate::ids::{PageId, ProjectId};
use crate::page::Page;
use crate::project::Project;
use crate::store::ProjectStore;

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of `invalidate_all` calls.
    pub invalidations: u64,
    /// Cached projects.
    pub projects: usize,
    /// Cached pages.
    pub pages: usize,
    /// Cached assets.
    pub assets: usize,
}

/// Append-only cache of projects, pages and assets.
#[derive(Debug, Default)]
pub struct DocumentCache {
    projects: RwLock<HashMap<ProjectId, Arc<Project>>>,
    pages: RwLock<HashMap<(ProjectId, PageId), Arc<Page>>>,
    assets: RwLock<HashMap<(ProjectId, String), ResolvedAsset>>,
    hits: AtomicU64,
    misses: AtomicU64,
    invalidations: AtomicU64,
}

impl DocumentCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a project through the cache.
    ///
    /// # Errors
    ///
    /// Propagates store errors; nothing is cached in that case.
    pub async fn project(
        &self,
        store: &dyn ProjectStore,
        id: &ProjectId,
    ) -> FolioResult<Option<Arc<Project>>> {
        let cached = self
            .projects
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(id)
            .cloned();
        if let Some(project) = cached {
            self.record_hit();
            tracing::debug!("Project cache hit: {id}");
            return Ok(Some(project));
        }
        self.record_miss();
        tracing::debug!("Project cache miss: {id}");

        let Some(project) = store.load_project(id).await? else {
            return Ok(None);
        };
        let mut projects = self
            .projects
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let entry = projects
            .entry(id.clone())
            .or_insert_with(|| Arc::new(project));
        Ok(Some(Arc::clone(entry)))
    }

    /// Load a page through the cache.
    ///
    /// # Errors
    ///
    /// Propagates store errors; nothing is cached in that case.
    pub async fn page(
        &self,
        store: &dyn ProjectStore,
        project: &ProjectId,
        page: &PageId,
    ) -> FolioResult<Option<Arc<Page>>> {
        let key = (project.clone(), page.clone());
        let cached = self
            .pages
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&key)
            .cloned();
        if let Some(body) = cached {
            self.record_hit();
            tracing::debug!("Page cache hit: {project}/{page}");
            return Ok(Some(body));
        }
        self.record_miss();
        tracing::debug!("Page cache miss: {project}/{page}");

        let Some(body) = store.load_page(project, page).await? else {
            return Ok(None);
        };
        let mut pages = self
            .pages
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let entry = pages.entry(key).or_insert_with(|| Arc::new(body));
        Ok(Some(Arc::clone(entry)))
    }

    /// Resolve an asset through the cache.
    pub fn asset(
        &self,
        resolver: &dyn AssetResolver,
        project: &ProjectId,
        key: &str,
    ) -> ResolvedAsset {
        let cache_key = (project.clone(), key.to_string());
        let cached = self
            .assets
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&cache_key)
            .cloned();
        if let Some(asset) = cached {
            self.record_hit();
            return asset;
        }
        self.record_miss();

        let resolved = resolver.resolve(project, key);
        if !resolved.is_found() {
            return resolved;
        }
        self.assets
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .entry(cache_key)
            .or_insert(resolved)
            .clone()
    }

    /// Drop every cached entry.
    pub fn invalidate_all(&self) {
        self.projects
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear();
        self.pages
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear();
        self.assets
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear();
        self.invalidations.fetch_add(1, Ordering::Relaxed);
        tracing::info!("Document cache invalidated");
    }

    /// Current statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            projects: self
                .projects
                .read()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .len(),
            pages: self
                .pages
                .read()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .len(),
            assets: self
                .assets
                .read()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .len(),
        }
    }

    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }
}

/// An [`AssetResolver`] that goes through a [`DocumentCache`].
#[derive(Clone)]
pub struct CachedAssets {
    cache: Arc<DocumentCache>,
    inner: Arc<dyn AssetResolver>,
}

impl CachedAssets {
    /// Wrap `inner` with `cache`.
    #[must_use]
    pub fn new(cache: Arc<DocumentCache>, inner: Arc<dyn AssetResolver>) -> Self {
        Self { cache, inner }
    }
}

impl std::fmt::Debug for CachedAssets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedAssets")
            .field("cache", &self.cache.stats())
            .finish_non_exhaustive()
    }
}

impl AssetResolver for CachedAssets {
    fn resolve(&self, project: &ProjectId, key: &str) -> ResolvedAsset {
        self.cache.asset(self.inner.as_ref(), project, key)
    }
}
