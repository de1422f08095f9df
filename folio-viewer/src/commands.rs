//! Command implementations.
//!
//! Every command returns its report as a string so `main` only prints it.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use folio_core::asset::is_data_uri;
use folio_core::{
    Activation, AssetResolver, Bundle, CachedAssets, DirectoryAssets, DocumentCache,
    ExportPolicy, FolioError, FsProjectStore, JsonDocument, NoAssets, PageId, ProjectId,
    ProjectStore, Runtime,
};
use folio_renderer::{render_page, RenderContext, RenderMode, StaticSiteExporter};

use crate::walk::WalkStep;
use crate::{Command, ExportFormat, ViewerConfig};

/// Runs viewer commands against a project store.
pub struct Viewer {
    store: Arc<dyn ProjectStore>,
    cache: Arc<DocumentCache>,
    assets: Arc<dyn AssetResolver>,
    directory: Option<DirectoryAssets>,
}

impl std::fmt::Debug for Viewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Viewer")
            .field("directory", &self.directory)
            .field("cache", &self.cache.stats())
            .finish_non_exhaustive()
    }
}

impl Viewer {
    /// Create a viewer over the configured filesystem store.
    #[must_use]
    pub fn new(config: &ViewerConfig) -> Self {
        let store: Arc<dyn ProjectStore> = Arc::new(FsProjectStore::new(&config.store_dir));
        Self::with_store(store, config.asset_dir.as_deref())
    }

    /// Create a viewer over any store.
    #[must_use]
    pub fn with_store(store: Arc<dyn ProjectStore>, asset_dir: Option<&Path>) -> Self {
        let cache = Arc::new(DocumentCache::new());
        let directory = asset_dir.map(DirectoryAssets::new);
        let inner: Arc<dyn AssetResolver> = match &directory {
            Some(dir) => Arc::new(dir.clone()),
            None => Arc::new(NoAssets),
        };
        Self {
            store,
            assets: Arc::new(CachedAssets::new(Arc::clone(&cache), inner)),
            cache,
            directory,
        }
    }

    /// Run `command`.
    ///
    /// # Errors
    ///
    /// Returns the first error of the command, with context.
    pub async fn run(&self, command: &Command) -> anyhow::Result<String> {
        match command {
            Command::Inspect { project: None } => self.list().await,
            Command::Inspect {
                project: Some(project),
            } => self.inspect(project).await,
            Command::Render {
                project,
                page,
                mode,
            } => self.render(project, page.as_ref(), (*mode).into()).await,
            Command::Walk { project, steps } => self.walk(project, steps).await,
            Command::Export {
                project,
                output,
                format,
                strict,
            } => {
                let policy = if *strict {
                    ExportPolicy::Strict
                } else {
                    ExportPolicy::Lenient
                };
                self.export(project, output, *format, policy).await
            }
            Command::Import { bundle } => self.import(bundle).await,
        }
    }

    /// One line per stored project: id, name and page count.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be listed.
    pub async fn list(&self) -> anyhow::Result<String> {
        let ids = self
            .store
            .list_project_ids()
            .await
            .context("Failed to list projects")?;
        let mut out = String::new();
        for id in ids {
            match self.cache.project(self.store.as_ref(), &id).await {
                Ok(Some(project)) => {
                    let _ = writeln!(
                        out,
                        "{id}\t{}\t{} pages",
                        project.name,
                        project.page_ids.len()
                    );
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Skipping project {id}: {e}"),
            }
        }
        if out.is_empty() {
            out.push_str("No projects\n");
        }
        Ok(out)
    }

    /// Summary of a project: pages, entry page and consistency problems.
    ///
    /// # Errors
    ///
    /// Returns an error if the project cannot be opened.
    pub async fn inspect(&self, id: &ProjectId) -> anyhow::Result<String> {
        let runtime = self.open(id).await?;
        let (Some(project), Some(report)) = (runtime.project(), runtime.report()) else {
            bail!("Project {id} did not open");
        };

        let mut out = String::new();
        let _ = writeln!(out, "Project: {} ({})", project.name, project.id);
        let _ = writeln!(
            out,
            "Default page size: {}x{}",
            project.default_page_size.width, project.default_page_size.height
        );
        if !project.project_path.is_empty() {
            let _ = writeln!(out, "Path: {}", project.project_path);
        }
        let _ = writeln!(
            out,
            "Pages: {} listed, {} available",
            project.page_ids.len(),
            report.resolved_pages.len()
        );

        let entry = report.entry_page();
        for (n, page_id) in report.resolved_pages.iter().enumerate() {
            let Some(page) = self.cache.page(self.store.as_ref(), id, page_id).await? else {
                continue;
            };
            let marker = if Some(page_id) == entry { " [entry]" } else { "" };
            let _ = writeln!(
                out,
                "  {}. {} \"{}\" {}x{}, {} items{marker}",
                n + 1,
                page.id,
                page.name,
                page.page_size.width,
                page.page_size.height,
                page.item_count()
            );
        }

        for page_id in &report.dangling_pages {
            let _ = writeln!(out, "Dangling page: {page_id}");
        }
        for page_id in &report.duplicate_page_ids {
            let _ = writeln!(out, "Listed more than once: {page_id}");
        }
        for link in &report.unresolved_links {
            let _ = writeln!(
                out,
                "Unresolved link: {} on {} -> {}",
                link.item_id, link.page_id, link.target
            );
        }
        if report.is_clean() {
            out.push_str("No problems found\n");
        }
        Ok(out)
    }

    /// Draw list of a page as pretty JSON. Defaults to the entry page.
    ///
    /// # Errors
    ///
    /// Returns an error if the project does not open, it has no pages, or
    /// the page cannot be navigated to.
    pub async fn render(
        &self,
        id: &ProjectId,
        page: Option<&PageId>,
        mode: RenderMode,
    ) -> anyhow::Result<String> {
        let mut runtime = self.open(id).await?;
        let page = match page {
            Some(page_id) => runtime
                .navigate_to(page_id)
                .await
                .with_context(|| format!("Failed to open page {page_id}"))?,
            None => runtime
                .current_page()
                .with_context(|| format!("Project {id} has no pages"))?,
        };
        let navigable = runtime
            .report()
            .map(|report| report.resolved_pages.as_slice())
            .unwrap_or_default();
        let ctx = RenderContext::new(id, self.assets.as_ref())
            .with_mode(mode)
            .with_navigable(navigable);
        let list = render_page(&page, &ctx);
        let mut out = serde_json::to_string_pretty(&list).context("Failed to encode draw list")?;
        out.push('\n');
        Ok(out)
    }

    /// Open a project and run `steps`, one report line per step.
    ///
    /// Recoverable failures (dangling pages) are reported and the walk goes
    /// on from the unchanged state.
    ///
    /// # Errors
    ///
    /// Returns an error if the project does not open or a step fails with
    /// an unrecoverable error.
    pub async fn walk(&self, id: &ProjectId, steps: &[WalkStep]) -> anyhow::Result<String> {
        let mut runtime = self.open(id).await?;
        let changes = runtime.subscribe();

        let mut out = String::new();
        let _ = writeln!(out, "start: {}", describe(&runtime));
        for step in steps {
            let result = match step {
                WalkStep::Press(item) => runtime.activate(item).await.map(outcome),
                WalkStep::PressAt(point) => runtime.activate_at(*point).await.map(outcome),
                WalkStep::Goto(page) => runtime.navigate_to(page).await.map(|_| "navigated"),
                WalkStep::Back => runtime
                    .go_back()
                    .await
                    .map(|page| if page.is_some() { "went back" } else { "no history" }),
            };
            match result {
                Ok(what) => {
                    let _ = writeln!(out, "{step}: {what}; {}", describe(&runtime));
                }
                Err(e) if e.is_recoverable() => {
                    tracing::warn!("Step {step} failed: {e}");
                    let _ = writeln!(out, "{step}: failed ({e}); {}", describe(&runtime));
                }
                Err(e) => return Err(e).with_context(|| format!("Step {step} failed")),
            }
        }

        let moved = changes.has_changed().unwrap_or(false);
        let _ = writeln!(
            out,
            "end: {}{}",
            describe(&runtime),
            if moved { "" } else { " (unchanged)" }
        );
        Ok(out)
    }

    /// Export a project as a bundle file or a static site.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundle cannot be assembled under `policy`
    /// or the output cannot be written.
    pub async fn export(
        &self,
        id: &ProjectId,
        output: &Path,
        format: ExportFormat,
        policy: ExportPolicy,
    ) -> anyhow::Result<String> {
        let bundle = Bundle::assemble(self.store.as_ref(), id, self.assets.as_ref(), policy)
            .await
            .with_context(|| format!("Failed to assemble bundle for project {id}"))?;

        let mut out = format!(
            "Exported {} ({} pages, {} assets)\n",
            bundle.project.name,
            bundle.pages.len(),
            bundle.assets.len()
        );
        let written = match format {
            ExportFormat::Bundle => {
                let text = bundle.to_json_string().context("Failed to encode bundle")?;
                if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .with_context(|| format!("Failed to create {}", parent.display()))?;
                }
                tokio::fs::write(output, text)
                    .await
                    .with_context(|| format!("Failed to write {}", output.display()))?;
                vec![output.to_path_buf()]
            }
            ExportFormat::Site => {
                // The site writer does blocking file I/O.
                let dir = output.to_path_buf();
                tokio::task::spawn_blocking(move || StaticSiteExporter::new().write_to(&bundle, &dir))
                    .await
                    .context("Site export task failed")?
                    .with_context(|| format!("Failed to write site to {}", output.display()))?
            }
        };

        tracing::info!("Exported project {id} ({format:?})");
        for path in written {
            let _ = writeln!(out, "  {}", path.display());
        }
        Ok(out)
    }

    /// Import a bundle file into the store.
    ///
    /// With an asset directory configured, embedded assets are written back
    /// as files under it; otherwise they are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded, or the store
    /// or asset directory cannot be written.
    pub async fn import(&self, path: &Path) -> anyhow::Result<String> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let bundle = Bundle::from_json_str(&text)
            .with_context(|| format!("Failed to decode bundle {}", path.display()))?;

        let mut runtime = Runtime::new(Arc::clone(&self.store)).with_cache(Arc::clone(&self.cache));
        runtime
            .import_bundle(&bundle)
            .await
            .context("Failed to save bundle")?;

        let assets = match &self.directory {
            Some(dir) => write_assets(dir, &bundle).await?,
            None => {
                if !bundle.assets.is_empty() {
                    tracing::warn!(
                        "No asset directory configured; {} assets not written",
                        bundle.assets.len()
                    );
                }
                0
            }
        };

        Ok(format!(
            "Imported {} ({}): {} pages, {assets} assets written\n",
            bundle.project.name,
            bundle.project.id,
            bundle.pages.len()
        ))
    }

    async fn open(&self, id: &ProjectId) -> anyhow::Result<Runtime> {
        let mut runtime = Runtime::new(Arc::clone(&self.store)).with_cache(Arc::clone(&self.cache));
        match runtime.open_project(id).await {
            Ok(_) => Ok(runtime),
            Err(FolioError::ProjectNotFound(_)) => bail!("No project {id} in the store"),
            Err(e) => Err(e).with_context(|| format!("Failed to open project {id}")),
        }
    }
}

async fn write_assets(dir: &DirectoryAssets, bundle: &Bundle) -> anyhow::Result<usize> {
    let mut written = 0;
    for (key, reference) in &bundle.assets {
        if !is_data_uri(reference) {
            tracing::debug!("Asset {key} is external; leaving it as a reference");
            continue;
        }
        let Some(target) = dir.asset_path(&bundle.project.id, key) else {
            tracing::warn!("Asset key {key} escapes the asset directory; skipping");
            continue;
        };
        let data = folio_renderer::image::parse_data_uri(reference)
            .with_context(|| format!("Asset {key} is not a valid data URI"))?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::write(&target, &data.bytes)
            .await
            .with_context(|| format!("Failed to write {}", target.display()))?;
        written += 1;
    }
    Ok(written)
}

fn outcome(activation: Activation) -> &'static str {
    match activation {
        Activation::Navigated(_) => "navigated",
        Activation::Inert => "inert",
    }
}

fn describe(runtime: &Runtime) -> String {
    let state = runtime.state();
    let current = state
        .current_page_id
        .as_ref()
        .map_or_else(|| "-".to_string(), ToString::to_string);
    let history: Vec<&str> = state.history.iter().map(PageId::as_str).collect();
    format!("page {current}, history [{}]", history.join(", "))
}
