//! Export bundles.
//!
//! A bundle is a project, every page body it resolves to, and every asset
//! its image items reference, packed into one JSON document:
//!
//! ```text
//! { project: Project, pages: { <pageId>: Page }, assets: { <key>: dataUriOrPath },
//!   exportedAt: ISO8601, version: "1.0" }
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::asset::{is_data_uri, AssetResolver, BundleAssets};
use crate::codec::{format_timestamp, parse_timestamp, JsonDocument};
use crate::error::{FolioError, FolioResult};
use crate::ids::{PageId, ProjectId};
use crate::page::Page;
use crate::project::Project;
use crate::store::{MemoryStore, ProjectStore};
use crate::validation::ProjectReport;
use crate::widget::WidgetKind;

/// Bundle format written by this crate.
pub const BUNDLE_FORMAT_VERSION: &str = "1.0";

/// How [`Bundle::assemble`] treats unresolvable references.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportPolicy {
    /// Skip dangling pages and missing assets with a warning.
    #[default]
    Lenient,
    /// Fail on dangling pages, unresolved button links or missing assets.
    Strict,
}

/// A self-contained project export.
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    /// The project document, unchanged.
    pub project: Project,
    /// Page bodies keyed by page id.
    pub pages: BTreeMap<PageId, Page>,
    /// Asset key to data URI or path.
    pub assets: BTreeMap<String, String>,
    /// When the bundle was assembled.
    pub exported_at: DateTime<Utc>,
    /// Bundle format version.
    pub version: String,
}

impl Bundle {
    /// Create an empty bundle for `project`.
    #[must_use]
    pub fn new(project: Project) -> Self {
        Self {
            project,
            pages: BTreeMap::new(),
            assets: BTreeMap::new(),
            exported_at: Utc::now(),
            version: BUNDLE_FORMAT_VERSION.to_string(),
        }
    }

    /// Add a page body.
    #[must_use]
    pub fn with_page(mut self, page: Page) -> Self {
        self.pages.insert(page.id.clone(), page);
        self
    }

    /// Add an asset.
    #[must_use]
    pub fn with_asset(mut self, key: impl Into<String>, reference: impl Into<String>) -> Self {
        self.assets.insert(key.into(), reference.into());
        self
    }

    /// Collect a project, its pages and their assets from a store.
    ///
    /// # Errors
    ///
    /// - [`FolioError::ProjectNotFound`] if the project is not stored.
    /// - Store and codec errors from loading documents.
    /// - Under [`ExportPolicy::Strict`]: [`FolioError::DanglingPageReference`]
    ///   for a missing page or a button link to one, and
    ///   [`FolioError::AssetResolution`] for an image that does not resolve.
    pub async fn assemble(
        store: &dyn ProjectStore,
        project_id: &ProjectId,
        assets: &dyn AssetResolver,
        policy: ExportPolicy,
    ) -> FolioResult<Self> {
        let project = store
            .load_project(project_id)
            .await?
            .ok_or_else(|| FolioError::ProjectNotFound(project_id.to_string()))?;

        let mut pages = Vec::new();
        for page_id in &project.page_ids {
            if let Some(page) = store.load_page(project_id, page_id).await? {
                pages.push(page);
            }
        }

        let report = ProjectReport::build(&project, &pages);
        if policy == ExportPolicy::Strict {
            let missing = report
                .dangling_pages
                .first()
                .or_else(|| report.unresolved_links.first().map(|link| &link.target));
            if let Some(page) = missing {
                return Err(FolioError::DanglingPageReference {
                    project: project_id.to_string(),
                    page: page.to_string(),
                });
            }
        } else {
            report.log_warnings();
        }

        let mut bundle = Self::new(project);
        for page in pages {
            if report.is_navigable(&page.id) {
                bundle.pages.insert(page.id.clone(), page);
            }
        }

        let keys: Vec<String> = bundle.image_keys().map(str::to_string).collect();
        for key in keys {
            match assets.resolve(project_id, &key).source() {
                Some(reference) => {
                    bundle.assets.insert(key, reference.to_string());
                }
                None if policy == ExportPolicy::Strict => {
                    return Err(FolioError::AssetResolution(format!(
                        "asset '{key}' of project {project_id} not found"
                    )));
                }
                None => tracing::warn!("Asset {key} of project {project_id} not found; skipping"),
            }
        }

        tracing::info!(
            "Assembled bundle for project {project_id}: {} pages, {} assets",
            bundle.pages.len(),
            bundle.assets.len()
        );
        Ok(bundle)
    }

    /// Image keys referenced by the bundled pages, excluding inline data
    /// URIs. Each key appears once.
    pub fn image_keys(&self) -> impl Iterator<Item = &str> {
        let mut seen = std::collections::BTreeSet::new();
        self.pages
            .values()
            .flat_map(|page| page.items())
            .filter(|item| item.kind == WidgetKind::Image)
            .filter_map(|item| item.properties.get_str("imagePath"))
            .filter(|key| !key.is_empty() && !is_data_uri(key))
            .filter(move |key| seen.insert(*key))
    }

    /// Consistency report for the bundled documents.
    #[must_use]
    pub fn report(&self) -> ProjectReport {
        ProjectReport::build(&self.project, self.pages.values())
    }

    /// Resolver over the bundled assets.
    #[must_use]
    pub fn asset_resolver(&self) -> BundleAssets {
        BundleAssets::new(self.assets.clone())
    }

    /// Memory store holding the bundled project and pages.
    #[must_use]
    pub fn into_store(self) -> MemoryStore {
        MemoryStore::from_documents([self.project], self.pages.into_values())
    }

    /// Save the project and every page into `store`.
    ///
    /// # Errors
    ///
    /// Returns the first store error; documents saved before it stay saved.
    pub async fn save_into(&self, store: &dyn ProjectStore) -> FolioResult<()> {
        for page in self.pages.values() {
            store.save_page(page).await?;
        }
        store.save_project(&self.project).await
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BundleWire {
    project: Value,
    pages: Map<String, Value>,
    assets: BTreeMap<String, String>,
    exported_at: String,
    version: String,
}

impl JsonDocument for Bundle {
    fn ensure_encodable(&self) -> FolioResult<()> {
        self.project.ensure_encodable()?;
        self.pages.values().try_for_each(JsonDocument::ensure_encodable)
    }

    fn encode(&self) -> Value {
        let pages: Map<String, Value> = self
            .pages
            .iter()
            .map(|(id, page)| (id.to_string(), page.encode()))
            .collect();
        json!({
            "project": self.project.encode(),
            "pages": pages,
            "assets": self.assets,
            "exportedAt": format_timestamp(&self.exported_at),
            "version": self.version,
        })
    }

    fn decode(value: &Value) -> FolioResult<Self> {
        let wire = BundleWire::deserialize(value)
            .map_err(|e| FolioError::MalformedDocument(format!("bundle: {e}")))?;
        if wire.version.split('.').next() != BUNDLE_FORMAT_VERSION.split('.').next() {
            return Err(FolioError::MalformedDocument(format!(
                "unsupported bundle version {}",
                wire.version
            )));
        }

        let project = Project::decode(&wire.project)?;
        let mut pages = BTreeMap::new();
        for (key, raw) in &wire.pages {
            let page = Page::decode(raw)?;
            if page.id.as_str() != key {
                return Err(FolioError::MalformedDocument(format!(
                    "bundle page entry '{key}' holds page {}",
                    page.id
                )));
            }
            pages.insert(page.id.clone(), page);
        }

        Ok(Self {
            project,
            pages,
            assets: wire.assets,
            exported_at: parse_timestamp("bundle exportedAt", &wire.exported_at)?,
            version: wire.version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::NoAssets;
    use crate::geometry::Size;
    use crate::item::CanvasItem;

    const LOGO: &str = "data:image/png;base64,iVBORw0KGgo=";

    fn site() -> (Project, Page, Page) {
        let mut project = Project::new("Site").with_id("site");
        let mut home = Page::new("Home", project.id.clone(), Size::new(800.0, 600.0)).with_id("home");
        let about = Page::new("About", project.id.clone(), Size::new(800.0, 600.0)).with_id("about");
        home.add_item(CanvasItem::new(WidgetKind::Button).with_link("about"))
            .expect("add");
        home.add_item(CanvasItem::new(WidgetKind::Image).with_property("imagePath", "logo.png"))
            .expect("add");
        project.page_ids = vec![home.id.clone(), about.id.clone()];
        (project, home, about)
    }

    fn logo_assets() -> BundleAssets {
        BundleAssets::new(BTreeMap::from([("logo.png".to_string(), LOGO.to_string())]))
    }

    #[tokio::test]
    async fn test_assemble_collects_pages_and_assets() {
        let (project, home, about) = site();
        let store = MemoryStore::from_documents([project.clone()], [home, about]);
        let bundle = Bundle::assemble(&store, &project.id, &logo_assets(), ExportPolicy::Strict)
            .await
            .expect("assemble");
        assert_eq!(bundle.pages.len(), 2);
        assert_eq!(bundle.assets.get("logo.png").map(String::as_str), Some(LOGO));
        assert_eq!(bundle.version, BUNDLE_FORMAT_VERSION);
    }

    #[tokio::test]
    async fn test_lenient_skips_dangling_pages_and_assets() {
        let (mut project, home, about) = site();
        project.page_ids.push(PageId::from("missing"));
        let store = MemoryStore::from_documents([project.clone()], [home, about]);
        let bundle = Bundle::assemble(&store, &project.id, &NoAssets, ExportPolicy::Lenient)
            .await
            .expect("assemble");
        assert_eq!(bundle.pages.len(), 2);
        assert!(bundle.assets.is_empty());
        assert_eq!(bundle.report().dangling_pages, vec![PageId::from("missing")]);
    }

    #[tokio::test]
    async fn test_strict_rejects_dangling_page() {
        let (project, home, _) = site();
        let store = MemoryStore::from_documents([project.clone()], [home]);
        let result = Bundle::assemble(&store, &project.id, &logo_assets(), ExportPolicy::Strict).await;
        assert!(matches!(
            result,
            Err(FolioError::DanglingPageReference { page, .. }) if page == "about"
        ));
    }

    #[tokio::test]
    async fn test_strict_rejects_unresolved_link() {
        let (mut project, mut home, about) = site();
        home.push_item(CanvasItem::bare("broken", WidgetKind::Button).with_link("nowhere"))
            .expect("push");
        project.page_ids = vec![home.id.clone(), about.id.clone()];
        let store = MemoryStore::from_documents([project.clone()], [home, about]);
        let result = Bundle::assemble(&store, &project.id, &logo_assets(), ExportPolicy::Strict).await;
        assert!(matches!(
            result,
            Err(FolioError::DanglingPageReference { page, .. }) if page == "nowhere"
        ));
    }

    #[tokio::test]
    async fn test_strict_rejects_missing_asset() {
        let (project, home, about) = site();
        let store = MemoryStore::from_documents([project.clone()], [home, about]);
        let result = Bundle::assemble(&store, &project.id, &NoAssets, ExportPolicy::Strict).await;
        assert!(matches!(result, Err(FolioError::AssetResolution(_))));
    }

    #[tokio::test]
    async fn test_assemble_unknown_project() {
        let store = MemoryStore::new();
        let result =
            Bundle::assemble(&store, &ProjectId::from("nope"), &NoAssets, ExportPolicy::Lenient).await;
        assert!(matches!(result, Err(FolioError::ProjectNotFound(_))));
    }

    #[test]
    fn test_json_round_trip() {
        let (project, home, about) = site();
        let bundle = Bundle::new(project)
            .with_page(home)
            .with_page(about)
            .with_asset("logo.png", LOGO);
        let text = bundle.to_json_string().expect("encode");
        assert_eq!(Bundle::from_json_str(&text).expect("decode"), bundle);
    }

    #[test]
    fn test_page_key_mismatch_is_malformed() {
        let (project, home, _) = site();
        let mut doc = Bundle::new(project).with_page(home).encode();
        let page = doc["pages"]["home"].take();
        doc["pages"] = json!({ "elsewhere": page });
        assert!(matches!(Bundle::decode(&doc), Err(FolioError::MalformedDocument(_))));
    }

    #[test]
    fn test_missing_sections_are_malformed() {
        let (project, home, _) = site();
        let doc = Bundle::new(project).with_page(home).encode();
        for field in ["pages", "assets"] {
            let mut truncated = doc.clone();
            truncated.as_object_mut().expect("object").remove(field);
            assert!(
                matches!(Bundle::decode(&truncated), Err(FolioError::MalformedDocument(_))),
                "missing {field} must not decode"
            );
        }
    }

    #[test]
    fn test_unsupported_version() {
        let (project, _, _) = site();
        let mut doc = Bundle::new(project).encode();
        doc["version"] = json!("2.0");
        assert!(matches!(Bundle::decode(&doc), Err(FolioError::MalformedDocument(_))));
        doc["version"] = json!("1.3");
        assert!(Bundle::decode(&doc).is_ok());
    }

    #[test]
    fn test_image_keys_skip_inline_and_duplicates() {
        let (project, mut home, _) = site();
        home.add_item(CanvasItem::new(WidgetKind::Image).with_property("imagePath", "logo.png"))
            .expect("add");
        home.add_item(CanvasItem::new(WidgetKind::Image).with_property("imagePath", LOGO))
            .expect("add");
        let bundle = Bundle::new(project).with_page(home);
        assert_eq!(bundle.image_keys().collect::<Vec<_>>(), vec!["logo.png"]);
    }

    #[test]
    fn test_into_store() {
        let (project, home, about) = site();
        let bundle = Bundle::new(project).with_page(home).with_page(about);
        assert_eq!(bundle.into_store().page_count(), 2);
    }
}
