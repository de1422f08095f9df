//! Document Flow Integration Tests
//!
//! Exercises the path a document takes between processes:
//! - Editing a project and persisting it to a filesystem store
//! - Assembling and serializing a bundle
//! - Decoding the bundle into a fresh store and navigating it

use std::collections::BTreeMap;
use std::sync::Arc;

use folio_core::{
    Activation, Bundle, BundleAssets, CanvasItem, Color, ExportPolicy, FolioError,
    FsProjectStore, ItemId, JsonDocument, Offset, Page, PageId, Project, ProjectId,
    ProjectStore, Runtime, Size, WidgetKind,
};
use proptest::prelude::*;
use serde_json::json;

const LOGO: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

/// Build a two-page site: home links to about, about shows the logo.
fn build_site() -> (Project, Page, Page) {
    let mut project = Project::new("Portfolio").with_id("portfolio");
    let mut home = project.add_page("Home");
    let mut about = project.add_page("About");

    home.add_item(
        CanvasItem::new(WidgetKind::Text)
            .with_id("title")
            .with_property("text", "Welcome")
            .with_property("color", Color::from_argb(255, 10, 20, 30)),
    )
    .expect("add title");
    let button = home
        .add_item(CanvasItem::new(WidgetKind::Button).with_id("more"))
        .expect("add button");
    home.set_link(&button, Some(about.id.clone())).expect("link");
    home.move_item(&button, Offset::new(700.0, 580.0)).expect("move");

    about
        .add_item(
            CanvasItem::new(WidgetKind::Image)
                .with_id("logo")
                .with_property("imagePath", "logo.png"),
        )
        .expect("add image");
    about
        .add_item(CanvasItem::new(WidgetKind::Card).with_id("card").with_opacity(0.5))
        .expect("add card");

    (project, home, about)
}

#[tokio::test]
async fn test_fs_store_to_bundle_to_runtime() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FsProjectStore::new(dir.path());
    let (project, home, about) = build_site();
    store.save_project(&project).await.expect("save project");
    store.save_page(&home).await.expect("save home");
    store.save_page(&about).await.expect("save about");

    let assets = BundleAssets::new(BTreeMap::from([("logo.png".to_string(), LOGO.to_string())]));
    let bundle = Bundle::assemble(&store, &project.id, &assets, ExportPolicy::Strict)
        .await
        .expect("assemble");
    let text = bundle.to_json_string().expect("encode bundle");

    // Fresh state: nothing shared with the editor side but the text.
    let decoded = Bundle::from_json_str(&text).expect("decode bundle");
    assert_eq!(decoded, bundle);
    assert_eq!(decoded.pages.get(&home.id), Some(&home));
    assert_eq!(decoded.pages.get(&about.id), Some(&about));

    let mut runtime = Runtime::new(Arc::new(decoded.into_store()));
    let report = runtime.open_project(&project.id).await.expect("open");
    assert!(report.is_clean());
    assert_eq!(runtime.state().current_page_id, Some(home.id.clone()));

    let outcome = runtime.activate(&ItemId::from("more")).await.expect("press");
    assert_eq!(outcome, Activation::Navigated(about.id.clone()));
    assert_eq!(runtime.state().history, vec![home.id.clone()]);

    runtime.go_back().await.expect("back");
    assert_eq!(runtime.state().current_page_id, Some(home.id));
}

#[tokio::test]
async fn test_dangling_page_reference() {
    let (mut project, home, _) = build_site();
    project.page_ids = vec![home.id.clone(), PageId::from("missing")];
    let bundle = Bundle::new(project.clone()).with_page(home);

    let mut runtime = Runtime::new(Arc::new(bundle.into_store()));
    let report = runtime.open_project(&project.id).await.expect("project still loads");
    assert_eq!(report.dangling_pages, vec![PageId::from("missing")]);

    let err = runtime
        .navigate_to(&PageId::from("missing"))
        .await
        .expect_err("missing page");
    assert!(matches!(err, FolioError::DanglingPageReference { ref page, .. } if page == "missing"));
    assert!(err.is_recoverable());
}

#[test]
fn test_unknown_widget_type_rejects_page() {
    let (_, home, _) = build_site();
    let mut doc = home.encode();
    doc["canvasItems"][0]["type"] = json!("bogus");
    assert!(matches!(
        Page::decode(&doc),
        Err(FolioError::UnknownWidgetType(tag)) if tag == "bogus"
    ));
}

#[test]
fn test_editor_document_shape() {
    let doc = json!({
        "id": "p1",
        "name": "Landing",
        "projectId": "proj",
        "createdAt": "2024-05-01T12:00:00.000",
        "updatedAt": "2024-05-02T08:30:15.123456",
        "pageSize": { "width": 1024, "height": 768 },
        "backgroundColor": 4294967295_u32,
        "canvasItems": [{
            "id": "b1",
            "type": "button",
            "position": { "dx": 40, "dy": 60.5 },
            "size": { "width": 150, "height": 50 },
            "properties": {
                "text": "Next",
                "backgroundColor": 4280391411_u32,
                "fontSize": 18.0,
                "custom": 7
            },
            "zIndex": 1,
            "opacity": 0.9,
            "linkedPageId": "p2"
        }]
    });
    let page = Page::decode(&doc).expect("decode");
    let item = page.item(&ItemId::from("b1")).expect("item");
    assert_eq!(
        item.properties.get_color("backgroundColor"),
        Some(Color::from_packed(4_280_391_411))
    );
    assert_eq!(item.properties.get_f64("custom"), Some(7.0));
    assert_eq!(item.linked_page_id, Some(PageId::from("p2")));
    assert_eq!(page.page_size, Size::new(1024.0, 768.0));

    let again = Page::decode(&page.encode()).expect("re-decode");
    assert_eq!(again, page);
}

proptest! {
    #[test]
    fn prop_project_round_trip(
        name in "[A-Za-z ]{0,20}",
        pages in prop::collection::vec("[a-z0-9-]{1,12}", 0..10),
        width in 1.0f64..4000.0,
        height in 1.0f64..4000.0,
        path in "[a-z/]{0,24}",
    ) {
        let mut project = Project::new(name)
            .with_id(ProjectId::generate())
            .with_default_page_size(Size::new(width, height));
        project.page_ids = pages.into_iter().map(PageId::from).collect();
        project.project_path = path;
        let text = project.to_json_string().expect("encode");
        prop_assert_eq!(Project::from_json_str(&text).expect("decode"), project);
    }
}
