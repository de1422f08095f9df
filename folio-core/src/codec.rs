//! JSON wire format for projects, pages and canvas items.
//!
//! Decoding is total over well-formed input and fails with
//! [`FolioError::MalformedDocument`] otherwise. Widget kinds travel as
//! string tags; an unknown tag fails the whole decode with
//! [`FolioError::UnknownWidgetType`] instead of dropping the item.
//!
//! ```text
//! CanvasItem := { id, type, position: {dx, dy}, size: {width, height},
//!                 properties: {..}, zIndex, opacity, linkedPageId }
//! Page       := { id, name, projectId, createdAt, updatedAt, pageSize,
//!                 canvasItems: [CanvasItem], backgroundColor }
//! Project    := { id, name, createdAt, updatedAt, pageIds,
//!                 defaultPageSize, projectPath }
//! ```
//!
//! Only `zIndex`, `opacity` and `linkedPageId` may be omitted; every other
//! field is required. Encoding to text refuses NaN and infinite numbers,
//! which JSON cannot carry.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::color::Color;
use crate::error::{FolioError, FolioResult};
use crate::geometry::{Offset, Size};
use crate::ids::{ItemId, PageId, ProjectId};
use crate::item::CanvasItem;
use crate::page::Page;
use crate::project::Project;
use crate::properties::Properties;
use crate::widget::WidgetKind;

/// Bidirectional mapping between a model value and its JSON document.
pub trait JsonDocument: Sized {
    /// Encode to a JSON value.
    fn encode(&self) -> Value;

    /// Decode from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::MalformedDocument`] for missing or mistyped
    /// fields and [`FolioError::UnknownWidgetType`] for unknown widget tags.
    fn decode(value: &Value) -> FolioResult<Self>;

    /// Check that [`JsonDocument::encode`] will not lose data.
    ///
    /// JSON has no NaN or infinity, so such numbers would be written as
    /// null and fail to decode later.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::InvalidOperation`] naming the offending field.
    fn ensure_encodable(&self) -> FolioResult<()> {
        Ok(())
    }

    /// Encode to pretty-printed JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error from [`JsonDocument::ensure_encodable`], or if the
    /// value cannot be written as JSON.
    fn to_json_string(&self) -> FolioResult<String> {
        self.ensure_encodable()?;
        Ok(serde_json::to_string_pretty(&self.encode())?)
    }

    /// Decode from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::MalformedDocument`] for invalid JSON, plus any
    /// error from [`JsonDocument::decode`].
    fn from_json_str(json: &str) -> FolioResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::decode(&value)
    }
}

/// Format a timestamp as RFC 3339 in UTC, keeping sub-second precision.
#[must_use]
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse an ISO-8601 timestamp.
///
/// Accepts RFC 3339 with any offset, offset-less local timestamps with a
/// `T` or space separator, and bare dates. Offset-less values are taken as
/// UTC.
///
/// # Errors
///
/// Returns [`FolioError::MalformedDocument`] naming `field` for any other
/// input.
pub fn parse_timestamp(field: &str, raw: &str) -> FolioResult<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| {
            FolioError::MalformedDocument(format!("{field}: invalid ISO-8601 timestamp '{raw}'"))
        })
}

fn size_json(size: Size) -> Value {
    json!({ "width": size.width, "height": size.height })
}

fn malformed(context: &str, err: impl std::fmt::Display) -> FolioError {
    FolioError::MalformedDocument(format!("{context}: {err}"))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemWire {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    position: Offset,
    size: Size,
    properties: Map<String, Value>,
    #[serde(default)]
    z_index: Option<i64>,
    #[serde(default)]
    opacity: Option<f64>,
    #[serde(default)]
    linked_page_id: Option<String>,
}

impl JsonDocument for CanvasItem {
    fn ensure_encodable(&self) -> FolioResult<()> {
        self.ensure_finite()
    }

    fn encode(&self) -> Value {
        json!({
            "id": self.id.as_str(),
            "type": self.kind.tag(),
            "position": { "dx": self.position.dx, "dy": self.position.dy },
            "size": size_json(self.size),
            "properties": self.properties.to_json(),
            "zIndex": self.z_index,
            "opacity": self.opacity,
            "linkedPageId": self.linked_page_id.as_ref().map(PageId::as_str),
        })
    }

    fn decode(value: &Value) -> FolioResult<Self> {
        // Reject unknown kinds before anything else so they are never
        // reported as a generic shape error.
        if let Some(tag) = value.get("type").and_then(Value::as_str) {
            WidgetKind::from_tag(tag)?;
        }
        let wire = ItemWire::deserialize(value).map_err(|e| malformed("canvas item", e))?;
        let kind = WidgetKind::from_tag(&wire.kind)?;
        let properties = Properties::from_json(&wire.properties)
            .map_err(|e| malformed(&format!("canvas item {}", wire.id), e))?;

        let mut opacity = wire.opacity.unwrap_or(1.0);
        if !(0.0..=1.0).contains(&opacity) {
            tracing::warn!(
                "Canvas item {} has opacity {opacity} outside [0, 1]; clamping",
                wire.id
            );
            opacity = opacity.clamp(0.0, 1.0);
        }

        Ok(Self {
            id: ItemId::from(wire.id),
            kind,
            position: wire.position,
            size: wire.size,
            properties,
            z_index: wire.z_index.unwrap_or(0),
            opacity,
            linked_page_id: wire.linked_page_id.map(PageId::from),
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageWire {
    id: String,
    name: String,
    project_id: String,
    created_at: String,
    updated_at: String,
    page_size: Size,
    canvas_items: Vec<Value>,
    background_color: i64,
}

impl JsonDocument for Page {
    fn ensure_encodable(&self) -> FolioResult<()> {
        if !self.page_size.width.is_finite() || !self.page_size.height.is_finite() {
            return Err(FolioError::InvalidOperation(format!(
                "page {}: pageSize must be finite",
                self.id
            )));
        }
        self.items().iter().try_for_each(CanvasItem::ensure_finite)
    }

    fn encode(&self) -> Value {
        let items: Vec<Value> = self.items().iter().map(JsonDocument::encode).collect();
        json!({
            "id": self.id.as_str(),
            "name": self.name,
            "projectId": self.project_id.as_str(),
            "createdAt": format_timestamp(&self.created_at),
            "updatedAt": format_timestamp(&self.updated_at),
            "pageSize": size_json(self.page_size),
            "canvasItems": items,
            "backgroundColor": self.background_color.to_packed(),
        })
    }

    fn decode(value: &Value) -> FolioResult<Self> {
        let wire = PageWire::deserialize(value).map_err(|e| malformed("page", e))?;
        let context = format!("page {}", wire.id);

        let raw = wire.background_color;
        let background_color = Color::from_wire_int(raw).ok_or_else(|| {
            malformed(&context, format!("backgroundColor {raw} is not a packed color"))
        })?;

        let mut page = Page::new(wire.name, ProjectId::from(wire.project_id), wire.page_size)
            .with_id(wire.id)
            .with_background(background_color);
        page.created_at = parse_timestamp(&format!("{context} createdAt"), &wire.created_at)?;
        page.updated_at = parse_timestamp(&format!("{context} updatedAt"), &wire.updated_at)?;

        for (index, raw) in wire.canvas_items.iter().enumerate() {
            let item = CanvasItem::decode(raw).map_err(|e| match e {
                FolioError::MalformedDocument(msg) => {
                    malformed(&format!("{context} item #{index}"), msg)
                }
                other => other,
            })?;
            page.push_item(item).map_err(|e| malformed(&context, e))?;
        }
        Ok(page)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectWire {
    id: String,
    name: String,
    created_at: String,
    updated_at: String,
    page_ids: Vec<String>,
    default_page_size: Size,
    project_path: String,
}

impl JsonDocument for Project {
    fn ensure_encodable(&self) -> FolioResult<()> {
        let size = self.default_page_size;
        if size.width.is_finite() && size.height.is_finite() {
            Ok(())
        } else {
            Err(FolioError::InvalidOperation(format!(
                "project {}: defaultPageSize must be finite",
                self.id
            )))
        }
    }

    fn encode(&self) -> Value {
        let page_ids: Vec<&str> = self.page_ids.iter().map(PageId::as_str).collect();
        json!({
            "id": self.id.as_str(),
            "name": self.name,
            "createdAt": format_timestamp(&self.created_at),
            "updatedAt": format_timestamp(&self.updated_at),
            "pageIds": page_ids,
            "defaultPageSize": size_json(self.default_page_size),
            "projectPath": self.project_path,
        })
    }

    fn decode(value: &Value) -> FolioResult<Self> {
        let wire = ProjectWire::deserialize(value).map_err(|e| malformed("project", e))?;
        let context = format!("project {}", wire.id);
        let mut project = Project::new(wire.name)
            .with_id(wire.id)
            .with_default_page_size(wire.default_page_size);
        project.created_at = parse_timestamp(&format!("{context} createdAt"), &wire.created_at)?;
        project.updated_at = parse_timestamp(&format!("{context} updatedAt"), &wire.updated_at)?;
        project.page_ids = wire.page_ids.into_iter().map(PageId::from).collect();
        project.project_path = wire.project_path;
        Ok(project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::PropertyValue;
    use proptest::prelude::*;

    fn fixed_time() -> DateTime<Utc> {
        parse_timestamp("t", "2024-03-01T09:30:00.250Z").expect("timestamp")
    }

    fn sample_page() -> Page {
        let mut page = Page::new("Home", ProjectId::from("proj-1"), Size::new(800.0, 600.0))
            .with_id("home")
            .with_background(Color::from_packed(0xFFF5_F5F5));
        page.created_at = fixed_time();
        page.updated_at = fixed_time();
        page.push_item(
            CanvasItem::new(WidgetKind::Button)
                .with_id("go")
                .with_position(Offset::new(10.0, 20.5))
                .with_z_index(3)
                .with_opacity(0.5)
                .with_link("about"),
        )
        .expect("push");
        page.push_item(CanvasItem::bare("empty", WidgetKind::Card)).expect("push");
        page
    }

    #[test]
    fn test_item_wire_shape() {
        let item = CanvasItem::bare("t1", WidgetKind::Text)
            .with_position(Offset::new(1.0, 2.0))
            .with_size(Size::new(100.0, 50.0))
            .with_property("color", Color::BLACK)
            .with_property("text", "Hi");
        assert_eq!(
            item.encode(),
            json!({
                "id": "t1",
                "type": "text",
                "position": { "dx": 1.0, "dy": 2.0 },
                "size": { "width": 100.0, "height": 50.0 },
                "properties": { "color": 0xFF00_0000_u32, "text": "Hi" },
                "zIndex": 0,
                "opacity": 1.0,
                "linkedPageId": null,
            })
        );
    }

    #[test]
    fn test_item_defaults_on_decode() {
        let item = CanvasItem::decode(&json!({
            "id": "a",
            "type": "image",
            "position": { "dx": 0, "dy": 0 },
            "size": { "width": 60, "height": 60 },
            "properties": {},
        }))
        .expect("decode");
        assert_eq!(item.z_index, 0);
        assert!((item.opacity - 1.0).abs() < f64::EPSILON);
        assert!(item.linked_page_id.is_none());
        assert!(item.properties.is_empty());
    }

    #[test]
    fn test_unknown_widget_type() {
        let result = CanvasItem::decode(&json!({
            "id": "x",
            "type": "bogus",
            "position": { "dx": 0, "dy": 0 },
            "size": { "width": 60, "height": 60 },
            "properties": {},
        }));
        assert!(matches!(result, Err(FolioError::UnknownWidgetType(tag)) if tag == "bogus"));
    }

    #[test]
    fn test_unknown_widget_type_fails_whole_page() {
        let mut doc = sample_page().encode();
        doc["canvasItems"][1]["type"] = json!("carousel");
        assert!(matches!(
            Page::decode(&doc),
            Err(FolioError::UnknownWidgetType(_))
        ));
    }

    #[test]
    fn test_size_requires_both_numeric_fields() {
        let mut doc = sample_page().encode();
        doc["pageSize"] = json!({ "width": 800 });
        assert!(matches!(Page::decode(&doc), Err(FolioError::MalformedDocument(_))));
        doc["pageSize"] = json!({ "width": 800, "height": "tall" });
        assert!(matches!(Page::decode(&doc), Err(FolioError::MalformedDocument(_))));
    }

    #[test]
    fn test_invalid_date_is_malformed() {
        let mut doc = sample_page().encode();
        doc["createdAt"] = json!("yesterday");
        let err = Page::decode(&doc).expect_err("bad date");
        assert!(matches!(err, FolioError::MalformedDocument(msg) if msg.contains("createdAt")));
    }

    #[test]
    fn test_accepts_offsetless_timestamps() {
        let parsed = parse_timestamp("t", "2024-03-01T09:30:00.250").expect("local form");
        assert_eq!(parsed, fixed_time());
        let with_offset = parse_timestamp("t", "2024-03-01T11:30:00.250+02:00").expect("offset");
        assert_eq!(with_offset, fixed_time());
        assert!(parse_timestamp("t", "2024-03-01").is_ok());
        assert!(parse_timestamp("t", "03/01/2024").is_err());
    }

    #[test]
    fn test_page_round_trip() {
        let page = sample_page();
        assert_eq!(Page::decode(&page.encode()).expect("decode"), page);
    }

    #[test]
    fn test_empty_page_round_trip() {
        let mut page = Page::new("Blank", ProjectId::from("p"), Size::new(320.0, 480.0));
        page.created_at = fixed_time();
        let back = Page::from_json_str(&page.to_json_string().expect("encode")).expect("decode");
        assert_eq!(back, page);
        assert!(back.is_empty());
    }

    #[test]
    fn test_duplicate_item_ids_are_malformed() {
        let mut doc = sample_page().encode();
        doc["canvasItems"][1]["id"] = json!("go");
        assert!(matches!(Page::decode(&doc), Err(FolioError::MalformedDocument(_))));
    }

    #[test]
    fn test_project_round_trip() {
        let mut project = Project::new("Site").with_id("proj-1");
        project.created_at = fixed_time();
        project.updated_at = fixed_time();
        project.page_ids = vec![PageId::from("home"), PageId::from("about")];
        project.project_path = "/projects/site".to_string();
        let encoded = project.encode();
        assert_eq!(encoded["pageIds"], json!(["home", "about"]));
        assert_eq!(Project::decode(&encoded).expect("decode"), project);
    }

    #[test]
    fn test_missing_required_field_is_malformed() {
        let mut doc = sample_page().encode();
        doc.as_object_mut().expect("object").remove("projectId");
        assert!(matches!(Page::decode(&doc), Err(FolioError::MalformedDocument(_))));
    }

    #[test]
    fn test_every_required_page_field_is_enforced() {
        let doc = sample_page().encode();
        for field in ["canvasItems", "backgroundColor", "pageSize", "createdAt"] {
            let mut truncated = doc.clone();
            truncated.as_object_mut().expect("object").remove(field);
            assert!(
                matches!(Page::decode(&truncated), Err(FolioError::MalformedDocument(_))),
                "page without {field} must not decode"
            );
        }
    }

    #[test]
    fn test_every_required_project_field_is_enforced() {
        let doc = Project::new("Site").with_id("proj-1").encode();
        for field in ["pageIds", "defaultPageSize", "projectPath", "updatedAt"] {
            let mut truncated = doc.clone();
            truncated.as_object_mut().expect("object").remove(field);
            assert!(
                matches!(Project::decode(&truncated), Err(FolioError::MalformedDocument(_))),
                "project without {field} must not decode"
            );
        }
    }

    #[test]
    fn test_item_properties_are_required() {
        let result = CanvasItem::decode(&json!({
            "id": "a",
            "type": "text",
            "position": { "dx": 0, "dy": 0 },
            "size": { "width": 60, "height": 60 },
        }));
        assert!(matches!(result, Err(FolioError::MalformedDocument(_))));
    }

    #[test]
    fn test_non_finite_values_do_not_encode() {
        let item = CanvasItem::bare("t", WidgetKind::Text).with_property("fontSize", f64::INFINITY);
        let err = item.to_json_string().expect_err("infinite font size");
        assert!(matches!(err, FolioError::InvalidOperation(msg) if msg.contains("fontSize")));

        let mut page = sample_page();
        page.item_mut(&ItemId::from("go")).expect("go").position = Offset::new(f64::NAN, 1.0);
        assert!(matches!(
            page.to_json_string(),
            Err(FolioError::InvalidOperation(_))
        ));

        let project = Project::new("Odd").with_default_page_size(Size::new(f64::INFINITY, 600.0));
        assert!(project.to_json_string().is_err());
    }

    #[test]
    fn test_signed_background_color() {
        let mut doc = sample_page().encode();
        doc["backgroundColor"] = json!(-1);
        assert_eq!(Page::decode(&doc).expect("decode").background_color, Color::WHITE);
    }

    fn arb_value() -> impl Strategy<Value = PropertyValue> {
        prop_oneof![
            Just(PropertyValue::Null),
            any::<bool>().prop_map(PropertyValue::Bool),
            any::<i64>().prop_map(PropertyValue::Integer),
            (-1.0e9f64..1.0e9f64).prop_map(PropertyValue::Float),
            "[a-zA-Z0-9 ]{0,12}".prop_map(PropertyValue::String),
            any::<u32>().prop_map(|c| PropertyValue::Color(Color::from_packed(c))),
        ]
    }

    fn arb_item() -> impl Strategy<Value = CanvasItem> {
        (
            "[a-z0-9]{1,8}",
            prop::sample::select(WidgetKind::ALL.to_vec()),
            (-100.0f64..2000.0, -100.0f64..2000.0),
            (50.0f64..500.0, 50.0f64..500.0),
            prop::collection::vec(
                (
                    prop_oneof![
                        Just("color".to_string()),
                        Just("backgroundColor".to_string()),
                        "[a-z]{1,10}",
                    ],
                    arb_value(),
                ),
                0..6,
            ),
            -10i64..10,
            0.0f64..=1.0,
            prop::option::of("[a-z]{1,6}"),
        )
            .prop_map(|(id, kind, (dx, dy), (w, h), props, z, opacity, link)| {
                let mut item = CanvasItem::bare(id.as_str(), kind)
                    .with_position(Offset::new(dx, dy))
                    .with_size(Size::new(w, h))
                    .with_z_index(z)
                    .with_opacity(opacity);
                for (key, value) in props {
                    item.properties.insert(key, value);
                }
                item.linked_page_id = link.map(PageId::from);
                item
            })
    }

    proptest! {
        #[test]
        fn prop_item_round_trip(item in arb_item()) {
            prop_assert_eq!(CanvasItem::decode(&item.encode()).expect("decode"), item);
        }

        #[test]
        fn prop_page_round_trip(items in prop::collection::vec(arb_item(), 0..8), secs in 0i64..4_000_000_000) {
            let mut page = Page::new("P", ProjectId::from("proj"), Size::new(800.0, 600.0)).with_id("p");
            page.created_at = Utc.timestamp_opt(secs, 0).single().expect("valid timestamp");
            for (index, item) in items.into_iter().enumerate() {
                page.push_item(item.with_id(format!("item-{index}"))).expect("unique ids");
            }
            let text = page.to_json_string().expect("encode");
            prop_assert_eq!(Page::from_json_str(&text).expect("decode"), page);
        }
    }
}
