//! Draw-list construction.
//!
//! A page renders to an ordered list of draw commands, back to front:
//!
//! 1. items with `opacity == 0` are dropped
//! 2. survivors are stable-sorted by z-index, so equal z-indices keep list
//!    order
//! 3. each item's properties are resolved against its kind's defaults and
//!    mapped to a [`Primitive`]
//!
//! Item opacity is carried on the command and multiplies the alpha of each
//! color the primitive paints. It never blends across items.

use folio_core::{
    AssetResolver, CanvasItem, Color, ItemId, Offset, Page, PageId, ProjectId, Rect,
    ResolvedAsset, Size, WidgetKind, WidgetProps,
};
use serde::Serialize;

use crate::image::{inspect_data_uri, ImageInfo};

/// Where the page is being shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Editing canvas: inputs are preview-only.
    Editor,
    /// Viewer or exported runtime: inputs accept typing.
    #[default]
    Runtime,
}

/// Everything the renderer needs beyond the page itself.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    /// Project the page belongs to, for asset lookups.
    pub project_id: &'a ProjectId,
    /// Asset resolver for image items.
    pub assets: &'a dyn AssetResolver,
    /// Editor or runtime.
    pub mode: RenderMode,
    /// Pages a button may navigate to. `None` accepts every link.
    pub navigable: Option<&'a [PageId]>,
}

impl<'a> RenderContext<'a> {
    /// Runtime context accepting every link.
    #[must_use]
    pub fn new(project_id: &'a ProjectId, assets: &'a dyn AssetResolver) -> Self {
        Self {
            project_id,
            assets,
            mode: RenderMode::Runtime,
            navigable: None,
        }
    }

    /// Set the mode.
    #[must_use]
    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    /// Restrict button links to `pages`.
    #[must_use]
    pub fn with_navigable(mut self, pages: &'a [PageId]) -> Self {
        self.navigable = Some(pages);
        self
    }

    fn link_resolves(&self, target: &PageId) -> bool {
        self.navigable.is_none_or(|pages| pages.contains(target))
    }
}

impl std::fmt::Debug for RenderContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderContext")
            .field("project_id", &self.project_id)
            .field("mode", &self.mode)
            .field("navigable", &self.navigable)
            .finish_non_exhaustive()
    }
}

/// What pressing a button does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "page", rename_all = "lowercase")]
pub enum ButtonAction {
    /// Navigate to the page.
    Navigate(PageId),
    /// Nothing.
    Inert,
}

/// Image content for an image primitive.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ImageSource {
    /// Embedded image.
    Embedded {
        /// The data URI.
        uri: String,
        /// What probing found.
        info: ImageInfo,
    },
    /// External image; not fetched by the renderer.
    Url {
        /// The URL.
        url: String,
    },
    /// Placeholder glyph for a missing or broken image.
    Placeholder,
}

/// A visual primitive, with every property resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Primitive {
    /// Text centered in the frame.
    Text {
        /// Content.
        text: String,
        /// Font size in pixels.
        font_size: f64,
        /// Bold weight.
        bold: bool,
        /// Italic style.
        italic: bool,
        /// Text color.
        color: Color,
    },
    /// Filled rounded rectangle with a label.
    Button {
        /// Label.
        label: String,
        /// Label font size.
        font_size: f64,
        /// Fill color.
        fill: Color,
        /// Label color.
        text_color: Color,
        /// Corner radius.
        corner_radius: f64,
        /// Press behavior.
        action: ButtonAction,
    },
    /// Image scaled to cover the frame.
    Image {
        /// Content.
        source: ImageSource,
        /// Corner radius.
        corner_radius: f64,
    },
    /// Filled box for containers and cards.
    Panel {
        /// Fill color.
        fill: Color,
        /// Corner radius.
        corner_radius: f64,
        /// Border color and width.
        border: Option<(Color, f64)>,
        /// Shadow elevation; zero for flat boxes.
        elevation: f64,
        /// Centered label.
        label: Option<String>,
        /// Label color.
        text_color: Color,
    },
    /// Text-entry affordance.
    Input {
        /// Placeholder text.
        hint: String,
        /// Font size.
        font_size: f64,
        /// Text color.
        text_color: Color,
        /// Border color.
        border_color: Color,
        /// Fill color.
        fill: Color,
        /// Whether typing is accepted. Typed values are never stored.
        live: bool,
    },
}

/// One item to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawCommand {
    /// Source item.
    pub item_id: ItemId,
    /// Source item kind.
    pub kind: WidgetKind,
    /// Frame in page coordinates.
    pub frame: Rect,
    /// Item opacity in `(0, 1]`.
    pub opacity: f64,
    /// What to draw.
    pub primitive: Primitive,
}

impl DrawCommand {
    /// A primitive color with the item opacity applied.
    #[must_use]
    pub fn composite(&self, color: Color) -> Color {
        color.with_opacity(self.opacity)
    }
}

/// A problem found while rendering; the page still renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RenderWarning {
    /// A button links to a page that cannot be navigated to.
    UnresolvedLink {
        /// The button.
        item_id: ItemId,
        /// Missing target.
        target: PageId,
    },
    /// An image asset could not be found.
    AssetUnavailable {
        /// The image item.
        item_id: ItemId,
        /// Asset key.
        key: String,
    },
    /// An embedded image could not be decoded.
    ImageDecode {
        /// The image item.
        item_id: ItemId,
        /// Decoder message.
        reason: String,
    },
}

/// Draw commands for one page, back to front.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawList {
    /// Rendered page.
    pub page_id: PageId,
    /// Canvas size.
    pub page_size: Size,
    /// Fill behind everything.
    pub background: Color,
    /// Commands in paint order.
    pub commands: Vec<DrawCommand>,
    /// Soft errors found while rendering.
    pub warnings: Vec<RenderWarning>,
}

impl DrawList {
    /// Topmost command whose frame contains `point`.
    #[must_use]
    pub fn hit_test(&self, point: Offset) -> Option<&DrawCommand> {
        self.commands.iter().rev().find(|cmd| cmd.frame.contains(point))
    }

    /// Number of commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether nothing is drawn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Item ids in paint order.
    pub fn item_ids(&self) -> impl Iterator<Item = &ItemId> {
        self.commands.iter().map(|cmd| &cmd.item_id)
    }
}

/// Render `page` to a draw list.
#[must_use]
pub fn render_page(page: &Page, ctx: &RenderContext<'_>) -> DrawList {
    let mut warnings = Vec::new();
    let commands = page
        .paint_order()
        .into_iter()
        .map(|item| DrawCommand {
            item_id: item.id.clone(),
            kind: item.kind,
            frame: item.frame(),
            opacity: item.opacity,
            primitive: resolve_primitive(item, ctx, &mut warnings),
        })
        .collect();

    for warning in &warnings {
        tracing::warn!("Page {}: {warning:?}", page.id);
    }

    DrawList {
        page_id: page.id.clone(),
        page_size: page.page_size,
        background: page.background_color,
        commands,
        warnings,
    }
}

fn resolve_primitive(
    item: &CanvasItem,
    ctx: &RenderContext<'_>,
    warnings: &mut Vec<RenderWarning>,
) -> Primitive {
    match item.resolve() {
        WidgetProps::Text(p) => Primitive::Text {
            text: p.text,
            font_size: p.font_size,
            bold: p.is_bold,
            italic: p.is_italic,
            color: p.color,
        },
        WidgetProps::Button(p) => Primitive::Button {
            label: p.text,
            font_size: p.font_size,
            fill: p.background_color,
            text_color: p.text_color,
            corner_radius: p.border_radius,
            action: button_action(item, ctx, warnings),
        },
        WidgetProps::Image(p) => Primitive::Image {
            source: image_source(item, p.image_path.as_deref(), ctx, warnings),
            corner_radius: p.border_radius,
        },
        WidgetProps::Container(p) | WidgetProps::Card(p) => Primitive::Panel {
            fill: p.background_color,
            corner_radius: p.border_radius,
            border: p
                .border_color
                .filter(|_| p.border_width > 0.0)
                .map(|color| (color, p.border_width)),
            elevation: p.elevation,
            label: p.label,
            text_color: p.text_color,
        },
        WidgetProps::Input(p) => Primitive::Input {
            hint: p.hint_text,
            font_size: p.font_size,
            text_color: p.text_color,
            border_color: p.border_color,
            fill: p.background_color,
            live: ctx.mode == RenderMode::Runtime,
        },
    }
}

fn button_action(
    item: &CanvasItem,
    ctx: &RenderContext<'_>,
    warnings: &mut Vec<RenderWarning>,
) -> ButtonAction {
    match &item.linked_page_id {
        None => ButtonAction::Inert,
        Some(target) if ctx.link_resolves(target) => ButtonAction::Navigate(target.clone()),
        Some(target) => {
            warnings.push(RenderWarning::UnresolvedLink {
                item_id: item.id.clone(),
                target: target.clone(),
            });
            ButtonAction::Inert
        }
    }
}

fn image_source(
    item: &CanvasItem,
    key: Option<&str>,
    ctx: &RenderContext<'_>,
    warnings: &mut Vec<RenderWarning>,
) -> ImageSource {
    let Some(key) = key else {
        return ImageSource::Placeholder;
    };
    match ctx.assets.resolve(ctx.project_id, key) {
        ResolvedAsset::DataUri(uri) => match inspect_data_uri(&uri) {
            Ok(info) => ImageSource::Embedded { uri, info },
            Err(e) => {
                warnings.push(RenderWarning::ImageDecode {
                    item_id: item.id.clone(),
                    reason: e.to_string(),
                });
                ImageSource::Placeholder
            }
        },
        ResolvedAsset::Url(url) => ImageSource::Url { url },
        ResolvedAsset::NotFound => {
            warnings.push(RenderWarning::AssetUnavailable {
                item_id: item.id.clone(),
                key: key.to_string(),
            });
            ImageSource::Placeholder
        }
    }
}
