//! Canvas items - the positioned, styled widgets placed on a page.

use crate::color::Color;
use crate::error::{FolioError, FolioResult};
use crate::geometry::{Offset, Rect, Size};
use crate::ids::{ItemId, PageId};
use crate::properties::{Properties, PropertyValue};
use crate::widget::{WidgetKind, WidgetProps};

/// Smallest width or height an item can be resized to.
pub const MIN_ITEM_EXTENT: f64 = 50.0;

/// A widget instance on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasItem {
    /// Identifier, unique within the owning page.
    pub id: ItemId,
    /// Widget kind.
    pub kind: WidgetKind,
    /// Top-left corner in page coordinates.
    pub position: Offset,
    /// Width and height.
    pub size: Size,
    /// Stored properties, exactly as written.
    pub properties: Properties,
    /// Stacking key; higher paints later. Not required to be unique.
    pub z_index: i64,
    /// Opacity in `[0, 1]`; 0 hides the item.
    pub opacity: f64,
    /// Page a button navigates to when pressed.
    pub linked_page_id: Option<PageId>,
}

impl CanvasItem {
    /// Create a new item of `kind` with its default size and properties.
    #[must_use]
    pub fn new(kind: WidgetKind) -> Self {
        Self {
            id: ItemId::generate(),
            kind,
            position: Offset::ZERO,
            size: kind.default_size(),
            properties: kind.default_properties(),
            z_index: 0,
            opacity: 1.0,
            linked_page_id: None,
        }
    }

    /// Create an item with an explicit id and no properties.
    #[must_use]
    pub fn bare(id: impl Into<ItemId>, kind: WidgetKind) -> Self {
        Self {
            id: id.into(),
            properties: Properties::new(),
            ..Self::new(kind)
        }
    }

    /// Set the id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<ItemId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the position.
    #[must_use]
    pub fn with_position(mut self, position: Offset) -> Self {
        self.position = position;
        self
    }

    /// Set the size.
    #[must_use]
    pub fn with_size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    /// Set the z-index.
    #[must_use]
    pub fn with_z_index(mut self, z_index: i64) -> Self {
        self.z_index = z_index;
        self
    }

    /// Set the opacity (clamped to `[0, 1]`).
    #[must_use]
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Link the item to a page.
    #[must_use]
    pub fn with_link(mut self, page: impl Into<PageId>) -> Self {
        self.linked_page_id = Some(page.into());
        self
    }

    /// Set a property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key, value);
        self
    }

    /// The item's bounding box.
    #[must_use]
    pub fn frame(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }

    /// Check if a page-local point is within this item.
    #[must_use]
    pub fn contains_point(&self, point: Offset) -> bool {
        self.frame().contains(point)
    }

    /// Whether the item takes part in painting and hit testing.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0
    }

    /// Typed properties with defaults applied.
    #[must_use]
    pub fn resolve(&self) -> WidgetProps {
        WidgetProps::resolve(self.kind, &self.properties)
    }

    /// Multiply a resolved color's alpha by this item's opacity.
    #[must_use]
    pub fn composite(&self, color: Color) -> Color {
        color.with_opacity(self.opacity)
    }

    /// Check that every number on the item can be written as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::InvalidOperation`] naming the first NaN or
    /// infinite field or property.
    pub fn ensure_finite(&self) -> FolioResult<()> {
        let geometry = [
            ("position.dx", self.position.dx),
            ("position.dy", self.position.dy),
            ("size.width", self.size.width),
            ("size.height", self.size.height),
            ("opacity", self.opacity),
        ];
        let field = geometry
            .iter()
            .find(|(_, value)| !value.is_finite())
            .map(|(name, _)| *name)
            .or_else(|| self.properties.first_non_finite());
        match field {
            Some(field) => Err(FolioError::InvalidOperation(format!(
                "item {}: {field} must be finite",
                self.id
            ))),
            None => Ok(()),
        }
    }
}
