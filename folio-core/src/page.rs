//! Pages - ordered collections of canvas items.
//!
//! The item list is kept in insertion order. Paint order is derived from it
//! by a stable sort on z-index, so items sharing a z-index keep their
//! relative list order.

use chrono::{DateTime, Utc};

use crate::color::Color;
use crate::error::{FolioError, FolioResult};
use crate::geometry::{clamp_position, Offset, Size};
use crate::ids::{ItemId, PageId, ProjectId};
use crate::item::{CanvasItem, MIN_ITEM_EXTENT};
use crate::properties::PropertyValue;

/// A page of a project.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Unique identifier.
    pub id: PageId,
    /// Display name.
    pub name: String,
    /// Owning project.
    pub project_id: ProjectId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last save time.
    pub updated_at: DateTime<Utc>,
    /// Canvas size in pixels.
    pub page_size: Size,
    /// Fill behind all items.
    pub background_color: Color,
    /// Items in insertion order.
    canvas_items: Vec<CanvasItem>,
}

impl Page {
    /// Create an empty page.
    #[must_use]
    pub fn new(name: impl Into<String>, project_id: ProjectId, page_size: Size) -> Self {
        let now = Utc::now();
        Self {
            id: PageId::generate(),
            name: name.into(),
            project_id,
            created_at: now,
            updated_at: now,
            page_size,
            background_color: Color::WHITE,
            canvas_items: Vec::new(),
        }
    }

    /// Set the id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<PageId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the background color.
    #[must_use]
    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    /// Add a new widget on top of the stack.
    ///
    /// The item's z-index becomes the current item count and its geometry is
    /// committed (minimum size, clamped position).
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::InvalidOperation`] if the id is already used or
    /// the item holds a NaN or infinite number.
    pub fn add_item(&mut self, mut item: CanvasItem) -> FolioResult<ItemId> {
        self.ensure_unique(&item.id)?;
        item.ensure_finite()?;
        item.z_index = i64::try_from(self.canvas_items.len()).unwrap_or(i64::MAX);
        item.size = item.size.at_least(MIN_ITEM_EXTENT);
        item.position = clamp_position(item.position, item.size, self.page_size);
        let id = item.id.clone();
        tracing::debug!("Added {} item {id} to page {}", item.kind, self.id);
        self.canvas_items.push(item);
        Ok(id)
    }

    /// Append an item exactly as given, keeping its z-index and geometry.
    ///
    /// Used when rebuilding a page from a stored document.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::InvalidOperation`] if the id is already used or
    /// the item holds a NaN or infinite number.
    pub fn push_item(&mut self, item: CanvasItem) -> FolioResult<()> {
        self.ensure_unique(&item.id)?;
        item.ensure_finite()?;
        self.canvas_items.push(item);
        Ok(())
    }

    /// Remove an item. Sibling z-indices are left as they are.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::ItemNotFound`] if the item is not on this page.
    pub fn remove_item(&mut self, id: &ItemId) -> FolioResult<CanvasItem> {
        let index = self
            .canvas_items
            .iter()
            .position(|item| &item.id == id)
            .ok_or_else(|| FolioError::ItemNotFound(id.to_string()))?;
        Ok(self.canvas_items.remove(index))
    }

    /// Get an item by id.
    #[must_use]
    pub fn item(&self, id: &ItemId) -> Option<&CanvasItem> {
        self.canvas_items.iter().find(|item| &item.id == id)
    }

    /// Get a mutable reference to an item by id.
    pub fn item_mut(&mut self, id: &ItemId) -> Option<&mut CanvasItem> {
        self.canvas_items.iter_mut().find(|item| &item.id == id)
    }

    /// Items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CanvasItem] {
        &self.canvas_items
    }

    /// Number of items.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.canvas_items.len()
    }

    /// Whether the page has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.canvas_items.is_empty()
    }

    /// Commit a move, clamping the item inside the page.
    ///
    /// Returns the committed position.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::ItemNotFound`] if the item is not on this page,
    /// or [`FolioError::InvalidOperation`] if either coordinate is not finite.
    pub fn move_item(&mut self, id: &ItemId, position: Offset) -> FolioResult<Offset> {
        if !position.dx.is_finite() || !position.dy.is_finite() {
            return Err(FolioError::InvalidOperation(format!(
                "position must be finite, got ({}, {})",
                position.dx, position.dy
            )));
        }
        let page_size = self.page_size;
        let item = self.require_mut(id)?;
        item.position = clamp_position(position, item.size, page_size);
        Ok(item.position)
    }

    /// Commit a resize, enforcing [`MIN_ITEM_EXTENT`] and re-clamping the
    /// position.
    ///
    /// Returns the committed size.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::ItemNotFound`] if the item is not on this page,
    /// or [`FolioError::InvalidOperation`] if either extent is not finite.
    pub fn resize_item(&mut self, id: &ItemId, size: Size) -> FolioResult<Size> {
        if !size.width.is_finite() || !size.height.is_finite() {
            return Err(FolioError::InvalidOperation(format!(
                "size must be finite, got {}x{}",
                size.width, size.height
            )));
        }
        let page_size = self.page_size;
        let item = self.require_mut(id)?;
        item.size = size.at_least(MIN_ITEM_EXTENT);
        item.position = clamp_position(item.position, item.size, page_size);
        Ok(item.size)
    }

    /// Set an item's z-index.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::ItemNotFound`] if the item is not on this page.
    pub fn set_z_index(&mut self, id: &ItemId, z_index: i64) -> FolioResult<()> {
        self.require_mut(id)?.z_index = z_index;
        Ok(())
    }

    /// Raise an item above every other item.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::ItemNotFound`] if the item is not on this page.
    pub fn bring_to_front(&mut self, id: &ItemId) -> FolioResult<i64> {
        let top = self
            .canvas_items
            .iter()
            .filter(|item| &item.id != id)
            .map(|item| item.z_index)
            .max();
        let item = self.require_mut(id)?;
        if let Some(top) = top {
            item.z_index = top.saturating_add(1);
        }
        Ok(item.z_index)
    }

    /// Lower an item below every other item.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::ItemNotFound`] if the item is not on this page.
    pub fn send_to_back(&mut self, id: &ItemId) -> FolioResult<i64> {
        let bottom = self
            .canvas_items
            .iter()
            .filter(|item| &item.id != id)
            .map(|item| item.z_index)
            .min();
        let item = self.require_mut(id)?;
        if let Some(bottom) = bottom {
            item.z_index = bottom.saturating_sub(1);
        }
        Ok(item.z_index)
    }

    /// Set an item's opacity, clamped to `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::ItemNotFound`] if the item is not on this page.
    pub fn set_opacity(&mut self, id: &ItemId, opacity: f64) -> FolioResult<()> {
        if !opacity.is_finite() {
            return Err(FolioError::InvalidOperation(format!(
                "opacity must be finite, got {opacity}"
            )));
        }
        self.require_mut(id)?.opacity = opacity.clamp(0.0, 1.0);
        Ok(())
    }

    /// Set one property on an item.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::ItemNotFound`] if the item is not on this page,
    /// or [`FolioError::InvalidOperation`] for a NaN or infinite float.
    pub fn set_property(
        &mut self,
        id: &ItemId,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> FolioResult<()> {
        let key = key.into();
        let value = value.into();
        if !value.is_finite() {
            return Err(FolioError::InvalidOperation(format!(
                "property '{key}' must be finite, got {value:?}"
            )));
        }
        self.require_mut(id)?.properties.insert(key, value);
        Ok(())
    }

    /// Link (or unlink) an item to a page.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::ItemNotFound`] if the item is not on this page.
    pub fn set_link(&mut self, id: &ItemId, target: Option<PageId>) -> FolioResult<()> {
        self.require_mut(id)?.linked_page_id = target;
        Ok(())
    }

    /// Visible items, back to front.
    ///
    /// Items with zero opacity are skipped; the rest are stably sorted by
    /// z-index so ties keep list order.
    #[must_use]
    pub fn paint_order(&self) -> Vec<&CanvasItem> {
        let mut visible: Vec<_> = self
            .canvas_items
            .iter()
            .filter(|item| item.is_visible())
            .collect();
        visible.sort_by_key(|item| item.z_index);
        visible
    }

    /// The topmost visible item under a page-local point.
    #[must_use]
    pub fn item_at(&self, point: Offset) -> Option<&CanvasItem> {
        self.paint_order()
            .into_iter()
            .rev()
            .find(|item| item.contains_point(point))
    }

    /// Page ids that items on this page link to.
    pub fn linked_page_ids(&self) -> impl Iterator<Item = &PageId> {
        self.canvas_items
            .iter()
            .filter_map(|item| item.linked_page_id.as_ref())
    }

    /// Refresh the last-save timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn ensure_unique(&self, id: &ItemId) -> FolioResult<()> {
        if self.item(id).is_some() {
            return Err(FolioError::InvalidOperation(format!(
                "item {id} already exists on page {}",
                self.id
            )));
        }
        Ok(())
    }

    fn require_mut(&mut self, id: &ItemId) -> FolioResult<&mut CanvasItem> {
        self.item_mut(id)
            .ok_or_else(|| FolioError::ItemNotFound(id.to_string()))
    }
}
