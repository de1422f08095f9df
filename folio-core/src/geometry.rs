//! 2D points, sizes and rectangles in page-local pixels.

use serde::{Deserialize, Serialize};

/// A page-local position.
///
/// Serializes as `{dx, dy}`, the field names used on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    /// Horizontal distance from the page's left edge.
    pub dx: f64,
    /// Vertical distance from the page's top edge.
    pub dy: f64,
}

impl Offset {
    /// The origin.
    pub const ZERO: Self = Self { dx: 0.0, dy: 0.0 };

    /// Create an offset.
    #[must_use]
    pub const fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Size {
    /// Create a size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Grow each axis to at least `min`.
    #[must_use]
    pub fn at_least(self, min: f64) -> Self {
        Self {
            width: self.width.max(min),
            height: self.height.max(min),
        }
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Rect {
    /// Build a rectangle from its top-left corner and size.
    #[must_use]
    pub const fn from_origin_size(origin: Offset, size: Size) -> Self {
        Self {
            x: origin.dx,
            y: origin.dy,
            width: size.width,
            height: size.height,
        }
    }

    /// Check if a point lies inside the rectangle (edges inclusive).
    #[must_use]
    pub fn contains(&self, point: Offset) -> bool {
        point.dx >= self.x
            && point.dx <= self.x + self.width
            && point.dy >= self.y
            && point.dy <= self.y + self.height
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> Offset {
        Offset::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Clamp an item's position so the item stays inside the page.
///
/// Each axis is limited to `[0, page - item]`; when the item is larger than
/// the page on an axis, that axis is pinned to 0.
#[must_use]
pub fn clamp_position(position: Offset, item: Size, page: Size) -> Offset {
    let max_x = (page.width - item.width).max(0.0);
    let max_y = (page.height - item.height).max(0.0);
    Offset::new(position.dx.clamp(0.0, max_x), position.dy.clamp(0.0, max_y))
}
