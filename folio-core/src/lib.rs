//! # Folio Core
//!
//! Document model shared by the editor, the exported static runtime and the
//! companion viewer.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 folio-core                  │
//! ├─────────────────────────────────────────────┤
//! │  Model           │  Codec                   │
//! │  - CanvasItem    │  - JSON wire documents   │
//! │  - Page          │  - Packed ARGB colors    │
//! │  - Project       │  - Bundles               │
//! ├─────────────────────────────────────────────┤
//! │  Navigation      │  Storage                 │
//! │  - State machine │  - ProjectStore trait    │
//! │  - Runtime       │  - DocumentCache         │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod asset;
pub mod bundle;
pub mod cache;
pub mod codec;
pub mod color;
pub mod error;
pub mod geometry;
pub mod ids;
pub mod item;
pub mod navigation;
pub mod page;
pub mod project;
pub mod properties;
pub mod runtime;
pub mod store;
pub mod validation;
pub mod widget;

pub use asset::{AssetResolver, BundleAssets, DirectoryAssets, NoAssets, ResolvedAsset};
pub use bundle::{Bundle, ExportPolicy, BUNDLE_FORMAT_VERSION};
pub use cache::{CacheStats, CachedAssets, DocumentCache};
pub use codec::JsonDocument;
pub use color::{is_color_property, Color, COLOR_PROPERTY_KEYS};
pub use error::{FolioError, FolioResult};
pub use geometry::{Offset, Rect, Size};
pub use ids::{ItemId, PageId, ProjectId};
pub use item::{CanvasItem, MIN_ITEM_EXTENT};
pub use navigation::{NavigationPhase, NavigationState};
pub use page::Page;
pub use project::{Project, DEFAULT_PAGE_SIZE};
pub use properties::{Properties, PropertyValue};
pub use runtime::{Activation, Runtime};
pub use store::{FsProjectStore, MemoryStore, ProjectStore};
pub use validation::{ProjectReport, UnresolvedLink};
pub use widget::{BoxProps, ButtonProps, ImageProps, InputProps, TextProps, WidgetKind, WidgetProps};

/// Folio core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
