//! # Folio Renderer
//!
//! Turns pages into draw lists and bundles into static sites.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────┐   paint order    ┌──────────┐   HTML/CSS/JS   ┌─────────────┐
//! │   Page   │ ───────────────► │ DrawList │ ──────────────► │ Static site │
//! └──────────┘  resolve props   └──────────┘                 └─────────────┘
//!                 + assets
//! ```
//!
//! The draw list is the contract shared by every frontend: same commands, same
//! order, same resolved values, whether they end up on a native canvas, in a
//! terminal dump or in the exported page.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod draw;
pub mod error;
pub mod export;
pub mod image;

pub use draw::{
    render_page, ButtonAction, DrawCommand, DrawList, ImageSource, Primitive, RenderContext,
    RenderMode, RenderWarning,
};
pub use error::{RenderError, RenderResult};
pub use export::{SiteFiles, StaticSiteExporter};
pub use image::{ImageFormat, ImageInfo};

/// Folio renderer version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
