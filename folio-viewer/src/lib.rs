//! # Folio Viewer
//!
//! Command-line companion to the editor. Reads projects from the same
//! on-disk store the editor writes, and moves them in and out of bundles.
//!
//! ## Usage
//!
//! ```bash
//! folio-viewer --store ./projects inspect
//! folio-viewer --store ./projects inspect portfolio
//! folio-viewer --store ./projects render portfolio --page about
//! folio-viewer --store ./projects walk portfolio press:more back
//! folio-viewer --store ./projects --assets ./assets export portfolio site/ --format site
//! folio-viewer --store ./projects import bundle.json
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `ViewerConfig` - Store and asset locations plus the command to run
//! - `Viewer` - Runs commands against the store and returns their report
//! - `WalkStep` - One step of a navigation script

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

mod commands;
mod walk;

pub use commands::Viewer;
pub use walk::{ParseStepError, WalkStep};

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use folio_core::{ExportPolicy, PageId, ProjectId};
use folio_renderer::RenderMode;

/// Command-line arguments for folio-viewer.
#[derive(Debug, Clone, Parser)]
#[command(name = "folio-viewer")]
#[command(about = "Inspect, render and export Folio projects")]
#[command(version)]
pub struct CliArgs {
    /// Project store directory
    #[arg(long = "store", env = "FOLIO_STORE_DIR", default_value = "projects")]
    pub store_dir: PathBuf,

    /// Asset directory (`<dir>/<project>/<key>`)
    #[arg(long = "assets", env = "FOLIO_ASSET_DIR")]
    pub asset_dir: Option<PathBuf>,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Viewer subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List stored projects, or summarize one project and its pages
    Inspect {
        /// Project id; omit to list every project
        project: Option<ProjectId>,
    },

    /// Print the draw list of a page as JSON
    Render {
        /// Project id
        project: ProjectId,

        /// Page id; defaults to the entry page
        #[arg(long)]
        page: Option<PageId>,

        /// Whether inputs are live and links are shown as in the editor
        #[arg(long, value_enum, default_value_t = ModeArg::Runtime)]
        mode: ModeArg,
    },

    /// Open a project and run a navigation script against it
    Walk {
        /// Project id
        project: ProjectId,

        /// Steps: press:<item>, at:<x>,<y>, goto:<page>, back
        steps: Vec<WalkStep>,
    },

    /// Export a project as a bundle file or a static site directory
    Export {
        /// Project id
        project: ProjectId,

        /// Output file (bundle) or directory (site)
        output: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = ExportFormat::Bundle)]
        format: ExportFormat,

        /// Fail on missing pages, unresolved links and missing assets
        #[arg(long)]
        strict: bool,
    },

    /// Import a bundle file into the store
    Import {
        /// Bundle file
        bundle: PathBuf,
    },
}

/// Render mode as a command-line value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Editor preview.
    Editor,
    /// Viewer and exported runtime.
    Runtime,
}

impl From<ModeArg> for RenderMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Editor => Self::Editor,
            ModeArg::Runtime => Self::Runtime,
        }
    }
}

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// A single `bundle.json` document.
    Bundle,
    /// `index.html` plus `bundle.json` in a directory.
    Site,
}

/// Viewer configuration.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Project store directory.
    pub store_dir: PathBuf,
    /// Asset directory, if any. Without one only inline data URIs resolve.
    pub asset_dir: Option<PathBuf>,
    /// Command to run.
    pub command: Command,
}

impl ViewerConfig {
    /// Configuration for `command` over the store at `store_dir`.
    #[must_use]
    pub fn new(store_dir: impl Into<PathBuf>, command: Command) -> Self {
        Self {
            store_dir: store_dir.into(),
            asset_dir: None,
            command,
        }
    }

    /// Resolve images from `dir`.
    #[must_use]
    pub fn with_asset_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.asset_dir = Some(dir.into());
        self
    }

    /// Export policy implied by the command.
    #[must_use]
    pub fn export_policy(&self) -> ExportPolicy {
        match self.command {
            Command::Export { strict: true, .. } => ExportPolicy::Strict,
            _ => ExportPolicy::Lenient,
        }
    }
}

impl From<CliArgs> for ViewerConfig {
    fn from(args: CliArgs) -> Self {
        Self {
            store_dir: args.store_dir,
            asset_dir: args.asset_dir,
            command: args.command,
        }
    }
}
