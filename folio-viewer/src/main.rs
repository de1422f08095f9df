//! # Folio Viewer
//!
//! Command-line companion viewer for Folio projects.

use std::io::Write as _;

use clap::Parser;
use folio_viewer::{CliArgs, Viewer, ViewerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,folio_core=debug,folio_renderer=debug"));

    // Reports go to stdout; logs stay on stderr.
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    if std::env::var("FOLIO_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    let config = ViewerConfig::from(args);
    tracing::debug!(
        "Store: {}, assets: {:?}",
        config.store_dir.display(),
        config.asset_dir
    );

    let viewer = Viewer::new(&config);
    let report = viewer.run(&config.command).await?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(report.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
