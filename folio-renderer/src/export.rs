//! Static-site export.
//!
//! Turns a [`Bundle`] into a self-contained web page: one absolutely
//! positioned section per page, drawn from the same draw lists the viewer
//! uses, plus a small inline script implementing page navigation with a
//! back-stack. The bundle itself is written next to it as `bundle.json`.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use folio_core::{Bundle, Color, JsonDocument, Page};

use crate::draw::{
    render_page, ButtonAction, DrawCommand, DrawList, ImageSource, Primitive, RenderContext,
};
use crate::error::{RenderError, RenderResult};

/// File name of the generated page.
pub const INDEX_FILE: &str = "index.html";

/// File name of the bundle written alongside the page.
pub const BUNDLE_FILE: &str = "bundle.json";

const NAVIGATION_SCRIPT: &str = r"(function () {
  var state = { currentPageId: null, history: [] };
  var back = document.getElementById('folio-back');
  function show(id) {
    document.querySelectorAll('.folio-page').forEach(function (el) {
      el.style.display = el.dataset.page === id ? 'block' : 'none';
    });
    back.disabled = state.history.length === 0;
  }
  function navigateToPage(id) {
    if (!document.querySelector('.folio-page[data-page=' + JSON.stringify(id) + ']')) {
      console.warn('Page not found: ' + id);
      return;
    }
    if (state.currentPageId !== null) { state.history.push(state.currentPageId); }
    state.currentPageId = id;
    show(id);
  }
  function goBack() {
    if (state.history.length === 0) { return; }
    state.currentPageId = state.history.pop();
    show(state.currentPageId);
  }
  document.addEventListener('click', function (event) {
    var target = event.target.closest('[data-target]');
    if (target) { navigateToPage(target.dataset.target); }
  });
  back.addEventListener('click', goBack);
  if (ENTRY_PAGE !== null) { navigateToPage(ENTRY_PAGE); }
})();";

/// Generated site contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteFiles {
    /// The HTML page.
    pub index_html: String,
    /// The bundle as JSON.
    pub bundle_json: String,
}

/// Exports bundles as static sites.
#[derive(Debug, Clone, Default)]
pub struct StaticSiteExporter {
    title: Option<String>,
}

impl StaticSiteExporter {
    /// Create an exporter titled after the project.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the document title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Generate the site files.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Document`] if the bundle cannot be encoded.
    pub fn export(&self, bundle: &Bundle) -> RenderResult<SiteFiles> {
        Ok(SiteFiles {
            index_html: self.render_html(bundle),
            bundle_json: bundle.to_json_string()?,
        })
    }

    /// Generate the site and write it into `dir`, creating it if needed.
    ///
    /// The writes block; async callers run this on a blocking thread.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Export`] if `dir` is not a directory, or an
    /// I/O error if a file cannot be written.
    pub fn write_to(&self, bundle: &Bundle, dir: &Path) -> RenderResult<Vec<PathBuf>> {
        ensure_export_dir(dir)?;
        let files = self.export(bundle)?;
        std::fs::create_dir_all(dir)?;
        let index = dir.join(INDEX_FILE);
        let json = dir.join(BUNDLE_FILE);
        std::fs::write(&index, files.index_html)?;
        std::fs::write(&json, files.bundle_json)?;
        tracing::info!(
            "Exported project {} as a static site to {}",
            bundle.project.id,
            dir.display()
        );
        Ok(vec![index, json])
    }

    /// Generate the HTML page.
    #[must_use]
    pub fn render_html(&self, bundle: &Bundle) -> String {
        let report = bundle.report();
        let assets = bundle.asset_resolver();
        let ctx = RenderContext::new(&bundle.project.id, &assets)
            .with_navigable(&report.resolved_pages);
        let title = self.title.as_deref().unwrap_or(&bundle.project.name);

        let mut html = String::new();
        let _ = write!(
            html,
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
             <meta name=\"generator\" content=\"folio {}\">\n<title>{}</title>\n\
             <style>\nbody{{margin:0;font-family:sans-serif;background:#fafafa}}\n\
             .folio-page{{position:relative;margin:0 auto;overflow:hidden}}\n\
             .folio-item{{position:absolute;box-sizing:border-box}}\n\
             .folio-center{{display:flex;align-items:center;justify-content:center;text-align:center}}\n\
             #folio-back{{position:fixed;top:8px;left:8px;z-index:2147483647}}\n\
             </style>\n</head>\n<body>\n\
             <button id=\"folio-back\" type=\"button\" disabled>&larr; Back</button>\n",
            crate::VERSION,
            escape_html(title)
        );

        for page_id in &report.resolved_pages {
            let Some(page) = bundle.pages.get(page_id) else {
                continue;
            };
            let list = render_page(page, &ctx);
            write_page(&mut html, page, &list);
        }

        let entry = report.entry_page().map(|id| id.as_str());
        let entry_json = serde_json::to_string(&entry)
            .unwrap_or_else(|_| "null".to_string())
            .replace('<', "\\u003c");
        let _ = write!(
            html,
            "<script>\nvar ENTRY_PAGE = {entry_json};\n{NAVIGATION_SCRIPT}\n</script>\n</body>\n</html>\n"
        );
        html
    }
}

fn write_page(html: &mut String, page: &Page, list: &DrawList) {
    let _ = writeln!(
        html,
        "<section class=\"folio-page\" data-page=\"{}\" aria-label=\"{}\" \
         style=\"display:none;width:{}px;height:{}px;background:{}\">",
        escape_html(page.id.as_str()),
        escape_html(&page.name),
        list.page_size.width,
        list.page_size.height,
        list.background.to_css()
    );
    for (layer, cmd) in list.commands.iter().enumerate() {
        write_command(html, cmd, layer);
    }
    html.push_str("</section>\n");
}

fn write_command(html: &mut String, cmd: &DrawCommand, layer: usize) {
    let frame = cmd.frame;
    let mut style = format!(
        "left:{}px;top:{}px;width:{}px;height:{}px;z-index:{layer}",
        frame.x, frame.y, frame.width, frame.height
    );
    let css = |color: Color| cmd.composite(color).to_css();

    match &cmd.primitive {
        Primitive::Text {
            text,
            font_size,
            bold,
            italic,
            color,
        } => {
            let _ = write!(style, ";font-size:{font_size}px;color:{}", css(*color));
            if *bold {
                style.push_str(";font-weight:bold");
            }
            if *italic {
                style.push_str(";font-style:italic");
            }
            let _ = writeln!(
                html,
                "<div class=\"folio-item folio-center folio-text\" style=\"{style}\">{}</div>",
                escape_html(text)
            );
        }
        Primitive::Button {
            label,
            font_size,
            fill,
            text_color,
            corner_radius,
            action,
        } => {
            let _ = write!(
                style,
                ";font-size:{font_size}px;background:{};color:{};border:none;border-radius:{corner_radius}px",
                css(*fill),
                css(*text_color)
            );
            let target = match action {
                ButtonAction::Navigate(page) => {
                    format!(" data-target=\"{}\"", escape_html(page.as_str()))
                }
                ButtonAction::Inert => String::new(),
            };
            let _ = writeln!(
                html,
                "<button type=\"button\" class=\"folio-item folio-button\"{target} style=\"{style}\">{}</button>",
                escape_html(label)
            );
        }
        Primitive::Image {
            source,
            corner_radius,
        } => {
            let _ = write!(style, ";border-radius:{corner_radius}px;overflow:hidden");
            match source {
                ImageSource::Embedded { uri, .. } => write_img(html, &style, uri, cmd.opacity),
                ImageSource::Url { url } => write_img(html, &style, url, cmd.opacity),
                ImageSource::Placeholder => {
                    let _ = writeln!(
                        html,
                        "<div class=\"folio-item folio-center folio-image-missing\" \
                         style=\"{style};background:{};color:{}\">&#128444;</div>",
                        css(Color::from_packed(0xFFEE_EEEE)),
                        css(Color::from_packed(0xFF9E_9E9E))
                    );
                }
            }
        }
        Primitive::Panel {
            fill,
            corner_radius,
            border,
            elevation,
            label,
            text_color,
        } => {
            let _ = write!(
                style,
                ";background:{};border-radius:{corner_radius}px;color:{}",
                css(*fill),
                css(*text_color)
            );
            if let Some((color, width)) = border {
                let _ = write!(style, ";border:{width}px solid {}", css(*color));
            }
            if *elevation > 0.0 {
                let shadow = Color::from_argb(64, 0, 0, 0);
                let _ = write!(
                    style,
                    ";box-shadow:0 {}px {}px {}",
                    elevation / 2.0,
                    elevation * 2.0,
                    css(shadow)
                );
            }
            let _ = writeln!(
                html,
                "<div class=\"folio-item folio-center folio-panel\" style=\"{style}\">{}</div>",
                label.as_deref().map(escape_html).unwrap_or_default()
            );
        }
        Primitive::Input {
            hint,
            font_size,
            text_color,
            border_color,
            fill,
            live,
        } => {
            let _ = write!(
                style,
                ";font-size:{font_size}px;color:{};background:{};border:1px solid {};padding:0 8px",
                css(*text_color),
                css(*fill),
                css(*border_color)
            );
            let readonly = if *live { "" } else { " readonly" };
            let _ = writeln!(
                html,
                "<input type=\"text\" class=\"folio-item folio-input\" placeholder=\"{}\"{readonly} style=\"{style}\">",
                escape_html(hint)
            );
        }
    }
}

fn write_img(html: &mut String, style: &str, src: &str, opacity: f64) {
    let _ = writeln!(
        html,
        "<img class=\"folio-item folio-image\" alt=\"\" src=\"{}\" \
         style=\"{style};object-fit:cover;opacity:{opacity}\">",
        escape_html(src)
    );
}

/// Escape text for HTML content and attribute values.
#[must_use]
pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Check that `dir` can receive an export.
///
/// # Errors
///
/// Returns [`RenderError::Export`] if `dir` exists and is not a directory.
pub fn ensure_export_dir(dir: &Path) -> RenderResult<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(RenderError::Export(format!(
            "{} exists and is not a directory",
            dir.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{CanvasItem, PageId, Project, Size, WidgetKind};

    fn bundle() -> Bundle {
        let mut project = Project::new("Tom & Jerry's <Site>").with_id("site");
        let mut home = Page::new("Home", project.id.clone(), Size::new(640.0, 480.0)).with_id("home");
        let about = Page::new("About", project.id.clone(), Size::new(640.0, 480.0)).with_id("about");
        home.push_item(
            CanvasItem::bare("go", WidgetKind::Button)
                .with_property("text", "About us")
                .with_link("about"),
        )
        .expect("push");
        home.push_item(CanvasItem::bare("dead", WidgetKind::Button).with_link("nowhere"))
            .expect("push");
        home.push_item(CanvasItem::bare("hidden", WidgetKind::Text).with_opacity(0.0))
            .expect("push");
        project.page_ids = vec![PageId::from("home"), PageId::from("about")];
        Bundle::new(project).with_page(home).with_page(about)
    }

    #[test]
    fn test_html_structure() {
        let html = StaticSiteExporter::new().render_html(&bundle());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Tom &amp; Jerry&#39;s &lt;Site&gt;</title>"));
        assert_eq!(html.matches("class=\"folio-page\"").count(), 2);
        assert!(html.contains("data-target=\"about\""));
        assert!(!html.contains("data-target=\"nowhere\""));
        assert!(!html.contains("data-page=\"nowhere\""));
        assert!(html.contains("var ENTRY_PAGE = \"home\";"));
        assert!(html.contains("About us"));
    }

    #[test]
    fn test_hidden_items_are_not_exported() {
        let html = StaticSiteExporter::new().render_html(&bundle());
        assert!(!html.contains("folio-text"));
    }

    #[test]
    fn test_title_override() {
        let html = StaticSiteExporter::new().with_title("Custom").render_html(&bundle());
        assert!(html.contains("<title>Custom</title>"));
    }

    #[test]
    fn test_write_to() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("site");
        let bundle = bundle();
        let written = StaticSiteExporter::new()
            .write_to(&bundle, &out)
            .expect("write");
        assert_eq!(written, vec![out.join(INDEX_FILE), out.join(BUNDLE_FILE)]);
        let json = std::fs::read_to_string(out.join(BUNDLE_FILE)).expect("read");
        assert_eq!(Bundle::from_json_str(&json).expect("decode"), bundle);
    }

    #[test]
    fn test_export_dir_check() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("file");
        std::fs::write(&file, "x").expect("write");
        assert!(ensure_export_dir(&file).is_err());
        assert!(ensure_export_dir(dir.path()).is_ok());
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">&</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
    }
}
