// Static page assembly
use crate::domain::error::BookmapError;
use crate::domain::model::{Book, OffscreenIndicator, PlacedMarker};
use crate::infrastructure::config::Config;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};
use tracing::{debug, warn};

/// Compiled into the binary; a `templates/map.html` next to the input
/// document overrides it for users who want their own page.
const DEFAULT_TEMPLATE: &str = include_str!("../../templates/map.html");
const TEMPLATE_OVERRIDE: &str = "templates/map.html";
const TEMPLATE_NAME: &str = "map.html";

// What the page script needs per marker: the display position (already
// offset by the layout engine) plus popup content.
#[derive(Serialize)]
struct MarkerContext<'a> {
    display_lat: f64,
    display_lng: f64,
    group: usize,
    name: &'a str,
    title: &'a str,
    author: Option<&'a str>,
    cover: Option<&'a str>,
    year: Option<i32>,
    genre: Option<&'a str>,
    review: Option<&'a str>,
}

#[derive(Serialize)]
struct IndicatorContext {
    direction: &'static str,
    count: usize,
}

pub fn render_page(
    books: &[Book],
    markers: &[PlacedMarker],
    indicators: &[OffscreenIndicator],
    config: &Config,
) -> Result<String, BookmapError> {
    let mut marker_contexts = Vec::with_capacity(markers.len());
    for marker in markers {
        let book = books.get(marker.point.book_index).ok_or_else(|| {
            BookmapError::Layout(format!(
                "marker for {:?} references book #{} which does not exist",
                marker.point.query.name, marker.point.book_index
            ))
        })?;
        marker_contexts.push(MarkerContext {
            display_lat: marker.display.latitude,
            display_lng: marker.display.longitude,
            group: marker.group,
            name: &marker.point.query.name,
            title: &book.title,
            author: book.author.as_deref(),
            cover: book.cover.as_deref(),
            year: book.year,
            genre: book.genre.as_deref(),
            review: book.review.as_deref(),
        });
    }

    let indicator_contexts: Vec<IndicatorContext> = indicators
        .iter()
        .map(|indicator| IndicatorContext {
            direction: indicator.direction.label(),
            count: indicator.count,
        })
        .collect();

    let mut tera = Tera::default();
    tera.add_raw_template(TEMPLATE_NAME, &template_source(Path::new(TEMPLATE_OVERRIDE)))?;
    tera.autoescape_on(vec![]);

    let mut context = Context::new();
    context.insert("title", &config.title);
    context.insert("markers_json", &serde_json::to_string_pretty(&marker_contexts)?);
    context.insert(
        "indicators_json",
        &serde_json::to_string_pretty(&indicator_contexts)?,
    );
    context.insert("viewport_json", &serde_json::to_string(&config.viewport)?);

    Ok(tera.render(TEMPLATE_NAME, &context)?)
}

/// Disk override when present and readable, embedded template otherwise.
fn template_source(override_path: &Path) -> String {
    if override_path.exists() {
        match fs::read_to_string(override_path) {
            Ok(source) => {
                debug!("Using template override {}", override_path.display());
                return source;
            }
            Err(e) => {
                warn!(
                    "Template override {} unreadable ({}); using the built-in page",
                    override_path.display(),
                    e
                );
            }
        }
    }
    DEFAULT_TEMPLATE.to_string()
}

/// Write the finished page as `<output_dir>/index.html`.
pub fn write_page(output_dir: &Path, html: &str) -> Result<PathBuf, BookmapError> {
    fs::create_dir_all(output_dir)?;
    let output_file = output_dir.join("index.html");
    fs::write(&output_file, html)?;
    Ok(output_file)
}
