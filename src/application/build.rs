// Build pipeline: input document to static page
use crate::application::layout::{layout, offscreen};
use crate::application::resolve::resolve_all;
use crate::domain::error::BookmapError;
use crate::domain::model::{BuildSummary, ResolvedPoint};
use crate::domain::traits::Geocoder;
use crate::infrastructure::config::Config;
use crate::infrastructure::network::client::NominatimClient;
use crate::infrastructure::storage::cache::GeocodeStore;
use crate::interfaces::books::{collect_queries, load_books};
use crate::presentation::page::{render_page, write_page};
use crate::state::AppState;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug)]
pub struct BuildReport {
    pub summary: BuildSummary,
    /// Fresh resolutions could not be persisted; the page itself is fine.
    pub flush_warning: bool,
    pub output_file: PathBuf,
}

pub async fn run_build(state: &AppState, no_cache: bool) -> Result<BuildReport, BookmapError> {
    let geocoder = NominatimClient::new(state.http_client.clone(), &state.config.geocoder);
    build_with(&geocoder, &state.config, no_cache).await
}

/// The whole pipeline behind an injected geocoder, so tests can run it
/// end to end without the network.
pub async fn build_with(
    geocoder: &dyn Geocoder,
    config: &Config,
    no_cache: bool,
) -> Result<BuildReport, BookmapError> {
    let books = load_books(&config.input)?;
    println!("Found {} books in {}", books.len(), config.input.display());

    let queries = collect_queries(&books);
    if queries.is_empty() {
        return Err(BookmapError::Input(format!(
            "no placeable locations in {}",
            config.input.display()
        )));
    }

    // Loaded even under no_cache: existing entries must survive the flush.
    let mut store = GeocodeStore::load(&config.cache_file);
    info!("Cache store holds {} locations", store.len());

    let points = resolve_all(geocoder, &mut store, &queries, no_cache).await;
    let mut summary = BuildSummary::from_points(&points);

    let placed: Vec<ResolvedPoint> = points.into_iter().filter(ResolvedPoint::is_placed).collect();
    if placed.is_empty() {
        return Err(BookmapError::Input(format!(
            "no placeable markers: all {} location lookups failed",
            summary.failed
        )));
    }

    let (groups, markers) = layout(&placed, &config.layout)?;
    let indicators = offscreen(&groups, &config.viewport);
    summary.markers_placed = markers.len();
    summary.groups_formed = groups.len();
    summary.offscreen_groups = indicators.iter().map(|i| i.count).sum();

    let html = render_page(&books, &markers, &indicators, config)?;
    let output_file = write_page(&config.output_dir, &html)?;

    let flush_warning = match store.flush() {
        Ok(()) => false,
        Err(e) => {
            warn!("Cache flush failed: {}", e);
            true
        }
    };

    Ok(BuildReport {
        summary,
        flush_warning,
        output_file,
    })
}
