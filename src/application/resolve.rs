// Location resolution: explicit override, then cache, then the network
use crate::domain::model::{
    BookQuery, CacheEntry, CacheKey, Coordinate, Provenance, ResolvedPoint,
};
use crate::domain::traits::Geocoder;
use crate::infrastructure::storage::GeocodeStore;
use chrono::Utc;
use dashmap::DashMap;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

/// Resolve every query in input order. Failures never halt the batch; a
/// failed lookup becomes a coordinate-less point the summary reports.
///
/// The in-run memo guarantees at most one network call per normalized name
/// per run, successes and failures alike. With `no_cache` the store is not
/// consulted, but fresh resolutions still write back so the next run is warm.
pub async fn resolve_all(
    geocoder: &dyn Geocoder,
    store: &mut GeocodeStore,
    queries: &[BookQuery],
    no_cache: bool,
) -> Vec<ResolvedPoint> {
    // normalized name -> this run's outcome; None records a failure
    let memo: DashMap<CacheKey, Option<Coordinate>> = DashMap::new();
    let mut points = Vec::with_capacity(queries.len());

    let progress = resolution_progress(queries.len());

    for entry in queries {
        progress.set_message(entry.query.name.clone());
        let point = resolve_one(geocoder, store, &memo, entry, no_cache).await;
        points.push(point);
        progress.inc(1);
    }

    progress.finish_and_clear();
    points
}

async fn resolve_one(
    geocoder: &dyn Geocoder,
    store: &mut GeocodeStore,
    memo: &DashMap<CacheKey, Option<Coordinate>>,
    entry: &BookQuery,
    no_cache: bool,
) -> ResolvedPoint {
    // 1. Explicit coordinates always win; no cache or network touch.
    if let Some(coordinate) = entry.query.explicit_coordinate() {
        return entry.resolved(Some(coordinate), Provenance::Explicit);
    }

    let key = entry.query.cache_key();

    // 2. Persistent cache
    if !no_cache {
        if let Some(cached) = store.lookup(&key) {
            return entry.resolved(Some(cached.coordinate()), Provenance::Cached);
        }
    }

    // 3. This run already asked for this name
    if let Some(outcome) = memo.get(&key) {
        return match *outcome {
            Some(coordinate) => entry.resolved(Some(coordinate), Provenance::FreshlyResolved),
            None => entry.resolved(None, Provenance::Failed),
        };
    }

    // 4. Online lookup; on success the store is updated before the point is
    //    surfaced, so a value is only ever cached after a real resolution.
    match geocoder.resolve(key.as_str()).await {
        Ok(coordinate) => {
            store.insert(
                key.clone(),
                CacheEntry {
                    latitude: coordinate.latitude,
                    longitude: coordinate.longitude,
                    resolved_at: Some(Utc::now().timestamp()),
                },
            );
            memo.insert(key, Some(coordinate));
            info!(
                "Geocoded {:?} -> ({}, {})",
                entry.query.name, coordinate.latitude, coordinate.longitude
            );
            entry.resolved(Some(coordinate), Provenance::FreshlyResolved)
        }
        Err(e) => {
            warn!("Lookup failed for {:?}: {}", entry.query.name, e);
            memo.insert(key, None);
            entry.resolved(None, Provenance::Failed)
        }
    }
}

fn resolution_progress(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    progress
}
