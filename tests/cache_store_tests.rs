//! Geocode store persistence tests

use bookmap::domain::model::{CacheEntry, CacheKey, Coordinate};
use bookmap::infrastructure::storage::GeocodeStore;
use std::fs;
use std::path::PathBuf;

fn entry(latitude: f64, longitude: f64) -> CacheEntry {
    CacheEntry {
        latitude,
        longitude,
        resolved_at: Some(1_755_700_000),
    }
}

fn store_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("cache/geocoding.json")
}

#[test]
fn missing_file_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = GeocodeStore::load(&store_path(&dir));
    assert!(store.is_empty());
}

#[test]
fn flush_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = store_path(&dir);

    let mut store = GeocodeStore::load(&path);
    store.insert(
        CacheKey::from_name("  Paris,   France "),
        entry(48.8589, 2.3200),
    );
    store.flush().unwrap();

    let reloaded = GeocodeStore::load(&path);
    assert_eq!(reloaded.len(), 1);
    let hit = reloaded
        .lookup(&CacheKey::from_name("paris, france"))
        .expect("normalized key must hit");
    assert_eq!(hit.coordinate(), Coordinate::new(48.8589, 2.3200));
    assert_eq!(hit.resolved_at, Some(1_755_700_000));
}

#[test]
fn document_is_sorted_and_hand_editable() {
    let dir = tempfile::tempdir().unwrap();
    let path = store_path(&dir);

    let mut store = GeocodeStore::load(&path);
    store.insert(CacheKey::from_name("Zagreb"), entry(45.81, 15.98));
    store.insert(CacheKey::from_name("Ankara"), entry(39.93, 32.85));
    store.flush().unwrap();

    let document = fs::read_to_string(&path).unwrap();
    let ankara = document.find("ankara").unwrap();
    let zagreb = document.find("zagreb").unwrap();
    assert!(ankara < zagreb, "keys are written in sorted order");
    assert!(
        document.lines().count() > 2,
        "document is pretty-printed, one field per line"
    );
}

#[test]
fn corrupt_document_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("geocoding.json");
    fs::write(&path, "not json {{{").unwrap();

    let store = GeocodeStore::load(&path);
    assert!(store.is_empty());
}

#[test]
fn unreadable_entry_is_skipped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("geocoding.json");
    fs::write(
        &path,
        r#"{
            "paris, france": {"latitude": 48.8589, "longitude": 2.32, "resolved_at": null},
            "broken": "this is not an entry"
        }"#,
    )
    .unwrap();

    let store = GeocodeStore::load(&path);
    assert_eq!(store.len(), 1);
    assert!(store.contains(&CacheKey::from_name("paris, france")));
}

#[test]
fn legacy_lat_lng_entries_load_transparently() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("geocoding.json");
    fs::write(
        &path,
        r#"{"austin, texas": {"lat": 30.2672, "lng": -97.7431, "name": "Austin"}}"#,
    )
    .unwrap();

    let mut store = GeocodeStore::load(&path);
    let hit = store
        .lookup(&CacheKey::from_name("Austin, Texas"))
        .expect("legacy entry must load");
    assert_eq!(hit.coordinate(), Coordinate::new(30.2672, -97.7431));
    assert_eq!(hit.resolved_at, None, "legacy entries carry no timestamp");

    // The next flush rewrites the document in the current form.
    store.insert(CacheKey::from_name("Paris, France"), entry(48.8589, 2.32));
    store.flush().unwrap();
    let document = fs::read_to_string(&path).unwrap();
    assert!(document.contains("\"latitude\""));
    assert!(!document.contains("\"lng\""));
}

#[test]
fn clean_store_skips_flush() {
    let dir = tempfile::tempdir().unwrap();
    let path = store_path(&dir);

    let mut store = GeocodeStore::load(&path);
    store.flush().unwrap();
    assert!(!path.exists(), "nothing changed, nothing written");
}

#[test]
fn hand_edited_keys_renormalize_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("geocoding.json");
    fs::write(
        &path,
        r#"{"  Paris,   FRANCE ": {"latitude": 48.8589, "longitude": 2.32, "resolved_at": null}}"#,
    )
    .unwrap();

    let store = GeocodeStore::load(&path);
    assert!(
        store.contains(&CacheKey::from_name("paris, france")),
        "sloppy hand-added keys join the normalized identity space"
    );
}
