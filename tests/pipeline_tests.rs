//! End-to-end build tests: YAML document in, static page out

mod common;

use bookmap::application::build::build_with;
use bookmap::domain::error::BookmapError;
use bookmap::domain::model::Coordinate;
use bookmap::infrastructure::config::{Config, Viewport};
use common::ScriptedGeocoder;
use std::fs;

const PARIS: Coordinate = Coordinate {
    latitude: 48.8589,
    longitude: 2.3200,
};
const AUSTIN: Coordinate = Coordinate {
    latitude: 30.2672,
    longitude: -97.7431,
};

fn config_in(dir: &tempfile::TempDir) -> Config {
    let mut config = Config::default();
    config.input = dir.path().join("books.yaml");
    config.output_dir = dir.path().join("site");
    config.cache_file = dir.path().join("cache/geocoding.json");
    config
}

fn write_books(config: &Config, yaml: &str) {
    fs::write(&config.input, yaml).unwrap();
}

#[tokio::test]
async fn build_writes_page_and_cache() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    write_books(
        &config,
        r#"
books:
  - title: A Moveable Feast
    author: Ernest Hemingway
    locations:
      - name: Paris, France
  - title: Walden
    locations:
      - name: Walden Pond
        lat: 42.4395
        lng: -71.3358
"#,
    );
    let geocoder = ScriptedGeocoder::new(&[("paris, france", PARIS)]);

    let report = build_with(&geocoder, &config, false).await.unwrap();

    assert_eq!(report.summary.freshly_resolved, 1);
    assert_eq!(report.summary.explicit, 1);
    assert_eq!(report.summary.failed, 0);
    assert_eq!(report.summary.markers_placed, 2);
    assert_eq!(report.summary.groups_formed, 2);
    assert!(!report.flush_warning);
    assert_eq!(report.output_file, config.output_dir.join("index.html"));

    let html = fs::read_to_string(&report.output_file).unwrap();
    assert!(html.contains("A Moveable Feast"));
    assert!(html.contains("Ernest Hemingway"));
    assert!(html.contains("unpkg.com/leaflet@1.9.4"));

    let cache = fs::read_to_string(&config.cache_file).unwrap();
    assert!(cache.contains("paris, france"));
    assert!(
        !cache.contains("walden"),
        "explicit coordinates are never cached"
    );
}

#[tokio::test]
async fn near_coincident_places_share_a_group() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    write_books(
        &config,
        r#"
books:
  - title: Paris Stories
    locations:
      - name: Louvre
      - name: Tuileries
      - name: Palais Royal
  - title: Lonesome Dove
    locations:
      - name: Austin, Texas
"#,
    );
    let geocoder = ScriptedGeocoder::new(&[
        ("louvre", Coordinate::new(48.8606, 2.3376)),
        ("tuileries", Coordinate::new(48.8620, 2.3350)),
        ("palais royal", Coordinate::new(48.8635, 2.3370)),
        ("austin, texas", AUSTIN),
    ]);

    let report = build_with(&geocoder, &config, false).await.unwrap();

    assert_eq!(report.summary.markers_placed, 4);
    assert_eq!(
        report.summary.groups_formed, 2,
        "three nearby museums cluster, Texas stands alone"
    );
    assert_eq!(report.summary.offscreen_groups, 0);

    let html = fs::read_to_string(&report.output_file).unwrap();
    assert_eq!(html.matches("\"display_lat\"").count(), 4);
    assert!(html.contains("Paris Stories"));
    assert!(html.contains("Lonesome Dove"));
}

#[tokio::test]
async fn failed_lookups_keep_the_build_alive() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    write_books(
        &config,
        r#"
books:
  - title: Lost Continent
    locations:
      - name: Atlantis
  - title: A Moveable Feast
    locations:
      - name: Paris, France
"#,
    );
    let geocoder = ScriptedGeocoder::new(&[("paris, france", PARIS)]);

    let report = build_with(&geocoder, &config, false).await.unwrap();

    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.summary.failed_queries, vec!["Atlantis".to_string()]);
    assert_eq!(report.summary.markers_placed, 1);
    assert!(report.output_file.exists(), "the page is still written");
}

#[tokio::test]
async fn all_lookups_failing_is_structural() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    write_books(
        &config,
        r#"
books:
  - title: Lost Continent
    locations:
      - name: Atlantis
"#,
    );
    let geocoder = ScriptedGeocoder::new(&[]);

    let err = build_with(&geocoder, &config, false).await.unwrap_err();
    assert!(matches!(err, BookmapError::Input(_)));
    assert!(
        !config.output_dir.join("index.html").exists(),
        "no silent empty map"
    );
}

#[tokio::test]
async fn missing_input_is_an_input_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    let geocoder = ScriptedGeocoder::new(&[]);

    let err = build_with(&geocoder, &config, false).await.unwrap_err();
    assert!(matches!(err, BookmapError::Input(_)));
    assert_eq!(geocoder.call_count(), 0);
}

#[tokio::test]
async fn out_of_viewport_groups_are_counted() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(&dir);
    config.viewport = Viewport {
        min_lat: 35.0,
        min_lon: -10.0,
        max_lat: 60.0,
        max_lon: 25.0,
    };
    write_books(
        &config,
        r#"
books:
  - title: A Moveable Feast
    locations:
      - name: Paris, France
  - title: Lonesome Dove
    locations:
      - name: Austin, Texas
"#,
    );
    let geocoder = ScriptedGeocoder::new(&[
        ("paris, france", PARIS),
        ("austin, texas", AUSTIN),
    ]);

    let report = build_with(&geocoder, &config, false).await.unwrap();

    assert_eq!(report.summary.offscreen_groups, 1, "Texas is outside Europe");
    let html = fs::read_to_string(&report.output_file).unwrap();
    assert!(html.contains("\"count\": 1"));
}

#[tokio::test]
async fn second_build_runs_warm() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    write_books(
        &config,
        r#"
books:
  - title: A Moveable Feast
    locations:
      - name: Paris, France
"#,
    );
    let geocoder = ScriptedGeocoder::new(&[("paris, france", PARIS)]);

    let first = build_with(&geocoder, &config, false).await.unwrap();
    assert_eq!(first.summary.freshly_resolved, 1);

    let second = build_with(&geocoder, &config, false).await.unwrap();
    assert_eq!(second.summary.from_cache, 1);
    assert_eq!(second.summary.freshly_resolved, 0);
    assert_eq!(geocoder.call_count(), 1, "the second build reuses the store");
}
