use serde::{Deserialize, Serialize};
use std::fmt;

// Geographic coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Finite and inside the valid degree ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

// Normalized place-name identity for cache lookups.
// Two queries with the same normalized text always share one cache slot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Case-fold and collapse all whitespace runs to single spaces.
    pub fn from_name(name: &str) -> Self {
        let folded = name.to_lowercase();
        let collapsed = folded.split_whitespace().collect::<Vec<_>>().join(" ");
        Self(collapsed)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// One persisted resolution. Never mutated in place; a re-resolution overwrites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub latitude: f64,
    pub longitude: f64,
    pub resolved_at: Option<i64>,
}

impl CacheEntry {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

// One book-location input awaiting resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceQuery {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

impl PlaceQuery {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lat: None,
            lng: None,
        }
    }

    pub fn with_coordinates(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            name: name.into(),
            lat: Some(lat),
            lng: Some(lng),
        }
    }

    /// Explicit override only counts when both halves are present.
    pub fn explicit_coordinate(&self) -> Option<Coordinate> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng)),
            _ => None,
        }
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::from_name(&self.name)
    }
}

// How a coordinate was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    Explicit,
    Cached,
    FreshlyResolved,
    Failed,
}

// One placeable location tied back to its book, in input order
#[derive(Debug, Clone, PartialEq)]
pub struct BookQuery {
    pub book_index: usize,
    pub book_title: String,
    pub query: PlaceQuery,
}

impl BookQuery {
    pub fn resolved(&self, coordinate: Option<Coordinate>, provenance: Provenance) -> ResolvedPoint {
        ResolvedPoint {
            book_index: self.book_index,
            book_title: self.book_title.clone(),
            query: self.query.clone(),
            coordinate,
            provenance,
        }
    }
}

// Resolution result for one query, in input order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPoint {
    pub book_index: usize,
    pub book_title: String,
    pub query: PlaceQuery,
    pub coordinate: Option<Coordinate>,
    pub provenance: Provenance,
}

impl ResolvedPoint {
    /// Failed points carry no coordinate and never reach the layout engine.
    pub fn is_placed(&self) -> bool {
        self.coordinate.is_some()
    }
}

// Cluster of near-coincident points. Recomputed every build, never persisted.
// members are indices into the layout input, ascending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerGroup {
    pub centroid: Coordinate,
    pub members: Vec<usize>,
}

// A resolved point plus its final display position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedMarker {
    pub point: ResolvedPoint,
    pub group: usize,
    pub display: Coordinate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CompassDirection {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl CompassDirection {
    pub const ALL: [CompassDirection; 8] = [
        CompassDirection::North,
        CompassDirection::NorthEast,
        CompassDirection::East,
        CompassDirection::SouthEast,
        CompassDirection::South,
        CompassDirection::SouthWest,
        CompassDirection::West,
        CompassDirection::NorthWest,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CompassDirection::North => "N",
            CompassDirection::NorthEast => "NE",
            CompassDirection::East => "E",
            CompassDirection::SouthEast => "SE",
            CompassDirection::South => "S",
            CompassDirection::SouthWest => "SW",
            CompassDirection::West => "W",
            CompassDirection::NorthWest => "NW",
        }
    }
}

// Out-of-viewport groups summarized per compass direction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OffscreenIndicator {
    pub direction: CompassDirection,
    pub count: usize,
}

// One book from the input document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
    #[serde(default)]
    pub locations: Vec<PlaceQuery>,
}

// Per-run counts reported to the CLI layer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildSummary {
    pub from_cache: usize,
    pub freshly_resolved: usize,
    pub explicit: usize,
    pub failed: usize,
    pub markers_placed: usize,
    pub groups_formed: usize,
    pub offscreen_groups: usize,
    pub failed_queries: Vec<String>,
}

impl BuildSummary {
    /// Tally the resolution phase. Layout counts are filled in later.
    pub fn from_points(points: &[ResolvedPoint]) -> Self {
        let mut summary = Self::default();
        for point in points {
            match point.provenance {
                Provenance::Explicit => summary.explicit += 1,
                Provenance::Cached => summary.from_cache += 1,
                Provenance::FreshlyResolved => summary.freshly_resolved += 1,
                Provenance::Failed => {
                    summary.failed += 1;
                    summary.failed_queries.push(point.query.name.clone());
                }
            }
        }
        summary
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}
