// Marker layout: proximity grouping, deterministic offsets, off-screen
// indicators. Pure in-memory computation; recomputed on every build.
use crate::domain::error::BookmapError;
use crate::domain::geo::{compass_between, great_circle_m, offset_by_meters};
use crate::domain::model::{
    CompassDirection, Coordinate, MarkerGroup, OffscreenIndicator, PlacedMarker, ResolvedPoint,
};
use crate::infrastructure::config::{LayoutConfig, Viewport};
use std::f64::consts::TAU;
use tracing::debug;

/// Disjoint sets over point indices, path compression + union by size.
/// Input sizes are tens to low hundreds, so the pairwise distance pass that
/// feeds this stays quadratic on purpose.
struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cur = x;
        while self.parent[cur] != root {
            cur = std::mem::replace(&mut self.parent[cur], root);
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        if self.size[ra] < self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        self.size[ra] += self.size[rb];
    }
}

/// Cluster points whose great-circle distance is under `threshold_m`.
///
/// Union is pairwise and transitive: a chain a-b-c where only the ends are
/// far apart still forms one group, since geocoding the same city from
/// different query strings yields slightly different coordinates. Groups are
/// ordered by their first member; members stay in input order.
pub fn group_points(
    points: &[ResolvedPoint],
    threshold_m: f64,
) -> Result<Vec<MarkerGroup>, BookmapError> {
    let coordinates = point_coordinates(points)?;
    let groups = group_coordinates(&coordinates, threshold_m);
    verify_partition(points.len(), &groups)?;
    Ok(groups)
}

fn group_coordinates(coordinates: &[Coordinate], threshold_m: f64) -> Vec<MarkerGroup> {
    let mut sets = UnionFind::new(coordinates.len());
    for i in 0..coordinates.len() {
        for j in (i + 1)..coordinates.len() {
            if great_circle_m(coordinates[i], coordinates[j]) < threshold_m {
                sets.union(i, j);
            }
        }
    }

    // root -> position in `groups`, first-seen order
    let mut group_of_root: Vec<(usize, usize)> = Vec::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for i in 0..coordinates.len() {
        let root = sets.find(i);
        match group_of_root.iter().find(|(r, _)| *r == root) {
            Some(&(_, slot)) => groups[slot].push(i),
            None => {
                group_of_root.push((root, groups.len()));
                groups.push(vec![i]);
            }
        }
    }

    groups
        .into_iter()
        .map(|members| MarkerGroup {
            centroid: centroid_of(&members, coordinates),
            members,
        })
        .collect()
}

/// Spread each group's markers so no two render at the same position.
///
/// A singleton keeps its own coordinate. Larger groups go on a ring around
/// the group centroid, one marker per equal angle step starting due north,
/// in member (= input) order. Same input, same arrangement, every run.
pub fn layout(
    points: &[ResolvedPoint],
    config: &LayoutConfig,
) -> Result<(Vec<MarkerGroup>, Vec<PlacedMarker>), BookmapError> {
    let coordinates = point_coordinates(points)?;
    let groups = group_coordinates(&coordinates, config.proximity_threshold_m);
    verify_partition(points.len(), &groups)?;

    let mut markers: Vec<Option<PlacedMarker>> = vec![None; points.len()];
    for (group_index, group) in groups.iter().enumerate() {
        for (slot, &member) in group.members.iter().enumerate() {
            let display = if group.members.len() == 1 {
                coordinates[member]
            } else {
                let angle = TAU * slot as f64 / group.members.len() as f64;
                let east = config.offset_radius_m * angle.sin();
                let north = config.offset_radius_m * angle.cos();
                offset_by_meters(group.centroid, east, north)
            };
            if !display.is_valid() {
                return Err(BookmapError::Layout(format!(
                    "display position for {:?} left the valid range: ({}, {})",
                    points[member].query.name, display.latitude, display.longitude
                )));
            }
            markers[member] = Some(PlacedMarker {
                point: points[member].clone(),
                group: group_index,
                display,
            });
        }
    }

    let markers: Vec<PlacedMarker> = markers
        .into_iter()
        .enumerate()
        .map(|(i, m)| {
            m.ok_or_else(|| {
                BookmapError::Layout(format!("point {} was never assigned a marker", i))
            })
        })
        .collect::<Result<_, _>>()?;

    debug!(
        "Placed {} markers in {} groups",
        markers.len(),
        groups.len()
    );
    Ok((groups, markers))
}

/// Summarize groups whose centroid lies outside the viewport, bucketed into
/// the 8 compass directions from the viewport center. Straddling groups are
/// classified by centroid alone. Buckets come out in compass order; empty
/// ones are dropped.
pub fn offscreen(groups: &[MarkerGroup], viewport: &Viewport) -> Vec<OffscreenIndicator> {
    let center = viewport.center();
    let mut counts = [0usize; 8];

    for group in groups {
        if !viewport.contains(group.centroid) {
            let direction = compass_between(center, group.centroid);
            let bucket = CompassDirection::ALL
                .iter()
                .position(|&d| d == direction)
                .unwrap_or(0);
            counts[bucket] += 1;
        }
    }

    CompassDirection::ALL
        .iter()
        .enumerate()
        .filter(|(i, _)| counts[*i] > 0)
        .map(|(i, &direction)| OffscreenIndicator {
            direction,
            count: counts[i],
        })
        .collect()
}

fn point_coordinates(points: &[ResolvedPoint]) -> Result<Vec<Coordinate>, BookmapError> {
    points
        .iter()
        .map(|point| match point.coordinate {
            Some(c) if c.is_valid() => Ok(c),
            Some(c) => Err(BookmapError::Layout(format!(
                "{:?} carries an invalid coordinate ({}, {})",
                point.query.name, c.latitude, c.longitude
            ))),
            None => Err(BookmapError::Layout(format!(
                "{:?} reached layout without a coordinate",
                point.query.name
            ))),
        })
        .collect()
}

fn centroid_of(members: &[usize], coordinates: &[Coordinate]) -> Coordinate {
    let n = members.len() as f64;
    let lat = members.iter().map(|&i| coordinates[i].latitude).sum::<f64>() / n;
    let lon = members.iter().map(|&i| coordinates[i].longitude).sum::<f64>() / n;
    Coordinate::new(lat, lon)
}

/// Every point in exactly one group. A miss here is a broken invariant and
/// the build must abort rather than render a silently wrong map.
fn verify_partition(point_count: usize, groups: &[MarkerGroup]) -> Result<(), BookmapError> {
    let mut seen = vec![false; point_count];
    for group in groups {
        for &member in &group.members {
            if member >= point_count {
                return Err(BookmapError::Layout(format!(
                    "group member {} is out of range ({} points)",
                    member, point_count
                )));
            }
            if seen[member] {
                return Err(BookmapError::Layout(format!(
                    "point {} appears in more than one group",
                    member
                )));
            }
            seen[member] = true;
        }
    }
    if let Some(lost) = seen.iter().position(|&s| !s) {
        return Err(BookmapError::Layout(format!(
            "point {} belongs to no group",
            lost
        )));
    }
    Ok(())
}
