//! Planar polygon validation and containment.
//!
//! Positions are GeoJSON-ordered `[longitude, latitude]` pairs and are treated
//! as plain x/y coordinates. No projection or geodesic correction is applied.

use thiserror::Error;

/// A `[longitude, latitude]` pair.
pub type Position = [f64; 2];

/// Tolerance for orientation tests on degree coordinates.
const EPS: f64 = 1e-12;

/// Reasons a polygon ring is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("Invalid Polygon: {0}")]
    Malformed(String),
    #[error("Invalid Polygon: Self-intersection detected (edges {first} and {second} cross).")]
    SelfIntersecting { first: usize, second: usize },
}

/// Validate a single closed polygon ring.
///
/// A ring is accepted when it has at least four positions, every position is a
/// finite in-range coordinate, the first and last positions are identical, and
/// no two non-adjacent edges touch or cross.
pub fn validate_ring(ring: &[Position]) -> Result<(), GeometryError> {
    if ring.len() < 4 {
        return Err(GeometryError::Malformed(format!(
            "Ring must have at least 4 positions, got {}.",
            ring.len()
        )));
    }

    for (idx, position) in ring.iter().enumerate() {
        check_position(idx, position)?;
    }

    let first = ring[0];
    let last = ring[ring.len() - 1];
    if first[0] != last[0] || first[1] != last[1] {
        return Err(GeometryError::Malformed(
            "First and last points must be identical.".to_string(),
        ));
    }

    if let Some((first, second)) = find_self_intersection(ring) {
        return Err(GeometryError::SelfIntersecting { first, second });
    }

    Ok(())
}

fn check_position(idx: usize, position: &Position) -> Result<(), GeometryError> {
    let [lon, lat] = *position;
    if !lon.is_finite() || !lat.is_finite() {
        return Err(GeometryError::Malformed(format!(
            "Position {idx} has a non-finite coordinate."
        )));
    }
    if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
        return Err(GeometryError::Malformed(format!(
            "Position {idx} is out of range; expected [longitude, latitude]."
        )));
    }
    Ok(())
}

/// Return the indices of the first pair of non-adjacent edges that intersect.
///
/// Consecutive duplicate positions are collapsed first, so a repeated vertex
/// never produces a zero-length edge that "touches" its neighbours. The first
/// and last edge share the closing vertex and count as adjacent.
pub fn find_self_intersection(ring: &[Position]) -> Option<(usize, usize)> {
    let mut vertices: Vec<Position> = Vec::with_capacity(ring.len());
    for position in ring {
        if vertices.last() != Some(position) {
            vertices.push(*position);
        }
    }

    let edge_count = vertices.len().saturating_sub(1);
    if edge_count < 4 {
        // A triangle's edges are all pairwise adjacent.
        return None;
    }

    for i in 0..edge_count {
        for j in (i + 2)..edge_count {
            if i == 0 && j == edge_count - 1 {
                continue;
            }
            if segments_intersect(vertices[i], vertices[i + 1], vertices[j], vertices[j + 1]) {
                return Some((i, j));
            }
        }
    }
    None
}

fn orient(p: Position, q: Position, r: Position) -> f64 {
    (q[0] - p[0]) * (r[1] - p[1]) - (q[1] - p[1]) * (r[0] - p[0])
}

fn within(a: f64, b: f64, value: f64) -> bool {
    value >= a.min(b) - EPS && value <= a.max(b) + EPS
}

/// `r` lies on segment `p`-`q`, assuming the three are collinear.
fn on_segment(p: Position, q: Position, r: Position) -> bool {
    within(p[0], q[0], r[0]) && within(p[1], q[1], r[1])
}

/// Segment intersection including touches and collinear overlap.
pub fn segments_intersect(a1: Position, a2: Position, b1: Position, b2: Position) -> bool {
    let o1 = orient(a1, a2, b1);
    let o2 = orient(a1, a2, b2);
    let o3 = orient(b1, b2, a1);
    let o4 = orient(b1, b2, a2);

    if o1.abs() <= EPS && on_segment(a1, a2, b1) {
        return true;
    }
    if o2.abs() <= EPS && on_segment(a1, a2, b2) {
        return true;
    }
    if o3.abs() <= EPS && on_segment(b1, b2, a1) {
        return true;
    }
    if o4.abs() <= EPS && on_segment(b1, b2, a2) {
        return true;
    }

    let a_crosses = (o1 > EPS && o2 < -EPS) || (o1 < -EPS && o2 > EPS);
    let b_crosses = (o3 > EPS && o4 < -EPS) || (o3 < -EPS && o4 > EPS);
    a_crosses && b_crosses
}

/// Check whether a ring covers a point. Points on the boundary are covered.
pub fn ring_contains(ring: &[Position], point: Position) -> bool {
    if ring.len() < 3 {
        return false;
    }

    for edge in ring.windows(2) {
        if orient(edge[0], edge[1], point).abs() <= EPS && on_segment(edge[0], edge[1], point) {
            return true;
        }
    }

    // Ray casting along +x.
    let [x, y] = point;
    let mut inside = false;
    let n = ring.len();
    let mut j = n - 1;
    for i in 0..n {
        let [xi, yi] = ring[i];
        let [xj, yj] = ring[j];
        if ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Axis-aligned bounds of a ring, used as the spatial index key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn of_ring(ring: &[Position]) -> Option<Self> {
        let (first, rest) = ring.split_first()?;
        let mut bbox = Self {
            min_lon: first[0],
            max_lon: first[0],
            min_lat: first[1],
            max_lat: first[1],
        };
        for [lon, lat] in rest {
            bbox.min_lon = bbox.min_lon.min(*lon);
            bbox.max_lon = bbox.max_lon.max(*lon);
            bbox.min_lat = bbox.min_lat.min(*lat);
            bbox.max_lat = bbox.max_lat.max(*lat);
        }
        Some(bbox)
    }

    pub fn contains(&self, point: Position) -> bool {
        (self.min_lon..=self.max_lon).contains(&point[0])
            && (self.min_lat..=self.max_lat).contains(&point[1])
    }
}
