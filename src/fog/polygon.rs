//! Fog polygon construction: one fixed outer ring with visited areas cut out.
//!
//! Only the visited hexes near the viewport are merged. Their dissolved outer
//! rings become holes; interior holes of the visited shapes are discarded
//! because the fog already covers everything outside visited area.

use crate::core::geo::{LatLng, LatLngBounds};
use crate::prelude::HashSet;
use crate::{FogError, Result};
use geo::Winding;
use geo_types::{Coord, LineString};
use h3o::CellIndex;
use serde::{Deserialize, Serialize};

/// Closed sequence of vertices, first vertex repeated at the end
pub type Ring = Vec<LatLng>;

/// Smallest vertex count of a closed ring that can bound an area
pub const MIN_RING_VERTICES: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FogPolygon {
    /// Counter-clockwise outer boundary
    pub outer: Ring,
    /// Clockwise holes, one per merged visited area
    pub holes: Vec<Ring>,
}

impl FogPolygon {
    pub fn new(outer: Ring, holes: Vec<Ring>) -> Self {
        Self { outer, holes }
    }
}

/// Result of one fog polygon pass
#[derive(Debug, Clone, PartialEq)]
pub enum FogOutcome {
    /// Too many hexes to render; fog is hidden
    Degraded { hex_count: usize },
    /// Nothing visited near the viewport
    Unexplored(FogPolygon),
    /// Every hex near the viewport was visited
    FullyExplored { visited_hexes: usize },
    Explored {
        polygon: FogPolygon,
        visited_hexes: usize,
    },
}

impl FogOutcome {
    pub fn into_polygons(self) -> Vec<FogPolygon> {
        match self {
            Self::Unexplored(polygon) | Self::Explored { polygon, .. } => vec![polygon],
            Self::Degraded { .. } | Self::FullyExplored { .. } => Vec::new(),
        }
    }

    /// Visited hexes inside the superset; zero when the pass was degraded
    pub fn visited_hexes(&self) -> usize {
        match self {
            Self::Degraded { .. } | Self::Unexplored(_) => 0,
            Self::FullyExplored { visited_hexes } | Self::Explored { visited_hexes, .. } => {
                *visited_hexes
            }
        }
    }

    pub fn status(&self) -> Option<String> {
        match self {
            Self::Degraded { hex_count } => Some(format!(
                "Zoom in to see explored areas ({hex_count} hexes in view)"
            )),
            _ => None,
        }
    }
}

/// Removes consecutive duplicate vertices and closes the ring. Rings that
/// end up with fewer than four vertices cannot bound an area and yield `None`.
pub fn normalize_ring(points: impl IntoIterator<Item = LatLng>) -> Option<Ring> {
    let mut ring: Ring = Vec::new();
    for point in points {
        if ring.last() != Some(&point) {
            ring.push(point);
        }
    }
    let first = *ring.first()?;
    if ring.last() != Some(&first) {
        ring.push(first);
    }
    (ring.len() >= MIN_RING_VERTICES).then_some(ring)
}

fn ring_from_line(mut line: LineString<f64>, clockwise: bool) -> Option<Ring> {
    if clockwise {
        line.make_cw_winding();
    } else {
        line.make_ccw_winding();
    }
    normalize_ring(line.coords().map(|coord| LatLng::from_coord(*coord)))
}

fn to_line(ring: &[LatLng]) -> LineString<f64> {
    LineString::from(ring.iter().map(|p| p.to_coord()).collect::<Vec<Coord<f64>>>())
}

/// True when the closed ring winds clockwise in (lng, lat) space
pub fn is_clockwise(ring: &[LatLng]) -> bool {
    to_line(ring).is_cw()
}

/// Merges adjacent hexes and returns the outer ring of every merged shape,
/// wound clockwise
pub fn merge_hexes(cells: &[CellIndex]) -> Result<Vec<Ring>> {
    let merged = h3o::geom::dissolve(cells.iter().copied())
        .map_err(|err| FogError::Geometry(err.to_string()))?;

    Ok(merged
        .into_iter()
        .filter_map(|polygon| {
            let (exterior, _interiors) = polygon.into_inner();
            ring_from_line(exterior, true)
        })
        .collect())
}

/// One clockwise ring per hex, used when merging fails
fn unmerged_hexes(cells: &[CellIndex]) -> Vec<Ring> {
    cells
        .iter()
        .filter_map(|cell| {
            let boundary = cell.boundary();
            let mut coords: Vec<Coord<f64>> = boundary
                .iter()
                .map(|ll| LatLng::from(*ll).to_coord())
                .collect();
            if let Some(first) = coords.first().copied() {
                coords.push(first);
            }
            ring_from_line(LineString::from(coords), true)
        })
        .collect()
}

/// Builds the fog polygon for a viewport from its hex superset and the
/// resolved visited set
#[derive(Debug, Clone)]
pub struct FogPolygonBuilder {
    outer_boundary: LatLngBounds,
    hex_cap: usize,
}

impl FogPolygonBuilder {
    pub fn new(outer_boundary: LatLngBounds, hex_cap: usize) -> Self {
        Self {
            outer_boundary,
            hex_cap,
        }
    }

    /// Counter-clockwise closed outer ring
    pub fn outer_ring(&self) -> Ring {
        self.outer_boundary.ring()
    }

    /// Visited hexes of the superset, sorted so merging is deterministic
    pub fn visited_near(
        superset: &HashSet<CellIndex>,
        visited: &HashSet<CellIndex>,
    ) -> Vec<CellIndex> {
        let (small, large) = if superset.len() <= visited.len() {
            (superset, visited)
        } else {
            (visited, superset)
        };
        let mut near: Vec<CellIndex> = small
            .iter()
            .filter(|cell| large.contains(cell))
            .copied()
            .collect();
        near.sort_unstable();
        near
    }

    pub fn build(
        &self,
        superset: &HashSet<CellIndex>,
        visited: &HashSet<CellIndex>,
    ) -> FogOutcome {
        if superset.len() > self.hex_cap {
            return FogOutcome::Degraded {
                hex_count: superset.len(),
            };
        }

        let near = Self::visited_near(superset, visited);
        if near.is_empty() {
            return FogOutcome::Unexplored(FogPolygon::new(self.outer_ring(), Vec::new()));
        }
        if near.len() == superset.len() {
            return FogOutcome::FullyExplored {
                visited_hexes: near.len(),
            };
        }

        let holes = merge_hexes(&near).unwrap_or_else(|err| {
            log::warn!(
                "merging {} visited hexes failed ({}); using unmerged hexes",
                near.len(),
                err
            );
            unmerged_hexes(&near)
        });
        FogOutcome::Explored {
            polygon: FogPolygon::new(self.outer_ring(), holes),
            visited_hexes: near.len(),
        }
    }
}
