//! Geometric fill of lat/lng rectangles with hexes.

use crate::core::geo::LatLngBounds;
use crate::hexes::cache::{GridCellKey, HexList};
use crate::{FogError, Result};
use h3o::geom::{ContainmentMode, TilerBuilder};
use h3o::{CellIndex, Resolution};

/// All hexes at `resolution` intersecting `bounds`, sorted and deduplicated
pub fn fill_bounds(bounds: &LatLngBounds, resolution: Resolution) -> Result<Vec<CellIndex>> {
    let corners = [
        bounds.south(),
        bounds.west(),
        bounds.north(),
        bounds.east(),
    ];
    if corners.iter().any(|value| !value.is_finite()) {
        return Err(FogError::InvalidRegion(format!(
            "non-finite bounds {bounds:?}"
        )));
    }

    let mut tiler = TilerBuilder::new(resolution)
        .containment_mode(ContainmentMode::IntersectsBoundary)
        .build();
    tiler
        .add(bounds.to_polygon())
        .map_err(|err| FogError::Geometry(err.to_string()))?;

    let mut cells: Vec<CellIndex> = tiler.into_coverage().collect();
    cells.sort_unstable();
    cells.dedup();
    Ok(cells)
}

/// Hexes tiling the grid cell (row, col) at `resolution`.
///
/// Pure: the same inputs always produce the same list.
pub fn compute_cell(
    row: i64,
    col: i64,
    resolution: Resolution,
    cell_size: f64,
) -> Result<HexList> {
    let key = GridCellKey::new(resolution, row, col);
    let cells = fill_bounds(&key.bounds(cell_size), resolution)?;
    Ok(cells.into())
}
