use crate::core::geo::{LatLngBounds, Region};
use crate::core::resolution::ResolutionSelector;
use crate::hexes::cache::{CacheOutcome, GridCache, GridCellKey};
use crate::hexes::fill::compute_cell;
use crate::prelude::HashSet;
use h3o::{CellIndex, Resolution};

/// Union of the hexes of every grid cell overlapping a query window
#[derive(Debug, Clone, Default)]
pub struct AssembledHexes {
    pub hexes: HashSet<CellIndex>,
    pub keys: Vec<GridCellKey>,
    pub hits: usize,
    pub misses: usize,
}

impl AssembledHexes {
    pub fn len(&self) -> usize {
        self.hexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hexes.is_empty()
    }
}

/// Builds viewport hex sets out of cached grid cells
#[derive(Debug, Clone)]
pub struct HexSetAssembler {
    cache: GridCache,
    selector: ResolutionSelector,
}

impl HexSetAssembler {
    pub fn new(cache: GridCache, selector: ResolutionSelector) -> Self {
        Self { cache, selector }
    }

    pub fn cache(&self) -> &GridCache {
        &self.cache
    }

    pub fn selector(&self) -> &ResolutionSelector {
        &self.selector
    }

    /// Query window: the region scaled by `multiplier`, padded for `resolution`
    pub fn query_bounds(
        &self,
        region: &Region,
        resolution: Resolution,
        multiplier: f64,
    ) -> LatLngBounds {
        region
            .bounds(multiplier.max(1.0))
            .padded(self.selector.padding(resolution))
    }

    /// Every grid cell key overlapping the padded, expanded window
    pub fn cell_keys(
        &self,
        region: &Region,
        resolution: Resolution,
        multiplier: f64,
    ) -> Vec<GridCellKey> {
        let cell_size = self.selector.cell_size(resolution);
        let bounds = self.query_bounds(region, resolution, multiplier);
        let south_west =
            GridCellKey::containing(bounds.south(), bounds.west(), resolution, cell_size);
        let north_east =
            GridCellKey::containing(bounds.north(), bounds.east(), resolution, cell_size);

        let mut keys = Vec::new();
        for row in south_west.row..=north_east.row {
            for col in south_west.col..=north_east.col {
                keys.push(GridCellKey::new(resolution, row, col));
            }
        }
        keys
    }

    /// Collects the hexes of every overlapping grid cell, computing and
    /// caching the cells not seen before.
    pub fn assemble(
        &self,
        region: &Region,
        resolution: Resolution,
        multiplier: f64,
    ) -> AssembledHexes {
        let cell_size = self.selector.cell_size(resolution);
        let keys = self.cell_keys(region, resolution, multiplier);
        let mut assembled = AssembledHexes::default();

        for key in &keys {
            let (hexes, outcome) = self.cache.get_or_compute(*key, || {
                match compute_cell(key.row, key.col, key.resolution, cell_size) {
                    Ok(hexes) => Some(hexes),
                    Err(err) => {
                        log::warn!("hex fill failed for {:?}: {}", key, err);
                        None
                    }
                }
            });
            match outcome {
                CacheOutcome::Hit => assembled.hits += 1,
                CacheOutcome::Miss => assembled.misses += 1,
            }
            assembled.hexes.extend(hexes.iter().copied());
        }

        assembled.keys = keys;
        assembled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hexes::fill::fill_bounds;

    fn assembler() -> HexSetAssembler {
        HexSetAssembler::new(GridCache::new(), ResolutionSelector::default())
    }

    #[test]
    fn test_viewport_on_cell_corner_requests_four_keys() {
        // (37.415..37.425, -88.315..-88.305) crosses row 3742 and column -8831
        let assembler = assembler();
        let region = Region::from_parts(37.42, -88.31, 0.01, 0.01);
        let keys = assembler.cell_keys(&region, Resolution::Ten, 1.0);
        assert_eq!(
            keys,
            vec![
                GridCellKey::new(Resolution::Ten, 3741, -8832),
                GridCellKey::new(Resolution::Ten, 3741, -8831),
                GridCellKey::new(Resolution::Ten, 3742, -8832),
                GridCellKey::new(Resolution::Ten, 3742, -8831),
            ]
        );
    }

    #[test]
    fn test_region_inside_one_cell_requests_one_key() {
        let assembler = assembler();
        let region = Region::from_parts(37.425, -88.305, 0.001, 0.001);
        let keys = assembler.cell_keys(&region, Resolution::Ten, 1.0);
        assert_eq!(keys, vec![GridCellKey::new(Resolution::Ten, 3742, -8831)]);
    }

    #[test]
    fn test_multiplier_grows_key_range() {
        let assembler = assembler();
        let region = Region::from_parts(37.425, -88.305, 0.01, 0.01);
        let normal = assembler.cell_keys(&region, Resolution::Ten, 1.0);
        let wide = assembler.cell_keys(&region, Resolution::Ten, 3.0);
        assert!(wide.len() > normal.len());
        assert!(normal.iter().all(|key| wide.contains(key)));

        // Multipliers below one behave like one
        assert_eq!(assembler.cell_keys(&region, Resolution::Ten, 0.2), normal);
    }

    #[test]
    fn test_assembled_set_covers_exact_fill() {
        let assembler = assembler();
        let region = Region::from_parts(37.4234, -88.3077, 0.012, 0.015);
        let assembled = assembler.assemble(&region, Resolution::Ten, 1.0);
        let exact = fill_bounds(&region.bounds(1.0), Resolution::Ten).unwrap();
        assert!(!exact.is_empty());
        assert!(exact.iter().all(|cell| assembled.hexes.contains(cell)));
    }

    #[test]
    fn test_second_pass_is_all_hits() {
        let assembler = assembler();
        let region = Region::from_parts(51.5, -0.12, 0.03, 0.03);

        let first = assembler.assemble(&region, Resolution::Nine, 1.0);
        assert_eq!(first.hits, 0);
        assert_eq!(first.misses, first.keys.len());

        let second = assembler.assemble(&region, Resolution::Nine, 1.0);
        assert_eq!(second.misses, 0);
        assert_eq!(second.hits, second.keys.len());
        assert_eq!(first.hexes, second.hexes);
        assert_eq!(assembler.cache().len(), first.keys.len());
    }

    #[test]
    fn test_resolutions_do_not_share_entries() {
        let assembler = assembler();
        let region = Region::from_parts(51.5, -0.12, 0.03, 0.03);
        assembler.assemble(&region, Resolution::Nine, 1.0);
        let other = assembler.assemble(&region, Resolution::Eight, 1.0);
        assert_eq!(other.hits, 0);
        assert!(other.hexes.iter().all(|cell| cell.resolution() == Resolution::Eight));
    }
}
