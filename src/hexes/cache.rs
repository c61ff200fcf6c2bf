use crate::core::geo::LatLngBounds;
use crate::prelude::{Arc, HashMap, Mutex};
use h3o::{CellIndex, Resolution};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared, immutable list of hexes tiling one grid cell
pub type HexList = Arc<[CellIndex]>;

/// Identifies one rectangular cache cell of the lat/lng grid at a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCellKey {
    pub resolution: Resolution,
    pub row: i64,
    pub col: i64,
}

impl GridCellKey {
    pub fn new(resolution: Resolution, row: i64, col: i64) -> Self {
        Self {
            resolution,
            row,
            col,
        }
    }

    /// Key of the cell containing (lat, lng) for a grid of `cell_size` degrees
    pub fn containing(lat: f64, lng: f64, resolution: Resolution, cell_size: f64) -> Self {
        Self::new(
            resolution,
            (lat / cell_size).floor() as i64,
            (lng / cell_size).floor() as i64,
        )
    }

    /// Full rectangle covered by the cell
    pub fn bounds(&self, cell_size: f64) -> LatLngBounds {
        let south = self.row as f64 * cell_size;
        let west = self.col as f64 * cell_size;
        LatLngBounds::from_coords(south, west, south + cell_size, west + cell_size)
    }
}

/// Whether a lookup was served from the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

type Slot = Arc<OnceCell<HexList>>;

#[derive(Debug, Default)]
struct CacheInner {
    slots: Mutex<HashMap<GridCellKey, Slot>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Session-lifetime cache from grid cells to their hex tiling
///
/// Entries are computed once and never evicted or replaced. Cloning yields
/// another handle to the same cache.
#[derive(Debug, Clone, Default)]
pub struct GridCache {
    inner: Arc<CacheInner>,
}

impl GridCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &GridCellKey) -> Slot {
        // A poisoned lock only means another thread panicked mid-insert;
        // the map itself is still consistent.
        let mut slots = self
            .inner
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        slots.entry(*key).or_default().clone()
    }

    /// Get the hexes of a populated cell
    pub fn get(&self, key: &GridCellKey) -> Option<HexList> {
        let slots = self
            .inner
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        slots.get(key).and_then(|slot| slot.get().cloned())
    }

    /// Store the hexes of a cell. An already populated entry is left untouched.
    pub fn put(&self, key: GridCellKey, hexes: HexList) {
        let _ = self.slot(&key).set(hexes);
    }

    /// Returns the cached hexes, computing and storing them on first request.
    ///
    /// Concurrent requests for the same missing key block on the first
    /// computation instead of repeating it. `compute` returning `None` leaves
    /// the entry empty so a later request retries.
    pub fn get_or_compute<F>(&self, key: GridCellKey, compute: F) -> (HexList, CacheOutcome)
    where
        F: FnOnce() -> Option<HexList>,
    {
        let slot = self.slot(&key);
        let mut computed = false;
        let result = slot.get_or_try_init(|| {
            computed = true;
            compute().ok_or(())
        });

        match result {
            Ok(hexes) => {
                let outcome = if computed {
                    self.inner.misses.fetch_add(1, Ordering::Relaxed);
                    CacheOutcome::Miss
                } else {
                    self.inner.hits.fetch_add(1, Ordering::Relaxed);
                    CacheOutcome::Hit
                };
                (hexes.clone(), outcome)
            }
            Err(()) => {
                self.inner.misses.fetch_add(1, Ordering::Relaxed);
                (Arc::from(Vec::new()), CacheOutcome::Miss)
            }
        }
    }

    pub fn contains(&self, key: &GridCellKey) -> bool {
        self.get(key).is_some()
    }

    /// Number of populated entries
    pub fn len(&self) -> usize {
        let slots = self
            .inner
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        slots.values().filter(|slot| slot.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn hexes(ids: &[u64]) -> HexList {
        ids.iter()
            .filter_map(|id| CellIndex::try_from(*id).ok())
            .collect::<Vec<_>>()
            .into()
    }

    const CELL_A: u64 = 0x8a1fb46622dffff;
    const CELL_B: u64 = 0x8a1fb46622d7fff;

    #[test]
    fn test_key_flooring() {
        let key = GridCellKey::containing(37.425, -88.305, Resolution::Ten, 0.01);
        assert_eq!((key.row, key.col), (3742, -8831));

        let negative = GridCellKey::containing(-0.5, -0.5, Resolution::Ten, 1.0);
        assert_eq!((negative.row, negative.col), (-1, -1));
    }

    #[test]
    fn test_key_bounds() {
        let key = GridCellKey::new(Resolution::Nine, 2, -3);
        let bounds = key.bounds(0.5);
        assert_eq!(bounds.south(), 1.0);
        assert_eq!(bounds.north(), 1.5);
        assert_eq!(bounds.west(), -1.5);
        assert_eq!(bounds.east(), -1.0);
    }

    #[test]
    fn test_get_put() {
        let cache = GridCache::new();
        let key = GridCellKey::new(Resolution::Ten, 1, 1);
        assert!(cache.is_empty());
        assert!(cache.get(&key).is_none());

        cache.put(key, hexes(&[CELL_A]));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key).unwrap().len(), 1);

        // Populated entries are never replaced
        cache.put(key, hexes(&[CELL_A, CELL_B]));
        assert_eq!(cache.get(&key).unwrap().len(), 1);
    }

    #[test]
    fn test_get_or_compute_counts_hits_and_misses() {
        let cache = GridCache::new();
        let key = GridCellKey::new(Resolution::Ten, 5, 5);
        let calls = AtomicUsize::new(0);
        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Some(hexes(&[CELL_A, CELL_B]))
        };

        let (first, outcome) = cache.get_or_compute(key, compute);
        assert_eq!(outcome, CacheOutcome::Miss);
        let (second, outcome) = cache.get_or_compute(key, compute);
        assert_eq!(outcome, CacheOutcome::Hit);

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                entries: 1
            }
        );
    }

    #[test]
    fn test_failed_compute_is_not_cached() {
        let cache = GridCache::new();
        let key = GridCellKey::new(Resolution::Ten, 0, 0);

        let (empty, _) = cache.get_or_compute(key, || None);
        assert!(empty.is_empty());
        assert!(!cache.contains(&key));

        let (filled, outcome) = cache.get_or_compute(key, || Some(hexes(&[CELL_A])));
        assert_eq!(outcome, CacheOutcome::Miss);
        assert_eq!(filled.len(), 1);
    }

    #[test]
    fn test_concurrent_requests_compute_once() {
        let cache = GridCache::new();
        let key = GridCellKey::new(Resolution::Ten, 7, 7);
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let calls = calls.clone();
                std::thread::spawn(move || {
                    cache.get_or_compute(key, || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        std::thread::sleep(std::time::Duration::from_millis(20));
                        Some(hexes(&[CELL_A]))
                    })
                })
            })
            .collect();

        for handle in handles {
            let (list, _) = handle.join().unwrap();
            assert_eq!(list.len(), 1);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
